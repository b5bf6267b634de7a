use crate::settings::{OutputFormat, Settings};
use crossing_detector_lib::{
    BoundingRegion, Config, DetectError, DetectionResult, Detector, Highlight, RouteGeometry,
    plan_highlights, summary,
};
use rayon::prelude::*;
use serde::Serialize;
use std::path::{Path, PathBuf};

/// Error types for the command-line front end
#[derive(Debug, thiserror::Error)]
pub enum CliError {
    #[error("{}: {source}", path.display())]
    Load { path: PathBuf, source: DetectError },

    #[error("Invalid configuration: {0}")]
    Config(#[from] DetectError),

    #[error("Configuration JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Report for one route file
#[derive(Debug, Serialize)]
pub struct RouteReport {
    pub route: PathBuf,
    pub points: usize,
    pub distance_meters: f64,
    /// Region enclosing every point of the route, `None` when it has no points
    pub extent: Option<BoundingRegion>,
    pub result: DetectionResult,
    pub highlights: Vec<Highlight>,
}

/// Load the configuration: the given JSON file, or the built-in Istanbul table
pub fn load_config(path: Option<&Path>) -> Result<Config, CliError> {
    let Some(path) = path else {
        return Ok(Config::default());
    };

    let file = std::fs::File::open(path)?;
    let config: Config = serde_json::from_reader(std::io::BufReader::new(file))?;
    tracing::info!(
        "Loaded {} landmark(s) from {}",
        config.landmarks.len(),
        path.display()
    );
    Ok(config)
}

/// Load every route in parallel and detect crossings on the ones that parsed.
///
/// Returns the reports in input order and the load failures.
pub fn check_routes(
    detector: &Detector,
    settings: &Settings,
) -> (Vec<RouteReport>, Vec<CliError>) {
    let loaded: Vec<_> = settings
        .routes
        .par_iter()
        .map(|path| {
            RouteGeometry::load(path).map_err(|source| CliError::Load {
                path: path.clone(),
                source,
            })
        })
        .collect();

    let mut paths = Vec::new();
    let mut routes = Vec::new();
    let mut errors = Vec::new();
    for (path, result) in settings.routes.iter().zip(loaded) {
        match result {
            Ok(route) => {
                paths.push(path.clone());
                routes.push(route);
            }
            Err(e) => errors.push(e),
        }
    }

    let results: Vec<DetectionResult> = match settings.endpoints() {
        Some((start, end)) => routes
            .par_iter()
            .map(|route| detector.detect_between(route, start, end))
            .collect(),
        None => detector.detect_batch(&routes),
    };

    let reports = paths
        .into_iter()
        .zip(routes.iter().zip(results))
        .map(|(path, (route, result))| RouteReport {
            highlights: plan_highlights(&result, detector.landmarks()),
            route: path,
            points: route.total_points(),
            distance_meters: route.total_distance(),
            extent: route.bounding_region(),
            result,
        })
        .collect();

    (reports, errors)
}

/// Format the reports for stdout
pub fn render(reports: &[RouteReport], format: OutputFormat) -> Result<String, CliError> {
    match format {
        OutputFormat::Json => Ok(serde_json::to_string_pretty(reports)?),
        OutputFormat::Text => {
            let blocks: Vec<String> = reports
                .iter()
                .map(|report| {
                    let mut text = format!(
                        "{} ({} points, {:.1} km)\n{}",
                        report.route.display(),
                        report.points,
                        report.distance_meters / 1000.0,
                        summary(&report.result)
                    );
                    if let Some(extent) = &report.extent {
                        text.push_str(&format!(
                            "\nExtent: N {:.4} S {:.4} E {:.4} W {:.4}",
                            extent.north, extent.south, extent.east, extent.west
                        ));
                    }
                    for highlight in &report.highlights {
                        text.push_str(&format!(
                            "\n  [{}] N {:.4} S {:.4} E {:.4} W {:.4}, marker at {:.4},{:.4}",
                            highlight.name,
                            highlight.region.north,
                            highlight.region.south,
                            highlight.region.east,
                            highlight.region.west,
                            highlight.center.y,
                            highlight.center.x
                        ));
                    }
                    text
                })
                .collect();
            Ok(blocks.join("\n\n"))
        }
    }
}

/// Run the command line tool. Returns `false` if anything failed.
pub fn run(settings: &Settings) -> bool {
    if settings.print_default_config {
        return match serde_json::to_string_pretty(&Config::default()) {
            Ok(json) => {
                println!("{json}");
                true
            }
            Err(e) => {
                tracing::error!("Failed to serialize the default configuration: {}", e);
                false
            }
        };
    }

    let detector = match load_config(settings.config.as_deref())
        .and_then(|config| Detector::new(config).map_err(CliError::from))
    {
        Ok(detector) => detector,
        Err(e) => {
            tracing::error!("{}", e);
            return false;
        }
    };

    let (reports, errors) = check_routes(&detector, settings);
    for e in &errors {
        tracing::error!("Failed to load route {}", e);
    }

    match render(&reports, settings.format) {
        Ok(output) => {
            if !output.is_empty() {
                println!("{output}");
            }
        }
        Err(e) => {
            tracing::error!("Failed to render report: {}", e);
            return false;
        }
    }

    errors.is_empty()
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;
    use tempfile::TempDir;

    const GALATA_ROUTE: &str = r#"{
        "type": "FeatureCollection",
        "features": [{
            "type": "Feature",
            "properties": {},
            "geometry": {
                "type": "LineString",
                "coordinates": [[28.9700, 41.0195], [28.9770, 41.0195]]
            }
        }]
    }"#;

    fn write_fixture(dir: &TempDir, name: &str, contents: &str) -> PathBuf {
        let path = dir.path().join(name);
        std::fs::write(&path, contents).unwrap();
        path
    }

    #[test]
    fn test_check_routes_reports_and_errors() {
        let dir = tempfile::tempdir().unwrap();
        let good = write_fixture(&dir, "galata.geojson", GALATA_ROUTE);
        let bad = write_fixture(&dir, "broken.geojson", "{ not geojson");
        let settings = Settings::try_parse_from([
            "crossing-detector".into(),
            good.clone().into_os_string(),
            bad.into_os_string(),
        ])
        .unwrap();

        let detector = Detector::default();
        let (reports, errors) = check_routes(&detector, &settings);

        assert_eq!(reports.len(), 1);
        assert_eq!(errors.len(), 1);
        assert_eq!(reports[0].route, good);
        assert_eq!(reports[0].points, 2);
        assert_eq!(reports[0].result.labels(), vec!["Galata Köprüsü"]);
        assert_eq!(reports[0].highlights.len(), 1);
        assert_eq!(
            reports[0].extent,
            Some(BoundingRegion::new(41.0195, 41.0195, 28.9770, 28.9700))
        );
    }

    #[test]
    fn test_fixtures_removed_with_tempdir() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_fixture(&dir, "galata.geojson", GALATA_ROUTE);
        assert!(path.exists());
        drop(dir);
        assert!(!path.exists());
    }

    #[test]
    fn test_empty_route_has_no_extent() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_fixture(
            &dir,
            "points.geojson",
            r#"{"type": "Point", "coordinates": [29.0, 41.0]}"#,
        );
        let settings =
            Settings::try_parse_from(["crossing-detector".into(), path.into_os_string()]).unwrap();
        let (reports, errors) = check_routes(&Detector::default(), &settings);
        assert!(errors.is_empty());
        assert!(reports[0].extent.is_none());

        let text = render(&reports, OutputFormat::Text).unwrap();
        assert!(!text.contains("Extent:"));
        assert!(text.contains("No crossings found on the route."));
    }

    #[test]
    fn test_explicit_endpoints_drive_heuristic() {
        let dir = tempfile::tempdir().unwrap();
        let west_only = write_fixture(
            &dir,
            "west.geojson",
            r#"{"type": "LineString", "coordinates": [[28.80, 41.05], [28.85, 41.06]]}"#,
        );
        let settings = Settings::try_parse_from([
            "crossing-detector".into(),
            west_only.into_os_string(),
            "--start".into(),
            "41.05,28.80".into(),
            "--end".into(),
            "41.06,29.05".into(),
        ])
        .unwrap();

        let (reports, errors) = check_routes(&Detector::default(), &settings);
        assert!(errors.is_empty());
        assert!(reports[0].result.is_estimate());
    }

    #[test]
    fn test_render_text_and_json() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_fixture(&dir, "render.geojson", GALATA_ROUTE);
        let settings = Settings::try_parse_from([
            "crossing-detector".into(),
            path.into_os_string(),
        ])
        .unwrap();
        let (reports, _) = check_routes(&Detector::default(), &settings);

        let text = render(&reports, OutputFormat::Text).unwrap();
        assert!(text.contains("1 crossing(s) found on the route:\n- Galata Köprüsü"));
        assert!(text.contains("[Galata Köprüsü]"));
        assert!(text.contains("Extent: N 41.0195 S 41.0195 E 28.9770 W 28.9700"));

        let json = render(&reports, OutputFormat::Json).unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value[0]["result"]["crossings"][0]["kind"], "confirmed");
        assert_eq!(value[0]["extent"]["west"], 28.97);
    }

    #[test]
    fn test_load_config_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_fixture(
            &dir,
            "config.json",
            r#"{
                "landmarks": [
                    {"name": "Only", "bounds": {"north": 1.0, "south": 0.0, "east": 1.0, "west": 0.0}}
                ]
            }"#,
        );
        let config = load_config(Some(&path)).unwrap();
        assert_eq!(config.landmarks.len(), 1);
        assert_eq!(config.shore, Config::default().shore);

        let invalid = write_fixture(
            &dir,
            "invalid.json",
            r#"{"landmarks": [{"name": "Bad", "bounds": {"north": 0.0, "south": 1.0, "east": 1.0, "west": 0.0}}]}"#,
        );
        assert!(matches!(load_config(Some(&invalid)), Err(CliError::Json(_))));
    }
}
