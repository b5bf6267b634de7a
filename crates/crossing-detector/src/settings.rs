use clap::{Parser, ValueEnum};
use geo::Coord;
use std::path::PathBuf;

#[derive(Parser, Debug, Clone)]
#[clap(author, version, about, long_about = None)]
/// Crossing Detector - reports which bridges and tunnels a route crosses
pub struct Settings {
    /// Route files to check: GeoJSON as returned by the routing provider, or GPX
    #[clap(value_name = "ROUTE", required_unless_present = "print_default_config")]
    pub routes: Vec<PathBuf>,

    /// JSON configuration with the landmark table and shore heuristic (defaults to Istanbul)
    #[clap(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Requested trip start, used by the shore heuristic instead of the route's first point
    #[clap(long, value_name = "LAT,LNG", value_parser = parse_lat_lng, requires = "end")]
    pub start: Option<Coord<f64>>,

    /// Requested trip end, used by the shore heuristic instead of the route's last point
    #[clap(long, value_name = "LAT,LNG", value_parser = parse_lat_lng, requires = "start")]
    pub end: Option<Coord<f64>>,

    /// Output format
    #[clap(short, long, value_enum, default_value_t = OutputFormat::Text)]
    pub format: OutputFormat,

    /// Print the built-in configuration as JSON and exit
    #[clap(long, default_value = "false")]
    pub print_default_config: bool,
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Text,
    Json,
}

impl Settings {
    /// The explicit trip endpoints, when both were given
    pub fn endpoints(&self) -> Option<(Coord<f64>, Coord<f64>)> {
        self.start.zip(self.end)
    }
}

/// Parse `"41.02,28.97"` into a coordinate (`x = lng`, `y = lat`)
fn parse_lat_lng(value: &str) -> Result<Coord<f64>, String> {
    let (lat, lng) = value
        .split_once(',')
        .ok_or_else(|| format!("expected LAT,LNG but got '{value}'"))?;
    let lat: f64 = lat
        .trim()
        .parse()
        .map_err(|e| format!("invalid latitude '{lat}': {e}"))?;
    let lng: f64 = lng
        .trim()
        .parse()
        .map_err(|e| format!("invalid longitude '{lng}': {e}"))?;

    let c = crossing_detector_lib::geometry::coord(lat, lng);
    if !crossing_detector_lib::geometry::is_valid_wgs84(c) {
        return Err(format!("'{value}' is outside WGS84 bounds"));
    }
    Ok(c)
}
