//! Crossing detection - matches a route against the landmark registry
//!
//! Every route segment is tested against every landmark region. When nothing
//! matches but the route starts and ends on opposite shores, a single crossing is
//! estimated from a latitude decision table.

use crate::geometry::segment_intersects_region_within;
use crate::{DetectError, LandmarkRegistry, Result, RouteGeometry};

use geo::Coord;
use rayon::prelude::*;
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};
use smallvec::{SmallVec, smallvec};

/// One row of the shore heuristic decision table
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct LatitudeBand {
    /// Chosen when the northernmost endpoint latitude is strictly above this value
    pub above: f64,
    /// Label reported for this band
    pub label: String,
}

impl LatitudeBand {
    pub fn new(above: f64, label: impl Into<String>) -> Self {
        Self {
            above,
            label: label.into(),
        }
    }
}

/// Fallback used when no landmark region is hit
///
/// Endpoints west of `divide_longitude` (strictly less) are on the west shore,
/// the rest on the east shore. If the two endpoints are on different shores, the
/// first band whose `above` threshold is below `max(start.lat, end.lat)` names the
/// crossing, or `fallback_label` when none does.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ShoreHeuristic {
    /// Longitude separating the two shores, in degrees
    pub divide_longitude: f64,
    /// Decision table, strictly descending by `above`
    pub bands: Vec<LatitudeBand>,
    /// Label used south of the last band
    pub fallback_label: String,
    /// Appended to an estimated label so it is never shown as a confirmed match
    pub estimate_suffix: String,
}

#[cfg_attr(feature = "profiling", profiling::all_functions)]
impl ShoreHeuristic {
    /// Bosphorus crossings, north to south
    pub fn istanbul() -> Self {
        Self {
            divide_longitude: 29.00,
            bands: vec![
                LatitudeBand::new(41.15, "Yavuz Sultan Selim Köprüsü"),
                LatitudeBand::new(41.08, "Fatih Sultan Mehmet Köprüsü"),
                LatitudeBand::new(40.99, "15 Temmuz Şehitler Köprüsü (Boğaziçi Köprüsü)"),
            ],
            // Two structures serve the southern corridor
            fallback_label: "Avrasya Tüneli veya Marmaray".to_string(),
            estimate_suffix: " (estimated)".to_string(),
        }
    }

    pub fn validate(&self) -> Result<()> {
        if !self.divide_longitude.is_finite() || self.divide_longitude.abs() > 180.0 {
            return Err(DetectError::InvalidHeuristic(format!(
                "divide longitude {} is not a valid longitude",
                self.divide_longitude
            )));
        }
        if let Some(band) = self.bands.iter().find(|b| !b.above.is_finite()) {
            return Err(DetectError::InvalidHeuristic(format!(
                "band '{}' has a non-finite threshold",
                band.label
            )));
        }
        if let Some(pair) = self.bands.windows(2).find(|w| w[0].above <= w[1].above) {
            return Err(DetectError::InvalidHeuristic(format!(
                "bands must be strictly descending, but '{}' ({}) is followed by '{}' ({})",
                pair[0].label, pair[0].above, pair[1].label, pair[1].above
            )));
        }
        Ok(())
    }

    #[inline]
    pub fn is_west(&self, lng: f64) -> bool {
        lng < self.divide_longitude
    }

    /// Pick the estimated crossing for a trip, or `None` when both ends are on the
    /// same shore
    pub fn estimate(&self, start: Coord<f64>, end: Coord<f64>) -> Option<&str> {
        if self.is_west(start.x) == self.is_west(end.x) {
            return None;
        }

        let northernmost = start.y.max(end.y);
        let label = self
            .bands
            .iter()
            .find(|band| northernmost > band.above)
            .map_or(self.fallback_label.as_str(), |band| band.label.as_str());
        Some(label)
    }
}

impl Default for ShoreHeuristic {
    fn default() -> Self {
        Self::istanbul()
    }
}

/// Configuration for the detector
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct Config {
    /// Landmarks to detect, in reporting order
    pub landmarks: LandmarkRegistry,
    /// Fallback used when no landmark is hit
    pub shore: ShoreHeuristic,
    /// Segment intersection denominators with an absolute value at or below this
    /// are treated as parallel. Default 0.0: only exactly parallel segments.
    pub parallel_epsilon: f64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            landmarks: LandmarkRegistry::istanbul(),
            shore: ShoreHeuristic::istanbul(),
            parallel_epsilon: 0.0,
        }
    }
}

/// How a crossing was found
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum CrossingKind {
    /// A route segment touches the landmark region
    Confirmed,
    /// Guessed by the shore heuristic
    Estimated,
}

/// A detected crossing
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Crossing {
    /// Landmark name, or the heuristic label for estimates
    pub name: String,
    /// Text to display; estimates carry the configured suffix
    pub label: String,
    pub kind: CrossingKind,
}

impl Crossing {
    fn confirmed(name: &str) -> Self {
        Self {
            name: name.to_string(),
            label: name.to_string(),
            kind: CrossingKind::Confirmed,
        }
    }

    fn estimated(name: &str, suffix: &str) -> Self {
        Self {
            name: name.to_string(),
            label: format!("{name}{suffix}"),
            kind: CrossingKind::Estimated,
        }
    }

    #[inline]
    pub fn is_estimated(&self) -> bool {
        self.kind == CrossingKind::Estimated
    }
}

/// Crossings found on one route
///
/// Confirmed crossings are listed in registry order, not in the order the route
/// passes them. At most one estimated crossing is present, and only when there
/// are no confirmed ones.
#[derive(Debug, Clone, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct DetectionResult {
    crossings: Vec<Crossing>,
}

impl DetectionResult {
    #[inline]
    pub fn crossings(&self) -> &[Crossing] {
        &self.crossings
    }

    /// Display labels, estimates included
    pub fn labels(&self) -> Vec<&str> {
        self.crossings.iter().map(|c| c.label.as_str()).collect()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.crossings.is_empty()
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.crossings.len()
    }

    /// True if the result comes from the shore heuristic
    pub fn is_estimate(&self) -> bool {
        self.crossings.iter().any(Crossing::is_estimated)
    }
}

/// Stateless crossing detector over an immutable configuration
#[derive(Debug, Clone, Default)]
pub struct Detector {
    config: Config,
}

#[cfg_attr(feature = "profiling", profiling::all_functions)]
impl Detector {
    /// Create a detector, validating the heuristic and tolerance
    pub fn new(config: Config) -> Result<Self> {
        config.shore.validate()?;
        if config.parallel_epsilon.is_nan() || config.parallel_epsilon < 0.0 {
            return Err(DetectError::InvalidHeuristic(format!(
                "parallel epsilon must be a non-negative number, got {}",
                config.parallel_epsilon
            )));
        }
        Ok(Self { config })
    }

    #[inline]
    pub fn config(&self) -> &Config {
        &self.config
    }

    #[inline]
    pub fn landmarks(&self) -> &LandmarkRegistry {
        &self.config.landmarks
    }

    /// Detect crossings, using the route's own first and last points for the
    /// shore heuristic
    pub fn detect(&self, route: &RouteGeometry) -> DetectionResult {
        let endpoints = route.start().zip(route.end());
        self.run(route, endpoints)
    }

    /// Detect crossings, using the trip's requested start and end points for the
    /// shore heuristic
    pub fn detect_between(
        &self,
        route: &RouteGeometry,
        start: Coord<f64>,
        end: Coord<f64>,
    ) -> DetectionResult {
        self.run(route, Some((start, end)))
    }

    /// Detect crossings for many routes in parallel
    pub fn detect_batch(&self, routes: &[RouteGeometry]) -> Vec<DetectionResult> {
        #[cfg(feature = "profiling")]
        profiling::scope!("detector::detect_batch");

        routes.par_iter().map(|route| self.detect(route)).collect()
    }

    fn run(
        &self,
        route: &RouteGeometry,
        endpoints: Option<(Coord<f64>, Coord<f64>)>,
    ) -> DetectionResult {
        #[cfg(feature = "profiling")]
        profiling::scope!("detector::run");

        let landmarks = self.config.landmarks.all();
        let matched = self.match_landmarks(route);

        let crossings: Vec<Crossing> = landmarks
            .iter()
            .zip(matched.iter())
            .filter(|(_, hit)| **hit)
            .map(|(landmark, _)| Crossing::confirmed(&landmark.name))
            .collect();

        if !crossings.is_empty() {
            tracing::info!("Detected {} crossing(s) on route", crossings.len());
            return DetectionResult { crossings };
        }

        tracing::debug!("No landmark region touched by the route");
        let shore = &self.config.shore;
        let estimate = endpoints.and_then(|(start, end)| shore.estimate(start, end));
        match estimate {
            Some(name) => {
                tracing::info!(
                    "Route changes shore without a detected crossing, estimating {name}"
                );
                DetectionResult {
                    crossings: vec![Crossing::estimated(name, &shore.estimate_suffix)],
                }
            }
            None => DetectionResult::default(),
        }
    }

    /// One flag per landmark, set when any route segment touches its region
    fn match_landmarks(&self, route: &RouteGeometry) -> SmallVec<[bool; 16]> {
        let landmarks = self.config.landmarks.all();
        let epsilon = self.config.parallel_epsilon;
        let mut matched: SmallVec<[bool; 16]> = smallvec![false; landmarks.len()];

        for segment in route.segments() {
            for (landmark, hit) in landmarks.iter().zip(matched.iter_mut()) {
                if *hit {
                    continue;
                }
                if segment_intersects_region_within(segment, &landmark.bounds, epsilon) {
                    tracing::debug!("Segment {:?} crosses {}", segment, landmark.name);
                    *hit = true;
                }
            }
        }

        matched
    }
}
