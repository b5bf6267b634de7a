//! Crossing Detector Library - Bridge and Tunnel Detection on Routes
//!
//! Given the line geometry of a driving route and a catalog of bridges/tunnels, each
//! described by a latitude/longitude bounding box, this library reports which
//! structures the route crosses. A shore-crossing heuristic estimates the crossing
//! when the geometry touches no box but the trip changes shore.
//!
//! # Architecture
//!
//! - **[`geometry`]**: Segment intersection and segment-vs-rectangle tests
//! - **[`LandmarkRegistry`]**: Ordered, validated catalog of named regions
//! - **[`RouteGeometry`]**: Route polylines parsed from GeoJSON or GPX
//! - **[`Detector`]**: Detection plus the configurable shore heuristic
//! - **[`plan_highlights`]**: Rectangles and markers for a map renderer
//!
//! Detection is a pure function of the route and the configuration: it does no
//! I/O and never fails. Only loading routes and building configurations can fail.

mod detector;
pub mod geometry;
mod highlight;
mod landmark;
mod route;

// Public API exports
pub use detector::{
    Config, Crossing, CrossingKind, DetectionResult, Detector, LatitudeBand, ShoreHeuristic,
};
pub use geometry::{BoundingRegion, segment_intersects_region, segments_intersect};
pub use highlight::{Highlight, plan_highlights, summary};
pub use landmark::{Landmark, LandmarkRegistry};
pub use route::{RouteGeometry, RouteLine};

/// Error types for loading routes and building configurations
#[derive(Debug, thiserror::Error)]
pub enum DetectError {
    #[error("GeoJSON parsing error: {0}")]
    GeoJson(#[from] geojson::Error),

    #[error("GPX parsing error: {0}")]
    GpxParse(#[from] gpx::errors::GpxError),

    #[error("Invalid region: {0}")]
    InvalidRegion(String),

    #[error("Invalid landmark '{name}': {reason}")]
    InvalidLandmark { name: String, reason: String },

    #[error("Duplicate landmark name: {0}")]
    DuplicateLandmark(String),

    #[error("Invalid shore heuristic: {0}")]
    InvalidHeuristic(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, DetectError>;
