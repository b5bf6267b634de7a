//! Render plan for detected crossings
//!
//! Turns a [`DetectionResult`] into plain data a map renderer can draw (one
//! rectangle and one marker per crossing) and the text a UI lists.

use crate::{BoundingRegion, DetectionResult, LandmarkRegistry};
use geo::Coord;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Highlight for one crossing
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Highlight {
    /// Name of the landmark the label resolved to
    pub name: String,
    /// Label as reported by the detector
    pub label: String,
    pub estimated: bool,
    /// Rectangle to draw
    pub region: BoundingRegion,
    /// Marker position (`x = lng`, `y = lat`)
    pub center: Coord<f64>,
}

/// Resolve every crossing label to its landmark region.
///
/// Labels that match no landmark are skipped.
pub fn plan_highlights(result: &DetectionResult, registry: &LandmarkRegistry) -> Vec<Highlight> {
    result
        .crossings()
        .iter()
        .filter_map(|crossing| {
            let Some(landmark) = registry.find_by_name_or_substring(&crossing.label) else {
                tracing::debug!("No landmark region for '{}'", crossing.label);
                return None;
            };
            Some(Highlight {
                name: landmark.name.clone(),
                label: crossing.label.clone(),
                estimated: crossing.is_estimated(),
                region: landmark.bounds,
                center: landmark.bounds.center(),
            })
        })
        .collect()
}

/// Text listing of the crossings
pub fn summary(result: &DetectionResult) -> String {
    if result.is_empty() {
        return "No crossings found on the route.".to_string();
    }

    let mut text = format!("{} crossing(s) found on the route:", result.len());
    for label in result.labels() {
        text.push_str("\n- ");
        text.push_str(label);
    }
    text
}
