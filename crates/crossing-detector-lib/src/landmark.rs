//! Landmark catalog
//!
//! A [`LandmarkRegistry`] is an ordered, validated list of named bridges and tunnels.
//! It is built once at startup and only read afterwards. Registry order is the
//! order crossings are reported in.

use crate::{BoundingRegion, DetectError, Result};
use std::collections::HashSet;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// A named crossing structure with its bounding region
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Landmark {
    pub name: String,
    pub bounds: BoundingRegion,
}

impl Landmark {
    pub fn new(name: impl Into<String>, bounds: BoundingRegion) -> Self {
        Self {
            name: name.into(),
            bounds,
        }
    }
}

/// Ordered, read-only collection of landmarks with unique names
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(try_from = "Vec<Landmark>", into = "Vec<Landmark>"))]
pub struct LandmarkRegistry {
    landmarks: Vec<Landmark>,
}

#[cfg_attr(feature = "profiling", profiling::all_functions)]
impl LandmarkRegistry {
    /// Build a registry, checking every name and bounding region
    ///
    /// # Errors
    /// Fails on an empty or duplicated name, or on bounds that are out of WGS84
    /// range or inverted (`north < south`, `east < west`).
    pub fn new(landmarks: Vec<Landmark>) -> Result<Self> {
        let mut seen = HashSet::with_capacity(landmarks.len());
        for landmark in &landmarks {
            if landmark.name.trim().is_empty() {
                return Err(DetectError::InvalidLandmark {
                    name: landmark.name.clone(),
                    reason: "name is empty".to_string(),
                });
            }
            if !seen.insert(landmark.name.as_str()) {
                return Err(DetectError::DuplicateLandmark(landmark.name.clone()));
            }
            landmark
                .bounds
                .validate()
                .map_err(|e| DetectError::InvalidLandmark {
                    name: landmark.name.clone(),
                    reason: e.to_string(),
                })?;
        }

        tracing::debug!("Landmark registry built with {} entries", landmarks.len());
        Ok(Self { landmarks })
    }

    /// The built-in catalog of Bosphorus and Golden Horn crossings in Istanbul
    pub fn istanbul() -> Self {
        Self {
            landmarks: vec![
                Landmark::new(
                    "15 Temmuz Şehitler Köprüsü (Boğaziçi Köprüsü)",
                    BoundingRegion::new(41.0480, 41.0430, 29.0420, 29.0320),
                ),
                Landmark::new(
                    "Fatih Sultan Mehmet Köprüsü",
                    BoundingRegion::new(41.0940, 41.0890, 29.0610, 29.0530),
                ),
                Landmark::new(
                    "Yavuz Sultan Selim Köprüsü",
                    BoundingRegion::new(41.1950, 41.1850, 29.1300, 29.1100),
                ),
                // Drawn as a horizontal line: north == south
                Landmark::new(
                    "Avrasya Tüneli",
                    BoundingRegion::new(40.9990, 40.9990, 29.0000, 28.9700),
                ),
                Landmark::new(
                    "Marmaray",
                    BoundingRegion::new(41.0040, 40.9960, 29.0180, 28.9900),
                ),
                Landmark::new(
                    "Haliç Köprüsü",
                    BoundingRegion::new(41.0350, 41.0320, 28.9490, 28.9400),
                ),
                Landmark::new(
                    "Galata Köprüsü",
                    BoundingRegion::new(41.0210, 41.0180, 28.9760, 28.9710),
                ),
            ],
        }
    }

    /// All landmarks, always in the same order
    #[inline]
    pub fn all(&self) -> &[Landmark] {
        &self.landmarks
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.landmarks.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.landmarks.is_empty()
    }

    /// Exact name lookup
    pub fn get(&self, name: &str) -> Option<&Landmark> {
        self.landmarks.iter().find(|l| l.name == name)
    }

    /// Find the first landmark whose name equals `text` or appears inside it.
    ///
    /// Used to map a reported label back to its region, e.g. `"Marmaray (estimated)"`
    /// resolves to `Marmaray`. A label naming two structures resolves to the one
    /// listed first in the registry.
    pub fn find_by_name_or_substring(&self, text: &str) -> Option<&Landmark> {
        self.landmarks
            .iter()
            .find(|l| l.name == text || text.contains(l.name.as_str()))
    }
}

impl Default for LandmarkRegistry {
    fn default() -> Self {
        Self::istanbul()
    }
}

impl TryFrom<Vec<Landmark>> for LandmarkRegistry {
    type Error = DetectError;

    fn try_from(landmarks: Vec<Landmark>) -> Result<Self> {
        Self::new(landmarks)
    }
}

impl From<LandmarkRegistry> for Vec<Landmark> {
    fn from(registry: LandmarkRegistry) -> Self {
        registry.landmarks
    }
}
