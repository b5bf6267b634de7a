//! Geometry primitives for crossing detection
//!
//! All tests work on a flat `(x = longitude, y = latitude)` plane. Coordinates are
//! stored as [`geo::Coord`] and segments as [`geo::Line`], so a route point built
//! from a GeoJSON position or a GPX waypoint can be used directly.

use crate::{DetectError, Result};
use geo::{Coord, Line};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Valid WGS84 latitude range in degrees
pub const MAX_LATITUDE: f64 = 90.0;

/// Valid WGS84 longitude range in degrees
pub const MAX_LONGITUDE: f64 = 180.0;

/// Build a coordinate from latitude and longitude in degrees
#[inline(always)]
pub fn coord(lat: f64, lng: f64) -> Coord<f64> {
    Coord { x: lng, y: lat }
}

/// Check that a coordinate is finite and within WGS84 bounds
#[inline(always)]
pub fn is_valid_wgs84(c: Coord<f64>) -> bool {
    c.x.is_finite()
        && c.y.is_finite()
        && c.y.abs() <= MAX_LATITUDE
        && c.x.abs() <= MAX_LONGITUDE
}

/// Test whether segment `a1-a2` intersects segment `b1-b2`.
///
/// Uses the parametric line intersection formula. Segments whose denominator is
/// exactly zero (parallel, collinear or zero-length) never intersect, so a
/// collinear overlap is not credited as a crossing.
#[inline]
pub fn segments_intersect(
    a1: Coord<f64>,
    a2: Coord<f64>,
    b1: Coord<f64>,
    b2: Coord<f64>,
) -> bool {
    segments_intersect_within(a1, a2, b1, b2, 0.0)
}

/// Same as [`segments_intersect`], but a denominator with `|denom| <= epsilon` is
/// treated as parallel.
///
/// With `epsilon == 0.0` this matches the exact-zero test.
pub fn segments_intersect_within(
    a1: Coord<f64>,
    a2: Coord<f64>,
    b1: Coord<f64>,
    b2: Coord<f64>,
    epsilon: f64,
) -> bool {
    let denom = (b2.y - b1.y) * (a2.x - a1.x) - (b2.x - b1.x) * (a2.y - a1.y);
    if denom.abs() <= epsilon {
        return false;
    }

    let ua = ((b2.x - b1.x) * (a1.y - b1.y) - (b2.y - b1.y) * (a1.x - b1.x)) / denom;
    let ub = ((a2.x - a1.x) * (a1.y - b1.y) - (a2.y - a1.y) * (a1.x - b1.x)) / denom;

    (0.0..=1.0).contains(&ua) && (0.0..=1.0).contains(&ub)
}

/// Rectangular region in latitude/longitude space
///
/// Expected to satisfy `north >= south` and `east >= west`; see [`BoundingRegion::validate`].
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct BoundingRegion {
    pub north: f64,
    pub south: f64,
    pub east: f64,
    pub west: f64,
}

impl BoundingRegion {
    pub const fn new(north: f64, south: f64, east: f64, west: f64) -> Self {
        Self {
            north,
            south,
            east,
            west,
        }
    }

    /// Inclusive point-in-rectangle test
    #[inline]
    pub fn contains(&self, c: Coord<f64>) -> bool {
        c.y <= self.north && c.y >= self.south && c.x <= self.east && c.x >= self.west
    }

    /// The four boundary edges, corner to corner:
    /// west side, north side, east side, south side.
    pub fn edges(&self) -> [Line<f64>; 4] {
        let south_west = coord(self.south, self.west);
        let north_west = coord(self.north, self.west);
        let north_east = coord(self.north, self.east);
        let south_east = coord(self.south, self.east);
        [
            Line::new(south_west, north_west),
            Line::new(north_west, north_east),
            Line::new(north_east, south_east),
            Line::new(south_east, south_west),
        ]
    }

    /// Midpoint of the region, where a marker for it is placed
    pub fn center(&self) -> Coord<f64> {
        coord(
            (self.north + self.south) / 2.0,
            (self.east + self.west) / 2.0,
        )
    }

    /// Smallest region containing every coordinate, or `None` if there are none
    pub fn enclosing(coords: impl IntoIterator<Item = Coord<f64>>) -> Option<Self> {
        let mut region: Option<Self> = None;
        for c in coords {
            let r = region.get_or_insert(Self::new(c.y, c.y, c.x, c.x));
            r.north = r.north.max(c.y);
            r.south = r.south.min(c.y);
            r.east = r.east.max(c.x);
            r.west = r.west.min(c.x);
        }
        region
    }

    /// Check the documented invariants.
    ///
    /// Degenerate regions (`north == south` or `east == west`) are allowed.
    pub fn validate(&self) -> Result<()> {
        let corners = [coord(self.north, self.east), coord(self.south, self.west)];
        if !corners.into_iter().all(is_valid_wgs84) {
            return Err(DetectError::InvalidRegion(format!(
                "bounds out of WGS84 range: {self:?}"
            )));
        }
        if self.north < self.south {
            return Err(DetectError::InvalidRegion(format!(
                "north {} is below south {}",
                self.north, self.south
            )));
        }
        if self.east < self.west {
            return Err(DetectError::InvalidRegion(format!(
                "east {} is west of west {}",
                self.east, self.west
            )));
        }
        Ok(())
    }
}

/// Test whether a segment touches a region: either endpoint is inside it, or the
/// segment crosses one of its four edges.
#[inline]
pub fn segment_intersects_region(segment: Line<f64>, region: &BoundingRegion) -> bool {
    segment_intersects_region_within(segment, region, 0.0)
}

/// [`segment_intersects_region`] with a tolerance for the parallel test
pub fn segment_intersects_region_within(
    segment: Line<f64>,
    region: &BoundingRegion,
    epsilon: f64,
) -> bool {
    if region.contains(segment.start) || region.contains(segment.end) {
        return true;
    }

    region.edges().iter().any(|edge| {
        segments_intersect_within(segment.start, segment.end, edge.start, edge.end, epsilon)
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn galata() -> BoundingRegion {
        BoundingRegion::new(41.0210, 41.0180, 28.9760, 28.9710)
    }

    #[test]
    fn test_crossing_segments_intersect() {
        let a1 = coord(0.0, 0.0);
        let a2 = coord(1.0, 1.0);
        let b1 = coord(1.0, 0.0);
        let b2 = coord(0.0, 1.0);
        assert!(segments_intersect(a1, a2, b1, b2));
    }

    #[test]
    fn test_disjoint_segments_do_not_intersect() {
        // Lines would meet if extended, but not within both segments
        let a1 = coord(0.0, 0.0);
        let a2 = coord(1.0, 1.0);
        let b1 = coord(0.0, 3.0);
        let b2 = coord(1.0, 2.5);
        assert!(!segments_intersect(a1, a2, b1, b2));
    }

    #[test]
    fn test_touching_endpoint_counts() {
        let a1 = coord(0.0, 0.0);
        let a2 = coord(0.0, 1.0);
        let b1 = coord(0.0, 1.0);
        let b2 = coord(1.0, 1.0);
        assert!(segments_intersect(a1, a2, b1, b2));
    }

    #[test]
    fn test_symmetry() {
        let values = [-1.0, -0.25, 0.0, 0.5, 1.0, 2.0];
        let mut checked = 0;
        for &x1 in &values {
            for &y1 in &values {
                for &x2 in &values {
                    for &y2 in &values {
                        let a1 = coord(y1, x1);
                        let a2 = coord(y2, x2);
                        let b1 = coord(x1, -y2);
                        let b2 = coord(x2 + 0.5, y1);
                        assert_eq!(
                            segments_intersect(a1, a2, b1, b2),
                            segments_intersect(b1, b2, a1, a2),
                            "asymmetric for {a1:?}-{a2:?} / {b1:?}-{b2:?}"
                        );
                        checked += 1;
                    }
                }
            }
        }
        assert_eq!(checked, values.len().pow(4));
    }

    #[test]
    fn test_parallel_segments_never_intersect() {
        let a1 = coord(0.0, 0.0);
        let a2 = coord(1.0, 2.0);
        let b1 = coord(0.5, 0.0);
        let b2 = coord(1.5, 2.0);
        assert!(!segments_intersect(a1, a2, b1, b2));
    }

    #[test]
    fn test_collinear_overlap_not_credited() {
        let a1 = coord(0.0, 0.0);
        let a2 = coord(0.0, 2.0);
        let b1 = coord(0.0, 1.0);
        let b2 = coord(0.0, 3.0);
        assert!(!segments_intersect(a1, a2, b1, b2));
    }

    #[test]
    fn test_zero_length_segment_is_degenerate() {
        let p = coord(0.5, 0.5);
        assert!(!segments_intersect(p, p, coord(0.0, 0.0), coord(1.0, 1.0)));
        assert!(!segments_intersect(coord(0.0, 1.0), coord(1.0, 0.0), p, p));
    }

    #[test]
    fn test_epsilon_treats_near_parallel_as_parallel() {
        let a1 = coord(0.0, 0.0);
        let a2 = coord(0.0, 1.0);
        let b1 = coord(-0.5, 0.5);
        let b2 = coord(0.5, 0.5 + 1e-9);
        assert!(segments_intersect(a1, a2, b1, b2));
        assert!(segments_intersect_within(a1, a2, b1, b2, 0.0));
        // denom here is ~1.0, so only a huge tolerance discards it
        assert!(!segments_intersect_within(a1, a2, b1, b2, 2.0));
    }

    #[test]
    fn test_region_contains_is_inclusive() {
        let region = galata();
        assert!(region.contains(coord(41.0195, 28.9730)));
        assert!(region.contains(coord(41.0210, 28.9760)));
        assert!(region.contains(coord(41.0180, 28.9710)));
        assert!(!region.contains(coord(41.0211, 28.9730)));
    }

    #[test]
    fn test_endpoint_inside_region() {
        let region = galata();
        let inside = coord(41.0195, 28.9730);
        let outside = coord(41.5, 29.5);
        assert!(segment_intersects_region(Line::new(inside, outside), &region));
        assert!(segment_intersects_region(Line::new(outside, inside), &region));
        // Zero-length segment inside the region still counts
        assert!(segment_intersects_region(Line::new(inside, inside), &region));
    }

    #[test]
    fn test_segment_passing_through_region() {
        let region = galata();
        let segment = Line::new(coord(41.0195, 28.9700), coord(41.0195, 28.9770));
        assert!(segment_intersects_region(segment, &region));
    }

    #[test]
    fn test_segment_missing_region() {
        let region = galata();
        let segment = Line::new(coord(41.0250, 28.9700), coord(41.0250, 28.9770));
        assert!(!segment_intersects_region(segment, &region));
    }

    #[test]
    fn test_degenerate_region_is_still_crossable() {
        // Zero-height region, like a tunnel drawn as a line
        let region = BoundingRegion::new(40.9990, 40.9990, 29.0000, 28.9700);
        let segment = Line::new(coord(40.98, 28.99), coord(41.01, 28.99));
        assert!(segment_intersects_region(segment, &region));
    }

    #[test]
    fn test_edges_order() {
        let region = BoundingRegion::new(2.0, 1.0, 4.0, 3.0);
        let edges = region.edges();
        assert_eq!(edges[0], Line::new(coord(1.0, 3.0), coord(2.0, 3.0)));
        assert_eq!(edges[1], Line::new(coord(2.0, 3.0), coord(2.0, 4.0)));
        assert_eq!(edges[2], Line::new(coord(2.0, 4.0), coord(1.0, 4.0)));
        assert_eq!(edges[3], Line::new(coord(1.0, 4.0), coord(1.0, 3.0)));
    }

    #[test]
    fn test_center() {
        let region = BoundingRegion::new(2.0, 1.0, 4.0, 3.0);
        assert_eq!(region.center(), coord(1.5, 3.5));
    }

    #[test]
    fn test_enclosing() {
        assert!(BoundingRegion::enclosing(std::iter::empty()).is_none());
        let region =
            BoundingRegion::enclosing([coord(41.0, 29.0), coord(40.9, 29.2), coord(41.1, 28.9)])
                .unwrap();
        assert_eq!(region, BoundingRegion::new(41.1, 40.9, 29.2, 28.9));
    }

    #[test]
    fn test_validate() {
        assert!(galata().validate().is_ok());
        assert!(BoundingRegion::new(1.0, 1.0, 2.0, 2.0).validate().is_ok());
        assert!(BoundingRegion::new(1.0, 2.0, 2.0, 1.0).validate().is_err());
        assert!(BoundingRegion::new(2.0, 1.0, 1.0, 2.0).validate().is_err());
        assert!(BoundingRegion::new(91.0, 1.0, 2.0, 1.0).validate().is_err());
        assert!(BoundingRegion::new(f64::NAN, 1.0, 2.0, 1.0).validate().is_err());
    }

    #[test]
    fn test_is_valid_wgs84() {
        assert!(is_valid_wgs84(coord(90.0, -180.0)));
        assert!(!is_valid_wgs84(coord(90.1, 0.0)));
        assert!(!is_valid_wgs84(coord(0.0, 180.5)));
        assert!(!is_valid_wgs84(coord(f64::INFINITY, 0.0)));
    }
}
