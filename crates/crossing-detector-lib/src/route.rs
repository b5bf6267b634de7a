//! Route geometry storage and parsing
//!
//! A [`RouteGeometry`] is the ordered set of polylines a routing provider returned
//! for one trip. It can be built from GeoJSON (the provider's format) or from a GPX
//! file, and is read-only once built.

use crate::geometry::{self, BoundingRegion};
use crate::Result;
use geo::{Coord, Line};
use geojson::{GeoJson, Geometry, Value};
use std::path::Path;

/// One continuous polyline of a route
pub type RouteLine = Vec<Coord<f64>>;

/// Ordered collection of polylines describing one route
#[derive(Clone, Debug, Default, PartialEq)]
pub struct RouteGeometry {
    lines: Vec<RouteLine>,
}

#[cfg_attr(feature = "profiling", profiling::all_functions)]
impl RouteGeometry {
    /// Create a route from already-converted polylines (`x = lng`, `y = lat`)
    pub fn new(lines: Vec<RouteLine>) -> Self {
        Self { lines }
    }

    /// Parse provider GeoJSON text
    pub fn from_geojson_str(text: &str) -> Result<Self> {
        let geojson = text.parse::<GeoJson>()?;
        Ok(Self::from_geojson(&geojson))
    }

    /// Collect every `LineString` in a GeoJSON document.
    ///
    /// Accepts a feature collection, a single feature or a bare geometry. Other
    /// geometry types are ignored.
    pub fn from_geojson(geojson: &GeoJson) -> Self {
        #[cfg(feature = "profiling")]
        profiling::scope!("route::from_geojson");

        let mut lines = Vec::new();
        match geojson {
            GeoJson::FeatureCollection(collection) => {
                for feature in &collection.features {
                    if let Some(geometry) = &feature.geometry {
                        Self::push_geometry(geometry, &mut lines);
                    }
                }
            }
            GeoJson::Feature(feature) => {
                if let Some(geometry) = &feature.geometry {
                    Self::push_geometry(geometry, &mut lines);
                }
            }
            GeoJson::Geometry(geometry) => Self::push_geometry(geometry, &mut lines),
        }

        tracing::debug!("Parsed {} line(s) from GeoJSON", lines.len());
        Self { lines }
    }

    fn push_geometry(geom: &Geometry, lines: &mut Vec<RouteLine>) {
        match &geom.value {
            Value::LineString(positions) => {
                let points = positions.iter().map(|position| {
                    // GeoJSON positions are [longitude, latitude, (elevation)]
                    let valid = match position.as_slice() {
                        [lng, lat, ..] => {
                            let c = geometry::coord(*lat, *lng);
                            geometry::is_valid_wgs84(c).then_some(c)
                        }
                        _ => None,
                    };
                    if valid.is_none() {
                        tracing::warn!("Skipping invalid GeoJSON position: {:?}", position);
                    }
                    valid
                });
                push_split(points, lines);
            }
            _ => tracing::debug!("Ignoring non-LineString geometry"),
        }
    }

    /// Convert GPX data: every track segment and every GPX route becomes one line
    pub fn from_gpx(gpx: &gpx::Gpx) -> Self {
        #[cfg(feature = "profiling")]
        profiling::scope!("route::from_gpx");

        let tracks = gpx
            .tracks
            .iter()
            .flat_map(|track| track.segments.iter())
            .map(|segment| &segment.points);
        let routes = gpx.routes.iter().map(|route| &route.points);

        let mut lines = Vec::new();
        for points in tracks.chain(routes) {
            let points = points.iter().map(|waypoint| {
                let c = waypoint.point().0;
                let valid = geometry::is_valid_wgs84(c).then_some(c);
                if valid.is_none() {
                    tracing::warn!("Skipping GPX point outside WGS84 bounds: {:?}", c);
                }
                valid
            });
            push_split(points, &mut lines);
        }

        tracing::debug!("Parsed {} line(s) from GPX", lines.len());
        Self { lines }
    }

    /// Load a route file: `.gpx` files are read as GPX, anything else as GeoJSON
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let is_gpx = path
            .extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| ext.eq_ignore_ascii_case("gpx"));

        let route = if is_gpx {
            let file = std::fs::File::open(path)?;
            let reader = std::io::BufReader::new(file);
            Self::from_gpx(&gpx::read(reader)?)
        } else {
            Self::from_geojson_str(&std::fs::read_to_string(path)?)?
        };

        if route.is_empty() {
            tracing::warn!("No usable line geometry in {}", path.display());
        }
        Ok(route)
    }

    /// The polylines, in provider order
    #[inline]
    pub fn lines(&self) -> &[RouteLine] {
        &self.lines
    }

    /// Every consecutive pair of points, line by line. Lines with fewer than two
    /// points yield nothing.
    pub fn segments(&self) -> impl Iterator<Item = Line<f64>> + '_ {
        self.lines
            .iter()
            .flat_map(|line| line.windows(2).map(|pair| Line::new(pair[0], pair[1])))
    }

    /// First point of the route
    pub fn start(&self) -> Option<Coord<f64>> {
        self.lines.iter().find_map(|line| line.first().copied())
    }

    /// Last point of the route
    pub fn end(&self) -> Option<Coord<f64>> {
        self.lines.iter().rev().find_map(|line| line.last().copied())
    }

    /// True if the route has no points at all
    pub fn is_empty(&self) -> bool {
        self.lines.iter().all(|line| line.is_empty())
    }

    pub fn total_points(&self) -> usize {
        self.lines.iter().map(|line| line.len()).sum()
    }

    /// Region enclosing every point, or `None` for an empty route
    pub fn bounding_region(&self) -> Option<BoundingRegion> {
        BoundingRegion::enclosing(self.lines.iter().flatten().copied())
    }

    /// Length of all lines in meters (gaps between lines are not counted)
    pub fn total_distance(&self) -> f64 {
        self.segments()
            .map(|segment| haversine_distance(segment.start, segment.end))
            .sum()
    }
}

impl From<Vec<RouteLine>> for RouteGeometry {
    fn from(lines: Vec<RouteLine>) -> Self {
        Self::new(lines)
    }
}

/// Append the valid points as lines, starting a new line after every invalid
/// point so no segment bridges the gap. Empty lines are not pushed.
fn push_split<I>(points: I, lines: &mut Vec<RouteLine>)
where
    I: Iterator<Item = Option<Coord<f64>>>,
{
    let mut current = RouteLine::with_capacity(points.size_hint().0);
    for point in points {
        match point {
            Some(c) => current.push(c),
            None => {
                if !current.is_empty() {
                    lines.push(std::mem::take(&mut current));
                }
            }
        }
    }
    if !current.is_empty() {
        lines.push(current);
    }
}

/// Haversine distance between two coordinates in meters
#[inline]
fn haversine_distance(p1: Coord<f64>, p2: Coord<f64>) -> f64 {
    let lat1 = p1.y.to_radians();
    let lat2 = p2.y.to_radians();
    let delta_lat = (p2.y - p1.y).to_radians();
    let delta_lon = (p2.x - p1.x).to_radians();

    let a = (delta_lat / 2.0).sin().powi(2)
        + lat1.cos() * lat2.cos() * (delta_lon / 2.0).sin().powi(2);
    let c = 2.0 * a.sqrt().atan2((1.0 - a).sqrt());

    // Earth's radius in meters
    const EARTH_RADIUS_M: f64 = 6371000.0;
    EARTH_RADIUS_M * c
}
