#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Coordinate reference, point, extent and drawn geometry types.
//!
//! These are the plain value types shared by every `envmap` crate. They
//! carry no behavior beyond construction and inspection; reprojection and
//! containment live in `envmap_projection` and `envmap_filter`.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display, EnumString};

/// A coordinate reference system identified by its EPSG code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum Crs {
    /// Geographic WGS84 (EPSG:4326), degrees.
    Wgs84,
    /// Spherical Web Mercator (EPSG:3857, also published as 102100), meters.
    WebMercator,
    /// Any other EPSG code. Carried through but not reprojectable.
    Other(u32),
}

/// Legacy codes servers still publish for Web Mercator.
const WEB_MERCATOR_ALIASES: &[u32] = &[3857, 102_100, 102_113, 900_913, 3785];

impl Crs {
    /// Creates a CRS from an EPSG (or ESRI well-known) code.
    #[must_use]
    pub fn from_code(code: u32) -> Self {
        if code == 4326 {
            Self::Wgs84
        } else if WEB_MERCATOR_ALIASES.contains(&code) {
            Self::WebMercator
        } else {
            Self::Other(code)
        }
    }

    /// Returns the latest EPSG code for this CRS.
    #[must_use]
    pub const fn code(self) -> u32 {
        match self {
            Self::Wgs84 => 4326,
            Self::WebMercator => 3857,
            Self::Other(code) => code,
        }
    }

    /// Whether coordinates in this CRS are geographic degrees.
    #[must_use]
    pub const fn is_geographic(self) -> bool {
        matches!(self, Self::Wgs84)
    }
}

impl fmt::Display for Crs {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "EPSG:{}", self.code())
    }
}

/// Error returned when a CRS identifier cannot be parsed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CrsParseError {
    /// The identifier that failed to parse.
    pub input: String,
}

impl fmt::Display for CrsParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unrecognized CRS identifier: {:?}", self.input)
    }
}

impl std::error::Error for CrsParseError {}

impl FromStr for Crs {
    type Err = CrsParseError;

    /// Accepts `EPSG:3857`, bare codes, `urn:ogc:def:crs:EPSG::4326` and the
    /// OGC `CRS84` aliases.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        let upper = trimmed.to_ascii_uppercase();

        if upper.ends_with("CRS84") {
            return Ok(Self::Wgs84);
        }

        let code = upper
            .rsplit(':')
            .next()
            .filter(|c| !c.is_empty())
            .and_then(|c| c.parse::<u32>().ok())
            .ok_or_else(|| CrsParseError {
                input: trimmed.to_string(),
            })?;

        Ok(Self::from_code(code))
    }
}

impl TryFrom<String> for Crs {
    type Error = CrsParseError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Crs> for String {
    fn from(value: Crs) -> Self {
        value.to_string()
    }
}

/// A geographic position in WGS84 degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LonLat {
    /// Longitude in degrees (X).
    pub lon: f64,
    /// Latitude in degrees (Y).
    pub lat: f64,
}

impl LonLat {
    /// Creates a new geographic position.
    #[must_use]
    pub const fn new(lon: f64, lat: f64) -> Self {
        Self { lon, lat }
    }

    /// Returns this position as a [`MapPoint`] in [`Crs::Wgs84`].
    #[must_use]
    pub const fn to_map_point(self) -> MapPoint {
        MapPoint::new(self.lon, self.lat, Crs::Wgs84)
    }
}

/// A point in a projected or geographic CRS.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MapPoint {
    /// Easting (or longitude).
    pub x: f64,
    /// Northing (or latitude).
    pub y: f64,
    /// Reference system of `x` and `y`.
    pub crs: Crs,
}

impl MapPoint {
    /// Creates a new map point.
    #[must_use]
    pub const fn new(x: f64, y: f64, crs: Crs) -> Self {
        Self { x, y, crs }
    }

    /// Returns the coordinates as an `[x, y]` pair.
    #[must_use]
    pub const fn xy(&self) -> [f64; 2] {
        [self.x, self.y]
    }
}

/// An axis-aligned extent in a given CRS.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Extent {
    /// Minimum X.
    pub xmin: f64,
    /// Minimum Y.
    pub ymin: f64,
    /// Maximum X.
    pub xmax: f64,
    /// Maximum Y.
    pub ymax: f64,
    /// Reference system of the bounds.
    pub crs: Crs,
}

impl Extent {
    /// Creates a new extent.
    #[must_use]
    pub const fn new(xmin: f64, ymin: f64, xmax: f64, ymax: f64, crs: Crs) -> Self {
        Self {
            xmin,
            ymin,
            xmax,
            ymax,
            crs,
        }
    }

    /// Width of the extent in CRS units.
    #[must_use]
    pub fn width(&self) -> f64 {
        self.xmax - self.xmin
    }

    /// Height of the extent in CRS units.
    #[must_use]
    pub fn height(&self) -> f64 {
        self.ymax - self.ymin
    }

    /// Center of the extent.
    #[must_use]
    pub fn center(&self) -> MapPoint {
        MapPoint::new(
            f64::midpoint(self.xmin, self.xmax),
            f64::midpoint(self.ymin, self.ymax),
            self.crs,
        )
    }

    /// Whether `point` lies inside (or on the edge of) this extent.
    #[must_use]
    pub fn contains(&self, point: &MapPoint) -> bool {
        point.crs == self.crs
            && point.x >= self.xmin
            && point.x <= self.xmax
            && point.y >= self.ymin
            && point.y <= self.ymax
    }
}

/// A pixel position on the screen, measured from the top-left corner.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScreenPoint {
    /// Pixel column.
    pub x: f64,
    /// Pixel row.
    pub y: f64,
}

impl ScreenPoint {
    /// Creates a new screen point.
    #[must_use]
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// Size of the map view in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ViewSize {
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
}

impl ViewSize {
    /// Creates a new view size.
    #[must_use]
    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    /// Whether either dimension is zero.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }

    /// Whether `point` lies on one of the view's pixels.
    #[must_use]
    pub fn contains(&self, point: ScreenPoint) -> bool {
        point.x >= 0.0
            && point.y >= 0.0
            && point.x < f64::from(self.width)
            && point.y < f64::from(self.height)
    }
}

/// The kind of geometry a graphic carries.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    AsRefStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum GeometryType {
    /// A single point.
    Point,
    /// An open line.
    Polyline,
    /// A closed area.
    Polygon,
}

/// The interactive tool used to sketch a geometry.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    AsRefStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum DrawTool {
    /// Click to place a point.
    Point,
    /// Click vertices of an open line.
    Polyline,
    /// Click vertices of a closed area.
    Polygon,
    /// Drag an axis-aligned box.
    Rectangle,
    /// Drag a radius around a center.
    Circle,
}

impl DrawTool {
    /// The geometry type this tool produces on completion.
    ///
    /// Rectangles and circles are areas and therefore polygons.
    #[must_use]
    pub const fn produces(self) -> GeometryType {
        match self {
            Self::Point => GeometryType::Point,
            Self::Polyline => GeometryType::Polyline,
            Self::Polygon | Self::Rectangle | Self::Circle => GeometryType::Polygon,
        }
    }
}

/// A geometry completed by the drawing surface.
///
/// Coordinates are `[x, y]` pairs in `crs`. Polygon rings do not need to be
/// explicitly closed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum DrawnGeometry {
    /// A single point.
    Point {
        /// Reference system.
        crs: Crs,
        /// Position.
        coordinates: [f64; 2],
    },
    /// An open line.
    Polyline {
        /// Reference system.
        crs: Crs,
        /// Vertices in drawing order.
        coordinates: Vec<[f64; 2]>,
    },
    /// A polygon with optional holes.
    Polygon {
        /// Reference system.
        crs: Crs,
        /// Outer ring.
        exterior: Vec<[f64; 2]>,
        /// Inner rings (holes).
        #[serde(default)]
        interiors: Vec<Vec<[f64; 2]>>,
    },
}

impl DrawnGeometry {
    /// Creates a polygon without holes.
    #[must_use]
    pub const fn polygon(crs: Crs, exterior: Vec<[f64; 2]>) -> Self {
        Self::Polygon {
            crs,
            exterior,
            interiors: Vec::new(),
        }
    }

    /// Creates the polygon a rectangle tool produces from two opposite corners.
    #[must_use]
    pub fn rectangle(crs: Crs, a: [f64; 2], b: [f64; 2]) -> Self {
        let (xmin, xmax) = (a[0].min(b[0]), a[0].max(b[0]));
        let (ymin, ymax) = (a[1].min(b[1]), a[1].max(b[1]));
        Self::polygon(
            crs,
            vec![[xmin, ymin], [xmax, ymin], [xmax, ymax], [xmin, ymax]],
        )
    }

    /// Creates the polygon a circle tool produces, approximated by
    /// `segments` vertices (at least 3).
    #[must_use]
    pub fn circle(crs: Crs, center: [f64; 2], radius: f64, segments: u16) -> Self {
        let segments = segments.max(3);
        let step = std::f64::consts::TAU / f64::from(segments);
        let exterior = (0..segments)
            .map(|i| {
                let angle = step * f64::from(i);
                [
                    radius.mul_add(angle.cos(), center[0]),
                    radius.mul_add(angle.sin(), center[1]),
                ]
            })
            .collect();
        Self::polygon(crs, exterior)
    }

    /// Returns the geometry type.
    #[must_use]
    pub const fn geometry_type(&self) -> GeometryType {
        match self {
            Self::Point { .. } => GeometryType::Point,
            Self::Polyline { .. } => GeometryType::Polyline,
            Self::Polygon { .. } => GeometryType::Polygon,
        }
    }

    /// Returns the reference system of the coordinates.
    #[must_use]
    pub const fn crs(&self) -> Crs {
        match self {
            Self::Point { crs, .. } | Self::Polyline { crs, .. } | Self::Polygon { crs, .. } => {
                *crs
            }
        }
    }

    /// Creates a point geometry from a [`MapPoint`].
    #[must_use]
    pub const fn from_point(point: MapPoint) -> Self {
        Self::Point {
            crs: point.crs,
            coordinates: point.xy(),
        }
    }
}
