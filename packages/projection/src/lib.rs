#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Point reprojection between WGS84 and spherical Web Mercator.
//!
//! Only the two reference systems a web map needs are supported. Anything
//! else yields [`ProjectionError::Unsupported`] so callers can skip the
//! point instead of failing a whole batch.

use envmap_geometry_models::{Crs, LonLat, MapPoint};
use thiserror::Error;

/// Semi-major axis of the WGS84 ellipsoid, used as the sphere radius of
/// Web Mercator.
pub const WGS84_SEMIMAJOR: f64 = 6_378_137.0;

/// Latitude limit of the square Web Mercator world.
pub const WEB_MERCATOR_MAX_LAT: f64 = 85.051_128_779_806_59;

/// Errors from reprojecting a point.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ProjectionError {
    /// No transformation between the two reference systems is available.
    #[error("no transformation from {from} to {to}")]
    Unsupported {
        /// Source reference system.
        from: Crs,
        /// Target reference system.
        to: Crs,
    },

    /// The coordinate lies outside the valid domain of the source CRS or
    /// projects to a non-finite value.
    #[error("coordinate ({x}, {y}) is outside the domain of {crs}")]
    OutOfDomain {
        /// X / longitude.
        x: f64,
        /// Y / latitude.
        y: f64,
        /// Reference system the coordinate was given in.
        crs: Crs,
    },
}

/// Capability to transform a point into another reference system.
pub trait Reproject {
    /// Returns `point` expressed in `target`.
    ///
    /// # Errors
    ///
    /// Returns [`ProjectionError`] if no transformation exists or the
    /// coordinate cannot be transformed.
    fn reproject(&self, point: &MapPoint, target: Crs) -> Result<MapPoint, ProjectionError>;
}

/// Spherical Web Mercator on the WGS84 semi-major axis.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WebMercator {
    radius: f64,
}

impl Default for WebMercator {
    fn default() -> Self {
        Self {
            radius: WGS84_SEMIMAJOR,
        }
    }
}

impl WebMercator {
    /// Projects a geographic position into meters.
    ///
    /// # Errors
    ///
    /// Returns [`ProjectionError::OutOfDomain`] for non-finite input,
    /// longitudes outside ±180° or latitudes at or beyond the poles.
    pub fn project(&self, position: LonLat) -> Result<MapPoint, ProjectionError> {
        let out_of_domain = || ProjectionError::OutOfDomain {
            x: position.lon,
            y: position.lat,
            crs: Crs::Wgs84,
        };

        if !position.lon.is_finite()
            || !position.lat.is_finite()
            || position.lon.abs() > 180.0
            || position.lat.abs() >= 90.0
        {
            return Err(out_of_domain());
        }

        let x = self.radius * position.lon.to_radians();
        let y = self.radius
            * (std::f64::consts::FRAC_PI_4 + position.lat.to_radians() / 2.0)
                .tan()
                .ln();

        if x.is_finite() && y.is_finite() {
            Ok(MapPoint::new(x, y, Crs::WebMercator))
        } else {
            Err(out_of_domain())
        }
    }

    /// Converts meters back into a geographic position.
    ///
    /// # Errors
    ///
    /// Returns [`ProjectionError::OutOfDomain`] for non-finite input.
    pub fn unproject(&self, x: f64, y: f64) -> Result<LonLat, ProjectionError> {
        if !x.is_finite() || !y.is_finite() {
            return Err(ProjectionError::OutOfDomain {
                x,
                y,
                crs: Crs::WebMercator,
            });
        }

        let lon = (x / self.radius).to_degrees();
        let lat = 2.0f64
            .mul_add((y / self.radius).exp().atan(), -std::f64::consts::FRAC_PI_2)
            .to_degrees();

        Ok(LonLat::new(lon, lat))
    }

    /// Ground distance in meters covered by one projected meter at the given
    /// latitude.
    #[must_use]
    pub fn scale_factor(latitude: f64) -> f64 {
        latitude.to_radians().cos()
    }
}

/// The default [`Reproject`] implementation: WGS84 <-> Web Mercator and
/// identity within one CRS.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Projector {
    web_mercator: WebMercator,
}

impl Projector {
    /// Creates a projector using the WGS84 sphere.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Reprojects a geographic position.
    ///
    /// # Errors
    ///
    /// See [`Reproject::reproject`].
    pub fn from_lon_lat(&self, position: LonLat, target: Crs) -> Result<MapPoint, ProjectionError> {
        self.reproject(&position.to_map_point(), target)
    }
}

impl Reproject for Projector {
    fn reproject(&self, point: &MapPoint, target: Crs) -> Result<MapPoint, ProjectionError> {
        match (point.crs, target) {
            (from, to) if from == to => {
                if point.x.is_finite() && point.y.is_finite() {
                    Ok(*point)
                } else {
                    Err(ProjectionError::OutOfDomain {
                        x: point.x,
                        y: point.y,
                        crs: from,
                    })
                }
            }
            (Crs::Wgs84, Crs::WebMercator) => {
                self.web_mercator.project(LonLat::new(point.x, point.y))
            }
            (Crs::WebMercator, Crs::Wgs84) => self
                .web_mercator
                .unproject(point.x, point.y)
                .map(LonLat::to_map_point),
            (from, to) => Err(ProjectionError::Unsupported { from, to }),
        }
    }
}
