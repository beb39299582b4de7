#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! API request and response types for the map viewer server.
//!
//! These types are serialized to JSON for the REST API. They are separate
//! from the viewer types so the HTTP contract can evolve on its own.

use envmap_feature_models::PointsStatus;
use envmap_geometry_models::{Crs, DrawTool, LonLat, MapPoint, ViewSize};
use envmap_map_models::{Graphic, LayerInfo};
use serde::{Deserialize, Serialize};

/// Health check response.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiHealth {
    /// Whether the server is healthy.
    pub healthy: bool,
    /// Server version.
    pub version: String,
    /// Load state of the remote points.
    pub points: PointsStatus,
}

/// Initial state the frontend needs to build the map.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiConfig {
    /// Reference system of the view.
    pub crs: Crs,
    /// Initial center.
    pub center: LonLat,
    /// Initial zoom level.
    pub zoom: f64,
    /// Basemap of the main view.
    pub basemap: String,
    /// Basemap of the overview map.
    pub overview_basemap: String,
    /// Layers, bottom-most first.
    pub layers: Vec<LayerInfo>,
    /// The landmark marker.
    pub landmark: Graphic,
}

/// Body of `PUT /api/layers/{id}/visibility`.
#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VisibilityRequest {
    /// New visibility.
    pub visible: bool,
}

/// Body of `POST /api/draw/start`.
#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DrawStartRequest {
    /// Tool to sketch with.
    pub tool: DrawTool,
}

/// A completed sketch as sent by the frontend, in the view CRS.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum DrawnShape {
    /// A circle given by center and radius in map units.
    Circle {
        /// Center `[x, y]`.
        center: [f64; 2],
        /// Radius in map units.
        radius: f64,
    },
    /// Any other shape as a `GeoJSON` geometry.
    Geometry(geojson::Geometry),
}

/// Body of `POST /api/draw/complete`.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DrawCompleteRequest {
    /// The completed shape.
    pub shape: DrawnShape,
}

/// Body of `POST /api/click`, in pixels from the top-left corner.
#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClickRequest {
    /// Pixel column.
    pub x: f64,
    /// Pixel row.
    pub y: f64,
}

/// Body of `PUT /api/view`.
#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ViewRequest {
    /// New center.
    pub center: MapPoint,
    /// New zoom level.
    pub zoom: f64,
    /// New size in pixels.
    pub size: ViewSize,
}

/// JSON error body.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiError {
    /// What went wrong.
    pub error: String,
}

impl ApiError {
    /// Creates an error body.
    #[must_use]
    pub fn new(error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
        }
    }
}
