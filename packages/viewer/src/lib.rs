#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Map viewer state and event handling.
//!
//! [`MapViewer`] owns everything the frontend manipulates: the view, the
//! layer list, the drawing session, the drawn shapes and filter results,
//! the popup and the notice queue. Frontend actions arrive as
//! [`ViewerEvent`]s and are handled by [`MapViewer::dispatch`].
//!
//! Drawing a polygon runs the point filter over the loaded remote points
//! and appends the matches to the result layer. Clicking the map queries
//! every visible WMS layer concurrently and merges the answers into one
//! popup, top-most layer first.

pub mod config;
pub mod districts;
pub mod drawing;
pub mod geojson_io;
pub mod layers;
pub mod notices;
pub mod scale_bar;
pub mod view;
mod viewer;

use std::path::PathBuf;

use envmap_feature_models::PointsStatus;
use envmap_geometry_models::{DrawTool, DrawnGeometry, Extent, GeometryType, MapPoint, ScreenPoint, ViewSize};
use envmap_http::HttpError;
use envmap_map_models::{LayerInfo, Popup};
use envmap_projection::ProjectionError;
use envmap_wfs::WfsError;
use envmap_wms::WmsError;
use serde::Serialize;
use thiserror::Error;

pub use config::{ConfigError, ViewerConfig};
pub use districts::Districts;
pub use drawing::DrawingSession;
pub use layers::LayerList;
pub use scale_bar::ScaleBar;
pub use view::{MapView, Overview};
pub use viewer::{MapViewer, ViewerParts};

/// Errors from viewer operations.
#[derive(Debug, Error)]
pub enum ViewerError {
    /// No layer has the given id.
    #[error("unknown layer {id:?}")]
    UnknownLayer {
        /// Requested id.
        id: String,
    },

    /// No point source has the given id.
    #[error("unknown point source {id:?}")]
    UnknownSource {
        /// Requested id.
        id: String,
    },

    /// A shape was completed while no drawing session was active.
    #[error("no drawing session is active")]
    NotDrawing,

    /// The completed shape is not what the active tool draws.
    #[error("expected a {expected} geometry, got a {actual}")]
    GeometryMismatch {
        /// Geometry type of the active tool.
        expected: GeometryType,
        /// Geometry type received.
        actual: GeometryType,
    },

    /// A `GeoJSON` geometry that cannot be drawn.
    #[error("unsupported geometry: {kind}")]
    UnsupportedGeometry {
        /// What was received.
        kind: String,
    },

    /// A file could not be read.
    #[error("failed to read {path}: {source}")]
    Io {
        /// File that failed to read.
        path: PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },

    /// A `GeoJSON` document could not be parsed.
    #[error("invalid GeoJSON: {0}")]
    GeoJson(#[from] geojson::Error),

    /// Configuration error.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// Reprojection error.
    #[error(transparent)]
    Projection(#[from] ProjectionError),

    /// Point source error.
    #[error(transparent)]
    Wfs(#[from] WfsError),

    /// Map service error.
    #[error(transparent)]
    Wms(#[from] WmsError),

    /// HTTP client error.
    #[error(transparent)]
    Http(#[from] HttpError),
}

/// A user action on the map.
#[derive(Debug, Clone, PartialEq)]
pub enum ViewerEvent {
    /// Start sketching with a tool.
    StartDraw {
        /// Tool to sketch with.
        tool: DrawTool,
    },
    /// Abandon the current sketch.
    CancelDraw,
    /// The sketch was completed.
    DrawCompleted {
        /// Completed shape in the view CRS.
        geometry: DrawnGeometry,
    },
    /// Remove all drawn shapes and filter results.
    ClearDrawings,
    /// The map was clicked.
    Click {
        /// Pixel position of the click.
        screen: ScreenPoint,
    },
    /// A layer was shown or hidden.
    SetLayerVisibility {
        /// Layer id.
        id: String,
        /// New visibility.
        visible: bool,
    },
    /// The map was panned, zoomed or resized.
    ViewChanged {
        /// New center (any supported CRS).
        center: MapPoint,
        /// New zoom level.
        zoom: f64,
        /// New size in pixels.
        size: ViewSize,
    },
    /// Fetch the remote points again.
    ReloadPoints,
}

/// Summary of one filter run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FilterReport {
    /// Matches appended to the result layer.
    pub added: usize,
    /// Points that could not be reprojected.
    pub skipped: usize,
    /// Size of the result layer after the run.
    pub total_results: usize,
    /// Load state of the remote points at the time of the run.
    pub points: PointsStatus,
}

/// Result of a click query.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "outcome", content = "popup", rename_all = "snake_case")]
pub enum ClickOutcome {
    /// A popup was opened.
    Popup(Popup),
    /// Nothing was hit or no layer was queryable.
    NoPopup,
    /// A newer click was made before the answers arrived.
    Superseded,
}

/// View state sent to the frontend.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ViewSnapshot {
    /// The view.
    pub view: MapView,
    /// Its extent.
    pub extent: Extent,
    /// Map units per pixel.
    pub resolution: f64,
    /// The overview map.
    pub overview: Overview,
}

/// What handling a [`ViewerEvent`] produced.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum ViewerResponse {
    /// Drawing session state after the event.
    Drawing(DrawingSession),
    /// A shape was completed and filtered.
    Filtered(FilterReport),
    /// Drawings and results were removed.
    Cleared,
    /// Outcome of a click.
    Click(ClickOutcome),
    /// A layer after a visibility change.
    Layer(LayerInfo),
    /// The view after a change.
    View(ViewSnapshot),
    /// Point load state after a reload.
    Points(PointsStatus),
}
