#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! WFS point feature source.
//!
//! A [`WfsSource`] describes one feature-query endpoint (loaded from the
//! embedded TOML [`registry`]). The [`FeatureSource`] trait abstracts how
//! the point collection is obtained, so the [`PointStore`] can be tested
//! without a network. [`HttpFeatureSource`] is the real implementation: it
//! issues one `GetFeature` request and parses the GML response.

pub mod client;
pub mod gml;
pub mod registry;
pub mod source_def;
pub mod store;

use async_trait::async_trait;
use envmap_feature_models::{PointsStatus, RemotePoint};
use envmap_http::HttpError;

pub use client::HttpFeatureSource;
pub use gml::parse_feature_collection;
pub use source_def::{AxisOrder, FieldNames, WfsSource};
pub use store::PointStore;

/// Errors that can occur while loading remote points.
#[derive(Debug, thiserror::Error)]
pub enum WfsError {
    /// The HTTP request failed.
    #[error(transparent)]
    Http(#[from] HttpError),

    /// The response is not well-formed XML.
    #[error("malformed feature collection: {0}")]
    Xml(#[from] roxmltree::Error),

    /// The server answered with an OGC exception report.
    #[error("feature service exception: {message}")]
    ServiceException {
        /// Exception text reported by the server.
        message: String,
    },

    /// The configured endpoint URL is not a valid URL.
    #[error("invalid feature service URL {url:?}: {message}")]
    InvalidUrl {
        /// The offending URL.
        url: String,
        /// Parser message.
        message: String,
    },

    /// The point collection is not available yet.
    #[error("points are not loaded ({status:?})")]
    NotLoaded {
        /// Current load state.
        status: PointsStatus,
    },
}

/// Something that can produce the full remote point collection.
#[async_trait]
pub trait FeatureSource: Send + Sync {
    /// Returns a unique identifier for this source.
    fn id(&self) -> &str;

    /// Fetches and parses every point the source offers.
    ///
    /// # Errors
    ///
    /// Returns [`WfsError`] if the request or parsing fails.
    async fn fetch_points(&self) -> Result<Vec<RemotePoint>, WfsError>;
}
