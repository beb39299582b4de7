#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! WMS map-image layers and the "what is here" query.
//!
//! Each [`WmsLayer`] is defined in an embedded TOML file (see [`registry`]).
//! A click is turned into a [`FeatureInfoRequest`]; the `text/xml` answer is
//! reduced to the attributes of its first `FIELDS` element by
//! [`parse_feature_info`], and the layer's [`PopupRules`] pick the popup
//! content. A [`RequestSequencer`] tags every click so late answers to an
//! earlier click can be recognized and dropped.

pub mod client;
pub mod info;
pub mod layer;
pub mod registry;
pub mod request;
pub mod sequencer;

use async_trait::async_trait;
use envmap_http::HttpError;
use envmap_map_models::Attributes;

pub use client::HttpFeatureInfoClient;
pub use info::parse_feature_info;
pub use layer::{PopupRule, PopupRules, WmsLayer};
pub use request::FeatureInfoRequest;
pub use sequencer::{RequestSequencer, Ticket};

/// Attributes reported for the feature under a click. The literal value
/// `"Null"` is stored as `None`; the key stays present.
pub type FeatureInfo = Attributes;

/// Errors from querying a WMS layer.
#[derive(Debug, thiserror::Error)]
pub enum WmsError {
    /// The HTTP request failed.
    #[error(transparent)]
    Http(#[from] HttpError),

    /// The response is not well-formed XML.
    #[error("malformed feature info response: {0}")]
    Xml(#[from] roxmltree::Error),

    /// The server answered with a service exception.
    #[error("map service exception: {message}")]
    ServiceException {
        /// Exception text reported by the server.
        message: String,
    },

    /// The configured service URL is not a valid URL.
    #[error("invalid map service URL {url:?}: {message}")]
    InvalidUrl {
        /// The offending URL.
        url: String,
        /// Parser message.
        message: String,
    },

    /// The view has no pixels, so no pixel position can be queried.
    #[error("cannot query a {width}x{height} view")]
    EmptyView {
        /// View width in pixels.
        width: u32,
        /// View height in pixels.
        height: u32,
    },
}

/// Something that can answer a `GetFeatureInfo` request.
#[async_trait]
pub trait FeatureInfoClient: Send + Sync {
    /// Sends the request and returns the parsed attributes, or `None` if
    /// nothing was hit.
    ///
    /// # Errors
    ///
    /// Returns [`WmsError`] if the request or parsing fails.
    async fn feature_info(
        &self,
        request: &FeatureInfoRequest,
    ) -> Result<Option<FeatureInfo>, WmsError>;
}
