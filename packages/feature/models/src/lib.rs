#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Remote point feature records and filter result types.
//!
//! A [`RemotePoint`] is what the feature-query endpoint returns; a
//! [`FilteredPoint`] is the same record reprojected into the view and kept
//! because a drawn polygon contains it.

use envmap_geometry_models::{LonLat, MapPoint};
use envmap_map_models::Attributes;
use serde::{Deserialize, Serialize};

/// Attribute key under which the point name is exposed to popup templates.
pub const NAME_KEY: &str = "name";
/// Attribute key under which the point priority is exposed.
pub const PRIORITY_KEY: &str = "priority";
/// Attribute key under which the urban classification is exposed.
pub const URBAN_CLASSIFICATION_KEY: &str = "urban_classification";

/// Descriptive attributes of a remote point. Any of them may be absent.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PointAttributes {
    /// Site name.
    pub name: Option<String>,
    /// Remediation priority class.
    pub priority: Option<String>,
    /// Urban classification.
    pub urban_classification: Option<String>,
}

impl PointAttributes {
    /// Exposes the attributes as a template lookup map keyed by
    /// [`NAME_KEY`], [`PRIORITY_KEY`] and [`URBAN_CLASSIFICATION_KEY`].
    #[must_use]
    pub fn to_attributes(&self) -> Attributes {
        [
            (NAME_KEY, &self.name),
            (PRIORITY_KEY, &self.priority),
            (URBAN_CLASSIFICATION_KEY, &self.urban_classification),
        ]
        .into_iter()
        .map(|(k, v)| (k.to_string(), v.clone()))
        .collect()
    }
}

/// A point feature as fetched from the feature-query endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RemotePoint {
    /// Feature id reported by the server, if any.
    pub id: Option<String>,
    /// Geographic position.
    pub position: LonLat,
    /// Descriptive attributes.
    pub attributes: PointAttributes,
}

/// A remote point retained by the point filter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FilteredPoint {
    /// Feature id reported by the server, if any.
    pub id: Option<String>,
    /// Position reprojected into the view CRS.
    pub position: MapPoint,
    /// Original geographic position.
    pub source: LonLat,
    /// Descriptive attributes, unchanged.
    pub attributes: PointAttributes,
}

/// Load state of the in-memory point collection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum PointsStatus {
    /// No load was started yet.
    NotLoaded,
    /// A load is in flight.
    Loading,
    /// Points are available.
    Loaded {
        /// Number of points held.
        count: usize,
    },
    /// The last load failed.
    Failed {
        /// What went wrong.
        message: String,
    },
}

impl PointsStatus {
    /// Whether points are available for filtering.
    #[must_use]
    pub const fn is_loaded(&self) -> bool {
        matches!(self, Self::Loaded { .. })
    }
}
