#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Popup, symbol, graphic, layer and notice types for the map viewer.
//!
//! Declarative widget objects of a browser mapping toolkit map to plain
//! value structs here. The frontend receives them as JSON and renders them;
//! nothing in this crate knows how.

pub mod template;

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use envmap_geometry_models::{DrawnGeometry, MapPoint};
use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display, EnumString};
use uuid::Uuid;

pub use template::{FieldTemplate, PopupTemplate, render_text};

/// Attribute mapping of a feature. A `None` value means the key was
/// reported but carried no value.
pub type Attributes = BTreeMap<String, Option<String>>;

/// A single `label: value` line of a popup.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PopupField {
    /// Human-readable label (e.g., `"Priorita"`).
    pub label: String,
    /// Rendered value, including any unit suffix.
    pub value: String,
}

/// Content of a popup section.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum PopupBody {
    /// A list of labelled values.
    Fields(Vec<PopupField>),
    /// A single message, e.g. when no data is available.
    Message(String),
}

/// One titled block of a popup, usually contributed by one layer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PopupSection {
    /// Section title.
    pub title: String,
    /// Section content.
    pub body: PopupBody,
}

impl PopupSection {
    /// Creates a section that only carries a message.
    #[must_use]
    pub fn message(title: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            body: PopupBody::Message(message.into()),
        }
    }

    /// Looks up a field value by label.
    #[must_use]
    pub fn field(&self, label: &str) -> Option<&str> {
        match &self.body {
            PopupBody::Fields(fields) => fields
                .iter()
                .find(|f| f.label == label)
                .map(|f| f.value.as_str()),
            PopupBody::Message(_) => None,
        }
    }
}

/// A popup opened at a map location.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Popup {
    /// Where the popup is anchored.
    pub location: Option<MapPoint>,
    /// Sections in display order (top-most layer first).
    pub sections: Vec<PopupSection>,
}

/// Point marker symbol.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MarkerSymbol {
    /// CSS color of the fill.
    pub color: String,
    /// Marker diameter in pixels.
    pub size_px: f64,
    /// CSS color of the outline.
    pub outline_color: String,
    /// Outline width in pixels.
    pub outline_width: f64,
}

impl Default for MarkerSymbol {
    fn default() -> Self {
        Self {
            color: "red".to_string(),
            size_px: 12.0,
            outline_color: "black".to_string(),
            outline_width: 1.0,
        }
    }
}

/// Area or line symbol for sketched geometries.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FillSymbol {
    /// CSS color of the fill (may include alpha).
    pub color: String,
    /// CSS color of the outline.
    pub outline_color: String,
    /// Outline width in pixels.
    pub outline_width: f64,
}

impl Default for FillSymbol {
    fn default() -> Self {
        Self {
            color: "rgba(150, 150, 150, 0.2)".to_string(),
            outline_color: "rgb(50, 50, 50)".to_string(),
            outline_width: 2.0,
        }
    }
}

/// How a graphic is drawn.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Symbol {
    /// Point marker.
    Marker(MarkerSymbol),
    /// Area or line.
    Fill(FillSymbol),
}

/// A display entity on a graphics layer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Graphic {
    /// Unique id of this display entity.
    pub id: Uuid,
    /// Geometry in the view CRS.
    pub geometry: DrawnGeometry,
    /// Symbol used to draw the geometry.
    pub symbol: Symbol,
    /// Popup shown when the graphic is selected.
    pub popup: Option<PopupSection>,
}

impl Graphic {
    /// Creates a graphic with a fresh id.
    #[must_use]
    pub fn new(geometry: DrawnGeometry, symbol: Symbol, popup: Option<PopupSection>) -> Self {
        Self {
            id: Uuid::new_v4(),
            geometry,
            symbol,
            popup,
        }
    }
}

/// Kind of a layer in the layer list.
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
pub enum LayerKind {
    /// Tiled base map.
    Basemap,
    /// Map-image layer served over WMS.
    Wms,
    /// Static GeoJSON dataset.
    GeoJson,
    /// Client-side graphics (drawings, results, landmarks).
    Graphics,
}

/// Layer list entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LayerInfo {
    /// Stable layer id.
    pub id: String,
    /// Title shown in the layer list.
    pub title: String,
    /// Layer kind.
    pub kind: LayerKind,
    /// Whether the layer is currently visible.
    pub visible: bool,
    /// Attribution text.
    pub copyright: Option<String>,
    /// Whether a map click can query this layer.
    pub queryable: bool,
    /// Source URL, if the layer is backed by a remote or static resource.
    pub url: Option<String>,
}

/// Legend entry of a visible layer.
///
/// Client-side layers carry the symbol they are drawn with; map-image
/// layers carry the legend image URLs their service renders.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LegendEntry {
    /// Id of the layer described.
    pub layer_id: String,
    /// Layer title.
    pub title: String,
    /// Symbol the layer is drawn with.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub symbol: Option<Symbol>,
    /// Server-rendered legend images.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub images: Vec<String>,
}

/// Severity of a transient notice.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    AsRefStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum NoticeLevel {
    /// Informational.
    Info,
    /// Something degraded but the action completed.
    Warning,
    /// The action failed.
    Error,
}

/// A transient message for the user ("could not load data").
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Notice {
    /// Severity.
    pub level: NoticeLevel,
    /// Message text.
    pub message: String,
    /// When the notice was raised.
    pub created_at: DateTime<Utc>,
}

impl Notice {
    /// Creates a notice stamped with the current time.
    #[must_use]
    pub fn new(level: NoticeLevel, message: impl Into<String>) -> Self {
        Self {
            level,
            message: message.into(),
            created_at: Utc::now(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn popup_body_json_shape() {
        let section = PopupSection::message("Informácie o vrte", "Údaje nie sú dostupné");
        let json = serde_json::to_value(&section).unwrap();
        assert_eq!(json["body"]["type"], "message");
        assert_eq!(json["body"]["value"], "Údaje nie sú dostupné");
    }

    #[test]
    fn section_field_lookup() {
        let section = PopupSection {
            title: "t".to_string(),
            body: PopupBody::Fields(vec![PopupField {
                label: "Priorita".to_string(),
                value: "K1".to_string(),
            }]),
        };
        assert_eq!(section.field("Priorita"), Some("K1"));
        assert_eq!(section.field("Missing"), None);
        assert_eq!(PopupSection::message("t", "m").field("Priorita"), None);
    }

    #[test]
    fn graphics_get_distinct_ids() {
        let geometry = DrawnGeometry::from_point(MapPoint::new(
            0.0,
            0.0,
            envmap_geometry_models::Crs::WebMercator,
        ));
        let a = Graphic::new(geometry.clone(), Symbol::Marker(MarkerSymbol::default()), None);
        let b = Graphic::new(geometry, Symbol::Marker(MarkerSymbol::default()), None);
        assert_ne!(a.id, b.id);
    }
}
