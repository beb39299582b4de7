//! WMS layer definitions and popup rule selection.

use envmap_map_models::{FieldTemplate, PopupSection, PopupTemplate};
use reqwest::Url;
use serde::Deserialize;

use crate::{FeatureInfo, WmsError};

/// A config-driven WMS layer.
#[derive(Debug, Clone, Deserialize)]
pub struct WmsLayer {
    /// Unique identifier (e.g., `"geological_wells"`).
    pub id: String,
    /// Title shown in the layer list.
    pub title: String,
    /// `WMSServer` endpoint URL, without query string.
    pub url: String,
    /// Attribution text.
    #[serde(default)]
    pub copyright: Option<String>,
    /// Whether the layer is shown initially.
    #[serde(default)]
    pub visible: bool,
    /// WMS protocol version.
    #[serde(default = "default_version")]
    pub version: String,
    /// Comma-separated sub-layer names sent as `QUERY_LAYERS`.
    pub query_layers: String,
    /// Requested `INFO_FORMAT`.
    #[serde(default = "default_info_format")]
    pub info_format: String,
    /// How a feature-info answer becomes a popup section.
    pub popup: PopupRules,
}

impl WmsLayer {
    /// `GetLegendGraphic` URLs, one per sub-layer in `query_layers`.
    ///
    /// # Errors
    ///
    /// Returns [`WmsError::InvalidUrl`] if the service URL cannot be parsed.
    pub fn legend_urls(&self) -> Result<Vec<Url>, WmsError> {
        let base = Url::parse(&self.url).map_err(|e| WmsError::InvalidUrl {
            url: self.url.clone(),
            message: e.to_string(),
        })?;

        Ok(self
            .query_layers
            .split(',')
            .map(str::trim)
            .filter(|name| !name.is_empty())
            .map(|name| {
                let mut url = base.clone();
                {
                    let mut query = url.query_pairs_mut();
                    query
                        .append_pair("SERVICE", "WMS")
                        .append_pair("VERSION", &self.version)
                        .append_pair("REQUEST", "GetLegendGraphic")
                        .append_pair("FORMAT", "image/png")
                        .append_pair("LAYER", name);
                    if self.version.starts_with("1.3") {
                        query.append_pair("SLD_VERSION", "1.1.0");
                    }
                }
                url
            })
            .collect())
    }
}

fn default_version() -> String {
    "1.3.0".to_string()
}

fn default_info_format() -> String {
    "text/xml".to_string()
}

/// Ordered popup rules of a layer.
///
/// The first rule whose required keys are all present in the answer is
/// rendered. When none applies, the section shows `fallback_message`.
#[derive(Debug, Clone, Deserialize)]
pub struct PopupRules {
    /// Section title.
    pub title: String,
    /// Candidate rules, tried in order.
    #[serde(default)]
    pub rules: Vec<PopupRule>,
    /// Message shown when no rule applies.
    #[serde(default = "default_fallback")]
    pub fallback_message: String,
    /// Text substituted for missing values.
    #[serde(default = "default_placeholder")]
    pub placeholder: String,
}

fn default_fallback() -> String {
    "No data available".to_string()
}

fn default_placeholder() -> String {
    "unknown".to_string()
}

/// A single popup rule.
#[derive(Debug, Clone, Deserialize)]
pub struct PopupRule {
    /// Keys that must be present (a `None` value counts as present).
    #[serde(default)]
    pub required_keys: Vec<String>,
    /// Fields rendered when the rule applies.
    pub fields: Vec<FieldTemplate>,
}

impl PopupRule {
    /// Whether this rule applies to `info`.
    #[must_use]
    pub fn matches(&self, info: &FeatureInfo) -> bool {
        self.required_keys.iter().all(|key| info.contains_key(key))
    }
}

impl PopupRules {
    /// Renders the popup section for `info`.
    #[must_use]
    pub fn select(&self, info: &FeatureInfo) -> PopupSection {
        let Some(rule) = self.rules.iter().find(|rule| rule.matches(info)) else {
            return PopupSection::message(&self.title, &self.fallback_message);
        };

        PopupTemplate {
            title: self.title.clone(),
            fields: rule.fields.clone(),
            message: None,
            placeholder: self.placeholder.clone(),
        }
        .render(info)
    }
}
