//! Viewer configuration.
//!
//! The default configuration is embedded from `config/viewer.toml`. If the
//! `ENVMAP_CONFIG` environment variable names a file, that file is merged
//! on top of the defaults table by table, so an override only needs the
//! keys it changes.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use envmap_geometry_models::{LonLat, ViewSize};
use envmap_http::{HttpConfig, RetryPolicy};
use envmap_map_models::{Attributes, FillSymbol, MarkerSymbol, PopupTemplate};
use serde::Deserialize;
use thiserror::Error;

/// Embedded default configuration.
const DEFAULT_CONFIG: &str = include_str!("../config/viewer.toml");

/// Environment variable naming an override file.
pub const CONFIG_ENV_VAR: &str = "ENVMAP_CONFIG";

/// Errors from loading the configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The override file could not be read.
    #[error("failed to read config file {path}: {source}")]
    Io {
        /// File that failed to read.
        path: PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },

    /// The configuration is not valid TOML or does not match the schema.
    #[error("invalid configuration: {0}")]
    Parse(#[from] toml::de::Error),
}

/// Complete viewer configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct ViewerConfig {
    /// Id of the point source in the WFS registry.
    pub points_source: String,
    /// Directory with the frontend build.
    pub static_dir: PathBuf,
    /// Directory served under `/data` (the `GeoJSON` datasets).
    pub data_dir: PathBuf,
    /// Initial view.
    pub view: ViewConfig,
    /// Scale bar settings.
    #[serde(default)]
    pub scale_bar: ScaleBarConfig,
    /// Drawing layer settings.
    pub draw: DrawConfig,
    /// `GeoJSON` district layer.
    pub districts: DistrictsConfig,
    /// Landmark marker layer.
    pub landmark: LandmarkConfig,
    /// HTTP client settings.
    #[serde(default)]
    pub http: HttpConfig,
    /// Retry policy of the startup point load.
    #[serde(default)]
    pub points_retry: RetryPolicy,
    /// Retry policy of click queries.
    #[serde(default = "RetryPolicy::interactive")]
    pub click_retry: RetryPolicy,
    /// Endpoint URLs replacing the registry ones, keyed by source or layer id.
    #[serde(default)]
    pub url_overrides: BTreeMap<String, String>,
}

/// Initial map view.
#[derive(Debug, Clone, Deserialize)]
pub struct ViewConfig {
    /// View center.
    pub center: LonLat,
    /// Zoom level.
    pub zoom: f64,
    /// Initial width in pixels.
    pub width: u32,
    /// Initial height in pixels.
    pub height: u32,
    /// Base map name.
    pub basemap: String,
    /// Base map name of the overview map.
    pub overview_basemap: String,
}

impl ViewConfig {
    /// Initial view size.
    #[must_use]
    pub const fn size(&self) -> ViewSize {
        ViewSize::new(self.width, self.height)
    }
}

/// Scale bar settings.
#[derive(Debug, Clone, Deserialize)]
pub struct ScaleBarConfig {
    /// Maximum bar width in pixels.
    #[serde(default = "default_scale_bar_width")]
    pub max_width_px: f64,
}

const fn default_scale_bar_width() -> f64 {
    100.0
}

impl Default for ScaleBarConfig {
    fn default() -> Self {
        Self {
            max_width_px: default_scale_bar_width(),
        }
    }
}

/// Drawing layer settings.
#[derive(Debug, Clone, Deserialize)]
pub struct DrawConfig {
    /// Layer title.
    pub title: String,
    /// Vertices used to approximate a circle.
    #[serde(default = "default_circle_segments")]
    pub circle_segments: u16,
    /// Symbol of drawn shapes.
    #[serde(default)]
    pub symbol: FillSymbol,
}

const fn default_circle_segments() -> u16 {
    64
}

/// `GeoJSON` district layer settings.
#[derive(Debug, Clone, Deserialize)]
pub struct DistrictsConfig {
    /// Layer title.
    pub title: String,
    /// File the districts are read from.
    pub path: PathBuf,
    /// URL the frontend loads the file from.
    pub url: String,
    /// Attribution text.
    #[serde(default)]
    pub copyright: Option<String>,
    /// Whether the layer is shown initially.
    #[serde(default)]
    pub visible: bool,
    /// Popup of a clicked district.
    pub popup: PopupTemplate,
    /// Outline and fill of the district polygons.
    #[serde(default)]
    pub symbol: FillSymbol,
}

/// Landmark marker settings.
#[derive(Debug, Clone, Deserialize)]
pub struct LandmarkConfig {
    /// Layer title.
    pub title: String,
    /// Marker position.
    pub position: LonLat,
    /// Attributes available to the popup.
    #[serde(default)]
    pub attributes: Attributes,
    /// Marker popup.
    pub popup: PopupTemplate,
    /// Marker symbol.
    #[serde(default)]
    pub symbol: MarkerSymbol,
}

impl ViewerConfig {
    /// The embedded default configuration.
    ///
    /// # Panics
    ///
    /// Panics if the embedded TOML is malformed.
    #[must_use]
    pub fn embedded() -> Self {
        toml::de::from_str(DEFAULT_CONFIG)
            .unwrap_or_else(|e| panic!("Failed to parse embedded viewer.toml: {e}"))
    }

    /// Loads the configuration, applying the file named by
    /// [`CONFIG_ENV_VAR`] if it is set.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if the override file cannot be read or the
    /// merged configuration is invalid.
    pub fn load() -> Result<Self, ConfigError> {
        match std::env::var(CONFIG_ENV_VAR) {
            Ok(path) if !path.trim().is_empty() => {
                log::info!("Loading config overrides from {path}");
                Self::load_with_file(Path::new(&path))
            }
            _ => Self::from_overrides(""),
        }
    }

    /// Loads the defaults merged with the file at `path`.
    ///
    /// # Errors
    ///
    /// See [`Self::load`].
    pub fn load_with_file(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_overrides(&text)
    }

    /// Parses `overrides` and merges it on top of the defaults.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Parse`] if either document is invalid.
    pub fn from_overrides(overrides: &str) -> Result<Self, ConfigError> {
        let mut base: toml::Table = toml::de::from_str(DEFAULT_CONFIG)?;
        let overrides: toml::Table = toml::de::from_str(overrides)?;
        merge_tables(&mut base, overrides);
        Ok(toml::Value::Table(base).try_into()?)
    }

    /// Returns the configured URL override for a source or layer id.
    #[must_use]
    pub fn url_override(&self, id: &str) -> Option<&str> {
        self.url_overrides.get(id).map(String::as_str)
    }
}

/// Recursively merges `overrides` into `base`. Tables merge key by key;
/// any other value replaces the base value.
fn merge_tables(base: &mut toml::Table, overrides: toml::Table) {
    for (key, value) in overrides {
        match (base.get_mut(&key), value) {
            (Some(toml::Value::Table(existing)), toml::Value::Table(incoming)) => {
                merge_tables(existing, incoming);
            }
            (_, value) => {
                base.insert(key, value);
            }
        }
    }
}
