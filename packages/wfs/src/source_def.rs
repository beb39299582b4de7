//! Config-driven WFS source definition.
//!
//! [`WfsSource`] captures everything specific to one feature-query endpoint
//! in a serializable struct: where it lives, which feature type to request,
//! how positions are ordered and which elements hold the point attributes.

use envmap_geometry_models::Crs;
use envmap_map_models::{MarkerSymbol, PopupTemplate};
use reqwest::Url;
use serde::Deserialize;

use crate::WfsError;

/// A complete, config-driven WFS point source definition.
#[derive(Debug, Clone, Deserialize)]
pub struct WfsSource {
    /// Unique identifier (e.g., `"environmental_burdens"`).
    pub id: String,
    /// Title of the result layer built from this source.
    pub title: String,
    /// `WFSServer` endpoint URL, without query string.
    pub url: String,
    /// WFS protocol version.
    #[serde(default = "default_version")]
    pub version: String,
    /// Qualified feature type name (e.g., `"ns:EZ_ALL"`).
    pub type_name: String,
    /// Reference system requested for the positions.
    #[serde(default = "default_srs")]
    pub srs_name: Crs,
    /// Order of the two numbers in a `gml:pos` element.
    #[serde(default)]
    pub axis_order: AxisOrder,
    /// Optional cap on the number of features requested.
    #[serde(default)]
    pub max_features: Option<u32>,
    /// Element names of the point attributes.
    pub fields: FieldNames,
    /// Popup shown for matched points.
    pub popup: PopupTemplate,
    /// Marker used for matched points.
    #[serde(default)]
    pub symbol: MarkerSymbol,
}

fn default_version() -> String {
    "1.1.0".to_string()
}

const fn default_srs() -> Crs {
    Crs::Wgs84
}

/// Axis order of coordinate tuples in the GML response.
///
/// WFS 1.1.0 servers return EPSG:4326 positions as latitude first.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AxisOrder {
    /// `"lat lon"` (northing first).
    #[default]
    LatLon,
    /// `"lon lat"` (easting first).
    LonLat,
}

impl AxisOrder {
    /// Maps a raw `(first, second)` tuple to `(lon, lat)`.
    #[must_use]
    pub const fn to_lon_lat(self, first: f64, second: f64) -> (f64, f64) {
        match self {
            Self::LatLon => (second, first),
            Self::LonLat => (first, second),
        }
    }
}

/// Local element names holding the point attributes.
#[derive(Debug, Clone, Deserialize)]
pub struct FieldNames {
    /// Site name element (e.g., `"NAZOV"`).
    pub name: String,
    /// Priority element (e.g., `"PRIORITA"`).
    pub priority: String,
    /// Urban classification element (e.g., `"URBANNAKLASIFIKACIA"`).
    pub urban_classification: String,
}

impl WfsSource {
    /// Builds the `GetFeature` URL for this source.
    ///
    /// # Errors
    ///
    /// Returns [`WfsError::InvalidUrl`] if the configured URL cannot be
    /// parsed.
    pub fn get_feature_url(&self) -> Result<Url, WfsError> {
        let mut url = Url::parse(&self.url).map_err(|e| WfsError::InvalidUrl {
            url: self.url.clone(),
            message: e.to_string(),
        })?;

        let type_key = if self.version.starts_with('2') {
            "typeNames"
        } else {
            "typename"
        };
        let count_key = if self.version.starts_with('2') {
            "count"
        } else {
            "maxFeatures"
        };

        {
            let mut query = url.query_pairs_mut();
            query
                .append_pair("service", "WFS")
                .append_pair("version", &self.version)
                .append_pair("request", "GetFeature")
                .append_pair(type_key, &self.type_name)
                .append_pair("srsname", &self.srs_name.to_string());
            if let Some(max) = self.max_features {
                query.append_pair(count_key, &max.to_string());
            }
        }

        Ok(url)
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    pub(crate) fn test_source() -> WfsSource {
        toml::from_str(
            r#"
            id = "burdens"
            title = "Burdens"
            url = "https://example.test/WFSServer"
            type_name = "ez:EZ_ALL"

            [fields]
            name = "NAZOV"
            priority = "PRIORITA"
            urban_classification = "URBANNAKLASIFIKACIA"

            [popup]
            title = "{name}"
            "#,
        )
        .unwrap()
    }

    #[test]
    fn defaults_match_wfs_1_1_in_wgs84() {
        let source = test_source();
        assert_eq!(source.version, "1.1.0");
        assert_eq!(source.srs_name, Crs::Wgs84);
        assert_eq!(source.axis_order, AxisOrder::LatLon);
        assert_eq!(source.symbol, MarkerSymbol::default());
    }

    #[test]
    fn builds_get_feature_url() {
        let url = test_source().get_feature_url().unwrap();
        let pairs: Vec<(String, String)> = url
            .query_pairs()
            .map(|(k, v)| (k.into_owned(), v.into_owned()))
            .collect();
        assert_eq!(
            pairs,
            vec![
                ("service".to_string(), "WFS".to_string()),
                ("version".to_string(), "1.1.0".to_string()),
                ("request".to_string(), "GetFeature".to_string()),
                ("typename".to_string(), "ez:EZ_ALL".to_string()),
                ("srsname".to_string(), "EPSG:4326".to_string()),
            ]
        );
    }

    #[test]
    fn wfs_2_uses_type_names_and_count() {
        let mut source = test_source();
        source.version = "2.0.0".to_string();
        source.max_features = Some(10);
        let url = source.get_feature_url().unwrap();
        let query = url.query().unwrap_or_default();
        assert!(query.contains("typeNames=ez%3AEZ_ALL"));
        assert!(query.contains("count=10"));
    }

    #[test]
    fn rejects_invalid_url() {
        let mut source = test_source();
        source.url = "not a url".to_string();
        assert!(matches!(
            source.get_feature_url(),
            Err(WfsError::InvalidUrl { .. })
        ));
    }

    #[test]
    fn axis_order_swaps_lat_lon() {
        assert_eq!(AxisOrder::LatLon.to_lon_lat(48.7, 19.1), (19.1, 48.7));
        assert_eq!(AxisOrder::LonLat.to_lon_lat(19.1, 48.7), (19.1, 48.7));
    }
}
