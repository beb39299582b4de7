//! Point source registry, loaded from embedded TOML configs.
//!
//! Each `.toml` file in `packages/wfs/sources/` is baked into the binary at
//! compile time via [`include_str!`].

use crate::source_def::WfsSource;

/// TOML configs embedded at compile time.
const SOURCE_TOMLS: &[(&str, &str)] = &[(
    "environmental_burdens",
    include_str!("../sources/environmental_burdens.toml"),
)];

/// Parses a single source definition.
///
/// # Errors
///
/// Returns the TOML error message if the config is malformed.
pub fn parse_source_toml(toml_str: &str) -> Result<WfsSource, String> {
    toml::de::from_str(toml_str).map_err(|e| e.to_string())
}

/// Returns all configured point sources.
///
/// # Panics
///
/// Panics if any embedded TOML config is malformed.
#[must_use]
pub fn all_sources() -> Vec<WfsSource> {
    SOURCE_TOMLS
        .iter()
        .map(|(name, toml)| {
            parse_source_toml(toml).unwrap_or_else(|e| panic!("Failed to parse {name}.toml: {e}"))
        })
        .collect()
}

/// Looks up a configured point source by id.
#[must_use]
pub fn source_by_id(id: &str) -> Option<WfsSource> {
    all_sources().into_iter().find(|s| s.id == id)
}

#[cfg(test)]
mod tests {
    use envmap_geometry_models::Crs;

    use super::*;
    use crate::source_def::AxisOrder;

    #[test]
    fn loads_all_sources() {
        assert_eq!(all_sources().len(), SOURCE_TOMLS.len());
    }

    #[test]
    fn source_ids_are_unique() {
        let sources = all_sources();
        let mut ids: Vec<&str> = sources.iter().map(|s| s.id.as_str()).collect();
        ids.sort_unstable();
        ids.dedup();
        assert_eq!(ids.len(), SOURCE_TOMLS.len());
    }

    #[test]
    fn environmental_burdens_requests_ez_all_in_wgs84() {
        let source = source_by_id("environmental_burdens").unwrap();
        assert_eq!(source.type_name, "env_zataze_environmentalna_zataz:EZ_ALL");
        assert_eq!(source.srs_name, Crs::Wgs84);
        assert_eq!(source.axis_order, AxisOrder::LatLon);
        assert_eq!(source.fields.name, "NAZOV");
        assert_eq!(source.popup.fields.len(), 2);

        let url = source.get_feature_url().unwrap();
        assert!(url.as_str().starts_with(
            "https://arc.sazp.sk/arcgis/services/env_zataze/environmentalna_zataz/MapServer/WFSServer?service=WFS&version=1.1.0&request=GetFeature"
        ));
    }

    #[test]
    fn unknown_source_is_none() {
        assert!(source_by_id("nope").is_none());
    }
}
