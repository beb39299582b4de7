//! WMS layer registry, loaded from embedded TOML configs.
//!
//! Each `.toml` file in `packages/wms/layers/` is baked into the binary at
//! compile time via [`include_str!`]. Layers are listed bottom to top.

use crate::layer::WmsLayer;

/// TOML configs embedded at compile time, bottom-most layer first.
const LAYER_TOMLS: &[(&str, &str)] = &[
    (
        "surface_water_bodies",
        include_str!("../layers/surface_water_bodies.toml"),
    ),
    (
        "geological_wells",
        include_str!("../layers/geological_wells.toml"),
    ),
];

/// Parses a single layer definition.
///
/// # Errors
///
/// Returns the TOML error message if the config is malformed.
pub fn parse_layer_toml(toml_str: &str) -> Result<WmsLayer, String> {
    toml::de::from_str(toml_str).map_err(|e| e.to_string())
}

/// Returns all configured WMS layers, bottom-most first.
///
/// # Panics
///
/// Panics if any embedded TOML config is malformed.
#[must_use]
pub fn all_layers() -> Vec<WmsLayer> {
    LAYER_TOMLS
        .iter()
        .map(|(name, toml)| {
            parse_layer_toml(toml).unwrap_or_else(|e| panic!("Failed to parse {name}.toml: {e}"))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use envmap_map_models::PopupBody;

    use super::*;
    use crate::FeatureInfo;

    fn layer(id: &str) -> WmsLayer {
        all_layers().into_iter().find(|l| l.id == id).unwrap()
    }

    #[test]
    fn loads_all_layers() {
        assert_eq!(all_layers().len(), LAYER_TOMLS.len());
    }

    #[test]
    fn layer_ids_are_unique() {
        let layers = all_layers();
        let mut ids: Vec<&str> = layers.iter().map(|l| l.id.as_str()).collect();
        ids.sort_unstable();
        ids.dedup();
        assert_eq!(ids.len(), LAYER_TOMLS.len());
    }

    #[test]
    fn all_layers_start_hidden_and_query_xml() {
        for layer in &all_layers() {
            assert!(!layer.visible, "{} should start hidden", layer.id);
            assert_eq!(layer.version, "1.3.0");
            assert_eq!(layer.info_format, "text/xml");
            assert!(layer.copyright.is_some(), "{}: no copyright", layer.id);
        }
    }

    #[test]
    fn wells_query_both_sub_layers() {
        let wells = layer("geological_wells");
        assert_eq!(wells.query_layers, "0,1");
        assert_eq!(wells.popup.rules.len(), 2);

        let section = wells.popup.select(&FeatureInfo::new());
        assert_eq!(section.title, "Informácie o vrte");
        assert_eq!(
            section.body,
            PopupBody::Message("Údaje nie sú dostupné".to_string())
        );
    }

    #[test]
    fn water_bodies_show_name() {
        let water = layer("surface_water_bodies");
        assert_eq!(water.query_layers, "LAKES");

        let info: FeatureInfo = [("nameText".to_string(), Some("Počúvadlo".to_string()))]
            .into_iter()
            .collect();
        let section = water.popup.select(&info);
        assert_eq!(section.title, "Informácie o vodnom diele");
        assert_eq!(section.field("Názov"), Some("Počúvadlo"));
    }
}
