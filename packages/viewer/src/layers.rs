//! Ordered layer list with visibility.

use envmap_map_models::LayerInfo;

use crate::ViewerError;

/// Id of the base map entry.
pub const BASEMAP_LAYER_ID: &str = "basemap";
/// Id of the `GeoJSON` district layer.
pub const DISTRICTS_LAYER_ID: &str = "districts";
/// Id of the layer holding drawn shapes.
pub const DRAW_LAYER_ID: &str = "drawings";
/// Id of the layer holding filter results.
pub const RESULTS_LAYER_ID: &str = "results";
/// Id of the landmark marker layer.
pub const LANDMARK_LAYER_ID: &str = "landmark";

/// Layers in draw order, bottom-most first.
#[derive(Debug, Clone, Default)]
pub struct LayerList {
    layers: Vec<LayerInfo>,
}

impl LayerList {
    /// Creates a list from layers ordered bottom-most first.
    #[must_use]
    pub const fn new(layers: Vec<LayerInfo>) -> Self {
        Self { layers }
    }

    /// All layers, bottom-most first.
    #[must_use]
    pub fn layers(&self) -> &[LayerInfo] {
        &self.layers
    }

    /// Visible layers, top-most first.
    pub fn visible_top_down(&self) -> impl Iterator<Item = &LayerInfo> {
        self.layers.iter().rev().filter(|l| l.visible)
    }

    /// Visible queryable layers, top-most first.
    pub fn queryable_top_down(&self) -> impl Iterator<Item = &LayerInfo> {
        self.visible_top_down().filter(|l| l.queryable)
    }

    /// Shows or hides a layer.
    ///
    /// # Errors
    ///
    /// Returns [`ViewerError::UnknownLayer`] if no layer has this id.
    pub fn set_visibility(&mut self, id: &str, visible: bool) -> Result<&LayerInfo, ViewerError> {
        let layer = self
            .layers
            .iter_mut()
            .find(|l| l.id == id)
            .ok_or_else(|| ViewerError::UnknownLayer { id: id.to_string() })?;
        layer.visible = visible;
        log::debug!("Layer {id} visible={visible}");
        Ok(layer)
    }
}

#[cfg(test)]
mod tests {
    use envmap_map_models::LayerKind;

    use super::*;

    fn info(id: &str, visible: bool, queryable: bool) -> LayerInfo {
        LayerInfo {
            id: id.to_string(),
            title: id.to_string(),
            kind: LayerKind::Wms,
            visible,
            copyright: None,
            queryable,
            url: None,
        }
    }

    #[test]
    fn toggles_visibility_by_id() {
        let mut list = LayerList::new(vec![info("a", false, true)]);
        assert!(!list.layers()[0].visible);
        assert!(list.set_visibility("a", true).unwrap().visible);
        assert_eq!(list.visible_top_down().count(), 1);
        assert!(matches!(
            list.set_visibility("zzz", true),
            Err(ViewerError::UnknownLayer { .. })
        ));
    }

    #[test]
    fn queryable_layers_are_listed_top_down() {
        let list = LayerList::new(vec![
            info("bottom", true, true),
            info("hidden", false, true),
            info("graphics", true, false),
            info("top", true, true),
        ]);
        let ids: Vec<&str> = list.queryable_top_down().map(|l| l.id.as_str()).collect();
        assert_eq!(ids, vec!["top", "bottom"]);
    }
}
