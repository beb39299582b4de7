//! District polygons from a `GeoJSON` file, for click popups.

use std::path::Path;

use envmap_geometry_models::LonLat;
use envmap_map_models::{Attributes, PopupSection, PopupTemplate};
use geo::{BoundingRect, Contains, MultiPolygon};
use geojson::GeoJson;
use rstar::{AABB, RTree, RTreeObject};

use crate::ViewerError;

/// A district stored in the R-tree with its properties.
struct DistrictEntry {
    attributes: Attributes,
    envelope: AABB<[f64; 2]>,
    polygon: MultiPolygon<f64>,
}

impl RTreeObject for DistrictEntry {
    type Envelope = AABB<[f64; 2]>;

    fn envelope(&self) -> Self::Envelope {
        self.envelope
    }
}

/// District polygons in WGS84 with their popup template.
pub struct Districts {
    tree: RTree<DistrictEntry>,
    popup: PopupTemplate,
}

impl std::fmt::Debug for Districts {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Districts")
            .field("count", &self.tree.size())
            .finish_non_exhaustive()
    }
}

impl Districts {
    /// Reads districts from a `GeoJSON` file.
    ///
    /// # Errors
    ///
    /// Returns [`ViewerError::Io`] if the file cannot be read and
    /// [`ViewerError::GeoJson`] if it is not a `GeoJSON` document.
    pub fn load(path: &Path, popup: PopupTemplate) -> Result<Self, ViewerError> {
        let text = std::fs::read_to_string(path).map_err(|source| ViewerError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let districts = Self::from_geojson_str(&text, popup)?;
        log::info!("Loaded {} districts from {}", districts.len(), path.display());
        Ok(districts)
    }

    /// Parses districts from `GeoJSON` text.
    ///
    /// Features without a (multi)polygon geometry are skipped.
    ///
    /// # Errors
    ///
    /// Returns [`ViewerError::GeoJson`] if the text is not valid `GeoJSON`.
    pub fn from_geojson_str(text: &str, popup: PopupTemplate) -> Result<Self, ViewerError> {
        let geojson: GeoJson = text.parse()?;
        let features = match geojson {
            GeoJson::FeatureCollection(fc) => fc.features,
            GeoJson::Feature(feature) => vec![feature],
            GeoJson::Geometry(_) => Vec::new(),
        };

        let mut entries = Vec::with_capacity(features.len());
        let mut skipped = 0usize;

        for feature in features {
            let Some(polygon) = feature.geometry.and_then(to_multipolygon) else {
                skipped += 1;
                continue;
            };
            let Some(rect) = polygon.bounding_rect() else {
                skipped += 1;
                continue;
            };

            let attributes = feature
                .properties
                .unwrap_or_default()
                .into_iter()
                .map(|(key, value)| (key, property_text(value)))
                .collect();

            entries.push(DistrictEntry {
                attributes,
                envelope: AABB::from_corners(
                    [rect.min().x, rect.min().y],
                    [rect.max().x, rect.max().y],
                ),
                polygon,
            });
        }

        if skipped > 0 {
            log::warn!("Skipped {skipped} district features without polygon geometry");
        }

        Ok(Self {
            tree: RTree::bulk_load(entries),
            popup,
        })
    }

    /// Number of districts.
    #[must_use]
    pub fn len(&self) -> usize {
        self.tree.size()
    }

    /// Whether no district was loaded.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.tree.size() == 0
    }

    /// Properties of the district containing `position`.
    #[must_use]
    pub fn lookup(&self, position: LonLat) -> Option<&Attributes> {
        let point = geo::Point::new(position.lon, position.lat);
        self.tree
            .locate_in_envelope_intersecting(&AABB::from_point([position.lon, position.lat]))
            .find(|entry| entry.polygon.contains(&point))
            .map(|entry| &entry.attributes)
    }

    /// Popup section for a click at `position`, if it hits a district.
    #[must_use]
    pub fn popup_at(&self, position: LonLat) -> Option<PopupSection> {
        self.lookup(position).map(|attrs| self.popup.render(attrs))
    }
}

fn to_multipolygon(geometry: geojson::Geometry) -> Option<MultiPolygon<f64>> {
    let geometry: geo::Geometry<f64> = geometry.try_into().ok()?;
    match geometry {
        geo::Geometry::MultiPolygon(mp) => Some(mp),
        geo::Geometry::Polygon(p) => Some(MultiPolygon(vec![p])),
        _ => None,
    }
}

fn property_text(value: serde_json::Value) -> Option<String> {
    match value {
        serde_json::Value::Null => None,
        serde_json::Value::String(s) => Some(s),
        other => Some(other.to_string()),
    }
}
