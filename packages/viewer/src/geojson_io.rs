//! Conversion between drawn geometries, graphics and `GeoJSON`.
//!
//! `GeoJSON` carries no CRS, so the CRS is supplied by the caller (the view
//! CRS for shapes sketched on the map).

use envmap_geometry_models::{Crs, DrawnGeometry};
use envmap_map_models::{Graphic, PopupBody};
use geojson::{Feature, FeatureCollection, Geometry, JsonObject, Value, feature::Id};

use crate::ViewerError;

/// Converts a `GeoJSON` geometry in `crs` into a drawn geometry.
///
/// # Errors
///
/// Returns [`ViewerError::UnsupportedGeometry`] for geometry types other
/// than `Point`, `LineString` and `Polygon`, and for positions with fewer
/// than two coordinates.
pub fn drawn_from_geojson(geometry: &Geometry, crs: Crs) -> Result<DrawnGeometry, ViewerError> {
    match &geometry.value {
        Value::Point(position) => Ok(DrawnGeometry::Point {
            crs,
            coordinates: xy(position)?,
        }),
        Value::LineString(line) => Ok(DrawnGeometry::Polyline {
            crs,
            coordinates: line.iter().map(|p| xy(p)).collect::<Result<_, _>>()?,
        }),
        Value::Polygon(rings) => {
            let mut rings = rings.iter().map(|ring| ring_coords(ring));
            let exterior = rings.next().transpose()?.unwrap_or_default();
            let interiors = rings.collect::<Result<_, _>>()?;
            Ok(DrawnGeometry::Polygon {
                crs,
                exterior,
                interiors,
            })
        }
        other => Err(ViewerError::UnsupportedGeometry {
            kind: value_kind(other).to_string(),
        }),
    }
}

/// Converts a drawn geometry into a `GeoJSON` geometry. Polygon rings are
/// closed.
#[must_use]
pub fn drawn_to_geojson(geometry: &DrawnGeometry) -> Geometry {
    let value = match geometry {
        DrawnGeometry::Point { coordinates, .. } => Value::Point(coordinates.to_vec()),
        DrawnGeometry::Polyline { coordinates, .. } => {
            Value::LineString(coordinates.iter().map(|c| c.to_vec()).collect())
        }
        DrawnGeometry::Polygon {
            exterior,
            interiors,
            ..
        } => Value::Polygon(
            std::iter::once(exterior)
                .chain(interiors)
                .map(|ring| closed_ring(ring))
                .collect(),
        ),
    };
    Geometry::new(value)
}

/// Builds a feature collection from graphics. Popup sections become the
/// `title` property and one property per field (or `message`).
#[must_use]
pub fn graphics_to_feature_collection<'a>(
    graphics: impl IntoIterator<Item = &'a Graphic>,
) -> FeatureCollection {
    let features = graphics
        .into_iter()
        .map(|graphic| {
            let mut properties = JsonObject::new();
            if let Some(popup) = &graphic.popup {
                properties.insert("title".to_string(), popup.title.clone().into());
                match &popup.body {
                    PopupBody::Fields(fields) => {
                        for field in fields {
                            properties.insert(field.label.clone(), field.value.clone().into());
                        }
                    }
                    PopupBody::Message(message) => {
                        properties.insert("message".to_string(), message.clone().into());
                    }
                }
            }
            if let Ok(symbol) = serde_json::to_value(&graphic.symbol) {
                properties.insert("symbol".to_string(), symbol);
            }

            Feature {
                bbox: None,
                geometry: Some(drawn_to_geojson(&graphic.geometry)),
                id: Some(Id::String(graphic.id.to_string())),
                properties: Some(properties),
                foreign_members: None,
            }
        })
        .collect();

    FeatureCollection {
        bbox: None,
        features,
        foreign_members: None,
    }
}

const fn value_kind(value: &Value) -> &'static str {
    match value {
        Value::Point(_) => "Point",
        Value::MultiPoint(_) => "MultiPoint",
        Value::LineString(_) => "LineString",
        Value::MultiLineString(_) => "MultiLineString",
        Value::Polygon(_) => "Polygon",
        Value::MultiPolygon(_) => "MultiPolygon",
        Value::GeometryCollection(_) => "GeometryCollection",
    }
}

fn xy(position: &[f64]) -> Result<[f64; 2], ViewerError> {
    match position {
        [x, y, ..] => Ok([*x, *y]),
        _ => Err(ViewerError::UnsupportedGeometry {
            kind: format!("position with {} coordinates", position.len()),
        }),
    }
}

fn ring_coords(ring: &[Vec<f64>]) -> Result<Vec<[f64; 2]>, ViewerError> {
    let mut coords = ring.iter().map(|p| xy(p)).collect::<Result<Vec<_>, _>>()?;
    if coords.len() > 1 && coords.first() == coords.last() {
        coords.pop();
    }
    Ok(coords)
}

fn closed_ring(ring: &[[f64; 2]]) -> Vec<Vec<f64>> {
    let mut out: Vec<Vec<f64>> = ring.iter().map(|c| c.to_vec()).collect();
    if let (Some(first), Some(last)) = (ring.first(), ring.last())
        && first != last
    {
        out.push(first.to_vec());
    }
    out
}
