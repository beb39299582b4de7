#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Filters remote points against user-drawn polygons.
//!
//! Polygons are indexed in an R-tree of their bounding boxes; each point is
//! reprojected into the view CRS, the tree pre-selects candidate polygons
//! and an exact containment test decides. A point is kept if any polygon
//! contains it.

use envmap_feature_models::{FilteredPoint, RemotePoint};
use envmap_geometry_models::{Crs, DrawnGeometry};
use envmap_projection::Reproject;
use geo::{BoundingRect, Contains, Coord, LineString, Polygon};
use rstar::{AABB, RTree, RTreeObject};

/// A drawn polygon stored in the R-tree.
struct PolygonEntry {
    envelope: AABB<[f64; 2]>,
    polygon: Polygon<f64>,
}

impl RTreeObject for PolygonEntry {
    type Envelope = AABB<[f64; 2]>;

    fn envelope(&self) -> Self::Envelope {
        self.envelope
    }
}

/// Result of one filter run.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FilterOutcome {
    /// Points contained in at least one polygon, in input order.
    pub points: Vec<FilteredPoint>,
    /// Points that could not be reprojected into the target CRS.
    pub skipped: usize,
    /// Polygons that took part in the run.
    pub polygons_used: usize,
    /// Polygons ignored because they are degenerate or in another CRS.
    pub polygons_ignored: usize,
}

/// Polygon index for containment queries in a single CRS.
pub struct PolygonIndex {
    crs: Crs,
    tree: RTree<PolygonEntry>,
    ignored: usize,
}

impl PolygonIndex {
    /// Indexes the polygons among `shapes` that are expressed in `crs`.
    ///
    /// Points, polylines, polygons in another CRS and polygons with fewer
    /// than three vertices are not indexed.
    #[must_use]
    pub fn build(shapes: &[DrawnGeometry], crs: Crs) -> Self {
        let mut entries = Vec::new();
        let mut ignored = 0;

        for shape in shapes {
            let DrawnGeometry::Polygon {
                crs: shape_crs,
                exterior,
                interiors,
            } = shape
            else {
                continue;
            };

            if *shape_crs != crs {
                log::warn!("Ignoring polygon in {shape_crs}, view is in {crs}");
                ignored += 1;
                continue;
            }

            let Some(polygon) = to_polygon(exterior, interiors) else {
                log::warn!("Ignoring degenerate polygon with {} vertices", exterior.len());
                ignored += 1;
                continue;
            };

            let Some(rect) = polygon.bounding_rect() else {
                ignored += 1;
                continue;
            };

            entries.push(PolygonEntry {
                envelope: AABB::from_corners(
                    [rect.min().x, rect.min().y],
                    [rect.max().x, rect.max().y],
                ),
                polygon,
            });
        }

        Self {
            crs,
            tree: RTree::bulk_load(entries),
            ignored,
        }
    }

    /// Number of indexed polygons.
    #[must_use]
    pub fn len(&self) -> usize {
        self.tree.size()
    }

    /// Whether no polygon was indexed.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.tree.size() == 0
    }

    /// Whether any indexed polygon contains `(x, y)`.
    #[must_use]
    pub fn contains(&self, x: f64, y: f64) -> bool {
        let point = geo::Point::new(x, y);
        self.tree
            .locate_in_envelope_intersecting(&AABB::from_point([x, y]))
            .any(|entry| entry.polygon.contains(&point))
    }
}

fn to_polygon(exterior: &[[f64; 2]], interiors: &[Vec<[f64; 2]>]) -> Option<Polygon<f64>> {
    let ring = |coords: &[[f64; 2]]| -> LineString<f64> {
        coords.iter().map(|&[x, y]| Coord { x, y }).collect()
    };

    let finite = exterior
        .iter()
        .filter(|c| c.iter().all(|v| v.is_finite()))
        .count();
    if finite < 3 {
        return None;
    }

    Some(Polygon::new(
        ring(exterior),
        interiors.iter().map(|hole| ring(hole)).collect(),
    ))
}

/// Returns the points contained in at least one polygon of `shapes`.
///
/// Every point is reprojected into `target` first; points that fail to
/// reproject are counted in [`FilterOutcome::skipped`] and the run
/// continues. Attributes are carried over unchanged. The input is not
/// modified.
#[must_use]
pub fn filter_points(
    points: &[RemotePoint],
    shapes: &[DrawnGeometry],
    target: Crs,
    projector: &impl Reproject,
) -> FilterOutcome {
    let index = PolygonIndex::build(shapes, target);

    let mut outcome = FilterOutcome {
        polygons_used: index.len(),
        polygons_ignored: index.ignored,
        ..FilterOutcome::default()
    };

    if index.is_empty() || points.is_empty() {
        return outcome;
    }

    for point in points {
        let projected = match projector.reproject(&point.position.to_map_point(), index.crs) {
            Ok(projected) => projected,
            Err(e) => {
                log::warn!("Skipping point {:?}: {e}", point.id);
                outcome.skipped += 1;
                continue;
            }
        };

        if index.contains(projected.x, projected.y) {
            outcome.points.push(FilteredPoint {
                id: point.id.clone(),
                position: projected,
                source: point.position,
                attributes: point.attributes.clone(),
            });
        }
    }

    log::debug!(
        "Filtered {} points against {} polygons: {} kept, {} skipped",
        points.len(),
        outcome.polygons_used,
        outcome.points.len(),
        outcome.skipped
    );

    outcome
}

#[cfg(test)]
mod tests {
    use envmap_feature_models::PointAttributes;
    use envmap_geometry_models::{LonLat, MapPoint};
    use envmap_projection::{ProjectionError, Projector};

    use super::*;

    const SNP_SQUARE: LonLat = LonLat::new(19.145_509_841_668_428, 48.735_487_675_199_87);

    fn point(id: &str, lon: f64, lat: f64) -> RemotePoint {
        RemotePoint {
            id: Some(id.to_string()),
            position: LonLat::new(lon, lat),
            attributes: PointAttributes {
                name: Some(id.to_string()),
                ..PointAttributes::default()
            },
        }
    }

    fn square(crs: Crs, x0: f64, y0: f64, x1: f64, y1: f64) -> DrawnGeometry {
        DrawnGeometry::rectangle(crs, [x0, y0], [x1, y1])
    }

    fn ids(outcome: &FilterOutcome) -> Vec<&str> {
        outcome
            .points
            .iter()
            .filter_map(|p| p.id.as_deref())
            .collect()
    }

    /// Identity within WGS84, so geographic test data can be checked
    /// directly against geographic polygons.
    fn wgs84_shapes() -> Vec<DrawnGeometry> {
        vec![
            square(Crs::Wgs84, 0.0, 0.0, 10.0, 10.0),
            square(Crs::Wgs84, 20.0, 20.0, 30.0, 30.0),
        ]
    }

    #[test]
    fn keeps_exactly_the_contained_points() {
        let points = vec![
            point("in-first", 5.0, 5.0),
            point("in-second", 25.0, 25.0),
            point("between", 15.0, 15.0),
            point("outside", -5.0, 5.0),
        ];
        let outcome = filter_points(&points, &wgs84_shapes(), Crs::Wgs84, &Projector::new());
        assert_eq!(ids(&outcome), vec!["in-first", "in-second"]);
        assert_eq!(outcome.skipped, 0);
        assert_eq!(outcome.polygons_used, 2);
    }

    #[test]
    fn overlapping_polygons_do_not_duplicate_points() {
        let shapes = vec![
            square(Crs::Wgs84, 0.0, 0.0, 10.0, 10.0),
            square(Crs::Wgs84, 5.0, 5.0, 15.0, 15.0),
        ];
        let outcome = filter_points(
            &[point("overlap", 7.0, 7.0)],
            &shapes,
            Crs::Wgs84,
            &Projector::new(),
        );
        assert_eq!(ids(&outcome), vec!["overlap"]);
    }

    #[test]
    fn empty_inputs_give_empty_results() {
        let points = vec![point("a", 5.0, 5.0)];
        assert!(filter_points(&points, &[], Crs::Wgs84, &Projector::new())
            .points
            .is_empty());
        assert!(filter_points(&[], &wgs84_shapes(), Crs::Wgs84, &Projector::new())
            .points
            .is_empty());
    }

    #[test]
    fn non_polygon_shapes_never_contribute() {
        let closed_line = DrawnGeometry::Polyline {
            crs: Crs::Wgs84,
            coordinates: vec![[0.0, 0.0], [10.0, 0.0], [10.0, 10.0], [0.0, 10.0], [0.0, 0.0]],
        };
        let marker = DrawnGeometry::from_point(MapPoint::new(5.0, 5.0, Crs::Wgs84));
        let outcome = filter_points(
            &[point("a", 5.0, 5.0)],
            &[closed_line, marker],
            Crs::Wgs84,
            &Projector::new(),
        );
        assert!(outcome.points.is_empty());
        assert_eq!(outcome.polygons_used, 0);
    }

    #[test]
    fn holes_exclude_points() {
        let donut = DrawnGeometry::Polygon {
            crs: Crs::Wgs84,
            exterior: vec![[0.0, 0.0], [10.0, 0.0], [10.0, 10.0], [0.0, 10.0]],
            interiors: vec![vec![[4.0, 4.0], [6.0, 4.0], [6.0, 6.0], [4.0, 6.0]]],
        };
        let points = vec![point("ring", 2.0, 2.0), point("hole", 5.0, 5.0)];
        let outcome = filter_points(&points, &[donut], Crs::Wgs84, &Projector::new());
        assert_eq!(ids(&outcome), vec!["ring"]);
    }

    #[test]
    fn polygons_in_another_crs_are_ignored() {
        let outcome = filter_points(
            &[point("a", 5.0, 5.0)],
            &wgs84_shapes(),
            Crs::WebMercator,
            &Projector::new(),
        );
        assert!(outcome.points.is_empty());
        assert_eq!(outcome.polygons_ignored, 2);
    }

    #[test]
    fn banska_bystrica_square_scenario() {
        let projector = Projector::new();
        let center = projector
            .from_lon_lat(SNP_SQUARE, Crs::WebMercator)
            .unwrap();
        // 1 km around the square.
        let polygon = square(
            Crs::WebMercator,
            center.x - 1_000.0,
            center.y - 1_000.0,
            center.x + 1_000.0,
            center.y + 1_000.0,
        );
        let points = vec![
            point("near", 19.146, 48.736),
            // Roughly 50 km east.
            point("far", 19.82, 48.735),
        ];

        let outcome = filter_points(&points, &[polygon], Crs::WebMercator, &projector);
        assert_eq!(ids(&outcome), vec!["near"]);

        let kept = &outcome.points[0];
        assert_eq!(kept.position.crs, Crs::WebMercator);
        assert_eq!(kept.source, LonLat::new(19.146, 48.736));
        assert_eq!(kept.attributes.name.as_deref(), Some("near"));
    }

    #[test]
    fn unprojectable_point_is_skipped_and_counted() {
        let projector = Projector::new();
        let polygon = square(
            Crs::WebMercator,
            -20_037_508.0,
            -20_037_508.0,
            20_037_508.0,
            20_037_508.0,
        );
        let points = vec![
            point("pole", 0.0, 90.0),
            point("ok", 19.1, 48.7),
            point("nan", f64::NAN, 0.0),
        ];

        let outcome = filter_points(&points, &[polygon], Crs::WebMercator, &projector);
        assert_eq!(ids(&outcome), vec!["ok"]);
        assert_eq!(outcome.skipped, 2);
    }

    struct Unsupported;

    impl Reproject for Unsupported {
        fn reproject(&self, point: &MapPoint, target: Crs) -> Result<MapPoint, ProjectionError> {
            Err(ProjectionError::Unsupported {
                from: point.crs,
                to: target,
            })
        }
    }

    #[test]
    fn failing_projector_skips_every_point() {
        let points = vec![point("a", 5.0, 5.0), point("b", 6.0, 6.0)];
        let outcome = filter_points(&points, &wgs84_shapes(), Crs::Wgs84, &Unsupported);
        assert!(outcome.points.is_empty());
        assert_eq!(outcome.skipped, 2);
    }

    #[test]
    fn missing_attributes_do_not_drop_points() {
        let bare = RemotePoint {
            id: None,
            position: LonLat::new(5.0, 5.0),
            attributes: PointAttributes::default(),
        };
        let outcome = filter_points(&[bare], &wgs84_shapes(), Crs::Wgs84, &Projector::new());
        assert_eq!(outcome.points.len(), 1);
        assert_eq!(outcome.points[0].attributes, PointAttributes::default());
    }

    #[test]
    fn repeated_runs_are_identical_and_leave_input_untouched() {
        let points = vec![point("a", 5.0, 5.0), point("b", 15.0, 15.0)];
        let before = points.clone();
        let shapes = wgs84_shapes();

        let first = filter_points(&points, &shapes, Crs::Wgs84, &Projector::new());
        let second = filter_points(&points, &shapes, Crs::Wgs84, &Projector::new());
        assert_eq!(first, second);
        assert_eq!(points, before);
    }

    #[test]
    fn degenerate_polygon_is_ignored() {
        let sliver = DrawnGeometry::polygon(Crs::Wgs84, vec![[0.0, 0.0], [10.0, 10.0]]);
        let outcome = filter_points(&[point("a", 5.0, 5.0)], &[sliver], Crs::Wgs84, &Projector::new());
        assert!(outcome.points.is_empty());
        assert_eq!(outcome.polygons_ignored, 1);
    }
}
