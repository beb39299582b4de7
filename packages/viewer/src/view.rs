//! The main map view: center, zoom and pixel size in Web Mercator.

use envmap_geometry_models::{Crs, Extent, LonLat, MapPoint, ScreenPoint, ViewSize};
use envmap_projection::{ProjectionError, Projector, Reproject};
use serde::Serialize;

/// Meters per pixel at zoom level 0 of the 256-pixel Web Mercator tile
/// pyramid.
pub const ZOOM_0_RESOLUTION: f64 = 156_543.033_928_040_97;

/// Lowest zoom level a view accepts.
pub const MIN_ZOOM: f64 = 0.0;

/// Highest zoom level a view accepts.
pub const MAX_ZOOM: f64 = 24.0;

/// Clamps `zoom` to the supported range; a non-finite zoom yields
/// `fallback`.
fn clamp_zoom(zoom: f64, fallback: f64) -> f64 {
    if zoom.is_finite() {
        zoom.clamp(MIN_ZOOM, MAX_ZOOM)
    } else {
        log::warn!("Ignoring non-finite zoom {zoom}");
        fallback
    }
}

/// A view on the map.
///
/// Screen coordinates are pixels from the top-left corner; map coordinates
/// grow to the north, so the y axis is flipped between the two.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MapView {
    center: MapPoint,
    zoom: f64,
    size: ViewSize,
}

impl MapView {
    /// Creates a view centered on `center` in Web Mercator. The zoom is
    /// clamped to [`MIN_ZOOM`]..=[`MAX_ZOOM`].
    ///
    /// # Errors
    ///
    /// Returns [`ProjectionError`] if the center cannot be projected.
    pub fn new(
        center: LonLat,
        zoom: f64,
        size: ViewSize,
        projector: &Projector,
    ) -> Result<Self, ProjectionError> {
        Ok(Self {
            center: projector.from_lon_lat(center, Crs::WebMercator)?,
            zoom: clamp_zoom(zoom, MIN_ZOOM),
            size,
        })
    }

    /// View CRS.
    #[must_use]
    pub const fn crs(&self) -> Crs {
        self.center.crs
    }

    /// View center in the view CRS.
    #[must_use]
    pub const fn center(&self) -> MapPoint {
        self.center
    }

    /// Current zoom level.
    #[must_use]
    pub const fn zoom(&self) -> f64 {
        self.zoom
    }

    /// Current size in pixels.
    #[must_use]
    pub const fn size(&self) -> ViewSize {
        self.size
    }

    /// Map units per pixel at the current zoom.
    #[must_use]
    pub fn resolution(&self) -> f64 {
        ZOOM_0_RESOLUTION / self.zoom.exp2()
    }

    /// Returns a copy of this view with a different pixel size.
    #[must_use]
    pub const fn with_size(self, size: ViewSize) -> Self {
        Self { size, ..self }
    }

    /// Returns a copy of this view centered elsewhere at another zoom.
    ///
    /// The zoom is clamped to [`MIN_ZOOM`]..=[`MAX_ZOOM`]; a non-finite zoom
    /// keeps the current one.
    ///
    /// # Errors
    ///
    /// Returns [`ProjectionError`] if `center` cannot be reprojected into
    /// the view CRS.
    pub fn recentered(
        self,
        center: &MapPoint,
        zoom: f64,
        projector: &impl Reproject,
    ) -> Result<Self, ProjectionError> {
        Ok(Self {
            center: projector.reproject(center, self.crs())?,
            zoom: clamp_zoom(zoom, self.zoom),
            ..self
        })
    }

    /// The map area currently shown.
    #[must_use]
    pub fn extent(&self) -> Extent {
        let res = self.resolution();
        let half_w = f64::from(self.size.width) * res / 2.0;
        let half_h = f64::from(self.size.height) * res / 2.0;
        Extent::new(
            self.center.x - half_w,
            self.center.y - half_h,
            self.center.x + half_w,
            self.center.y + half_h,
            self.crs(),
        )
    }

    /// Converts a pixel position to a map position.
    #[must_use]
    pub fn screen_to_map(&self, screen: ScreenPoint) -> MapPoint {
        let extent = self.extent();
        let res = self.resolution();
        MapPoint::new(
            screen.x.mul_add(res, extent.xmin),
            screen.y.mul_add(-res, extent.ymax),
            self.crs(),
        )
    }

    /// Converts a map position (in the view CRS) to a pixel position.
    #[must_use]
    pub fn map_to_screen(&self, point: &MapPoint) -> ScreenPoint {
        let extent = self.extent();
        let res = self.resolution();
        ScreenPoint::new((point.x - extent.xmin) / res, (extent.ymax - point.y) / res)
    }
}

/// State of the overview map, which mirrors the main view extent.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Overview {
    /// Base map of the overview.
    pub basemap: String,
    /// Extent shown, always equal to the main view extent.
    pub extent: Extent,
}

impl Overview {
    /// Creates an overview mirroring `view`.
    #[must_use]
    pub fn new(basemap: impl Into<String>, view: &MapView) -> Self {
        Self {
            basemap: basemap.into(),
            extent: view.extent(),
        }
    }

    /// Follows a change of the main view.
    pub fn follow(&mut self, view: &MapView) {
        self.extent = view.extent();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn view() -> MapView {
        MapView::new(
            LonLat::new(19.145_509_841_668_428, 48.735_487_675_199_87),
            15.0,
            ViewSize::new(800, 600),
            &Projector::new(),
        )
        .unwrap()
    }

    #[test]
    fn resolution_halves_per_zoom_level() {
        let v = view();
        assert!((v.resolution() - 4.777_314_267_823_516).abs() < 1e-9);
        let closer = v.recentered(&v.center(), 16.0, &Projector::new()).unwrap();
        assert!((closer.resolution() * 2.0 - v.resolution()).abs() < 1e-9);
    }

    #[test]
    fn zoom_is_kept_in_range() {
        let v = view();
        let projector = Projector::new();

        let deep = v.recentered(&v.center(), 2000.0, &projector).unwrap();
        assert!((deep.zoom() - MAX_ZOOM).abs() < f64::EPSILON);
        assert!(deep.resolution() > 0.0);

        let far = v.recentered(&v.center(), -3.0, &projector).unwrap();
        assert!((far.zoom() - MIN_ZOOM).abs() < f64::EPSILON);

        let unchanged = v.recentered(&v.center(), f64::NAN, &projector).unwrap();
        assert!((unchanged.zoom() - v.zoom()).abs() < f64::EPSILON);
    }

    #[test]
    fn extent_is_centered_and_sized_by_pixels() {
        let v = view();
        let e = v.extent();
        assert!((e.width() - 800.0 * v.resolution()).abs() < 1e-6);
        assert!((e.height() - 600.0 * v.resolution()).abs() < 1e-6);
        let c = e.center();
        assert!((c.x - v.center().x).abs() < 1e-6);
        assert!((c.y - v.center().y).abs() < 1e-6);
        assert_eq!(e.crs, Crs::WebMercator);
    }

    #[test]
    fn screen_center_maps_to_view_center_and_back() {
        let v = view();
        let p = v.screen_to_map(ScreenPoint::new(400.0, 300.0));
        assert!((p.x - v.center().x).abs() < 1e-6);
        assert!((p.y - v.center().y).abs() < 1e-6);

        let corner = v.screen_to_map(ScreenPoint::new(0.0, 0.0));
        assert!((corner.x - v.extent().xmin).abs() < 1e-6);
        assert!((corner.y - v.extent().ymax).abs() < 1e-6);

        let s = v.map_to_screen(&corner);
        assert!(s.x.abs() < 1e-6 && s.y.abs() < 1e-6);
    }

    #[test]
    fn overview_mirrors_main_extent() {
        let v = view();
        let mut overview = Overview::new("topo-vector", &v);
        assert_eq!(overview.extent, v.extent());

        let resized = v.with_size(ViewSize::new(1024, 768));
        overview.follow(&resized);
        assert_eq!(overview.extent, resized.extent());
    }
}
