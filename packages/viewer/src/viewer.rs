use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use envmap_feature_models::{FilteredPoint, PointsStatus};
use envmap_filter::filter_points;
use envmap_geometry_models::{Crs, DrawnGeometry, LonLat, MapPoint, ScreenPoint};
use envmap_map_models::{
    FillSymbol, Graphic, LayerInfo, LayerKind, LegendEntry, Notice, NoticeLevel, Popup,
    PopupSection, Symbol,
};
use envmap_projection::{Projector, Reproject};
use envmap_wfs::{FeatureSource, HttpFeatureSource, PointStore, WfsSource};
use envmap_wms::{
    FeatureInfoClient, FeatureInfoRequest, HttpFeatureInfoClient, RequestSequencer, WmsLayer,
};
use futures::future::join_all;

use crate::{
    ClickOutcome, FilterReport, ViewSnapshot, ViewerConfig, ViewerError, ViewerEvent,
    ViewerResponse,
    districts::Districts,
    drawing::DrawingSession,
    layers::{
        BASEMAP_LAYER_ID, DISTRICTS_LAYER_ID, DRAW_LAYER_ID, LANDMARK_LAYER_ID, LayerList,
        RESULTS_LAYER_ID,
    },
    notices::NoticeQueue,
    scale_bar::ScaleBar,
    view::{MapView, Overview},
};

/// Everything a [`MapViewer`] is assembled from.
pub struct ViewerParts {
    /// Viewer configuration.
    pub config: ViewerConfig,
    /// Definition of the filtered point source.
    pub source: WfsSource,
    /// WMS layers, bottom-most first.
    pub wms_layers: Vec<WmsLayer>,
    /// District polygons, if they could be loaded.
    pub districts: Option<Districts>,
    /// Where the remote points come from.
    pub point_source: Arc<dyn FeatureSource>,
    /// Where click queries go.
    pub info_client: Arc<dyn FeatureInfoClient>,
    /// Holder of the loaded points.
    pub points: PointStore,
}

/// Mutable viewer state, guarded by one mutex that is never held across an
/// `.await`.
struct ViewerState {
    view: MapView,
    overview: Overview,
    layers: LayerList,
    session: DrawingSession,
    drawings: Vec<Graphic>,
    results: Vec<Graphic>,
    landmark: Graphic,
    popup: Option<Popup>,
    notices: NoticeQueue,
}

/// The map viewer.
pub struct MapViewer {
    state: Mutex<ViewerState>,
    points: PointStore,
    point_source: Arc<dyn FeatureSource>,
    info_client: Arc<dyn FeatureInfoClient>,
    sequencer: RequestSequencer,
    projector: Projector,
    source: WfsSource,
    wms_layers: Vec<WmsLayer>,
    districts: Option<Districts>,
    draw_symbol: FillSymbol,
    districts_symbol: FillSymbol,
    circle_segments: u16,
    scale_bar_width: f64,
}

/// A layer a click is sent to.
enum ClickTarget<'a> {
    Wms {
        layer: &'a WmsLayer,
        request: FeatureInfoRequest,
    },
    Districts,
}

impl MapViewer {
    /// Assembles a viewer from its parts.
    ///
    /// # Errors
    ///
    /// Returns [`ViewerError::Projection`] if the configured view center or
    /// landmark cannot be projected.
    pub fn new(parts: ViewerParts) -> Result<Self, ViewerError> {
        let ViewerParts {
            config,
            source,
            wms_layers,
            districts,
            point_source,
            info_client,
            points,
        } = parts;

        let projector = Projector::new();
        let view = MapView::new(
            config.view.center,
            config.view.zoom,
            config.view.size(),
            &projector,
        )?;
        let overview = Overview::new(config.view.overview_basemap.clone(), &view);

        let landmark_position = projector.from_lon_lat(config.landmark.position, view.crs())?;
        let landmark = Graphic::new(
            DrawnGeometry::from_point(landmark_position),
            Symbol::Marker(config.landmark.symbol.clone()),
            Some(config.landmark.popup.render(&config.landmark.attributes)),
        );

        let layers = build_layer_list(&config, &source, &wms_layers, districts.is_some());

        Ok(Self {
            state: Mutex::new(ViewerState {
                view,
                overview,
                layers,
                session: DrawingSession::Idle,
                drawings: Vec::new(),
                results: Vec::new(),
                landmark,
                popup: None,
                notices: NoticeQueue::default(),
            }),
            points,
            point_source,
            info_client,
            sequencer: RequestSequencer::new(),
            projector,
            source,
            wms_layers,
            districts,
            draw_symbol: config.draw.symbol.clone(),
            districts_symbol: config.districts.symbol.clone(),
            circle_segments: config.draw.circle_segments,
            scale_bar_width: config.scale_bar.max_width_px,
        })
    }

    /// Wires a viewer to the real remote services named by `config`.
    ///
    /// A district file that cannot be read leaves the district layer
    /// without popups and raises a notice.
    ///
    /// # Errors
    ///
    /// Returns [`ViewerError`] if the point source is unknown or the HTTP
    /// client cannot be built.
    pub fn from_config(config: ViewerConfig) -> Result<Self, ViewerError> {
        let client = envmap_http::build_client(&config.http)?;

        let mut source = envmap_wfs::registry::source_by_id(&config.points_source).ok_or_else(
            || ViewerError::UnknownSource {
                id: config.points_source.clone(),
            },
        )?;
        if let Some(url) = config.url_override(&source.id) {
            log::info!("{}: using URL override {url}", source.id);
            source.url = url.to_string();
        }

        let wms_layers = envmap_wms::registry::all_layers()
            .into_iter()
            .map(|mut layer| {
                if let Some(url) = config.url_override(&layer.id) {
                    log::info!("{}: using URL override {url}", layer.id);
                    layer.url = url.to_string();
                }
                layer
            })
            .collect();

        let (districts, districts_error) =
            match Districts::load(&config.districts.path, config.districts.popup.clone()) {
                Ok(districts) => (Some(districts), None),
                Err(e) => {
                    log::warn!("District popups disabled: {e}");
                    (None, Some(e))
                }
            };

        let point_source = Arc::new(HttpFeatureSource::new(
            client.clone(),
            source.clone(),
            config.points_retry.clone(),
        ));
        let info_client = Arc::new(HttpFeatureInfoClient::new(
            client,
            config.click_retry.clone(),
        ));

        let viewer = Self::new(ViewerParts {
            config,
            source,
            wms_layers,
            districts,
            point_source,
            info_client,
            points: PointStore::new(),
        })?;

        if let Some(e) = districts_error {
            viewer.notify(NoticeLevel::Warning, format!("could not load data: {e}"));
        }

        Ok(viewer)
    }

    fn lock(&self) -> MutexGuard<'_, ViewerState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn notify(&self, level: NoticeLevel, message: impl Into<String>) {
        self.lock().notices.push(level, message);
    }

    /// Handles one user action.
    ///
    /// # Errors
    ///
    /// Returns [`ViewerError`] if the action is not valid in the current
    /// state (e.g. completing a shape while not drawing, or an unknown
    /// layer id).
    pub async fn dispatch(&self, event: ViewerEvent) -> Result<ViewerResponse, ViewerError> {
        match event {
            ViewerEvent::StartDraw { tool } => {
                let mut state = self.lock();
                state.session.start(tool);
                Ok(ViewerResponse::Drawing(state.session))
            }
            ViewerEvent::CancelDraw => {
                let mut state = self.lock();
                state.session.cancel();
                Ok(ViewerResponse::Drawing(state.session))
            }
            ViewerEvent::DrawCompleted { geometry } => self
                .complete_drawing(geometry)
                .map(ViewerResponse::Filtered),
            ViewerEvent::ClearDrawings => {
                self.clear_drawings();
                Ok(ViewerResponse::Cleared)
            }
            ViewerEvent::Click { screen } => Ok(ViewerResponse::Click(self.click(screen).await)),
            ViewerEvent::SetLayerVisibility { id, visible } => {
                let mut state = self.lock();
                let layer = state.layers.set_visibility(&id, visible)?.clone();
                Ok(ViewerResponse::Layer(layer))
            }
            ViewerEvent::ViewChanged { center, zoom, size } => {
                let mut state = self.lock();
                let view = state
                    .view
                    .recentered(&center, zoom, &self.projector)?
                    .with_size(size);
                state.view = view;
                state.overview.follow(&view);
                Ok(ViewerResponse::View(snapshot_of(&state)))
            }
            ViewerEvent::ReloadPoints => Ok(ViewerResponse::Points(self.load_points().await)),
        }
    }

    /// Fetches the remote points into the store. Failures become a notice.
    pub async fn load_points(&self) -> PointsStatus {
        if let Err(e) = self.points.load(self.point_source.as_ref()).await {
            self.notify(NoticeLevel::Error, format!("could not load data: {e}"));
        }
        self.points.status()
    }

    /// Adds a completed shape to the draw layer and filters the points
    /// against every polygon on it.
    fn complete_drawing(&self, geometry: DrawnGeometry) -> Result<FilterReport, ViewerError> {
        let status = self.points.status();
        let points = self.points.snapshot();

        let mut state = self.lock();
        state.session.complete(&geometry)?;
        state.drawings.push(Graphic::new(
            geometry,
            Symbol::Fill(self.draw_symbol.clone()),
            None,
        ));

        if !status.is_loaded() {
            log::warn!("Filtering before points are loaded ({status:?})");
            state
                .notices
                .push(NoticeLevel::Warning, "points not loaded yet");
        }

        let shapes: Vec<DrawnGeometry> = state.drawings.iter().map(|g| g.geometry.clone()).collect();
        let outcome = filter_points(&points, &shapes, state.view.crs(), &self.projector);

        if outcome.skipped > 0 {
            state.notices.push(
                NoticeLevel::Warning,
                format!("{} points could not be placed on the map", outcome.skipped),
            );
        }

        let added = outcome.points.len();
        let graphics: Vec<Graphic> = outcome
            .points
            .into_iter()
            .map(|point| self.result_graphic(point))
            .collect();
        state.results.extend(graphics);

        log::info!(
            "Polygon filter matched {added} points ({} results total)",
            state.results.len()
        );

        Ok(FilterReport {
            added,
            skipped: outcome.skipped,
            total_results: state.results.len(),
            points: status,
        })
    }

    /// Approximates a circle sketched in the view CRS as a polygon.
    #[must_use]
    pub fn circle(&self, center: [f64; 2], radius: f64) -> DrawnGeometry {
        let crs = self.lock().view.crs();
        DrawnGeometry::circle(crs, center, radius, self.circle_segments)
    }

    /// Reference system shapes are sketched in.
    #[must_use]
    pub fn view_crs(&self) -> Crs {
        self.lock().view.crs()
    }

    fn result_graphic(&self, point: FilteredPoint) -> Graphic {
        let popup = self.source.popup.render(&point.attributes.to_attributes());
        Graphic::new(
            DrawnGeometry::from_point(point.position),
            Symbol::Marker(self.source.symbol.clone()),
            Some(popup),
        )
    }

    fn clear_drawings(&self) {
        let mut state = self.lock();
        state.drawings.clear();
        state.results.clear();
    }

    /// Queries every visible queryable layer at `screen` and opens one
    /// merged popup.
    ///
    /// Answers that arrive after a newer click was made are discarded.
    pub async fn click(&self, screen: ScreenPoint) -> ClickOutcome {
        let (ticket, location, targets) = {
            let mut state = self.lock();
            let ticket = self.sequencer.next();
            let size = state.view.size();
            if !size.contains(screen) {
                log::debug!(
                    "Click {}: ({}, {}) lies outside the {}x{} view",
                    ticket.value(),
                    screen.x,
                    screen.y,
                    size.width,
                    size.height
                );
                state.popup = None;
                return ClickOutcome::NoPopup;
            }
            let location = state.view.screen_to_map(screen);
            let extent = state.view.extent();

            let mut targets = Vec::new();
            let mut failures = Vec::new();
            for info in state.layers.queryable_top_down() {
                match info.kind {
                    LayerKind::Wms => {
                        let Some(layer) = self.wms_layers.iter().find(|l| l.id == info.id) else {
                            continue;
                        };
                        match FeatureInfoRequest::new(layer, extent, size, screen) {
                            Ok(request) => targets.push(ClickTarget::Wms { layer, request }),
                            Err(e) => failures.push(format!("query failed: {} ({e})", layer.title)),
                        }
                    }
                    LayerKind::GeoJson => targets.push(ClickTarget::Districts),
                    LayerKind::Basemap | LayerKind::Graphics => {}
                }
            }
            for message in failures {
                state.notices.push(NoticeLevel::Error, message);
            }

            (ticket, location, targets)
        };

        if targets.is_empty() {
            log::debug!("Click {}: no queryable layer is visible", ticket.value());
            let mut state = self.lock();
            if self.sequencer.is_current(ticket) {
                state.popup = None;
            }
            return ClickOutcome::NoPopup;
        }

        let queries = targets.iter().filter_map(|target| match target {
            ClickTarget::Wms { request, .. } => Some(self.info_client.feature_info(request)),
            ClickTarget::Districts => None,
        });
        let mut answers = join_all(queries).await.into_iter();

        let mut sections: Vec<PopupSection> = Vec::new();
        let mut failures = Vec::new();
        for target in &targets {
            match target {
                ClickTarget::Wms { layer, .. } => match answers.next() {
                    Some(Ok(Some(info))) => sections.push(layer.popup.select(&info)),
                    Some(Ok(None)) | None => {}
                    Some(Err(e)) => {
                        log::error!("{}: feature info query failed: {e}", layer.id);
                        failures.push(format!("query failed: {}", layer.title));
                    }
                },
                ClickTarget::Districts => {
                    if let Some(section) = self.district_section(&location) {
                        sections.push(section);
                    }
                }
            }
        }

        let mut state = self.lock();
        for message in failures {
            state.notices.push(NoticeLevel::Error, message);
        }

        if !self.sequencer.is_current(ticket) {
            log::warn!("Discarding answers of superseded click {}", ticket.value());
            return ClickOutcome::Superseded;
        }

        if sections.is_empty() {
            state.popup = None;
            return ClickOutcome::NoPopup;
        }

        let popup = Popup {
            location: Some(location),
            sections,
        };
        state.popup = Some(popup.clone());
        ClickOutcome::Popup(popup)
    }

    fn district_section(&self, location: &MapPoint) -> Option<PopupSection> {
        let districts = self.districts.as_ref()?;
        match self.projector.reproject(location, Crs::Wgs84) {
            Ok(position) => districts.popup_at(LonLat::new(position.x, position.y)),
            Err(e) => {
                log::warn!("Cannot look up district at {location:?}: {e}");
                None
            }
        }
    }

    /// Layers, bottom-most first.
    #[must_use]
    pub fn layers(&self) -> Vec<LayerInfo> {
        self.lock().layers.layers().to_vec()
    }

    /// Legend of the visible layers, top-most first.
    ///
    /// Client-side layers list the symbol they are drawn with, WMS layers
    /// list one legend image per sub-layer. The basemap has no legend.
    #[must_use]
    pub fn legend(&self) -> Vec<LegendEntry> {
        let state = self.lock();
        state
            .layers
            .visible_top_down()
            .filter_map(|info| {
                let (symbol, images) = match info.kind {
                    LayerKind::Basemap => return None,
                    LayerKind::Wms => {
                        let layer = self.wms_layers.iter().find(|l| l.id == info.id)?;
                        match layer.legend_urls() {
                            Ok(urls) => (None, urls.into_iter().map(String::from).collect()),
                            Err(e) => {
                                log::warn!("{}: no legend: {e}", layer.id);
                                return None;
                            }
                        }
                    }
                    LayerKind::GeoJson => {
                        (Some(Symbol::Fill(self.districts_symbol.clone())), Vec::new())
                    }
                    LayerKind::Graphics => {
                        let symbol = match info.id.as_str() {
                            DRAW_LAYER_ID => Symbol::Fill(self.draw_symbol.clone()),
                            RESULTS_LAYER_ID => Symbol::Marker(self.source.symbol.clone()),
                            LANDMARK_LAYER_ID => state.landmark.symbol.clone(),
                            _ => return None,
                        };
                        (Some(symbol), Vec::new())
                    }
                };
                Some(LegendEntry {
                    layer_id: info.id.clone(),
                    title: info.title.clone(),
                    symbol,
                    images,
                })
            })
            .collect()
    }

    /// Shapes on the draw layer.
    #[must_use]
    pub fn drawings(&self) -> Vec<Graphic> {
        self.lock().drawings.clone()
    }

    /// Graphics on the result layer.
    #[must_use]
    pub fn results(&self) -> Vec<Graphic> {
        self.lock().results.clone()
    }

    /// The landmark marker.
    #[must_use]
    pub fn landmark(&self) -> Graphic {
        self.lock().landmark.clone()
    }

    /// The currently open popup.
    #[must_use]
    pub fn popup(&self) -> Option<Popup> {
        self.lock().popup.clone()
    }

    /// Current drawing session.
    #[must_use]
    pub fn session(&self) -> DrawingSession {
        self.lock().session
    }

    /// Load state of the remote points.
    #[must_use]
    pub fn points_status(&self) -> PointsStatus {
        self.points.status()
    }

    /// Current view, its extent and the overview.
    #[must_use]
    pub fn view(&self) -> ViewSnapshot {
        snapshot_of(&self.lock())
    }

    /// Removes and returns pending notices.
    #[must_use]
    pub fn drain_notices(&self) -> Vec<Notice> {
        self.lock().notices.drain()
    }

    /// Scale bar for the current view.
    ///
    /// # Errors
    ///
    /// Returns [`ViewerError::Projection`] if the view center has no
    /// latitude.
    pub fn scale_bar(&self) -> Result<ScaleBar, ViewerError> {
        let view = self.lock().view;
        Ok(ScaleBar::for_view(&view, self.scale_bar_width, &self.projector)?)
    }
}

fn snapshot_of(state: &ViewerState) -> ViewSnapshot {
    ViewSnapshot {
        view: state.view,
        extent: state.view.extent(),
        resolution: state.view.resolution(),
        overview: state.overview.clone(),
    }
}

fn build_layer_list(
    config: &ViewerConfig,
    source: &WfsSource,
    wms_layers: &[WmsLayer],
    districts_loaded: bool,
) -> LayerList {
    let graphics = |id: &str, title: &str| LayerInfo {
        id: id.to_string(),
        title: title.to_string(),
        kind: LayerKind::Graphics,
        visible: true,
        copyright: None,
        queryable: false,
        url: None,
    };

    let mut layers = vec![
        LayerInfo {
            id: BASEMAP_LAYER_ID.to_string(),
            title: config.view.basemap.clone(),
            kind: LayerKind::Basemap,
            visible: true,
            copyright: None,
            queryable: false,
            url: None,
        },
        LayerInfo {
            id: DISTRICTS_LAYER_ID.to_string(),
            title: config.districts.title.clone(),
            kind: LayerKind::GeoJson,
            visible: config.districts.visible,
            copyright: config.districts.copyright.clone(),
            queryable: districts_loaded,
            url: Some(config.districts.url.clone()),
        },
    ];

    layers.extend(wms_layers.iter().map(|layer| LayerInfo {
        id: layer.id.clone(),
        title: layer.title.clone(),
        kind: LayerKind::Wms,
        visible: layer.visible,
        copyright: layer.copyright.clone(),
        queryable: true,
        url: Some(layer.url.clone()),
    }));

    layers.push(graphics(DRAW_LAYER_ID, &config.draw.title));
    layers.push(graphics(RESULTS_LAYER_ID, &source.title));
    layers.push(graphics(LANDMARK_LAYER_ID, &config.landmark.title));

    LayerList::new(layers)
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    use async_trait::async_trait;
    use envmap_feature_models::{PointAttributes, RemotePoint};
    use envmap_geometry_models::{DrawTool, ViewSize};
    use envmap_map_models::PopupBody;
    use envmap_wfs::WfsError;
    use envmap_wms::{FeatureInfo, WmsError};

    use super::*;
    use crate::districts::tests::{DISTRICTS, popup as district_popup};

    const SNP_SQUARE: LonLat = LonLat::new(19.145_509_841_668_428, 48.735_487_675_199_87);

    struct StaticSource(Vec<RemotePoint>);

    #[async_trait]
    impl FeatureSource for StaticSource {
        fn id(&self) -> &str {
            "static"
        }

        async fn fetch_points(&self) -> Result<Vec<RemotePoint>, WfsError> {
            Ok(self.0.clone())
        }
    }

    struct FailingSource;

    #[async_trait]
    impl FeatureSource for FailingSource {
        fn id(&self) -> &str {
            "failing"
        }

        async fn fetch_points(&self) -> Result<Vec<RemotePoint>, WfsError> {
            Err(WfsError::ServiceException {
                message: "unavailable".to_string(),
            })
        }
    }

    /// Answers every layer with fixed attributes. Requests with `I == 1`
    /// are answered late.
    #[derive(Default)]
    struct FakeInfoClient {
        calls: AtomicUsize,
        fail_layer: Option<String>,
    }

    #[async_trait]
    impl FeatureInfoClient for FakeInfoClient {
        async fn feature_info(
            &self,
            request: &FeatureInfoRequest,
        ) -> Result<Option<FeatureInfo>, WmsError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if request.i == 1 {
                tokio::time::sleep(Duration::from_millis(50)).await;
            }
            if self.fail_layer.as_deref() == Some(request.layer_id.as_str()) {
                return Err(WmsError::ServiceException {
                    message: "boom".to_string(),
                });
            }
            let info: FeatureInfo = match request.layer_id.as_str() {
                "geological_wells" => [
                    ("Lokalita".to_string(), Some("Banská Bystrica".to_string())),
                    ("Typvrtu-popis".to_string(), Some("jadrový".to_string())),
                    ("Hĺbkavrtu".to_string(), Some("120".to_string())),
                ]
                .into_iter()
                .collect(),
                _ => [("nameText".to_string(), Some("Počúvadlo".to_string()))]
                    .into_iter()
                    .collect(),
            };
            Ok(Some(info))
        }
    }

    fn point(id: &str, lon: f64, lat: f64) -> RemotePoint {
        RemotePoint {
            id: Some(id.to_string()),
            position: LonLat::new(lon, lat),
            attributes: PointAttributes {
                name: Some(format!("Lokalita {id}")),
                priority: Some("K1".to_string()),
                urban_classification: None,
            },
        }
    }

    fn viewer_with(
        source: Arc<dyn FeatureSource>,
        client: Arc<FakeInfoClient>,
        districts: Option<Districts>,
    ) -> MapViewer {
        MapViewer::new(ViewerParts {
            config: ViewerConfig::embedded(),
            source: envmap_wfs::registry::source_by_id("environmental_burdens").unwrap(),
            wms_layers: envmap_wms::registry::all_layers(),
            districts,
            point_source: source,
            info_client: client,
            points: PointStore::new(),
        })
        .unwrap()
    }

    fn viewer(client: Arc<FakeInfoClient>) -> MapViewer {
        viewer_with(
            Arc::new(StaticSource(vec![
                point("near", 19.146, 48.736),
                point("far", 19.82, 48.735),
            ])),
            client,
            None,
        )
    }

    /// A square of `half` meters around the SNP square in the view CRS.
    fn square_around_snp(half: f64) -> DrawnGeometry {
        let c = Projector::new()
            .from_lon_lat(SNP_SQUARE, Crs::WebMercator)
            .unwrap();
        DrawnGeometry::rectangle(
            Crs::WebMercator,
            [c.x - half, c.y - half],
            [c.x + half, c.y + half],
        )
    }

    async fn draw(viewer: &MapViewer, geometry: DrawnGeometry) -> FilterReport {
        viewer
            .dispatch(ViewerEvent::StartDraw {
                tool: DrawTool::Polygon,
            })
            .await
            .unwrap();
        match viewer
            .dispatch(ViewerEvent::DrawCompleted { geometry })
            .await
            .unwrap()
        {
            ViewerResponse::Filtered(report) => report,
            other => panic!("unexpected response: {other:?}"),
        }
    }

    async fn show(viewer: &MapViewer, id: &str) {
        viewer
            .dispatch(ViewerEvent::SetLayerVisibility {
                id: id.to_string(),
                visible: true,
            })
            .await
            .unwrap();
    }

    #[test]
    fn initial_layers_follow_draw_order() {
        let viewer = viewer(Arc::new(FakeInfoClient::default()));
        let ids: Vec<String> = viewer.layers().into_iter().map(|l| l.id).collect();
        assert_eq!(
            ids,
            vec![
                "basemap",
                "districts",
                "surface_water_bodies",
                "geological_wells",
                "drawings",
                "results",
                "landmark",
            ]
        );
        let landmark = viewer.landmark();
        let popup = landmark.popup.unwrap();
        assert_eq!(popup.title, "Námestie SNP, Banská Bystrica");
        assert_eq!(
            popup.body,
            PopupBody::Message("Bod: Námestie SNP, Banská Bystrica".to_string())
        );
    }

    #[tokio::test]
    async fn banska_bystrica_polygon_keeps_only_nearby_point() {
        let viewer = viewer(Arc::new(FakeInfoClient::default()));
        assert_eq!(viewer.load_points().await, PointsStatus::Loaded { count: 2 });

        let report = draw(&viewer, square_around_snp(1_000.0)).await;
        assert_eq!(report.added, 1);
        assert_eq!(report.total_results, 1);
        assert_eq!(viewer.session(), DrawingSession::Idle);

        let results = viewer.results();
        let popup = results[0].popup.as_ref().unwrap();
        assert_eq!(popup.title, "Lokalita near");
        assert_eq!(popup.field("Priorita:"), Some("K1"));
        assert_eq!(popup.field("Urbánna klasifikácia:"), Some("Neznáma klasifikácia"));
        assert_eq!(viewer.drawings().len(), 1);
    }

    #[tokio::test]
    async fn results_accumulate_until_cleared() {
        let viewer = viewer(Arc::new(FakeInfoClient::default()));
        viewer.load_points().await;

        draw(&viewer, square_around_snp(1_000.0)).await;
        // Every polygon on the draw layer takes part again.
        let second = draw(&viewer, square_around_snp(500.0)).await;
        assert_eq!(second.added, 1);
        assert_eq!(second.total_results, 2);

        viewer.dispatch(ViewerEvent::ClearDrawings).await.unwrap();
        assert!(viewer.results().is_empty());
        assert!(viewer.drawings().is_empty());

        let again = draw(&viewer, square_around_snp(1_000.0)).await;
        assert_eq!(again.added, 1);
        assert_eq!(again.total_results, 1);
    }

    #[tokio::test]
    async fn circle_tool_filters_like_a_polygon() {
        let viewer = viewer(Arc::new(FakeInfoClient::default()));
        viewer.load_points().await;

        let center = Projector::new()
            .from_lon_lat(SNP_SQUARE, Crs::WebMercator)
            .unwrap();
        viewer
            .dispatch(ViewerEvent::StartDraw {
                tool: DrawTool::Circle,
            })
            .await
            .unwrap();
        let geometry = viewer.circle(center.xy(), 800.0);
        let ViewerResponse::Filtered(report) = viewer
            .dispatch(ViewerEvent::DrawCompleted { geometry })
            .await
            .unwrap()
        else {
            panic!("expected a filter report");
        };
        assert_eq!(report.added, 1);
    }

    #[tokio::test]
    async fn completing_without_session_is_rejected() {
        let viewer = viewer(Arc::new(FakeInfoClient::default()));
        let result = viewer
            .dispatch(ViewerEvent::DrawCompleted {
                geometry: square_around_snp(10.0),
            })
            .await;
        assert!(matches!(result, Err(ViewerError::NotDrawing)));
        assert!(viewer.drawings().is_empty());
    }

    #[tokio::test]
    async fn filtering_before_load_reports_not_loaded() {
        let viewer = viewer(Arc::new(FakeInfoClient::default()));
        let report = draw(&viewer, square_around_snp(1_000.0)).await;
        assert_eq!(report.added, 0);
        assert_eq!(report.points, PointsStatus::NotLoaded);

        let notices = viewer.drain_notices();
        assert!(notices.iter().any(|n| n.message == "points not loaded yet"));
        assert!(viewer.drain_notices().is_empty());
    }

    #[tokio::test]
    async fn failed_load_raises_notice() {
        let viewer = viewer_with(
            Arc::new(FailingSource),
            Arc::new(FakeInfoClient::default()),
            None,
        );
        let status = match viewer.dispatch(ViewerEvent::ReloadPoints).await.unwrap() {
            ViewerResponse::Points(status) => status,
            other => panic!("unexpected response: {other:?}"),
        };
        assert!(matches!(status, PointsStatus::Failed { .. }));
        assert!(viewer
            .drain_notices()
            .iter()
            .any(|n| n.level == NoticeLevel::Error && n.message.starts_with("could not load data")));
    }

    #[tokio::test]
    async fn click_without_visible_layers_sends_nothing() {
        let client = Arc::new(FakeInfoClient::default());
        let viewer = viewer(client.clone());

        let outcome = viewer.click(ScreenPoint::new(400.0, 300.0)).await;
        assert_eq!(outcome, ClickOutcome::NoPopup);
        assert_eq!(client.calls.load(Ordering::SeqCst), 0);
        assert_eq!(viewer.popup(), None);
    }

    #[tokio::test]
    async fn click_outside_the_view_sends_nothing() {
        let client = Arc::new(FakeInfoClient::default());
        let viewer = viewer(client.clone());
        show(&viewer, "geological_wells").await;

        for screen in [
            ScreenPoint::new(-5.0, 10.0),
            ScreenPoint::new(1280.0, 10.0),
            ScreenPoint::new(10.0, 720.0),
        ] {
            assert_eq!(viewer.click(screen).await, ClickOutcome::NoPopup);
        }
        assert_eq!(client.calls.load(Ordering::SeqCst), 0);
        assert_eq!(viewer.popup(), None);
    }

    #[tokio::test]
    async fn click_merges_layers_top_most_first() {
        let client = Arc::new(FakeInfoClient::default());
        let viewer = viewer(client.clone());
        show(&viewer, "surface_water_bodies").await;
        show(&viewer, "geological_wells").await;

        let ClickOutcome::Popup(popup) = viewer.click(ScreenPoint::new(400.0, 300.0)).await else {
            panic!("expected a popup");
        };
        assert_eq!(client.calls.load(Ordering::SeqCst), 2);

        let titles: Vec<&str> = popup.sections.iter().map(|s| s.title.as_str()).collect();
        assert_eq!(titles, vec!["Informácie o vrte", "Informácie o vodnom diele"]);
        assert_eq!(popup.sections[0].field("Hĺbka vrtu"), Some("120 m"));
        assert_eq!(popup.sections[1].field("Názov"), Some("Počúvadlo"));
        assert_eq!(viewer.popup(), Some(popup));
    }

    #[tokio::test]
    async fn failed_layer_raises_notice_and_others_still_show() {
        let client = Arc::new(FakeInfoClient {
            fail_layer: Some("geological_wells".to_string()),
            ..FakeInfoClient::default()
        });
        let viewer = viewer(client);
        show(&viewer, "surface_water_bodies").await;
        show(&viewer, "geological_wells").await;

        let ClickOutcome::Popup(popup) = viewer.click(ScreenPoint::new(400.0, 300.0)).await else {
            panic!("expected a popup");
        };
        assert_eq!(popup.sections.len(), 1);
        assert!(viewer
            .drain_notices()
            .iter()
            .any(|n| n.message == "query failed: Geologické vrty"));
    }

    #[tokio::test]
    async fn stale_click_never_replaces_newer_popup() {
        let client = Arc::new(FakeInfoClient::default());
        let viewer = viewer(client);
        show(&viewer, "geological_wells").await;

        let (first, second) = tokio::join!(viewer.click(ScreenPoint::new(1.0, 1.0)), async {
            tokio::time::sleep(Duration::from_millis(10)).await;
            viewer.click(ScreenPoint::new(400.0, 300.0)).await
        });

        assert_eq!(first, ClickOutcome::Superseded);
        let ClickOutcome::Popup(newer) = second else {
            panic!("expected a popup");
        };
        assert_eq!(viewer.popup(), Some(newer));
    }

    #[tokio::test]
    async fn visible_districts_add_a_section() {
        let districts = Districts::from_geojson_str(DISTRICTS, district_popup()).unwrap();
        let viewer = viewer_with(
            Arc::new(StaticSource(Vec::new())),
            Arc::new(FakeInfoClient::default()),
            Some(districts),
        );
        show(&viewer, "districts").await;

        let ClickOutcome::Popup(popup) = viewer.click(ScreenPoint::new(640.0, 360.0)).await else {
            panic!("expected a popup");
        };
        assert_eq!(popup.sections[0].title, "Okres Banská Bystrica");
    }

    #[tokio::test]
    async fn view_change_moves_overview_and_unknown_layer_fails() {
        let viewer = viewer(Arc::new(FakeInfoClient::default()));
        let response = viewer
            .dispatch(ViewerEvent::ViewChanged {
                center: MapPoint::new(19.0, 48.0, Crs::Wgs84),
                zoom: 10.0,
                size: ViewSize::new(1024, 768),
            })
            .await
            .unwrap();
        let ViewerResponse::View(snapshot) = response else {
            panic!("expected a view snapshot");
        };
        assert_eq!(snapshot.overview.extent, snapshot.extent);
        assert_eq!(snapshot.view.crs(), Crs::WebMercator);
        assert_eq!(viewer.view(), snapshot);

        assert!(matches!(
            viewer
                .dispatch(ViewerEvent::SetLayerVisibility {
                    id: "nope".to_string(),
                    visible: true,
                })
                .await,
            Err(ViewerError::UnknownLayer { .. })
        ));
    }

    #[tokio::test]
    async fn legend_lists_only_visible_layers() {
        let viewer = viewer(Arc::new(FakeInfoClient::default()));
        let ids: Vec<String> = viewer.legend().into_iter().map(|e| e.layer_id).collect();
        assert_eq!(ids, vec!["landmark", "results", "drawings"]);

        show(&viewer, "geological_wells").await;
        viewer
            .dispatch(ViewerEvent::SetLayerVisibility {
                id: "landmark".to_string(),
                visible: false,
            })
            .await
            .unwrap();

        let legend = viewer.legend();
        let ids: Vec<&str> = legend.iter().map(|e| e.layer_id.as_str()).collect();
        assert_eq!(ids, vec!["results", "drawings", "geological_wells"]);

        assert!(matches!(legend[0].symbol, Some(Symbol::Marker(_))));
        assert!(matches!(legend[1].symbol, Some(Symbol::Fill(_))));

        let wells = &legend[2];
        assert_eq!(wells.title, "Geologické vrty");
        assert!(wells.symbol.is_none());
        assert_eq!(wells.images.len(), 2);
        assert!(wells
            .images
            .iter()
            .all(|url| url.contains("REQUEST=GetLegendGraphic")));
    }

    #[test]
    fn scale_bar_uses_current_view() {
        let viewer = viewer(Arc::new(FakeInfoClient::default()));
        assert_eq!(viewer.scale_bar().unwrap().label, "200 m");
    }
}
