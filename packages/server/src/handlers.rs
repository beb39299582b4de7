//! HTTP handler functions for the map viewer API.

use actix_web::{HttpResponse, web};
use envmap_geometry_models::ScreenPoint;
use envmap_server_models::{
    ApiConfig, ApiError, ApiHealth, ClickRequest, DrawCompleteRequest, DrawStartRequest,
    DrawnShape, ViewRequest, VisibilityRequest,
};
use envmap_viewer::{
    ViewerError, ViewerEvent, ViewerResponse,
    geojson_io::{drawn_from_geojson, graphics_to_feature_collection},
};

use crate::AppState;

/// `GET /api/health`
pub async fn health(state: web::Data<AppState>) -> HttpResponse {
    HttpResponse::Ok().json(ApiHealth {
        healthy: true,
        version: env!("CARGO_PKG_VERSION").to_string(),
        points: state.viewer.points_status(),
    })
}

/// `GET /api/config`
///
/// Initial view, layer list and landmark for building the map.
pub async fn config(state: web::Data<AppState>) -> HttpResponse {
    let view = &state.config.view;
    HttpResponse::Ok().json(ApiConfig {
        crs: state.viewer.view_crs(),
        center: view.center,
        zoom: view.zoom,
        basemap: view.basemap.clone(),
        overview_basemap: view.overview_basemap.clone(),
        layers: state.viewer.layers(),
        landmark: state.viewer.landmark(),
    })
}

/// `GET /api/layers`
pub async fn layers(state: web::Data<AppState>) -> HttpResponse {
    HttpResponse::Ok().json(state.viewer.layers())
}

/// `GET /api/legend`
pub async fn legend(state: web::Data<AppState>) -> HttpResponse {
    HttpResponse::Ok().json(state.viewer.legend())
}

/// `PUT /api/layers/{id}/visibility`
pub async fn set_visibility(
    state: web::Data<AppState>,
    id: web::Path<String>,
    body: web::Json<VisibilityRequest>,
) -> HttpResponse {
    let event = ViewerEvent::SetLayerVisibility {
        id: id.into_inner(),
        visible: body.visible,
    };
    respond(state.viewer.dispatch(event).await)
}

/// `GET /api/view`
pub async fn view(state: web::Data<AppState>) -> HttpResponse {
    HttpResponse::Ok().json(state.viewer.view())
}

/// `PUT /api/view`
///
/// Pans, zooms or resizes the map. The overview follows.
pub async fn set_view(state: web::Data<AppState>, body: web::Json<ViewRequest>) -> HttpResponse {
    let ViewRequest { center, zoom, size } = body.into_inner();
    respond(
        state
            .viewer
            .dispatch(ViewerEvent::ViewChanged { center, zoom, size })
            .await,
    )
}

/// `GET /api/scale-bar`
pub async fn scale_bar(state: web::Data<AppState>) -> HttpResponse {
    match state.viewer.scale_bar() {
        Ok(bar) => HttpResponse::Ok().json(bar),
        Err(e) => error_response(&e),
    }
}

/// `GET /api/points/status`
pub async fn points_status(state: web::Data<AppState>) -> HttpResponse {
    HttpResponse::Ok().json(state.viewer.points_status())
}

/// `POST /api/points/reload`
///
/// Fetches the remote points again and waits for the result.
pub async fn reload_points(state: web::Data<AppState>) -> HttpResponse {
    respond(state.viewer.dispatch(ViewerEvent::ReloadPoints).await)
}

/// `POST /api/draw/start`
pub async fn draw_start(
    state: web::Data<AppState>,
    body: web::Json<DrawStartRequest>,
) -> HttpResponse {
    respond(
        state
            .viewer
            .dispatch(ViewerEvent::StartDraw { tool: body.tool })
            .await,
    )
}

/// `POST /api/draw/cancel`
pub async fn draw_cancel(state: web::Data<AppState>) -> HttpResponse {
    respond(state.viewer.dispatch(ViewerEvent::CancelDraw).await)
}

/// `POST /api/draw/complete`
///
/// Adds the sketched shape to the draw layer and filters the remote points
/// against every polygon drawn so far.
pub async fn draw_complete(
    state: web::Data<AppState>,
    body: web::Json<DrawCompleteRequest>,
) -> HttpResponse {
    let geometry = match &body.shape {
        DrawnShape::Circle { center, radius } => state.viewer.circle(*center, *radius),
        DrawnShape::Geometry(geometry) => {
            match drawn_from_geojson(geometry, state.viewer.view_crs()) {
                Ok(geometry) => geometry,
                Err(e) => return error_response(&e),
            }
        }
    };

    respond(
        state
            .viewer
            .dispatch(ViewerEvent::DrawCompleted { geometry })
            .await,
    )
}

/// `GET /api/drawings`
///
/// Drawn shapes as a `GeoJSON` feature collection in the view CRS.
pub async fn drawings(state: web::Data<AppState>) -> HttpResponse {
    HttpResponse::Ok().json(graphics_to_feature_collection(&state.viewer.drawings()))
}

/// `DELETE /api/drawings`
///
/// Removes all drawn shapes and filter results.
pub async fn clear_drawings(state: web::Data<AppState>) -> HttpResponse {
    respond(state.viewer.dispatch(ViewerEvent::ClearDrawings).await)
}

/// `GET /api/results`
///
/// Filter results as a `GeoJSON` feature collection in the view CRS.
pub async fn results(state: web::Data<AppState>) -> HttpResponse {
    HttpResponse::Ok().json(graphics_to_feature_collection(&state.viewer.results()))
}

/// `POST /api/click`
///
/// Queries every visible queryable layer at the clicked pixel.
pub async fn click(state: web::Data<AppState>, body: web::Json<ClickRequest>) -> HttpResponse {
    let screen = ScreenPoint::new(body.x, body.y);
    HttpResponse::Ok().json(state.viewer.click(screen).await)
}

/// `GET /api/popup`
pub async fn popup(state: web::Data<AppState>) -> HttpResponse {
    HttpResponse::Ok().json(state.viewer.popup())
}

/// `GET /api/notices`
///
/// Returns and removes pending notices.
pub async fn notices(state: web::Data<AppState>) -> HttpResponse {
    HttpResponse::Ok().json(state.viewer.drain_notices())
}

fn respond(result: Result<ViewerResponse, ViewerError>) -> HttpResponse {
    match result {
        Ok(response) => HttpResponse::Ok().json(response),
        Err(e) => error_response(&e),
    }
}

fn error_response(e: &ViewerError) -> HttpResponse {
    let body = ApiError::new(e.to_string());
    match e {
        ViewerError::UnknownLayer { .. } | ViewerError::UnknownSource { .. } => {
            log::debug!("Not found: {e}");
            HttpResponse::NotFound().json(body)
        }
        ViewerError::NotDrawing | ViewerError::GeometryMismatch { .. } => {
            log::debug!("Conflict: {e}");
            HttpResponse::Conflict().json(body)
        }
        ViewerError::UnsupportedGeometry { .. }
        | ViewerError::GeoJson(_)
        | ViewerError::Projection(_) => {
            log::debug!("Bad request: {e}");
            HttpResponse::BadRequest().json(body)
        }
        ViewerError::Io { .. }
        | ViewerError::Config(_)
        | ViewerError::Wfs(_)
        | ViewerError::Wms(_)
        | ViewerError::Http(_) => {
            log::error!("Request failed: {e}");
            HttpResponse::InternalServerError().json(body)
        }
    }
}
