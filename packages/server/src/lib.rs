#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Actix-Web API server for the environmental map viewer.
//!
//! Serves the REST API the map frontend drives (layer visibility, legend,
//! drawing and point filtering, click queries, notices) together with the static
//! frontend files and the `GeoJSON` dataset directory. The remote points
//! are fetched by a background task started with the server; requests made
//! before it finishes see an empty point collection.

mod handlers;

use std::sync::Arc;

use actix_cors::Cors;
use actix_files::Files;
use actix_web::{App, HttpServer, middleware, web};
use envmap_viewer::{MapViewer, ViewerConfig};

/// Shared application state.
pub struct AppState {
    /// Viewer configuration the server was started with.
    pub config: ViewerConfig,
    /// The viewer all requests operate on.
    pub viewer: Arc<MapViewer>,
}

/// Registers the `/api` routes.
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api")
            .route("/health", web::get().to(handlers::health))
            .route("/config", web::get().to(handlers::config))
            .route("/layers", web::get().to(handlers::layers))
            .route("/legend", web::get().to(handlers::legend))
            .route(
                "/layers/{id}/visibility",
                web::put().to(handlers::set_visibility),
            )
            .route("/view", web::get().to(handlers::view))
            .route("/view", web::put().to(handlers::set_view))
            .route("/scale-bar", web::get().to(handlers::scale_bar))
            .route("/points/status", web::get().to(handlers::points_status))
            .route("/points/reload", web::post().to(handlers::reload_points))
            .route("/draw/start", web::post().to(handlers::draw_start))
            .route("/draw/cancel", web::post().to(handlers::draw_cancel))
            .route("/draw/complete", web::post().to(handlers::draw_complete))
            .route("/drawings", web::get().to(handlers::drawings))
            .route("/drawings", web::delete().to(handlers::clear_drawings))
            .route("/results", web::get().to(handlers::results))
            .route("/click", web::post().to(handlers::click))
            .route("/popup", web::get().to(handlers::popup))
            .route("/notices", web::get().to(handlers::notices)),
    );
}

/// Starts the map viewer API server.
///
/// Loads the viewer configuration, wires the viewer to the remote services,
/// spawns the initial point load and starts the Actix-Web HTTP server. This
/// is a regular async function; the caller provides the runtime (e.g. via
/// `#[actix_web::main]`).
///
/// # Errors
///
/// Returns an `std::io::Result` error if the configuration or viewer cannot
/// be set up, or if the HTTP server fails to bind or encounters a runtime
/// error.
#[allow(clippy::future_not_send)]
pub async fn run_server() -> std::io::Result<()> {
    pretty_env_logger::init_custom_env("RUST_LOG");

    log::info!("Loading viewer configuration...");
    let config = ViewerConfig::load().map_err(std::io::Error::other)?;

    log::info!("Setting up map viewer...");
    let viewer = Arc::new(MapViewer::from_config(config.clone()).map_err(std::io::Error::other)?);

    let loader = Arc::clone(&viewer);
    actix_rt::spawn(async move {
        let status = loader.load_points().await;
        log::info!("Initial point load finished: {status:?}");
    });

    let static_dir = config.static_dir.clone();
    let data_dir = config.data_dir.clone();
    let state = web::Data::new(AppState { config, viewer });

    let bind_addr = std::env::var("BIND_ADDR").unwrap_or_else(|_| "127.0.0.1".to_string());
    let port: u16 = std::env::var("PORT")
        .ok()
        .and_then(|p| p.parse().ok())
        .unwrap_or(8080);

    log::info!("Starting server on {bind_addr}:{port}");

    HttpServer::new(move || {
        let cors = Cors::permissive();

        App::new()
            .wrap(cors)
            .wrap(middleware::Logger::default())
            .app_data(state.clone())
            .configure(configure)
            // GeoJSON datasets (districts)
            .service(Files::new("/data", &data_dir))
            // Frontend static files
            .service(Files::new("/", &static_dir).index_file("index.html"))
    })
    .bind((bind_addr, port))?
    .run()
    .await
}
