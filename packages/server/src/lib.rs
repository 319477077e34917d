#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Actix-Web API gateway for the crime dashboard.
//!
//! Serves the dashboard's JSON endpoints from the crime `SQLite` database,
//! proxies incident predictions, and plans patrol routes through the
//! external directions service. Route playback is streamed to the browser
//! as server-sent events; only one playback runs at a time.

pub mod config;
mod handlers;

use std::sync::Arc;

use actix_cors::Cors;
use actix_web::{App, HttpServer, Scope, middleware, web};
use crime_dashboard_patrol::playback::PlaybackController;
use crime_dashboard_patrol::route::{OpenRouteServiceClient, RoutingService};
use crime_dashboard_patrol_models::SelectorConfig;
use crime_dashboard_prediction::PredictionClient;
use switchy_database::Database;

use crate::config::DashboardConfig;

/// Shared application state.
pub struct AppState {
    /// Crime database.
    pub db: Arc<dyn Database>,
    /// Directions service used for patrol routes.
    pub routing: Arc<dyn RoutingService>,
    /// Incident prediction service.
    pub prediction: Arc<PredictionClient>,
    /// The single patrol playback timer, shared by every client (the
    /// dashboard has one patrol marker).
    pub playback: Arc<PlaybackController>,
    /// Selector defaults for requests that don't override them.
    pub patrol: SelectorConfig,
}

/// Builds the `/api` scope with every dashboard endpoint.
#[must_use]
pub fn api_scope() -> Scope {
    web::scope("/api")
        .route("/health", web::get().to(handlers::health))
        .route("/hotspots", web::get().to(handlers::hotspots))
        .route("/police_stations", web::get().to(handlers::police_stations))
        .route("/accident_data", web::get().to(handlers::accident_data))
        .route("/legal", web::get().to(handlers::legal))
        .route("/crime_trends", web::get().to(handlers::crime_trends))
        .route("/incident_totals", web::get().to(handlers::incident_totals))
        .route("/predict-crime", web::get().to(handlers::predict_crime))
        .route("/resource-allocation", web::get().to(handlers::resource_allocation))
        .route("/future-crime-trends", web::get().to(handlers::future_crime_trends))
        .route("/patrol/plan", web::get().to(handlers::patrol_plan))
        .route("/patrol/playback", web::get().to(handlers::patrol_playback))
        .route("/patrol/playback", web::delete().to(handlers::stop_playback))
}

/// Opens the database and constructs the outbound clients for `config`.
///
/// # Errors
///
/// Returns an `std::io::Error` if the database cannot be opened or an
/// HTTP client cannot be built.
pub async fn build_state(config: &DashboardConfig) -> std::io::Result<AppState> {
    let db = crime_dashboard_database::open_db(&config.database.path)
        .await
        .map_err(std::io::Error::other)?;

    log::info!("Routing via {}", config.routing.endpoint());
    let routing = OpenRouteServiceClient::new(&config.routing).map_err(std::io::Error::other)?;

    log::info!("Predictions via {}", config.prediction.base_url);
    let prediction = PredictionClient::new(&config.prediction).map_err(std::io::Error::other)?;

    Ok(AppState {
        db: Arc::from(db),
        routing: Arc::new(routing),
        prediction: Arc::new(prediction),
        playback: Arc::new(PlaybackController::new(config.patrol.tick())),
        patrol: config.patrol.selector(),
    })
}

/// Starts the crime dashboard API server.
///
/// This is a regular async function; the caller provides the runtime
/// (e.g. via `#[actix_web::main]`).
///
/// # Errors
///
/// Returns an `std::io::Result` error if startup fails, the HTTP server
/// fails to bind, or it encounters a runtime error.
#[allow(clippy::future_not_send)]
pub async fn run_server(config: DashboardConfig) -> std::io::Result<()> {
    let state = web::Data::new(build_state(&config).await?);

    let bind_addr = config.server.bind_addr.clone();
    let port = config.server.port;

    log::info!("Starting server on {bind_addr}:{port}");

    HttpServer::new(move || {
        let cors = Cors::permissive();

        App::new()
            .wrap(cors)
            .wrap(middleware::Logger::default())
            .app_data(state.clone())
            .service(api_scope())
    })
    .bind((bind_addr, port))?
    .run()
    .await
}
