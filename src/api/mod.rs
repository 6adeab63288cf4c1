//! HTTP API: search page, JSON endpoints and OpenAPI docs

pub mod categories;
pub mod equipment;
pub mod health;
pub mod openapi;
pub mod packages;
pub mod search;
pub mod stats;

use axum::{
    routing::{get, post},
    Router,
};
use tower_http::{
    compression::CompressionLayer,
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use crate::AppState;

/// Create the application router with all routes
pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let api = Router::new()
        .route("/search", get(search::search))
        .route("/equipment", get(equipment::list_equipment))
        .route("/equipment/:id", get(equipment::get_equipment))
        .route("/equipment/:id/packages", get(equipment::get_equipment_packages))
        .route("/categories", get(categories::list_categories))
        .route("/categories/:id", get(categories::get_category))
        .route(
            "/packages",
            get(packages::find_packages).post(packages::create_package),
        )
        .route("/packages/:id", get(packages::get_package))
        .route("/packages/:id/duplicate", post(packages::duplicate_package))
        .route("/stats", get(stats::get_stats));

    let app = Router::new()
        .route("/", get(search::search_page))
        .route("/health", get(health::health_check))
        .route("/ready", get(health::readiness_check))
        .nest("/api", api)
        .with_state(state);

    app.merge(openapi::create_openapi_router())
        .layer(CompressionLayer::new())
        .layer(TraceLayer::new_for_http())
        .layer(cors)
}
