//! Router configuration for the web server.

use axum::{
    routing::{get, post},
    Router,
};
use tower_http::cors::CorsLayer;

use super::handlers;
use super::AppState;

/// Create the main router with all routes.
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(handlers::health))
        .route("/api/openapi.json", get(handlers::openapi_spec))
        // Discovery
        .route("/mcp/manifest", get(handlers::manifest))
        // Tools, under their published paths and their intent names
        .route("/mcp/getLayers", post(handlers::list_layers))
        .route("/mcp/list_layers", post(handlers::list_layers))
        .route("/mcp/query_layer", post(handlers::query_features))
        .route("/mcp/query_features", post(handlers::query_features))
        .route("/mcp/get_statistics", post(handlers::get_statistics))
        .route("/mcp/export_map", post(handlers::export_map))
        .route("/mcp/get_tradeoffs", post(handlers::get_tradeoffs))
        .route(
            "/mcp/get_nearest_facility",
            post(handlers::get_nearest_facility),
        )
        .route("/mcp/:action", post(handlers::call_action))
        .layer(CorsLayer::permissive())
        .with_state(state)
}
