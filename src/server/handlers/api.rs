//! Service endpoints that are not tools.

use axum::{http::StatusCode, response::IntoResponse};

/// Health check endpoint for container orchestration.
#[utoipa::path(
    get,
    path = "/health",
    responses(
        (status = 200, description = "Server is healthy")
    ),
    tag = "Health"
)]
pub async fn health() -> impl IntoResponse {
    StatusCode::OK
}
