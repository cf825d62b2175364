//! Tool invocation handlers.
//!
//! Each handler forwards the raw JSON body to the dispatcher; validation and
//! error classification happen there, status codes are picked here.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::{json, Value};

use super::super::AppState;
use crate::arcgis::model::LayerList;
use crate::arcgis::request::{
    ExportMapRequest, GetNearestFacilityRequest, GetStatisticsRequest, GetTradeoffsRequest,
    ListLayersRequest, QueryFeaturesRequest,
};
use crate::arcgis::Intent;
use crate::error::{ConnectorError, ErrorKind};

/// List Feature and Map Services published on a portal.
#[utoipa::path(
    post,
    path = "/mcp/getLayers",
    request_body = ListLayersRequest,
    responses(
        (status = 200, description = "Layers published on the portal", body = LayerList),
        (status = 400, description = "portal_url or token missing"),
        (status = 500, description = "Portal error or unreachable portal")
    ),
    tag = "Tools"
)]
pub async fn list_layers(State(state): State<AppState>, Json(body): Json<Value>) -> Response {
    invoke(&state, Intent::ListLayers, body).await
}

/// Fetch up to the result cap of features, optionally filtered by geometry.
#[utoipa::path(
    post,
    path = "/mcp/query_layer",
    request_body = QueryFeaturesRequest,
    responses(
        (status = 200, description = "Remote query payload, unmodified"),
        (status = 400, description = "layer_url or token missing, or unusable geometry"),
        (status = 500, description = "Remote error or unreachable service")
    ),
    tag = "Tools"
)]
pub async fn query_features(State(state): State<AppState>, Json(body): Json<Value>) -> Response {
    invoke(&state, Intent::QueryFeatures, body).await
}

#[utoipa::path(
    post,
    path = "/mcp/get_statistics",
    request_body = GetStatisticsRequest,
    responses(
        (status = 200, description = "Statistic records, e.g. {\"statistics\": [{\"sum_population\": 1200}]}"),
        (status = 400, description = "Missing fields or unsupported statistic"),
        (status = 500, description = "Remote error or unreachable service")
    ),
    tag = "Tools"
)]
pub async fn get_statistics(State(state): State<AppState>, Json(body): Json<Value>) -> Response {
    invoke(&state, Intent::GetStatistics, body).await
}

#[utoipa::path(
    post,
    path = "/mcp/export_map",
    request_body = ExportMapRequest,
    responses(
        (status = 200, description = "Image reference, e.g. {\"image\": \"https://.../export.png\"}"),
        (status = 400, description = "map_service_url or token missing, or malformed bbox"),
        (status = 500, description = "Remote error or unreachable service")
    ),
    tag = "Tools"
)]
pub async fn export_map(State(state): State<AppState>, Json(body): Json<Value>) -> Response {
    invoke(&state, Intent::ExportMap, body).await
}

/// Districts at or above one threshold and at or below another.
#[utoipa::path(
    post,
    path = "/mcp/get_tradeoffs",
    request_body = GetTradeoffsRequest,
    responses(
        (status = 200, description = "Matching districts with their two indicator values"),
        (status = 400, description = "Missing fields or non-numeric thresholds"),
        (status = 500, description = "Remote error or no feature collection returned")
    ),
    tag = "Tools"
)]
pub async fn get_tradeoffs(State(state): State<AppState>, Json(body): Json<Value>) -> Response {
    invoke(&state, Intent::GetTradeoffs, body).await
}

/// Closest point facility to a WGS 84 coordinate.
#[utoipa::path(
    post,
    path = "/mcp/get_nearest_facility",
    request_body = GetNearestFacilityRequest,
    responses(
        (status = 200, description = "Attributes and geometry of the closest facility"),
        (status = 400, description = "Missing fields or non-numeric coordinates"),
        (status = 404, description = "No facility inside the search envelope"),
        (status = 500, description = "Remote error or unreachable service")
    ),
    tag = "Tools"
)]
pub async fn get_nearest_facility(
    State(state): State<AppState>,
    Json(body): Json<Value>,
) -> Response {
    invoke(&state, Intent::GetNearestFacility, body).await
}

/// Fallback for `/mcp/{action}`: resolves the action by name or path.
pub async fn call_action(
    State(state): State<AppState>,
    Path(action): Path<String>,
    Json(body): Json<Value>,
) -> Response {
    match action.parse::<Intent>() {
        Ok(intent) => invoke(&state, intent, body).await,
        Err(e) => error_response(&action, &e),
    }
}

async fn invoke(state: &AppState, intent: Intent, body: Value) -> Response {
    match state.dispatcher.dispatch(intent, body).await {
        Ok(result) => (StatusCode::OK, Json(result)).into_response(),
        Err(e) => error_response(intent.name(), &e),
    }
}

/// Map a dispatcher error onto a status code and JSON body.
fn error_response(action: &str, e: &ConnectorError) -> Response {
    let (status, body) = match e {
        ConnectorError::UnknownAction(_) => {
            (StatusCode::NOT_FOUND, json!({ "error": e.to_string() }))
        }
        ConnectorError::Remote(remote) => {
            (StatusCode::INTERNAL_SERVER_ERROR, json!({ "error": remote }))
        }
        _ => match e.kind() {
            ErrorKind::ClientInput => (StatusCode::BAD_REQUEST, json!({ "error": e.to_string() })),
            ErrorKind::Service => (
                StatusCode::INTERNAL_SERVER_ERROR,
                json!({ "error": e.to_string() }),
            ),
            ErrorKind::NotFound => (StatusCode::NOT_FOUND, json!({ "message": e.to_string() })),
            ErrorKind::Transport => (
                StatusCode::INTERNAL_SERVER_ERROR,
                json!({ "error": format!("{} failed", action), "detail": e.to_string() }),
            ),
        },
    };
    (status, Json(body)).into_response()
}
