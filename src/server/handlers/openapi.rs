//! OpenAPI spec generation and serving.

use axum::{http::StatusCode, response::IntoResponse};
use utoipa::OpenApi;

use super::api;
use super::tools;
use crate::arcgis::model::{LayerDescriptor, LayerList};
use crate::arcgis::request::{
    ExportMapRequest, GetNearestFacilityRequest, GetStatisticsRequest, GetTradeoffsRequest,
    ListLayersRequest, QueryFeaturesRequest,
};

#[derive(OpenApi)]
#[openapi(
    info(
        title = "ArcGIS Connector API",
        description = "Tool endpoints over ArcGIS portals, feature layers and map services"
    ),
    paths(
        api::health,
        tools::list_layers,
        tools::query_features,
        tools::get_statistics,
        tools::export_map,
        tools::get_tradeoffs,
        tools::get_nearest_facility,
    ),
    components(schemas(
        ListLayersRequest,
        QueryFeaturesRequest,
        GetStatisticsRequest,
        ExportMapRequest,
        GetTradeoffsRequest,
        GetNearestFacilityRequest,
        LayerDescriptor,
        LayerList,
    )),
    tags(
        (name = "Health", description = "Health check"),
        (name = "Tools", description = "Portal, layer and map service actions"),
    )
)]
pub struct ApiDoc;

/// Serve the OpenAPI spec as JSON.
pub async fn openapi_spec() -> impl IntoResponse {
    let spec = ApiDoc::openapi()
        .to_json()
        .unwrap_or_else(|e| format!("{{\"error\": \"{}\"}}", e));
    (StatusCode::OK, [("content-type", "application/json")], spec)
}
