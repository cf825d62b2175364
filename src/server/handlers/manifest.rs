//! Discovery manifest for calling agents.

use axum::{http::StatusCode, response::IntoResponse, Json};
use serde::Serialize;
use utoipa::openapi::{RefOr, Schema};
use utoipa::PartialSchema;

use crate::arcgis::request::{
    ExportMapRequest, GetNearestFacilityRequest, GetStatisticsRequest, GetTradeoffsRequest,
    ListLayersRequest, QueryFeaturesRequest,
};
use crate::arcgis::Intent;

/// Static description of every tool the server exposes.
#[derive(Serialize)]
pub struct Manifest {
    pub name: &'static str,
    pub version: &'static str,
    pub description: &'static str,
    pub actions: Vec<ActionEntry>,
}

#[derive(Serialize)]
pub struct ActionEntry {
    pub name: &'static str,
    /// HTTP path accepting a POST with the input as JSON body.
    pub path: String,
    pub description: &'static str,
    pub input_schema: RefOr<Schema>,
    /// Fields that must be present and non-empty.
    pub required: &'static [&'static str],
    pub result: &'static str,
}

impl Manifest {
    pub fn build() -> Self {
        Self {
            name: "arcgis-connector",
            version: env!("CARGO_PKG_VERSION"),
            description: "Query ArcGIS portals, feature layers and map services",
            actions: Intent::ALL.into_iter().map(ActionEntry::for_intent).collect(),
        }
    }
}

impl ActionEntry {
    fn for_intent(intent: Intent) -> Self {
        Self {
            name: intent.name(),
            path: format!("/mcp/{}", intent.action()),
            description: intent.description(),
            input_schema: input_schema(intent),
            required: intent.required_fields(),
            result: result_description(intent),
        }
    }
}

fn input_schema(intent: Intent) -> RefOr<Schema> {
    match intent {
        Intent::ListLayers => ListLayersRequest::schema(),
        Intent::QueryFeatures => QueryFeaturesRequest::schema(),
        Intent::GetStatistics => GetStatisticsRequest::schema(),
        Intent::ExportMap => ExportMapRequest::schema(),
        Intent::GetTradeoffs => GetTradeoffsRequest::schema(),
        Intent::GetNearestFacility => GetNearestFacilityRequest::schema(),
    }
}

fn result_description(intent: Intent) -> &'static str {
    match intent {
        Intent::ListLayers => "{ items: [{ id, title, url }] }",
        Intent::QueryFeatures => "Remote query payload, unmodified",
        Intent::GetStatistics => "{ statistics: [{ <stat>_<field>: number }] }",
        Intent::ExportMap => "{ image: <href or url> }",
        Intent::GetTradeoffs => "{ count, districts: [{ district_name, <strong_field>, <weak_field> }] }",
        Intent::GetNearestFacility => "{ attributes, geometry }",
    }
}

/// Serve the discovery manifest.
pub async fn manifest() -> impl IntoResponse {
    (StatusCode::OK, Json(Manifest::build()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_manifest_lists_every_action() {
        let manifest = serde_json::to_value(Manifest::build()).unwrap();
        let actions = manifest["actions"].as_array().unwrap();
        assert_eq!(actions.len(), 6);
        assert_eq!(actions[0]["name"], "list_layers");
        assert_eq!(actions[0]["path"], "/mcp/getLayers");
        assert_eq!(actions[1]["path"], "/mcp/query_layer");
        assert_eq!(actions[5]["required"][3], "y");
    }

    #[test]
    fn test_statistics_schema_uses_wire_name() {
        let manifest = serde_json::to_value(Manifest::build()).unwrap();
        let properties = &manifest["actions"][2]["input_schema"]["properties"];
        assert!(properties.get("statFields").is_some());
        assert!(properties.get("layer_url").is_some());
    }
}
