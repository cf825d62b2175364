//! Outbound query construction, one builder per tool action.
//!
//! Builders only see validated parameters, so they never fail. Each returns
//! the full target URL and the ordered list of query parameters for a single
//! GET against the remote service.

use std::fmt;
use std::str::FromStr;

use serde_json::Value;
use url::Url;

use super::model::{Envelope, SpatialReference, WGS84_WKID};
use super::request::{
    ExportMapParams, GeometryFilter, ListLayersParams, NearestFacilityParams, QueryFeaturesParams,
    StatisticsParams, TradeoffParams,
};
use super::stats::out_statistics;
use crate::error::ConnectorError;

/// Free-text filter selecting queryable service items on a portal.
pub const LAYER_SEARCH_QUERY: &str = r#"type:"Feature Service" OR type:"Map Service""#;
/// Output size of exported map images.
pub const EXPORT_IMAGE_SIZE: &str = "1024,768";
pub const EXPORT_IMAGE_FORMAT: &str = "png32";
pub const SPATIAL_REL_INTERSECTS: &str = "esriSpatialRelIntersects";

/// The tool actions exposed to callers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Intent {
    ListLayers,
    QueryFeatures,
    GetStatistics,
    ExportMap,
    GetTradeoffs,
    GetNearestFacility,
}

impl Intent {
    pub const ALL: [Intent; 6] = [
        Intent::ListLayers,
        Intent::QueryFeatures,
        Intent::GetStatistics,
        Intent::ExportMap,
        Intent::GetTradeoffs,
        Intent::GetNearestFacility,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Intent::ListLayers => "list_layers",
            Intent::QueryFeatures => "query_features",
            Intent::GetStatistics => "get_statistics",
            Intent::ExportMap => "export_map",
            Intent::GetTradeoffs => "get_tradeoffs",
            Intent::GetNearestFacility => "get_nearest_facility",
        }
    }

    /// Action name used in the HTTP route, kept for existing agent manifests.
    pub fn action(&self) -> &'static str {
        match self {
            Intent::ListLayers => "getLayers",
            Intent::QueryFeatures => "query_layer",
            other => other.name(),
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            Intent::ListLayers => "List feature and map services published on a portal.",
            Intent::QueryFeatures => {
                "Fetch the first features of a layer, optionally filtered by a geometry."
            }
            Intent::GetStatistics => {
                "Compute server-side statistics for fields given as field:stat pairs."
            }
            Intent::ExportMap => "Render a 1024x768 PNG extract of a map service.",
            Intent::GetTradeoffs => {
                "List districts at or above a threshold on one field and at or below a threshold on another."
            }
            Intent::GetNearestFacility => {
                "Find the facility closest to a WGS 84 point within a small search envelope."
            }
        }
    }

    pub fn required_fields(&self) -> &'static [&'static str] {
        match self {
            Intent::ListLayers => &["portal_url", "token"],
            Intent::QueryFeatures => &["layer_url", "token"],
            Intent::GetStatistics => &["layer_url", "token", "statFields"],
            Intent::ExportMap => &["map_service_url", "token"],
            Intent::GetTradeoffs => &[
                "layer_url",
                "token",
                "strong_field",
                "weak_field",
                "strong_threshold",
                "weak_threshold",
            ],
            Intent::GetNearestFacility => &["feature_service_url", "token", "x", "y"],
        }
    }

    pub fn operation(&self) -> RemoteOperation {
        match self {
            Intent::ListLayers => RemoteOperation::Search,
            Intent::ExportMap => RemoteOperation::Export,
            _ => RemoteOperation::Query,
        }
    }
}

impl fmt::Display for Intent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Intent {
    type Err = ConnectorError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Intent::ALL
            .into_iter()
            .find(|i| i.name() == s || i.action() == s)
            .ok_or_else(|| ConnectorError::UnknownAction(s.to_string()))
    }
}

/// Remote endpoint an action talks to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RemoteOperation {
    Search,
    Query,
    Export,
}

impl RemoteOperation {
    pub fn path(&self) -> &'static str {
        match self {
            RemoteOperation::Search => "/sharing/rest/search",
            RemoteOperation::Query => "/query",
            RemoteOperation::Export => "/export",
        }
    }
}

/// Tunables shared by the builders.
#[derive(Debug, Clone, PartialEq)]
pub struct QueryOptions {
    /// Result cap for feature queries.
    pub result_record_count: u32,
    /// Page size for portal searches.
    pub search_page_size: u32,
    /// Half-width, in degrees, of the nearest-facility search envelope.
    pub nearest_buffer_degrees: f64,
}

impl Default for QueryOptions {
    fn default() -> Self {
        Self {
            result_record_count: 10,
            search_page_size: 100,
            nearest_buffer_degrees: 0.01,
        }
    }
}

/// A single outbound GET.
#[derive(Debug, Clone, PartialEq)]
pub struct QueryRequest {
    pub intent: Intent,
    pub url: String,
    pub params: Vec<(String, String)>,
}

impl QueryRequest {
    fn new(intent: Intent, base_url: &str) -> Self {
        Self {
            intent,
            url: endpoint(base_url, intent.operation()),
            params: Vec::new(),
        }
    }

    fn param(mut self, key: &str, value: impl Into<String>) -> Self {
        self.set(key, value);
        self
    }

    /// Set a parameter, replacing an existing value in place.
    fn set(&mut self, key: &str, value: impl Into<String>) {
        let value = value.into();
        match self.params.iter_mut().find(|(k, _)| k == key) {
            Some(existing) => existing.1 = value,
            None => self.params.push((key.to_string(), value)),
        }
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.params
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    /// Full URL with the token masked, for logging.
    pub fn redacted_url(&self) -> String {
        let Ok(mut url) = Url::parse(&self.url) else {
            return self.url.clone();
        };
        url.query_pairs_mut().extend_pairs(self.params.iter().map(|(k, v)| {
            if k == "token" {
                (k.as_str(), "***")
            } else {
                (k.as_str(), v.as_str())
            }
        }));
        url.to_string()
    }
}

/// Base URL with one trailing slash removed, joined with the operation path.
pub fn endpoint(base_url: &str, operation: RemoteOperation) -> String {
    let base = base_url.strip_suffix('/').unwrap_or(base_url);
    format!("{}{}", base, operation.path())
}

pub fn list_layers(params: &ListLayersParams, options: &QueryOptions) -> QueryRequest {
    QueryRequest::new(Intent::ListLayers, &params.portal_url)
        .param("q", LAYER_SEARCH_QUERY)
        .param("f", "json")
        .param("num", options.search_page_size.to_string())
        .param("token", &params.token)
}

/// Select-all feature query without geometry in the output.
fn feature_query(intent: Intent, base_url: &str, token: &str, options: &QueryOptions) -> QueryRequest {
    QueryRequest::new(intent, base_url)
        .param("where", "1=1")
        .param("outFields", "*")
        .param("resultRecordCount", options.result_record_count.to_string())
        .param("returnGeometry", "false")
        .param("f", "json")
        .param("token", token)
}

pub fn query_features(params: &QueryFeaturesParams, options: &QueryOptions) -> QueryRequest {
    let mut request = feature_query(
        Intent::QueryFeatures,
        &params.layer_url,
        &params.token,
        options,
    );
    match &params.geometry {
        Some(GeometryFilter::Object(geometry)) => {
            request.set("geometry", Value::Object(geometry.clone()).to_string());
            if let Some(kind) = geometry_type(geometry) {
                request.set("geometryType", kind);
            }
            request.set("spatialRel", SPATIAL_REL_INTERSECTS);
        }
        Some(GeometryFilter::Raw(geometry)) => request.set("geometry", geometry.as_str()),
        None => {}
    }
    request
}

/// Geometry type name implied by the members of a geometry object.
pub fn geometry_type(geometry: &serde_json::Map<String, Value>) -> Option<&'static str> {
    if geometry.contains_key("rings") {
        Some("esriGeometryPolygon")
    } else if geometry.contains_key("paths") {
        Some("esriGeometryPolyline")
    } else if geometry.contains_key("points") {
        Some("esriGeometryMultipoint")
    } else if geometry.contains_key("xmin") {
        Some("esriGeometryEnvelope")
    } else if geometry.contains_key("x") && geometry.contains_key("y") {
        Some("esriGeometryPoint")
    } else {
        None
    }
}

pub fn statistics(params: &StatisticsParams) -> QueryRequest {
    QueryRequest::new(Intent::GetStatistics, &params.layer_url)
        .param("f", "json")
        .param("where", "1=1")
        .param("outStatistics", out_statistics(&params.statistics).to_string())
        .param("returnGeometry", "false")
        .param("token", &params.token)
}

pub fn export_map(params: &ExportMapParams) -> QueryRequest {
    let mut request = QueryRequest::new(Intent::ExportMap, &params.map_service_url)
        .param("f", "json")
        .param("size", EXPORT_IMAGE_SIZE)
        .param("format", EXPORT_IMAGE_FORMAT)
        .param("token", &params.token);
    if let Some(bbox) = &params.bbox {
        request.set("bbox", bbox.as_str());
    }
    request
}

pub fn tradeoffs(params: &TradeoffParams, options: &QueryOptions) -> QueryRequest {
    feature_query(Intent::GetTradeoffs, &params.layer_url, &params.token, options)
}

pub fn nearest_facility(params: &NearestFacilityParams, options: &QueryOptions) -> QueryRequest {
    let envelope = search_envelope(params.x, params.y, options);
    let mut request = feature_query(
        Intent::GetNearestFacility,
        &params.feature_service_url,
        &params.token,
        options,
    );
    request.set("geometry", envelope.to_json());
    request.set("geometryType", "esriGeometryEnvelope");
    request.set("spatialRel", SPATIAL_REL_INTERSECTS);
    request.set("returnGeometry", "true");
    request.set("inSR", WGS84_WKID.to_string());
    request.set("outSR", WGS84_WKID.to_string());
    request
}

/// Envelope scoping the remote nearest-facility search.
pub fn search_envelope(x: f64, y: f64, options: &QueryOptions) -> Envelope {
    Envelope::around(x, y, options.nearest_buffer_degrees, SpatialReference::WGS84)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::arcgis::model::{StatisticSpec, StatisticType};
    use serde_json::json;

    const LAYER: &str = "https://services.example.com/arcgis/rest/services/Districts/FeatureServer/0";

    #[test]
    fn test_intent_names_round_trip() {
        for intent in Intent::ALL {
            assert_eq!(intent.name().parse::<Intent>().unwrap(), intent);
            assert_eq!(intent.action().parse::<Intent>().unwrap(), intent);
        }
        assert!(matches!(
            "drop_tables".parse::<Intent>(),
            Err(ConnectorError::UnknownAction(_))
        ));
    }

    #[test]
    fn test_endpoint_strips_one_trailing_slash() {
        assert_eq!(
            endpoint("https://portal.example.com/", RemoteOperation::Search),
            "https://portal.example.com/sharing/rest/search"
        );
        assert_eq!(
            endpoint("https://s.example.com/MapServer", RemoteOperation::Export),
            "https://s.example.com/MapServer/export"
        );
    }

    #[test]
    fn test_list_layers_params() {
        let request = list_layers(
            &ListLayersParams {
                portal_url: "https://portal.example.com/".into(),
                token: "abc".into(),
            },
            &QueryOptions::default(),
        );
        assert_eq!(request.url, "https://portal.example.com/sharing/rest/search");
        assert_eq!(request.get("q"), Some(LAYER_SEARCH_QUERY));
        assert_eq!(request.get("num"), Some("100"));
        assert_eq!(request.get("f"), Some("json"));
        assert_eq!(request.get("token"), Some("abc"));
    }

    #[test]
    fn test_query_features_without_geometry() {
        let request = query_features(
            &QueryFeaturesParams {
                layer_url: LAYER.into(),
                token: "abc".into(),
                geometry: None,
            },
            &QueryOptions::default(),
        );
        assert_eq!(request.url, format!("{}/query", LAYER));
        assert_eq!(request.get("where"), Some("1=1"));
        assert_eq!(request.get("outFields"), Some("*"));
        assert_eq!(request.get("resultRecordCount"), Some("10"));
        assert_eq!(request.get("returnGeometry"), Some("false"));
        assert_eq!(request.get("geometry"), None);
        assert_eq!(request.get("spatialRel"), None);
    }

    #[test]
    fn test_query_features_with_geometry_object() {
        let geometry = json!({"rings": [[[0, 0], [1, 0], [1, 1], [0, 0]]], "spatialReference": {"wkid": 4326}});
        let request = query_features(
            &QueryFeaturesParams {
                layer_url: LAYER.into(),
                token: "abc".into(),
                geometry: Some(GeometryFilter::Object(geometry.as_object().unwrap().clone())),
            },
            &QueryOptions::default(),
        );
        let sent: Value = serde_json::from_str(request.get("geometry").unwrap()).unwrap();
        assert_eq!(sent, geometry);
        assert_eq!(request.get("geometryType"), Some("esriGeometryPolygon"));
        assert_eq!(request.get("spatialRel"), Some(SPATIAL_REL_INTERSECTS));
    }

    #[test]
    fn test_query_features_with_raw_geometry() {
        let request = query_features(
            &QueryFeaturesParams {
                layer_url: LAYER.into(),
                token: "abc".into(),
                geometry: Some(GeometryFilter::Raw("-1,-1,1,1".into())),
            },
            &QueryOptions::default(),
        );
        assert_eq!(request.get("geometry"), Some("-1,-1,1,1"));
        assert_eq!(request.get("geometryType"), None);
    }

    #[test]
    fn test_geometry_type_inference() {
        let kind = |v: Value| geometry_type(v.as_object().unwrap());
        assert_eq!(kind(json!({"x": 1, "y": 2})), Some("esriGeometryPoint"));
        assert_eq!(kind(json!({"points": []})), Some("esriGeometryMultipoint"));
        assert_eq!(kind(json!({"paths": []})), Some("esriGeometryPolyline"));
        assert_eq!(
            kind(json!({"xmin": 0, "ymin": 0, "xmax": 1, "ymax": 1})),
            Some("esriGeometryEnvelope")
        );
        assert_eq!(kind(json!({"foo": 1})), None);
    }

    #[test]
    fn test_statistics_params() {
        let request = statistics(&StatisticsParams {
            layer_url: LAYER.into(),
            token: "abc".into(),
            statistics: vec![
                StatisticSpec::new("population", StatisticType::Sum),
                StatisticSpec::new("area", StatisticType::Avg),
            ],
        });
        assert_eq!(request.get("where"), Some("1=1"));
        assert_eq!(request.get("returnGeometry"), Some("false"));
        let stats: Value = serde_json::from_str(request.get("outStatistics").unwrap()).unwrap();
        assert_eq!(
            stats,
            json!([
                {"statisticType": "sum", "onStatisticField": "population"},
                {"statisticType": "avg", "onStatisticField": "area"}
            ])
        );
    }

    #[test]
    fn test_export_map_params() {
        let mut params = ExportMapParams {
            map_service_url: "https://s.example.com/MapServer/".into(),
            token: "abc".into(),
            bbox: None,
        };
        let request = export_map(&params);
        assert_eq!(request.url, "https://s.example.com/MapServer/export");
        assert_eq!(request.get("size"), Some("1024,768"));
        assert_eq!(request.get("format"), Some("png32"));
        assert_eq!(request.get("bbox"), None);

        params.bbox = Some("-10,-5,10,5".into());
        assert_eq!(export_map(&params).get("bbox"), Some("-10,-5,10,5"));
    }

    #[test]
    fn test_tradeoffs_reuse_feature_query() {
        let request = tradeoffs(
            &TradeoffParams {
                layer_url: LAYER.into(),
                token: "abc".into(),
                strong_field: "literacy".into(),
                weak_field: "poverty".into(),
                strong_threshold: 80.0,
                weak_threshold: 20.0,
            },
            &QueryOptions::default(),
        );
        assert_eq!(request.intent, Intent::GetTradeoffs);
        assert_eq!(request.get("where"), Some("1=1"));
        assert_eq!(request.get("outFields"), Some("*"));
        assert_eq!(request.get("returnGeometry"), Some("false"));
    }

    #[test]
    fn test_nearest_facility_params() {
        let request = nearest_facility(
            &NearestFacilityParams {
                feature_service_url: LAYER.into(),
                token: "abc".into(),
                x: 36.8,
                y: -1.3,
            },
            &QueryOptions::default(),
        );
        assert_eq!(request.get("geometryType"), Some("esriGeometryEnvelope"));
        assert_eq!(request.get("spatialRel"), Some(SPATIAL_REL_INTERSECTS));
        assert_eq!(request.get("returnGeometry"), Some("true"));
        assert_eq!(request.get("inSR"), Some("4326"));
        assert_eq!(request.get("outSR"), Some("4326"));
        // returnGeometry is overridden in place, not duplicated
        assert_eq!(
            request.params.iter().filter(|(k, _)| k == "returnGeometry").count(),
            1
        );

        let envelope: Value = serde_json::from_str(request.get("geometry").unwrap()).unwrap();
        assert!((envelope["xmin"].as_f64().unwrap() - 36.79).abs() < 1e-9);
        assert!((envelope["ymax"].as_f64().unwrap() + 1.29).abs() < 1e-9);
        assert_eq!(envelope["spatialReference"]["wkid"], 4326);
    }

    #[test]
    fn test_redacted_url_hides_token() {
        let request = list_layers(
            &ListLayersParams {
                portal_url: "https://portal.example.com".into(),
                token: "secret-token".into(),
            },
            &QueryOptions::default(),
        );
        let url = request.redacted_url();
        assert!(!url.contains("secret-token"));
        assert!(url.contains("token=***") || url.contains("token=%2A%2A%2A"));
        assert!(url.starts_with("https://portal.example.com/sharing/rest/search?"));
    }
}
