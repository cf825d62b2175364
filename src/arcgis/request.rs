//! Inbound tool request bodies and their validation.
//!
//! Bodies arrive as loosely-typed JSON from the calling agent. Every field is
//! optional at the serde level; `validate` turns a body into the parameters
//! the query builder needs or reports the first missing field.

use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::Value;
use url::Url;
use utoipa::ToSchema;

use super::model::{numeric, StatisticSpec, DISTRICT_NAME_KEY};
use super::stats::parse_stat_fields;
use crate::error::ConnectorError;

/// Decode a JSON body into one of the request types below.
pub fn parse_body<T: DeserializeOwned>(body: Value) -> Result<T, ConnectorError> {
    serde_json::from_value(body)
        .map_err(|e| ConnectorError::InvalidInput(format!("invalid request body: {}", e)))
}

/// List layers published on a portal.
#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
pub struct ListLayersRequest {
    /// Portal root, e.g. `https://www.arcgis.com`
    pub portal_url: Option<String>,
    /// Portal token, forwarded verbatim
    pub token: Option<String>,
}

/// Fetch up to the result cap of features from a layer.
#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
pub struct QueryFeaturesRequest {
    /// Feature layer URL, e.g. `.../FeatureServer/0`
    pub layer_url: Option<String>,
    pub token: Option<String>,
    /// Optional spatial filter: a geometry object or a string forwarded verbatim
    pub geometry: Option<Value>,
}

/// Server-side statistics over a layer.
#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
pub struct GetStatisticsRequest {
    pub layer_url: Option<String>,
    pub token: Option<String>,
    /// Shorthand such as `population:sum,area:avg`; the stat defaults to `sum`
    #[serde(rename = "statFields", alias = "stat_fields")]
    pub stat_fields: Option<String>,
}

/// Render a map image.
#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
pub struct ExportMapRequest {
    /// Map service URL, e.g. `.../MapServer`
    pub map_service_url: Option<String>,
    pub token: Option<String>,
    /// `xmin,ymin,xmax,ymax` string, or an array of four numbers
    pub bbox: Option<Value>,
}

/// Districts strong on one indicator and weak on another.
#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
pub struct GetTradeoffsRequest {
    pub layer_url: Option<String>,
    pub token: Option<String>,
    /// Field that must be at or above `strong_threshold`
    pub strong_field: Option<String>,
    /// Field that must be at or below `weak_threshold`
    pub weak_field: Option<String>,
    pub strong_threshold: Option<Value>,
    pub weak_threshold: Option<Value>,
}

/// Closest facility to a WGS 84 point.
#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
pub struct GetNearestFacilityRequest {
    pub feature_service_url: Option<String>,
    pub token: Option<String>,
    /// Longitude
    pub x: Option<Value>,
    /// Latitude
    pub y: Option<Value>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ListLayersParams {
    pub portal_url: String,
    pub token: String,
}

/// Spatial filter supplied with a feature query.
#[derive(Debug, Clone, PartialEq)]
pub enum GeometryFilter {
    Object(serde_json::Map<String, Value>),
    Raw(String),
}

#[derive(Debug, Clone, PartialEq)]
pub struct QueryFeaturesParams {
    pub layer_url: String,
    pub token: String,
    pub geometry: Option<GeometryFilter>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct StatisticsParams {
    pub layer_url: String,
    pub token: String,
    pub statistics: Vec<StatisticSpec>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ExportMapParams {
    pub map_service_url: String,
    pub token: String,
    pub bbox: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TradeoffParams {
    pub layer_url: String,
    pub token: String,
    pub strong_field: String,
    pub weak_field: String,
    pub strong_threshold: f64,
    pub weak_threshold: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NearestFacilityParams {
    pub feature_service_url: String,
    pub token: String,
    pub x: f64,
    pub y: f64,
}

impl ListLayersRequest {
    pub fn validate(self) -> Result<ListLayersParams, ConnectorError> {
        Ok(ListLayersParams {
            portal_url: require_url(self.portal_url, "portal_url")?,
            token: require_text(self.token, "token")?,
        })
    }
}

impl QueryFeaturesRequest {
    pub fn validate(self) -> Result<QueryFeaturesParams, ConnectorError> {
        let layer_url = require_url(self.layer_url, "layer_url")?;
        let token = require_text(self.token, "token")?;
        let geometry = match self.geometry {
            None | Some(Value::Null) => None,
            Some(Value::Object(obj)) => Some(GeometryFilter::Object(obj)),
            Some(Value::String(s)) if !s.trim().is_empty() => Some(GeometryFilter::Raw(s)),
            Some(Value::String(_)) => None,
            Some(_) => {
                return Err(ConnectorError::InvalidInput(
                    "geometry must be an object or a string".to_string(),
                ))
            }
        };
        Ok(QueryFeaturesParams {
            layer_url,
            token,
            geometry,
        })
    }
}

impl GetStatisticsRequest {
    pub fn validate(self) -> Result<StatisticsParams, ConnectorError> {
        let layer_url = require_url(self.layer_url, "layer_url")?;
        let token = require_text(self.token, "token")?;
        let stat_fields = require_text(self.stat_fields, "statFields")?;
        Ok(StatisticsParams {
            layer_url,
            token,
            statistics: parse_stat_fields(&stat_fields)?,
        })
    }
}

impl ExportMapRequest {
    pub fn validate(self) -> Result<ExportMapParams, ConnectorError> {
        let map_service_url = require_url(self.map_service_url, "map_service_url")?;
        let token = require_text(self.token, "token")?;
        let bbox = match self.bbox {
            None | Some(Value::Null) => None,
            Some(Value::String(s)) if s.trim().is_empty() => None,
            Some(Value::String(s)) => Some(s),
            Some(Value::Array(items)) => Some(bbox_from_array(&items)?),
            Some(_) => {
                return Err(ConnectorError::InvalidInput(
                    "bbox must be a string or an array of four numbers".to_string(),
                ))
            }
        };
        Ok(ExportMapParams {
            map_service_url,
            token,
            bbox,
        })
    }
}

fn bbox_from_array(items: &[Value]) -> Result<String, ConnectorError> {
    let numbers: Option<Vec<f64>> = items.iter().map(numeric).collect();
    match numbers {
        Some(n) if n.len() == 4 => Ok(n
            .iter()
            .map(|v| v.to_string())
            .collect::<Vec<_>>()
            .join(",")),
        _ => Err(ConnectorError::InvalidInput(
            "bbox must be a string or an array of four numbers".to_string(),
        )),
    }
}

impl GetTradeoffsRequest {
    pub fn validate(self) -> Result<TradeoffParams, ConnectorError> {
        let layer_url = require_url(self.layer_url, "layer_url")?;
        let token = require_text(self.token, "token")?;

        let (strong_field, weak_field) = match (non_blank(self.strong_field), non_blank(self.weak_field)) {
            (Some(strong), Some(weak)) => (strong, weak),
            _ => return Err(ConnectorError::required("strong_field and weak_field")),
        };
        if strong_field == DISTRICT_NAME_KEY || weak_field == DISTRICT_NAME_KEY {
            return Err(ConnectorError::InvalidInput(format!(
                "strong_field and weak_field must not be '{}'",
                DISTRICT_NAME_KEY
            )));
        }

        let strong_threshold = self.strong_threshold.as_ref().filter(|v| !v.is_null());
        let weak_threshold = self.weak_threshold.as_ref().filter(|v| !v.is_null());
        let (strong_threshold, weak_threshold) = match (strong_threshold, weak_threshold) {
            (Some(strong), Some(weak)) => (
                require_number(strong, "strong_threshold")?,
                require_number(weak, "weak_threshold")?,
            ),
            _ => return Err(ConnectorError::required("strong_threshold and weak_threshold")),
        };

        Ok(TradeoffParams {
            layer_url,
            token,
            strong_field,
            weak_field,
            strong_threshold,
            weak_threshold,
        })
    }
}

impl GetNearestFacilityRequest {
    pub fn validate(self) -> Result<NearestFacilityParams, ConnectorError> {
        let feature_service_url = require_url(self.feature_service_url, "feature_service_url")?;
        let token = require_text(self.token, "token")?;
        let (x, y) = match (
            self.x.as_ref().filter(|v| !v.is_null()),
            self.y.as_ref().filter(|v| !v.is_null()),
        ) {
            (Some(x), Some(y)) => (require_number(x, "x")?, require_number(y, "y")?),
            _ => return Err(ConnectorError::required("x and y coordinates")),
        };
        Ok(NearestFacilityParams {
            feature_service_url,
            token,
            x,
            y,
        })
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value.filter(|s| !s.trim().is_empty())
}

fn require_text(value: Option<String>, field: &str) -> Result<String, ConnectorError> {
    non_blank(value).ok_or_else(|| ConnectorError::required(field))
}

fn require_url(value: Option<String>, field: &str) -> Result<String, ConnectorError> {
    let raw = require_text(value, field)?;
    let trimmed = raw.trim();
    match Url::parse(trimmed) {
        Ok(url) if matches!(url.scheme(), "http" | "https") => Ok(trimmed.to_string()),
        _ => Err(ConnectorError::InvalidInput(format!(
            "{} must be an absolute http(s) URL",
            field
        ))),
    }
}

fn require_number(value: &Value, field: &str) -> Result<f64, ConnectorError> {
    numeric(value)
        .ok_or_else(|| ConnectorError::InvalidInput(format!("{} must be a number", field)))
}
