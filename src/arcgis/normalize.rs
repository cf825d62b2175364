//! Reshaping of remote payloads into the per-action response contract.

use serde_json::Value;

use super::model::{
    Feature, LayerDescriptor, LayerList, MapExport, StatisticsPayload, StatisticsResponse,
};
use crate::error::ConnectorError;

/// Fail when the remote payload carries a non-null `error` member.
///
/// The remote service reports most failures (bad token, bad field name) with
/// an HTTP 200 and an `error` object in the body.
pub fn check_remote_error(payload: &Value) -> Result<(), ConnectorError> {
    match payload.get("error") {
        Some(error) if !error.is_null() => Err(ConnectorError::Remote(error.clone())),
        _ => Ok(()),
    }
}

pub fn layer_list(payload: &Value) -> Result<LayerList, ConnectorError> {
    check_remote_error(payload)?;
    let items = payload
        .get("results")
        .and_then(Value::as_array)
        .map(|results| results.iter().map(layer_descriptor).collect())
        .unwrap_or_default();
    Ok(LayerList { items })
}

fn layer_descriptor(item: &Value) -> LayerDescriptor {
    let text = |key: &str| {
        item.get(key)
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string()
    };
    LayerDescriptor {
        id: text("id"),
        title: text("title"),
        url: item
            .get("url")
            .and_then(Value::as_str)
            .filter(|url| !url.is_empty())
            .map(str::to_string),
    }
}

/// Feature query results go back to the caller as the remote sent them.
pub fn feature_query(payload: Value) -> Result<Value, ConnectorError> {
    check_remote_error(&payload)?;
    Ok(payload)
}

pub fn statistics(payload: Value) -> Result<StatisticsResponse, ConnectorError> {
    check_remote_error(&payload)?;
    let records = ["statistics", "features"]
        .iter()
        .find_map(|key| payload.get(*key).and_then(Value::as_array).cloned());
    let statistics = match records {
        Some(records) => StatisticsPayload::Records(records),
        None => StatisticsPayload::Passthrough(payload),
    };
    Ok(StatisticsResponse { statistics })
}

pub fn map_export(payload: Value) -> Result<MapExport, ConnectorError> {
    check_remote_error(&payload)?;
    let link = ["href", "url"].iter().find_map(|key| {
        payload
            .get(*key)
            .and_then(Value::as_str)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
    });
    let image = match link {
        Some(link) => Value::String(link),
        None => payload,
    };
    Ok(MapExport { image })
}

/// The `features` collection of a query payload, or `None` when absent.
pub fn features(payload: &Value) -> Result<Option<Vec<Feature>>, ConnectorError> {
    check_remote_error(payload)?;
    match payload.get("features") {
        None | Some(Value::Null) => Ok(None),
        Some(features) => serde_json::from_value(features.clone())
            .map(Some)
            .map_err(|e| ConnectorError::Decode(format!("unexpected features shape: {}", e))),
    }
}
