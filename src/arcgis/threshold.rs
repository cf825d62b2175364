//! Strong-versus-weak indicator comparison over a feature set.

use serde_json::{Map, Value};

use super::model::{numeric, Feature, ThresholdResult, TradeoffReport};
use super::request::TradeoffParams;

/// Name used when a feature carries no district name.
pub const UNKNOWN_DISTRICT: &str = "Unknown";

/// Inclusion predicate: strong field at or above its threshold and weak
/// field at or below its threshold.
#[derive(Debug, Clone, PartialEq)]
pub struct TradeoffCriteria {
    pub strong_field: String,
    pub weak_field: String,
    pub strong_threshold: f64,
    pub weak_threshold: f64,
}

impl From<&TradeoffParams> for TradeoffCriteria {
    fn from(params: &TradeoffParams) -> Self {
        Self {
            strong_field: params.strong_field.clone(),
            weak_field: params.weak_field.clone(),
            strong_threshold: params.strong_threshold,
            weak_threshold: params.weak_threshold,
        }
    }
}

impl TradeoffCriteria {
    /// A missing or non-numeric value on either field never qualifies,
    /// whatever the threshold.
    pub fn admits(&self, attributes: &Map<String, Value>) -> bool {
        let strong = attributes.get(&self.strong_field).and_then(numeric);
        let weak = attributes.get(&self.weak_field).and_then(numeric);
        match (strong, weak) {
            (Some(strong), Some(weak)) => {
                strong >= self.strong_threshold && weak <= self.weak_threshold
            }
            _ => false,
        }
    }
}

/// Keep the qualifying features, in input order.
pub fn compare(features: &[Feature], criteria: &TradeoffCriteria, name_field: &str) -> TradeoffReport {
    let districts = features
        .iter()
        .filter(|feature| criteria.admits(&feature.attributes))
        .map(|feature| {
            let attrs = &feature.attributes;
            let field_value = |field: &str| attrs.get(field).cloned().unwrap_or(Value::Null);
            ThresholdResult::new(
                district_name(attrs, name_field),
                (criteria.strong_field.as_str(), field_value(&criteria.strong_field)),
                (criteria.weak_field.as_str(), field_value(&criteria.weak_field)),
            )
        })
        .collect();
    TradeoffReport::new(districts)
}

fn district_name(attributes: &Map<String, Value>, name_field: &str) -> String {
    match attributes.get(name_field) {
        Some(Value::String(s)) if !s.is_empty() => s.clone(),
        Some(Value::Number(n)) => n.to_string(),
        _ => UNKNOWN_DISTRICT.to_string(),
    }
}
