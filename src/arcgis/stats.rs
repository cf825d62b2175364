//! Parsing of the `field:stat,field:stat` statistics shorthand.

use std::str::FromStr;

use serde_json::{json, Value};

use super::model::{StatisticSpec, StatisticType};
use crate::error::ConnectorError;

impl FromStr for StatisticType {
    type Err = ConnectorError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_ascii_lowercase();
        StatisticType::ALL
            .into_iter()
            .find(|t| t.as_str() == wanted)
            .ok_or_else(|| {
                let expected: Vec<_> = StatisticType::ALL.iter().map(|t| t.as_str()).collect();
                ConnectorError::InvalidInput(format!(
                    "unsupported statistic '{}' (expected one of {})",
                    s.trim(),
                    expected.join(", ")
                ))
            })
    }
}

/// Parse a shorthand string into aggregation requests, keeping entry order.
///
/// Each comma-separated entry is `field` or `field:stat`. A missing or empty
/// stat means `sum`; anything after a second colon is ignored.
pub fn parse_stat_fields(input: &str) -> Result<Vec<StatisticSpec>, ConnectorError> {
    if input.trim().is_empty() {
        return Err(ConnectorError::required("statFields"));
    }
    input.split(',').map(parse_entry).collect()
}

fn parse_entry(entry: &str) -> Result<StatisticSpec, ConnectorError> {
    let mut parts = entry.split(':');
    let field = parts.next().unwrap_or_default().trim();
    if field.is_empty() {
        return Err(ConnectorError::InvalidInput(format!(
            "statFields entry '{}' has no field name",
            entry.trim()
        )));
    }

    let statistic_type = match parts.next().map(str::trim) {
        None | Some("") => StatisticType::Sum,
        Some(stat) => stat.parse().map_err(|e: ConnectorError| {
            ConnectorError::InvalidInput(format!("{} for field '{}'", e, field))
        })?,
    };

    Ok(StatisticSpec::new(field, statistic_type))
}

/// Inverse of [`parse_stat_fields`] for already-parsed specs.
pub fn to_shorthand(specs: &[StatisticSpec]) -> String {
    specs
        .iter()
        .map(|s| format!("{}:{}", s.field, s.statistic_type))
        .collect::<Vec<_>>()
        .join(",")
}

/// Wire form of the `outStatistics` query parameter.
pub fn out_statistics(specs: &[StatisticSpec]) -> Value {
    Value::Array(
        specs
            .iter()
            .map(|s| {
                json!({
                    "statisticType": s.statistic_type.as_str(),
                    "onStatisticField": s.field,
                })
            })
            .collect(),
    )
}
