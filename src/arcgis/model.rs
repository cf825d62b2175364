//! Request-scoped data types exchanged with the remote geodata service.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};
use utoipa::ToSchema;

/// WGS 84 geographic coordinates.
pub const WGS84_WKID: u32 = 4326;

/// A queryable layer found while listing a portal.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct LayerDescriptor {
    pub id: String,
    pub title: String,
    /// Service endpoint; `None` when the item exposes nothing queryable.
    pub url: Option<String>,
}

/// Response of the layer listing action.
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct LayerList {
    pub items: Vec<LayerDescriptor>,
}

/// One record of a layer.
///
/// Attribute keys are defined by the service, so they stay a plain map.
/// Geometry is carried through untouched.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Feature {
    #[serde(default, deserialize_with = "null_as_empty")]
    pub attributes: Map<String, Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub geometry: Option<Value>,
}

impl Feature {
    /// Point coordinates, when the geometry is a point with numeric `x`/`y`.
    pub fn point(&self) -> Option<(f64, f64)> {
        let geometry = self.geometry.as_ref()?.as_object()?;
        let x = geometry.get("x")?.as_f64()?;
        let y = geometry.get("y")?.as_f64()?;
        (x.is_finite() && y.is_finite()).then_some((x, y))
    }
}

fn null_as_empty<'de, D>(deserializer: D) -> Result<Map<String, Value>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<Map<String, Value>>::deserialize(deserializer)?.unwrap_or_default())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpatialReference {
    pub wkid: u32,
}

impl SpatialReference {
    pub const WGS84: SpatialReference = SpatialReference { wkid: WGS84_WKID };
}

/// Axis-aligned rectangle used as a spatial filter.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Envelope {
    pub xmin: f64,
    pub ymin: f64,
    pub xmax: f64,
    pub ymax: f64,
    pub spatial_reference: SpatialReference,
}

impl Envelope {
    /// Square envelope of the given half-width centred on `(x, y)`.
    pub fn around(x: f64, y: f64, half_width: f64, spatial_reference: SpatialReference) -> Self {
        Self {
            xmin: x - half_width,
            ymin: y - half_width,
            xmax: x + half_width,
            ymax: y + half_width,
            spatial_reference,
        }
    }


    /// JSON form accepted by the remote `geometry` parameter.
    pub fn to_json(&self) -> String {
        serde_json::json!({
            "xmin": self.xmin,
            "ymin": self.ymin,
            "xmax": self.xmax,
            "ymax": self.ymax,
            "spatialReference": { "wkid": self.spatial_reference.wkid },
        })
        .to_string()
    }
}

/// Server-side aggregation functions.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum StatisticType {
    #[default]
    Sum,
    Avg,
    Min,
    Max,
    Count,
    Stddev,
    Var,
}

impl StatisticType {
    pub const ALL: [StatisticType; 7] = [
        StatisticType::Sum,
        StatisticType::Avg,
        StatisticType::Min,
        StatisticType::Max,
        StatisticType::Count,
        StatisticType::Stddev,
        StatisticType::Var,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            StatisticType::Sum => "sum",
            StatisticType::Avg => "avg",
            StatisticType::Min => "min",
            StatisticType::Max => "max",
            StatisticType::Count => "count",
            StatisticType::Stddev => "stddev",
            StatisticType::Var => "var",
        }
    }
}

impl std::fmt::Display for StatisticType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One field + aggregation pair.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatisticSpec {
    pub field: String,
    pub statistic_type: StatisticType,
}

impl StatisticSpec {
    pub fn new(field: impl Into<String>, statistic_type: StatisticType) -> Self {
        Self {
            field: field.into(),
            statistic_type,
        }
    }
}

/// Statistics as returned to the caller.
///
/// The remote service answers statistics queries in more than one shape, so
/// consumers must not assume a fixed schema for the `statistics` member.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum StatisticsPayload {
    /// Array of records (`statistics` or `features` of the remote payload).
    Records(Vec<Value>),
    /// Remote payload echoed back as-is.
    Passthrough(Value),
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StatisticsResponse {
    pub statistics: StatisticsPayload,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MapExport {
    /// Image URL, or the remote payload when it carries none.
    pub image: Value,
}

/// One feature that passed both threshold predicates.
///
/// Keys are `district_name` plus the caller-chosen strong and weak field
/// names, so consumers look values up by the names they supplied.
/// Key of the district name in a tradeoff entry.
pub const DISTRICT_NAME_KEY: &str = "district_name";

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(transparent)]
pub struct ThresholdResult(Map<String, Value>);

impl ThresholdResult {
    pub fn new(
        district_name: String,
        strong: (&str, Value),
        weak: (&str, Value),
    ) -> Self {
        let mut entry = Map::new();
        entry.insert(DISTRICT_NAME_KEY.to_string(), Value::String(district_name));
        entry.insert(strong.0.to_string(), strong.1);
        entry.insert(weak.0.to_string(), weak.1);
        Self(entry)
    }

    pub fn district_name(&self) -> Option<&str> {
        self.0.get(DISTRICT_NAME_KEY).and_then(Value::as_str)
    }

    pub fn get(&self, field: &str) -> Option<&Value> {
        self.0.get(field)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TradeoffReport {
    pub count: usize,
    pub districts: Vec<ThresholdResult>,
}

impl TradeoffReport {
    pub fn new(districts: Vec<ThresholdResult>) -> Self {
        Self {
            count: districts.len(),
            districts,
        }
    }
}

/// The candidate closest to the query point.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NearestFacility {
    pub attributes: Map<String, Value>,
    pub geometry: Value,
}

/// Lenient numeric reading of a JSON scalar.
///
/// Numbers are taken as-is and numeric strings are parsed. Everything else,
/// including null and booleans, has no numeric value.
pub fn numeric(value: &Value) -> Option<f64> {
    let number = match value {
        Value::Number(n) => n.as_f64()?,
        Value::String(s) => s.trim().parse::<f64>().ok()?,
        _ => return None,
    };
    number.is_finite().then_some(number)
}
