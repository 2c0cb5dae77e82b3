//! Grouped aggregation.
//!
//! Rows are grouped by the native (uncoerced) values of the `by` columns.
//! Metric columns are coerced to numeric and every requested function runs
//! over the present values of each group. Output fields are the grouping
//! keys followed by `<column>_<function>` entries in request order.

use std::cmp::Ordering;
use std::collections::HashMap;
use std::hash::{Hash, Hasher};

use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

use crate::error::{AnalystError, Result};
use crate::models::{Dataset, Scalar, float_to_json};

use super::config::{GroupByConfig, GroupOrder, MissingKeyPolicy};
use super::stats;

/// Aggregation function applied to a metric column within a group.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AggFunc {
    /// Arithmetic mean
    Mean,
    /// Sum of present values
    Sum,
    /// Smallest value
    Min,
    /// Largest value
    Max,
    /// Present (non-missing) values
    Count,
    /// Sample standard deviation
    Std,
    /// Sample variance
    Var,
    /// Median with linear interpolation
    Median,
    /// First present value
    First,
    /// Last present value
    Last,
    /// Distinct present values
    Nunique,
}

impl AggFunc {
    /// Accepted function names.
    pub const NAMES: [&'static str; 11] = [
        "mean", "sum", "min", "max", "count", "std", "var", "median", "first", "last", "nunique",
    ];

    /// Returns the function name used in output field names.
    pub fn as_str(&self) -> &'static str {
        match self {
            AggFunc::Mean => "mean",
            AggFunc::Sum => "sum",
            AggFunc::Min => "min",
            AggFunc::Max => "max",
            AggFunc::Count => "count",
            AggFunc::Std => "std",
            AggFunc::Var => "var",
            AggFunc::Median => "median",
            AggFunc::First => "first",
            AggFunc::Last => "last",
            AggFunc::Nunique => "nunique",
        }
    }

    /// Applies the function to the present values of one group.
    pub fn apply(&self, values: &[f64]) -> JsonValue {
        let result = match self {
            AggFunc::Count => return JsonValue::from(values.len()),
            AggFunc::Nunique => {
                let mut distinct = stats::sorted(values);
                distinct.dedup();
                return JsonValue::from(distinct.len());
            }
            AggFunc::Sum => Some(values.iter().sum::<f64>()),
            AggFunc::Mean => stats::mean(values),
            AggFunc::Min => values.iter().copied().min_by(f64::total_cmp),
            AggFunc::Max => values.iter().copied().max_by(f64::total_cmp),
            AggFunc::Std => stats::sample_std(values),
            AggFunc::Var => stats::variance(values, 1),
            AggFunc::Median => stats::median(values),
            AggFunc::First => values.first().copied(),
            AggFunc::Last => values.last().copied(),
        };
        result.map_or(JsonValue::Null, float_to_json)
    }
}

impl std::str::FromStr for AggFunc {
    type Err = AnalystError;

    fn from_str(s: &str) -> Result<Self> {
        Ok(match s {
            "mean" => Self::Mean,
            "sum" => Self::Sum,
            "min" => Self::Min,
            "max" => Self::Max,
            "count" => Self::Count,
            "std" => Self::Std,
            "var" => Self::Var,
            "median" => Self::Median,
            "first" => Self::First,
            "last" => Self::Last,
            "nunique" => Self::Nunique,
            other => return Err(AnalystError::invalid_method(other, &Self::NAMES)),
        })
    }
}

impl std::fmt::Display for AggFunc {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Functions requested for one metric column.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MetricSpec {
    /// Metric column name
    pub column: String,
    /// Function names as given by the caller
    pub functions: Vec<String>,
}

impl MetricSpec {
    /// Creates a metric spec.
    pub fn new<I, S>(column: impl Into<String>, functions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            column: column.into(),
            functions: functions.into_iter().map(Into::into).collect(),
        }
    }
}

/// Parameters of a group-by call.
///
/// `metrics` is a JSON object mapping column names to function lists; its
/// key order is the output order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupByRequest {
    /// Key columns, in grouping order
    pub by: Vec<String>,
    /// Metric columns and their functions
    #[serde(with = "metric_map")]
    pub metrics: Vec<MetricSpec>,
}

impl GroupByRequest {
    /// Creates a request grouping by `by` with no metrics.
    pub fn new<I, S>(by: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            by: by.into_iter().map(Into::into).collect(),
            metrics: Vec::new(),
        }
    }

    /// Builder method to add a metric column.
    pub fn with_metric<I, S>(mut self, column: impl Into<String>, functions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.metrics.push(MetricSpec::new(column, functions));
        self
    }
}

mod metric_map {
    use std::fmt;

    use serde::de::{MapAccess, Visitor};
    use serde::ser::SerializeMap;
    use serde::{Deserializer, Serializer};

    use super::MetricSpec;

    pub(super) fn serialize<S: Serializer>(
        metrics: &[MetricSpec],
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(metrics.len()))?;
        for spec in metrics {
            map.serialize_entry(&spec.column, &spec.functions)?;
        }
        map.end()
    }

    pub(super) fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<Vec<MetricSpec>, D::Error> {
        struct MetricVisitor;

        impl<'de> Visitor<'de> for MetricVisitor {
            type Value = Vec<MetricSpec>;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a map from column name to a list of function names")
            }

            fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<Self::Value, A::Error> {
                let mut metrics = Vec::new();
                while let Some((column, functions)) = access.next_entry::<String, Vec<String>>()? {
                    metrics.push(MetricSpec { column, functions });
                }
                Ok(metrics)
            }
        }

        deserializer.deserialize_map(MetricVisitor)
    }
}

/// One component of a group key.
///
/// Integral floats normalize to `Integer` so `2` and `2.0` share a group.
#[derive(Debug, Clone)]
enum KeyPart {
    Boolean(bool),
    Integer(i64),
    Float(f64),
    Text(String),
    Missing,
}

impl KeyPart {
    fn from_scalar(value: Option<Scalar>) -> Self {
        match value {
            None => KeyPart::Missing,
            Some(Scalar::Boolean(b)) => KeyPart::Boolean(b),
            Some(Scalar::Integer(i)) => KeyPart::Integer(i),
            Some(Scalar::Float(f)) => {
                if f.fract() == 0.0 && f >= i64::MIN as f64 && f < i64::MAX as f64 {
                    KeyPart::Integer(f as i64)
                } else {
                    KeyPart::Float(f)
                }
            }
            Some(Scalar::Text(s)) => KeyPart::Text(s),
        }
    }

    fn rank(&self) -> u8 {
        match self {
            KeyPart::Boolean(_) => 0,
            KeyPart::Integer(_) | KeyPart::Float(_) => 1,
            KeyPart::Text(_) => 2,
            KeyPart::Missing => 3,
        }
    }

    fn is_missing(&self) -> bool {
        matches!(self, KeyPart::Missing)
    }
}

impl PartialEq for KeyPart {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for KeyPart {}

impl PartialOrd for KeyPart {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for KeyPart {
    fn cmp(&self, other: &Self) -> Ordering {
        match (self, other) {
            (KeyPart::Boolean(a), KeyPart::Boolean(b)) => a.cmp(b),
            (KeyPart::Integer(a), KeyPart::Integer(b)) => a.cmp(b),
            (KeyPart::Float(a), KeyPart::Float(b)) => a.total_cmp(b),
            (KeyPart::Integer(a), KeyPart::Float(b)) => (*a as f64).total_cmp(b),
            (KeyPart::Float(a), KeyPart::Integer(b)) => a.total_cmp(&(*b as f64)),
            (KeyPart::Text(a), KeyPart::Text(b)) => a.cmp(b),
            (KeyPart::Missing, KeyPart::Missing) => Ordering::Equal,
            _ => self.rank().cmp(&other.rank()),
        }
    }
}

impl Hash for KeyPart {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.rank().hash(state);
        match self {
            KeyPart::Boolean(b) => b.hash(state),
            // Integers and floats compare through f64, so they hash the same way
            KeyPart::Integer(i) => (*i as f64).to_bits().hash(state),
            KeyPart::Float(f) => f.to_bits().hash(state),
            KeyPart::Text(s) => s.hash(state),
            KeyPart::Missing => {}
        }
    }
}

struct Group {
    key: Vec<KeyPart>,
    /// Key values as they appear in the first row of the group
    key_json: Vec<JsonValue>,
    rows: Vec<usize>,
}

/// Groups the dataset and aggregates the requested metrics.
///
/// # Errors
/// - `InvalidArgument` for an empty `by` list, no metrics, or a metric
///   without functions
/// - `ColumnNotFound` for an unknown `by` or metric column
/// - `InvalidMethod` for an unknown function name
pub fn groupby(
    dataset: &Dataset,
    request: &GroupByRequest,
    config: &GroupByConfig,
) -> Result<super::models::GroupByReport> {
    if request.by.is_empty() {
        return Err(AnalystError::invalid_argument("'by' must name at least one column"));
    }
    if request.metrics.is_empty() {
        return Err(AnalystError::invalid_argument("'metrics' must name at least one column"));
    }

    let keys = request
        .by
        .iter()
        .map(|name| dataset.require_column(name))
        .collect::<Result<Vec<_>>>()?;

    let mut metrics = Vec::with_capacity(request.metrics.len());
    for spec in &request.metrics {
        let column = dataset.require_column(&spec.column)?;
        if spec.functions.is_empty() {
            return Err(AnalystError::invalid_argument(format!(
                "no aggregation functions given for '{}'",
                spec.column
            )));
        }
        let functions = spec
            .functions
            .iter()
            .map(|f| f.parse::<AggFunc>())
            .collect::<Result<Vec<_>>>()?;
        metrics.push((spec.column.as_str(), column.to_numeric(), functions));
    }

    let mut groups: Vec<Group> = Vec::new();
    let mut index: HashMap<Vec<KeyPart>, usize> = HashMap::new();
    let mut dropped = 0usize;

    for row in 0..dataset.row_count() {
        let key: Vec<KeyPart> = keys
            .iter()
            .map(|c| KeyPart::from_scalar(c.data.get(row)))
            .collect();

        if config.missing_keys == MissingKeyPolicy::Drop && key.iter().any(KeyPart::is_missing) {
            dropped = dropped.saturating_add(1);
            continue;
        }

        match index.get(&key) {
            Some(&position) => groups[position].rows.push(row),
            None => {
                index.insert(key.clone(), groups.len());
                groups.push(Group {
                    key,
                    key_json: keys.iter().map(|c| c.json_at(row)).collect(),
                    rows: vec![row],
                });
            }
        }
    }

    if config.order == GroupOrder::Sorted {
        groups.sort_by(|a, b| a.key.cmp(&b.key));
    }

    let records = groups
        .iter()
        .map(|group| {
            let mut record = serde_json::Map::new();
            for (name, value) in request.by.iter().zip(&group.key_json) {
                record.insert(name.clone(), value.clone());
            }
            for (column, values, functions) in &metrics {
                let present: Vec<f64> = group.rows.iter().filter_map(|&r| values[r]).collect();
                for function in functions {
                    record.insert(format!("{}_{}", column, function), function.apply(&present));
                }
            }
            record
        })
        .collect::<Vec<_>>();

    tracing::debug!(
        by = ?request.by,
        groups = records.len(),
        dropped_rows = dropped,
        "Grouped aggregation complete"
    );

    Ok(super::models::GroupByReport { groups: records })
}
