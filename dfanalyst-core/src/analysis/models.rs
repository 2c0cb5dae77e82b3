//! Result models for the analysis operations.
//!
//! Every report serializes to the JSON shape returned by the matching tool
//! call. Key order is significant and follows column or request order.

use serde::ser::{SerializeMap, Serializer};
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

use crate::models::DataType;

/// Schema entry for a single column.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnSchema {
    /// Column name
    pub name: String,
    /// Storage type label (`int64`, `float64`, `bool`, `string`, `object`)
    pub dtype: String,
    /// True iff the column holds at least one missing value
    pub nullable: bool,
}

impl ColumnSchema {
    /// Creates a schema entry from a storage type.
    pub fn new(name: impl Into<String>, data_type: DataType, nullable: bool) -> Self {
        Self {
            name: name.into(),
            dtype: data_type.label().to_string(),
            nullable,
        }
    }
}

/// Result of schema inspection.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SchemaReport {
    /// One entry per column, in column order
    pub schema: Vec<ColumnSchema>,
}

/// Missing ratio for a single column.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColumnMissing {
    /// Column name
    pub column: String,
    /// Percentage of missing cells (0-100), rounded to 4 decimals
    pub pct: f64,
}

/// Result of the missing-value report.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MissingReport {
    /// One entry per column, in column order
    pub missing_pct: Vec<ColumnMissing>,
}

/// Descriptive statistics for one column with at least one numeric value.
#[derive(Debug, Clone, PartialEq)]
pub struct ColumnStats {
    /// Non-missing value count
    pub count: usize,
    /// Arithmetic mean
    pub mean: Option<f64>,
    /// Sample standard deviation (ddof = 1)
    pub std: Option<f64>,
    /// Smallest value
    pub min: Option<f64>,
    /// Largest value
    pub max: Option<f64>,
    /// `(key, value)` pairs such as `("p50", Some(3.0))`, in request order
    pub percentiles: Vec<(String, Option<f64>)>,
}

impl Serialize for ColumnStats {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.percentiles.len().saturating_add(5)))?;
        map.serialize_entry("count", &self.count)?;
        map.serialize_entry("mean", &self.mean)?;
        map.serialize_entry("std", &self.std)?;
        map.serialize_entry("min", &self.min)?;
        map.serialize_entry("max", &self.max)?;
        for (key, value) in &self.percentiles {
            map.serialize_entry(key, value)?;
        }
        map.end()
    }
}

/// Profile of one selected column.
#[derive(Debug, Clone, PartialEq)]
pub struct ColumnProfile {
    /// Column name
    pub column: String,
    /// `None` when every value is missing after coercion
    pub stats: Option<ColumnStats>,
}

/// Result of profiling, keyed by column in selection order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProfileReport {
    /// One entry per profiled column, in request order
    pub columns: Vec<ColumnProfile>,
}

impl ProfileReport {
    /// Looks up the statistics of a profiled column.
    pub fn get(&self, column: &str) -> Option<&ColumnProfile> {
        self.columns.iter().find(|c| c.column == column)
    }
}

/// Serializes as `{"stats": {column: {...}}}`; all-missing columns map to `{}`.
impl Serialize for ProfileReport {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        struct Stats<'a>(&'a [ColumnProfile]);

        impl Serialize for Stats<'_> {
            fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
                let mut map = serializer.serialize_map(Some(self.0.len()))?;
                for profile in self.0 {
                    match &profile.stats {
                        Some(stats) => map.serialize_entry(&profile.column, stats)?,
                        None => map.serialize_entry(&profile.column, &JsonValue::Object(
                            serde_json::Map::new(),
                        ))?,
                    }
                }
                map.end()
            }
        }

        let mut map = serializer.serialize_map(Some(1))?;
        map.serialize_entry("stats", &Stats(&self.columns))?;
        map.end()
    }
}

/// One row of the correlation matrix.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CorrelationRow {
    /// Row column name
    pub col: String,
    /// Coefficient against every column, in column order
    pub to: serde_json::Map<String, JsonValue>,
}

impl CorrelationRow {
    /// Coefficient against `other`, if present.
    pub fn coefficient(&self, other: &str) -> Option<f64> {
        self.to.get(other).and_then(JsonValue::as_f64)
    }
}

/// Result of the correlation engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CorrelationReport {
    /// Method used (`pearson`, `spearman`, `kendall`)
    pub method: String,
    /// Square matrix in column order
    pub matrix: Vec<CorrelationRow>,
}

impl CorrelationReport {
    /// Looks up `matrix[row].to[col]`.
    pub fn coefficient(&self, row: &str, col: &str) -> Option<f64> {
        self.matrix
            .iter()
            .find(|r| r.col == row)
            .and_then(|r| r.coefficient(col))
    }
}

/// A flagged row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Outlier {
    /// 0-based row position in the dataset
    pub row: usize,
    /// Coerced numeric value
    pub value: Option<f64>,
}

/// Result of outlier detection.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct OutlierReport {
    /// Flagged rows, ascending by row
    pub outliers: Vec<Outlier>,
    /// Number of flagged rows
    pub count: usize,
}

impl OutlierReport {
    /// Builds a report, deriving `count` from the flagged rows.
    pub fn new(outliers: Vec<Outlier>) -> Self {
        let count = outliers.len();
        Self { outliers, count }
    }
}

/// Result of grouped aggregation.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GroupByReport {
    /// One record per group: keys first, then `<column>_<function>` fields
    pub groups: Vec<serde_json::Map<String, JsonValue>>,
}
