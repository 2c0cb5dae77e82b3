//! Core data models for the in-memory tabular dataset.
//!
//! A [`Dataset`] is an ordered list of named [`Column`]s of equal length.
//! Each column stores its cells in a typed array where every cell is an
//! `Option`: `None` is the missing marker and is never a valid data value.
//! Numeric coercion ([`Column::to_numeric`]) reinterprets a column as
//! `Option<f64>` per cell without touching the stored values.

use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

use crate::error::{AnalystError, Result};

/// Free-form provenance mapping echoed back by ingestion.
pub type SourceMetadata = serde_json::Map<String, JsonValue>;

/// A single non-missing cell of an `object` column.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Scalar {
    /// Whole number
    Integer(i64),
    /// Floating-point number
    Float(f64),
    /// Boolean
    Boolean(bool),
    /// Text
    Text(String),
}

impl Scalar {
    /// Best-effort numeric reinterpretation of this cell.
    pub fn to_f64(&self) -> Option<f64> {
        match self {
            Scalar::Integer(v) => Some(*v as f64),
            Scalar::Float(v) => finite(*v),
            Scalar::Boolean(v) => Some(if *v { 1.0 } else { 0.0 }),
            Scalar::Text(s) => parse_numeric(s),
        }
    }

    /// Converts this cell into its JSON representation.
    pub fn to_json(&self) -> JsonValue {
        match self {
            Scalar::Integer(v) => JsonValue::from(*v),
            Scalar::Float(v) => float_to_json(*v),
            Scalar::Boolean(v) => JsonValue::Bool(*v),
            Scalar::Text(s) => JsonValue::String(s.clone()),
        }
    }
}

/// Storage type of a column, reported by schema inspection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DataType {
    /// 64-bit signed integers
    Integer,
    /// 64-bit floats
    Float,
    /// Booleans
    Boolean,
    /// Strings
    Text,
    /// Mixed cell types
    Object,
}

impl DataType {
    /// Human-readable type label.
    pub fn label(&self) -> &'static str {
        match self {
            DataType::Integer => "int64",
            DataType::Float => "float64",
            DataType::Boolean => "bool",
            DataType::Text => "string",
            DataType::Object => "object",
        }
    }

    /// Whether the native values of this type are numbers.
    pub fn is_numeric(&self) -> bool {
        matches!(self, DataType::Integer | DataType::Float)
    }
}

impl std::fmt::Display for DataType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// Typed cell storage for one column.
#[derive(Debug, Clone, PartialEq)]
pub enum ColumnData {
    /// Integer cells
    Integer(Vec<Option<i64>>),
    /// Float cells
    Float(Vec<Option<f64>>),
    /// Boolean cells
    Boolean(Vec<Option<bool>>),
    /// Text cells
    Text(Vec<Option<String>>),
    /// Heterogeneous cells
    Object(Vec<Option<Scalar>>),
}

impl ColumnData {
    /// Number of cells, missing included.
    pub fn len(&self) -> usize {
        match self {
            ColumnData::Integer(v) => v.len(),
            ColumnData::Float(v) => v.len(),
            ColumnData::Boolean(v) => v.len(),
            ColumnData::Text(v) => v.len(),
            ColumnData::Object(v) => v.len(),
        }
    }

    /// Returns `true` if the column has no cells.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Storage type of this column.
    pub fn data_type(&self) -> DataType {
        match self {
            ColumnData::Integer(_) => DataType::Integer,
            ColumnData::Float(_) => DataType::Float,
            ColumnData::Boolean(_) => DataType::Boolean,
            ColumnData::Text(_) => DataType::Text,
            ColumnData::Object(_) => DataType::Object,
        }
    }

    /// Whether the cell at `row` is missing. NaN floats count as missing.
    pub fn is_missing(&self, row: usize) -> bool {
        match self {
            ColumnData::Integer(v) => v.get(row).is_none_or(Option::is_none),
            ColumnData::Float(v) => v.get(row).is_none_or(|c| c.is_none_or(f64::is_nan)),
            ColumnData::Boolean(v) => v.get(row).is_none_or(Option::is_none),
            ColumnData::Text(v) => v.get(row).is_none_or(Option::is_none),
            ColumnData::Object(v) => v.get(row).is_none_or(|c| {
                c.as_ref()
                    .is_none_or(|s| matches!(s, Scalar::Float(f) if f.is_nan()))
            }),
        }
    }

    /// Native cell value at `row`, `None` when missing.
    pub fn get(&self, row: usize) -> Option<Scalar> {
        if self.is_missing(row) {
            return None;
        }
        match self {
            ColumnData::Integer(v) => v.get(row).copied().flatten().map(Scalar::Integer),
            ColumnData::Float(v) => v.get(row).copied().flatten().map(Scalar::Float),
            ColumnData::Boolean(v) => v.get(row).copied().flatten().map(Scalar::Boolean),
            ColumnData::Text(v) => v.get(row).cloned().flatten().map(Scalar::Text),
            ColumnData::Object(v) => v.get(row).cloned().flatten(),
        }
    }
}

/// A named column of the dataset.
#[derive(Debug, Clone, PartialEq)]
pub struct Column {
    /// Column name, unique within a dataset
    pub name: String,
    /// Cell storage
    pub data: ColumnData,
}

impl Column {
    /// Creates a column from typed storage.
    pub fn new(name: impl Into<String>, data: ColumnData) -> Self {
        Self {
            name: name.into(),
            data,
        }
    }

    /// Creates an integer column.
    pub fn integer(name: impl Into<String>, values: Vec<Option<i64>>) -> Self {
        Self::new(name, ColumnData::Integer(values))
    }

    /// Creates a float column.
    pub fn float(name: impl Into<String>, values: Vec<Option<f64>>) -> Self {
        Self::new(name, ColumnData::Float(values))
    }

    /// Creates a boolean column.
    pub fn boolean(name: impl Into<String>, values: Vec<Option<bool>>) -> Self {
        Self::new(name, ColumnData::Boolean(values))
    }

    /// Creates a text column.
    pub fn text(name: impl Into<String>, values: Vec<Option<String>>) -> Self {
        Self::new(name, ColumnData::Text(values))
    }

    /// Creates an `object` column of heterogeneous cells.
    pub fn object(name: impl Into<String>, values: Vec<Option<Scalar>>) -> Self {
        Self::new(name, ColumnData::Object(values))
    }

    /// Number of cells.
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Returns `true` if the column has no cells.
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Storage type of this column.
    pub fn data_type(&self) -> DataType {
        self.data.data_type()
    }

    /// Number of missing cells.
    pub fn missing_count(&self) -> usize {
        (0..self.len()).filter(|&row| self.data.is_missing(row)).count()
    }

    /// Numeric coercion: one `Option<f64>` per row.
    ///
    /// Cells that cannot be read as a finite number become `None`. Booleans
    /// coerce to 0/1. The stored values are left untouched.
    pub fn to_numeric(&self) -> Vec<Option<f64>> {
        match &self.data {
            ColumnData::Integer(v) => v.iter().map(|c| c.map(|x| x as f64)).collect(),
            ColumnData::Float(v) => v.iter().map(|c| c.and_then(finite)).collect(),
            ColumnData::Boolean(v) => v
                .iter()
                .map(|c| c.map(|b| if b { 1.0 } else { 0.0 }))
                .collect(),
            ColumnData::Text(v) => v
                .iter()
                .map(|c| c.as_deref().and_then(parse_numeric))
                .collect(),
            ColumnData::Object(v) => v
                .iter()
                .map(|c| c.as_ref().and_then(Scalar::to_f64))
                .collect(),
        }
    }

    /// JSON value of the cell at `row`; missing cells become `null`.
    pub fn json_at(&self, row: usize) -> JsonValue {
        self.data
            .get(row)
            .map_or(JsonValue::Null, |scalar| scalar.to_json())
    }
}

/// In-memory tabular dataset with named, ordered, equal-length columns.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Dataset {
    columns: Vec<Column>,
    row_count: usize,
}

impl Dataset {
    /// Creates an empty dataset with no columns and no rows.
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a dataset from columns, enforcing equal lengths and unique names.
    pub fn from_columns(columns: Vec<Column>) -> Result<Self> {
        let mut dataset = Self::new();
        for column in columns {
            dataset.push_column(column)?;
        }
        Ok(dataset)
    }

    /// Appends a column.
    ///
    /// # Errors
    /// Returns `InvalidArgument` if the column length differs from the
    /// existing row count or its name is already present.
    pub fn push_column(&mut self, column: Column) -> Result<()> {
        if self.columns.iter().any(|c| c.name == column.name) {
            return Err(AnalystError::invalid_argument(format!(
                "duplicate column name '{}'",
                column.name
            )));
        }
        if self.columns.is_empty() {
            self.row_count = column.len();
        } else if column.len() != self.row_count {
            return Err(AnalystError::invalid_argument(format!(
                "column '{}' has {} rows, expected {}",
                column.name,
                column.len(),
                self.row_count
            )));
        }
        self.columns.push(column);
        Ok(())
    }

    /// Number of rows.
    pub fn row_count(&self) -> usize {
        self.row_count
    }

    /// Number of columns.
    pub fn column_count(&self) -> usize {
        self.columns.len()
    }

    /// Columns in their original order.
    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    /// Column names in their original order.
    pub fn column_names(&self) -> Vec<String> {
        self.columns.iter().map(|c| c.name.clone()).collect()
    }

    /// Looks up a column by name.
    pub fn column(&self, name: &str) -> Option<&Column> {
        self.columns.iter().find(|c| c.name == name)
    }

    /// Looks up a column by name, failing with `ColumnNotFound`.
    pub fn require_column(&self, name: &str) -> Result<&Column> {
        self.column(name)
            .ok_or_else(|| AnalystError::column_not_found(name))
    }

    /// Returns the first `limit` rows as JSON records.
    pub fn head_records(&self, limit: usize) -> Vec<serde_json::Map<String, JsonValue>> {
        (0..self.row_count.min(limit))
            .map(|row| {
                self.columns
                    .iter()
                    .map(|c| (c.name.clone(), c.json_at(row)))
                    .collect()
            })
            .collect()
    }
}

/// Keeps only finite floats.
fn finite(value: f64) -> Option<f64> {
    value.is_finite().then_some(value)
}

/// Parses a text cell as a finite number.
///
/// Non-finite spellings such as "NaN" or "inf" are rejected so they cannot
/// poison statistics.
pub fn parse_numeric(text: &str) -> Option<f64> {
    text.trim().parse::<f64>().ok().and_then(finite)
}

/// Converts a float to JSON, mapping non-finite values to `null`.
pub fn float_to_json(value: f64) -> JsonValue {
    serde_json::Number::from_f64(value).map_or(JsonValue::Null, JsonValue::Number)
}

#[cfg(test)]
mod tests;
