//! Descriptive statistics over numerically coerced columns.

use serde::{Deserialize, Serialize};

use crate::error::{AnalystError, Result};
use crate::models::Dataset;

use super::config::validate_percentiles;
use super::models::{ColumnProfile, ColumnStats, ProfileReport};
use super::stats;

/// Parameters of a profile call.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProfileRequest {
    /// Explicit column subset; `None` or empty selects every numeric column
    pub columns: Option<Vec<String>>,
    /// Percentile fractions in [0, 1]; `None` or empty uses the defaults
    pub percentiles: Option<Vec<f64>>,
}

impl ProfileRequest {
    /// Creates a request with all defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder method to restrict profiling to specific columns.
    pub fn with_columns<I, S>(mut self, columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.columns = Some(columns.into_iter().map(Into::into).collect());
        self
    }

    /// Builder method to set the requested percentiles.
    pub fn with_percentiles(mut self, percentiles: Vec<f64>) -> Self {
        self.percentiles = Some(percentiles);
        self
    }
}

/// Output key for a percentile fraction, e.g. `0.5` -> `p50`.
pub fn percentile_key(p: f64) -> String {
    format!("p{}", (p * 100.0).round() as i64)
}

/// Profiles the selected columns.
///
/// # Arguments
/// * `dataset` - The dataset to profile
/// * `request` - Column subset and percentiles
/// * `default_percentiles` - Used when the request names none
///
/// # Errors
/// `ColumnNotFound` for an unknown column, `InvalidArgument` for a
/// percentile outside [0, 1].
pub fn profile(
    dataset: &Dataset,
    request: &ProfileRequest,
    default_percentiles: &[f64],
) -> Result<ProfileReport> {
    let percentiles = match request.percentiles.as_deref() {
        Some(list) if !list.is_empty() => list,
        _ => default_percentiles,
    };
    validate_percentiles(percentiles).map_err(|e| AnalystError::invalid_argument(e.to_string()))?;

    // Fractions that round to the same key keep the first one requested
    let mut keyed: Vec<(String, f64)> = Vec::with_capacity(percentiles.len());
    for &p in percentiles {
        let key = percentile_key(p);
        if !keyed.iter().any(|(existing, _)| *existing == key) {
            keyed.push((key, p));
        }
    }

    let selected: Vec<String> = match request.columns.as_deref() {
        Some(list) if !list.is_empty() => {
            let mut unique: Vec<String> = Vec::with_capacity(list.len());
            for name in list {
                if !unique.contains(name) {
                    unique.push(name.clone());
                }
            }
            unique
        }
        _ => dataset
            .columns()
            .iter()
            .filter(|c| c.data_type().is_numeric())
            .map(|c| c.name.clone())
            .collect(),
    };

    let mut columns = Vec::with_capacity(selected.len());
    for name in selected {
        let column = dataset.require_column(&name)?;
        let values = stats::present(&column.to_numeric());
        let stats = summarize(&values, &keyed);
        if stats.is_none() {
            tracing::debug!(column = %name, "All values missing after coercion");
        }
        columns.push(ColumnProfile {
            column: name,
            stats,
        });
    }

    Ok(ProfileReport { columns })
}

fn summarize(values: &[f64], percentiles: &[(String, f64)]) -> Option<ColumnStats> {
    if values.is_empty() {
        return None;
    }
    let sorted = stats::sorted(values);

    Some(ColumnStats {
        count: values.len(),
        mean: stats::mean(values),
        std: stats::sample_std(values),
        min: sorted.first().copied(),
        max: sorted.last().copied(),
        percentiles: percentiles
            .iter()
            .map(|(key, p)| (key.clone(), stats::quantile_sorted(&sorted, *p)))
            .collect(),
    })
}
