//! Outlier detection on a single column.
//!
//! Two methods are supported:
//! - **iqr**: values strictly outside `[Q1 - factor*IQR, Q3 + factor*IQR]`
//! - **zscore**: values with `|x - mean| / sd > z`, using the population
//!   standard deviation; a zero or undefined deviation flags nothing

use serde::{Deserialize, Serialize};

use crate::error::{AnalystError, Result};
use crate::models::Dataset;

use super::config::OutlierConfig;
use super::models::{Outlier, OutlierReport};
use super::stats;

/// Outlier detection method.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutlierMethod {
    /// Tukey fences at `factor` times the interquartile range
    #[default]
    Iqr,
    /// Distance from the mean in population standard deviations
    Zscore,
}

impl OutlierMethod {
    /// Accepted method names.
    pub const NAMES: [&'static str; 2] = ["iqr", "zscore"];

    /// Returns the method name.
    pub fn as_str(&self) -> &'static str {
        match self {
            OutlierMethod::Iqr => "iqr",
            OutlierMethod::Zscore => "zscore",
        }
    }
}

impl std::str::FromStr for OutlierMethod {
    type Err = AnalystError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "iqr" => Ok(Self::Iqr),
            "zscore" => Ok(Self::Zscore),
            other => Err(AnalystError::invalid_method(other, &Self::NAMES)),
        }
    }
}

impl std::fmt::Display for OutlierMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Parameters of an outlier detection call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OutlierRequest {
    /// Target column
    pub column: String,
    /// Detection method, IQR by default
    #[serde(default)]
    pub method: OutlierMethod,
    /// IQR multiplier; the configured default applies when absent
    #[serde(default)]
    pub factor: Option<f64>,
    /// Z-score threshold; the configured default applies when absent
    #[serde(default)]
    pub z: Option<f64>,
}

impl OutlierRequest {
    /// Creates an IQR request for `column` with default thresholds.
    pub fn new(column: impl Into<String>) -> Self {
        Self {
            column: column.into(),
            method: OutlierMethod::default(),
            factor: None,
            z: None,
        }
    }

    /// Builder method to set the method.
    pub fn with_method(mut self, method: OutlierMethod) -> Self {
        self.method = method;
        self
    }

    /// Builder method to set the IQR multiplier.
    pub fn with_factor(mut self, factor: f64) -> Self {
        self.factor = Some(factor);
        self
    }

    /// Builder method to set the z-score threshold.
    pub fn with_z(mut self, z: f64) -> Self {
        self.z = Some(z);
        self
    }
}

/// Flags outlying rows of the requested column.
///
/// # Errors
/// `ColumnNotFound` if the column is absent, `InvalidArgument` if a
/// threshold is negative or not finite.
pub fn detect_outliers(
    dataset: &Dataset,
    request: &OutlierRequest,
    defaults: &OutlierConfig,
) -> Result<OutlierReport> {
    let column = dataset.require_column(&request.column)?;
    let thresholds = OutlierConfig {
        factor: request.factor.unwrap_or(defaults.factor),
        z: request.z.unwrap_or(defaults.z),
    };
    thresholds
        .validate()
        .map_err(|e| AnalystError::invalid_argument(e.to_string()))?;

    let values = column.to_numeric();
    let present = stats::present(&values);

    let flagged: Box<dyn Fn(f64) -> bool> = match request.method {
        OutlierMethod::Iqr => {
            let sorted = stats::sorted(&present);
            match (
                stats::quantile_sorted(&sorted, 0.25),
                stats::quantile_sorted(&sorted, 0.75),
            ) {
                (Some(q1), Some(q3)) => {
                    let iqr = q3 - q1;
                    let lower = q1 - thresholds.factor * iqr;
                    let upper = q3 + thresholds.factor * iqr;
                    Box::new(move |x| x < lower || x > upper)
                }
                _ => Box::new(|_| false),
            }
        }
        OutlierMethod::Zscore => match (stats::mean(&present), stats::population_std(&present)) {
            (Some(mu), Some(sd)) if sd > 0.0 => {
                let z = thresholds.z;
                Box::new(move |x| ((x - mu) / sd).abs() > z)
            }
            _ => Box::new(|_| false),
        },
    };

    let outliers: Vec<Outlier> = values
        .iter()
        .enumerate()
        .filter_map(|(row, value)| {
            let value = (*value)?;
            flagged(value).then_some(Outlier {
                row,
                value: Some(value),
            })
        })
        .collect();

    tracing::debug!(
        column = %request.column,
        method = %request.method,
        count = outliers.len(),
        "Outlier detection complete"
    );

    Ok(OutlierReport::new(outliers))
}
