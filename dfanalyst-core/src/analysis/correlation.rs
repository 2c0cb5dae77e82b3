//! Pairwise correlation matrix.
//!
//! Every column is coerced to numeric, so non-numeric columns take part as
//! entirely missing columns. Each pair uses only the rows where both values
//! are present. Undefined coefficients are reported as 0.0.

use serde::{Deserialize, Serialize};

use crate::error::{AnalystError, Result};
use crate::models::{Dataset, float_to_json};

use super::models::{CorrelationReport, CorrelationRow};
use super::stats;

/// Correlation method.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CorrelationMethod {
    /// Linear correlation
    #[default]
    Pearson,
    /// Pearson over average ranks
    Spearman,
    /// Kendall's tau-b
    Kendall,
}

impl CorrelationMethod {
    /// Accepted method names.
    pub const NAMES: [&'static str; 3] = ["pearson", "spearman", "kendall"];

    /// Returns the method name.
    pub fn as_str(&self) -> &'static str {
        match self {
            CorrelationMethod::Pearson => "pearson",
            CorrelationMethod::Spearman => "spearman",
            CorrelationMethod::Kendall => "kendall",
        }
    }

    fn coefficient(self, x: &[f64], y: &[f64]) -> Option<f64> {
        match self {
            CorrelationMethod::Pearson => stats::pearson(x, y),
            CorrelationMethod::Spearman => stats::spearman(x, y),
            CorrelationMethod::Kendall => stats::kendall(x, y),
        }
    }

    /// Self-correlation of a column with `values` present.
    ///
    /// Pearson and Spearman are undefined without variance; Kendall is 1.0
    /// as soon as one value is present.
    fn diagonal(self, values: &[f64]) -> Option<f64> {
        match self {
            CorrelationMethod::Pearson | CorrelationMethod::Spearman => {
                (!stats::is_constant(values)).then_some(1.0)
            }
            CorrelationMethod::Kendall => (!values.is_empty()).then_some(1.0),
        }
    }
}

impl std::str::FromStr for CorrelationMethod {
    type Err = AnalystError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "pearson" => Ok(Self::Pearson),
            "spearman" => Ok(Self::Spearman),
            "kendall" => Ok(Self::Kendall),
            other => Err(AnalystError::invalid_method(other, &Self::NAMES)),
        }
    }
}

impl std::fmt::Display for CorrelationMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Computes the correlation matrix across all columns.
pub fn correlation(dataset: &Dataset, method: CorrelationMethod) -> CorrelationReport {
    let names = dataset.column_names();
    let coerced: Vec<Vec<Option<f64>>> = dataset.columns().iter().map(|c| c.to_numeric()).collect();
    let n = coerced.len();

    let mut coefficients = vec![vec![0.0; n]; n];
    for i in 0..n {
        coefficients[i][i] = method.diagonal(&stats::present(&coerced[i])).unwrap_or(0.0);
        for j in i.saturating_add(1)..n {
            let (x, y) = pairwise_complete(&coerced[i], &coerced[j]);
            let value = method.coefficient(&x, &y).unwrap_or(0.0);
            coefficients[i][j] = value;
            coefficients[j][i] = value;
        }
    }

    let matrix = names
        .iter()
        .zip(&coefficients)
        .map(|(name, row)| CorrelationRow {
            col: name.clone(),
            to: names
                .iter()
                .zip(row)
                .map(|(other, &value)| (other.clone(), float_to_json(value)))
                .collect(),
        })
        .collect();

    tracing::debug!(method = %method, columns = n, "Computed correlation matrix");

    CorrelationReport {
        method: method.as_str().to_string(),
        matrix,
    }
}

/// Values of two columns restricted to rows where both are present.
fn pairwise_complete(a: &[Option<f64>], b: &[Option<f64>]) -> (Vec<f64>, Vec<f64>) {
    a.iter()
        .zip(b)
        .filter_map(|(x, y)| Some(((*x)?, (*y)?)))
        .unzip()
}
