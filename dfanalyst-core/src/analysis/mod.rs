//! Tabular analysis operations.
//!
//! Each operation reads a [`Dataset`](crate::models::Dataset) and returns a
//! report without mutating it:
//! - **Schema**: storage type and nullability per column
//! - **Missing**: percentage of missing cells per column
//! - **Profile**: descriptive statistics with arbitrary percentiles
//! - **Correlation**: pairwise matrix (pearson, spearman, kendall)
//! - **Outliers**: IQR or z-score flagging on one column
//! - **Group-by**: keyed aggregation with flattened output names
//!
//! Missing cells are always excluded from numeric computation, never
//! treated as zero.
//!
//! # Example
//! ```rust
//! use dfanalyst_core::analysis::{OutlierConfig, OutlierRequest, detect_outliers};
//! use dfanalyst_core::models::{Column, Dataset};
//!
//! let dataset = Dataset::from_columns(vec![Column::integer(
//!     "x",
//!     vec![Some(1), Some(2), Some(3), Some(4), Some(5), Some(1000)],
//! )])?;
//! let report = detect_outliers(&dataset, &OutlierRequest::new("x"), &OutlierConfig::default())?;
//! assert_eq!(report.count, 1);
//! # Ok::<(), dfanalyst_core::AnalystError>(())
//! ```

mod config;
mod correlation;
mod groupby;
mod missing;
mod models;
mod outliers;
mod profile;
mod schema;
pub mod stats;

// Re-export public API
pub use config::{
    ConfigValidationError, DEFAULT_IQR_FACTOR, DEFAULT_PERCENTILES, DEFAULT_Z_THRESHOLD,
    GroupByConfig, GroupOrder, MissingKeyPolicy, OutlierConfig, validate_percentiles,
};
pub use correlation::{CorrelationMethod, correlation};
pub use groupby::{AggFunc, GroupByRequest, MetricSpec, groupby};
pub use missing::missing_report;
pub use models::{
    ColumnMissing, ColumnProfile, ColumnSchema, ColumnStats, CorrelationReport, CorrelationRow,
    GroupByReport, MissingReport, Outlier, OutlierReport, ProfileReport, SchemaReport,
};
pub use outliers::{OutlierMethod, OutlierRequest, detect_outliers};
pub use profile::{ProfileRequest, percentile_key, profile};
pub use schema::infer_schema;
