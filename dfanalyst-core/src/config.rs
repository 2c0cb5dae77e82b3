//! Session-wide configuration.
//!
//! [`AnalystConfig`] carries the defaults applied when a tool call omits
//! optional parameters, the grouping policies, and the memoization switch.
//! It deserializes from a JSON document where every field is optional.

use serde::{Deserialize, Serialize};

use crate::analysis::{
    ConfigValidationError, DEFAULT_PERCENTILES, GroupByConfig, OutlierConfig, validate_percentiles,
};
use crate::error::{AnalystError, Result};

/// Upper bound on preview rows returned by `load_data`.
pub const MAX_PREVIEW_ROWS: usize = 1000;

/// Default number of preview rows returned by `load_data`.
pub const DEFAULT_PREVIEW_ROWS: usize = 5;

/// Configuration for an analysis session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalystConfig {
    /// Rows echoed back by `load_data`
    pub preview_rows: usize,
    /// Percentiles used by `profile` when none are requested
    pub default_percentiles: Vec<f64>,
    /// Outlier detection defaults
    pub outliers: OutlierConfig,
    /// Grouped aggregation policies
    pub groupby: GroupByConfig,
    /// Memoize read-only results per dataset generation
    pub cache_enabled: bool,
}

impl Default for AnalystConfig {
    fn default() -> Self {
        Self {
            preview_rows: DEFAULT_PREVIEW_ROWS,
            default_percentiles: DEFAULT_PERCENTILES.to_vec(),
            outliers: OutlierConfig::default(),
            groupby: GroupByConfig::default(),
            cache_enabled: true,
        }
    }
}

impl AnalystConfig {
    /// Creates a new config with defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Parses a JSON config document and validates it.
    ///
    /// # Errors
    /// Returns `Configuration` if the document is malformed or invalid.
    pub fn from_json_str(text: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(text)
            .map_err(|e| AnalystError::configuration(format!("Invalid config file: {}", e)))?;
        config
            .validate()
            .map_err(|e| AnalystError::configuration(e.to_string()))?;
        Ok(config)
    }

    /// Builder method to set the preview row count.
    pub fn with_preview_rows(mut self, rows: usize) -> Self {
        if rows > MAX_PREVIEW_ROWS {
            tracing::warn!(
                "preview_rows {} clamped to maximum {}",
                rows,
                MAX_PREVIEW_ROWS
            );
        }
        self.preview_rows = rows.min(MAX_PREVIEW_ROWS);
        self
    }

    /// Builder method to set the default percentiles.
    pub fn with_default_percentiles(mut self, percentiles: Vec<f64>) -> Self {
        self.default_percentiles = percentiles;
        self
    }

    /// Builder method to set outlier defaults.
    pub fn with_outliers(mut self, outliers: OutlierConfig) -> Self {
        self.outliers = outliers;
        self
    }

    /// Builder method to set grouping policies.
    pub fn with_groupby(mut self, groupby: GroupByConfig) -> Self {
        self.groupby = groupby;
        self
    }

    /// Builder method to enable/disable result memoization.
    pub fn with_cache_enabled(mut self, enabled: bool) -> Self {
        self.cache_enabled = enabled;
        self
    }

    /// Validates the configuration.
    pub fn validate(&self) -> std::result::Result<(), ConfigValidationError> {
        if self.preview_rows > MAX_PREVIEW_ROWS {
            return Err(ConfigValidationError::InvalidPreviewRows {
                max: MAX_PREVIEW_ROWS,
                actual: self.preview_rows,
            });
        }
        validate_percentiles(&self.default_percentiles)?;
        self.outliers.validate()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::{GroupOrder, MissingKeyPolicy};

    #[test]
    fn test_defaults() {
        let config = AnalystConfig::default();
        assert_eq!(config.preview_rows, 5);
        assert_eq!(config.default_percentiles, vec![0.25, 0.5, 0.75]);
        assert_eq!(config.outliers.factor, 1.5);
        assert_eq!(config.outliers.z, 3.0);
        assert_eq!(config.groupby.missing_keys, MissingKeyPolicy::Group);
        assert!(config.cache_enabled);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_builder_clamps_preview_rows() {
        let config = AnalystConfig::new().with_preview_rows(50_000);
        assert_eq!(config.preview_rows, MAX_PREVIEW_ROWS);
    }

    #[test]
    fn test_partial_json_document() {
        let config = AnalystConfig::from_json_str(
            r#"{"preview_rows": 10, "groupby": {"order": "first_appearance"}, "outliers": {"z": 2.0}}"#,
        )
        .unwrap();
        assert_eq!(config.preview_rows, 10);
        assert_eq!(config.groupby.order, GroupOrder::FirstAppearance);
        assert_eq!(config.groupby.missing_keys, MissingKeyPolicy::Group);
        assert_eq!(config.outliers.z, 2.0);
        assert_eq!(config.outliers.factor, 1.5);
    }

    #[test]
    fn test_invalid_documents() {
        let error = AnalystConfig::from_json_str(r#"{"default_percentiles": [0.5, 2.0]}"#)
            .unwrap_err();
        assert!(matches!(error, AnalystError::Configuration { .. }));

        assert!(AnalystConfig::from_json_str("not json").is_err());
        assert!(AnalystConfig::from_json_str(r#"{"preview_rows": 5000}"#).is_err());
    }
}
