//! Analysis configuration.
//!
//! Defaults applied when a tool call omits optional parameters, plus the
//! grouping policies that the observed behavior left open.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Default IQR fence multiplier.
pub const DEFAULT_IQR_FACTOR: f64 = 1.5;

/// Default z-score threshold.
pub const DEFAULT_Z_THRESHOLD: f64 = 3.0;

/// Default profiling percentiles.
pub const DEFAULT_PERCENTILES: [f64; 3] = [0.25, 0.5, 0.75];

/// How rows whose grouping key contains a missing value are handled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MissingKeyPolicy {
    /// Missing keys form their own group
    #[default]
    Group,
    /// Rows with a missing key are excluded
    Drop,
}

impl std::str::FromStr for MissingKeyPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "group" => Ok(Self::Group),
            "drop" => Ok(Self::Drop),
            other => Err(format!("unknown missing-key policy '{}'", other)),
        }
    }
}

/// Order of groups in grouped aggregation output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GroupOrder {
    /// Ascending by key; missing keys sort last
    #[default]
    Sorted,
    /// Order in which each key first appears in the dataset
    FirstAppearance,
}

impl std::str::FromStr for GroupOrder {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().replace('-', "_").as_str() {
            "sorted" => Ok(Self::Sorted),
            "first_appearance" => Ok(Self::FirstAppearance),
            other => Err(format!("unknown group order '{}'", other)),
        }
    }
}

/// Outlier detection defaults.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OutlierConfig {
    /// IQR fence multiplier
    pub factor: f64,
    /// Z-score threshold
    pub z: f64,
}

impl Default for OutlierConfig {
    fn default() -> Self {
        Self {
            factor: DEFAULT_IQR_FACTOR,
            z: DEFAULT_Z_THRESHOLD,
        }
    }
}

impl OutlierConfig {
    /// Creates a new outlier config with defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder method to set the IQR factor.
    pub fn with_factor(mut self, factor: f64) -> Self {
        self.factor = factor;
        self
    }

    /// Builder method to set the z-score threshold.
    pub fn with_z(mut self, z: f64) -> Self {
        self.z = z;
        self
    }
}

/// Grouped aggregation policies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct GroupByConfig {
    /// Handling of missing grouping keys
    pub missing_keys: MissingKeyPolicy,
    /// Output order of groups
    pub order: GroupOrder,
}

impl GroupByConfig {
    /// Creates a new group-by config with defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder method to set the missing-key policy.
    pub fn with_missing_keys(mut self, policy: MissingKeyPolicy) -> Self {
        self.missing_keys = policy;
        self
    }

    /// Builder method to set the group order.
    pub fn with_order(mut self, order: GroupOrder) -> Self {
        self.order = order;
        self
    }
}

/// Validation errors for analysis configuration.
#[derive(Debug, Error, PartialEq)]
pub enum ConfigValidationError {
    /// Percentile fraction outside [0, 1]
    #[error("percentile must be between 0.0 and 1.0, got {0}")]
    InvalidPercentile(f64),
    /// Negative or non-finite IQR factor
    #[error("IQR factor must be a non-negative finite number, got {0}")]
    InvalidFactor(f64),
    /// Negative or non-finite z threshold
    #[error("z threshold must be a non-negative finite number, got {0}")]
    InvalidZ(f64),
    /// Preview row count above the allowed maximum
    #[error("preview_rows must be at most {max}, got {actual}")]
    InvalidPreviewRows { max: usize, actual: usize },
}

/// Checks that every percentile lies in [0, 1].
pub fn validate_percentiles(percentiles: &[f64]) -> Result<(), ConfigValidationError> {
    match percentiles.iter().find(|p| !(0.0..=1.0).contains(*p)) {
        Some(&bad) => Err(ConfigValidationError::InvalidPercentile(bad)),
        None => Ok(()),
    }
}

impl OutlierConfig {
    /// Validates the configured thresholds.
    pub fn validate(&self) -> Result<(), ConfigValidationError> {
        if !self.factor.is_finite() || self.factor < 0.0 {
            return Err(ConfigValidationError::InvalidFactor(self.factor));
        }
        if !self.z.is_finite() || self.z < 0.0 {
            return Err(ConfigValidationError::InvalidZ(self.z));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_outlier_config_defaults() {
        let config = OutlierConfig::default();
        assert_eq!(config.factor, 1.5);
        assert_eq!(config.z, 3.0);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_outlier_config_builder() {
        let config = OutlierConfig::new().with_factor(3.0).with_z(2.0);
        assert_eq!(config.factor, 3.0);
        assert_eq!(config.z, 2.0);
    }

    #[test]
    fn test_outlier_config_validation() {
        assert_eq!(
            OutlierConfig::new().with_factor(-1.0).validate(),
            Err(ConfigValidationError::InvalidFactor(-1.0))
        );
        assert!(OutlierConfig::new().with_z(f64::NAN).validate().is_err());
    }

    #[test]
    fn test_groupby_config_defaults() {
        let config = GroupByConfig::default();
        assert_eq!(config.missing_keys, MissingKeyPolicy::Group);
        assert_eq!(config.order, GroupOrder::Sorted);

        let config = GroupByConfig::new()
            .with_missing_keys(MissingKeyPolicy::Drop)
            .with_order(GroupOrder::FirstAppearance);
        assert_eq!(config.missing_keys, MissingKeyPolicy::Drop);
        assert_eq!(config.order, GroupOrder::FirstAppearance);
    }

    #[test]
    fn test_policy_parsing() {
        assert_eq!("drop".parse::<MissingKeyPolicy>(), Ok(MissingKeyPolicy::Drop));
        assert_eq!("GROUP".parse::<MissingKeyPolicy>(), Ok(MissingKeyPolicy::Group));
        assert!("keep".parse::<MissingKeyPolicy>().is_err());

        assert_eq!(
            "first-appearance".parse::<GroupOrder>(),
            Ok(GroupOrder::FirstAppearance)
        );
        assert_eq!("sorted".parse::<GroupOrder>(), Ok(GroupOrder::Sorted));
    }

    #[test]
    fn test_policy_serde() {
        let config: GroupByConfig =
            serde_json::from_str(r#"{"missing_keys": "drop", "order": "first_appearance"}"#)
                .unwrap();
        assert_eq!(config.missing_keys, MissingKeyPolicy::Drop);
        assert_eq!(config.order, GroupOrder::FirstAppearance);
    }

    #[test]
    fn test_validate_percentiles() {
        assert!(validate_percentiles(&DEFAULT_PERCENTILES).is_ok());
        assert!(validate_percentiles(&[0.0, 1.0]).is_ok());
        assert_eq!(
            validate_percentiles(&[0.5, 1.5]),
            Err(ConfigValidationError::InvalidPercentile(1.5))
        );
    }
}
