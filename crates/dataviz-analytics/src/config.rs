//! Configuration for profiling, cleaning estimates and question matching.
//!
//! All tunables live in [`AnalysisConfig`], created either with
//! `Default` or through the fluent [`AnalysisConfigBuilder`].

use serde::{Deserialize, Serialize};

/// Tunable thresholds for the analysis engine.
///
/// # Example
///
/// ```rust,ignore
/// use dataviz_analytics::config::AnalysisConfig;
///
/// let config = AnalysisConfig::builder()
///     .fuzzy_threshold(0.7)
///     .outlier_damping_factor(0.2)
///     .build()?;
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisConfig {
    /// Minimum similarity ratio for a question token to match a keyword.
    /// Default: 0.65
    pub fuzzy_threshold: f64,

    /// Similarity ratio used for the greeting and thanks keyword sets,
    /// where short words collide easily ("this" vs "hi").
    /// Default: 0.75
    pub strict_fuzzy_threshold: f64,

    /// Multiplier applied to the IQR when computing outlier bounds.
    /// Default: 1.5
    pub iqr_multiplier: f64,

    /// Fraction of detected outlier values assumed to cost a row when
    /// estimating the post-cleaning row count.
    /// Default: 0.1
    pub outlier_damping_factor: f64,

    /// Rows whose missing fraction exceeds this value are presumed dropped
    /// by the cleaning estimate.
    /// Default: 0.5
    pub sparse_row_threshold: f64,

    /// Minimum share of parseable values for a text column to count as a
    /// contaminated quantitative column rather than a qualitative one.
    /// Default: 0.5
    pub mixed_numeric_ratio: f64,

    /// Value written into missing text cells by `fill_missing`.
    /// Default: "Unknown"
    pub missing_sentinel: String,

    /// Per-attempt timeouts (seconds) for the external answer service.
    /// One attempt per entry.
    /// Default: [15, 25]
    pub fallback_timeouts_secs: Vec<u64>,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            fuzzy_threshold: 0.65,
            strict_fuzzy_threshold: 0.75,
            iqr_multiplier: 1.5,
            outlier_damping_factor: 0.1,
            sparse_row_threshold: 0.5,
            mixed_numeric_ratio: 0.5,
            missing_sentinel: "Unknown".to_string(),
            fallback_timeouts_secs: vec![15, 25],
        }
    }
}

impl AnalysisConfig {
    /// Create a new configuration builder.
    pub fn builder() -> AnalysisConfigBuilder {
        AnalysisConfigBuilder::default()
    }

    /// Validate the configuration and return errors if invalid.
    pub fn validate(&self) -> Result<(), ConfigValidationError> {
        let ratios = [
            ("fuzzy_threshold", self.fuzzy_threshold),
            ("strict_fuzzy_threshold", self.strict_fuzzy_threshold),
            ("outlier_damping_factor", self.outlier_damping_factor),
            ("sparse_row_threshold", self.sparse_row_threshold),
            ("mixed_numeric_ratio", self.mixed_numeric_ratio),
        ];
        for (field, value) in ratios {
            if !(0.0..=1.0).contains(&value) {
                return Err(ConfigValidationError::InvalidThreshold {
                    field: field.to_string(),
                    value,
                });
            }
        }

        if !(self.iqr_multiplier.is_finite() && self.iqr_multiplier > 0.0) {
            return Err(ConfigValidationError::InvalidMultiplier(self.iqr_multiplier));
        }

        if self.missing_sentinel.is_empty() {
            return Err(ConfigValidationError::EmptySentinel);
        }

        if self.fallback_timeouts_secs.is_empty() || self.fallback_timeouts_secs.contains(&0) {
            return Err(ConfigValidationError::InvalidTimeouts(
                self.fallback_timeouts_secs.clone(),
            ));
        }

        Ok(())
    }
}

/// Errors that can occur during configuration validation.
#[derive(Debug, thiserror::Error)]
pub enum ConfigValidationError {
    #[error("Invalid threshold for '{field}': {value} (must be between 0.0 and 1.0)")]
    InvalidThreshold { field: String, value: f64 },

    #[error("Invalid IQR multiplier: {0} (must be a positive number)")]
    InvalidMultiplier(f64),

    #[error("Missing-value sentinel must not be empty")]
    EmptySentinel,

    #[error("Invalid fallback timeouts {0:?} (need at least one non-zero entry)")]
    InvalidTimeouts(Vec<u64>),
}

impl From<ConfigValidationError> for crate::error::AnalysisError {
    fn from(err: ConfigValidationError) -> Self {
        crate::error::AnalysisError::InvalidConfig(err.to_string())
    }
}

/// Builder for [`AnalysisConfig`] with fluent API.
#[derive(Debug, Default)]
pub struct AnalysisConfigBuilder {
    fuzzy_threshold: Option<f64>,
    strict_fuzzy_threshold: Option<f64>,
    iqr_multiplier: Option<f64>,
    outlier_damping_factor: Option<f64>,
    sparse_row_threshold: Option<f64>,
    mixed_numeric_ratio: Option<f64>,
    missing_sentinel: Option<String>,
    fallback_timeouts_secs: Option<Vec<u64>>,
}

impl AnalysisConfigBuilder {
    /// Set the default keyword similarity threshold (0.0 - 1.0).
    pub fn fuzzy_threshold(mut self, threshold: f64) -> Self {
        self.fuzzy_threshold = Some(threshold);
        self
    }

    /// Set the threshold used for greeting and thanks keywords.
    pub fn strict_fuzzy_threshold(mut self, threshold: f64) -> Self {
        self.strict_fuzzy_threshold = Some(threshold);
        self
    }

    /// Set the IQR multiplier `k` in `[Q1 - k*IQR, Q3 + k*IQR]`.
    pub fn iqr_multiplier(mut self, k: f64) -> Self {
        self.iqr_multiplier = Some(k);
        self
    }

    /// Set the outlier damping factor used by the cleaning estimate.
    pub fn outlier_damping_factor(mut self, factor: f64) -> Self {
        self.outlier_damping_factor = Some(factor);
        self
    }

    /// Set the missing fraction above which a row is considered sparse.
    pub fn sparse_row_threshold(mut self, threshold: f64) -> Self {
        self.sparse_row_threshold = Some(threshold);
        self
    }

    /// Set the parseable share that marks a text column as contaminated numeric.
    pub fn mixed_numeric_ratio(mut self, ratio: f64) -> Self {
        self.mixed_numeric_ratio = Some(ratio);
        self
    }

    /// Set the sentinel written into missing text cells.
    pub fn missing_sentinel(mut self, sentinel: impl Into<String>) -> Self {
        self.missing_sentinel = Some(sentinel.into());
        self
    }

    /// Set the per-attempt timeout schedule for the external answer service.
    pub fn fallback_timeouts_secs(mut self, timeouts: Vec<u64>) -> Self {
        self.fallback_timeouts_secs = Some(timeouts);
        self
    }

    /// Build the configuration.
    ///
    /// Returns a validated `AnalysisConfig` or an error if validation fails.
    pub fn build(self) -> Result<AnalysisConfig, ConfigValidationError> {
        let defaults = AnalysisConfig::default();
        let config = AnalysisConfig {
            fuzzy_threshold: self.fuzzy_threshold.unwrap_or(defaults.fuzzy_threshold),
            strict_fuzzy_threshold: self
                .strict_fuzzy_threshold
                .unwrap_or(defaults.strict_fuzzy_threshold),
            iqr_multiplier: self.iqr_multiplier.unwrap_or(defaults.iqr_multiplier),
            outlier_damping_factor: self
                .outlier_damping_factor
                .unwrap_or(defaults.outlier_damping_factor),
            sparse_row_threshold: self
                .sparse_row_threshold
                .unwrap_or(defaults.sparse_row_threshold),
            mixed_numeric_ratio: self
                .mixed_numeric_ratio
                .unwrap_or(defaults.mixed_numeric_ratio),
            missing_sentinel: self.missing_sentinel.unwrap_or(defaults.missing_sentinel),
            fallback_timeouts_secs: self
                .fallback_timeouts_secs
                .unwrap_or(defaults.fallback_timeouts_secs),
        };

        config.validate()?;
        Ok(config)
    }
}
