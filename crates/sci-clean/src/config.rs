//! Configuration types for the profiling pipeline.
//!
//! This module provides configuration options using the builder pattern.
//! Every default reproduces the fixed constants of the profiling heuristics,
//! so `PipelineConfig::default()` is the reference behavior.

use serde::{Deserialize, Serialize};

/// Default number of sample values kept per column.
pub const DEFAULT_SAMPLE_SIZE: usize = 10;

/// Default file name of the generated cleaning script.
pub const DEFAULT_SCRIPT_NAME: &str = "cleaning_pipeline.py";

/// Export options.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExportConfig {
    /// Coerce the forward-filled rows instead of the raw rows.
    /// Default: false
    pub forward_fill: bool,

    /// File name used when the script is written to disk.
    /// Default: "cleaning_pipeline.py"
    pub script_name: String,
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            forward_fill: false,
            script_name: DEFAULT_SCRIPT_NAME.to_string(),
        }
    }
}

/// Configuration for the profiling pipeline.
///
/// Use [`PipelineConfig::builder()`] to create a new configuration
/// with fluent API.
///
/// # Example
///
/// ```rust,ignore
/// use sci_clean::config::PipelineConfig;
///
/// let config = PipelineConfig::builder()
///     .z_score_threshold(3.5)
///     .parallel_columns(false)
///     .build()?;
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Number of leading non-missing values kept as column samples.
    /// Default: 10
    pub sample_size: usize,

    /// Absolute z-score above which a value is anomalous.
    /// Default: 3.0
    pub z_score_threshold: f64,

    /// Minimum count of numeric values before anomaly detection runs.
    /// Default: 3
    pub min_anomaly_samples: usize,

    /// Coefficient of variation above which a column gets a
    /// high-variance warning.
    /// Default: 1.0
    pub high_variance_cv: f64,

    /// Fraction of date-like samples required for a DATE column.
    /// Default: 0.7
    pub date_fraction_threshold: f64,

    /// Maximum distinct sample values for a CATEGORICAL column.
    /// Default: 10
    pub categorical_max_unique: usize,

    /// Distinct-to-sample ratio below which a column is CATEGORICAL.
    /// Default: 0.6
    pub categorical_max_ratio: f64,

    /// Confidence below which an inferred type is flagged ambiguous.
    /// Default: 80
    pub ambiguity_threshold: u8,

    /// Profile, impute and scan columns on the rayon pool.
    /// Default: true
    pub parallel_columns: bool,

    /// Export options.
    pub export: ExportConfig,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            sample_size: DEFAULT_SAMPLE_SIZE,
            z_score_threshold: 3.0,
            min_anomaly_samples: 3,
            high_variance_cv: 1.0,
            date_fraction_threshold: 0.7,
            categorical_max_unique: 10,
            categorical_max_ratio: 0.6,
            ambiguity_threshold: 80,
            parallel_columns: true,
            export: ExportConfig::default(),
        }
    }
}

impl PipelineConfig {
    /// Create a new configuration builder.
    pub fn builder() -> PipelineConfigBuilder {
        PipelineConfigBuilder::default()
    }

    /// Load a configuration from a JSON document.
    ///
    /// Missing fields take their defaults. The result is validated.
    pub fn from_json(json: &str) -> crate::error::Result<Self> {
        let config: PipelineConfig = serde_json::from_str(json)?;
        config
            .validate()
            .map_err(|e| crate::error::CleaningError::InvalidConfig(e.to_string()))?;
        Ok(config)
    }

    /// Validate the configuration and return errors if invalid.
    pub fn validate(&self) -> Result<(), ConfigValidationError> {
        if self.sample_size == 0 {
            return Err(ConfigValidationError::InvalidSampleSize(self.sample_size));
        }

        if !(self.z_score_threshold.is_finite() && self.z_score_threshold > 0.0) {
            return Err(ConfigValidationError::InvalidThreshold {
                field: "z_score_threshold".to_string(),
                value: self.z_score_threshold,
            });
        }

        if !(self.high_variance_cv.is_finite() && self.high_variance_cv > 0.0) {
            return Err(ConfigValidationError::InvalidThreshold {
                field: "high_variance_cv".to_string(),
                value: self.high_variance_cv,
            });
        }

        // sample standard deviation needs two degrees of freedom
        if self.min_anomaly_samples < 3 {
            return Err(ConfigValidationError::InvalidMinSamples(
                self.min_anomaly_samples,
            ));
        }

        for (field, value) in [
            ("date_fraction_threshold", self.date_fraction_threshold),
            ("categorical_max_ratio", self.categorical_max_ratio),
        ] {
            if !(value > 0.0 && value <= 1.0) {
                return Err(ConfigValidationError::InvalidRatio {
                    field: field.to_string(),
                    value,
                });
            }
        }

        if self.ambiguity_threshold > 100 {
            return Err(ConfigValidationError::InvalidConfidence(
                self.ambiguity_threshold,
            ));
        }

        if self.export.script_name.trim().is_empty() {
            return Err(ConfigValidationError::EmptyScriptName);
        }

        Ok(())
    }
}

/// Errors that can occur during configuration validation.
#[derive(Debug, thiserror::Error)]
pub enum ConfigValidationError {
    #[error("Invalid sample size: {0} (must be at least 1)")]
    InvalidSampleSize(usize),

    #[error("Invalid threshold for '{field}': {value} (must be a positive number)")]
    InvalidThreshold { field: String, value: f64 },

    #[error("Invalid ratio for '{field}': {value} (must be in (0.0, 1.0])")]
    InvalidRatio { field: String, value: f64 },

    #[error("Invalid minimum anomaly samples: {0} (must be at least 3)")]
    InvalidMinSamples(usize),

    #[error("Invalid ambiguity threshold: {0} (must be at most 100)")]
    InvalidConfidence(u8),

    #[error("Script name must not be empty")]
    EmptyScriptName,
}

/// Builder for [`PipelineConfig`] with fluent API.
#[derive(Debug, Default)]
pub struct PipelineConfigBuilder {
    sample_size: Option<usize>,
    z_score_threshold: Option<f64>,
    min_anomaly_samples: Option<usize>,
    high_variance_cv: Option<f64>,
    date_fraction_threshold: Option<f64>,
    categorical_max_unique: Option<usize>,
    categorical_max_ratio: Option<f64>,
    ambiguity_threshold: Option<u8>,
    parallel_columns: Option<bool>,
    forward_fill: Option<bool>,
    script_name: Option<String>,
}

impl PipelineConfigBuilder {
    /// Set how many leading non-missing values are kept per column.
    pub fn sample_size(mut self, size: usize) -> Self {
        self.sample_size = Some(size);
        self
    }

    /// Set the absolute z-score that marks an anomaly.
    pub fn z_score_threshold(mut self, threshold: f64) -> Self {
        self.z_score_threshold = Some(threshold);
        self
    }

    /// Set the minimum numeric count required for anomaly detection.
    pub fn min_anomaly_samples(mut self, count: usize) -> Self {
        self.min_anomaly_samples = Some(count);
        self
    }

    /// Set the coefficient of variation that triggers a high-variance warning.
    pub fn high_variance_cv(mut self, cv: f64) -> Self {
        self.high_variance_cv = Some(cv);
        self
    }

    /// Set the fraction of date-like samples needed for a DATE column.
    pub fn date_fraction_threshold(mut self, fraction: f64) -> Self {
        self.date_fraction_threshold = Some(fraction);
        self
    }

    /// Set the maximum number of distinct values of a CATEGORICAL column.
    pub fn categorical_max_unique(mut self, count: usize) -> Self {
        self.categorical_max_unique = Some(count);
        self
    }

    /// Set the distinct-to-sample ratio bound of a CATEGORICAL column.
    pub fn categorical_max_ratio(mut self, ratio: f64) -> Self {
        self.categorical_max_ratio = Some(ratio);
        self
    }

    /// Set the confidence below which a detection is ambiguous.
    pub fn ambiguity_threshold(mut self, confidence: u8) -> Self {
        self.ambiguity_threshold = Some(confidence);
        self
    }

    /// Enable or disable per-column parallelism.
    pub fn parallel_columns(mut self, parallel: bool) -> Self {
        self.parallel_columns = Some(parallel);
        self
    }

    /// Export forward-filled rows instead of raw rows.
    pub fn forward_fill_export(mut self, enable: bool) -> Self {
        self.forward_fill = Some(enable);
        self
    }

    /// Set the file name of the generated script.
    pub fn script_name(mut self, name: impl Into<String>) -> Self {
        self.script_name = Some(name.into());
        self
    }

    /// Build the configuration.
    ///
    /// Returns a validated `PipelineConfig` or an error if validation fails.
    pub fn build(self) -> Result<PipelineConfig, ConfigValidationError> {
        let defaults = PipelineConfig::default();
        let config = PipelineConfig {
            sample_size: self.sample_size.unwrap_or(defaults.sample_size),
            z_score_threshold: self.z_score_threshold.unwrap_or(defaults.z_score_threshold),
            min_anomaly_samples: self
                .min_anomaly_samples
                .unwrap_or(defaults.min_anomaly_samples),
            high_variance_cv: self.high_variance_cv.unwrap_or(defaults.high_variance_cv),
            date_fraction_threshold: self
                .date_fraction_threshold
                .unwrap_or(defaults.date_fraction_threshold),
            categorical_max_unique: self
                .categorical_max_unique
                .unwrap_or(defaults.categorical_max_unique),
            categorical_max_ratio: self
                .categorical_max_ratio
                .unwrap_or(defaults.categorical_max_ratio),
            ambiguity_threshold: self
                .ambiguity_threshold
                .unwrap_or(defaults.ambiguity_threshold),
            parallel_columns: self.parallel_columns.unwrap_or(defaults.parallel_columns),
            export: ExportConfig {
                forward_fill: self.forward_fill.unwrap_or(defaults.export.forward_fill),
                script_name: self.script_name.unwrap_or(defaults.export.script_name),
            },
        };

        config.validate()?;
        Ok(config)
    }
}
