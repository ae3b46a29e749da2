//! Pipeline module.
//!
//! This module provides the profiling pipeline and its stages: forward-fill
//! imputation feeds anomaly detection, which feeds the profile report.

mod builder;
pub mod outliers;
pub mod progress;

pub use builder::{Pipeline, PipelineBuilder, ProfileRun};
pub use outliers::{AnomalyDetector, AnomalySummary, ColumnAnomalies};
pub use progress::{ClosureProgressReporter, ProfilingStage, ProgressReporter, ProgressUpdate};
