//! Progress reporting for the profiling pipeline.
//!
//! Progress is informational only: reporters observe the run, they never
//! steer it.
//!
//! # Example
//!
//! ```rust,ignore
//! use sci_clean::Pipeline;
//!
//! let run = Pipeline::builder()
//!     .on_progress(|update| {
//!         println!("[{:.0}%] {}", update.progress * 100.0, update.message);
//!     })
//!     .build()?
//!     .profile_file("data.csv")?;
//! ```

use serde::{Deserialize, Serialize};

/// Stages of a profiling run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProfilingStage {
    /// Run is starting
    Initializing,
    /// Hashing the raw bytes
    Fingerprinting,
    /// Splitting the text into header and rows
    Parsing,
    /// Per-column missingness, samples and whitespace checks
    Profiling,
    /// Forward-filling missing cells
    Imputation,
    /// Z-score and variance checks on numeric columns
    AnomalyDetection,
    /// Heuristic type detection
    TypeInference,
    /// Run finished and the report is assembled
    Complete,
    /// Run failed with an error
    Failed,
}

impl ProfilingStage {
    /// Returns a human-readable name for the stage.
    pub fn display_name(&self) -> &'static str {
        match self {
            Self::Initializing => "Initializing",
            Self::Fingerprinting => "Fingerprinting File",
            Self::Parsing => "Parsing Rows",
            Self::Profiling => "Profiling Columns",
            Self::Imputation => "Imputing Values",
            Self::AnomalyDetection => "Detecting Anomalies",
            Self::TypeInference => "Inferring Types",
            Self::Complete => "Complete",
            Self::Failed => "Failed",
        }
    }

    /// Share of the overall run attributed to this stage (0.0 - 1.0).
    pub fn weight(&self) -> f32 {
        match self {
            Self::Initializing => 0.02,
            Self::Fingerprinting => 0.08,
            Self::Parsing => 0.15,
            Self::Profiling => 0.25,
            Self::Imputation => 0.20,
            Self::AnomalyDetection => 0.15,
            Self::TypeInference => 0.15,
            Self::Complete | Self::Failed => 0.0,
        }
    }

    /// Cumulative progress at the start of this stage.
    pub fn base_progress(&self) -> f32 {
        match self {
            Self::Initializing => 0.0,
            Self::Fingerprinting => 0.02,
            Self::Parsing => 0.10,
            Self::Profiling => 0.25,
            Self::Imputation => 0.50,
            Self::AnomalyDetection => 0.70,
            Self::TypeInference => 0.85,
            Self::Complete => 1.0,
            Self::Failed => 0.0,
        }
    }
}

/// Progress update emitted by the pipeline.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProgressUpdate {
    /// Current pipeline stage
    pub stage: ProfilingStage,

    /// Optional sub-stage description (e.g., "Column: age")
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sub_stage: Option<String>,

    /// Overall progress (0.0 - 1.0)
    pub progress: f32,

    /// Progress within current stage (0.0 - 1.0)
    pub stage_progress: f32,

    /// Human-readable message describing current activity
    pub message: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub items_processed: Option<usize>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub items_total: Option<usize>,
}

impl ProgressUpdate {
    /// Creates a progress update for a stage.
    pub fn new(stage: ProfilingStage, stage_progress: f32, message: impl Into<String>) -> Self {
        let stage_progress = stage_progress.clamp(0.0, 1.0);
        let progress = stage.base_progress() + (stage.weight() * stage_progress);
        Self {
            stage,
            sub_stage: None,
            progress: progress.clamp(0.0, 1.0),
            stage_progress,
            message: message.into(),
            items_processed: None,
            items_total: None,
        }
    }

    /// Creates a progress update with item counts.
    pub fn with_items(
        stage: ProfilingStage,
        sub_stage: impl Into<String>,
        current: usize,
        total: usize,
        message: impl Into<String>,
    ) -> Self {
        let stage_progress = if total > 0 {
            current as f32 / total as f32
        } else {
            0.0
        };
        Self {
            sub_stage: Some(sub_stage.into()),
            items_processed: Some(current),
            items_total: Some(total),
            ..Self::new(stage, stage_progress, message)
        }
    }

    /// Creates a completion progress update.
    pub fn complete(message: impl Into<String>) -> Self {
        Self {
            progress: 1.0,
            stage_progress: 1.0,
            ..Self::new(ProfilingStage::Complete, 1.0, message)
        }
    }

    /// Creates a failed progress update.
    pub fn failed(message: impl Into<String>) -> Self {
        Self {
            progress: 0.0,
            stage_progress: 0.0,
            ..Self::new(ProfilingStage::Failed, 0.0, message)
        }
    }
}

/// Trait for receiving progress updates during profiling.
///
/// Implementations must be `Send + Sync`; the pipeline may run on a worker
/// thread while the receiver lives elsewhere.
pub trait ProgressReporter: Send + Sync {
    /// Called at each stage boundary and once per column for per-column stages.
    /// Implementations should be cheap and non-blocking.
    fn report(&self, update: ProgressUpdate);
}

/// Wrapper that implements [`ProgressReporter`] using a closure.
pub struct ClosureProgressReporter<F>
where
    F: Fn(ProgressUpdate) + Send + Sync,
{
    callback: F,
}

impl<F> ClosureProgressReporter<F>
where
    F: Fn(ProgressUpdate) + Send + Sync,
{
    /// Creates a new closure-based progress reporter.
    pub fn new(callback: F) -> Self {
        Self { callback }
    }
}

impl<F> ProgressReporter for ClosureProgressReporter<F>
where
    F: Fn(ProgressUpdate) + Send + Sync,
{
    fn report(&self, update: ProgressUpdate) {
        (self.callback)(update);
    }
}

static_assertions::assert_impl_all!(ProgressUpdate: Send, Sync);
