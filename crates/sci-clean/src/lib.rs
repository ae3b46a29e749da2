//! Reproducible Data Cleaning Library
//!
//! Profiles delimited text files, lets an operator confirm column types and
//! exports a cleaned dataset together with a standalone script that
//! reproduces it from the original file.
//!
//! # Overview
//!
//! - **Fingerprinting**: SHA-256 of the raw bytes, recorded in every export
//! - **Profiling**: Missing counts, sample values and whitespace warnings per column
//! - **Type Detection**: Heuristic NUMERIC / DATE / BOOLEAN / CATEGORICAL / TEXT with a confidence tier
//! - **Imputation**: Forward fill with numeric and text fallbacks
//! - **Anomaly Detection**: Z-score flags and high-variance warnings
//! - **Confirmation Gate**: Export only runs once every column type is confirmed
//! - **Export**: Cleaned CSV, typed DataFrame and Python replay script
//! - **Audit Trail**: Upload, analysis, confirmation and export events
//!
//! # Quick Start
//!
//! ```rust,ignore
//! use sci_clean::{AuditLog, CleaningSession, ExportMethod, Pipeline};
//! use std::sync::Arc;
//!
//! let audit = Arc::new(AuditLog::new());
//! let run = Pipeline::builder()
//!     .audit_sink(audit.clone())
//!     .on_progress(|update| {
//!         println!("[{:.0}%] {}", update.progress * 100.0, update.message);
//!     })
//!     .build()?
//!     .profile_file("trial.csv")?;
//!
//! let mut session = CleaningSession::new(run, audit.clone());
//! session.accept_all_confirmed_above(80)?;
//! for column in session.pending_columns() {
//!     session.accept_detected(&column)?;
//! }
//!
//! let cleaned = session.export_dataset()?.to_csv_string();
//! let script = session.export_script(ExportMethod::Download)?;
//! ```
//!
//! # Configuration
//!
//! Use [`PipelineConfig`] to tune the heuristics:
//!
//! ```rust,ignore
//! use sci_clean::PipelineConfig;
//!
//! let config = PipelineConfig::builder()
//!     .sample_size(20)                // Values kept per column for type detection
//!     .z_score_threshold(2.5)         // Flag values further than 2.5 std from the mean
//!     .forward_fill_export(true)      // Export imputed rows instead of raw ones
//!     .build()?;
//! ```

pub mod audit;
pub mod config;
pub mod confirmation;
pub mod error;
pub mod export;
pub mod fingerprint;
pub mod imputers;
pub mod parser;
pub mod pipeline;
pub mod profiler;
pub mod reporting;
pub mod session;
pub mod types;
pub mod utils;

// Re-exports for convenient access
pub use audit::{
    AuditAction, AuditEntry, AuditLog, AuditSink, ClosureAuditSink, ExportMethod, NoopAuditSink,
    TracingAuditSink,
};
pub use config::{ConfigValidationError, ExportConfig, PipelineConfig, PipelineConfigBuilder};
pub use confirmation::{ConfirmationStore, ConfirmedSchema};
pub use error::{CleaningError, Result as CleaningResult, ResultExt};
pub use export::{CleanedCell, CleanedDataset, ExportGenerator, ScriptSource, render_script};
pub use fingerprint::Fingerprint;
pub use imputers::ForwardFillImputer;
pub use parser::RawTable;
pub use pipeline::{
    AnomalyDetector, AnomalySummary, ClosureProgressReporter, Pipeline, PipelineBuilder,
    ProfileRun, ProfilingStage, ProgressReporter, ProgressUpdate,
};
pub use profiler::{DataProfiler, TypeClassifier};
pub use reporting::{ProfileDocument, ReportGenerator, render_summary};
pub use session::CleaningSession;
pub use types::{
    CleanedRow, ColumnProfile, ConfirmedBy, ConfirmedType, DataType, ProfileReport,
    TypeInferenceResult,
};
