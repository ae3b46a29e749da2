//! Main profiling pipeline.
//!
//! This module provides the [`Pipeline`] struct and its builder. A pipeline
//! turns raw file bytes into a [`ProfileRun`]: the immutable profile report,
//! one type detection per column, and the parsed and imputed rows that
//! export reads from.

use crate::audit::{AuditEntry, AuditSink};
use crate::config::{ConfigValidationError, PipelineConfig};
use crate::error::{Result, ResultExt};
use crate::fingerprint::Fingerprint;
use crate::imputers::ForwardFillImputer;
use crate::parser::RawTable;
use crate::pipeline::outliers::{AnomalyDetector, AnomalySummary};
use crate::pipeline::progress::{
    ClosureProgressReporter, ProfilingStage, ProgressReporter, ProgressUpdate,
};
use crate::profiler::{DataProfiler, TypeClassifier};
use crate::types::{
    CleanedRow, ColumnProfile, ProfileReport, TypeInferenceResult, sparsity_score,
};
use std::path::Path;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, error, info};

/// Everything one profiling run produced.
///
/// The report and detections are final; export reads the parsed table (and
/// the imputed rows when forward filling is enabled) from here.
#[derive(Debug, Clone)]
pub struct ProfileRun {
    pub report: ProfileReport,
    /// One detection per column, in header order.
    pub inferences: Vec<TypeInferenceResult>,
    pub table: RawTable,
    /// Forward-filled rows aligned to the header.
    pub cleaned_rows: Vec<CleanedRow>,
    /// Numeric flag per column, as detected by the imputer.
    pub numeric_columns: Vec<bool>,
}

impl ProfileRun {
    /// Detection for a column name (first match in header order).
    pub fn inference(&self, column: &str) -> Option<&TypeInferenceResult> {
        self.inferences.iter().find(|r| r.column_name == column)
    }

    /// Columns whose detection falls below `threshold`, in header order.
    pub fn ambiguous_columns(&self, threshold: u8) -> Vec<&TypeInferenceResult> {
        self.inferences
            .iter()
            .filter(|r| r.is_ambiguous_at(threshold))
            .collect()
    }

    pub fn header(&self) -> &[String] {
        self.table.header()
    }
}

static_assertions::assert_impl_all!(ProfileRun: Send, Sync);

/// Results of the parse/analysis chain, before the fingerprint joins in.
struct Analysis {
    table: RawTable,
    profiles: Vec<ColumnProfile>,
    cleaned_rows: Vec<CleanedRow>,
    numeric_columns: Vec<bool>,
    anomalies: AnomalySummary,
    inferences: Vec<TypeInferenceResult>,
}

/// The main profiling pipeline.
///
/// Use [`Pipeline::builder()`] to create a new pipeline with custom configuration.
///
/// # Example
///
/// ```rust,ignore
/// use sci_clean::{AuditLog, Pipeline, PipelineConfig};
/// use std::sync::Arc;
///
/// let audit = Arc::new(AuditLog::new());
/// let run = Pipeline::builder()
///     .config(PipelineConfig::default())
///     .audit_sink(audit.clone())
///     .on_progress(|update| {
///         println!("[{:.0}%] {}", update.progress * 100.0, update.message);
///     })
///     .build()?
///     .profile_file("trial.csv")?;
///
/// println!("{} rows, {} anomalies", run.report.row_count, run.report.anomalies_found);
/// ```
pub struct Pipeline {
    config: PipelineConfig,
    progress_reporter: Option<Arc<dyn ProgressReporter>>,
    audit_sink: Option<Arc<dyn AuditSink>>,
}

// Pipeline runs on a worker thread and is shared across rayon tasks
static_assertions::assert_impl_all!(Pipeline: Send, Sync);

impl Pipeline {
    /// Create a new pipeline builder.
    pub fn builder() -> PipelineBuilder {
        PipelineBuilder::default()
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Read a file from disk and profile it.
    pub fn profile_file(&self, path: impl AsRef<Path>) -> Result<ProfileRun> {
        let path = path.as_ref();
        let bytes = std::fs::read(path).context(format!("Failed to read {}", path.display()))?;
        let file_name = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());

        self.profile(&bytes, &file_name, bytes.len() as u64)
    }

    /// Profile raw file bytes.
    ///
    /// Fingerprinting runs concurrently with the parse/analysis chain; the
    /// report is assembled once both are done.
    pub fn profile(&self, bytes: &[u8], file_name: &str, file_size: u64) -> Result<ProfileRun> {
        match self.profile_internal(bytes, file_name, file_size) {
            Ok(run) => {
                self.report_progress(ProgressUpdate::complete("Profiling complete"));
                Ok(run)
            }
            Err(e) => {
                self.report_progress(ProgressUpdate::failed(e.to_string()));
                error!("Profiling error: {}", e);
                Err(e)
            }
        }
    }

    /// Report progress if a reporter is configured.
    fn report_progress(&self, update: ProgressUpdate) {
        if let Some(reporter) = &self.progress_reporter {
            reporter.report(update);
        }
    }

    /// Record an audit entry if a sink is configured.
    fn record(&self, entry: AuditEntry) {
        if let Some(sink) = &self.audit_sink {
            sink.record(entry);
        }
    }

    fn profile_internal(&self, bytes: &[u8], file_name: &str, file_size: u64) -> Result<ProfileRun> {
        let start_time = Instant::now();

        info!("Profiling {} ({} bytes)...", file_name, file_size);
        self.record(AuditEntry::upload_start(file_name, file_size));
        self.report_progress(ProgressUpdate::new(
            ProfilingStage::Initializing,
            0.0,
            format!("Starting analysis of {}", file_name),
        ));

        // must precede the join, which reports later stages from analyze
        self.report_progress(ProgressUpdate::new(
            ProfilingStage::Fingerprinting,
            0.0,
            "Computing SHA-256 fingerprint...",
        ));
        let (fingerprint, analysis) =
            rayon::join(|| Fingerprint::of_bytes(bytes), || self.analyze(bytes));

        self.record(AuditEntry::upload_complete(
            file_name,
            file_size,
            fingerprint.as_str(),
        ));

        let Analysis {
            table,
            profiles,
            cleaned_rows,
            numeric_columns,
            anomalies,
            inferences,
        } = analysis;

        let total_missing: usize = profiles.iter().map(|p| p.missing_count).sum();
        let report = ProfileReport {
            file_name: file_name.to_string(),
            file_size,
            file_hash: fingerprint.into_string(),
            row_count: table.row_count(),
            column_count: table.column_count(),
            sparsity_score: sparsity_score(total_missing, table.row_count(), table.column_count()),
            anomalies_found: anomalies.anomalies_found(),
            column_profiles: profiles,
            processing_time: start_time.elapsed().as_secs_f64(),
        };

        info!(
            "Profiled {} rows x {} columns in {:.3}s: sparsity {:.1}%, {} anomalous rows",
            report.row_count,
            report.column_count,
            report.processing_time,
            report.sparsity_score,
            report.anomalies_found
        );

        self.record(AuditEntry::analysis_complete(
            report.row_count,
            report.column_count,
            report.sparsity_score,
            report.anomalies_found,
        ));
        for inference in &inferences {
            self.record(AuditEntry::type_detected(
                &inference.column_name,
                inference.detected_type.as_str(),
                inference.confidence,
            ));
        }

        Ok(ProfileRun {
            report,
            inferences,
            table,
            cleaned_rows,
            numeric_columns,
        })
    }

    /// Parse, profile, impute, detect anomalies and infer types.
    fn analyze(&self, bytes: &[u8]) -> Analysis {
        let parallel = self.config.parallel_columns;

        self.report_progress(ProgressUpdate::new(
            ProfilingStage::Parsing,
            0.0,
            "Parsing rows...",
        ));
        let table = RawTable::parse_bytes(bytes);
        debug!(
            "Parsed {} rows x {} columns",
            table.row_count(),
            table.column_count()
        );

        self.report_progress(ProgressUpdate::new(
            ProfilingStage::Profiling,
            0.0,
            "Profiling columns...",
        ));
        let mut profiles = DataProfiler::profile_columns(&table, &self.config);

        self.report_progress(ProgressUpdate::new(
            ProfilingStage::Imputation,
            0.0,
            "Forward-filling missing values...",
        ));
        let numeric_columns = ForwardFillImputer::detect_numeric_columns(&table);
        let cleaned_rows = ForwardFillImputer::impute(&table, &numeric_columns, parallel);

        self.report_progress(ProgressUpdate::new(
            ProfilingStage::AnomalyDetection,
            0.0,
            "Detecting anomalies...",
        ));
        let anomalies =
            AnomalyDetector::new(&self.config).detect(&cleaned_rows, &numeric_columns, parallel);
        anomalies.apply_to(&mut profiles);

        let classifier = TypeClassifier::new(&self.config);
        let total = profiles.len();
        let inferences = profiles
            .iter()
            .enumerate()
            .map(|(index, profile)| {
                self.report_progress(ProgressUpdate::with_items(
                    ProfilingStage::TypeInference,
                    format!("Column: {}", profile.name),
                    index,
                    total,
                    format!("Inferring type of {}", profile.name),
                ));
                let inference = classifier.infer(profile);
                debug!(
                    "  {}: {} ({}%)",
                    inference.column_name, inference.detected_type, inference.confidence
                );
                inference
            })
            .collect();

        Analysis {
            table,
            profiles,
            cleaned_rows,
            numeric_columns,
            anomalies,
            inferences,
        }
    }
}

/// Builder for creating a [`Pipeline`] instance.
///
/// Use [`Pipeline::builder()`] to get started.
#[derive(Default)]
pub struct PipelineBuilder {
    config: Option<PipelineConfig>,
    progress_reporter: Option<Arc<dyn ProgressReporter>>,
    audit_sink: Option<Arc<dyn AuditSink>>,
}

static_assertions::assert_impl_all!(PipelineBuilder: Send);

impl PipelineBuilder {
    /// Set the pipeline configuration.
    pub fn config(mut self, config: PipelineConfig) -> Self {
        self.config = Some(config);
        self
    }

    /// Set a progress reporter for receiving updates during profiling.
    pub fn progress_reporter(mut self, reporter: Arc<dyn ProgressReporter>) -> Self {
        self.progress_reporter = Some(reporter);
        self
    }

    /// Set a progress callback closure.
    ///
    /// For more complex scenarios, use [`progress_reporter`](Self::progress_reporter).
    pub fn on_progress<F>(mut self, callback: F) -> Self
    where
        F: Fn(ProgressUpdate) + Send + Sync + 'static,
    {
        self.progress_reporter = Some(Arc::new(ClosureProgressReporter::new(callback)));
        self
    }

    /// Set the sink that receives upload, analysis and detection events.
    pub fn audit_sink(mut self, sink: Arc<dyn AuditSink>) -> Self {
        self.audit_sink = Some(sink);
        self
    }

    /// Build the pipeline.
    ///
    /// Returns an error if the configuration is invalid.
    pub fn build(self) -> std::result::Result<Pipeline, ConfigValidationError> {
        let config = self.config.unwrap_or_default();
        config.validate()?;

        Ok(Pipeline {
            config,
            progress_reporter: self.progress_reporter,
            audit_sink: self.audit_sink,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audit::{AuditAction, AuditLog};
    use crate::types::DataType;
    use parking_lot::Mutex;
    use pretty_assertions::assert_eq;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn profile(text: &str) -> ProfileRun {
        Pipeline::builder()
            .build()
            .unwrap()
            .profile(text.as_bytes(), "test.csv", text.len() as u64)
            .unwrap()
    }

    #[test]
    fn test_pipeline_builder_default() {
        let pipeline = Pipeline::builder().build().unwrap();
        assert!(pipeline.progress_reporter.is_none());
        assert!(pipeline.audit_sink.is_none());
        assert_eq!(pipeline.config(), &PipelineConfig::default());
    }

    #[test]
    fn test_pipeline_builder_rejects_invalid_config() {
        let config = PipelineConfig {
            sample_size: 0,
            ..PipelineConfig::default()
        };
        assert!(Pipeline::builder().config(config).build().is_err());
    }

    #[test]
    fn test_profile_scenario() {
        let run = profile("a,b\n1,x\n,y\n2,");
        let report = &run.report;

        assert_eq!(report.file_name, "test.csv");
        assert_eq!(report.row_count, 3);
        assert_eq!(report.column_count, 2);
        assert_eq!(report.column("a").unwrap().missing_count, 1);
        assert_eq!(report.column("b").unwrap().missing_count, 1);
        assert!((report.sparsity_score - 100.0 * 2.0 / 6.0).abs() < 1e-9);

        let header = run.header();
        assert_eq!(run.cleaned_rows[1].get(header, "a"), Some("1"));
        assert_eq!(run.cleaned_rows[2].get(header, "b"), Some("y"));
        assert_eq!(run.numeric_columns, vec![true, false]);
    }

    #[test]
    fn test_report_hash_matches_fingerprint() {
        let text = "a,b\n1,x\n";
        let run = profile(text);
        assert_eq!(
            run.report.file_hash,
            Fingerprint::of_bytes(text.as_bytes()).into_string()
        );
    }

    #[test]
    fn test_empty_input_gives_empty_report() {
        let run = profile("only,a,header\n");
        assert!(run.report.is_empty());
        assert_eq!(run.report.column_count, 0);
        assert_eq!(run.report.sparsity_score, 0.0);
        assert_eq!(run.report.anomalies_found, 0);
        assert_eq!(run.report.file_hash.len(), 64);
        assert!(run.inferences.is_empty());
    }

    #[test]
    fn test_inferences_in_header_order() {
        let run = profile("flag,when,name\n1,2024-01-01,ann\n0,2024-01-02,bob\n1,2024-01-03,cy");
        let detected: Vec<DataType> = run.inferences.iter().map(|r| r.detected_type).collect();
        assert_eq!(detected, vec![DataType::Boolean, DataType::Date, DataType::Text]);
        assert_eq!(run.inference("when").unwrap().confidence, 90);
        assert_eq!(run.ambiguous_columns(80).len(), 1);
    }

    #[test]
    fn test_anomalies_reach_report() {
        let mut text = String::from("v,w\n");
        for _ in 0..12 {
            text.push_str("10,1\n");
        }
        text.push_str("1000,-500\n");
        let run = profile(&text);

        assert_eq!(run.report.column("v").unwrap().anomalies_in_column, 1);
        assert_eq!(run.report.column("w").unwrap().anomalies_in_column, 1);
        assert_eq!(run.report.anomalies_found, 1);
        assert!(run.report.anomalies_found <= run.report.total_column_anomalies());
    }

    #[test]
    fn test_audit_events() {
        let audit = Arc::new(AuditLog::new());
        Pipeline::builder()
            .audit_sink(audit.clone())
            .build()
            .unwrap()
            .profile(b"a,b\n1,x\n", "a.csv", 8)
            .unwrap();

        let actions: Vec<AuditAction> = audit.entries().iter().map(|e| e.action).collect();
        assert_eq!(
            actions,
            vec![
                AuditAction::UploadStart,
                AuditAction::UploadComplete,
                AuditAction::AnalysisComplete,
                AuditAction::TypeDetected,
                AuditAction::TypeDetected,
            ]
        );
        let complete = &audit.with_action(AuditAction::UploadComplete)[0];
        assert_eq!(complete.details["fileName"], "a.csv");
        assert_eq!(complete.details["fileSize"], 8);
        assert_eq!(complete.details["hash"].as_str().unwrap().len(), 64);

        let analysis = &audit.with_action(AuditAction::AnalysisComplete)[0];
        assert_eq!(analysis.details["rowCount"], 1);
        assert_eq!(analysis.details["columnCount"], 2);
        assert_eq!(analysis.details["sparsity"], 0.0);
        assert_eq!(analysis.details["anomalies"], 0);
    }

    #[test]
    fn test_progress_never_decreases() {
        let values = Arc::new(Mutex::new(Vec::new()));
        let seen = values.clone();

        Pipeline::builder()
            .on_progress(move |update| seen.lock().push((update.stage, update.progress)))
            .build()
            .unwrap()
            .profile(b"a,b,c\n1,x,2020-01-01\n2,y,\n3,z,2020-01-03\n", "a.csv", 42)
            .unwrap();

        let values = values.lock();
        assert_eq!(values[1].0, ProfilingStage::Fingerprinting);
        for pair in values.windows(2) {
            assert!(pair[0].1 <= pair[1].1, "progress went back: {pair:?}");
        }
    }

    #[test]
    fn test_progress_ends_with_complete() {
        let stages = Arc::new(Mutex::new(Vec::new()));
        let seen = stages.clone();
        let count = Arc::new(AtomicUsize::new(0));
        let counter = count.clone();

        Pipeline::builder()
            .on_progress(move |update| {
                counter.fetch_add(1, Ordering::SeqCst);
                seen.lock().push(update.stage);
            })
            .build()
            .unwrap()
            .profile(b"a\n1\n2\n", "a.csv", 6)
            .unwrap();

        let stages = stages.lock();
        assert_eq!(stages.first(), Some(&ProfilingStage::Initializing));
        assert_eq!(stages.last(), Some(&ProfilingStage::Complete));
        assert!(stages.contains(&ProfilingStage::Fingerprinting));
        assert!(stages.contains(&ProfilingStage::TypeInference));
        assert_eq!(count.load(Ordering::SeqCst), stages.len());
    }

    #[test]
    fn test_profile_is_deterministic() {
        let text = "a,b,c\n1, x,2020-01-01\nNA,y,\n3,x ,2020-01-03";
        let first = profile(text);
        let second = profile(text);
        assert_eq!(first.inferences, second.inferences);
        assert_eq!(first.report.column_profiles, second.report.column_profiles);
        assert_eq!(first.cleaned_rows, second.cleaned_rows);
    }

    #[test]
    fn test_profile_file_missing_is_io_error() {
        let err = Pipeline::builder()
            .build()
            .unwrap()
            .profile_file("/definitely/not/here.csv")
            .unwrap_err();
        assert_eq!(err.error_code(), "IO_ERROR");
    }
}
