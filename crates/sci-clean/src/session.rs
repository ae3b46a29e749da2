//! Operator flow over a finished profiling run.
//!
//! A [`CleaningSession`] pairs a [`ProfileRun`] with a [`ConfirmationStore`].
//! The operator confirms column types (one by one, or by accepting the
//! detections), and exports become available once nothing is pending.

use crate::audit::{AuditEntry, AuditSink, ExportMethod};
use crate::config::ExportConfig;
use crate::confirmation::{ConfirmationStore, ConfirmedSchema};
use crate::error::{CleaningError, Result, ResultExt};
use crate::export::{CleanedDataset, ExportGenerator, cleaned_file_name};
use crate::pipeline::ProfileRun;
use crate::types::{ConfirmedType, DataType};
use std::sync::Arc;
use tracing::{debug, info};

/// Confirmation and export state for one profiled file.
pub struct CleaningSession {
    run: ProfileRun,
    store: ConfirmationStore,
    config: ExportConfig,
    audit_sink: Arc<dyn AuditSink>,
}

static_assertions::assert_impl_all!(CleaningSession: Send);

impl CleaningSession {
    /// Start a session with the default export configuration.
    pub fn new(run: ProfileRun, audit_sink: Arc<dyn AuditSink>) -> Self {
        Self::with_config(run, audit_sink, ExportConfig::default())
    }

    pub fn with_config(run: ProfileRun, audit_sink: Arc<dyn AuditSink>, config: ExportConfig) -> Self {
        let store = ConfirmationStore::new(run.header());
        Self {
            run,
            store,
            config,
            audit_sink,
        }
    }

    pub fn run(&self) -> &ProfileRun {
        &self.run
    }

    pub fn store(&self) -> &ConfirmationStore {
        &self.store
    }

    pub fn config(&self) -> &ExportConfig {
        &self.config
    }

    /// Confirm the type of a column, replacing any earlier choice.
    pub fn confirm(&mut self, column: &str, data_type: DataType) -> Result<&ConfirmedType> {
        if !self.store.has_column(column) {
            return Err(CleaningError::UnknownColumn(column.to_string()));
        }
        self.audit_sink
            .record(AuditEntry::type_confirmed(column, data_type.as_str()));
        Ok(self.store.confirm(column, data_type))
    }

    /// Confirm the detected type of a column.
    pub fn accept_detected(&mut self, column: &str) -> Result<&ConfirmedType> {
        let detected = self
            .run
            .inference(column)
            .map(|inference| inference.detected_type)
            .ok_or_else(|| CleaningError::UnknownColumn(column.to_string()))?;
        self.confirm(column, detected)
    }

    /// Confirm the detected type of every pending column whose confidence
    /// reaches `threshold`. Returns how many columns were confirmed.
    ///
    /// Columns the operator already confirmed keep their choice.
    pub fn accept_all_confirmed_above(&mut self, threshold: u8) -> Result<usize> {
        let mut accepted = 0;
        for column in self.store.pending_columns() {
            let confident = self
                .run
                .inference(&column)
                .is_some_and(|inference| inference.confidence >= threshold);
            if confident {
                self.accept_detected(&column)?;
                accepted += 1;
            }
        }
        debug!("Accepted {} detected types at confidence >= {}", accepted, threshold);
        Ok(accepted)
    }

    /// Distinct columns still awaiting confirmation, in header order.
    pub fn pending_columns(&self) -> Vec<String> {
        self.store.pending_columns()
    }

    pub fn is_export_ready(&self) -> bool {
        self.store.is_complete()
    }

    /// Seal the confirmations, failing while any column is pending.
    pub fn schema(&self) -> Result<ConfirmedSchema> {
        self.store.seal()
    }

    /// Name of the cleaned file written for this run.
    pub fn cleaned_file_name(&self) -> String {
        cleaned_file_name(&self.run.report.file_name)
    }

    /// Build the cleaned dataset from the confirmed types.
    pub fn export_dataset(&self) -> Result<CleanedDataset> {
        let schema = self.schema().context("Exporting cleaned dataset")?;
        let dataset = ExportGenerator::new(&schema, &self.config)
            .cleaned_dataset(&self.run.table, &self.run.cleaned_rows)?;

        info!(
            "Exported {} rows x {} columns ({} empty cells)",
            dataset.row_count(),
            dataset.column_count(),
            dataset.empty_cells()
        );
        self.audit_sink.record(AuditEntry::export_csv(
            &self.cleaned_file_name(),
            dataset.row_count(),
        ));
        Ok(dataset)
    }

    /// Render the replay script from the confirmed types.
    pub fn export_script(&self, method: ExportMethod) -> Result<String> {
        let schema = self.schema().context("Exporting cleaning script")?;
        let script = ExportGenerator::new(&schema, &self.config).script(&self.run.report);

        self.audit_sink
            .record(AuditEntry::export_script(method, &self.run.report.file_hash));
        Ok(script)
    }
}
