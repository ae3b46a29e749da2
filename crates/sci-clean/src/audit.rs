//! Audit trail of operator-visible events.
//!
//! Every upload, analysis, detection, confirmation and export is recorded
//! as an [`AuditEntry`] and handed to an [`AuditSink`]. Sinks are
//! fire-and-forget: recording never fails the operation that triggered it.

use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use std::fmt;
use tracing::info;

/// Kind of audited event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AuditAction {
    UploadStart,
    UploadComplete,
    AnalysisComplete,
    TypeDetected,
    TypeConfirmed,
    ExportScript,
    ExportCsv,
}

impl AuditAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::UploadStart => "UPLOAD_START",
            Self::UploadComplete => "UPLOAD_COMPLETE",
            Self::AnalysisComplete => "ANALYSIS_COMPLETE",
            Self::TypeDetected => "TYPE_DETECTED",
            Self::TypeConfirmed => "TYPE_CONFIRMED",
            Self::ExportScript => "EXPORT_SCRIPT",
            Self::ExportCsv => "EXPORT_CSV",
        }
    }
}

impl fmt::Display for AuditAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How a generated script left the session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExportMethod {
    Download,
    Clipboard,
}

impl ExportMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Download => "download",
            Self::Clipboard => "clipboard",
        }
    }
}

/// One audited event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuditEntry {
    pub timestamp: DateTime<Utc>,
    pub action: AuditAction,
    /// Free-form JSON object describing the event.
    pub details: Value,
}

impl AuditEntry {
    /// Create an entry stamped with the current UTC time.
    pub fn new(action: AuditAction, details: Value) -> Self {
        Self {
            timestamp: Utc::now(),
            action,
            details,
        }
    }

    pub fn upload_start(file_name: &str, file_size: u64) -> Self {
        Self::new(
            AuditAction::UploadStart,
            json!({ "fileName": file_name, "fileSize": file_size }),
        )
    }

    pub fn upload_complete(file_name: &str, file_size: u64, file_hash: &str) -> Self {
        Self::new(
            AuditAction::UploadComplete,
            json!({ "fileName": file_name, "fileSize": file_size, "hash": file_hash }),
        )
    }

    /// `sparsity` is a percentage, as in [`ProfileReport`](crate::types::ProfileReport).
    pub fn analysis_complete(
        row_count: usize,
        column_count: usize,
        sparsity: f64,
        anomalies: usize,
    ) -> Self {
        Self::new(
            AuditAction::AnalysisComplete,
            json!({
                "rowCount": row_count,
                "columnCount": column_count,
                "sparsity": sparsity,
                "anomalies": anomalies,
            }),
        )
    }

    pub fn type_detected(column: &str, detected_type: &str, confidence: u8) -> Self {
        Self::new(
            AuditAction::TypeDetected,
            json!({ "column": column, "type": detected_type, "confidence": confidence }),
        )
    }

    pub fn type_confirmed(column: &str, confirmed_type: &str) -> Self {
        Self::new(
            AuditAction::TypeConfirmed,
            json!({ "column": column, "type": confirmed_type }),
        )
    }

    pub fn export_script(method: ExportMethod, file_hash: &str) -> Self {
        Self::new(
            AuditAction::ExportScript,
            json!({ "method": method.as_str(), "hash": file_hash }),
        )
    }

    pub fn export_csv(file_name: &str, row_count: usize) -> Self {
        Self::new(
            AuditAction::ExportCsv,
            json!({ "fileName": file_name, "rowCount": row_count }),
        )
    }
}

/// Receiver of audit entries.
///
/// Implementations must be `Send + Sync` and must not block for long.
pub trait AuditSink: Send + Sync {
    fn record(&self, entry: AuditEntry);
}

/// Wrapper that implements [`AuditSink`] using a closure.
pub struct ClosureAuditSink<F>
where
    F: Fn(AuditEntry) + Send + Sync,
{
    callback: F,
}

impl<F> ClosureAuditSink<F>
where
    F: Fn(AuditEntry) + Send + Sync,
{
    pub fn new(callback: F) -> Self {
        Self { callback }
    }
}

impl<F> AuditSink for ClosureAuditSink<F>
where
    F: Fn(AuditEntry) + Send + Sync,
{
    fn record(&self, entry: AuditEntry) {
        (self.callback)(entry);
    }
}

/// Sink that logs each entry at info level.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingAuditSink;

impl AuditSink for TracingAuditSink {
    fn record(&self, entry: AuditEntry) {
        info!(action = %entry.action, details = %entry.details, "audit");
    }
}

/// In-memory audit log.
#[derive(Debug, Default)]
pub struct AuditLog {
    entries: Mutex<Vec<AuditEntry>>,
}

impl AuditLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Entries in recording order.
    pub fn entries(&self) -> Vec<AuditEntry> {
        self.entries.lock().clone()
    }

    /// Entries newest first, as shown in an audit listing.
    pub fn newest_first(&self) -> Vec<AuditEntry> {
        let mut entries = self.entries();
        entries.reverse();
        entries
    }

    /// Entries of one action kind, in recording order.
    pub fn with_action(&self, action: AuditAction) -> Vec<AuditEntry> {
        self.entries
            .lock()
            .iter()
            .filter(|entry| entry.action == action)
            .cloned()
            .collect()
    }

    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.lock().is_empty()
    }

    /// Serialize the log, newest first.
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(&self.newest_first())
    }
}

impl AuditSink for AuditLog {
    fn record(&self, entry: AuditEntry) {
        self.entries.lock().push(entry);
    }
}

/// Sink that discards everything.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopAuditSink;

impl AuditSink for NoopAuditSink {
    fn record(&self, _entry: AuditEntry) {}
}

static_assertions::assert_impl_all!(AuditLog: Send, Sync);
static_assertions::assert_impl_all!(AuditEntry: Send, Sync);

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[test]
    fn test_action_serializes_screaming_snake() {
        assert_eq!(
            serde_json::to_string(&AuditAction::ExportCsv).unwrap(),
            "\"EXPORT_CSV\""
        );
        assert_eq!(AuditAction::TypeConfirmed.to_string(), "TYPE_CONFIRMED");
    }

    #[test]
    fn test_audit_log_newest_first() {
        let log = AuditLog::new();
        log.record(AuditEntry::upload_start("a.csv", 10));
        log.record(AuditEntry::upload_complete("a.csv", 10, "abc"));
        log.record(AuditEntry::analysis_complete(3, 2, 16.7, 0));

        let actions: Vec<AuditAction> = log.newest_first().iter().map(|e| e.action).collect();
        assert_eq!(
            actions,
            vec![
                AuditAction::AnalysisComplete,
                AuditAction::UploadComplete,
                AuditAction::UploadStart,
            ]
        );
        assert_eq!(log.len(), 3);
    }

    #[test]
    fn test_with_action_filters() {
        let log = AuditLog::new();
        log.record(AuditEntry::type_detected("a", "NUMERIC", 98));
        log.record(AuditEntry::type_detected("b", "TEXT", 60));
        log.record(AuditEntry::type_confirmed("a", "NUMERIC"));

        let detected = log.with_action(AuditAction::TypeDetected);
        assert_eq!(detected.len(), 2);
        assert_eq!(detected[1].details["column"], "b");
        assert_eq!(detected[1].details["confidence"], 60);
    }

    #[test]
    fn test_upload_and_analysis_payloads() {
        let upload = AuditEntry::upload_complete("a.csv", 10, "abc");
        assert_eq!(upload.details["fileSize"], 10);
        assert_eq!(upload.details["hash"], "abc");

        let analysis = AuditEntry::analysis_complete(3, 2, 16.7, 1);
        assert_eq!(analysis.details["sparsity"], 16.7);
        assert_eq!(analysis.details["rowCount"], 3);
        assert_eq!(analysis.details["anomalies"], 1);
    }

    #[test]
    fn test_export_script_records_method() {
        let entry = AuditEntry::export_script(ExportMethod::Clipboard, "ff00");
        assert_eq!(entry.details["method"], "clipboard");
        assert_eq!(entry.details["hash"], "ff00");
    }

    #[test]
    fn test_closure_sink() {
        let count = Arc::new(AtomicUsize::new(0));
        let counter = count.clone();
        let sink = ClosureAuditSink::new(move |_| {
            counter.fetch_add(1, Ordering::SeqCst);
        });
        sink.record(AuditEntry::export_csv("cleaned_a.csv", 3));
        assert_eq!(count.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_audit_log_json() {
        let log = AuditLog::new();
        assert!(log.is_empty());
        log.record(AuditEntry::export_csv("cleaned_a.csv", 3));

        let json = log.to_json().unwrap();
        let parsed: Vec<AuditEntry> = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed.len(), 1);
        assert_eq!(parsed[0].action, AuditAction::ExportCsv);
    }
}
