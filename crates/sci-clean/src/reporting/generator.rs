use crate::audit::AuditLog;
use crate::error::{Result, ResultExt};
use crate::export::{CleanedDataset, cleaned_file_name};
use crate::fingerprint::SHORT_FINGERPRINT_LEN;
use crate::pipeline::ProfileRun;
use crate::types::{ProfileReport, TypeInferenceResult};
use crate::utils::truncate_str;
use chrono::Local;
use serde::Serialize;
use std::fmt::Write;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::info;

/// Profile report plus per-column detections.
///
/// Written to `<stem>_profile.json` and printed by the CLI's `--json` mode.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileDocument<'a> {
    /// Timestamp when the document was generated
    pub generated_at: String,
    pub report: &'a ProfileReport,
    pub inferences: &'a [TypeInferenceResult],
}

impl<'a> ProfileDocument<'a> {
    pub fn from_run(run: &'a ProfileRun) -> Self {
        Self {
            generated_at: Local::now().format("%Y-%m-%d %H:%M:%S").to_string(),
            report: &run.report,
            inferences: &run.inferences,
        }
    }
}

/// Writes run artifacts into an output directory.
pub struct ReportGenerator {
    output_dir: PathBuf,
}

impl Default for ReportGenerator {
    fn default() -> Self {
        Self {
            output_dir: PathBuf::from("./outputs"),
        }
    }
}

impl ReportGenerator {
    pub fn new(output_dir: impl Into<PathBuf>) -> Self {
        Self {
            output_dir: output_dir.into(),
        }
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    /// Write `<stem>_profile.json`.
    pub fn write_profile(&self, run: &ProfileRun) -> Result<PathBuf> {
        let json = serde_json::to_string_pretty(&ProfileDocument::from_run(run))?;
        let name = format!("{}_profile.json", file_stem(&run.report.file_name));
        self.write_file(&name, &json)
    }

    /// Write the cleaned dataset as `cleaned_<file_name>`.
    pub fn write_dataset(&self, file_name: &str, dataset: &CleanedDataset) -> Result<PathBuf> {
        self.write_file(&cleaned_file_name(file_name), &dataset.to_csv_string())
    }

    /// Write the replay script under the given name.
    pub fn write_script(&self, script_name: &str, script: &str) -> Result<PathBuf> {
        self.write_file(script_name, script)
    }

    /// Write `<stem>_audit.json`, newest entry first.
    pub fn write_audit_log(&self, file_name: &str, log: &AuditLog) -> Result<PathBuf> {
        let json = serde_json::to_string_pretty(&log.newest_first())?;
        let name = format!("{}_audit.json", file_stem(file_name));
        self.write_file(&name, &json)
    }

    fn write_file(&self, name: &str, contents: &str) -> Result<PathBuf> {
        fs::create_dir_all(&self.output_dir).context(format!(
            "Failed to create output directory {}",
            self.output_dir.display()
        ))?;

        let path = self.output_dir.join(name);
        fs::write(&path, contents).context(format!("Failed to write {}", path.display()))?;

        info!("Saved: {}", path.display());
        Ok(path)
    }
}

/// File name without its extension, or `output` when there is none.
pub fn file_stem(file_name: &str) -> String {
    Path::new(file_name)
        .file_stem()
        .and_then(|s| s.to_str())
        .filter(|s| !s.is_empty())
        .unwrap_or("output")
        .to_string()
}

/// Human-readable profile summary.
///
/// Columns whose detection falls below `ambiguity_threshold` are marked
/// with `?` so the operator knows to review them.
pub fn render_summary(run: &ProfileRun, ambiguity_threshold: u8) -> String {
    let report = &run.report;
    let short_hash = report
        .file_hash
        .get(..SHORT_FINGERPRINT_LEN)
        .unwrap_or(&report.file_hash);

    // writing into a String cannot fail
    let mut out = String::new();
    let _ = writeln!(out, "{}", "=".repeat(80));
    let _ = writeln!(out, "PROFILE: {}", report.file_name);
    let _ = writeln!(out, "{}", "=".repeat(80));
    let _ = writeln!(out, "  SHA-256:   {}...", short_hash);
    let _ = writeln!(out, "  Size:      {} bytes", report.file_size);
    let _ = writeln!(out, "  Rows:      {}", report.row_count);
    let _ = writeln!(out, "  Columns:   {}", report.column_count);
    let _ = writeln!(out, "  Sparsity:  {:.1}%", report.sparsity_score);
    let _ = writeln!(out, "  Anomalies: {} row(s)", report.anomalies_found);
    let _ = writeln!(out, "  Time:      {:.3}s", report.processing_time);

    if report.is_empty() {
        let _ = writeln!(out);
        let _ = writeln!(out, "  No data rows found.");
        return out;
    }

    let _ = writeln!(out);
    let _ = writeln!(
        out,
        "  {:<20} {:<13} {:>5} {:>9} {:>10}  {}",
        "Column", "Detected", "Conf", "Missing %", "Anomalies", "Warnings"
    );
    let _ = writeln!(out, "  {}", "-".repeat(76));

    for (profile, inference) in report.column_profiles.iter().zip(&run.inferences) {
        let marker = if inference.is_ambiguous_at(ambiguity_threshold) {
            "?"
        } else {
            " "
        };
        let _ = writeln!(
            out,
            "  {:<20} {:<12}{} {:>4}% {:>9.1} {:>10}  {}",
            truncate_str(&profile.name, 20),
            inference.detected_type.as_str(),
            marker,
            inference.confidence,
            profile.missing_percentage,
            profile.anomalies_in_column,
            profile.warnings.join("; ")
        );
    }

    let ambiguous = run.ambiguous_columns(ambiguity_threshold);
    if !ambiguous.is_empty() {
        let _ = writeln!(out);
        let _ = writeln!(
            out,
            "  {} column(s) below {}% confidence need review (marked ?)",
            ambiguous.len(),
            ambiguity_threshold
        );
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audit::{AuditEntry, AuditSink};
    use crate::export::CleanedCell;
    use crate::types::DataType;
    use crate::pipeline::Pipeline;
    use pretty_assertions::assert_eq;
    use tempfile::TempDir;

    fn run(text: &str, file_name: &str) -> ProfileRun {
        Pipeline::builder()
            .build()
            .unwrap()
            .profile(text.as_bytes(), file_name, text.len() as u64)
            .unwrap()
    }

    #[test]
    fn test_file_stem() {
        assert_eq!(file_stem("trial.csv"), "trial");
        assert_eq!(file_stem("archive.tar.gz"), "archive.tar");
        assert_eq!(file_stem("noext"), "noext");
        assert_eq!(file_stem(""), "output");
    }

    #[test]
    fn test_write_profile() {
        let dir = TempDir::new().unwrap();
        let generator = ReportGenerator::new(dir.path());
        let run = run("a,b\n1,x\n2,y\n", "trial.csv");

        let path = generator.write_profile(&run).unwrap();
        assert_eq!(path, dir.path().join("trial_profile.json"));

        let json: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(json["report"]["fileName"], "trial.csv");
        assert_eq!(json["report"]["rowCount"], 2);
        assert_eq!(json["inferences"][0]["detectedType"], "NUMERIC");
        assert!(json["generatedAt"].is_string());
    }

    #[test]
    fn test_write_audit_log_newest_first() {
        let dir = TempDir::new().unwrap();
        let generator = ReportGenerator::new(dir.path().join("nested"));
        let log = AuditLog::new();
        log.record(AuditEntry::upload_start("trial.csv", 10));
        log.record(AuditEntry::upload_complete("trial.csv", 10, "abc"));

        let path = generator.write_audit_log("trial.csv", &log).unwrap();
        assert!(path.ends_with("nested/trial_audit.json"));

        let json: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(json[0]["action"], "UPLOAD_COMPLETE");
        assert_eq!(json[1]["action"], "UPLOAD_START");
    }

    #[test]
    fn test_write_script() {
        let dir = TempDir::new().unwrap();
        let generator = ReportGenerator::new(dir.path());

        let script = generator.write_script("cleaning_pipeline.py", "print(1)\n").unwrap();
        assert_eq!(script, dir.path().join("cleaning_pipeline.py"));
        assert_eq!(fs::read_to_string(script).unwrap(), "print(1)\n");
    }

    #[test]
    fn test_write_dataset() {
        let dir = TempDir::new().unwrap();
        let generator = ReportGenerator::new(dir.path());
        let dataset = CleanedDataset::new(
            vec!["n".to_string()],
            vec![DataType::Numeric],
            vec![vec![CleanedCell::coerce("1,000", DataType::Numeric)]],
        );

        let path = generator.write_dataset("trial.csv", &dataset).unwrap();
        assert_eq!(path, dir.path().join("cleaned_trial.csv"));
        assert_eq!(fs::read_to_string(path).unwrap(), "n\n1000\n");
    }

    #[test]
    fn test_render_summary_marks_ambiguous_columns() {
        let run = run("id,name\n1,ann\n2,bob\n3,cy\n", "people.csv");
        let summary = render_summary(&run, 80);

        assert!(summary.contains("PROFILE: people.csv"));
        assert!(summary.contains("Rows:      3"));
        assert!(summary.contains("TEXT        ?"));
        assert!(summary.contains("1 column(s) below 80% confidence"));
    }

    #[test]
    fn test_render_summary_empty() {
        let run = run("header_only\n", "empty.csv");
        let summary = render_summary(&run, 80);
        assert!(summary.contains("No data rows found."));
    }
}
