//! Report generation module.
//!
//! This module writes run artifacts to an output directory and renders the
//! human-readable profile summary.
//!
//! # Artifacts
//!
//! For an input named `trial.csv`:
//! - `trial_profile.json`: profile report plus type detections
//! - `cleaned_trial.csv`: the cleaned dataset
//! - `cleaning_pipeline.py`: the replay script (name configurable)
//! - `trial_audit.json`: audit entries, newest first
//!
//! # Example
//!
//! ```rust,ignore
//! use sci_clean::reporting::{ReportGenerator, render_summary};
//!
//! println!("{}", render_summary(&run, 80));
//!
//! let generator = ReportGenerator::new("outputs");
//! generator.write_profile(&run)?;
//! generator.write_dataset(&run.report.file_name, &session.export_dataset()?)?;
//! ```

mod generator;

pub use generator::{ProfileDocument, ReportGenerator, file_stem, render_summary};
