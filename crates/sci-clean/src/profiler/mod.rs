//! Column profiling for parsed tables.
//!
//! This module provides:
//! - Per-column missingness and sample extraction
//! - Whitespace-consistency checks
//! - Numeric summary statistics (used by anomaly detection)
//! - Heuristic semantic type inference over the extracted samples
//!
//! Type inference reads only the samples collected here, never the full
//! column. Full-column statistics are the business of the imputer and the
//! anomaly detector; the two read paths stay separate.

mod statistics;
mod type_inference;

pub use statistics::NumericSummary;
pub use type_inference::TypeClassifier;

use crate::config::PipelineConfig;
use crate::parser::RawTable;
use crate::types::{ColumnProfile, WARNING_INCONSISTENT_WHITESPACE};
use crate::utils::{is_missing, trim_value};
use rayon::prelude::*;
use std::collections::HashSet;
use tracing::debug;

/// Data profiler for per-column missingness and samples.
pub struct DataProfiler;

impl DataProfiler {
    /// Profile every column of a table, in header order.
    ///
    /// Anomaly counts start at zero; the anomaly detector fills them in.
    pub fn profile_columns(table: &RawTable, config: &PipelineConfig) -> Vec<ColumnProfile> {
        let columns = 0..table.column_count();
        let profile = |index| Self::profile_column(table, index, config.sample_size);

        if config.parallel_columns {
            columns.into_par_iter().map(profile).collect()
        } else {
            columns.map(profile).collect()
        }
    }

    /// Profile one column in a single pass over its cells.
    pub fn profile_column(table: &RawTable, index: usize, sample_size: usize) -> ColumnProfile {
        let name = table.header().get(index).cloned().unwrap_or_default();
        let mut missing_count = 0;
        let mut sample_values = Vec::with_capacity(sample_size);
        let mut raw_present: HashSet<&str> = HashSet::new();
        let mut trimmed_present: HashSet<&str> = HashSet::new();

        for cell in table.column_cells(index) {
            if is_missing(cell) {
                missing_count += 1;
                continue;
            }

            let trimmed = trim_value(cell);
            if sample_values.len() < sample_size {
                sample_values.push(trimmed.to_string());
            }
            raw_present.insert(cell);
            trimmed_present.insert(trimmed);
        }

        let row_count = table.row_count();
        let missing_percentage = if row_count > 0 {
            missing_count as f64 / row_count as f64 * 100.0
        } else {
            0.0
        };

        let mut warnings = Vec::new();
        if raw_present.len() != trimmed_present.len() {
            warnings.push(WARNING_INCONSISTENT_WHITESPACE.to_string());
        }

        debug!(
            "  {}: {} missing ({:.1}%), {} samples",
            name,
            missing_count,
            missing_percentage,
            sample_values.len()
        );

        ColumnProfile {
            name,
            missing_count,
            missing_percentage,
            sample_values,
            warnings,
            anomalies_in_column: 0,
        }
    }
}
