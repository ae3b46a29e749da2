//! Anomaly detection over imputed numeric columns.
//!
//! A value is anomalous when its z-score (sample standard deviation) exceeds
//! the configured threshold. Note that with `n` values no z-score can exceed
//! `(n - 1) / sqrt(n)`, so a threshold of 3 needs at least 11 values before
//! a single outlier can be flagged.

use crate::config::PipelineConfig;
use crate::profiler::NumericSummary;
use crate::types::{CleanedRow, ColumnProfile, WARNING_HIGH_VARIANCE};
use crate::utils::parse_number;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use tracing::debug;

/// Outcome of scanning one column.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ColumnAnomalies {
    /// Row indices whose value exceeded the z threshold.
    pub flagged_rows: Vec<usize>,
    /// Coefficient of variation above the configured limit.
    pub high_variance: bool,
}

/// Anomaly results for a whole table, one entry per header column.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AnomalySummary {
    pub columns: Vec<ColumnAnomalies>,
}

impl AnomalySummary {
    /// Number of distinct rows flagged in at least one column.
    pub fn anomalies_found(&self) -> usize {
        self.columns
            .iter()
            .flat_map(|c| c.flagged_rows.iter().copied())
            .collect::<BTreeSet<_>>()
            .len()
    }

    /// Flag count for a column position.
    pub fn column_count(&self, index: usize) -> usize {
        self.columns.get(index).map_or(0, |c| c.flagged_rows.len())
    }

    /// Write per-column counts and variance warnings into the profiles.
    pub fn apply_to(&self, profiles: &mut [ColumnProfile]) {
        for (profile, column) in profiles.iter_mut().zip(&self.columns) {
            profile.anomalies_in_column = column.flagged_rows.len();
            if column.high_variance {
                profile.add_warning(WARNING_HIGH_VARIANCE);
            }
        }
    }
}

/// Z-score anomaly detector.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AnomalyDetector {
    z_score_threshold: f64,
    min_samples: usize,
    high_variance_cv: f64,
}

impl Default for AnomalyDetector {
    fn default() -> Self {
        Self::new(&PipelineConfig::default())
    }
}

impl AnomalyDetector {
    pub fn new(config: &PipelineConfig) -> Self {
        Self {
            z_score_threshold: config.z_score_threshold,
            min_samples: config.min_anomaly_samples,
            high_variance_cv: config.high_variance_cv,
        }
    }

    /// Scan every numeric column of the imputed rows.
    ///
    /// Non-numeric columns produce an empty entry so positions stay aligned
    /// with the header.
    pub fn detect(&self, rows: &[CleanedRow], numeric: &[bool], parallel: bool) -> AnomalySummary {
        let scan = |(index, is_numeric): (usize, &bool)| {
            if *is_numeric {
                self.scan_column(rows, index)
            } else {
                ColumnAnomalies::default()
            }
        };

        let columns: Vec<ColumnAnomalies> = if parallel {
            numeric.par_iter().enumerate().map(scan).collect()
        } else {
            numeric.iter().enumerate().map(scan).collect()
        };

        AnomalySummary { columns }
    }

    /// Scan one column; unparseable values are skipped.
    pub fn scan_column(&self, rows: &[CleanedRow], index: usize) -> ColumnAnomalies {
        let observations: Vec<(usize, f64)> = rows
            .iter()
            .enumerate()
            .filter_map(|(row, cells)| cells.value(index).and_then(parse_number).map(|v| (row, v)))
            .collect();

        if observations.len() < self.min_samples {
            return ColumnAnomalies::default();
        }

        let values: Vec<f64> = observations.iter().map(|(_, v)| *v).collect();
        let Some(summary) = NumericSummary::from_values(&values) else {
            return ColumnAnomalies::default();
        };

        let high_variance = summary
            .coefficient_of_variation()
            .is_some_and(|cv| cv > self.high_variance_cv);

        // z_score is None for zero spread, so nothing is flagged then
        let flagged_rows: Vec<usize> = observations
            .iter()
            .filter(|(_, value)| {
                summary
                    .z_score(*value)
                    .is_some_and(|z| z.abs() > self.z_score_threshold)
            })
            .map(|(row, _)| *row)
            .collect();

        if !flagged_rows.is_empty() || high_variance {
            debug!(
                "  column {}: {} anomalies, mean {:.3}, std {:.3}, high variance: {}",
                index,
                flagged_rows.len(),
                summary.mean,
                summary.std_dev,
                high_variance
            );
        }

        ColumnAnomalies {
            flagged_rows,
            high_variance,
        }
    }
}
