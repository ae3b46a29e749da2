//! Summary statistics for numeric columns.

use serde::{Deserialize, Serialize};

/// Mean and sample standard deviation of a set of values.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct NumericSummary {
    pub count: usize,
    pub mean: f64,
    /// Sample standard deviation (denominator `n - 1`).
    pub std_dev: f64,
}

impl NumericSummary {
    /// Summarize values; needs at least two of them.
    pub fn from_values(values: &[f64]) -> Option<Self> {
        let count = values.len();
        if count < 2 {
            return None;
        }

        let mean = values.iter().sum::<f64>() / count as f64;
        let variance = values.iter().map(|x| (x - mean).powi(2)).sum::<f64>() / (count - 1) as f64;

        Some(Self {
            count,
            mean,
            std_dev: variance.sqrt(),
        })
    }

    /// Standard score of a value; `None` when the spread is zero.
    pub fn z_score(&self, value: f64) -> Option<f64> {
        (self.std_dev > 0.0).then(|| (value - self.mean) / self.std_dev)
    }

    /// `std_dev / |mean|`; `None` when the mean is zero.
    pub fn coefficient_of_variation(&self) -> Option<f64> {
        (self.mean != 0.0).then(|| self.std_dev / self.mean.abs())
    }
}
