use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Warning attached when raw and trimmed values disagree.
pub const WARNING_INCONSISTENT_WHITESPACE: &str = "Inconsistent Whitespace Detected";

/// Warning attached when a numeric column's coefficient of variation is high.
pub const WARNING_HIGH_VARIANCE: &str = "High Variance (Possible Unit Mismatch)";

/// Semantic type of a column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DataType {
    Numeric,
    Text,
    Date,
    Categorical,
    Boolean,
}

impl DataType {
    /// All types, in the order offered to the operator.
    pub const ALL: [DataType; 5] = [
        DataType::Numeric,
        DataType::Text,
        DataType::Date,
        DataType::Categorical,
        DataType::Boolean,
    ];

    /// Upper-case name used in JSON, the CLI and the generated script.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Numeric => "NUMERIC",
            Self::Text => "TEXT",
            Self::Date => "DATE",
            Self::Categorical => "CATEGORICAL",
            Self::Boolean => "BOOLEAN",
        }
    }
}

impl fmt::Display for DataType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DataType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let upper = s.trim().to_ascii_uppercase();
        DataType::ALL
            .into_iter()
            .find(|t| t.as_str() == upper)
            .ok_or_else(|| {
                format!(
                    "unknown type '{}' (expected one of NUMERIC, TEXT, DATE, CATEGORICAL, BOOLEAN)",
                    s
                )
            })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ColumnProfile {
    pub name: String,
    pub missing_count: usize,
    pub missing_percentage: f64,
    /// First non-missing values in row order, trimmed.
    pub sample_values: Vec<String>,
    /// Distinct warnings in the order they were raised.
    pub warnings: Vec<String>,
    pub anomalies_in_column: usize,
}

impl ColumnProfile {
    /// Attach a warning unless it is already present.
    pub(crate) fn add_warning(&mut self, warning: &str) {
        if !self.has_warning(warning) {
            self.warnings.push(warning.to_string());
        }
    }

    /// Check whether a warning is attached.
    pub fn has_warning(&self, warning: &str) -> bool {
        self.warnings.iter().any(|w| w == warning)
    }
}

/// Immutable profile of one ingested file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileReport {
    pub file_name: String,
    pub file_size: u64,
    /// Lowercase hex SHA-256 of the raw bytes.
    pub file_hash: String,
    pub row_count: usize,
    pub column_count: usize,
    pub column_profiles: Vec<ColumnProfile>,
    /// Percentage of all cells that are missing (0 - 100).
    pub sparsity_score: f64,
    /// Number of distinct rows flagged in at least one column.
    pub anomalies_found: usize,
    /// Wall time of the profiling run, in seconds.
    pub processing_time: f64,
}

impl ProfileReport {
    /// Total missing cells across every column.
    pub fn total_missing(&self) -> usize {
        self.column_profiles.iter().map(|p| p.missing_count).sum()
    }

    /// Sum of the per-column anomaly counts.
    pub fn total_column_anomalies(&self) -> usize {
        self.column_profiles
            .iter()
            .map(|p| p.anomalies_in_column)
            .sum()
    }

    /// Look up a column profile by name (first match in header order).
    pub fn column(&self, name: &str) -> Option<&ColumnProfile> {
        self.column_profiles.iter().find(|p| p.name == name)
    }

    /// Check if the report describes an empty table.
    pub fn is_empty(&self) -> bool {
        self.row_count == 0 || self.column_count == 0
    }
}

/// Sparsity of a table given its missing-cell total.
pub fn sparsity_score(total_missing: usize, row_count: usize, column_count: usize) -> f64 {
    let total_cells = row_count * column_count;
    if total_cells == 0 {
        0.0
    } else {
        100.0 * total_missing as f64 / total_cells as f64
    }
}

/// Heuristic type detected for one column.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TypeInferenceResult {
    pub column_name: String,
    pub detected_type: DataType,
    /// Fixed tier of the rule that matched, 0 - 100.
    pub confidence: u8,
}

impl TypeInferenceResult {
    /// Check whether the detection falls below the given threshold.
    pub fn is_ambiguous_at(&self, threshold: u8) -> bool {
        self.confidence < threshold
    }

    /// Check whether the detection falls below the default threshold of 80.
    pub fn is_ambiguous(&self) -> bool {
        self.is_ambiguous_at(80)
    }
}

/// Who confirmed a column type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConfirmedBy {
    User,
    Ai,
}

/// Operator-confirmed type of a column.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfirmedType {
    #[serde(rename = "type")]
    pub data_type: DataType,
    pub confirmed_by: ConfirmedBy,
    pub timestamp: DateTime<Utc>,
}

/// A row after forward-fill imputation, aligned to header order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CleanedRow {
    values: Vec<String>,
}

impl CleanedRow {
    pub(crate) fn new(values: Vec<String>) -> Self {
        Self { values }
    }

    /// Values in header order.
    pub fn values(&self) -> &[String] {
        &self.values
    }

    /// Value at a column position.
    pub fn value(&self, index: usize) -> Option<&str> {
        self.values.get(index).map(String::as_str)
    }

    /// Value of the first column with the given name.
    pub fn get<'a>(&'a self, header: &[String], name: &str) -> Option<&'a str> {
        header
            .iter()
            .position(|h| h == name)
            .and_then(|index| self.value(index))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_data_type_round_trip_names() {
        for data_type in DataType::ALL {
            assert_eq!(data_type.as_str().parse::<DataType>(), Ok(data_type));
        }
        assert_eq!("numeric".parse::<DataType>(), Ok(DataType::Numeric));
        assert!("INTEGER".parse::<DataType>().is_err());
    }

    #[test]
    fn test_data_type_json_values() {
        assert_eq!(
            serde_json::to_string(&DataType::Categorical).unwrap(),
            "\"CATEGORICAL\""
        );
        assert_eq!(serde_json::to_string(&ConfirmedBy::User).unwrap(), "\"user\"");
    }

    #[test]
    fn test_sparsity_score_empty_table() {
        assert_eq!(sparsity_score(0, 0, 5), 0.0);
        assert_eq!(sparsity_score(0, 5, 0), 0.0);
        assert_eq!(sparsity_score(2, 2, 2), 50.0);
    }

    #[test]
    fn test_add_warning_deduplicates() {
        let mut profile = ColumnProfile {
            name: "x".to_string(),
            missing_count: 0,
            missing_percentage: 0.0,
            sample_values: vec![],
            warnings: vec![],
            anomalies_in_column: 0,
        };
        profile.add_warning(WARNING_HIGH_VARIANCE);
        profile.add_warning(WARNING_HIGH_VARIANCE);
        assert_eq!(profile.warnings, vec![WARNING_HIGH_VARIANCE.to_string()]);
    }

    #[test]
    fn test_ambiguity() {
        let result = TypeInferenceResult {
            column_name: "notes".to_string(),
            detected_type: DataType::Text,
            confidence: 60,
        };
        assert!(result.is_ambiguous());
        assert!(!result.is_ambiguous_at(50));
    }

    #[test]
    fn test_cleaned_row_lookup_by_name() {
        let header = vec!["a".to_string(), "b".to_string()];
        let row = CleanedRow::new(vec!["1".to_string(), "x".to_string()]);
        assert_eq!(row.get(&header, "b"), Some("x"));
        assert_eq!(row.get(&header, "c"), None);
    }
}
