//! Heuristic semantic type inference over column samples.
//!
//! Rules are tried in a fixed order and the first match wins. Each rule
//! carries a fixed confidence tier; the tier is not a probability, it only
//! tells the operator how much to trust the guess.

use crate::config::PipelineConfig;
use crate::types::{ColumnProfile, DataType, TypeInferenceResult};
use crate::utils::{
    BOOLEAN_PAIRS, has_plausible_year, is_missing, looks_like_identifier, parse_calendar_date,
    parse_grouped_number, trim_value,
};
use std::collections::BTreeSet;

/// Confidence when a column has no usable samples.
pub const CONFIDENCE_EMPTY: u8 = 20;
/// Confidence of the boolean rule.
pub const CONFIDENCE_BOOLEAN: u8 = 95;
/// Confidence of the numeric rule.
pub const CONFIDENCE_NUMERIC: u8 = 98;
/// Confidence of the date rule.
pub const CONFIDENCE_DATE: u8 = 90;
/// Confidence of the categorical rule.
pub const CONFIDENCE_CATEGORICAL: u8 = 80;
/// Confidence of the text fallback.
pub const CONFIDENCE_FALLBACK: u8 = 60;

/// Classifies columns from their sample values.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TypeClassifier {
    date_fraction_threshold: f64,
    categorical_max_unique: usize,
    categorical_max_ratio: f64,
}

impl Default for TypeClassifier {
    fn default() -> Self {
        Self::new(&PipelineConfig::default())
    }
}

impl TypeClassifier {
    pub fn new(config: &PipelineConfig) -> Self {
        Self {
            date_fraction_threshold: config.date_fraction_threshold,
            categorical_max_unique: config.categorical_max_unique,
            categorical_max_ratio: config.categorical_max_ratio,
        }
    }

    /// Infer the type of a profiled column from its samples.
    pub fn infer(&self, profile: &ColumnProfile) -> TypeInferenceResult {
        let (detected_type, confidence) = self.classify(&profile.sample_values);
        TypeInferenceResult {
            column_name: profile.name.clone(),
            detected_type,
            confidence,
        }
    }

    /// Classify a sample sequence into a type and confidence tier.
    pub fn classify<S: AsRef<str>>(&self, samples: &[S]) -> (DataType, u8) {
        let values: Vec<&str> = samples
            .iter()
            .map(|s| trim_value(s.as_ref()))
            .filter(|s| !is_missing(s))
            .collect();

        if values.is_empty() {
            return (DataType::Text, CONFIDENCE_EMPTY);
        }

        let unique: BTreeSet<String> = values.iter().map(|v| v.to_lowercase()).collect();

        if is_boolean(&unique) {
            return (DataType::Boolean, CONFIDENCE_BOOLEAN);
        }

        if values.iter().all(|v| parse_grouped_number(v).is_some()) {
            return (DataType::Numeric, CONFIDENCE_NUMERIC);
        }

        let date_like = values.iter().filter(|v| is_date_like(v)).count();
        if date_like as f64 / values.len() as f64 > self.date_fraction_threshold {
            return (DataType::Date, CONFIDENCE_DATE);
        }

        let unique_ratio = unique.len() as f64 / values.len() as f64;
        if unique.len() <= self.categorical_max_unique && unique_ratio < self.categorical_max_ratio {
            return (DataType::Categorical, CONFIDENCE_CATEGORICAL);
        }

        (DataType::Text, CONFIDENCE_FALLBACK)
    }
}

/// At most two distinct spellings, all drawn from a single boolean pair.
fn is_boolean(unique: &BTreeSet<String>) -> bool {
    unique.len() <= 2
        && BOOLEAN_PAIRS.iter().any(|(yes, no)| {
            unique
                .iter()
                .all(|value| value == yes || value == no)
        })
}

/// A parseable calendar date with a 19xx/20xx year that is not an identifier.
fn is_date_like(value: &str) -> bool {
    !looks_like_identifier(value)
        && parse_calendar_date(value).is_some()
        && has_plausible_year(value)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn classify(samples: &[&str]) -> (DataType, u8) {
        TypeClassifier::default().classify(samples)
    }

    // ==================== empty / boolean ====================

    #[test]
    fn test_empty_samples_are_low_confidence_text() {
        assert_eq!(classify(&[]), (DataType::Text, 20));
        assert_eq!(classify(&["", "NA", "null"]), (DataType::Text, 20));
    }

    #[test]
    fn test_one_zero_flags_are_boolean_not_numeric() {
        assert_eq!(classify(&["1", "0", "1", "1", "0"]), (DataType::Boolean, 95));
    }

    #[test]
    fn test_boolean_word_pairs_case_insensitive() {
        assert_eq!(classify(&["Yes", "no", "YES"]), (DataType::Boolean, 95));
        assert_eq!(classify(&["TRUE", "false"]), (DataType::Boolean, 95));
        assert_eq!(classify(&["true", "true"]), (DataType::Boolean, 95));
    }

    #[test]
    fn test_mixed_boolean_pairs_are_not_boolean() {
        // yes/true come from different pairs
        assert_ne!(classify(&["yes", "true"]).0, DataType::Boolean);
        // 1/0/2 has three distinct values and is numeric
        assert_eq!(classify(&["1", "0", "2"]), (DataType::Numeric, 98));
    }

    // ==================== numeric ====================

    #[test]
    fn test_numeric_with_thousands_separators() {
        assert_eq!(classify(&["1,200", "3.5", "-4", "1e3"]), (DataType::Numeric, 98));
    }

    #[test]
    fn test_numeric_requires_every_sample() {
        assert_ne!(classify(&["1", "2", "three"]).0, DataType::Numeric);
    }

    // ==================== date ====================

    #[test]
    fn test_iso_dates() {
        assert_eq!(
            classify(&["2024-01-15", "2024-02-20", "2024-03-25"]),
            (DataType::Date, 90)
        );
    }

    #[test]
    fn test_date_fraction_must_exceed_threshold() {
        // 7 of 10 is exactly 0.7, not above it
        let mut samples = vec!["2020-01-01"; 7];
        samples.extend(["a", "b", "c"]);
        assert_ne!(classify(&samples).0, DataType::Date);

        let mut samples = vec!["2020-01-01"; 8];
        samples.extend(["a", "b"]);
        assert_eq!(classify(&samples), (DataType::Date, 90));
    }

    #[test]
    fn test_identifier_prefixed_values_are_not_dates() {
        let (detected, _) = classify(&["id2020-01-01", "sub 2020-01-02", "PAT2020-01-03"]);
        assert_ne!(detected, DataType::Date);
    }

    #[test]
    fn test_dates_outside_plausible_years_are_not_dates() {
        let (detected, _) = classify(&["1850-01-01", "1851-02-01", "1852-03-01"]);
        assert_ne!(detected, DataType::Date);
    }

    // ==================== categorical / fallback ====================

    #[test]
    fn test_categorical_low_cardinality() {
        let samples = ["red", "blue", "red", "blue", "green", "red"];
        assert_eq!(classify(&samples), (DataType::Categorical, 80));
    }

    #[test]
    fn test_high_uniqueness_falls_back_to_text() {
        let samples = ["alice", "bob", "carol", "dave", "erin"];
        assert_eq!(classify(&samples), (DataType::Text, 60));
    }

    #[test]
    fn test_categorical_ratio_boundary() {
        // 3 distinct of 5 is 0.6, which is not below 0.6
        assert_eq!(classify(&["a", "b", "c", "a", "b"]), (DataType::Text, 60));
    }

    // ==================== determinism / config ====================

    #[test]
    fn test_classification_is_deterministic() {
        let samples = ["2021-05-01", "n/a", "x", "2021-05-03", "2021-05-04"];
        let first = classify(&samples);
        for _ in 0..10 {
            assert_eq!(classify(&samples), first);
        }
    }

    #[test]
    fn test_config_thresholds_are_used() {
        let config = PipelineConfig::builder()
            .categorical_max_ratio(1.0)
            .build()
            .unwrap();
        let classifier = TypeClassifier::new(&config);
        assert_eq!(
            classifier.classify(&["a", "b", "c", "a", "b"]),
            (DataType::Categorical, 80)
        );
    }

    #[test]
    fn test_infer_uses_profile_samples() {
        let profile = ColumnProfile {
            name: "flag".to_string(),
            missing_count: 0,
            missing_percentage: 0.0,
            sample_values: vec!["1".into(), "0".into(), "1".into()],
            warnings: vec![],
            anomalies_in_column: 0,
        };
        let result = TypeClassifier::default().infer(&profile);
        assert_eq!(result.column_name, "flag");
        assert_eq!(result.detected_type, DataType::Boolean);
        assert_eq!(result.confidence, 95);
    }
}
