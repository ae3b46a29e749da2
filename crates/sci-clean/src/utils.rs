//! Shared utilities for the profiling pipeline.
//!
//! These helpers define the value-level vocabulary every stage agrees on:
//! what counts as missing, what parses as a number, what parses as a date.
//! The generated cleaning script mirrors the same definitions, so changes
//! here must be reflected in `export::script`.

use chrono::{Datelike, NaiveDate, NaiveDateTime};
use once_cell::sync::Lazy;
use regex::Regex;

// =============================================================================
// Whitespace
// =============================================================================

/// Characters stripped from both ends of a value.
///
/// ASCII only. The replay script passes this exact set to `str.strip`.
pub const WHITESPACE: &str = " \t\n\r\u{b}\u{c}";

/// Strip [`WHITESPACE`] from both ends of a value.
pub fn trim_value(value: &str) -> &str {
    value.trim_matches(|c: char| WHITESPACE.contains(c))
}

// =============================================================================
// Missing Values
// =============================================================================

/// Trimmed, lower-cased cell contents treated as missing.
pub const MISSING_MARKERS: [&str; 4] = ["", "null", "na", "n/a"];

/// Check whether a cell is missing.
///
/// # Example
///
/// ```rust,ignore
/// use sci_clean::utils::is_missing;
///
/// assert!(is_missing("  N/A "));
/// assert!(is_missing(""));
/// assert!(!is_missing("0"));
/// ```
pub fn is_missing(cell: &str) -> bool {
    let trimmed = trim_value(cell);
    MISSING_MARKERS
        .iter()
        .any(|marker| trimmed.eq_ignore_ascii_case(marker))
}

// =============================================================================
// Numbers
// =============================================================================

/// Decimal literal accepted as a number (optionally signed, optional exponent).
pub const NUMBER_PATTERN: &str = r"^[+-]?([0-9]+\.?[0-9]*|\.[0-9]+)([eE][+-]?[0-9]+)?$";

static NUMBER_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(NUMBER_PATTERN).expect("Invalid regex: number"));

/// Parse a cell as a finite number.
///
/// Only plain decimal literals are accepted; `inf`, `NaN`, hex and
/// thousands separators are rejected.
pub fn parse_number(cell: &str) -> Option<f64> {
    let trimmed = trim_value(cell);
    if !NUMBER_RE.is_match(trimmed) {
        return None;
    }
    trimmed.parse::<f64>().ok().filter(|value| value.is_finite())
}

/// Check if a cell parses as a finite number.
pub fn is_number(cell: &str) -> bool {
    parse_number(cell).is_some()
}

/// Remove thousands-separator commas and surrounding whitespace.
pub fn strip_thousands_separators(cell: &str) -> String {
    trim_value(cell).replace(',', "")
}

/// Parse a cell as a number after removing thousands separators.
///
/// Returns the normalized token together with its value.
pub fn parse_grouped_number(cell: &str) -> Option<(String, f64)> {
    let stripped = strip_thousands_separators(cell);
    parse_number(&stripped).map(|value| (stripped, value))
}

// =============================================================================
// Dates
// =============================================================================

/// A date layout: an anchored shape the value must match, then the
/// `strftime` format it is parsed with.
///
/// The shape pins numeric fields to ASCII digits and separators to one
/// literal character, so padded fields, signs and repeated spaces never
/// reach `chrono` or the script's `strptime`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateLayout {
    pub shape: &'static str,
    pub format: &'static str,
}

const fn layout(shape: &'static str, format: &'static str) -> DateLayout {
    DateLayout { shape, format }
}

/// Date-only layouts tried in order.
pub const DATE_FORMATS: [DateLayout; 8] = [
    layout(r"^[0-9]{4}-[0-9]{1,2}-[0-9]{1,2}$", "%Y-%m-%d"),
    layout(r"^[0-9]{4}/[0-9]{1,2}/[0-9]{1,2}$", "%Y/%m/%d"),
    layout(r"^[0-9]{1,2}/[0-9]{1,2}/[0-9]{4}$", "%m/%d/%Y"),
    layout(r"^[0-9]{1,2}-[0-9]{1,2}-[0-9]{4}$", "%m-%d-%Y"),
    layout(r"^[0-9]{1,2}\.[0-9]{1,2}\.[0-9]{4}$", "%d.%m.%Y"),
    layout(r"^[0-9]{1,2} [A-Za-z]{3} [0-9]{4}$", "%d %b %Y"),
    layout(r"^[A-Za-z]{3} [0-9]{1,2}, [0-9]{4}$", "%b %d, %Y"),
    layout(r"^[A-Za-z]+ [0-9]{1,2}, [0-9]{4}$", "%B %d, %Y"),
];

/// Date-time layouts tried after [`DATE_FORMATS`]; only the date is kept.
///
/// Seconds stop at 59: `chrono` reads `:60` as a leap second, Python does not.
pub const DATETIME_FORMATS: [DateLayout; 4] = [
    layout(
        r"^[0-9]{4}-[0-9]{1,2}-[0-9]{1,2}T[0-9]{1,2}:[0-9]{1,2}:[0-5]?[0-9]$",
        "%Y-%m-%dT%H:%M:%S",
    ),
    layout(
        r"^[0-9]{4}-[0-9]{1,2}-[0-9]{1,2} [0-9]{1,2}:[0-9]{1,2}:[0-5]?[0-9]$",
        "%Y-%m-%d %H:%M:%S",
    ),
    layout(r"^[0-9]{4}-[0-9]{1,2}-[0-9]{1,2}T[0-9]{1,2}:[0-9]{1,2}$", "%Y-%m-%dT%H:%M"),
    layout(r"^[0-9]{4}-[0-9]{1,2}-[0-9]{1,2} [0-9]{1,2}:[0-9]{1,2}$", "%Y-%m-%d %H:%M"),
];

/// Inclusive range of accepted four-digit years.
pub const YEAR_RANGE: (i32, i32) = (1000, 9999);

static DATE_SHAPES: Lazy<Vec<Regex>> = Lazy::new(|| compile_shapes(&DATE_FORMATS));
static DATETIME_SHAPES: Lazy<Vec<Regex>> = Lazy::new(|| compile_shapes(&DATETIME_FORMATS));

fn compile_shapes(layouts: &[DateLayout]) -> Vec<Regex> {
    layouts
        .iter()
        .map(|layout| Regex::new(layout.shape).expect("Invalid regex: date shape"))
        .collect()
}

static PLAUSIBLE_YEAR_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(19|20)[0-9]{2}").expect("Invalid regex: year"));

static IDENTIFIER_PREFIX_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)^(sub|id|pat)").expect("Invalid regex: identifier prefix"));

/// Parse a cell as a calendar date using the fixed format list.
///
/// The first layout whose shape matches and whose format parses decides the
/// date; a year outside [`YEAR_RANGE`] then rejects the value.
pub fn parse_calendar_date(cell: &str) -> Option<NaiveDate> {
    let trimmed = trim_value(cell);
    if trimmed.is_empty() {
        return None;
    }

    let date = DATE_FORMATS
        .iter()
        .zip(DATE_SHAPES.iter())
        .filter(|(_, shape)| shape.is_match(trimmed))
        .find_map(|(layout, _)| NaiveDate::parse_from_str(trimmed, layout.format).ok())
        .or_else(|| {
            DATETIME_FORMATS
                .iter()
                .zip(DATETIME_SHAPES.iter())
                .filter(|(_, shape)| shape.is_match(trimmed))
                .find_map(|(layout, _)| NaiveDateTime::parse_from_str(trimmed, layout.format).ok())
                .map(|dt| dt.date())
        })?;

    (YEAR_RANGE.0..=YEAR_RANGE.1)
        .contains(&date.year())
        .then_some(date)
}

/// Check whether a value contains a 19xx or 20xx year.
pub fn has_plausible_year(cell: &str) -> bool {
    PLAUSIBLE_YEAR_RE.is_match(cell)
}

/// Check whether a value looks like a subject/patient identifier.
pub fn looks_like_identifier(cell: &str) -> bool {
    IDENTIFIER_PREFIX_RE.is_match(trim_value(cell))
}

// =============================================================================
// Booleans
// =============================================================================

/// Accepted boolean spellings, as (true, false) pairs.
pub const BOOLEAN_PAIRS: [(&str, &str); 3] = [("true", "false"), ("yes", "no"), ("1", "0")];

/// Parse a boolean spelling from any of [`BOOLEAN_PAIRS`], case-insensitively.
pub fn parse_boolean(cell: &str) -> Option<bool> {
    let lower = trim_value(cell).to_lowercase();
    BOOLEAN_PAIRS.iter().find_map(|(yes, no)| {
        if lower == *yes {
            Some(true)
        } else if lower == *no {
            Some(false)
        } else {
            None
        }
    })
}

// =============================================================================
// Formatting
// =============================================================================

/// Truncate a string to max characters with ellipsis.
pub fn truncate_str(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let kept: String = s.chars().take(max_len.saturating_sub(3)).collect();
        format!("{}...", kept)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_trim_value_uses_fixed_set() {
        assert_eq!(trim_value(" \t\u{b}\u{c}x y\r\n"), "x y");
        // separators outside the set are content
        assert_eq!(trim_value("\u{1f}x\u{1f}"), "\u{1f}x\u{1f}");
        assert_eq!(trim_value("\u{a0}x"), "\u{a0}x");
        assert!(!is_missing("\u{1c}"));
    }

    #[test]
    fn test_is_missing_markers() {
        for cell in ["", "   ", "null", "NULL", "na", "NA", "n/a", " N/A "] {
            assert!(is_missing(cell), "{cell:?} should be missing");
        }
        for cell in ["0", "none", "-", "nan", "x"] {
            assert!(!is_missing(cell), "{cell:?} should be present");
        }
    }

    #[test]
    fn test_parse_number_accepts_decimal_literals() {
        assert_eq!(parse_number("42"), Some(42.0));
        assert_eq!(parse_number(" -3.5 "), Some(-3.5));
        assert_eq!(parse_number("+.5"), Some(0.5));
        assert_eq!(parse_number("5."), Some(5.0));
        assert_eq!(parse_number("1e3"), Some(1000.0));
    }

    #[test]
    fn test_parse_number_rejects_non_finite_and_junk() {
        for cell in ["", "inf", "NaN", "infinity", "0x10", "1,000", "12abc", "1e999", "."] {
            assert_eq!(parse_number(cell), None, "{cell:?} should not parse");
        }
    }

    #[test]
    fn test_parse_grouped_number_strips_commas() {
        assert_eq!(
            parse_grouped_number("1,234.5"),
            Some(("1234.5".to_string(), 1234.5))
        );
        assert_eq!(parse_grouped_number("abc"), None);
    }

    #[test]
    fn test_parse_calendar_date_formats() {
        let expected = NaiveDate::from_ymd_opt(2024, 1, 15).unwrap();
        for cell in [
            "2024-01-15",
            "2024/01/15",
            "01/15/2024",
            "1/15/2024",
            "01-15-2024",
            "15.01.2024",
            "15 Jan 2024",
            "Jan 15, 2024",
            "January 15, 2024",
            "2024-01-15T10:30:00",
            "2024-01-15 10:30",
        ] {
            assert_eq!(parse_calendar_date(cell), Some(expected), "{cell:?}");
        }
    }

    #[test]
    fn test_parse_calendar_date_rejects_invalid() {
        for cell in ["", "2024-13-01", "2023-02-30", "yesterday", "20240115", "15/01/2024"] {
            assert_eq!(parse_calendar_date(cell), None, "{cell:?}");
        }
    }

    #[test]
    fn test_parse_calendar_date_requires_exact_shape() {
        for cell in [
            "01/15/ 2024",
            "15. 1.2024",
            "2024/ 1/ 5",
            "2024-01- 5",
            "+2024-01-15",
            "-2024-01-15",
            "15  Jan  2024",
            "15 January 2024",
            "02024-01-15",
            "2024-01-15t10:30",
            "2024-01-15T10:30:60",
            "\u{1f}2024-01-15",
        ] {
            assert_eq!(parse_calendar_date(cell), None, "{cell:?}");
        }
        assert_eq!(
            parse_calendar_date("2024-1-5"),
            NaiveDate::from_ymd_opt(2024, 1, 5)
        );
        assert_eq!(
            parse_calendar_date("JAN 5, 2024"),
            NaiveDate::from_ymd_opt(2024, 1, 5)
        );
    }

    #[test]
    fn test_parse_calendar_date_year_range() {
        assert_eq!(parse_calendar_date("0999-01-01"), None);
        assert_eq!(parse_calendar_date("0000-01-01"), None);
        assert!(parse_calendar_date("1000-01-01").is_some());
    }

    #[test]
    fn test_year_and_identifier_helpers() {
        assert!(has_plausible_year("1999-12-31"));
        assert!(has_plausible_year("on 2020"));
        assert!(!has_plausible_year("1850-01-01"));
        assert!(looks_like_identifier("SUB-2020-01"));
        assert!(looks_like_identifier("id_7"));
        assert!(looks_like_identifier("Patient 2001"));
        assert!(!looks_like_identifier("2020-01-01"));
    }

    #[test]
    fn test_parse_boolean() {
        assert_eq!(parse_boolean("TRUE"), Some(true));
        assert_eq!(parse_boolean(" no "), Some(false));
        assert_eq!(parse_boolean("1"), Some(true));
        assert_eq!(parse_boolean("0"), Some(false));
        assert_eq!(parse_boolean("maybe"), None);
    }

    #[test]
    fn test_truncate_str() {
        assert_eq!(truncate_str("short", 10), "short");
        assert_eq!(truncate_str("a_very_long_column_name", 10), "a_very_...");
    }
}
