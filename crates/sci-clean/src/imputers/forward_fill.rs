//! Forward-fill imputation.

use crate::parser::RawTable;
use crate::types::CleanedRow;
use crate::utils::{is_missing, parse_number, trim_value};
use rayon::prelude::*;
use tracing::debug;

/// Fallback for a leading missing cell in a numeric column.
pub const NUMERIC_FALLBACK: &str = "0";
/// Fallback for a leading missing cell in a non-numeric column.
pub const TEXT_FALLBACK: &str = "";

/// Last-observation-carried-forward imputer.
///
/// A column is numeric when any non-missing cell parses as a number.
/// Missing cells take the last non-missing value seen above them, or a
/// fallback when there is none yet.
pub struct ForwardFillImputer;

impl ForwardFillImputer {
    /// Decide per column whether it is numeric.
    ///
    /// Cells are scanned in row order and the scan stops at the first
    /// present cell that parses as a number. Text before it does not count
    /// against the column; a column with no numeric cell is not numeric.
    pub fn detect_numeric_columns(table: &RawTable) -> Vec<bool> {
        (0..table.column_count())
            .map(|index| {
                table
                    .column_cells(index)
                    .any(|cell| !is_missing(cell) && parse_number(cell).is_some())
            })
            .collect()
    }

    /// Impute every column and return rows aligned to the header.
    ///
    /// `numeric` holds one flag per header column, usually from
    /// [`detect_numeric_columns`](Self::detect_numeric_columns).
    pub fn impute(table: &RawTable, numeric: &[bool], parallel: bool) -> Vec<CleanedRow> {
        let fill = |index: usize| {
            let is_numeric = numeric.get(index).copied().unwrap_or(false);
            Self::fill_column(table.column_cells(index), is_numeric)
        };

        let columns: Vec<Vec<String>> = if parallel {
            (0..table.column_count()).into_par_iter().map(fill).collect()
        } else {
            (0..table.column_count()).map(fill).collect()
        };

        debug!(
            "Forward-filled {} columns over {} rows",
            columns.len(),
            table.row_count()
        );

        Self::transpose(columns, table.row_count())
    }

    /// Forward-fill a single column given in row order.
    pub fn fill_column<'a>(cells: impl Iterator<Item = &'a str>, numeric: bool) -> Vec<String> {
        let fallback = if numeric {
            NUMERIC_FALLBACK
        } else {
            TEXT_FALLBACK
        };
        let mut last_seen: Option<String> = None;

        cells
            .map(|cell| {
                if is_missing(cell) {
                    last_seen.clone().unwrap_or_else(|| fallback.to_string())
                } else {
                    let value = trim_value(cell).to_string();
                    last_seen = Some(value.clone());
                    value
                }
            })
            .collect()
    }

    fn transpose(columns: Vec<Vec<String>>, row_count: usize) -> Vec<CleanedRow> {
        let mut rows: Vec<Vec<String>> = (0..row_count)
            .map(|_| Vec::with_capacity(columns.len()))
            .collect();

        for column in columns {
            for (row, value) in rows.iter_mut().zip(column) {
                row.push(value);
            }
        }

        rows.into_iter().map(CleanedRow::new).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn values(rows: &[CleanedRow]) -> Vec<Vec<&str>> {
        rows.iter()
            .map(|row| row.values().iter().map(String::as_str).collect())
            .collect()
    }

    fn impute(text: &str) -> (RawTable, Vec<CleanedRow>) {
        let table = RawTable::parse(text);
        let numeric = ForwardFillImputer::detect_numeric_columns(&table);
        let rows = ForwardFillImputer::impute(&table, &numeric, false);
        (table, rows)
    }

    #[test]
    fn test_forward_fill_scenario() {
        let (table, rows) = impute("a,b\n1,x\n,y\n2,");

        assert_eq!(values(&rows), vec![vec!["1", "x"], vec!["1", "y"], vec!["2", "y"]]);
        assert_eq!(rows[1].get(table.header(), "a"), Some("1"));
        assert_eq!(rows[2].get(table.header(), "b"), Some("y"));
    }

    #[test]
    fn test_numeric_detection_stops_at_first_number() {
        let table = RawTable::parse("a,b,c,d,e\n,x,NA,,y\n5,1,,,z\nfoo,2,,,");
        let numeric = ForwardFillImputer::detect_numeric_columns(&table);
        // a: "5"; b: "x" then "1"; c, d: nothing present; e: text only
        assert_eq!(numeric, vec![true, true, false, false, false]);
    }

    #[test]
    fn test_text_before_first_number_keeps_numeric_fallback() {
        let (table, rows) = impute("v\nNA\nunknown\n5\nNA\n");
        assert_eq!(ForwardFillImputer::detect_numeric_columns(&table), vec![true]);
        assert_eq!(
            values(&rows),
            vec![vec!["0"], vec!["unknown"], vec!["5"], vec!["5"]]
        );
    }

    #[test]
    fn test_leading_missing_uses_fallback() {
        let (_, rows) = impute("n,s\nNA,\n3,hello\nnull,n/a");
        assert_eq!(
            values(&rows),
            vec![vec!["0", ""], vec!["3", "hello"], vec!["3", "hello"]]
        );
    }

    #[test]
    fn test_no_backward_fill() {
        let (_, rows) = impute("s\n\n\nlate");
        assert_eq!(values(&rows), vec![vec![""], vec![""], vec!["late"]]);
    }

    #[test]
    fn test_present_values_are_trimmed() {
        let (_, rows) = impute("s\n  padded \n");
        assert_eq!(values(&rows), vec![vec!["padded"]]);
    }

    #[test]
    fn test_short_rows_are_filled() {
        let (_, rows) = impute("a,b,c\n1,2,3\n4");
        assert_eq!(values(&rows), vec![vec!["1", "2", "3"], vec!["4", "2", "3"]]);
    }

    #[test]
    fn test_no_missing_after_first_value() {
        let (table, rows) = impute("a,b\n,\n1,x\nNA,\n,null\n7,\n");
        for column in 0..table.column_count() {
            let mut seen_value = false;
            for row in &rows {
                let cell = row.value(column).unwrap();
                if seen_value {
                    assert!(!is_missing(cell), "column {column} still missing");
                }
                seen_value |= !is_missing(cell);
            }
        }
        // numeric columns are never missing at all
        assert!(rows.iter().all(|row| !is_missing(row.value(0).unwrap())));
    }

    #[test]
    fn test_imputation_is_idempotent() {
        let (table, first) = impute("a,b,c\n,x,\n1,,\nNA,y,\n2,,z");
        let refed = RawTable::from_parts(
            table.header().to_vec(),
            first.iter().map(|row| row.values().to_vec()).collect(),
        );
        let numeric = ForwardFillImputer::detect_numeric_columns(&refed);
        let second = ForwardFillImputer::impute(&refed, &numeric, false);
        assert_eq!(first, second);
    }

    #[test]
    fn test_parallel_matches_sequential() {
        let table = RawTable::parse("a,b,c\n1,,x\n,2,\nNA,3,y\n4,,");
        let numeric = ForwardFillImputer::detect_numeric_columns(&table);
        assert_eq!(
            ForwardFillImputer::impute(&table, &numeric, true),
            ForwardFillImputer::impute(&table, &numeric, false)
        );
    }
}
