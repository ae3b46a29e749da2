//! Naive comma-delimited parsing.
//!
//! Lines are split on `\r?\n` and cells on `,` with no quoting support: a
//! quoted cell containing a comma becomes two cells. Cells keep their raw
//! whitespace so the profiler can detect inconsistent padding; every
//! consumer trims before interpreting a value.

use crate::utils::trim_value;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Field delimiter.
pub const DELIMITER: char = ',';

/// Header plus data rows of a parsed file.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawTable {
    header: Vec<String>,
    rows: Vec<Vec<String>>,
}

impl RawTable {
    /// Split raw text into a header and data rows.
    ///
    /// Input with fewer than two lines (nothing, or a header alone) yields
    /// an empty table.
    pub fn parse(text: &str) -> Self {
        let lines: Vec<&str> = trim_value(text)
            .split('\n')
            .map(|line| line.strip_suffix('\r').unwrap_or(line))
            .collect();

        if lines.len() < 2 {
            debug!("Input has {} line(s); treating as empty table", lines.len());
            return Self::default();
        }

        let header = lines[0]
            .split(DELIMITER)
            .map(|name| trim_value(name).to_string())
            .collect();
        let rows = lines[1..]
            .iter()
            .map(|line| line.split(DELIMITER).map(str::to_string).collect())
            .collect();

        Self { header, rows }
    }

    /// Build a table from an already split header and rows.
    pub fn from_parts(header: Vec<String>, rows: Vec<Vec<String>>) -> Self {
        Self { header, rows }
    }

    /// Parse raw bytes, replacing invalid UTF-8 sequences.
    pub fn parse_bytes(bytes: &[u8]) -> Self {
        Self::parse(&String::from_utf8_lossy(bytes))
    }

    /// Column names in header order (trimmed).
    pub fn header(&self) -> &[String] {
        &self.header
    }

    /// Data rows as split, without padding.
    pub fn rows(&self) -> &[Vec<String>] {
        &self.rows
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    pub fn column_count(&self) -> usize {
        self.header.len()
    }

    /// Check if the table has no data rows.
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Raw cell at a position; absent trailing cells read as empty.
    pub fn cell(&self, row: usize, column: usize) -> &str {
        self.rows
            .get(row)
            .and_then(|cells| cells.get(column))
            .map(String::as_str)
            .unwrap_or("")
    }

    /// Raw cells of one column in row order, padded to the row count.
    pub fn column_cells(&self, column: usize) -> impl Iterator<Item = &str> + '_ {
        (0..self.rows.len()).map(move |row| self.cell(row, column))
    }
}
