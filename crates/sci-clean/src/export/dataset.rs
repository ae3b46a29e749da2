//! Type-coerced dataset produced from confirmed column types.

use crate::error::Result;
use crate::types::DataType;
use crate::utils::{
    is_missing, parse_boolean, parse_calendar_date, parse_grouped_number, trim_value,
};
use chrono::NaiveDate;
use polars::prelude::{Column, DataFrame, DataType as PolarsType, NamedFrom, Series};
use serde::Serialize;
use std::borrow::Cow;

/// Format used for every exported date.
pub const EXPORT_DATE_FORMAT: &str = "%Y-%m-%d";

/// One exported cell after coercion to its confirmed type.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", content = "value", rename_all = "lowercase")]
pub enum CleanedCell {
    /// Missing, or not coercible to the column type.
    Empty,
    /// Number with the token it is rendered as (thousands separators removed).
    Number { token: String, value: f64 },
    Date(NaiveDate),
    Boolean(bool),
    /// Trimmed free text.
    Text(String),
}

impl CleanedCell {
    /// Coerce a cell to a confirmed type. Failed coercions become [`CleanedCell::Empty`].
    pub fn coerce(cell: &str, data_type: DataType) -> Self {
        if is_missing(cell) {
            return Self::Empty;
        }

        let coerced = match data_type {
            DataType::Numeric => {
                parse_grouped_number(cell).map(|(token, value)| Self::Number { token, value })
            }
            DataType::Date => parse_calendar_date(cell).map(Self::Date),
            DataType::Boolean => parse_boolean(cell).map(Self::Boolean),
            DataType::Text | DataType::Categorical => {
                Some(Self::Text(trim_value(cell).to_string()))
            }
        };

        coerced.unwrap_or(Self::Empty)
    }

    /// Text written to the cleaned file for this cell.
    pub fn render(&self) -> Cow<'_, str> {
        match self {
            Self::Empty => Cow::Borrowed(""),
            Self::Number { token, .. } => Cow::Borrowed(token),
            Self::Date(date) => Cow::Owned(date.format(EXPORT_DATE_FORMAT).to_string()),
            Self::Boolean(true) => Cow::Borrowed("true"),
            Self::Boolean(false) => Cow::Borrowed("false"),
            Self::Text(text) if text.contains(',') => Cow::Owned(format!("\"{text}\"")),
            Self::Text(text) => Cow::Borrowed(text),
        }
    }

    pub fn is_empty(&self) -> bool {
        matches!(self, Self::Empty)
    }
}

/// Cleaned rows with their header and confirmed types.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CleanedDataset {
    header: Vec<String>,
    types: Vec<DataType>,
    rows: Vec<Vec<CleanedCell>>,
}

impl CleanedDataset {
    pub(crate) fn new(header: Vec<String>, types: Vec<DataType>, rows: Vec<Vec<CleanedCell>>) -> Self {
        Self {
            header,
            types,
            rows,
        }
    }

    pub fn header(&self) -> &[String] {
        &self.header
    }

    pub fn types(&self) -> &[DataType] {
        &self.types
    }

    pub fn rows(&self) -> &[Vec<CleanedCell>] {
        &self.rows
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    pub fn column_count(&self) -> usize {
        self.header.len()
    }

    /// Number of cells that ended up empty.
    pub fn empty_cells(&self) -> usize {
        self.rows
            .iter()
            .flatten()
            .filter(|cell| cell.is_empty())
            .count()
    }

    /// Render as delimited text: header plus rows, each line ending in `\n`.
    ///
    /// A dataset without columns renders as the empty string.
    pub fn to_csv_string(&self) -> String {
        if self.header.is_empty() {
            return String::new();
        }

        let mut out = self.header.join(",");
        out.push('\n');
        for row in &self.rows {
            let line: Vec<Cow<'_, str>> = row.iter().map(CleanedCell::render).collect();
            out.push_str(&line.join(","));
            out.push('\n');
        }
        out
    }

    /// Build a typed DataFrame: Float64, Date, Boolean or String per column.
    ///
    /// Empty cells become nulls. Fails when header names repeat, since
    /// DataFrame column names must be unique.
    pub fn to_dataframe(&self) -> Result<DataFrame> {
        // NaiveDate's default is 1970-01-01, the epoch polars counts days from
        let epoch = NaiveDate::default();

        let columns = self
            .header
            .iter()
            .zip(&self.types)
            .enumerate()
            .map(|(index, (name, data_type))| -> Result<Column> {
                let cells = self.rows.iter().map(|row| row.get(index));
                let series = match data_type {
                    DataType::Numeric => {
                        let values: Vec<Option<f64>> = cells
                            .map(|cell| match cell {
                                Some(CleanedCell::Number { value, .. }) => Some(*value),
                                _ => None,
                            })
                            .collect();
                        Series::new(name.as_str().into(), values)
                    }
                    DataType::Date => {
                        let days: Vec<Option<i32>> = cells
                            .map(|cell| match cell {
                                Some(CleanedCell::Date(date)) => {
                                    i32::try_from((*date - epoch).num_days()).ok()
                                }
                                _ => None,
                            })
                            .collect();
                        Series::new(name.as_str().into(), days).cast(&PolarsType::Date)?
                    }
                    DataType::Boolean => {
                        let values: Vec<Option<bool>> = cells
                            .map(|cell| match cell {
                                Some(CleanedCell::Boolean(flag)) => Some(*flag),
                                _ => None,
                            })
                            .collect();
                        Series::new(name.as_str().into(), values)
                    }
                    DataType::Text | DataType::Categorical => {
                        let values: Vec<Option<&str>> = cells
                            .map(|cell| match cell {
                                Some(CleanedCell::Text(text)) => Some(text.as_str()),
                                _ => None,
                            })
                            .collect();
                        Series::new(name.as_str().into(), values)
                    }
                };
                Ok(Column::from(series))
            })
            .collect::<Result<Vec<Column>>>()?;

        Ok(DataFrame::new(columns)?)
    }
}
