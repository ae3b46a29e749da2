//! Export of the cleaned dataset and the replay script.
//!
//! Both outputs are pure functions of the parsed table, the confirmed
//! schema and the export configuration: identical inputs give identical
//! bytes. Export never reads profiling results other than the forward-filled
//! rows, and only when forward filling is enabled.

mod dataset;
mod script;

pub use dataset::{CleanedCell, CleanedDataset, EXPORT_DATE_FORMAT};
pub use script::{ScriptSource, render_script};

use crate::config::ExportConfig;
use crate::confirmation::ConfirmedSchema;
use crate::error::{CleaningError, Result};
use crate::parser::RawTable;
use crate::types::{CleanedRow, ProfileReport};
use tracing::debug;

/// Prefix of the cleaned file name.
pub const CLEANED_FILE_PREFIX: &str = "cleaned_";

/// Name of the cleaned file for a given input file name.
pub fn cleaned_file_name(file_name: &str) -> String {
    format!("{CLEANED_FILE_PREFIX}{file_name}")
}

/// Generates export artifacts from a confirmed schema.
pub struct ExportGenerator<'a> {
    schema: &'a ConfirmedSchema,
    config: &'a ExportConfig,
}

impl<'a> ExportGenerator<'a> {
    pub fn new(schema: &'a ConfirmedSchema, config: &'a ExportConfig) -> Self {
        Self { schema, config }
    }

    /// Coerce the table according to the configuration.
    ///
    /// Reads the raw rows by default and the forward-filled rows when
    /// `forward_fill` is enabled.
    pub fn cleaned_dataset(&self, table: &RawTable, imputed: &[CleanedRow]) -> Result<CleanedDataset> {
        if self.config.forward_fill {
            self.check_header(table.header())?;
            Ok(self.coerce_rows(
                imputed
                    .iter()
                    .map(|row| row.values().iter().map(String::as_str).collect()),
            ))
        } else {
            self.coerce_table(table)
        }
    }

    /// Coerce the raw rows of a table.
    pub fn coerce_table(&self, table: &RawTable) -> Result<CleanedDataset> {
        self.check_header(table.header())?;
        // short rows read as empty, cells beyond the header are ignored
        Ok(self.coerce_rows(
            table
                .rows()
                .iter()
                .map(|row| row.iter().map(String::as_str).collect()),
        ))
    }

    /// The replay script for the file described by `report`.
    pub fn script(&self, report: &ProfileReport) -> String {
        render_script(
            self.schema,
            ScriptSource {
                file_name: &report.file_name,
                file_hash: &report.file_hash,
                script_name: &self.config.script_name,
            },
            self.config.forward_fill,
        )
    }

    fn coerce_rows<'r>(&self, rows: impl Iterator<Item = Vec<&'r str>>) -> CleanedDataset {
        let types = self.schema.types();
        let rows: Vec<Vec<CleanedCell>> = rows
            .map(|cells| {
                types
                    .iter()
                    .enumerate()
                    .map(|(index, data_type)| {
                        let cell = cells.get(index).copied().unwrap_or("");
                        CleanedCell::coerce(cell, *data_type)
                    })
                    .collect()
            })
            .collect();

        debug!(
            "Coerced {} rows x {} columns (forward fill: {})",
            rows.len(),
            types.len(),
            self.config.forward_fill
        );

        CleanedDataset::new(self.schema.header().to_vec(), types.to_vec(), rows)
    }

    fn check_header(&self, header: &[String]) -> Result<()> {
        if header != self.schema.header() {
            return Err(CleaningError::SchemaMismatch(format!(
                "schema has [{}], table has [{}]",
                self.schema.header().join(", "),
                header.join(", ")
            )));
        }
        Ok(())
    }
}
