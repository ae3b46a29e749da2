//! Operator confirmation of column types.
//!
//! Detected types are suggestions. Export only proceeds from a
//! [`ConfirmedSchema`], which can only be obtained by sealing a store in
//! which every column has been confirmed.

use crate::error::{CleaningError, Result};
use crate::types::{ConfirmedBy, ConfirmedType, DataType};
use chrono::Utc;
use serde::Serialize;
use std::collections::{HashMap, HashSet};
use tracing::debug;

/// Confirmed types keyed by column name.
#[derive(Debug, Clone)]
pub struct ConfirmationStore {
    header: Vec<String>,
    confirmed: HashMap<String, ConfirmedType>,
}

impl ConfirmationStore {
    /// Create an empty store for the given header.
    pub fn new(header: &[String]) -> Self {
        Self {
            header: header.to_vec(),
            confirmed: HashMap::new(),
        }
    }

    /// Confirm a column type, replacing any earlier confirmation.
    pub fn confirm(&mut self, column: &str, data_type: DataType) -> &ConfirmedType {
        debug!("Confirmed {} as {}", column, data_type);
        let entry = ConfirmedType {
            data_type,
            confirmed_by: ConfirmedBy::User,
            timestamp: Utc::now(),
        };
        self.confirmed.insert(column.to_string(), entry);
        &self.confirmed[column]
    }

    pub fn get(&self, column: &str) -> Option<&ConfirmedType> {
        self.confirmed.get(column)
    }

    pub fn header(&self) -> &[String] {
        &self.header
    }

    /// Check whether a column name appears in the header.
    pub fn has_column(&self, column: &str) -> bool {
        self.header.iter().any(|name| name == column)
    }

    /// Number of confirmed entries.
    pub fn confirmed_count(&self) -> usize {
        self.confirmed.len()
    }

    /// Distinct header names still awaiting confirmation, in header order.
    pub fn pending_columns(&self) -> Vec<String> {
        let mut seen = HashSet::new();
        self.header
            .iter()
            .filter(|name| !self.confirmed.contains_key(*name))
            .filter(|name| seen.insert(name.as_str()))
            .cloned()
            .collect()
    }

    /// Confirmed and total distinct header names.
    pub fn progress(&self) -> (usize, usize) {
        let distinct: HashSet<&str> = self.header.iter().map(String::as_str).collect();
        let confirmed = distinct
            .iter()
            .filter(|name| self.confirmed.contains_key(**name))
            .count();
        (confirmed, distinct.len())
    }

    /// Every distinct header name has a confirmed type.
    pub fn is_complete(&self) -> bool {
        self.header
            .iter()
            .all(|name| self.confirmed.contains_key(name))
    }

    /// Freeze a complete store into the schema export reads from.
    pub fn seal(&self) -> Result<ConfirmedSchema> {
        let pending = self.pending_columns();
        if !pending.is_empty() {
            return Err(CleaningError::IncompleteConfirmation { pending });
        }

        let types = self
            .header
            .iter()
            .map(|name| {
                self.confirmed
                    .get(name)
                    .map(|entry| entry.data_type)
                    .ok_or_else(|| CleaningError::Internal(format!("lost confirmation for {name}")))
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(ConfirmedSchema {
            header: self.header.clone(),
            types,
        })
    }
}

/// Header plus one confirmed type per position.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ConfirmedSchema {
    header: Vec<String>,
    types: Vec<DataType>,
}

impl ConfirmedSchema {
    pub fn header(&self) -> &[String] {
        &self.header
    }

    /// Confirmed types aligned with [`header`](Self::header).
    pub fn types(&self) -> &[DataType] {
        &self.types
    }

    /// Pairs of column name and confirmed type, in header order.
    pub fn columns(&self) -> impl Iterator<Item = (&str, DataType)> + '_ {
        self.header
            .iter()
            .map(String::as_str)
            .zip(self.types.iter().copied())
    }

    pub fn len(&self) -> usize {
        self.header.len()
    }

    pub fn is_empty(&self) -> bool {
        self.header.is_empty()
    }
}

static_assertions::assert_impl_all!(ConfirmedSchema: Send, Sync);
