//! Custom error types for the profiling and export pipeline.
//!
//! Data-quality problems never surface here: ragged rows, unparseable values
//! and degenerate statistics all have deterministic fallbacks. The variants
//! below cover caller mistakes (exporting too early, unknown columns), bad
//! configuration and I/O.
//!
//! Errors are serializable so they can be handed to a UI layer as
//! `{ "code": ..., "message": ... }`.

use serde::Serialize;
use serde::ser::SerializeStruct;
use thiserror::Error;

/// The main error type for the cleaning pipeline.
#[derive(Error, Debug)]
pub enum CleaningError {
    /// Export was requested before every column had a confirmed type.
    #[error("Export requires every column to be confirmed; pending: {}", pending.join(", "))]
    IncompleteConfirmation { pending: Vec<String> },

    /// Column was not found in the profiled dataset.
    #[error("Column '{0}' not found in dataset")]
    UnknownColumn(String),

    /// A confirmed schema was applied to a table with a different header.
    #[error("Confirmed schema does not match the table header: {0}")]
    SchemaMismatch(String),

    /// Invalid configuration provided.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Internal error (e.g., worker thread panic).
    #[error("Internal error: {0}")]
    Internal(String),

    /// IO error wrapper.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Polars error wrapper.
    #[error("Polars error: {0}")]
    Polars(#[from] polars::error::PolarsError),

    /// JSON serialization/deserialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Generic error with context.
    #[error("{context}: {source}")]
    WithContext {
        context: String,
        #[source]
        source: Box<CleaningError>,
    },
}

impl CleaningError {
    /// Add context to an error.
    pub fn with_context(self, context: impl Into<String>) -> Self {
        CleaningError::WithContext {
            context: context.into(),
            source: Box::new(self),
        }
    }

    /// Get error code for frontend handling.
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::IncompleteConfirmation { .. } => "INCOMPLETE_CONFIRMATION",
            Self::UnknownColumn(_) => "UNKNOWN_COLUMN",
            Self::SchemaMismatch(_) => "SCHEMA_MISMATCH",
            Self::InvalidConfig(_) => "INVALID_CONFIG",
            Self::Internal(_) => "INTERNAL_ERROR",
            Self::Io(_) => "IO_ERROR",
            Self::Polars(_) => "POLARS_ERROR",
            Self::Json(_) => "JSON_ERROR",
            Self::WithContext { source, .. } => source.error_code(),
        }
    }

    /// Check if this error is a rejected export precondition.
    pub fn is_incomplete_confirmation(&self) -> bool {
        match self {
            Self::IncompleteConfirmation { .. } => true,
            Self::WithContext { source, .. } => source.is_incomplete_confirmation(),
            _ => false,
        }
    }

    /// Check if the operator can fix this error without restarting the run.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            Self::IncompleteConfirmation { .. } | Self::UnknownColumn(_) | Self::InvalidConfig(_)
        )
    }
}

/// Errors are serialized as a struct with `code` and `message` fields.
impl Serialize for CleaningError {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        let mut state = serializer.serialize_struct("CleaningError", 2)?;
        state.serialize_field("code", &self.error_code())?;
        state.serialize_field("message", &self.to_string())?;
        state.end()
    }
}

/// Result type alias for pipeline operations.
pub type Result<T> = std::result::Result<T, CleaningError>;

/// Extension trait for adding context to Results.
pub trait ResultExt<T> {
    /// Add context to an error result.
    fn context(self, context: impl Into<String>) -> Result<T>;
}

impl<T> ResultExt<T> for Result<T> {
    fn context(self, context: impl Into<String>) -> Result<T> {
        self.map_err(|e| e.with_context(context))
    }
}

impl<T> ResultExt<T> for std::result::Result<T, std::io::Error> {
    fn context(self, context: impl Into<String>) -> Result<T> {
        self.map_err(|e| CleaningError::Io(e).with_context(context))
    }
}
