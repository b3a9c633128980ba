//! Error types for the firestorm engine.
//!
//! The engine distinguishes three fatal conditions that always indicate a
//! caller bug rather than a transient failure:
//! - [`Error::EmptyInput`]: nothing to aggregate or normalize against
//! - [`Error::InsufficientData`]: too few intervals for segmentation
//! - [`Error::UnknownCategory`]: configuration names a column or value that
//!   does not exist in the record schema
//!
//! These propagate unmodified. Everything else irregular (sparse categories,
//! bursts that never subside, zero breakpoints) is a normal return value.
//!
//! Errors serialize to structured JSON for the CLI:
//! ```json
//! {
//!   "code": 21,
//!   "category": "input",
//!   "message": "not enough data: segmentation needs at least 2 intervals, got 1"
//! }
//! ```

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Result type alias for engine operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Error categories for grouping related errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCategory {
    /// Configuration, catalog, and schema errors.
    Config,
    /// Empty or degenerate record collections.
    Input,
    /// File I/O and serialization errors.
    Io,
}

impl std::fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ErrorCategory::Config => write!(f, "config"),
            ErrorCategory::Input => write!(f, "input"),
            ErrorCategory::Io => write!(f, "io"),
        }
    }
}

/// Unified error type for the firestorm engine.
#[derive(Error, Debug)]
pub enum Error {
    // Configuration errors (10-19)
    #[error("configuration error: {0}")]
    Config(String),

    #[error("unknown category: column '{column}' has no value '{value}'")]
    UnknownCategory { column: String, value: String },

    #[error("unknown rate column: {0}")]
    UnknownColumn(String),

    // Input errors (20-29)
    #[error("empty input: {0}")]
    EmptyInput(String),

    #[error("not enough data: {context} needs at least {required} intervals, got {actual}")]
    InsufficientData {
        context: String,
        required: usize,
        actual: usize,
    },

    #[error("invalid timestamp: {0}")]
    InvalidTimestamp(String),

    // I/O errors (60-69)
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),
}

impl Error {
    /// Returns the error code for this error type.
    ///
    /// Error codes are stable and grouped by category:
    /// - 10-19: Configuration errors
    /// - 20-29: Input errors
    /// - 60-69: I/O errors
    pub fn code(&self) -> u32 {
        match self {
            Error::Config(_) => 10,
            Error::UnknownCategory { .. } => 11,
            Error::UnknownColumn(_) => 12,
            Error::EmptyInput(_) => 20,
            Error::InsufficientData { .. } => 21,
            Error::InvalidTimestamp(_) => 22,
            Error::Io(_) => 60,
            Error::Json(_) => 61,
        }
    }

    /// Returns the error category for grouping and filtering.
    pub fn category(&self) -> ErrorCategory {
        match self {
            Error::Config(_) | Error::UnknownCategory { .. } | Error::UnknownColumn(_) => {
                ErrorCategory::Config
            }
            Error::EmptyInput(_) | Error::InsufficientData { .. } | Error::InvalidTimestamp(_) => {
                ErrorCategory::Input
            }
            Error::Io(_) | Error::Json(_) => ErrorCategory::Io,
        }
    }

    /// Shorthand for [`Error::UnknownCategory`].
    pub fn unknown_category(column: impl Into<String>, value: impl Into<String>) -> Self {
        Error::UnknownCategory {
            column: column.into(),
            value: value.into(),
        }
    }

    /// Shorthand for [`Error::InsufficientData`].
    pub fn insufficient(context: impl Into<String>, required: usize, actual: usize) -> Self {
        Error::InsufficientData {
            context: context.into(),
            required,
            actual,
        }
    }

    /// Structured form for machine-readable output.
    pub fn to_structured(&self) -> StructuredError {
        StructuredError {
            code: self.code(),
            category: self.category(),
            message: self.to_string(),
        }
    }
}

/// Serializable error payload.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StructuredError {
    pub code: u32,
    pub category: ErrorCategory,
    pub message: String,
}
