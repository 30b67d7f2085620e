//! Error types for lexguard.
//!
//! This module defines all error types used throughout the lexguard crate.
//! Build-phase misuse of the automaton is reported as a value rather than a
//! panic so a long-lived service can reject a bad dictionary and keep serving
//! with the previous one.

use std::path::PathBuf;
use thiserror::Error;

/// The main error type for lexguard operations.
#[derive(Error, Debug)]
pub enum Error {
    // === Automaton Errors ===
    /// An operation was attempted in the wrong lifecycle phase.
    #[error("cannot {operation}: automaton is {state}")]
    IllegalState {
        /// The rejected operation.
        operation: &'static str,
        /// The phase the automaton was in.
        state: &'static str,
    },

    /// A pattern index outside the registered range was looked up.
    #[error("pattern index {index} out of range (0..{len})")]
    IndexOutOfRange {
        /// The requested index.
        index: usize,
        /// Number of registered patterns.
        len: usize,
    },

    // === Dictionary Errors ===
    /// A dictionary record had fewer than the required fields.
    #[error("malformed dictionary record on line {line}: expected 3 fields, found {fields}")]
    MalformedRecord {
        /// 1-based line number of the record.
        line: usize,
        /// Number of fields found.
        fields: usize,
    },

    /// Failed to read the dictionary source.
    #[error("failed to read dictionary at {path}: {source}")]
    DictionaryRead {
        /// Path to the dictionary file.
        path: PathBuf,
        /// The underlying error.
        #[source]
        source: std::io::Error,
    },

    // === Configuration Errors ===
    /// Failed to load configuration.
    #[error("failed to load configuration: {0}")]
    ConfigLoad(Box<figment::Error>),

    /// Configuration validation failed.
    #[error("invalid configuration: {message}")]
    ConfigValidation {
        /// Description of the validation failure.
        message: String,
    },

    // === I/O Errors ===
    /// File system operation failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    // === Serialization Errors ===
    /// JSON serialization failed.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// A specialized Result type for lexguard operations.
pub type Result<T> = std::result::Result<T, Error>;

impl From<figment::Error> for Error {
    fn from(err: figment::Error) -> Self {
        Self::ConfigLoad(Box::new(err))
    }
}

impl Error {
    /// Create an illegal state error.
    #[must_use]
    pub fn illegal_state(operation: &'static str, state: &'static str) -> Self {
        Self::IllegalState { operation, state }
    }

    /// Create a configuration validation error.
    #[must_use]
    pub fn config_validation(message: impl Into<String>) -> Self {
        Self::ConfigValidation {
            message: message.into(),
        }
    }

    /// Check if this error is a lifecycle violation.
    #[must_use]
    pub fn is_illegal_state(&self) -> bool {
        matches!(self, Self::IllegalState { .. })
    }

    /// Check if this error is a malformed dictionary record.
    #[must_use]
    pub fn is_malformed_record(&self) -> bool {
        matches!(self, Self::MalformedRecord { .. })
    }
}
