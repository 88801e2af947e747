//! Core error types for focusroom-core.
//!
//! Persistence failures are never fatal to the timer: they travel up as
//! [`StoreError`] values (or `Event::SessionRecordFailed`) while the countdown
//! keeps going. Validation failures are raised before any state is touched.

use std::path::PathBuf;
use thiserror::Error;

/// Core error type for focusroom-core.
#[derive(Error, Debug)]
pub enum CoreError {
    /// Remote or local store failures
    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    /// Validation errors
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// The clock needs a tokio runtime to run on.
    #[error("Runtime error: {0}")]
    Runtime(String),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl CoreError {
    /// True when the error came from the store boundary (as opposed to bad input).
    pub fn is_persistence(&self) -> bool {
        matches!(self, CoreError::Store(_))
    }
}

/// Errors crossing the session/settings store boundary.
#[derive(Error, Debug)]
pub enum StoreError {
    /// The store could not be reached at all.
    #[error("Store unavailable: {0}")]
    Unavailable(String),

    /// The store answered but refused the request.
    #[error("Store rejected request (status {status}): {message}")]
    Rejected { status: u16, message: String },

    /// Nothing stored under the requested key.
    #[error("Not found: {0}")]
    NotFound(String),

    /// HTTP transport errors
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// SQLite errors
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    /// Payload could not be encoded or decoded
    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl From<serde_json::Error> for StoreError {
    fn from(err: serde_json::Error) -> Self {
        StoreError::Serialization(err.to_string())
    }
}

impl From<tokio::task::JoinError> for StoreError {
    fn from(err: tokio::task::JoinError) -> Self {
        StoreError::Unavailable(format!("store task failed: {err}"))
    }
}

/// Configuration-specific errors.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Failed to load configuration
    #[error("Failed to load configuration from {path}: {message}")]
    LoadFailed { path: PathBuf, message: String },

    /// Failed to save configuration
    #[error("Failed to save configuration to {path}: {message}")]
    SaveFailed { path: PathBuf, message: String },

    /// Invalid configuration value
    #[error("Invalid configuration value for '{key}': {message}")]
    InvalidValue { key: String, message: String },

    /// Unknown configuration key
    #[error("Unknown configuration key: {0}")]
    UnknownKey(String),

    /// No usable data directory
    #[error("Could not determine data directory: {0}")]
    DataDir(String),
}

/// Validation errors.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// Numeric field outside its allowed range
    #[error("'{field}' must be between {min} and {max} (got {value})")]
    OutOfRange {
        field: &'static str,
        value: i64,
        min: i64,
        max: i64,
    },

    /// Invalid value
    #[error("Invalid value for '{field}': {message}")]
    InvalidValue { field: String, message: String },
}

/// Result type alias for CoreError
pub type Result<T, E = CoreError> = std::result::Result<T, E>;
