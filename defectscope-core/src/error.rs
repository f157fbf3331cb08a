//! Error types for defectscope-core

use thiserror::Error;

/// Main error type for the defectscope-core library
#[derive(Error, Debug)]
pub enum Error {
    /// Snapshot store error
    #[error("storage error: {0}")]
    Storage(#[from] rusqlite::Error),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// CSV reader error
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// JSON parsing error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Import error for a specific export file
    #[error("import error in {path}: {message}")]
    Import { path: String, message: String },

    /// Configuration error
    #[error("configuration error: {0}")]
    Config(String),

    /// Invalid input passed to an aggregation or query
    #[error("invalid input: {0}")]
    InvalidInput(String),
}

/// Result type alias for defectscope-core
pub type Result<T> = std::result::Result<T, Error>;
