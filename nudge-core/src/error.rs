//! Error types for nudge-core

use thiserror::Error;

/// Main error type for the nudge-core library
///
/// Sparse or low-activity data is never an error: detectors return empty
/// results instead. Errors exist for IO, serialization, configuration, and
/// caller contract violations only.
#[derive(Error, Debug)]
pub enum Error {
    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON parsing error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Configuration error
    #[error("configuration error: {0}")]
    Config(String),

    /// Caller violated an input contract
    #[error("invalid input: {0}")]
    InvalidInput(String),
}

/// Result type alias for nudge-core
pub type Result<T> = std::result::Result<T, Error>;
