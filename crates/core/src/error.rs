//! Error types for ragdoc.
//!
//! One enum covers every failure the ingestion and query pipelines can
//! surface. Variants map onto the failure classes callers need to tell
//! apart: bad input, embedding backend, vector store, generation backend.

use thiserror::Error;

/// Unified error type for ragdoc.
///
/// All library functions return `Result<T, AppError>`.
/// We never panic: errors must be represented and propagated.
#[derive(Error, Debug)]
pub enum AppError {
    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// I/O and filesystem errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Invalid caller input (empty question, zero k, malformed document).
    /// Raised before any I/O happens.
    #[error("Invalid input: {0}")]
    Input(String),

    /// Embedding backend unreachable, timed out, or input rejected
    #[error("Embedding error: {0}")]
    Embedding(String),

    /// Vector store missing, corrupt, or conflicting upsert
    #[error("Store error: {0}")]
    Store(String),

    /// Language model call failed or timed out
    #[error("Generation error: {0}")]
    Generation(String),

    /// Prompt template errors
    #[error("Prompt error: {0}")]
    Prompt(String),

    /// Serialization/deserialization errors
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Generic errors
    #[error("{0}")]
    Other(String),
}

impl AppError {
    /// Whether this error was caused by the caller rather than a backend.
    pub fn is_input(&self) -> bool {
        matches!(self, AppError::Input(_))
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::Serialization(err.to_string())
    }
}

impl From<serde_yaml::Error> for AppError {
    fn from(err: serde_yaml::Error) -> Self {
        AppError::Serialization(err.to_string())
    }
}

impl From<rusqlite::Error> for AppError {
    fn from(err: rusqlite::Error) -> Self {
        AppError::Store(err.to_string())
    }
}

/// Convenience type alias for Results with AppError.
pub type AppResult<T> = Result<T, AppError>;
