//! Error types for review-core.

use thiserror::Error;

/// Result type alias using SchedulerError.
pub type Result<T> = std::result::Result<T, SchedulerError>;

/// Errors raised by the key-value medium.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("storage quota exceeded while writing {key}")]
    QuotaExceeded { key: String },

    #[error("storage unavailable: {0}")]
    Unavailable(String),
}

/// Errors that can occur while scheduling or persisting review states.
#[derive(Debug, Error)]
pub enum SchedulerError {
    #[error("grade must be between 0 and 5, got {0}")]
    InvalidGrade(u8),

    #[error("review state is missing {0}")]
    MissingField(&'static str),

    #[error("malformed record: {0}")]
    Malformed(#[from] serde_json::Error),

    #[error("record is not a JSON object")]
    NotAnObject,

    #[error("invalid export format: {0}")]
    InvalidExport(String),

    #[error(transparent)]
    Store(#[from] StoreError),
}
