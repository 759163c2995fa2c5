//! Error types for the store module.

use keygate_core::CoreError;
use thiserror::Error;

/// Errors that can occur during store operations.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Database error from SQLite.
    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),

    /// Artifact encoding or decoding failed.
    #[error("serialization error: {0}")]
    Serialization(String),

    /// No artifact stored under this record id.
    #[error("record not found: {0}")]
    NotFound(String),

    /// Stored bytes do not describe the record they are filed under.
    #[error("invalid data: {0}")]
    InvalidData(String),

    /// Migration error.
    #[error("migration error: {0}")]
    Migration(String),

    /// A blocking database task panicked or was cancelled.
    #[error("store task failed: {0}")]
    Task(String),
}

impl From<CoreError> for StoreError {
    fn from(e: CoreError) -> Self {
        StoreError::Serialization(e.to_string())
    }
}

/// Result type for store operations.
pub type Result<T> = std::result::Result<T, StoreError>;
