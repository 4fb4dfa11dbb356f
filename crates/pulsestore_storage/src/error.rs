//! Error types for storage operations.

use std::io;
use thiserror::Error;

/// Result type for storage operations.
pub type StorageResult<T> = Result<T, StorageError>;

/// Errors that can occur during storage operations.
#[derive(Debug, Error)]
pub enum StorageError {
    /// An I/O error occurred.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// A stored document is corrupted or unreadable.
    #[error("storage corrupted: {0}")]
    Corrupted(String),

    /// The storage is closed.
    #[error("storage is closed")]
    Closed,

    /// Implementation-defined backend failure.
    #[error("backend error: {0}")]
    Backend(String),
}

impl StorageError {
    /// Creates a backend error from any displayable cause.
    pub fn backend(message: impl Into<String>) -> Self {
        StorageError::Backend(message.into())
    }
}
