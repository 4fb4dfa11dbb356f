//! Error types for the pulsestore core engine.

use thiserror::Error;

/// Result type for core operations.
pub type CoreResult<T> = Result<T, CoreError>;

/// Errors that can occur in core engine operations.
///
/// Expected read/write outcomes (not-found, gone, not-modified, idempotent
/// repeats) are **not** errors - they are modeled as result variants on the
/// individual operations. Only authorization failures, malformed input and
/// collaborator failures surface here.
#[derive(Debug, Error)]
pub enum CoreError {
    /// Storage backend error.
    #[error("storage error: {0}")]
    Storage(#[from] pulsestore_storage::StorageError),

    /// A stored document could not be decoded.
    #[error("codec error: {0}")]
    Codec(#[from] serde_json::Error),

    /// The caller lacks the scope required for the operation.
    #[error("unauthorized: missing {scope} scope")]
    Unauthorized {
        /// The scope that was required but not granted.
        scope: crate::scope::Scope,
    },

    /// An incoming record is missing identity fields or is otherwise invalid.
    #[error("malformed record: {message}")]
    MalformedRecord {
        /// Description of what is wrong with the record.
        message: String,
    },

    /// A record field has the wrong type for the operation.
    #[error("invalid field {field}: {message}")]
    InvalidField {
        /// Name of the offending field.
        field: String,
        /// Description of the problem.
        message: String,
    },
}

impl CoreError {
    /// Creates a malformed record error.
    pub fn malformed(message: impl Into<String>) -> Self {
        Self::MalformedRecord {
            message: message.into(),
        }
    }

    /// Creates an invalid field error.
    pub fn invalid_field(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidField {
            field: field.into(),
            message: message.into(),
        }
    }

    /// Returns `true` when the error should surface as an auth failure (401).
    #[must_use]
    pub fn is_unauthorized(&self) -> bool {
        matches!(self, CoreError::Unauthorized { .. })
    }

    /// Returns `true` when the error is the caller's fault (4xx).
    #[must_use]
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            CoreError::Unauthorized { .. }
                | CoreError::MalformedRecord { .. }
                | CoreError::InvalidField { .. }
        )
    }
}
