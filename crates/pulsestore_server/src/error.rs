//! Error types for the HTTP boundary.

use thiserror::Error;

/// Result type for server operations.
pub type ServerResult<T> = Result<T, ServerError>;

/// Errors that can occur at the HTTP boundary.
///
/// Expected read outcomes (not-found, gone, not-modified) never appear
/// here; they travel as result variants and are mapped to status codes by
/// the handler. These errors are the genuinely exceptional paths.
#[derive(Error, Debug)]
pub enum ServerError {
    /// Missing, invalid or insufficient access token.
    #[error("not authorized: {0}")]
    NotAuthorized(String),

    /// The request body or parameters are invalid.
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    /// Core engine failure.
    #[error("core error: {0}")]
    Core(#[from] pulsestore_core::CoreError),

    /// Internal server error.
    #[error("internal error: {0}")]
    Internal(String),
}

impl ServerError {
    /// Returns true if this is a client error (4xx).
    #[must_use]
    pub fn is_client_error(&self) -> bool {
        match self {
            ServerError::NotAuthorized(_) | ServerError::InvalidRequest(_) => true,
            ServerError::Core(core) => core.is_client_error(),
            ServerError::Internal(_) => false,
        }
    }

    /// Returns the HTTP status code this error maps to.
    #[must_use]
    pub fn status_code(&self) -> u16 {
        match self {
            ServerError::NotAuthorized(_) => 401,
            ServerError::InvalidRequest(_) => 400,
            ServerError::Core(core) if core.is_unauthorized() => 401,
            ServerError::Core(core) if core.is_client_error() => 400,
            ServerError::Core(_) | ServerError::Internal(_) => 500,
        }
    }
}
