//! Error types for NetFS.

use thiserror::Error;

/// Common error type for NetFS.
#[derive(Error, Debug)]
pub enum NetfsError {
    /// Database error.
    ///
    /// Errors from sqlx are converted into this variant.
    #[error("database error: {0}")]
    Database(String),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The request collides with existing tree state (type mismatch, name clash).
    #[error("conflict: {0}")]
    Conflict(String),

    /// Resource not found.
    #[error("{0} not found")]
    NotFound(String),

    /// Malformed input from the caller.
    #[error("bad request: {0}")]
    BadRequest(String),

    /// Blob storage could not be read or written.
    #[error("storage error: {0}")]
    Storage(String),

    /// Configuration error.
    #[error("configuration error: {0}")]
    Config(String),
}

impl From<sqlx::Error> for NetfsError {
    fn from(e: sqlx::Error) -> Self {
        NetfsError::Database(e.to_string())
    }
}

/// Result type alias for NetFS operations.
pub type Result<T> = std::result::Result<T, NetfsError>;
