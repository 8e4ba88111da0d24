//! # Error Types
//!
//! Two layers of errors:
//! - `StoreError`: what a key-value backend can report
//! - `BadgeError`: what a badge operation reports to its caller
//!
//! The HTTP layer maps `BadgeError` variants onto status codes; nothing in
//! here knows about HTTP.

use thiserror::Error;

/// Errors raised by a `BadgeStore` backend.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    /// The key addressed by a partial update does not exist.
    #[error("key not found: {0}")]
    NotFound(String),

    /// The backend could not be reached or rejected the command.
    #[error("store unavailable: {0}")]
    Unavailable(String),

    /// A stored value could not be decoded as a badge document.
    #[error("stored document for '{key}' is malformed: {reason}")]
    Corrupt { key: String, reason: String },
}

/// Errors raised by the badge operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BadgeError {
    /// The caller did not supply enough input.
    #[error("{0}")]
    MissingParameter(String),

    /// The caller supplied input that cannot be interpreted.
    #[error("{0}")]
    BadRequest(String),

    /// The backing store is unreachable.
    #[error("{0}")]
    Unavailable(String),

    /// Stored state is inconsistent or a worker failed.
    #[error("{0}")]
    Internal(String),
}

impl From<StoreError> for BadgeError {
    fn from(err: StoreError) -> Self {
        match err {
            // Only partial updates report NotFound, and the caller should
            // have checked existence first.
            StoreError::NotFound(_) => Self::MissingParameter("Badge name not found".to_string()),
            StoreError::Unavailable(msg) => Self::Unavailable(msg),
            corrupt @ StoreError::Corrupt { .. } => Self::Internal(corrupt.to_string()),
        }
    }
}
