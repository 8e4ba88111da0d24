//! # Application Errors
//!
//! Failures outside the badge operations themselves: configuration,
//! store start-up, binding the listener.

use badgekeep_core::{BadgeError, StoreError};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("configuration error: {0}")]
    Config(String),

    #[error("I/O error: {0}")]
    Io(String),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Badge(#[from] BadgeError),
}
