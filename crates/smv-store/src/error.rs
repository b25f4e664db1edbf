//! Error types for store operations.

use thiserror::Error;

/// Result type for store operations.
pub type StoreResult<T> = Result<T, StoreError>;

/// Errors that can occur in the entity store.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Story not found: {0}")]
    StoryNotFound(i64),

    #[error("Shot not found: {0}")]
    ShotNotFound(String),

    #[error("Invariant violation: {0}")]
    InvariantViolation(String),
}

impl StoreError {
    pub fn invariant(message: impl Into<String>) -> Self {
        Self::InvariantViolation(message.into())
    }
}
