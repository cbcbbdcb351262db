// Error types for the task store

use thiserror::Error;

/// Errors surfaced by [`TaskStore`](crate::TaskStore) operations.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Rejected input on create (empty description, out-of-range deadline).
    #[error("Invalid task: {0}")]
    Validation(String),

    /// No task carries the requested id.
    #[error("Task not found: {id}")]
    NotFound { id: i64 },

    /// Underlying SQLite failure (I/O, corruption, permissions).
    #[error("Storage error: {0}")]
    Storage(#[from] rusqlite::Error),

    /// The database holds data that breaks a store invariant.
    #[error("Integrity error: {0}")]
    Integrity(String),
}

impl StoreError {
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn not_found(id: i64) -> Self {
        Self::NotFound { id }
    }

    /// True for outcomes the user can recover from by changing their input.
    pub fn is_user_error(&self) -> bool {
        matches!(self, Self::Validation(_) | Self::NotFound { .. })
    }
}

/// Result type for task store operations.
pub type Result<T> = std::result::Result<T, StoreError>;
