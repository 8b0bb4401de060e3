//! Error types for the store module.

use thiserror::Error;

/// Errors that can occur during store operations.
///
/// These are all fatal from the caller's point of view: policy outcomes
/// such as a missing document or a duplicate grant are reported through
/// return values, not errors.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Database error from SQLite.
    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),

    /// A uniqueness rule outside the grant table was violated.
    #[error("conflict: {0}")]
    Conflict(String),

    /// A row references something that does not exist.
    #[error("dangling reference: {0}")]
    DanglingReference(String),

    /// Invalid data in storage.
    #[error("invalid data: {0}")]
    InvalidData(String),

    /// Migration error.
    #[error("migration error: {0}")]
    Migration(String),

    /// A lock guarding the store was poisoned by a panicking writer.
    #[error("store lock poisoned: {0}")]
    LockPoisoned(String),

    /// A blocking task could not be joined.
    #[error("blocking task failed: {0}")]
    Task(String),
}

/// Result type for store operations.
pub type Result<T> = std::result::Result<T, StoreError>;
