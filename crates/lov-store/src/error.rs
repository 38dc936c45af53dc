//! Error types for store operations.

use thiserror::Error;

/// Errors that can occur while reading or writing stored diffs.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The stored document or a submitted path is invalid.
    #[error("invalid diff document: {0}")]
    Document(#[from] lov_types::TypeError),

    /// A lock guarding the in-memory document was poisoned.
    #[error("lock poisoned: {0}")]
    LockPoisoned(String),

    /// I/O error while reading or persisting the diff file.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// Convenience type alias for store operations.
pub type Result<T> = std::result::Result<T, StoreError>;
