//! Error types for the diff crate.

use lov_types::{JsonPath, TypeError};

/// Errors that can occur while validating or computing a diff.
#[derive(Debug, thiserror::Error)]
pub enum DiffError {
    /// The edited document does not have the same shape as the original.
    #[error("structure mismatch at {path}: {reason}")]
    StructureMismatch { path: JsonPath, reason: String },

    /// A container was compared against a value of another type.
    #[error("schema mismatch at {path}: expected {expected}, found {found}")]
    SchemaMismatch {
        path: JsonPath,
        expected: &'static str,
        found: &'static str,
    },

    /// Encoding or decoding of diff data failed.
    #[error("diff model error: {0}")]
    Model(#[from] TypeError),
}

/// Convenience alias for diff results.
pub type DiffResult<T> = Result<T, DiffError>;
