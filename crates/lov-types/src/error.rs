use thiserror::Error;

/// Errors produced while decoding or organizing overlay data.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TypeError {
    #[error("malformed diff at {path}: {reason}")]
    MalformedDiff { path: String, reason: String },

    #[error("invalid document path {path:?}: {reason}")]
    InvalidPath { path: String, reason: String },

    #[error("serialization error: {0}")]
    Serialization(String),
}

/// Convenience alias for type-level results.
pub type TypeResult<T> = Result<T, TypeError>;
