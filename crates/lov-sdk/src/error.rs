use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum WorkshopError {
    #[error("edit rejected: {0}")]
    Diff(#[from] lov_diff::DiffError),

    #[error("store error: {0}")]
    Store(#[from] lov_store::StoreError),

    #[error("invalid data: {0}")]
    Type(#[from] lov_types::TypeError),

    #[error("document not found: {}", .0.display())]
    DocumentNotFound(PathBuf),

    #[error("invalid JSON in {}: {reason}", .path.display())]
    InvalidDocument { path: PathBuf, reason: String },

    #[error("invalid configuration: {0}")]
    Config(String),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl WorkshopError {
    /// Returns `true` if the error is an edit that changed the document's
    /// shape. The user can fix the edit and save again.
    pub fn is_structure_mismatch(&self) -> bool {
        matches!(
            self,
            Self::Diff(lov_diff::DiffError::StructureMismatch { .. })
        )
    }
}

pub type WorkshopResult<T> = Result<T, WorkshopError>;
