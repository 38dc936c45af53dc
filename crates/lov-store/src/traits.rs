//! The [`DiffStore`] trait defining the diff storage interface.

use std::sync::Arc;

use lov_types::{DiffDocument, DiffNode};

use crate::error::Result;

/// Storage backend for per-document diffs.
///
/// Implementations must be thread-safe (`Send + Sync`). Writes replace a
/// whole path entry atomically; a failed write leaves the previous document
/// untouched. Paths are relative POSIX paths and are normalized on entry.
pub trait DiffStore: Send + Sync {
    /// A consistent, immutable view of every stored diff.
    fn snapshot(&self) -> Result<Arc<DiffDocument>>;

    /// Store `diff` for `path`, replacing any previous entry.
    ///
    /// An empty diff removes the entry instead. Returns `Ok(true)` if an
    /// entry for `path` exists afterwards.
    fn put(&self, path: &str, diff: DiffNode) -> Result<bool>;

    /// Delete the entry for `path`.
    ///
    /// Returns `Ok(true)` if the entry existed and was deleted, `Ok(false)`
    /// if it did not exist.
    fn remove(&self, path: &str) -> Result<bool>;

    /// Read the diff stored for `path`.
    fn get(&self, path: &str) -> Result<Option<DiffNode>> {
        Ok(self.snapshot()?.get(path).cloned())
    }

    fn contains(&self, path: &str) -> Result<bool> {
        Ok(self.snapshot()?.contains(path))
    }

    /// All stored paths in sorted order.
    fn paths(&self) -> Result<Vec<String>> {
        Ok(self.snapshot()?.paths().map(str::to_string).collect())
    }
}
