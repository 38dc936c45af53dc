//! Outcome of replaying stored edits onto a directory of documents.

use lov_diff::PatchWarning;

/// A replay warning attributed to the document it occurred in.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FileWarning {
    pub path: String,
    pub warning: PatchWarning,
}

/// What happened to each stored document during a replay.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ReplayReport {
    /// Documents that were patched and rewritten.
    pub applied: Vec<String>,
    /// Stored documents with no counterpart in the target directory.
    pub missing: Vec<String>,
    /// Documents that could not be read, parsed, or written, with the reason.
    pub failed: Vec<(String, String)>,
    /// Drift detected in the applied documents.
    pub warnings: Vec<FileWarning>,
}

impl ReplayReport {
    /// Returns `true` if every stored edit was applied without drift.
    pub fn is_clean(&self) -> bool {
        self.missing.is_empty() && self.failed.is_empty() && self.warnings.is_empty()
    }

    /// Number of stored documents the replay visited.
    pub fn total(&self) -> usize {
        self.applied.len() + self.missing.len() + self.failed.len()
    }
}
