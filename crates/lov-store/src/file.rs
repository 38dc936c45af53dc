//! JSON-file backed diff store.
//!
//! The whole [`DiffDocument`] lives in one JSON file (conventionally
//! `changes.json` inside the workshop directory). Every write renders the
//! updated document to a temporary file in the same directory and renames it
//! over the original, so readers of the file never observe a partial write.

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::{Arc, RwLock};

use lov_types::{DiffDocument, DiffNode};
use tracing::{debug, info};

use crate::error::{Result, StoreError};
use crate::traits::DiffStore;

/// A [`DiffStore`] persisted as a single indented JSON file.
#[derive(Debug)]
pub struct FileDiffStore {
    path: PathBuf,
    indent: usize,
    document: RwLock<Arc<DiffDocument>>,
}

impl FileDiffStore {
    /// Open the store at `path`, creating an empty `{}` file (and its parent
    /// directories) if it does not exist yet.
    pub fn open(path: &Path, indent: usize) -> Result<Self> {
        let document = if path.exists() {
            let text = fs::read_to_string(path)?;
            DiffDocument::from_json_str(&text)?
        } else {
            let empty = DiffDocument::new();
            atomic_write(path, empty.to_json_string(indent)?.as_bytes())?;
            info!(path = %path.display(), "created empty diff store");
            empty
        };

        debug!(path = %path.display(), entries = document.len(), "diff store opened");

        Ok(Self {
            path: path.to_path_buf(),
            indent,
            document: RwLock::new(Arc::new(document)),
        })
    }

    /// Location of the backing file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Re-read the backing file, discarding the cached document.
    pub fn reload(&self) -> Result<()> {
        let text = fs::read_to_string(&self.path)?;
        let fresh = DiffDocument::from_json_str(&text)?;
        let mut document = self
            .document
            .write()
            .map_err(|e| StoreError::LockPoisoned(e.to_string()))?;
        *document = Arc::new(fresh);
        Ok(())
    }

    /// Apply `edit` to a copy of the current document, persist the copy, and
    /// only then publish it.
    fn update<R>(&self, edit: impl FnOnce(&mut DiffDocument) -> Result<R>) -> Result<R> {
        let mut document = self
            .document
            .write()
            .map_err(|e| StoreError::LockPoisoned(e.to_string()))?;

        let mut next = DiffDocument::clone(&document);
        let outcome = edit(&mut next)?;
        atomic_write(&self.path, next.to_json_string(self.indent)?.as_bytes())?;
        debug!(path = %self.path.display(), entries = next.len(), "diff store persisted");

        *document = Arc::new(next);
        Ok(outcome)
    }
}

impl DiffStore for FileDiffStore {
    fn snapshot(&self) -> Result<Arc<DiffDocument>> {
        let document = self
            .document
            .read()
            .map_err(|e| StoreError::LockPoisoned(e.to_string()))?;
        Ok(Arc::clone(&document))
    }

    fn put(&self, path: &str, diff: DiffNode) -> Result<bool> {
        self.update(|document| Ok(document.set(path, diff)?))
    }

    fn remove(&self, path: &str) -> Result<bool> {
        if !self.contains(path)? {
            return Ok(false);
        }
        self.update(|document| Ok(document.remove(path).is_some()))
    }
}

/// Replace the file at `path` with `contents` via a same-directory temporary
/// file and rename.
pub fn atomic_write(path: &Path, contents: &[u8]) -> Result<()> {
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    fs::create_dir_all(dir)?;

    let mut tmp = tempfile::NamedTempFile::new_in(dir)?;
    tmp.write_all(contents)?;
    tmp.as_file().sync_all()?;
    tmp.persist(path).map_err(|e| StoreError::Io(e.error))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn diff(value: serde_json::Value) -> DiffNode {
        DiffNode::from_value(&value).unwrap()
    }

    #[test]
    fn open_creates_empty_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("workshop").join("changes.json");
        let store = FileDiffStore::open(&path, 4).unwrap();
        assert!(store.snapshot().unwrap().is_empty());
        assert_eq!(fs::read_to_string(&path).unwrap(), "{}");
        assert_eq!(store.path(), path.as_path());
    }

    #[test]
    fn writes_are_persisted_with_indent() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("changes.json");
        let store = FileDiffStore::open(&path, 4).unwrap();
        store.put("LLC_zh-CN/a.json", diff(json!({"v": "新"}))).unwrap();

        let text = fs::read_to_string(&path).unwrap();
        assert_eq!(text, "{\n    \"LLC_zh-CN/a.json\": {\n        \"v\": \"新\"\n    }\n}");
    }

    #[test]
    fn reopen_sees_previous_writes() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("changes.json");
        {
            let store = FileDiffStore::open(&path, 4).unwrap();
            store.put("a.json", diff(json!([{"id": 1, "changes": {"t": "x"}}]))).unwrap();
            store.put("b.json", diff(json!({"v": 1}))).unwrap();
            store.remove("b.json").unwrap();
        }
        let store = FileDiffStore::open(&path, 4).unwrap();
        assert_eq!(store.paths().unwrap(), vec!["a.json".to_string()]);
        assert_eq!(
            store.get("a.json").unwrap(),
            Some(diff(json!([{"id": 1, "changes": {"t": "x"}}])))
        );
    }

    #[test]
    fn rejected_write_leaves_file_untouched() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("changes.json");
        let store = FileDiffStore::open(&path, 4).unwrap();
        store.put("a.json", diff(json!({"v": 1}))).unwrap();
        let before = fs::read_to_string(&path).unwrap();

        assert!(store.put("/abs.json", diff(json!({"v": 2}))).is_err());
        assert_eq!(fs::read_to_string(&path).unwrap(), before);
        assert_eq!(store.paths().unwrap(), vec!["a.json".to_string()]);
    }

    #[test]
    fn removing_absent_entry_does_not_rewrite() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("changes.json");
        let store = FileDiffStore::open(&path, 4).unwrap();
        assert!(!store.remove("missing.json").unwrap());
    }

    #[test]
    fn corrupt_file_fails_to_open() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("changes.json");
        fs::write(&path, "{not json").unwrap();
        assert!(matches!(FileDiffStore::open(&path, 4), Err(StoreError::Document(_))));
    }

    #[test]
    fn bare_value_arrays_from_older_stores_are_migrated() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("changes.json");
        fs::write(&path, r#"{"old.json": {"lines": ["first", null]}}"#).unwrap();

        let store = FileDiffStore::open(&path, 4).unwrap();
        assert_eq!(store.paths().unwrap(), vec!["old.json".to_string()]);
        store.put("new.json", diff(json!({"v": 1}))).unwrap();

        let rewritten: serde_json::Value = serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(
            rewritten["old.json"],
            json!({"lines": [{"op": "patch", "diff": "first"}, {"op": "patch", "diff": null}]})
        );
    }

    #[test]
    fn reload_picks_up_external_edits() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("changes.json");
        let store = FileDiffStore::open(&path, 4).unwrap();
        fs::write(&path, r#"{"x.json": {"v": 3}}"#).unwrap();
        assert!(store.paths().unwrap().is_empty());
        store.reload().unwrap();
        assert_eq!(store.paths().unwrap(), vec!["x.json".to_string()]);
    }
}
