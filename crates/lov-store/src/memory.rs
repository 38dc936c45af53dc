//! In-memory diff store for testing and ephemeral use.
//!
//! [`InMemoryDiffStore`] keeps the document behind a `RwLock<Arc<_>>`.
//! Writers clone the document only while a snapshot is still held.

use std::sync::{Arc, RwLock};

use lov_types::{DiffDocument, DiffNode};

use crate::error::{Result, StoreError};
use crate::traits::DiffStore;

/// An in-memory implementation of [`DiffStore`]. Data is lost when the store
/// is dropped.
#[derive(Debug, Default)]
pub struct InMemoryDiffStore {
    document: RwLock<Arc<DiffDocument>>,
}

impl InMemoryDiffStore {
    /// Create a new empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store seeded with an existing document.
    pub fn with_document(document: DiffDocument) -> Self {
        Self {
            document: RwLock::new(Arc::new(document)),
        }
    }
}

impl DiffStore for InMemoryDiffStore {
    fn snapshot(&self) -> Result<Arc<DiffDocument>> {
        let document = self
            .document
            .read()
            .map_err(|e| StoreError::LockPoisoned(e.to_string()))?;
        Ok(Arc::clone(&document))
    }

    fn put(&self, path: &str, diff: DiffNode) -> Result<bool> {
        let mut document = self
            .document
            .write()
            .map_err(|e| StoreError::LockPoisoned(e.to_string()))?;
        Ok(Arc::make_mut(&mut document).set(path, diff)?)
    }

    fn remove(&self, path: &str) -> Result<bool> {
        let mut document = self
            .document
            .write()
            .map_err(|e| StoreError::LockPoisoned(e.to_string()))?;
        if !document.contains(path) {
            return Ok(false);
        }
        Ok(Arc::make_mut(&mut document).remove(path).is_some())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn diff(value: serde_json::Value) -> DiffNode {
        DiffNode::from_value(&value).unwrap()
    }

    #[test]
    fn put_and_get() {
        let store = InMemoryDiffStore::new();
        assert!(store.put("a.json", diff(json!({"v": 2}))).unwrap());
        assert_eq!(store.get("a.json").unwrap(), Some(diff(json!({"v": 2}))));
        assert!(store.contains("a.json").unwrap());
        assert_eq!(store.get("b.json").unwrap(), None);
    }

    #[test]
    fn put_replaces_whole_entry() {
        let store = InMemoryDiffStore::new();
        store.put("a.json", diff(json!({"v": 2, "w": 3}))).unwrap();
        store.put("a.json", diff(json!({"v": 4}))).unwrap();
        assert_eq!(store.get("a.json").unwrap(), Some(diff(json!({"v": 4}))));
    }

    #[test]
    fn empty_put_removes_entry() {
        let store = InMemoryDiffStore::new();
        store.put("a.json", diff(json!({"v": 2}))).unwrap();
        assert!(!store.put("a.json", diff(json!({}))).unwrap());
        assert!(store.paths().unwrap().is_empty());
    }

    #[test]
    fn remove_reports_existence() {
        let store = InMemoryDiffStore::new();
        store.put("a.json", diff(json!({"v": 2}))).unwrap();
        assert!(store.remove("a.json").unwrap());
        assert!(!store.remove("a.json").unwrap());
    }

    #[test]
    fn snapshots_are_isolated_from_later_writes() {
        let store = InMemoryDiffStore::new();
        store.put("a.json", diff(json!({"v": 1}))).unwrap();
        let before = store.snapshot().unwrap();
        store.put("b.json", diff(json!({"v": 2}))).unwrap();
        store.remove("a.json").unwrap();

        assert_eq!(before.paths().collect::<Vec<_>>(), vec!["a.json"]);
        assert_eq!(store.paths().unwrap(), vec!["b.json".to_string()]);
    }

    #[test]
    fn invalid_path_is_rejected() {
        let store = InMemoryDiffStore::new();
        assert!(matches!(
            store.put("../outside.json", diff(json!({"v": 1}))),
            Err(StoreError::Document(_))
        ));
    }

    #[test]
    fn paths_are_normalized() {
        let store = InMemoryDiffStore::with_document(DiffDocument::new());
        store.put("dir\\a.json", diff(json!({"v": 1}))).unwrap();
        assert_eq!(store.paths().unwrap(), vec!["dir/a.json".to_string()]);
        assert!(store.contains("./dir/a.json").unwrap());
    }

    #[test]
    fn concurrent_writers_do_not_lose_entries() {
        let store = Arc::new(InMemoryDiffStore::new());
        let handles: Vec<_> = (0..8)
            .map(|i| {
                let store = Arc::clone(&store);
                std::thread::spawn(move || {
                    store.put(&format!("f{i}.json"), diff(json!({"v": i}))).unwrap();
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }
        assert_eq!(store.paths().unwrap().len(), 8);
    }
}
