use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use lov_diff::Patched;
use lov_store::{atomic_write, DiffStore, FileDiffStore};
use lov_types::{normalize_path, parse_json, to_pretty_json, DiffNode};
use serde_json::Value;
use tracing::{debug, info, warn};
use walkdir::WalkDir;

use crate::config::WorkshopConfig;
use crate::error::{WorkshopError, WorkshopResult};
use crate::replay::{FileWarning, ReplayReport};

/// A document available for editing.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DocumentEntry {
    /// Relative POSIX path inside the workshop directory.
    pub path: String,
    /// Whether edits are stored for this document.
    pub edited: bool,
}

/// A document opened for editing.
#[derive(Clone, Debug, PartialEq)]
pub struct EditSession {
    pub path: String,
    /// The pristine upstream document. Saved edits are diffed against it.
    pub original: Value,
    /// The document with stored edits applied; what the editor shows.
    pub current: Value,
}

/// What a successful [`Workshop::save`] did to the store.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SaveOutcome {
    /// The edit was stored, replacing any previous edit of the document.
    Stored,
    /// The document matches its original again; its stored edit was removed.
    Cleared,
    /// Nothing was edited and nothing was stored.
    Unchanged,
}

/// High-level overlay API over a workshop directory and a diff store.
pub struct Workshop {
    config: WorkshopConfig,
    store: Arc<dyn DiffStore>,
}

impl std::fmt::Debug for Workshop {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Workshop")
            .field("workshop_dir", &self.config.workshop_dir)
            .field("store", &self.config.store_path())
            .finish()
    }
}

impl Workshop {
    /// Open the workshop described by `config`, backed by its diff file.
    pub fn open(config: WorkshopConfig) -> WorkshopResult<Self> {
        let store = FileDiffStore::open(&config.store_path(), config.indent)?;
        Ok(Self::with_store(config, Arc::new(store)))
    }

    /// Build a workshop around an existing store.
    pub fn with_store(config: WorkshopConfig, store: Arc<dyn DiffStore>) -> Self {
        Self { config, store }
    }

    pub fn config(&self) -> &WorkshopConfig {
        &self.config
    }

    pub fn store(&self) -> &Arc<dyn DiffStore> {
        &self.store
    }

    // ---- Editor path ----

    /// All JSON documents under the workshop directory, sorted by path.
    /// The diff store file itself is excluded.
    pub fn list_documents(&self) -> WorkshopResult<Vec<DocumentEntry>> {
        let root = &self.config.workshop_dir;
        if !root.is_dir() {
            return Err(WorkshopError::DocumentNotFound(root.clone()));
        }

        let store_path = self.config.store_path();
        let snapshot = self.store.snapshot()?;
        let mut documents = Vec::new();

        for entry in WalkDir::new(root).sort_by_file_name() {
            let entry = entry.map_err(|e| WorkshopError::Io(e.into()))?;
            let is_json = entry
                .path()
                .extension()
                .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));
            if !entry.file_type().is_file() || !is_json || entry.path() == store_path {
                continue;
            }
            let Ok(relative) = entry.path().strip_prefix(root) else {
                continue;
            };
            let path = posix_path(relative);
            let edited = snapshot.contains(&path);
            documents.push(DocumentEntry { path, edited });
        }

        documents.sort_by(|a, b| a.path.cmp(&b.path));
        Ok(documents)
    }

    /// Read the pristine upstream version of a document.
    pub fn load_base(&self, path: &str) -> WorkshopResult<Value> {
        let path = normalize_path(path)?;
        read_json(&self.config.workshop_dir.join(&path))
    }

    /// Open a document for editing: its original and its current (edited)
    /// form.
    pub fn open_document(&self, path: &str) -> WorkshopResult<EditSession> {
        let path = normalize_path(path)?;
        let original = self.load_base(&path)?;
        let patched = self.patch(&path, &original)?;
        for warning in &patched.warnings {
            warn!(path = %path, %warning, "stored edit no longer matches the document");
        }
        Ok(EditSession {
            path,
            original,
            current: patched.value,
        })
    }

    /// Store the user's edit of a document.
    ///
    /// `edited` must have exactly the shape of `original`, and the stored
    /// diff must reproduce it when replayed onto `original`. Otherwise the
    /// save fails with a structure mismatch and the store is left untouched.
    pub fn save(&self, path: &str, original: &Value, edited: &Value) -> WorkshopResult<SaveOutcome> {
        let path = normalize_path(path)?;
        let diff = match lov_diff::compute_edit(original, edited) {
            Ok(diff) => diff,
            Err(e) => {
                warn!(path = %path, error = %e, "edit rejected");
                return Err(e.into());
            }
        };

        match diff {
            Some(diff) if !diff.is_empty() => {
                let changes = diff.change_count();
                self.store.put(&path, diff)?;
                info!(path = %path, changes, "edit saved");
                Ok(SaveOutcome::Stored)
            }
            _ => {
                if self.store.remove(&path)? {
                    info!(path = %path, "edit cleared");
                    Ok(SaveOutcome::Cleared)
                } else {
                    debug!(path = %path, "nothing to save");
                    Ok(SaveOutcome::Unchanged)
                }
            }
        }
    }

    /// Save the edited form of an open session.
    pub fn save_session(&self, session: &EditSession, edited: &Value) -> WorkshopResult<SaveOutcome> {
        self.save(&session.path, &session.original, edited)
    }

    /// Discard every stored edit of a document. Returns `true` if there was
    /// anything to discard.
    pub fn reset(&self, path: &str) -> WorkshopResult<bool> {
        let path = normalize_path(path)?;
        let removed = self.store.remove(&path)?;
        if removed {
            info!(path = %path, "edits reset");
        }
        Ok(removed)
    }

    /// The stored edit of a document, if any.
    pub fn stored_diff(&self, path: &str) -> WorkshopResult<Option<DiffNode>> {
        Ok(self.store.get(&normalize_path(path)?)?)
    }

    // ---- Replay path ----

    /// Replay the stored edit of `path` onto `base`. Without a stored edit
    /// the base is returned unchanged.
    pub fn patch(&self, path: &str, base: &Value) -> WorkshopResult<Patched> {
        let path = normalize_path(path)?;
        Ok(match self.store.get(&path)? {
            Some(diff) => lov_diff::apply(base, &diff),
            None => Patched {
                value: base.clone(),
                warnings: Vec::new(),
            },
        })
    }

    /// Replay every stored edit onto the documents under `target_dir`,
    /// rewriting them in place.
    ///
    /// One bad document never stops the others: missing and unreadable
    /// files are recorded in the report and skipped.
    pub fn replay_into(&self, target_dir: &Path) -> WorkshopResult<ReplayReport> {
        let snapshot = self.store.snapshot()?;
        info!(files = snapshot.len(), target = %target_dir.display(), "replaying stored edits");

        let mut report = ReplayReport::default();
        for (path, diff) in snapshot.iter() {
            let file = target_dir.join(path);
            if !file.is_file() {
                warn!(path, "target document missing; skipping");
                report.missing.push(path.to_string());
                continue;
            }

            let base = match read_json(&file) {
                Ok(base) => base,
                Err(e) => {
                    warn!(path, error = %e, "cannot read target document; skipping");
                    report.failed.push((path.to_string(), e.to_string()));
                    continue;
                }
            };

            let patched = lov_diff::apply(&base, diff);
            for warning in patched.warnings {
                warn!(path, %warning, "replay drift");
                report.warnings.push(FileWarning {
                    path: path.to_string(),
                    warning,
                });
            }

            if let Err(e) = write_json(&file, &patched.value, self.config.indent) {
                warn!(path, error = %e, "cannot write patched document");
                report.failed.push((path.to_string(), e.to_string()));
                continue;
            }
            debug!(path, "edits applied");
            report.applied.push(path.to_string());
        }

        info!(
            applied = report.applied.len(),
            missing = report.missing.len(),
            failed = report.failed.len(),
            warnings = report.warnings.len(),
            "replay complete"
        );
        Ok(report)
    }

    /// Replay into the configured `target_dir`.
    pub fn replay(&self) -> WorkshopResult<ReplayReport> {
        let target = self
            .config
            .target_dir
            .clone()
            .ok_or_else(|| WorkshopError::Config("no target_dir configured".into()))?;
        self.replay_into(&target)
    }
}

fn posix_path(relative: &Path) -> String {
    relative
        .components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/")
}

/// Read and parse a JSON document.
pub fn read_json(path: &Path) -> WorkshopResult<Value> {
    let text = match fs::read_to_string(path) {
        Ok(text) => text,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            return Err(WorkshopError::DocumentNotFound(PathBuf::from(path)))
        }
        Err(e) => return Err(e.into()),
    };
    parse_json(&text).map_err(|e| WorkshopError::InvalidDocument {
        path: path.to_path_buf(),
        reason: e.to_string(),
    })
}

/// Write a JSON document with the given indentation, replacing it atomically.
pub fn write_json(path: &Path, value: &Value, indent: usize) -> WorkshopResult<()> {
    let text = to_pretty_json(value, indent)?;
    atomic_write(path, text.as_bytes())?;
    Ok(())
}
