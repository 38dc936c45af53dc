//! Replaying a stored diff onto a base document.
//!
//! The base may be a newer upstream version than the one the diff was
//! computed against. Drift between the two never fails a replay: edits whose
//! target disappeared are skipped and reported as [`PatchWarning`]s, and
//! everything else is still applied.

use std::collections::HashMap;
use std::fmt;

use lov_types::{value_kind, ChangeRecord, DiffNode, FieldDiffs, JsonPath, RecordChange, RecordId, Slot};
use serde_json::{Map, Value};
use tracing::debug;

use crate::index::IdentityIndex;

/// The result of replaying a diff.
#[derive(Clone, Debug, PartialEq)]
pub struct Patched {
    /// The patched document.
    pub value: Value,
    /// Drift detected while replaying, in document order.
    pub warnings: Vec<PatchWarning>,
}

impl Patched {
    /// Returns `true` if every edit applied without drift.
    pub fn is_clean(&self) -> bool {
        self.warnings.is_empty()
    }
}

/// A recoverable problem found while replaying a diff.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum PatchWarning {
    /// A modified record no longer exists in the base; its edit was skipped.
    DanglingId { path: JsonPath, id: RecordId },
    /// Several base elements or change records share an id, or an added
    /// record already exists in the base. In the latter case the stored
    /// record replaced the base one in place.
    DuplicateId { path: JsonPath, id: RecordId },
    /// The diff edits an object key the base does not have.
    MissingKey { path: JsonPath, key: String },
    /// The diff patches an array index beyond the end of the base.
    DanglingIndex { path: JsonPath, index: usize },
    /// The diff expects a different container type than the base holds.
    ShapeMismatch {
        path: JsonPath,
        expected: &'static str,
        found: &'static str,
    },
}

impl PatchWarning {
    /// The location the warning refers to.
    pub fn path(&self) -> &JsonPath {
        match self {
            Self::DanglingId { path, .. }
            | Self::DuplicateId { path, .. }
            | Self::MissingKey { path, .. }
            | Self::DanglingIndex { path, .. }
            | Self::ShapeMismatch { path, .. } => path,
        }
    }
}

impl fmt::Display for PatchWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::DanglingId { path, id } => {
                write!(f, "{path}: record {id} no longer exists; edit skipped")
            }
            Self::DuplicateId { path, id } => {
                write!(f, "{path}: id {id} occurs more than once; last occurrence wins")
            }
            Self::MissingKey { path, key } => {
                write!(f, "{path}: key {key:?} no longer exists; edit skipped")
            }
            Self::DanglingIndex { path, index } => {
                write!(f, "{path}: index {index} no longer exists; edit skipped")
            }
            Self::ShapeMismatch {
                path,
                expected,
                found,
            } => write!(f, "{path}: expected {expected}, found {found}; edit skipped"),
        }
    }
}

/// Replay `diff` onto `base`.
///
/// `base` is never modified. Record arrays are matched by id: deleted
/// records are dropped, modified records are patched in place, added records
/// are appended, and base records the diff does not mention (including ones
/// introduced upstream) are kept in base order. Plain arrays are patched by
/// index.
pub fn apply(base: &Value, diff: &DiffNode) -> Patched {
    let mut replay = Replay::default();
    let value = replay.node(base, diff, &JsonPath::root());
    Patched {
        value,
        warnings: replay.warnings,
    }
}

#[derive(Default)]
struct Replay {
    warnings: Vec<PatchWarning>,
}

impl Replay {
    fn node(&mut self, base: &Value, diff: &DiffNode, path: &JsonPath) -> Value {
        match (base, diff) {
            (_, DiffNode::Leaf(value)) => value.clone(),
            (Value::Object(fields), DiffNode::Object(changes)) => self.object(fields, changes, path),
            (Value::Array(items), DiffNode::Records(records)) => self.records(items, records, path),
            (Value::Array(items), DiffNode::Positional(slots)) => self.positional(items, slots, path),
            (_, diff) => {
                self.warnings.push(PatchWarning::ShapeMismatch {
                    path: path.clone(),
                    expected: diff.kind(),
                    found: value_kind(base),
                });
                base.clone()
            }
        }
    }

    fn object(
        &mut self,
        fields: &Map<String, Value>,
        changes: &FieldDiffs,
        path: &JsonPath,
    ) -> Value {
        let mut out = Map::with_capacity(fields.len());
        for (key, value) in fields {
            let patched = match changes.get(key) {
                Some(diff) => self.node(value, diff, &path.key(key)),
                None => value.clone(),
            };
            out.insert(key.clone(), patched);
        }

        for key in changes.keys().filter(|key| !fields.contains_key(*key)) {
            self.warnings.push(PatchWarning::MissingKey {
                path: path.clone(),
                key: key.clone(),
            });
        }

        Value::Object(out)
    }

    fn records(&mut self, items: &[Value], records: &[ChangeRecord], path: &JsonPath) -> Value {
        let index = IdentityIndex::build(items);
        for id in index.duplicates() {
            self.warnings.push(PatchWarning::DuplicateId {
                path: path.clone(),
                id: id.clone(),
            });
        }

        // Last change record per id wins, mirroring the base index.
        let mut changes: HashMap<&RecordId, &ChangeRecord> = HashMap::with_capacity(records.len());
        for record in records {
            if changes.insert(&record.id, record).is_some() {
                self.warnings.push(PatchWarning::DuplicateId {
                    path: path.clone(),
                    id: record.id.clone(),
                });
            }
        }

        let mut out = Vec::with_capacity(items.len() + records.len());
        for item in items {
            let Some(id) = RecordId::of(item) else {
                out.push(item.clone());
                continue;
            };
            match changes.get(&id).map(|record| &record.change) {
                None => out.push(item.clone()),
                Some(RecordChange::Deleted) => {}
                Some(RecordChange::Modified(diff)) => out.push(self.node(item, diff, &path.record(&id))),
                Some(RecordChange::Added(element)) => {
                    self.warnings.push(PatchWarning::DuplicateId {
                        path: path.clone(),
                        id: id.clone(),
                    });
                    out.push(element.clone());
                }
            }
        }

        let effective = records
            .iter()
            .filter(|record| changes.get(&record.id).is_some_and(|r| std::ptr::eq(*r, *record)));
        for record in effective {
            let present = index.contains(&record.id);
            match &record.change {
                RecordChange::Added(element) if !present => out.push(element.clone()),
                RecordChange::Modified(_) if !present => {
                    self.warnings.push(PatchWarning::DanglingId {
                        path: path.clone(),
                        id: record.id.clone(),
                    });
                }
                RecordChange::Deleted if !present => {
                    debug!(path = %path, id = %record.id, "deleted record already absent");
                }
                _ => {}
            }
        }

        Value::Array(out)
    }

    fn positional(&mut self, items: &[Value], slots: &[Slot], path: &JsonPath) -> Value {
        let mut out = Vec::with_capacity(items.len().max(slots.len()));
        let mut appended = Vec::new();

        for (i, item) in items.iter().enumerate() {
            match slots.get(i) {
                None | Some(Slot::Keep) => out.push(item.clone()),
                Some(Slot::Patch(diff)) => out.push(self.node(item, diff, &path.index(i))),
                Some(Slot::Delete) => {}
                // The base grew upstream where the edit appended; keep both.
                Some(Slot::Append(value)) => {
                    out.push(item.clone());
                    appended.push(value.clone());
                }
            }
        }

        for (i, slot) in slots.iter().enumerate().skip(items.len()) {
            match slot {
                Slot::Append(value) => appended.push(value.clone()),
                Slot::Patch(_) => self.warnings.push(PatchWarning::DanglingIndex {
                    path: path.clone(),
                    index: i,
                }),
                Slot::Keep | Slot::Delete => {}
            }
        }

        out.extend(appended);
        Value::Array(out)
    }
}
