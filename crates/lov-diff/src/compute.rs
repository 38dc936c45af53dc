//! Diff computation between an original and an edited document.
//!
//! The result is sparse: unchanged leaves, fields, records and whole
//! subtrees are absent, and a document with no changes yields `None`.

use lov_types::{value_kind, ChangeRecord, DiffNode, FieldDiffs, JsonPath, Slot};
use serde_json::{Map, Value};
use tracing::warn;

use crate::apply::apply;
use crate::error::{DiffError, DiffResult};
use crate::index::{is_record_array, IdentityIndex};

/// Compute the diff that turns `original` into `edited`.
///
/// Returns `Ok(None)` when the documents are equal. Objects must keep their
/// key set; record arrays may gain and lose records; plain arrays may grow
/// or shrink. Comparing a container with a value of another type is a
/// [`DiffError::SchemaMismatch`].
pub fn compute(original: &Value, edited: &Value) -> DiffResult<Option<DiffNode>> {
    diff_value(original, edited, &JsonPath::root())
}

/// Compute the diff of a user edit made against one base document.
///
/// The edit must pass [`check`](crate::check), and replaying the resulting
/// diff onto `original` must reproduce `edited` exactly. An edit the diff
/// cannot express (for example a change to one of several records sharing
/// an id) is a [`DiffError::StructureMismatch`] rather than a silently
/// dropped change.
pub fn compute_edit(original: &Value, edited: &Value) -> DiffResult<Option<DiffNode>> {
    crate::schema::check(original, edited)?;
    let diff = compute(original, edited)?;

    let replayed = match &diff {
        Some(diff) => apply(original, diff).value,
        None => original.clone(),
    };
    if replayed != *edited {
        let path = first_difference(&replayed, edited, JsonPath::root());
        return Err(DiffError::StructureMismatch {
            path,
            reason: "edit cannot be expressed as a diff of the original".into(),
        });
    }
    Ok(diff)
}

/// Location of the first value where `a` and `b` differ.
fn first_difference(a: &Value, b: &Value, path: JsonPath) -> JsonPath {
    match (a, b) {
        (Value::Object(x), Value::Object(y)) => x
            .iter()
            .find(|(key, value)| y.get(*key) != Some(*value))
            .and_then(|(key, value)| y.get(key).map(|other| (key, value, other)))
            .map_or(path.clone(), |(key, value, other)| {
                first_difference(value, other, path.key(key))
            }),
        (Value::Array(x), Value::Array(y)) if x.len() == y.len() => x
            .iter()
            .zip(y)
            .position(|(a, b)| a != b)
            .map_or(path.clone(), |i| first_difference(&x[i], &y[i], path.index(i))),
        _ => path,
    }
}

fn diff_value(original: &Value, edited: &Value, path: &JsonPath) -> DiffResult<Option<DiffNode>> {
    match (original, edited) {
        (Value::Object(before), Value::Object(after)) => diff_object(before, after, path),
        (Value::Array(before), Value::Array(after)) => diff_array(before, after, path),
        (Value::Object(_) | Value::Array(_), _) | (_, Value::Object(_) | Value::Array(_)) => {
            Err(DiffError::SchemaMismatch {
                path: path.clone(),
                expected: value_kind(original),
                found: value_kind(edited),
            })
        }
        _ if original == edited => Ok(None),
        _ => Ok(Some(DiffNode::Leaf(edited.clone()))),
    }
}

fn diff_object(
    before: &Map<String, Value>,
    after: &Map<String, Value>,
    path: &JsonPath,
) -> DiffResult<Option<DiffNode>> {
    if let Some(key) = before.keys().find(|key| !after.contains_key(*key)) {
        return Err(DiffError::StructureMismatch {
            path: path.clone(),
            reason: format!("key {key:?} was removed"),
        });
    }

    let mut changes = FieldDiffs::new();
    for (key, new) in after {
        let Some(old) = before.get(key) else {
            return Err(DiffError::StructureMismatch {
                path: path.clone(),
                reason: format!("key {key:?} was added"),
            });
        };
        if let Some(diff) = diff_value(old, new, &path.key(key))? {
            changes.insert(key.clone(), diff);
        }
    }

    Ok((!changes.is_empty()).then_some(DiffNode::Object(changes)))
}

fn diff_array(before: &[Value], after: &[Value], path: &JsonPath) -> DiffResult<Option<DiffNode>> {
    let has_elements = !before.is_empty() || !after.is_empty();
    if has_elements && is_record_array(before) && is_record_array(after) {
        diff_records(before, after, path)
    } else {
        diff_positional(before, after, path)
    }
}

fn diff_records(before: &[Value], after: &[Value], path: &JsonPath) -> DiffResult<Option<DiffNode>> {
    let old = IdentityIndex::build(before);
    let new = IdentityIndex::build(after);
    for id in old.duplicates().iter().chain(new.duplicates()) {
        warn!(path = %path, id = %id, "duplicate record id; only the last occurrence is diffed");
    }

    let mut modified = Vec::new();
    let mut deleted = Vec::new();
    for (id, old_item) in old.iter() {
        match new.get(id) {
            Some(new_item) => {
                if let Some(diff) = diff_value(old_item, new_item, &path.record(id))? {
                    modified.push(ChangeRecord::modified(id.clone(), diff));
                }
            }
            None => deleted.push(ChangeRecord::deleted(id.clone())),
        }
    }

    let added = new
        .iter()
        .filter(|(id, _)| !old.contains(id))
        .map(|(id, item)| ChangeRecord::added(id.clone(), item.clone()));

    let mut records = modified;
    records.extend(added);
    records.extend(deleted);

    Ok((!records.is_empty()).then_some(DiffNode::Records(records)))
}

fn diff_positional(before: &[Value], after: &[Value], path: &JsonPath) -> DiffResult<Option<DiffNode>> {
    let len = before.len().max(after.len());
    let mut slots = Vec::with_capacity(len);
    let mut changed = false;

    for i in 0..len {
        let slot = match (before.get(i), after.get(i)) {
            (Some(old), Some(new)) => match diff_value(old, new, &path.index(i))? {
                Some(diff) => Slot::Patch(diff),
                None => Slot::Keep,
            },
            (None, Some(new)) => Slot::Append(new.clone()),
            (Some(_), None) => Slot::Delete,
            (None, None) => continue,
        };
        changed |= slot != Slot::Keep;
        slots.push(slot);
    }

    Ok(changed.then_some(DiffNode::Positional(slots)))
}
