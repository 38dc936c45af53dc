//! Shape validation for user edits.
//!
//! An edit made against one base document may change values but not shape:
//! every position keeps its runtime type, objects keep their key set, and
//! arrays keep their length. Record arrays also keep their ids, in order,
//! since a record diff can neither rename nor move a record. Checking stops
//! at the first violation.

use lov_types::{value_kind, JsonPath, RecordId};
use serde_json::Value;

use crate::error::{DiffError, DiffResult};
use crate::index::is_record_array;

/// Returns `true` if `edited` has exactly the shape of `original`.
pub fn validate(original: &Value, edited: &Value) -> bool {
    check(original, edited).is_ok()
}

/// Like [`validate`], but reports where the shape first differs.
pub fn check(original: &Value, edited: &Value) -> DiffResult<()> {
    check_at(original, edited, &JsonPath::root())
}

fn check_at(original: &Value, edited: &Value, path: &JsonPath) -> DiffResult<()> {
    let mismatch = |reason: String| DiffError::StructureMismatch {
        path: path.clone(),
        reason,
    };

    match (original, edited) {
        (Value::Object(before), Value::Object(after)) => {
            if let Some(key) = before.keys().find(|key| !after.contains_key(*key)) {
                return Err(mismatch(format!("key {key:?} was removed")));
            }
            if let Some(key) = after.keys().find(|key| !before.contains_key(*key)) {
                return Err(mismatch(format!("key {key:?} was added")));
            }
            for (key, value) in before {
                if let Some(other) = after.get(key) {
                    check_at(value, other, &path.key(key))?;
                }
            }
            Ok(())
        }
        (Value::Array(before), Value::Array(after)) => {
            if before.len() != after.len() {
                return Err(mismatch(format!(
                    "array length changed from {} to {}",
                    before.len(),
                    after.len()
                )));
            }
            if !before.is_empty() && is_record_array(before) && is_record_array(after) {
                for (i, (a, b)) in before.iter().zip(after).enumerate() {
                    let (old_id, new_id) = (RecordId::of(a), RecordId::of(b));
                    if old_id != new_id {
                        return Err(DiffError::StructureMismatch {
                            path: path.index(i),
                            reason: format!(
                                "record id changed from {} to {}",
                                display_id(old_id.as_ref()),
                                display_id(new_id.as_ref())
                            ),
                        });
                    }
                }
            }
            before
                .iter()
                .zip(after)
                .enumerate()
                .try_for_each(|(i, (a, b))| check_at(a, b, &path.index(i)))
        }
        _ if value_kind(original) == value_kind(edited) => Ok(()),
        _ => Err(mismatch(format!(
            "type changed from {} to {}",
            value_kind(original),
            value_kind(edited)
        ))),
    }
}

fn display_id(id: Option<&RecordId>) -> String {
    id.map_or_else(|| "none".to_string(), RecordId::to_string)
}
