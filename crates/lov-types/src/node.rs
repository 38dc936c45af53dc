//! The sparse diff tree.
//!
//! A [`DiffNode`] mirrors the shape of the document it was computed from but
//! only contains the parts that changed. Its wire form is plain JSON:
//!
//! - a scalar is a [`DiffNode::Leaf`] (the replacement value);
//! - an object is a [`DiffNode::Object`] of changed fields;
//! - an array whose elements all carry `id` is a [`DiffNode::Records`] list;
//! - an array whose elements all carry `op` is a [`DiffNode::Positional`] list
//!   of [`Slot`]s, e.g. `[{"op":"keep"},{"op":"patch","diff":"x"},{"op":"delete"}]`.
//!
//! `null` is a legitimate replacement value and never marks an absent change.
//!
//! Arrays of bare values, as written by earlier versions of the store, are
//! still read: element `i` patches index `i` of the base and the array is
//! rewritten in slot form on the next save.

use indexmap::IndexMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::{Map, Value};

use crate::error::{TypeError, TypeResult};
use crate::path::JsonPath;
use crate::record::{ChangeRecord, RecordChange, ID_FIELD};

const OP_FIELD: &str = "op";

/// Changed fields of an object, in the edited document's key order.
pub type FieldDiffs = IndexMap<String, DiffNode>;

/// A sparse, shape-mirroring diff.
#[derive(Clone, Debug, PartialEq)]
pub enum DiffNode {
    /// Replacement for a scalar position.
    Leaf(Value),
    /// Changed fields of an object.
    Object(FieldDiffs),
    /// Identity-anchored changes of a record array: modified records first
    /// (original order), then added, then deleted.
    Records(Vec<ChangeRecord>),
    /// Index-aligned changes of a plain array.
    Positional(Vec<Slot>),
}

/// One index of a positional array diff.
#[derive(Clone, Debug, PartialEq)]
pub enum Slot {
    /// The element at this index is unchanged.
    Keep,
    /// The element at this index changed.
    Patch(DiffNode),
    /// A new element beyond the end of the original array.
    Append(Value),
    /// The element at this index was removed.
    Delete,
}

impl DiffNode {
    /// Returns `true` if replaying this diff cannot change anything.
    pub fn is_empty(&self) -> bool {
        match self {
            Self::Leaf(_) => false,
            Self::Object(fields) => fields.values().all(DiffNode::is_empty),
            Self::Records(records) => records.iter().all(|r| match &r.change {
                RecordChange::Modified(diff) => diff.is_empty(),
                RecordChange::Added(_) | RecordChange::Deleted => false,
            }),
            Self::Positional(slots) => slots.iter().all(|slot| match slot {
                Slot::Keep => true,
                Slot::Patch(diff) => diff.is_empty(),
                Slot::Append(_) | Slot::Delete => false,
            }),
        }
    }

    /// Number of elementary edits (replaced leaves, added/deleted records,
    /// appended/deleted slots) in this diff.
    pub fn change_count(&self) -> usize {
        match self {
            Self::Leaf(_) => 1,
            Self::Object(fields) => fields.values().map(DiffNode::change_count).sum(),
            Self::Records(records) => records
                .iter()
                .map(|r| match &r.change {
                    RecordChange::Modified(diff) => diff.change_count(),
                    RecordChange::Added(_) | RecordChange::Deleted => 1,
                })
                .sum(),
            Self::Positional(slots) => slots
                .iter()
                .map(|slot| match slot {
                    Slot::Keep => 0,
                    Slot::Patch(diff) => diff.change_count(),
                    Slot::Append(_) | Slot::Delete => 1,
                })
                .sum(),
        }
    }

    /// Short name of the document shape this diff applies to.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Leaf(_) => "leaf",
            Self::Object(_) => "object",
            Self::Records(_) => "record array",
            Self::Positional(_) => "array",
        }
    }

    /// Encode into the wire form.
    pub fn to_value(&self) -> Value {
        match self {
            Self::Leaf(value) => value.clone(),
            Self::Object(fields) => Value::Object(
                fields
                    .iter()
                    .map(|(key, diff)| (key.clone(), diff.to_value()))
                    .collect(),
            ),
            Self::Records(records) => {
                Value::Array(records.iter().map(ChangeRecord::to_value).collect())
            }
            Self::Positional(slots) => Value::Array(slots.iter().map(Slot::to_value).collect()),
        }
    }

    /// Decode from the wire form.
    pub fn from_value(value: &Value) -> TypeResult<Self> {
        Self::decode(value, &JsonPath::root())
    }

    pub(crate) fn decode(value: &Value, path: &JsonPath) -> TypeResult<Self> {
        match value {
            Value::Object(fields) => {
                let mut out = FieldDiffs::with_capacity(fields.len());
                for (key, child) in fields {
                    out.insert(key.clone(), Self::decode(child, &path.key(key))?);
                }
                Ok(Self::Object(out))
            }
            Value::Array(items) => {
                if items.iter().all(is_slot) {
                    let slots = items
                        .iter()
                        .enumerate()
                        .map(|(i, item)| Slot::decode(item, &path.index(i)))
                        .collect::<TypeResult<Vec<_>>>()?;
                    Ok(Self::Positional(slots))
                } else if items.iter().all(is_change_record) {
                    let records = items
                        .iter()
                        .map(|item| ChangeRecord::decode(item, path))
                        .collect::<TypeResult<Vec<_>>>()?;
                    Ok(Self::Records(records))
                } else if !items.iter().any(is_slot) {
                    // Older stores wrote positional diffs as bare values,
                    // each replacing or patching the element at its index.
                    let slots = items
                        .iter()
                        .enumerate()
                        .map(|(i, item)| Ok(Slot::Patch(Self::decode(item, &path.index(i))?)))
                        .collect::<TypeResult<Vec<_>>>()?;
                    Ok(Self::Positional(slots))
                } else {
                    Err(TypeError::MalformedDiff {
                        path: path.to_string(),
                        reason: "array diff mixes positional slots with other entries".into(),
                    })
                }
            }
            scalar => Ok(Self::Leaf(scalar.clone())),
        }
    }
}

impl Slot {
    pub fn to_value(&self) -> Value {
        let mut out = Map::new();
        match self {
            Self::Keep => {
                out.insert(OP_FIELD.into(), Value::from("keep"));
            }
            Self::Patch(diff) => {
                out.insert(OP_FIELD.into(), Value::from("patch"));
                out.insert("diff".into(), diff.to_value());
            }
            Self::Append(value) => {
                out.insert(OP_FIELD.into(), Value::from("append"));
                out.insert("value".into(), value.clone());
            }
            Self::Delete => {
                out.insert(OP_FIELD.into(), Value::from("delete"));
            }
        }
        Value::Object(out)
    }

    fn decode(value: &Value, path: &JsonPath) -> TypeResult<Self> {
        let malformed = |reason: String| TypeError::MalformedDiff {
            path: path.to_string(),
            reason,
        };
        let fields = value
            .as_object()
            .ok_or_else(|| malformed("slot must be an object".into()))?;
        let op = fields
            .get(OP_FIELD)
            .and_then(Value::as_str)
            .ok_or_else(|| malformed("slot has no `op`".into()))?;

        match op {
            "keep" => Ok(Self::Keep),
            "delete" => Ok(Self::Delete),
            "patch" => {
                let diff = fields
                    .get("diff")
                    .ok_or_else(|| malformed("patch slot has no `diff`".into()))?;
                Ok(Self::Patch(DiffNode::decode(diff, path)?))
            }
            "append" => {
                let value = fields
                    .get("value")
                    .ok_or_else(|| malformed("append slot has no `value`".into()))?;
                Ok(Self::Append(value.clone()))
            }
            other => Err(malformed(format!("unknown slot op {other:?}"))),
        }
    }
}

fn is_slot(item: &Value) -> bool {
    item.as_object()
        .is_some_and(|fields| fields.get(OP_FIELD).is_some_and(Value::is_string) && !fields.contains_key(ID_FIELD))
}

fn is_change_record(item: &Value) -> bool {
    item.as_object().is_some_and(|fields| fields.contains_key(ID_FIELD))
}

/// Short name of a JSON value's runtime type.
pub fn value_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

impl Serialize for DiffNode {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.to_value().serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for DiffNode {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = Value::deserialize(deserializer)?;
        Self::from_value(&value).map_err(serde::de::Error::custom)
    }
}
