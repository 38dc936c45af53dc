//! Record identities and identity-anchored change records.
//!
//! A record is an array element that is a JSON object carrying an `id` field.
//! Its identity is stable across upstream versions, so edits to record arrays
//! are stored as [`ChangeRecord`]s keyed by id instead of by index.

use std::fmt;
use std::hash::{Hash, Hasher};
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::{Map, Value};

use crate::error::{TypeError, TypeResult};
use crate::node::DiffNode;
use crate::path::JsonPath;

/// Name of the field that carries a record's identity.
pub const ID_FIELD: &str = "id";

/// The identity of a record within one array.
///
/// Two ids are equal when their canonical JSON text is equal, so the number
/// `1` and the string `"1"` are distinct identities.
#[derive(Clone, Debug)]
pub struct RecordId {
    value: Value,
    key: String,
}

impl RecordId {
    /// Wrap an `id` value.
    pub fn new(value: Value) -> Self {
        let key = value.to_string();
        Self { value, key }
    }

    /// The identity of an array element, if it is a record.
    pub fn of(element: &Value) -> Option<Self> {
        element
            .as_object()?
            .get(ID_FIELD)
            .map(|id| Self::new(id.clone()))
    }

    /// The raw `id` value as it appears in the document.
    pub fn value(&self) -> &Value {
        &self.value
    }

    /// Canonical text used for equality and hashing.
    pub fn key(&self) -> &str {
        &self.key
    }
}

impl PartialEq for RecordId {
    fn eq(&self, other: &Self) -> bool {
        self.key == other.key
    }
}

impl Eq for RecordId {}

impl Hash for RecordId {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.key.hash(state);
    }
}

impl PartialOrd for RecordId {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for RecordId {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.key.cmp(&other.key)
    }
}

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.key)
    }
}

impl From<Value> for RecordId {
    fn from(value: Value) -> Self {
        Self::new(value)
    }
}

/// What happened to a record between the original and the edited array.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum ChangeAction {
    /// Fields of an existing record changed.
    #[default]
    Modified,
    /// The record is new.
    Added,
    /// The record was removed.
    Deleted,
}

impl ChangeAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Modified => "Modified",
            Self::Added => "Added",
            Self::Deleted => "Deleted",
        }
    }
}

impl fmt::Display for ChangeAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ChangeAction {
    type Err = TypeError;

    /// Parses `Modified`/`Added`/`Deleted` in any letter case.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "modified" => Ok(Self::Modified),
            "added" => Ok(Self::Added),
            "deleted" => Ok(Self::Deleted),
            _ => Err(TypeError::Serialization(format!("unknown change action: {s}"))),
        }
    }
}

/// The payload of a [`ChangeRecord`].
#[derive(Clone, Debug, PartialEq)]
pub enum RecordChange {
    /// Sparse diff to replay onto the matching base record.
    Modified(DiffNode),
    /// The complete new record, appended verbatim.
    Added(Value),
    /// The matching base record is dropped.
    Deleted,
}

/// One identity-anchored entry of a record-array diff.
///
/// Wire form: `{"id": <id>, "changes": <diff or element>, "action": "Added"}`.
/// `action` is omitted for modifications and `changes` is omitted for
/// deletions.
#[derive(Clone, Debug, PartialEq)]
pub struct ChangeRecord {
    pub id: RecordId,
    pub change: RecordChange,
}

impl ChangeRecord {
    pub fn modified(id: RecordId, diff: DiffNode) -> Self {
        Self {
            id,
            change: RecordChange::Modified(diff),
        }
    }

    pub fn added(id: RecordId, element: Value) -> Self {
        Self {
            id,
            change: RecordChange::Added(element),
        }
    }

    pub fn deleted(id: RecordId) -> Self {
        Self {
            id,
            change: RecordChange::Deleted,
        }
    }

    pub fn action(&self) -> ChangeAction {
        match self.change {
            RecordChange::Modified(_) => ChangeAction::Modified,
            RecordChange::Added(_) => ChangeAction::Added,
            RecordChange::Deleted => ChangeAction::Deleted,
        }
    }

    /// Encode into the wire form.
    pub fn to_value(&self) -> Value {
        let mut out = Map::new();
        out.insert(ID_FIELD.to_string(), self.id.value().clone());
        match &self.change {
            RecordChange::Modified(diff) => {
                out.insert("changes".to_string(), diff.to_value());
            }
            RecordChange::Added(element) => {
                out.insert("changes".to_string(), element.clone());
                out.insert("action".to_string(), Value::from(ChangeAction::Added.as_str()));
            }
            RecordChange::Deleted => {
                out.insert(
                    "action".to_string(),
                    Value::from(ChangeAction::Deleted.as_str()),
                );
            }
        }
        Value::Object(out)
    }

    /// Decode from the wire form.
    pub fn from_value(value: &Value) -> TypeResult<Self> {
        Self::decode(value, &JsonPath::root())
    }

    pub(crate) fn decode(value: &Value, path: &JsonPath) -> TypeResult<Self> {
        let malformed = |reason: String| TypeError::MalformedDiff {
            path: path.to_string(),
            reason,
        };

        let fields = value
            .as_object()
            .ok_or_else(|| malformed("change record must be an object".into()))?;
        let id = fields
            .get(ID_FIELD)
            .map(|id| RecordId::new(id.clone()))
            .ok_or_else(|| malformed("change record has no `id`".into()))?;

        let action = match fields.get("action") {
            None | Some(Value::Null) => ChangeAction::Modified,
            Some(Value::String(s)) => s.parse().map_err(|_| malformed(format!("unknown action {s:?}")))?,
            Some(other) => return Err(malformed(format!("action must be a string, got {other}"))),
        };

        let change = match action {
            ChangeAction::Modified => match fields.get("changes") {
                Some(changes) => RecordChange::Modified(DiffNode::decode(changes, &path.record(&id))?),
                // An id with no changes replays as an untouched record.
                None => RecordChange::Modified(DiffNode::Object(Default::default())),
            },
            ChangeAction::Added => match fields.get("changes") {
                Some(element) => RecordChange::Added(element.clone()),
                None => return Err(malformed(format!("added record {id} has no `changes`"))),
            },
            ChangeAction::Deleted => RecordChange::Deleted,
        };

        Ok(Self { id, change })
    }
}

impl Serialize for ChangeRecord {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.to_value().serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for ChangeRecord {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = Value::deserialize(deserializer)?;
        Self::from_value(&value).map_err(serde::de::Error::custom)
    }
}
