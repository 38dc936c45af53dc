//! The diff document: every stored edit, keyed by document path.

use std::collections::BTreeMap;

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::{Map, Value};

use crate::codec::{parse_json, to_pretty_json};
use crate::error::{TypeError, TypeResult};
use crate::node::DiffNode;
use crate::path::JsonPath;

/// Map from relative POSIX document path to that document's root diff.
///
/// Entries whose diff is empty are never stored: [`DiffDocument::set`]
/// removes the entry instead, and decoding drops them.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct DiffDocument {
    entries: BTreeMap<String, DiffNode>,
}

impl DiffDocument {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Look up the diff stored for `path`. Invalid paths have no entry.
    pub fn get(&self, path: &str) -> Option<&DiffNode> {
        let path = normalize_path(path).ok()?;
        self.entries.get(&path)
    }

    pub fn contains(&self, path: &str) -> bool {
        self.get(path).is_some()
    }

    /// All stored paths in sorted order.
    pub fn paths(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &DiffNode)> {
        self.entries.iter().map(|(path, diff)| (path.as_str(), diff))
    }

    /// Store `diff` for `path`, replacing any previous entry.
    ///
    /// An empty diff removes the entry. Returns `true` if an entry for
    /// `path` exists afterwards.
    pub fn set(&mut self, path: &str, diff: DiffNode) -> TypeResult<bool> {
        let path = normalize_path(path)?;
        if diff.is_empty() {
            self.entries.remove(&path);
            Ok(false)
        } else {
            self.entries.insert(path, diff);
            Ok(true)
        }
    }

    /// Remove the entry for `path`, returning the stored diff.
    pub fn remove(&mut self, path: &str) -> Option<DiffNode> {
        let path = normalize_path(path).ok()?;
        self.entries.remove(&path)
    }

    pub fn to_value(&self) -> Value {
        Value::Object(
            self.entries
                .iter()
                .map(|(path, diff)| (path.clone(), diff.to_value()))
                .collect::<Map<_, _>>(),
        )
    }

    pub fn from_value(value: &Value) -> TypeResult<Self> {
        let files = value.as_object().ok_or_else(|| TypeError::MalformedDiff {
            path: JsonPath::root().to_string(),
            reason: "diff document must be a JSON object".into(),
        })?;

        let mut document = Self::new();
        for (path, diff) in files {
            let diff = DiffNode::decode(diff, &JsonPath::root().key(path))?;
            document.set(path, diff)?;
        }
        Ok(document)
    }

    /// Parse a diff document from its JSON text.
    pub fn from_json_str(text: &str) -> TypeResult<Self> {
        if text.trim().is_empty() {
            return Ok(Self::new());
        }
        Self::from_value(&parse_json(text)?)
    }

    /// Render the document as indented JSON text.
    pub fn to_json_string(&self, indent: usize) -> TypeResult<String> {
        to_pretty_json(&self.to_value(), indent)
    }
}

impl Serialize for DiffDocument {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.to_value().serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for DiffDocument {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = Value::deserialize(deserializer)?;
        Self::from_value(&value).map_err(serde::de::Error::custom)
    }
}

/// Normalize a document path to relative POSIX form.
///
/// Backslashes become `/`, `.` and empty segments are dropped. Absolute
/// paths, drive prefixes and `..` segments are rejected.
pub fn normalize_path(path: &str) -> TypeResult<String> {
    let invalid = |reason: &str| TypeError::InvalidPath {
        path: path.to_string(),
        reason: reason.to_string(),
    };

    let unified = path.replace('\\', "/");
    if unified.starts_with('/') {
        return Err(invalid("path must be relative"));
    }
    let bytes = unified.as_bytes();
    if bytes.len() >= 2 && bytes[0].is_ascii_alphabetic() && bytes[1] == b':' {
        return Err(invalid("path must not carry a drive prefix"));
    }

    let mut segments = Vec::new();
    for segment in unified.split('/') {
        match segment {
            "" | "." => {}
            ".." => return Err(invalid("path must not leave the document root")),
            other => segments.push(other),
        }
    }
    if segments.is_empty() {
        return Err(invalid("path is empty"));
    }
    Ok(segments.join("/"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn diff(value: Value) -> DiffNode {
        DiffNode::from_value(&value).unwrap()
    }

    #[test]
    fn set_and_get() {
        let mut doc = DiffDocument::new();
        assert!(doc.set("LLC_zh-CN/Skills.json", diff(json!({"v": 2}))).unwrap());
        assert_eq!(doc.len(), 1);
        assert!(doc.contains("LLC_zh-CN/Skills.json"));
        assert!(doc.contains("./LLC_zh-CN\\Skills.json"));
        assert_eq!(doc.get("LLC_zh-CN/Skills.json"), Some(&diff(json!({"v": 2}))));
    }

    #[test]
    fn empty_diff_removes_entry() {
        let mut doc = DiffDocument::new();
        doc.set("a.json", diff(json!({"v": 2}))).unwrap();
        assert!(!doc.set("a.json", DiffNode::Object(Default::default())).unwrap());
        assert!(doc.is_empty());
    }

    #[test]
    fn remove_returns_stored_diff() {
        let mut doc = DiffDocument::new();
        doc.set("a.json", diff(json!({"v": 2}))).unwrap();
        assert!(doc.remove("a.json").is_some());
        assert!(doc.remove("a.json").is_none());
    }

    #[test]
    fn decoding_drops_empty_entries() {
        let doc = DiffDocument::from_value(&json!({"a.json": {}, "b.json": {"x": 1}})).unwrap();
        assert_eq!(doc.paths().collect::<Vec<_>>(), vec!["b.json"]);
    }

    #[test]
    fn decoding_rejects_non_object() {
        assert!(DiffDocument::from_value(&json!([1, 2])).is_err());
        assert!(DiffDocument::from_value(&json!({"../up.json": {"x": 1}})).is_err());
    }

    #[test]
    fn blank_text_is_an_empty_document() {
        assert!(DiffDocument::from_json_str("  \n").unwrap().is_empty());
        assert!(DiffDocument::from_json_str("{}").unwrap().is_empty());
    }

    #[test]
    fn json_text_uses_requested_indent() {
        let mut doc = DiffDocument::new();
        doc.set("a.json", diff(json!({"v": "二"}))).unwrap();
        let text = doc.to_json_string(4).unwrap();
        assert_eq!(text, "{\n    \"a.json\": {\n        \"v\": \"二\"\n    }\n}");
        assert_eq!(DiffDocument::from_json_str(&text).unwrap(), doc);
    }

    #[test]
    fn path_normalization() {
        assert_eq!(normalize_path("a/b.json").unwrap(), "a/b.json");
        assert_eq!(normalize_path("./a//b.json").unwrap(), "a/b.json");
        assert_eq!(normalize_path("a\\b.json").unwrap(), "a/b.json");
        assert!(normalize_path("/etc/passwd").is_err());
        assert!(normalize_path("C:\\x.json").is_err());
        assert!(normalize_path("a/../../b.json").is_err());
        assert!(normalize_path("./").is_err());
    }
}
