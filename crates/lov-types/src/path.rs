//! Locations inside a JSON document.
//!
//! A [`JsonPath`] follows JSON Pointer syntax for object keys and array
//! indices, and renders record-array elements by identity
//! (`/dataList[id=12]/content`) since their index is not stable across
//! upstream versions.

use std::fmt;

use crate::record::RecordId;

/// A location inside a JSON document. The empty path is the document root.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash)]
pub struct JsonPath(String);

impl JsonPath {
    /// The document root.
    pub fn root() -> Self {
        Self::default()
    }

    /// Path of an object field below `self`.
    pub fn key(&self, key: &str) -> Self {
        let escaped = key.replace('~', "~0").replace('/', "~1");
        Self(format!("{}/{}", self.0, escaped))
    }

    /// Path of a positional array element below `self`.
    pub fn index(&self, index: usize) -> Self {
        Self(format!("{}/{}", self.0, index))
    }

    /// Path of an identity-bearing record below `self`.
    pub fn record(&self, id: &RecordId) -> Self {
        Self(format!("{}[id={}]", self.0, id))
    }

    pub fn is_root(&self) -> bool {
        self.0.is_empty()
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for JsonPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.0.is_empty() {
            f.write_str("/")
        } else {
            f.write_str(&self.0)
        }
    }
}
