//! JSON text encoding shared by every stored and replayed document.
//!
//! Documents are written as UTF-8 with non-ASCII text left unescaped and a
//! fixed indentation width.

use serde::Serialize;
use serde_json::ser::PrettyFormatter;
use serde_json::Value;

use crate::error::{TypeError, TypeResult};

/// Indentation width used when none is configured.
pub const DEFAULT_INDENT: usize = 4;

/// Serialize `value` as pretty JSON indented by `indent` spaces.
pub fn to_pretty_json<T: Serialize + ?Sized>(value: &T, indent: usize) -> TypeResult<String> {
    let indent = vec![b' '; indent];
    let mut out = Vec::new();
    let formatter = PrettyFormatter::with_indent(&indent);
    let mut serializer = serde_json::Serializer::with_formatter(&mut out, formatter);
    value
        .serialize(&mut serializer)
        .map_err(|e| TypeError::Serialization(e.to_string()))?;
    String::from_utf8(out).map_err(|e| TypeError::Serialization(e.to_string()))
}

/// Parse JSON text, tolerating a leading UTF-8 byte order mark.
pub fn parse_json(text: &str) -> TypeResult<Value> {
    let text = text.strip_prefix('\u{feff}').unwrap_or(text);
    serde_json::from_str(text).map_err(|e| TypeError::Serialization(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn four_space_indent() {
        let text = to_pretty_json(&json!({"a": [1]}), DEFAULT_INDENT).unwrap();
        assert_eq!(text, "{\n    \"a\": [\n        1\n    ]\n}");
    }

    #[test]
    fn two_space_indent() {
        let text = to_pretty_json(&json!({"a": 1}), 2).unwrap();
        assert_eq!(text, "{\n  \"a\": 1\n}");
    }

    #[test]
    fn non_ascii_is_not_escaped() {
        let text = to_pretty_json(&json!("罪人"), DEFAULT_INDENT).unwrap();
        assert_eq!(text, "\"罪人\"");
    }

    #[test]
    fn key_order_is_preserved() {
        let value = parse_json(r#"{"z": 1, "a": 2, "m": 3}"#).unwrap();
        let text = serde_json::to_string(&value).unwrap();
        assert_eq!(text, r#"{"z":1,"a":2,"m":3}"#);
    }

    #[test]
    fn byte_order_mark_is_skipped() {
        assert_eq!(parse_json("\u{feff}{\"a\": 1}").unwrap(), json!({"a": 1}));
    }

    #[test]
    fn invalid_json_is_an_error() {
        assert!(matches!(parse_json("{oops"), Err(TypeError::Serialization(_))));
    }
}
