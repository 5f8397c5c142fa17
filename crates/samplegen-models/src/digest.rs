//! Content-addressed links.
//!
//! A signed resource is identified by the SHA-256 of its *payload*: the
//! resource with every virtual field removed, serialized as JSON with object
//! keys in sorted order at every depth.
//!
//! - algorithm: SHA-256
//! - input: canonical JSON bytes of the payload
//! - output: 64 lowercase hex digits

use serde_json::{Map, Value};
use sha2::{Digest, Sha256};

/// Recursively rebuild `value` with sorted object keys.
///
/// `serde_json::Map` is already ordered unless `preserve_order` is enabled
/// somewhere in the build; this keeps links stable either way.
pub fn canonicalize(value: &Value) -> Value {
    match value {
        Value::Object(map) => {
            let mut keys: Vec<&String> = map.keys().collect();
            keys.sort();
            let mut out = Map::new();
            for key in keys {
                out.insert(key.clone(), canonicalize(&map[key.as_str()]));
            }
            Value::Object(out)
        }
        Value::Array(items) => Value::Array(items.iter().map(canonicalize).collect()),
        other => other.clone(),
    }
}

pub fn canonical_bytes(value: &Value) -> Vec<u8> {
    // Serializing a `Value` cannot fail: keys are strings and numbers are finite.
    serde_json::to_vec(&canonicalize(value)).unwrap_or_default()
}

/// Hex SHA-256 over the canonical bytes of `payload`.
pub fn link_of(payload: &Map<String, Value>) -> String {
    let bytes = canonical_bytes(&Value::Object(payload.clone()));
    let mut hasher = Sha256::new();
    hasher.update(&bytes);
    hex::encode(hasher.finalize())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn link_has_expected_width() {
        let map = json!({ "a": 1 }).as_object().cloned().unwrap();
        let link = link_of(&map);
        assert_eq!(link.len(), 64);
        assert!(link.chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn link_ignores_key_order() {
        let a = json!({ "a": 1, "b": { "y": true, "x": [1, 2] } });
        let b = json!({ "b": { "x": [1, 2], "y": true }, "a": 1 });
        assert_eq!(
            link_of(a.as_object().unwrap()),
            link_of(b.as_object().unwrap())
        );
    }

    #[test]
    fn link_changes_with_content() {
        let a = json!({ "a": 1 });
        let b = json!({ "a": 2 });
        assert_ne!(
            link_of(a.as_object().unwrap()),
            link_of(b.as_object().unwrap())
        );
    }
}
