//! Canonical JSON and content hashing
//!
//! Canonical form: object keys sorted, no whitespace. Two values that are
//! equal as JSON always produce the same canonical string, so the hash of the
//! canonical string identifies content regardless of key order.

use serde_json::Value;
use sha2::{Digest, Sha256};

/// Convert JSON to canonical form (sorted keys, no whitespace)
///
/// # Examples
///
/// ```
/// use burialdb_common::hash::to_canonical_json;
/// use serde_json::json;
///
/// let canonical = to_canonical_json(&json!({"z": 3, "a": 1, "m": [true, null]}));
/// assert_eq!(canonical, r#"{"a":1,"m":[true,null],"z":3}"#);
/// ```
pub fn to_canonical_json(value: &Value) -> String {
    match value {
        Value::Object(map) => {
            let mut pairs: Vec<_> = map.iter().collect();
            pairs.sort_by_key(|(k, _)| *k);
            let items: Vec<String> = pairs
                .into_iter()
                .map(|(k, v)| format!("{}:{}", quote(k), to_canonical_json(v)))
                .collect();
            format!("{{{}}}", items.join(","))
        }
        Value::Array(arr) => {
            let items: Vec<String> = arr.iter().map(to_canonical_json).collect();
            format!("[{}]", items.join(","))
        }
        Value::String(s) => quote(s),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Null => "null".to_string(),
    }
}

fn quote(s: &str) -> String {
    // serde_json escaping for a plain string never fails
    serde_json::to_string(s).unwrap_or_else(|_| format!("\"{}\"", s))
}

/// SHA-256 of `input` as 64 lowercase hex characters
pub fn sha256_hex(input: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(input);
    format!("{:x}", hasher.finalize())
}

/// Hash of the canonical form of `value`
pub fn content_hash(value: &Value) -> String {
    sha256_hex(to_canonical_json(value).as_bytes())
}
