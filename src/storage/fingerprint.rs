//! Content fingerprinting.
//!
//! Fingerprints are SHA-256 digests rendered as lowercase hex. JSON
//! documents are canonicalized first (sorted object keys, compact
//! separators) so that semantically identical documents always produce the
//! same fingerprint regardless of field order.

use serde_json::Value;
use sha2::{Digest, Sha256};
use std::collections::BTreeMap;
use std::fmt;

/// A deterministic digest of uploaded content, used as the cache key.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Fingerprint(String);

impl Fingerprint {
    /// Fingerprint raw bytes.
    pub fn of_bytes(bytes: &[u8]) -> Self {
        let mut hasher = Sha256::new();
        hasher.update(bytes);
        Self(format!("{:x}", hasher.finalize()))
    }

    /// Fingerprint a JSON document via its canonical form.
    pub fn of_document(document: &Value) -> Self {
        Self::of_bytes(to_canonical_json(document).as_bytes())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Render a JSON value in canonical form: object keys sorted, no whitespace.
pub fn to_canonical_json(value: &Value) -> String {
    match value {
        Value::Null => "null".to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => n.to_string(),
        Value::String(s) => serde_json::to_string(s).unwrap(),
        Value::Array(items) => {
            let rendered: Vec<String> = items.iter().map(to_canonical_json).collect();
            format!("[{}]", rendered.join(","))
        }
        Value::Object(map) => {
            let mut sorted = BTreeMap::new();
            for (key, val) in map {
                sorted.insert(key, to_canonical_json(val));
            }
            let rendered: Vec<String> = sorted
                .into_iter()
                .map(|(key, val)| format!("{}:{}", serde_json::to_string(key).unwrap(), val))
                .collect();
            format!("{{{}}}", rendered.join(","))
        }
    }
}
