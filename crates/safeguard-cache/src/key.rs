//! Deterministic cache keys.

use serde_json::{Map, Value};
use sha2::{Digest, Sha256};

/// Hex characters of the digest kept in a key.
const DIGEST_LEN: usize = 12;

/// Builds `"{prefix}:{digest}"` from call arguments.
///
/// The digest is the first 12 hex characters of the SHA-256 of
/// `{"args": [...], "kwargs": {...}}` serialized with object keys sorted at
/// every depth, so the order in which keyword arguments were inserted does not
/// matter.
///
/// ```rust
/// use safeguard_cache::make_key;
/// use serde_json::{json, Map};
///
/// let mut a = Map::new();
/// a.insert("page".into(), json!(2));
/// a.insert("city".into(), json!("Austin"));
///
/// let mut b = Map::new();
/// b.insert("city".into(), json!("Austin"));
/// b.insert("page".into(), json!(2));
///
/// let key = make_key("listings", &[json!(42)], &a);
/// assert_eq!(key, make_key("listings", &[json!(42)], &b));
/// assert!(key.starts_with("listings:"));
/// assert_eq!(key.len(), "listings:".len() + 12);
/// ```
pub fn make_key(prefix: &str, args: &[Value], kwargs: &Map<String, Value>) -> String {
    let mut call = Map::new();
    call.insert(
        "args".to_string(),
        Value::Array(args.iter().map(canonical).collect()),
    );
    call.insert(
        "kwargs".to_string(),
        canonical(&Value::Object(kwargs.clone())),
    );

    let payload = Value::Object(call).to_string();
    let digest = hex::encode(Sha256::digest(payload.as_bytes()));

    format!("{}:{}", prefix, &digest[..DIGEST_LEN])
}

// Rebuilds objects with sorted keys so the encoding is independent of
// whether serde_json preserves insertion order.
fn canonical(value: &Value) -> Value {
    match value {
        Value::Object(map) => {
            let mut entries: Vec<(&String, &Value)> = map.iter().collect();
            entries.sort_by(|a, b| a.0.cmp(b.0));
            Value::Object(
                entries
                    .into_iter()
                    .map(|(k, v)| (k.clone(), canonical(v)))
                    .collect(),
            )
        }
        Value::Array(items) => Value::Array(items.iter().map(canonical).collect()),
        other => other.clone(),
    }
}
