//! Cache key generation.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use sha2::{Digest, Sha256};

use crate::types::Payload;

/// `provider_endpoint_hash`, where the hash covers the normalized payload.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CacheKey {
    pub provider: String,
    pub endpoint: String,
    pub hash: String,
}

impl CacheKey {
    /// Derive the key for a request.
    ///
    /// The `stream` flag is dropped and `messages` are sorted by their
    /// `role + content` composite before hashing, so payloads differing only
    /// in those respects share a key.
    pub fn derive(payload: &Payload, endpoint: &str, provider: &str) -> Self {
        let normalized = normalize_payload(payload);
        let mut hasher = Sha256::new();
        hasher.update(canonical_json(&normalized).as_bytes());
        let hash: String = hasher
            .finalize()
            .iter()
            .map(|b| format!("{:02x}", b))
            .collect();
        Self {
            provider: provider.to_string(),
            endpoint: endpoint.to_string(),
            hash,
        }
    }

    pub fn as_string(&self) -> String {
        self.to_string()
    }
}

impl std::fmt::Display for CacheKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}_{}_{}", self.provider, self.endpoint, self.hash)
    }
}

/// Copy of the payload with `stream` removed and `messages` sorted.
pub fn normalize_payload(payload: &Payload) -> Value {
    let mut normalized = payload.clone();
    normalized.remove("stream");
    if let Some(messages) = normalized.messages_mut() {
        messages.sort_by_cached_key(sort_key);
    }
    normalized.into_value()
}

fn sort_key(message: &Value) -> String {
    let role = message.get("role").and_then(Value::as_str).unwrap_or("");
    let content = match message.get("content") {
        Some(Value::String(s)) => s.clone(),
        Some(other) => canonical_json(other),
        None => String::new(),
    };
    format!("{}{}", role, content)
}

/// JSON encoding with object keys sorted at every level.
fn canonical_json(value: &Value) -> String {
    match value {
        Value::Object(map) => {
            let mut keys: Vec<&String> = map.keys().collect();
            keys.sort();
            let fields: Vec<String> = keys
                .into_iter()
                .map(|k| {
                    format!(
                        "{}:{}",
                        Value::String(k.clone()),
                        canonical_json(&map[k.as_str()])
                    )
                })
                .collect();
            format!("{{{}}}", fields.join(","))
        }
        Value::Array(items) => {
            let items: Vec<String> = items.iter().map(canonical_json).collect();
            format!("[{}]", items.join(","))
        }
        scalar => scalar.to_string(),
    }
}
