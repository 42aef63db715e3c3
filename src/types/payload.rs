//! Request payload.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::message::Message;
use crate::{Error, ErrorContext, Result};

/// JSON object sent as the request body.
///
/// Must carry a `messages` array of `{role, content}` objects and may carry
/// `model`, `max_tokens` and `stream`. The client injects `model`, `stream`
/// and, for providers that require it, `max_tokens`; the cache layer never
/// mutates a payload.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Payload(Map<String, Value>);

impl Payload {
    pub fn new() -> Self {
        Self(Map::new())
    }

    pub fn with_messages(messages: impl IntoIterator<Item = Message>) -> Self {
        let messages: Vec<Value> = messages
            .into_iter()
            .map(|m| serde_json::json!({ "role": m.role.as_str(), "content": m.content }))
            .collect();
        let mut map = Map::new();
        map.insert("messages".into(), Value::Array(messages));
        Self(map)
    }

    /// Wrap an arbitrary JSON object. Anything else is rejected.
    pub fn from_value(value: Value) -> Result<Self> {
        match value {
            Value::Object(map) => Ok(Self(map)),
            other => Err(Error::invalid_argument_with_context(
                "payload must be a JSON object",
                ErrorContext::new()
                    .with_field_path("payload")
                    .with_details(format!("got {}", json_kind(&other))),
            )),
        }
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.0.insert("model".into(), Value::String(model.into()));
        self
    }

    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.0.insert("max_tokens".into(), Value::from(max_tokens));
        self
    }

    pub fn insert(&mut self, key: impl Into<String>, value: Value) -> Option<Value> {
        self.0.insert(key.into(), value)
    }

    pub fn remove(&mut self, key: &str) -> Option<Value> {
        self.0.remove(key)
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.0.contains_key(key)
    }

    pub fn messages(&self) -> Option<&Vec<Value>> {
        self.0.get("messages").and_then(Value::as_array)
    }

    pub fn messages_mut(&mut self) -> Option<&mut Vec<Value>> {
        self.0.get_mut("messages").and_then(Value::as_array_mut)
    }

    pub fn model(&self) -> Option<&str> {
        self.0.get("model").and_then(Value::as_str)
    }

    /// True when the caller put a `stream` key in the payload, whatever its value.
    pub fn has_stream_flag(&self) -> bool {
        self.0.contains_key("stream")
    }

    pub fn as_map(&self) -> &Map<String, Value> {
        &self.0
    }

    pub fn into_value(self) -> Value {
        Value::Object(self.0)
    }
}

impl From<Map<String, Value>> for Payload {
    fn from(map: Map<String, Value>) -> Self {
        Self(map)
    }
}

fn json_kind(v: &Value) -> &'static str {
    match v {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
