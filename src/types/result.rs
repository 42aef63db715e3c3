//! Uniform call result.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

use crate::Error;

/// Token counters as reported by the provider (e.g. `total_tokens`).
pub type Usage = BTreeMap<String, u64>;

/// Result of a non-streaming call.
///
/// Success and failure share one shape; callers branch on `success`.
/// `error_type` holds the machine-readable tag of the failure.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatResult {
    pub success: bool,
    pub content: String,
    #[serde(default)]
    pub usage: Usage,
    #[serde(default)]
    pub error: Option<String>,
    #[serde(default)]
    pub error_type: Option<String>,
    pub provider: String,
    pub model: String,
    #[serde(default)]
    pub raw: Option<Value>,
}

impl ChatResult {
    pub fn success(
        content: impl Into<String>,
        usage: Usage,
        provider: impl Into<String>,
        model: impl Into<String>,
        raw: Value,
    ) -> Self {
        Self {
            success: true,
            content: content.into(),
            usage,
            error: None,
            error_type: None,
            provider: provider.into(),
            model: model.into(),
            raw: Some(raw),
        }
    }

    pub fn failure(error: &Error, provider: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            success: false,
            content: String::new(),
            usage: Usage::new(),
            error: Some(error.to_string()),
            error_type: Some(error.tag().to_string()),
            provider: provider.into(),
            model: model.into(),
            raw: None,
        }
    }

    pub fn is_success(&self) -> bool {
        self.success
    }

    /// `(tag, message)` when this result reports a failure.
    pub fn failure_details(&self) -> Option<(&str, &str)> {
        match self.error.as_deref() {
            Some(message) if !message.is_empty() => {
                Some((self.error_type.as_deref().unwrap_or("unknown"), message))
            }
            _ => None,
        }
    }
}
