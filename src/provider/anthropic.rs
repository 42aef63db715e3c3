//! Anthropic Messages API adapter.
//!
//! Differs from the OpenAI layout in auth (`x-api-key` plus a pinned
//! `anthropic-version`), in the response shape (`content[0].text`) and in the
//! stream events, which carry text under `delta.text`.

use serde_json::Value;
use std::collections::HashMap;

use super::{str_at, usage_fields, ProviderAdapter};
use crate::types::Usage;

pub const ANTHROPIC_VERSION: &str = "2023-06-01";

#[derive(Debug, Clone, Copy, Default)]
pub struct ClaudeAdapter;

impl ProviderAdapter for ClaudeAdapter {
    fn client_name(&self) -> &str {
        "Claude"
    }

    fn default_model(&self) -> &str {
        "claude-3-haiku-20240307"
    }

    fn base_url(&self) -> &str {
        "https://api.anthropic.com"
    }

    fn api_version(&self) -> &str {
        "v1"
    }

    fn default_endpoint(&self) -> &str {
        "messages"
    }

    fn requires_max_tokens(&self) -> bool {
        true
    }

    fn request_headers(&self, api_key: &str) -> HashMap<String, String> {
        let mut headers = HashMap::new();
        headers.insert("x-api-key".to_string(), api_key.to_string());
        headers.insert("anthropic-version".to_string(), ANTHROPIC_VERSION.to_string());
        headers
    }

    fn extract_content(&self, raw: &Value) -> String {
        str_at(raw, "/content/0/text")
            .unwrap_or_default()
            .trim()
            .to_string()
    }

    fn extract_usage(&self, raw: &Value) -> Usage {
        usage_fields(raw, &["input_tokens", "output_tokens"])
    }

    /// First present of `completion`, `delta.text`, string `content`, then the
    /// OpenAI-compatible `choices[0].delta.content`.
    fn extract_stream_text(&self, chunk: &Value) -> String {
        chunk
            .get("completion")
            .and_then(Value::as_str)
            .or_else(|| str_at(chunk, "/delta/text"))
            .or_else(|| chunk.get("content").and_then(Value::as_str))
            .or_else(|| str_at(chunk, "/choices/0/delta/content"))
            .unwrap_or_default()
            .to_string()
    }
}
