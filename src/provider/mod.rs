//! Provider 适配层：通过 trait 实现多厂商 API 的请求头与响应解析
//!
//! Provider adapter abstraction. Each adapter knows one vendor's endpoint
//! defaults, auth headers and response layout; everything else in the crate
//! works on the provider-neutral [`Payload`](crate::types::Payload) and
//! [`ChatResult`](crate::types::ChatResult).
//!
//! Adapters are selected by name through [`create_adapter`] and held as
//! `Arc<dyn ProviderAdapter>`.

pub mod anthropic;
pub mod deepseek;
pub mod openai;

use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;

use crate::types::Usage;
use crate::{Error, ErrorContext, Result};

pub use anthropic::ClaudeAdapter;
pub use deepseek::DeepSeekAdapter;
pub use openai::OpenAiAdapter;

/// Per-provider request defaults and response extraction.
///
/// Extraction never fails: a missing field yields an empty string or a zero
/// counter.
pub trait ProviderAdapter: Send + Sync + std::fmt::Debug {
    /// Display name, also used as the provider part of cache keys.
    fn client_name(&self) -> &str;

    fn default_model(&self) -> &str;

    fn base_url(&self) -> &str;

    fn api_version(&self) -> &str;

    /// Endpoint used when the caller does not name one.
    fn default_endpoint(&self) -> &str {
        "chat/completions"
    }

    /// Whether requests must carry `max_tokens`.
    fn requires_max_tokens(&self) -> bool {
        false
    }

    /// Headers sent with every request, including auth.
    fn request_headers(&self, api_key: &str) -> HashMap<String, String> {
        let mut headers = HashMap::new();
        headers.insert("Authorization".to_string(), format!("Bearer {}", api_key));
        headers
    }

    fn extract_content(&self, raw: &Value) -> String;

    fn extract_usage(&self, raw: &Value) -> Usage;

    /// Text carried by one decoded stream event.
    fn extract_stream_text(&self, chunk: &Value) -> String {
        str_at(chunk, "/choices/0/delta/content")
            .unwrap_or_default()
            .to_string()
    }
}

/// Resolve an adapter by provider name, case-insensitively.
pub fn create_adapter(name: &str) -> Result<Arc<dyn ProviderAdapter>> {
    match name.trim().to_lowercase().as_str() {
        "openai" => Ok(Arc::new(OpenAiAdapter)),
        "claude" | "anthropic" => Ok(Arc::new(ClaudeAdapter)),
        "deepseek" => Ok(Arc::new(DeepSeekAdapter)),
        other => Err(Error::configuration_with_context(
            format!("unknown LLM provider: {}", other),
            ErrorContext::new()
                .with_field_path("default_client")
                .with_details(format!("expected one of: {}", supported_providers().join(", ")))
                .with_source("provider_registry"),
        )),
    }
}

/// Names accepted by [`create_adapter`].
pub fn supported_providers() -> &'static [&'static str] {
    &["openai", "claude", "anthropic", "deepseek"]
}

pub(crate) fn str_at<'a>(value: &'a Value, pointer: &str) -> Option<&'a str> {
    value.pointer(pointer).and_then(Value::as_str)
}

/// Named integer counters of `raw.usage`, zero when absent.
pub(crate) fn usage_fields(raw: &Value, fields: &[&str]) -> Usage {
    let usage = raw.get("usage");
    fields
        .iter()
        .map(|f| {
            let n = usage
                .and_then(|u| u.get(*f))
                .and_then(Value::as_u64)
                .unwrap_or(0);
            (f.to_string(), n)
        })
        .collect()
}
