//! DeepSeek adapter (OpenAI-compatible wire format).

use serde_json::Value;

use super::{str_at, usage_fields, ProviderAdapter};
use crate::types::Usage;

#[derive(Debug, Clone, Copy, Default)]
pub struct DeepSeekAdapter;

impl ProviderAdapter for DeepSeekAdapter {
    fn client_name(&self) -> &str {
        "DeepSeek"
    }

    fn default_model(&self) -> &str {
        "deepseek-chat"
    }

    fn base_url(&self) -> &str {
        "https://api.deepseek.com"
    }

    fn api_version(&self) -> &str {
        "v1"
    }

    fn extract_content(&self, raw: &Value) -> String {
        str_at(raw, "/choices/0/message/content")
            .unwrap_or_default()
            .trim()
            .to_string()
    }

    fn extract_usage(&self, raw: &Value) -> Usage {
        usage_fields(raw, &["prompt_tokens", "completion_tokens", "total_tokens"])
    }
}
