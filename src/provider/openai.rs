//! OpenAI adapter. Handles both the Chat Completions layout
//! (`choices[0].message.content`) and the Responses API layout
//! (`output[0].content[0].text`).

use serde_json::Value;

use super::{str_at, ProviderAdapter};
use crate::types::Usage;

#[derive(Debug, Clone, Copy, Default)]
pub struct OpenAiAdapter;

impl ProviderAdapter for OpenAiAdapter {
    fn client_name(&self) -> &str {
        "OpenAI"
    }

    fn default_model(&self) -> &str {
        "gpt-4o-mini-2024-07-18"
    }

    fn base_url(&self) -> &str {
        "https://api.openai.com"
    }

    fn api_version(&self) -> &str {
        "v1"
    }

    fn extract_content(&self, raw: &Value) -> String {
        str_at(raw, "/choices/0/message/content")
            .or_else(|| str_at(raw, "/output/0/content/0/text"))
            .unwrap_or_default()
            .trim()
            .to_string()
    }

    /// Every integer counter the provider reports, under its own name.
    fn extract_usage(&self, raw: &Value) -> Usage {
        raw.get("usage")
            .and_then(Value::as_object)
            .map(|usage| {
                usage
                    .iter()
                    .filter_map(|(k, v)| v.as_u64().map(|n| (k.clone(), n)))
                    .collect()
            })
            .unwrap_or_default()
    }
}
