use std::time::Instant;
use tracing::{debug, error, info};
use uuid::Uuid;

use super::core::ProviderClient;
use crate::resilience::RetryOverrides;
use crate::types::{ChatResult, Payload};
use crate::{Error, Result};

impl ProviderClient {
    /// One non-streaming call. Never fails: every error comes back as a
    /// `success = false` result.
    ///
    /// With `use_cache` set and no `stream` key in the payload, a cached
    /// result is returned without touching the network, and a fresh success
    /// is written through.
    pub async fn chat(&self, mut payload: Payload, endpoint: &str, use_cache: bool) -> ChatResult {
        let request_id = Uuid::new_v4().to_string();
        let provider = self.client_name();

        let transport = match self.transport() {
            Ok(t) => t,
            Err(e) => return self.failed(&e, &request_id),
        };
        if let Err(e) = Self::check_endpoint(endpoint) {
            return self.failed(&e, &request_id);
        }

        self.prepare_payload(&mut payload);
        let cacheable = use_cache && !payload.has_stream_flag();

        if cacheable {
            if let Some(cached) = self.cache.get_cached_response(&payload, endpoint, provider).await {
                debug!(
                    request_id = request_id.as_str(),
                    provider,
                    endpoint,
                    "using cached response"
                );
                return cached;
            }
        }

        let start = Instant::now();
        let raw = match transport.post_json(endpoint, &payload).await {
            Ok(raw) => raw,
            Err(e) => return self.failed(&e, &request_id),
        };

        let result = ChatResult::success(
            self.adapter.extract_content(&raw),
            self.adapter.extract_usage(&raw),
            provider,
            self.model.as_str(),
            raw,
        );
        info!(
            request_id = request_id.as_str(),
            provider,
            endpoint,
            duration_ms = start.elapsed().as_millis() as u64,
            "llm-nexus request succeeded"
        );

        if cacheable {
            self.cache
                .cache_response(&payload, endpoint, provider, &result, None)
                .await;
        }
        result
    }

    /// [`chat`](Self::chat) under the retry policy; `overrides` default to the
    /// configured values. A failed result that exhausts its retries, or whose
    /// tag is not retryable, is returned as an error.
    pub async fn chat_with_retry(
        &self,
        payload: Payload,
        endpoint: &str,
        use_cache: bool,
        overrides: Option<&RetryOverrides>,
    ) -> Result<ChatResult> {
        self.retry
            .execute_with_retry(
                || {
                    let payload = payload.clone();
                    async move { Ok::<_, Error>(self.chat(payload, endpoint, use_cache).await) }
                },
                overrides,
            )
            .await
    }

    fn failed(&self, err: &Error, request_id: &str) -> ChatResult {
        error!(
            request_id,
            provider = self.client_name(),
            error_type = err.tag(),
            error = %err,
            "llm-nexus request failed"
        );
        ChatResult::failure(err, self.client_name(), self.model.as_str())
    }
}
