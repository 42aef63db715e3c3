use serde_json::json;
use std::time::Instant;
use tokio::sync::Mutex;
use tracing::{error, info};
use uuid::Uuid;

use super::core::ProviderClient;
use crate::resilience::RetryOverrides;
use crate::stream::{StreamHandler, StreamProcessor};
use crate::types::{Payload, Usage};
use crate::{Error, Result};

impl ProviderClient {
    /// One streaming call. Chunks, completion and failures all go to
    /// `handler`; nothing is returned.
    pub async fn stream_chat(&self, payload: Payload, endpoint: &str, handler: &mut StreamHandler) {
        let request_id = Uuid::new_v4().to_string();
        if let Err(e) = self.stream_once(payload, endpoint, handler, &request_id).await {
            self.stream_failed(&e, &request_id);
            handler.error(&e);
        }
    }

    /// [`stream_chat`](Self::stream_chat) under the retry policy.
    ///
    /// Only failures raised before the first chunk reaches `handler` are
    /// retried; a stream that breaks later fails with a `stream_interrupted`
    /// error. The final failure is reported to `handler` once and returned.
    pub async fn stream_chat_with_retry(
        &self,
        payload: Payload,
        endpoint: &str,
        handler: &mut StreamHandler,
        overrides: Option<&RetryOverrides>,
    ) -> Result<Usage> {
        let request_id = Uuid::new_v4().to_string();
        let shared = Mutex::new(std::mem::take(handler));
        let outcome = {
            let shared = &shared;
            let request_id = request_id.as_str();
            self.retry
                .execute_with_retry(
                    || {
                        let payload = payload.clone();
                        async move {
                            let mut guard = shared.lock().await;
                            self.stream_once(payload, endpoint, &mut guard, request_id)
                                .await
                        }
                    },
                    overrides,
                )
                .await
        };
        *handler = shared.into_inner();

        if let Err(e) = &outcome {
            self.stream_failed(e, &request_id);
            handler.error(e);
        }
        outcome
    }

    /// Runs one attempt and calls `handler.complete` on success. Errors are
    /// returned, not reported.
    async fn stream_once(
        &self,
        mut payload: Payload,
        endpoint: &str,
        handler: &mut StreamHandler,
        request_id: &str,
    ) -> Result<Usage> {
        let transport = self.transport()?;
        Self::check_endpoint(endpoint)?;

        self.prepare_payload(&mut payload);
        payload.insert("stream", json!(true));

        let start = Instant::now();
        let body = transport.post_stream(endpoint, &payload).await?;
        info!(
            request_id,
            provider = self.client_name(),
            endpoint,
            "llm-nexus request started streaming"
        );

        let processor = StreamProcessor::new(self.adapter.clone(), self.model.as_str());
        let usage = processor.process(body, handler).await?;
        info!(
            request_id,
            provider = self.client_name(),
            chunks = handler.chunks_received(),
            duration_ms = start.elapsed().as_millis() as u64,
            "llm-nexus stream completed"
        );
        handler.complete(&usage);
        Ok(usage)
    }

    fn stream_failed(&self, err: &Error, request_id: &str) {
        error!(
            request_id,
            provider = self.client_name(),
            error_type = err.tag(),
            error = %err,
            "llm-nexus streaming request failed"
        );
    }
}
