//! Mock HTTP server setup for integration tests

use llm_nexus::cache::{CacheConfig, CacheManager};
use llm_nexus::resilience::RetryConfig;
use llm_nexus::{ProviderClient, ProviderClientBuilder};
use mockito::{Matcher, Mock, Server, ServerGuard};
use std::sync::Arc;

pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

/// Test fixture that manages a mock server
pub struct MockServerFixture {
    pub server: ServerGuard,
    pub base_url: String,
}

impl MockServerFixture {
    pub async fn new() -> Self {
        init_tracing();
        let server = Server::new_async().await;
        let base_url = server.url();
        Self { server, base_url }
    }

    /// Initiated client pointed at the mock server, with millisecond backoff.
    pub fn client(&self, provider: &str, cache: CacheConfig) -> ProviderClient {
        self.client_with_cache(provider, Arc::new(CacheManager::in_memory(cache)))
    }

    pub fn client_with_cache(&self, provider: &str, cache: Arc<CacheManager>) -> ProviderClient {
        ProviderClientBuilder::new(provider)
            .api_key("test-key")
            .base_url(&self.base_url)
            .cache(cache)
            .retry_config(RetryConfig::new().with_initial_backoff_ms(1))
            .build()
            .expect("client builds against mock server")
    }

    /// Create a mock for a JSON response
    pub async fn mock_json_response(&mut self, path: &str, status: usize, body: &str) -> Mock {
        self.server
            .mock("POST", path)
            .with_status(status)
            .with_header("content-type", "application/json")
            .with_body(body)
            .create_async()
            .await
    }

    /// Same as [`mock_json_response`](Self::mock_json_response) with an exact call count.
    pub async fn mock_json_expect(
        &mut self,
        path: &str,
        status: usize,
        body: &str,
        hits: usize,
    ) -> Mock {
        self.server
            .mock("POST", path)
            .with_status(status)
            .with_header("content-type", "application/json")
            .with_body(body)
            .expect(hits)
            .create_async()
            .await
    }

    /// Create a mock for a successful streaming response (SSE)
    pub async fn mock_sse_stream(&mut self, path: &str, chunks: Vec<&str>) -> Mock {
        let body = chunks
            .iter()
            .map(|chunk| {
                if chunk.starts_with("data: ") {
                    format!("{}\n\n", chunk)
                } else {
                    format!("data: {}\n\n", chunk)
                }
            })
            .collect::<Vec<_>>()
            .join("");

        self.server
            .mock("POST", path)
            .match_body(Matcher::PartialJsonString(r#"{"stream": true}"#.to_string()))
            .with_status(200)
            .with_header("content-type", "text/event-stream")
            .with_body(body)
            .create_async()
            .await
    }
}
