//! Provider client: one logical chat call with caching and retries.
//!
//! Keep the public surface small. Implementation details are split into
//! submodules under `src/client/`.

pub mod builder;
mod chat;
pub mod core;
mod stream;

pub use builder::{api_key_env, ProviderClientBuilder};
pub use core::{ProviderClient, DEFAULT_MAX_TOKENS};

use async_trait::async_trait;

use crate::resilience::RetryOverrides;
use crate::stream::StreamHandler;
use crate::types::{ChatResult, Payload, Usage};
use crate::Result;

/// Operations common to every provider client.
///
/// The facade holds a `Box<dyn ChatClient>`; provider-specific behavior
/// belongs on [`ProviderAdapter`](crate::provider::ProviderAdapter).
#[async_trait]
pub trait ChatClient: Send + Sync + std::fmt::Debug {
    fn client_name(&self) -> &str;
    fn default_endpoint(&self) -> &str;

    fn model(&self) -> &str;
    fn set_model(&mut self, model: String);
    fn api_key(&self) -> Option<&str>;
    fn set_api_key(&mut self, api_key: String);
    fn api_version(&self) -> &str;
    fn set_api_version(&mut self, api_version: String);

    fn validate(&self) -> Result<()>;
    fn initiate(&mut self) -> Result<()>;

    async fn chat(&self, payload: Payload, endpoint: &str, use_cache: bool) -> ChatResult;

    async fn stream_chat(&self, payload: Payload, endpoint: &str, handler: &mut StreamHandler);

    async fn chat_with_retry(
        &self,
        payload: Payload,
        endpoint: &str,
        use_cache: bool,
        overrides: Option<&RetryOverrides>,
    ) -> Result<ChatResult>;

    async fn stream_chat_with_retry(
        &self,
        payload: Payload,
        endpoint: &str,
        handler: &mut StreamHandler,
        overrides: Option<&RetryOverrides>,
    ) -> Result<Usage>;
}

#[async_trait]
impl ChatClient for ProviderClient {
    fn client_name(&self) -> &str {
        ProviderClient::client_name(self)
    }

    fn default_endpoint(&self) -> &str {
        ProviderClient::default_endpoint(self)
    }

    fn model(&self) -> &str {
        ProviderClient::model(self)
    }

    fn set_model(&mut self, model: String) {
        ProviderClient::set_model(self, model)
    }

    fn api_key(&self) -> Option<&str> {
        ProviderClient::api_key(self)
    }

    fn set_api_key(&mut self, api_key: String) {
        ProviderClient::set_api_key(self, api_key)
    }

    fn api_version(&self) -> &str {
        ProviderClient::api_version(self)
    }

    fn set_api_version(&mut self, api_version: String) {
        ProviderClient::set_api_version(self, api_version)
    }

    fn validate(&self) -> Result<()> {
        ProviderClient::validate(self)
    }

    fn initiate(&mut self) -> Result<()> {
        ProviderClient::initiate(self)
    }

    async fn chat(&self, payload: Payload, endpoint: &str, use_cache: bool) -> ChatResult {
        ProviderClient::chat(self, payload, endpoint, use_cache).await
    }

    async fn stream_chat(&self, payload: Payload, endpoint: &str, handler: &mut StreamHandler) {
        ProviderClient::stream_chat(self, payload, endpoint, handler).await
    }

    async fn chat_with_retry(
        &self,
        payload: Payload,
        endpoint: &str,
        use_cache: bool,
        overrides: Option<&RetryOverrides>,
    ) -> Result<ChatResult> {
        ProviderClient::chat_with_retry(self, payload, endpoint, use_cache, overrides).await
    }

    async fn stream_chat_with_retry(
        &self,
        payload: Payload,
        endpoint: &str,
        handler: &mut StreamHandler,
        overrides: Option<&RetryOverrides>,
    ) -> Result<Usage> {
        ProviderClient::stream_chat_with_retry(self, payload, endpoint, handler, overrides).await
    }
}
