//! Developer-friendly facade layer.
//!
//! [`LlmClient`] picks the active provider from configuration and exposes the
//! [`ChatClient`] operations directly. Cache and retry managers are built once
//! and shared by every client the facade creates, so switching providers
//! keeps cache contents and statistics.

pub mod prelude;

use std::sync::Arc;
use tracing::{debug, error};

use crate::cache::CacheManager;
use crate::client::{ChatClient, ProviderClient, ProviderClientBuilder};
use crate::config::NexusConfig;
use crate::resilience::{RetryManager, RetryOverrides};
use crate::stream::StreamHandler;
use crate::types::{ChatResult, Payload, Usage};
use crate::Result;

pub struct LlmClient {
    config: NexusConfig,
    cache: Arc<CacheManager>,
    retry: Arc<RetryManager>,
    active: Box<dyn ChatClient>,
}

impl LlmClient {
    /// Build the facade and initiate `config.default_client`.
    pub fn from_config(config: NexusConfig) -> Result<Self> {
        config.validate()?;
        let cache = Arc::new(CacheManager::in_memory(config.cache.clone()));
        let retry = Arc::new(RetryManager::new(config.retry.clone()));
        let active = build_client(&config, &config.default_client, None, &cache, &retry)?;
        Ok(Self {
            config,
            cache,
            retry,
            active,
        })
    }

    /// Wrap an existing client. Its cache and retry managers become the
    /// facade's, so clients created by a later [`initiate`](Self::initiate)
    /// share them.
    pub fn with_client(config: NexusConfig, client: ProviderClient) -> Self {
        Self {
            cache: client.cache().clone(),
            retry: client.retry_manager().clone(),
            config,
            active: Box::new(client),
        }
    }

    /// Switch to another provider and/or model.
    ///
    /// `client_name` defaults to the configured default client. On failure the
    /// previously active client stays in place.
    pub fn initiate(&mut self, client_name: Option<&str>, model: Option<&str>) -> Result<()> {
        let name = client_name.unwrap_or(self.config.default_client.as_str());
        match build_client(&self.config, name, model, &self.cache, &self.retry) {
            Ok(client) => {
                debug!(provider = client.client_name(), model = client.model(), "active client switched");
                self.active = client;
                Ok(())
            }
            Err(e) => {
                error!(provider = name, error = %e, "failed to initialize LLM client");
                Err(e)
            }
        }
    }

    pub fn client(&self) -> &dyn ChatClient {
        self.active.as_ref()
    }

    pub fn client_mut(&mut self) -> &mut dyn ChatClient {
        self.active.as_mut()
    }

    pub fn client_name(&self) -> &str {
        self.active.client_name()
    }

    pub fn validate(&self) -> Result<()> {
        self.active.validate()
    }

    pub fn config(&self) -> &NexusConfig {
        &self.config
    }

    pub fn cache(&self) -> &Arc<CacheManager> {
        &self.cache
    }

    pub async fn chat(&self, payload: Payload, endpoint: &str, use_cache: bool) -> ChatResult {
        self.active.chat(payload, endpoint, use_cache).await
    }

    pub async fn stream_chat(&self, payload: Payload, endpoint: &str, handler: &mut StreamHandler) {
        self.active.stream_chat(payload, endpoint, handler).await
    }

    pub async fn chat_with_retry(
        &self,
        payload: Payload,
        endpoint: &str,
        use_cache: bool,
        overrides: Option<&RetryOverrides>,
    ) -> Result<ChatResult> {
        self.active
            .chat_with_retry(payload, endpoint, use_cache, overrides)
            .await
    }

    pub async fn stream_chat_with_retry(
        &self,
        payload: Payload,
        endpoint: &str,
        handler: &mut StreamHandler,
        overrides: Option<&RetryOverrides>,
    ) -> Result<Usage> {
        self.active
            .stream_chat_with_retry(payload, endpoint, handler, overrides)
            .await
    }
}

impl std::fmt::Debug for LlmClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LlmClient")
            .field("active", &self.active)
            .field("default_client", &self.config.default_client)
            .finish()
    }
}

fn build_client(
    config: &NexusConfig,
    name: &str,
    model: Option<&str>,
    cache: &Arc<CacheManager>,
    retry: &Arc<RetryManager>,
) -> Result<Box<dyn ChatClient>> {
    let settings = config.provider(name).cloned().unwrap_or_default();
    let mut builder = ProviderClientBuilder::new(name)
        .cache(cache.clone())
        .retry(retry.clone());

    if let Some(key) = config.resolve_api_key(name) {
        builder = builder.api_key(key);
    }
    if let Some(m) = model.map(str::to_string).or(settings.model.clone()) {
        builder = builder.model(m);
    }
    if let Some(url) = settings.base_url.clone() {
        builder = builder.base_url(url);
    }
    if let Some(v) = settings.api_version.clone() {
        builder = builder.api_version(v);
    }
    if let Some(n) = settings.max_tokens {
        builder = builder.max_tokens(n);
    }
    if let Some(t) = settings.timeout() {
        builder = builder.timeout(t);
    }

    Ok(Box::new(builder.build()?))
}
