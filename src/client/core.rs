use serde_json::json;
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

use crate::cache::{CacheConfig, CacheManager};
use crate::provider::ProviderAdapter;
use crate::resilience::RetryManager;
use crate::transport::{HttpTransport, TransportError};
use crate::types::Payload;
use crate::{Error, ErrorContext, Result};

pub const DEFAULT_MAX_TOKENS: u32 = 1024;

/// Executes chat calls against one provider.
///
/// A client starts uninitialized; [`initiate`](Self::initiate) validates the
/// API key and builds the HTTP transport. Calls on an uninitialized client
/// fail with a `not_initialized` result instead of panicking.
pub struct ProviderClient {
    pub(crate) adapter: Arc<dyn ProviderAdapter>,
    pub(crate) transport: Option<HttpTransport>,
    pub(crate) model: String,
    pub(crate) api_key: Option<String>,
    pub(crate) api_version: String,
    pub(crate) base_url: String,
    pub(crate) max_tokens: u32,
    pub(crate) timeout: Option<Duration>,
    pub(crate) cache: Arc<CacheManager>,
    pub(crate) retry: Arc<RetryManager>,
}

impl ProviderClient {
    pub fn new(
        adapter: Arc<dyn ProviderAdapter>,
        cache: Arc<CacheManager>,
        retry: Arc<RetryManager>,
    ) -> Self {
        Self {
            model: adapter.default_model().to_string(),
            api_version: adapter.api_version().to_string(),
            base_url: adapter.base_url().to_string(),
            adapter,
            transport: None,
            api_key: None,
            max_tokens: DEFAULT_MAX_TOKENS,
            timeout: None,
            cache,
            retry,
        }
    }

    /// Client with default in-memory cache and retry settings.
    pub fn with_defaults(adapter: Arc<dyn ProviderAdapter>) -> Self {
        Self::new(
            adapter,
            Arc::new(CacheManager::in_memory(CacheConfig::default())),
            Arc::new(RetryManager::default()),
        )
    }

    pub fn client_name(&self) -> &str {
        self.adapter.client_name()
    }

    pub fn adapter(&self) -> &Arc<dyn ProviderAdapter> {
        &self.adapter
    }

    pub fn default_endpoint(&self) -> &str {
        self.adapter.default_endpoint()
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    pub fn set_model(&mut self, model: impl Into<String>) {
        self.model = model.into();
    }

    pub fn api_key(&self) -> Option<&str> {
        self.api_key.as_deref()
    }

    /// Takes effect on the next [`initiate`](Self::initiate).
    pub fn set_api_key(&mut self, api_key: impl Into<String>) {
        self.api_key = Some(api_key.into());
    }

    pub fn api_version(&self) -> &str {
        &self.api_version
    }

    /// Takes effect on the next [`initiate`](Self::initiate).
    pub fn set_api_version(&mut self, api_version: impl Into<String>) {
        self.api_version = api_version.into();
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Takes effect on the next [`initiate`](Self::initiate).
    pub fn set_base_url(&mut self, base_url: impl Into<String>) {
        self.base_url = base_url.into();
    }

    pub fn max_tokens(&self) -> u32 {
        self.max_tokens
    }

    pub fn set_max_tokens(&mut self, max_tokens: u32) {
        self.max_tokens = max_tokens;
    }

    pub fn set_timeout(&mut self, timeout: Duration) {
        self.timeout = Some(timeout);
    }

    pub fn cache(&self) -> &Arc<CacheManager> {
        &self.cache
    }

    pub fn retry_manager(&self) -> &Arc<RetryManager> {
        &self.retry
    }

    pub fn is_initialized(&self) -> bool {
        self.transport.is_some()
    }

    /// Fails when no API key is set.
    pub fn validate(&self) -> Result<()> {
        match self.api_key.as_deref() {
            Some(key) if !key.trim().is_empty() => Ok(()),
            _ => Err(Error::configuration_with_context(
                format!("{} API key required", self.client_name()),
                ErrorContext::new()
                    .with_field_path("api_key")
                    .with_source("provider_client"),
            )),
        }
    }

    /// Validate and (re)build the HTTP transport from the current settings.
    pub fn initiate(&mut self) -> Result<()> {
        self.validate()?;
        let api_key = self.api_key.as_deref().unwrap_or_default();
        let headers = self.adapter.request_headers(api_key);
        let transport = HttpTransport::new(&self.base_url, &self.api_version, &headers, self.timeout)?;
        debug!(
            provider = self.client_name(),
            base_url = self.base_url.as_str(),
            api_version = self.api_version.as_str(),
            "transport initialized"
        );
        self.transport = Some(transport);
        Ok(())
    }

    pub(crate) fn transport(&self) -> Result<&HttpTransport> {
        self.transport
            .as_ref()
            .ok_or(Error::Transport(TransportError::NotInitialized))
    }

    pub(crate) fn check_endpoint(endpoint: &str) -> Result<()> {
        if endpoint.trim().is_empty() {
            return Err(Error::invalid_argument_with_context(
                "Endpoint is required",
                ErrorContext::new().with_field_path("endpoint"),
            ));
        }
        Ok(())
    }

    /// Fill in the model, and `max_tokens` for providers that require it.
    pub(crate) fn prepare_payload(&self, payload: &mut Payload) {
        if !payload.contains_key("model") {
            payload.insert("model", json!(self.model));
        }
        if self.adapter.requires_max_tokens() && !payload.contains_key("max_tokens") {
            payload.insert("max_tokens", json!(self.max_tokens));
        }
    }
}

impl std::fmt::Debug for ProviderClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProviderClient")
            .field("provider", &self.client_name())
            .field("model", &self.model)
            .field("base_url", &self.base_url)
            .field("api_version", &self.api_version)
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .field("initialized", &self.is_initialized())
            .finish()
    }
}
