use std::env;
use std::sync::Arc;
use std::time::Duration;

use super::core::ProviderClient;
use crate::cache::{CacheConfig, CacheManager};
use crate::provider::{create_adapter, ProviderAdapter};
use crate::resilience::{RetryConfig, RetryManager};
use crate::Result;

/// Builder for [`ProviderClient`].
///
/// `build()` returns an initiated client. When no key is given the builder
/// reads `{PROVIDER}_API_KEY` from the environment (e.g. `OPENAI_API_KEY`).
pub struct ProviderClientBuilder {
    provider: String,
    adapter: Option<Arc<dyn ProviderAdapter>>,
    api_key: Option<String>,
    model: Option<String>,
    api_version: Option<String>,
    /// Override base URL (primarily for testing with mock servers)
    base_url: Option<String>,
    max_tokens: Option<u32>,
    timeout: Option<Duration>,
    cache: Option<Arc<CacheManager>>,
    retry: Option<Arc<RetryManager>>,
}

impl ProviderClientBuilder {
    /// `provider` is resolved through [`create_adapter`].
    pub fn new(provider: impl Into<String>) -> Self {
        Self {
            provider: provider.into(),
            adapter: None,
            api_key: None,
            model: None,
            api_version: None,
            base_url: None,
            max_tokens: None,
            timeout: None,
            cache: None,
            retry: None,
        }
    }

    /// Use a custom adapter instead of a built-in one.
    pub fn adapter(mut self, adapter: Arc<dyn ProviderAdapter>) -> Self {
        self.adapter = Some(adapter);
        self
    }

    pub fn api_key(mut self, key: impl Into<String>) -> Self {
        self.api_key = Some(key.into());
        self
    }

    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.model = Some(model.into());
        self
    }

    pub fn api_version(mut self, version: impl Into<String>) -> Self {
        self.api_version = Some(version.into());
        self
    }

    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = Some(url.into());
        self
    }

    pub fn max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = Some(max_tokens);
        self
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Share a cache between clients.
    pub fn cache(mut self, cache: Arc<CacheManager>) -> Self {
        self.cache = Some(cache);
        self
    }

    pub fn cache_config(mut self, config: CacheConfig) -> Self {
        self.cache = Some(Arc::new(CacheManager::in_memory(config)));
        self
    }

    pub fn retry(mut self, retry: Arc<RetryManager>) -> Self {
        self.retry = Some(retry);
        self
    }

    pub fn retry_config(mut self, config: RetryConfig) -> Self {
        self.retry = Some(Arc::new(RetryManager::new(config)));
        self
    }

    pub fn build(self) -> Result<ProviderClient> {
        let adapter = match self.adapter {
            Some(a) => a,
            None => create_adapter(&self.provider)?,
        };
        let cache = self
            .cache
            .unwrap_or_else(|| Arc::new(CacheManager::in_memory(CacheConfig::default())));
        let retry = self.retry.unwrap_or_default();

        let mut client = ProviderClient::new(adapter, cache, retry);
        if let Some(key) = self
            .api_key
            .or_else(|| env::var(api_key_env(&self.provider)).ok())
        {
            client.set_api_key(key);
        }
        if let Some(model) = self.model {
            client.set_model(model);
        }
        if let Some(version) = self.api_version {
            client.set_api_version(version);
        }
        if let Some(url) = self.base_url {
            client.set_base_url(url);
        }
        if let Some(n) = self.max_tokens {
            client.set_max_tokens(n);
        }
        if let Some(t) = self.timeout {
            client.set_timeout(t);
        }

        client.initiate()?;
        Ok(client)
    }
}

/// `openai` -> `OPENAI_API_KEY`
pub fn api_key_env(provider: &str) -> String {
    format!("{}_API_KEY", provider.trim().to_uppercase())
}
