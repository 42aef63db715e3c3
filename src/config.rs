//! Client configuration.
//!
//! One value object covers provider credentials, the cache policy and the
//! retry policy. It is usually loaded from YAML:
//!
//! ```yaml
//! default_client: openai
//! providers:
//!   openai:
//!     api_key_env: OPENAI_API_KEY
//!     model: gpt-4o-mini
//!   claude:
//!     timeout_secs: 60
//! cache:
//!   default_ttl: 600
//!   enable_statistics: true
//!   endpoint_settings:
//!     embeddings:
//!       ttl: 86400
//! retry:
//!   max_retries: 2
//!   initial_backoff_ms: 500
//! ```

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::env;
use std::path::Path;
use std::time::Duration;

use crate::cache::CacheConfig;
use crate::client::api_key_env;
use crate::provider::create_adapter;
use crate::resilience::RetryConfig;
use crate::{Error, ErrorContext, Result};

/// Per-provider connection settings. Unset fields use the adapter defaults.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProviderSettings {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
    /// Environment variable holding the key; defaults to `{PROVIDER}_API_KEY`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_key_env: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_version: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timeout_secs: Option<u64>,
}

impl ProviderSettings {
    pub fn timeout(&self) -> Option<Duration> {
        self.timeout_secs.map(Duration::from_secs)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NexusConfig {
    /// Provider used when none is named explicitly.
    pub default_client: String,
    pub providers: HashMap<String, ProviderSettings>,
    pub cache: CacheConfig,
    pub retry: RetryConfig,
}

impl Default for NexusConfig {
    fn default() -> Self {
        Self {
            default_client: "openai".to_string(),
            providers: HashMap::new(),
            cache: CacheConfig::default(),
            retry: RetryConfig::default(),
        }
    }
}

impl NexusConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_yaml_str(content: &str) -> Result<Self> {
        let config: NexusConfig = serde_yaml::from_str(content).map_err(|e| {
            Error::configuration_with_context(
                format!("invalid configuration: {}", e),
                ErrorContext::new().with_source("config_loader"),
            )
        })?;
        config.validate()?;
        Ok(config)
    }

    pub async fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = tokio::fs::read_to_string(path).await.map_err(|e| {
            Error::configuration_with_context(
                format!("cannot read configuration: {}", e),
                ErrorContext::new()
                    .with_details(path.display().to_string())
                    .with_source("config_loader"),
            )
        })?;
        Self::from_yaml_str(&content)
    }

    pub fn with_default_client(mut self, name: impl Into<String>) -> Self {
        self.default_client = name.into();
        self
    }

    pub fn with_provider(mut self, name: impl Into<String>, settings: ProviderSettings) -> Self {
        self.providers.insert(name.into().to_lowercase(), settings);
        self
    }

    pub fn with_cache(mut self, cache: CacheConfig) -> Self {
        self.cache = cache;
        self
    }

    pub fn with_retry(mut self, retry: RetryConfig) -> Self {
        self.retry = retry;
        self
    }

    /// Settings for `name`, matched case-insensitively.
    pub fn provider(&self, name: &str) -> Option<&ProviderSettings> {
        self.providers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name.trim()))
            .map(|(_, v)| v)
    }

    /// Explicit key, then the configured env var, then `{PROVIDER}_API_KEY`.
    pub fn resolve_api_key(&self, name: &str) -> Option<String> {
        let settings = self.provider(name);
        if let Some(key) = settings.and_then(|s| s.api_key.clone()) {
            return Some(key);
        }
        let var = settings
            .and_then(|s| s.api_key_env.clone())
            .unwrap_or_else(|| api_key_env(name));
        env::var(var).ok().filter(|k| !k.trim().is_empty())
    }

    pub fn validate(&self) -> Result<()> {
        create_adapter(&self.default_client)?;
        for name in self.providers.keys() {
            create_adapter(name).map_err(|_| {
                Error::configuration_with_context(
                    format!("unknown LLM provider: {}", name),
                    ErrorContext::new()
                        .with_field_path(format!("providers.{}", name))
                        .with_source("config_loader"),
                )
            })?;
        }
        self.retry.validate()?;
        if self.cache.max_cache_age == 0 {
            return Err(Error::configuration_with_context(
                "max cache age must be positive",
                ErrorContext::new()
                    .with_field_path("cache.max_cache_age")
                    .with_source("config_loader"),
            ));
        }
        Ok(())
    }
}
