//! Layered cache configuration.
//!
//! Caching and TTL resolve through three tiers: the global settings, then a
//! provider override, then an endpoint override. A tier that leaves a field
//! unset falls through to the tier below it.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::time::Duration;

/// Per-provider or per-endpoint override.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TierSettings {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub enable_caching: Option<bool>,
    /// TTL in seconds.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ttl: Option<u64>,
}

impl TierSettings {
    pub fn enabled(enabled: bool) -> Self {
        Self {
            enable_caching: Some(enabled),
            ttl: None,
        }
    }

    pub fn ttl(ttl_secs: u64) -> Self {
        Self {
            enable_caching: None,
            ttl: Some(ttl_secs),
        }
    }

    pub fn with_ttl(mut self, ttl_secs: u64) -> Self {
        self.ttl = Some(ttl_secs);
        self
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    pub enable_caching: bool,
    /// Default TTL in seconds.
    pub default_ttl: u64,
    /// Keyed by provider name; matched case-insensitively.
    pub provider_settings: HashMap<String, TierSettings>,
    /// Keyed by endpoint path, e.g. `chat/completions`.
    pub endpoint_settings: HashMap<String, TierSettings>,
    pub enable_statistics: bool,
    pub statistics_key: String,
    /// Upper bound in seconds applied to every resolved TTL.
    pub max_cache_age: u64,
    /// Capacity of the built-in in-memory store.
    pub max_entries: usize,
}

pub const DEFAULT_TTL_SECS: u64 = 3600;
pub const DEFAULT_MAX_CACHE_AGE_SECS: u64 = 30 * 24 * 3600;

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            enable_caching: true,
            default_ttl: DEFAULT_TTL_SECS,
            provider_settings: HashMap::new(),
            endpoint_settings: HashMap::new(),
            enable_statistics: false,
            statistics_key: "LLMCacheStats".to_string(),
            max_cache_age: DEFAULT_MAX_CACHE_AGE_SECS,
            max_entries: 1000,
        }
    }
}

impl CacheConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_enabled(mut self, enabled: bool) -> Self {
        self.enable_caching = enabled;
        self
    }

    pub fn with_default_ttl(mut self, ttl_secs: u64) -> Self {
        self.default_ttl = ttl_secs;
        self
    }

    pub fn with_provider(mut self, provider: impl Into<String>, settings: TierSettings) -> Self {
        self.provider_settings
            .insert(provider.into().to_lowercase(), settings);
        self
    }

    pub fn with_endpoint(mut self, endpoint: impl Into<String>, settings: TierSettings) -> Self {
        self.endpoint_settings.insert(endpoint.into(), settings);
        self
    }

    pub fn with_statistics(mut self, enabled: bool) -> Self {
        self.enable_statistics = enabled;
        self
    }

    pub fn with_max_cache_age(mut self, secs: u64) -> Self {
        self.max_cache_age = secs;
        self
    }

    fn provider_tier(&self, provider: &str) -> Option<&TierSettings> {
        self.provider_settings
            .iter()
            .find(|(name, _)| name.eq_ignore_ascii_case(provider))
            .map(|(_, tier)| tier)
    }

    fn endpoint_tier(&self, endpoint: &str) -> Option<&TierSettings> {
        self.endpoint_settings.get(endpoint)
    }

    /// A disabled tier anywhere in the chain wins over an enabled tier above it.
    pub fn is_caching_enabled(&self, provider: Option<&str>, endpoint: Option<&str>) -> bool {
        if !self.enable_caching {
            return false;
        }

        let tiers = [
            provider.and_then(|p| self.provider_tier(p)),
            endpoint.and_then(|e| self.endpoint_tier(e)),
        ];
        !tiers
            .iter()
            .flatten()
            .any(|tier| tier.enable_caching == Some(false))
    }

    /// Endpoint TTL overrides provider TTL overrides the default.
    pub fn ttl(&self, provider: Option<&str>, endpoint: Option<&str>) -> Duration {
        let mut ttl = self.default_ttl;
        if let Some(t) = provider.and_then(|p| self.provider_tier(p)).and_then(|t| t.ttl) {
            ttl = t;
        }
        if let Some(t) = endpoint.and_then(|e| self.endpoint_tier(e)).and_then(|t| t.ttl) {
            ttl = t;
        }
        Duration::from_secs(ttl)
    }

    pub fn max_cache_age(&self) -> Duration {
        Duration::from_secs(self.max_cache_age)
    }
}
