//! Cache manager.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

use super::backend::{CacheStore, MemoryStore};
use super::config::CacheConfig;
use super::key::CacheKey;
use super::stats::{Lookup, Statistics, StatisticsReport};
use crate::types::{ChatResult, Payload};

/// What is written to the store for every cached response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheEntry {
    pub response: ChatResult,
    pub created: DateTime<Utc>,
    pub payload: Payload,
    pub provider: String,
    pub endpoint: String,
}

/// Response cache with layered policy and optional statistics.
///
/// Store failures never surface: a failed lookup counts as a miss and a
/// failed write reports `false`.
pub struct CacheManager {
    config: CacheConfig,
    store: Arc<dyn CacheStore>,
    stats_store: Arc<dyn CacheStore>,
}

impl CacheManager {
    pub fn new(config: CacheConfig, store: Arc<dyn CacheStore>) -> Self {
        Self {
            config,
            store,
            stats_store: Arc::new(MemoryStore::new(16)),
        }
    }

    /// Manager backed by a [`MemoryStore`] sized from the config.
    pub fn in_memory(config: CacheConfig) -> Self {
        let store = Arc::new(MemoryStore::new(config.max_entries));
        Self::new(config, store)
    }

    /// Keep statistics in a separate store (e.g. one shared between processes).
    pub fn with_stats_store(mut self, store: Arc<dyn CacheStore>) -> Self {
        self.stats_store = store;
        self
    }

    pub fn config(&self) -> &CacheConfig {
        &self.config
    }

    pub fn store_name(&self) -> &'static str {
        self.store.name()
    }

    pub fn is_caching_enabled(&self, provider: Option<&str>, endpoint: Option<&str>) -> bool {
        self.config.is_caching_enabled(provider, endpoint)
    }

    /// Effective TTL, capped at `max_cache_age`.
    pub fn ttl(&self, provider: Option<&str>, endpoint: Option<&str>) -> Duration {
        self.config
            .ttl(provider, endpoint)
            .min(self.config.max_cache_age())
    }

    pub fn cache_key(&self, payload: &Payload, endpoint: &str, provider: &str) -> CacheKey {
        CacheKey::derive(payload, endpoint, provider)
    }

    pub async fn cache_response(
        &self,
        payload: &Payload,
        endpoint: &str,
        provider: &str,
        response: &ChatResult,
        ttl: Option<Duration>,
    ) -> bool {
        if !self.is_caching_enabled(Some(provider), Some(endpoint)) {
            return false;
        }

        let key = self.cache_key(payload, endpoint, provider).as_string();
        let ttl = ttl
            .unwrap_or_else(|| self.config.ttl(Some(provider), Some(endpoint)))
            .min(self.config.max_cache_age());
        let entry = CacheEntry {
            response: response.clone(),
            created: Utc::now(),
            payload: payload.clone(),
            provider: provider.to_string(),
            endpoint: endpoint.to_string(),
        };

        let bytes = match serde_json::to_vec(&entry) {
            Ok(b) => b,
            Err(e) => {
                debug!(error = %e, "cache entry serialization failed");
                return false;
            }
        };

        match self.store.set(&key, &bytes, Some(ttl)).await {
            Ok(()) => {
                debug!(key = key.as_str(), ttl_secs = ttl.as_secs(), "cached response");
                true
            }
            Err(e) => {
                debug!(key = key.as_str(), error = %e, "cache write failed");
                false
            }
        }
    }

    pub async fn get_cached_response(
        &self,
        payload: &Payload,
        endpoint: &str,
        provider: &str,
    ) -> Option<ChatResult> {
        if !self.is_caching_enabled(Some(provider), Some(endpoint)) {
            return None;
        }

        let key = self.cache_key(payload, endpoint, provider).as_string();
        let found = match self.store.get(&key).await {
            Ok(Some(bytes)) => match serde_json::from_slice::<CacheEntry>(&bytes) {
                Ok(entry) => Some(entry.response),
                Err(e) => {
                    debug!(key = key.as_str(), error = %e, "unreadable cache entry");
                    None
                }
            },
            Ok(None) => None,
            Err(e) => {
                debug!(key = key.as_str(), error = %e, "cache lookup failed");
                None
            }
        };

        let outcome = if found.is_some() {
            Lookup::Hit
        } else {
            Lookup::Miss
        };
        self.record(outcome, Some(provider), Some(endpoint)).await;
        found
    }

    pub async fn is_cached(&self, payload: &Payload, endpoint: &str, provider: &str) -> bool {
        if !self.is_caching_enabled(Some(provider), Some(endpoint)) {
            return false;
        }
        let key = self.cache_key(payload, endpoint, provider).as_string();
        self.store.has(&key).await.unwrap_or(false)
    }

    /// Drop every cached response and stamp the clear time.
    pub async fn clear_cache(&self) -> bool {
        let cleared = self.store.clear().await.is_ok();
        if cleared && self.is_statistics_enabled() {
            self.write_stats_value(&self.last_clear_key(), &Utc::now())
                .await;
        }
        cleared
    }

    pub fn is_statistics_enabled(&self) -> bool {
        self.config.enable_statistics
    }

    pub async fn statistics(&self) -> StatisticsReport {
        if !self.is_statistics_enabled() {
            return StatisticsReport::disabled();
        }
        let stats = self.load_stats().await;
        let last_clear = self
            .read_stats_value::<DateTime<Utc>>(&self.last_clear_key())
            .await;
        StatisticsReport::from_stats(stats, last_clear)
    }

    /// Zero the counters. Cached responses are left alone.
    pub async fn reset_statistics(&self) -> bool {
        if !self.is_statistics_enabled() {
            return false;
        }
        self.stats_store
            .delete(&self.config.statistics_key)
            .await
            .is_ok()
    }

    async fn record(&self, outcome: Lookup, provider: Option<&str>, endpoint: Option<&str>) {
        if !self.is_statistics_enabled() {
            return;
        }
        let mut stats = self.load_stats().await;
        stats.record(outcome, provider, endpoint);
        self.write_stats_value(&self.config.statistics_key, &stats)
            .await;
    }

    async fn load_stats(&self) -> Statistics {
        self.read_stats_value(&self.config.statistics_key)
            .await
            .unwrap_or_default()
    }

    fn last_clear_key(&self) -> String {
        format!("{}_last_clear", self.config.statistics_key)
    }

    async fn read_stats_value<T: serde::de::DeserializeOwned>(&self, key: &str) -> Option<T> {
        let bytes = self.stats_store.get(key).await.ok()??;
        serde_json::from_slice(&bytes).ok()
    }

    async fn write_stats_value<T: Serialize>(&self, key: &str, value: &T) {
        let Ok(bytes) = serde_json::to_vec(value) else {
            return;
        };
        if let Err(e) = self.stats_store.set(key, &bytes, None).await {
            debug!(key, error = %e, "statistics write failed");
        }
    }
}
