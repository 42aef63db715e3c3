//! 响应缓存模块：按请求内容缓存成功的调用结果。
//!
//! # Response Caching Module
//!
//! Successful non-streaming results are stored under a key derived from the
//! provider, the endpoint and a hash of the normalized payload.
//!
//! ## Key Components
//!
//! | Component | Description |
//! |-----------|-------------|
//! | [`CacheManager`] | Policy, lookups, writes and statistics |
//! | [`CacheConfig`] | Global, provider and endpoint tiers |
//! | [`CacheStore`] | Trait for pluggable key-value stores |
//! | [`MemoryStore`] | In-memory LRU store with expiry |
//! | [`NullStore`] | Store that keeps nothing |
//! | [`CacheKey`] | Key derivation from request parameters |
//!
//! ## Example
//!
//! ```rust
//! use llm_nexus::cache::{CacheConfig, CacheManager, TierSettings};
//!
//! let config = CacheConfig::new()
//!     .with_default_ttl(600)
//!     .with_endpoint("embeddings", TierSettings::ttl(86_400))
//!     .with_statistics(true);
//! let cache = CacheManager::in_memory(config);
//! assert!(cache.is_caching_enabled(Some("OpenAI"), Some("chat/completions")));
//! ```
//!
//! ## Key Normalization
//!
//! The `stream` flag is ignored and messages are sorted by role and content,
//! so the same conversation hits the same entry whether it was streamed or
//! not. Nothing else in the payload is normalized.

mod backend;
mod config;
mod key;
mod manager;
mod stats;

pub use backend::{CacheStore, MemoryStore, NullStore};
pub use config::{CacheConfig, TierSettings, DEFAULT_MAX_CACHE_AGE_SECS, DEFAULT_TTL_SECS};
pub use key::{normalize_payload, CacheKey};
pub use manager::{CacheEntry, CacheManager};
pub use stats::{HitMiss, Lookup, Statistics, StatisticsReport};
