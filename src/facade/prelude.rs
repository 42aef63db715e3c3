//! Minimal prelude for application code.
//!
//! Goal: reduce import noise without hiding important concepts.

pub use crate::cache::{CacheConfig, CacheManager, TierSettings};
pub use crate::client::{ChatClient, ProviderClient, ProviderClientBuilder};
pub use crate::config::{NexusConfig, ProviderSettings};
pub use crate::facade::LlmClient;
pub use crate::resilience::{RetryConfig, RetryOverrides};
pub use crate::stream::{StreamChunk, StreamEvent, StreamHandler};
pub use crate::types::{ChatResult, Message, MessageRole, Payload, Usage};
