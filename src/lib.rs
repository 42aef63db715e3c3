//! # llm-nexus
//!
//! 面向多厂商大模型 HTTP API 的统一客户端，内置响应缓存与重试机制。
//!
//! A provider-agnostic client for large-language-model HTTP APIs, with
//! response caching and retry/backoff layered over per-provider adapters.
//!
//! ## Overview
//!
//! Every call goes through a [`ProviderClient`]: the payload gets the default
//! model, the cache is consulted, the request is posted to
//! `{base_url}/{api_version}/{endpoint}` and the answer is normalized into a
//! [`ChatResult`] by the provider's adapter. Streaming calls decode the
//! provider's `data:` event stream and feed a [`StreamHandler`].
//!
//! ## Key Features
//!
//! - **Adapters**: OpenAI, Claude and DeepSeek via [`provider::ProviderAdapter`]
//! - **Caching**: layered enable/TTL policy and hit statistics via [`cache`]
//! - **Resilience**: tag-driven retries with jittered backoff via [`resilience`]
//! - **Streaming**: SSE decoding into closures or a channel via [`stream`]
//! - **Content Safety**: pattern checks and redaction via [`safety`]
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use llm_nexus::{LlmClient, Message, NexusConfig, Payload};
//!
//! #[tokio::main]
//! async fn main() -> llm_nexus::Result<()> {
//!     let config = NexusConfig::from_path("llm-nexus.yaml").await?;
//!     let llm = LlmClient::from_config(config)?;
//!
//!     let payload = Payload::with_messages([Message::user("Hello, how are you?")]);
//!     let result = llm.chat_with_retry(payload, "chat/completions", true, None).await?;
//!     println!("{} ({:?})", result.content, result.usage);
//!     Ok(())
//! }
//! ```
//!
//! ## Module Organization
//!
//! | Module | Description |
//! |--------|-------------|
//! | [`client`] | Request execution and the [`ChatClient`] contract |
//! | [`facade`] | Provider selection from configuration |
//! | [`provider`] | Per-provider adapters |
//! | [`cache`] | Response caching with pluggable stores |
//! | [`resilience`] | Retry with exponential backoff |
//! | [`stream`] | Streaming response decoding |
//! | [`transport`] | HTTP transport |
//! | [`types`] | Payloads, messages and results |
//! | [`safety`] | Content checks and redaction |

pub mod cache;
pub mod client;
pub mod config;
pub mod facade;
pub mod provider;
pub mod resilience;
pub mod safety;
pub mod stream;
pub mod transport;
pub mod types;

// Re-export main types for convenience
pub use cache::{CacheConfig, CacheManager};
pub use client::{ChatClient, ProviderClient, ProviderClientBuilder};
pub use config::{NexusConfig, ProviderSettings};
pub use facade::LlmClient;
pub use resilience::{RetryConfig, RetryManager, RetryOverrides};
pub use stream::{StreamEvent, StreamHandler};
pub use types::{ChatResult, Message, MessageRole, Payload, Usage};

use futures::Stream;
use std::pin::Pin;

/// Result type alias for the library
pub type Result<T> = std::result::Result<T, Error>;

/// A unified pinned, boxed stream that emits `Result<T>`
pub type BoxStream<'a, T> = Pin<Box<dyn Stream<Item = Result<T>> + Send + 'a>>;

/// Error type for the library
pub mod error;
pub use error::{Error, ErrorContext};
