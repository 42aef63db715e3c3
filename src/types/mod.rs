//! # Types Module
//!
//! Core value types passed between the client, the cache and the retry layer.
//!
//! | Type | Description |
//! |------|-------------|
//! | [`Message`] | Chat message with role and content |
//! | [`MessageRole`] | Message role (system, user, assistant) |
//! | [`Payload`] | JSON request body sent to the provider |
//! | [`ChatResult`] | Uniform success/failure result of a non-streaming call |
//! | [`Usage`] | Token counters relayed from the provider |
//!
//! ## Example
//!
//! ```rust
//! use llm_nexus::types::{Message, Payload};
//!
//! let payload = Payload::with_messages([
//!     Message::system("You are a helpful assistant"),
//!     Message::user("What's the weather?"),
//! ])
//! .with_max_tokens(64);
//!
//! assert_eq!(payload.messages().map(|m| m.len()), Some(2));
//! assert!(!payload.has_stream_flag());
//! ```

pub mod message;
pub mod payload;
pub mod result;

pub use message::{Message, MessageRole};
pub use payload::Payload;
pub use result::{ChatResult, Usage};
