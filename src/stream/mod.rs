//! 流式响应处理模块：将 SSE 字节流解码为离散事件。
//!
//! # Streaming Module
//!
//! Providers stream responses as newline-delimited `data: <json>` events
//! ending with `data: [DONE]`. [`StreamProcessor`] decodes them and feeds a
//! [`StreamHandler`], which either runs caller closures or forwards
//! [`StreamEvent`]s into a channel.
//!
//! ```rust
//! use llm_nexus::stream::StreamHandler;
//!
//! let handler = StreamHandler::new()
//!     .on_chunk(|chunk| print!("{}", chunk.text))
//!     .on_complete(|content, usage| println!("\n{} chars, usage {:?}", content.len(), usage))
//!     .on_error(|err| eprintln!("stream failed: {}", err));
//! # let _ = handler;
//! ```

mod handler;
mod line;
mod processor;

pub use handler::{StreamChunk, StreamEvent, StreamHandler};
pub use line::LineReader;
pub use processor::StreamProcessor;
