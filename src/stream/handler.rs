use serde_json::Value;
use tokio::sync::mpsc;

use crate::types::Usage;
use crate::Error;

/// One decoded stream event.
#[derive(Debug, Clone, PartialEq)]
pub struct StreamChunk {
    pub raw: Value,
    /// Text extracted by the provider adapter; empty for metadata-only events.
    pub text: String,
    pub provider: String,
    pub model: String,
}

/// Events delivered through [`StreamHandler::channel`].
#[derive(Debug, Clone, PartialEq)]
pub enum StreamEvent {
    Chunk(StreamChunk),
    Complete { content: String, usage: Usage },
    Error { tag: String, message: String },
}

type ChunkFn = Box<dyn FnMut(&StreamChunk) + Send>;
type CompleteFn = Box<dyn FnMut(&str, &Usage) + Send>;
type ErrorFn = Box<dyn FnMut(&Error) + Send>;

/// Receives the events of one streaming call.
///
/// Text is accumulated as chunks arrive and the full content is passed to the
/// completion callback together with the final usage. Callbacks are optional;
/// a handler with none set only accumulates.
#[derive(Default)]
pub struct StreamHandler {
    content: String,
    chunks: usize,
    on_chunk: Option<ChunkFn>,
    on_complete: Option<CompleteFn>,
    on_error: Option<ErrorFn>,
}

impl StreamHandler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn on_chunk(mut self, f: impl FnMut(&StreamChunk) + Send + 'static) -> Self {
        self.on_chunk = Some(Box::new(f));
        self
    }

    pub fn on_complete(mut self, f: impl FnMut(&str, &Usage) + Send + 'static) -> Self {
        self.on_complete = Some(Box::new(f));
        self
    }

    pub fn on_error(mut self, f: impl FnMut(&Error) + Send + 'static) -> Self {
        self.on_error = Some(Box::new(f));
        self
    }

    /// Handler that forwards everything into an unbounded channel.
    ///
    /// Sends after the receiver is dropped are ignored.
    pub fn channel() -> (Self, mpsc::UnboundedReceiver<StreamEvent>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let chunk_tx = tx.clone();
        let complete_tx = tx.clone();
        let handler = Self::new()
            .on_chunk(move |chunk| {
                let _ = chunk_tx.send(StreamEvent::Chunk(chunk.clone()));
            })
            .on_complete(move |content, usage| {
                let _ = complete_tx.send(StreamEvent::Complete {
                    content: content.to_string(),
                    usage: usage.clone(),
                });
            })
            .on_error(move |err| {
                let _ = tx.send(StreamEvent::Error {
                    tag: err.tag().to_string(),
                    message: err.to_string(),
                });
            });
        (handler, rx)
    }

    pub fn handle_chunk(&mut self, chunk: StreamChunk) {
        self.chunks += 1;
        self.content.push_str(&chunk.text);
        if let Some(f) = self.on_chunk.as_mut() {
            f(&chunk);
        }
    }

    pub fn complete(&mut self, usage: &Usage) {
        if let Some(f) = self.on_complete.as_mut() {
            f(&self.content, usage);
        }
    }

    pub fn error(&mut self, err: &Error) {
        if let Some(f) = self.on_error.as_mut() {
            f(err);
        }
    }

    /// Text accumulated so far.
    pub fn content(&self) -> &str {
        &self.content
    }

    /// Chunks received so far.
    pub fn chunks_received(&self) -> usize {
        self.chunks
    }
}

impl std::fmt::Debug for StreamHandler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StreamHandler")
            .field("content_len", &self.content.len())
            .field("chunks", &self.chunks)
            .field("on_chunk", &self.on_chunk.is_some())
            .field("on_complete", &self.on_complete.is_some())
            .field("on_error", &self.on_error.is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::sync::{Arc, Mutex};

    fn chunk(text: &str) -> StreamChunk {
        StreamChunk {
            raw: json!({}),
            text: text.to_string(),
            provider: "OpenAI".into(),
            model: "gpt-4o".into(),
        }
    }

    #[test]
    fn test_complete_receives_accumulated_content() {
        let seen = Arc::new(Mutex::new(None));
        let s = seen.clone();
        let mut handler = StreamHandler::new().on_complete(move |content, usage| {
            *s.lock().unwrap() = Some((content.to_string(), usage.clone()));
        });
        handler.handle_chunk(chunk("Hel"));
        handler.handle_chunk(chunk("lo"));
        let mut usage = Usage::new();
        usage.insert("total_tokens".into(), 2);
        handler.complete(&usage);

        let (content, got) = seen.lock().unwrap().clone().unwrap();
        assert_eq!(content, "Hello");
        assert_eq!(got["total_tokens"], 2);
        assert_eq!(handler.chunks_received(), 2);
    }

    #[tokio::test]
    async fn test_channel_handler_orders_events() {
        let (mut handler, mut rx) = StreamHandler::channel();
        handler.handle_chunk(chunk("a"));
        handler.error(&Error::tagged("timeout", "slow"));
        handler.complete(&Usage::new());
        drop(handler);

        assert!(matches!(rx.recv().await, Some(StreamEvent::Chunk(c)) if c.text == "a"));
        assert!(matches!(rx.recv().await, Some(StreamEvent::Error { tag, .. }) if tag == "timeout"));
        assert!(matches!(rx.recv().await, Some(StreamEvent::Complete { content, .. }) if content == "a"));
        assert!(rx.recv().await.is_none());
    }
}
