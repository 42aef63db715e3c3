use bytes::Bytes;
use futures::{Stream, StreamExt};
use serde_json::Value;
use std::sync::Arc;
use tracing::{debug, warn};

use super::handler::{StreamChunk, StreamHandler};
use super::line::LineReader;
use crate::provider::ProviderAdapter;
use crate::types::Usage;
use crate::{Error, Result};

const DATA_PREFIX: &str = "data:";
const DONE_SENTINEL: &str = "[DONE]";

/// Turns a `data: <json>` event stream into handler calls.
#[derive(Debug, Clone)]
pub struct StreamProcessor {
    adapter: Arc<dyn ProviderAdapter>,
    model: String,
}

impl StreamProcessor {
    pub fn new(adapter: Arc<dyn ProviderAdapter>, model: impl Into<String>) -> Self {
        Self {
            adapter,
            model: model.into(),
        }
    }

    /// Drain `input`, forwarding each decoded event to `handler`.
    ///
    /// Returns the last usage any event reported. Malformed events are logged
    /// and skipped. An input error before the first event is returned as is;
    /// after that it is wrapped in [`Error::StreamInterrupted`].
    pub async fn process<S>(&self, mut input: S, handler: &mut StreamHandler) -> Result<Usage>
    where
        S: Stream<Item = Result<Bytes>> + Unpin,
    {
        let mut reader = LineReader::new();
        let mut usage = Usage::new();
        let mut delivered = 0usize;

        while let Some(next) = input.next().await {
            let bytes = match next {
                Ok(b) => b,
                Err(e) if delivered == 0 => return Err(e),
                Err(e) => {
                    return Err(Error::StreamInterrupted {
                        delivered,
                        source: Box::new(e),
                    })
                }
            };
            for line in reader.push(&bytes) {
                if self.handle_line(&line, handler, &mut usage) {
                    delivered += 1;
                }
            }
        }

        if let Some(line) = reader.finish() {
            if self.handle_line(&line, handler, &mut usage) {
                delivered += 1;
            }
        }

        debug!(
            provider = self.adapter.client_name(),
            chunks = delivered,
            "stream finished"
        );
        Ok(usage)
    }

    /// Returns whether the line produced a chunk.
    fn handle_line(&self, line: &str, handler: &mut StreamHandler, usage: &mut Usage) -> bool {
        let Some(raw) = self.decode_line(line) else {
            return false;
        };

        if let Some(u) = raw.get("usage") {
            if is_present(u) {
                *usage = self.adapter.extract_usage(&raw);
            }
        }

        let text = self.adapter.extract_stream_text(&raw);
        handler.handle_chunk(StreamChunk {
            raw,
            text,
            provider: self.adapter.client_name().to_string(),
            model: self.model.clone(),
        });
        true
    }

    fn decode_line(&self, line: &str) -> Option<Value> {
        let line = line.trim();
        if line.is_empty() || line == DONE_SENTINEL {
            return None;
        }
        let payload = line.strip_prefix(DATA_PREFIX)?.trim();
        if payload.is_empty() || payload == DONE_SENTINEL {
            return None;
        }
        match serde_json::from_str(payload) {
            Ok(v) => Some(v),
            Err(e) => {
                warn!(
                    provider = self.adapter.client_name(),
                    error = %e,
                    line = payload,
                    "skipping undecodable stream event"
                );
                None
            }
        }
    }
}

fn is_present(usage: &Value) -> bool {
    match usage {
        Value::Null => false,
        Value::Object(m) => !m.is_empty(),
        _ => true,
    }
}
