use crate::transport::TransportError;
use thiserror::Error;

/// Structured error context for better error handling and debugging.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ErrorContext {
    /// Field path or configuration key that caused the error (e.g., "retry.backoff_multiplier", "payload.messages")
    pub field_path: Option<String>,
    /// Additional context about the error (e.g., expected range, actual value)
    pub details: Option<String>,
    /// Source of the error (e.g., "provider_client", "config_loader")
    pub source: Option<String>,
}

impl ErrorContext {
    pub fn new() -> Self {
        Self {
            field_path: None,
            details: None,
            source: None,
        }
    }

    pub fn with_field_path(mut self, path: impl Into<String>) -> Self {
        self.field_path = Some(path.into());
        self
    }

    pub fn with_details(mut self, details: impl Into<String>) -> Self {
        self.details = Some(details.into());
        self
    }

    pub fn with_source(mut self, source: impl Into<String>) -> Self {
        self.source = Some(source.into());
        self
    }
}

impl Default for ErrorContext {
    fn default() -> Self {
        Self::new()
    }
}

/// Unified error type for the client.
///
/// Every variant maps to a machine-readable tag (see [`Error::tag`]). Retry
/// classification compares tags against the configured retryable set and
/// never inspects the human-readable message.
#[derive(Debug, Error)]
pub enum Error {
    #[error("Configuration error: {message}{}", format_context(.context))]
    Configuration {
        message: String,
        context: ErrorContext,
    },

    #[error("Invalid argument: {message}{}", format_context(.context))]
    InvalidArgument {
        message: String,
        context: ErrorContext,
    },

    #[error("Network transport error: {0}")]
    Transport(#[from] TransportError),

    /// The provider answered with an explicit `error` object.
    #[error("API error ({tag}): {message}")]
    Api { tag: String, message: String },

    /// A failure that was already reported as data (a failed [`ChatResult`]).
    /// `message` is the full text of the original error.
    ///
    /// [`ChatResult`]: crate::types::ChatResult
    #[error("{message}")]
    Failed { tag: String, message: String },

    #[error("Parse error: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Cache error: {message}")]
    Cache { message: String },

    /// The byte stream failed after at least one chunk reached the handler.
    #[error("Stream interrupted after {delivered} chunk(s): {source}")]
    StreamInterrupted {
        delivered: usize,
        #[source]
        source: Box<Error>,
    },

    #[error("Call failed after {retries} retries: {last_error}")]
    RetriesExhausted { retries: u32, last_error: String },
}

// Helper function to format error context for display
fn format_context(ctx: &ErrorContext) -> String {
    let mut parts = Vec::new();
    if let Some(ref field) = ctx.field_path {
        parts.push(format!("field: {}", field));
    }
    if let Some(ref details) = ctx.details {
        parts.push(format!("details: {}", details));
    }
    if let Some(ref source) = ctx.source {
        parts.push(format!("source: {}", source));
    }
    if parts.is_empty() {
        String::new()
    } else {
        format!(" ({})", parts.join(", "))
    }
}

impl Error {
    pub fn configuration(msg: impl Into<String>) -> Self {
        Error::Configuration {
            message: msg.into(),
            context: ErrorContext::new(),
        }
    }

    /// Create a new configuration error with structured context
    pub fn configuration_with_context(msg: impl Into<String>, context: ErrorContext) -> Self {
        Error::Configuration {
            message: msg.into(),
            context,
        }
    }

    pub fn invalid_argument(msg: impl Into<String>) -> Self {
        Error::InvalidArgument {
            message: msg.into(),
            context: ErrorContext::new(),
        }
    }

    /// Create a new invalid-argument error with structured context
    pub fn invalid_argument_with_context(msg: impl Into<String>, context: ErrorContext) -> Self {
        Error::InvalidArgument {
            message: msg.into(),
            context,
        }
    }

    /// Build an API error from the provider-reported `type` string.
    pub fn api(provider_type: Option<&str>, message: impl Into<String>) -> Self {
        Error::Api {
            tag: normalize_provider_error_type(provider_type),
            message: message.into(),
        }
    }

    /// Build an API error whose tag is already canonical.
    pub fn tagged(tag: impl Into<String>, message: impl Into<String>) -> Self {
        Error::Api {
            tag: tag.into(),
            message: message.into(),
        }
    }

    pub fn cache(msg: impl Into<String>) -> Self {
        Error::Cache {
            message: msg.into(),
        }
    }

    /// Machine-readable classification tag.
    pub fn tag(&self) -> &str {
        match self {
            Error::Configuration { .. } => "configuration",
            Error::InvalidArgument { .. } => "invalid_argument",
            Error::Transport(t) => t.tag(),
            Error::Api { tag, .. } | Error::Failed { tag, .. } => tag.as_str(),
            Error::Parse(_) => "parse",
            Error::Cache { .. } => "cache",
            Error::StreamInterrupted { .. } => "stream_interrupted",
            Error::RetriesExhausted { .. } => "retries_exhausted",
        }
    }

    /// Extract error context if available
    pub fn context(&self) -> Option<&ErrorContext> {
        match self {
            Error::Configuration { context, .. } | Error::InvalidArgument { context, .. } => {
                Some(context)
            }
            _ => None,
        }
    }
}

/// Maps a provider error `type` onto the canonical tag vocabulary used by the
/// retry configuration. Unrecognized types keep their lowercased spelling so
/// hosts can still list them in `retryable_errors`.
pub fn normalize_provider_error_type(provider_type: Option<&str>) -> String {
    let raw = match provider_type.map(str::trim) {
        Some(t) if !t.is_empty() => t.to_lowercase(),
        _ => return "unknown".to_string(),
    };
    let tag = match raw.as_str() {
        "rate_limit" | "rate_limited" | "rate_limit_error" | "rate_limit_exceeded" | "requests"
        | "tokens" => "rate_limit",
        "server_error" | "api_error" | "overloaded" | "overloaded_error"
        | "service_unavailable" | "internal_error" => "server_error",
        "timeout" | "request_timeout" | "timeout_error" => "timeout",
        "authentication" | "authentication_error" | "invalid_api_key" | "unauthorized" => {
            "authentication"
        }
        "invalid_request" | "invalid_request_error" => "invalid_request",
        other => return other.to_string(),
    };
    tag.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_provider_type_normalization() {
        assert_eq!(normalize_provider_error_type(Some("rate_limit_error")), "rate_limit");
        assert_eq!(normalize_provider_error_type(Some("overloaded_error")), "server_error");
        assert_eq!(normalize_provider_error_type(Some("invalid_request_error")), "invalid_request");
        assert_eq!(normalize_provider_error_type(Some("Insufficient_Quota")), "insufficient_quota");
        assert_eq!(normalize_provider_error_type(Some("  ")), "unknown");
        assert_eq!(normalize_provider_error_type(None), "unknown");
    }

    #[test]
    fn test_tags() {
        assert_eq!(Error::configuration("no key").tag(), "configuration");
        assert_eq!(Error::invalid_argument("empty").tag(), "invalid_argument");
        assert_eq!(Error::api(Some("api_error"), "boom").tag(), "server_error");
        assert_eq!(Error::tagged("timeout", "slow").tag(), "timeout");
        assert_eq!(
            Error::Transport(TransportError::NotInitialized).tag(),
            "not_initialized"
        );
        let interrupted = Error::StreamInterrupted {
            delivered: 2,
            source: Box::new(Error::tagged("connection", "reset")),
        };
        assert_eq!(interrupted.tag(), "stream_interrupted");
    }

    #[test]
    fn test_context_display() {
        let err = Error::configuration_with_context(
            "backoff multiplier must be greater than 1",
            ErrorContext::new()
                .with_field_path("retry.backoff_multiplier")
                .with_source("config"),
        );
        let msg = err.to_string();
        assert!(msg.contains("field: retry.backoff_multiplier"));
        assert!(msg.contains("source: config"));
        assert!(err.context().is_some());
    }
}
