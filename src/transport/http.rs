use crate::{BoxStream, Error, ErrorContext, Result};
use bytes::Bytes;
use futures::TryStreamExt;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue, CONTENT_TYPE};
use serde::Serialize;
use serde_json::Value;
use std::collections::HashMap;
use std::env;
use std::time::Duration;
use tracing::debug;
use url::Url;

/// Environment override for the request timeout, in seconds.
pub const TIMEOUT_ENV: &str = "NEXUS_HTTP_TIMEOUT_SECS";
const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// JSON-over-HTTP client bound to one provider's base URL and API version.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: reqwest::Client,
    base_url: String,
    api_version: String,
}

impl HttpTransport {
    /// `headers` are sent with every request (auth, version pins).
    pub fn new(
        base_url: &str,
        api_version: &str,
        headers: &HashMap<String, String>,
        timeout: Option<Duration>,
    ) -> Result<Self> {
        let timeout = timeout.unwrap_or_else(|| {
            Duration::from_secs(
                env::var(TIMEOUT_ENV)
                    .ok()
                    .and_then(|s| s.parse::<u64>().ok())
                    .unwrap_or(DEFAULT_TIMEOUT_SECS),
            )
        });

        let mut default_headers = HeaderMap::new();
        default_headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        for (name, value) in headers {
            let name = HeaderName::from_bytes(name.as_bytes()).map_err(|e| {
                Error::configuration_with_context(
                    format!("invalid header name: {}", e),
                    ErrorContext::new().with_field_path(name.clone()),
                )
            })?;
            let mut value = HeaderValue::from_str(value).map_err(|e| {
                Error::configuration_with_context(
                    format!("invalid header value: {}", e),
                    ErrorContext::new().with_field_path(name.to_string()),
                )
            })?;
            if is_secret(&name) {
                value.set_sensitive(true);
            }
            default_headers.insert(name, value);
        }

        let client = reqwest::Client::builder()
            .timeout(timeout)
            .default_headers(default_headers)
            .build()
            .map_err(|e| Error::Transport(TransportError::Other(e.to_string())))?;

        let base_url = base_url.trim_end_matches('/').to_string();
        Url::parse(&base_url).map_err(|e| {
            Error::configuration_with_context(
                format!("invalid base URL: {}", e),
                ErrorContext::new()
                    .with_field_path("base_url")
                    .with_details(base_url.clone()),
            )
        })?;

        Ok(Self {
            client,
            base_url,
            api_version: api_version.trim_matches('/').to_string(),
        })
    }

    /// `{base_url}/{api_version}/{endpoint}`; an empty version segment is skipped.
    pub fn endpoint_url(&self, endpoint: &str) -> Result<Url> {
        let endpoint = endpoint.trim_start_matches('/');
        let joined = if self.api_version.is_empty() {
            format!("{}/{}", self.base_url, endpoint)
        } else {
            format!("{}/{}/{}", self.base_url, self.api_version, endpoint)
        };
        Url::parse(&joined).map_err(|e| {
            Error::invalid_argument_with_context(
                format!("cannot build request URL: {}", e),
                ErrorContext::new()
                    .with_field_path("endpoint")
                    .with_details(joined),
            )
        })
    }

    /// POST `body` and decode the JSON answer.
    ///
    /// A non-2xx status, or a 2xx body carrying an `error` object, is an error.
    pub async fn post_json<B: Serialize + ?Sized>(&self, endpoint: &str, body: &B) -> Result<Value> {
        let url = self.endpoint_url(endpoint)?;
        let response = self
            .client
            .post(url)
            .json(body)
            .send()
            .await
            .map_err(|e| Error::Transport(TransportError::Http(e)))?;

        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|e| Error::Transport(TransportError::Http(e)))?;
        debug!(http_status = status.as_u16(), bytes = text.len(), "provider responded");

        if !status.is_success() {
            return Err(status_error(status.as_u16(), &text));
        }

        let json: Value = serde_json::from_str(&text)?;
        if let Some(err) = provider_error(&json, None) {
            return Err(err);
        }
        Ok(json)
    }

    /// POST `body` and hand back the raw response bytes.
    ///
    /// Fails before reading the body when the status is not 2xx.
    pub async fn post_stream<B: Serialize + ?Sized>(
        &self,
        endpoint: &str,
        body: &B,
    ) -> Result<BoxStream<'static, Bytes>> {
        let url = self.endpoint_url(endpoint)?;
        let response = self
            .client
            .post(url)
            .header("accept", "text/event-stream")
            .json(body)
            .send()
            .await
            .map_err(|e| Error::Transport(TransportError::Http(e)))?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(status_error(status.as_u16(), &text));
        }

        let byte_stream = response
            .bytes_stream()
            .map_err(|e| Error::Transport(TransportError::Http(e)));
        Ok(Box::pin(byte_stream))
    }
}

fn is_secret(name: &HeaderName) -> bool {
    name == reqwest::header::AUTHORIZATION || name.as_str() == "x-api-key"
}

/// Error for a non-2xx answer, preferring the provider's own `error` object.
fn status_error(status: u16, body: &str) -> Error {
    serde_json::from_str::<Value>(body)
        .ok()
        .and_then(|json| provider_error(&json, Some(status)))
        .unwrap_or_else(|| {
            Error::Transport(TransportError::Status {
                status,
                body: body.chars().take(512).collect(),
            })
        })
}

/// `{"error": {"message", "type"}}` or `{"error": "message"}`.
fn provider_error(json: &Value, status: Option<u16>) -> Option<Error> {
    let fallback_tag = || status.map(status_tag).unwrap_or("unknown");
    match json.get("error")? {
        Value::Object(obj) if !obj.is_empty() => {
            let message = obj
                .get("message")
                .and_then(Value::as_str)
                .unwrap_or("Unknown error")
                .to_string();
            match obj.get("type").and_then(Value::as_str) {
                Some(t) if !t.trim().is_empty() => Some(Error::api(Some(t), message)),
                _ => Some(Error::tagged(fallback_tag(), message)),
            }
        }
        Value::String(s) if !s.is_empty() => Some(Error::tagged(fallback_tag(), s.clone())),
        _ => None,
    }
}

/// Tag for a bare HTTP status.
pub fn status_tag(status: u16) -> &'static str {
    match status {
        408 => "timeout",
        429 => "rate_limit",
        500..=599 => "server_error",
        400..=499 => "client_error",
        _ => "unknown",
    }
}

#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    #[error("HTTP transport not initialized")]
    NotInitialized,

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("HTTP status {status}: {body}")]
    Status { status: u16, body: String },

    #[error("Transport error: {0}")]
    Other(String),
}

impl TransportError {
    pub fn tag(&self) -> &str {
        match self {
            TransportError::NotInitialized => "not_initialized",
            TransportError::Http(e) if e.is_timeout() => "timeout",
            TransportError::Http(e) if e.is_connect() => "connection",
            TransportError::Http(e) => match e.status() {
                Some(s) => status_tag(s.as_u16()),
                None if e.is_request() || e.is_body() => "connection",
                None => "unknown",
            },
            TransportError::Status { status, .. } => status_tag(*status),
            TransportError::Other(_) => "unknown",
        }
    }
}
