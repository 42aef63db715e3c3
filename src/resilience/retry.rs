//! Retry with exponential backoff and jitter.
//!
//! Failures are classified by their tag (see [`crate::Error::tag`]). An
//! operation may also succeed at the transport level yet report a failure in
//! its value (a [`ChatResult`] with `success = false`, a JSON body with an
//! `error` object); [`RetryOutcome`] exposes that so the same classification
//! applies.

use rand::Rng;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::future::Future;
use std::time::Duration;
use tracing::warn;

use crate::types::{ChatResult, Usage};
use crate::{Error, ErrorContext, Result};

pub const DEFAULT_RETRYABLE_ERRORS: [&str; 5] =
    ["rate_limit", "timeout", "connection", "server_error", "unknown"];

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetryConfig {
    pub max_retries: u32,
    pub initial_backoff_ms: u64,
    pub backoff_multiplier: f64,
    pub retryable_errors: Vec<String>,
    /// Upper bound for a single sleep. Unset means unbounded.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_backoff_ms: Option<u64>,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: 3,
            initial_backoff_ms: 1000,
            backoff_multiplier: 2.0,
            retryable_errors: DEFAULT_RETRYABLE_ERRORS
                .iter()
                .map(|s| s.to_string())
                .collect(),
            max_backoff_ms: None,
        }
    }
}

impl RetryConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries;
        self
    }

    pub fn with_initial_backoff_ms(mut self, ms: u64) -> Self {
        self.initial_backoff_ms = ms;
        self
    }

    pub fn with_backoff_multiplier(mut self, multiplier: f64) -> Self {
        self.backoff_multiplier = multiplier;
        self
    }

    pub fn with_retryable_errors<I, S>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.retryable_errors = tags.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_max_backoff_ms(mut self, ms: u64) -> Self {
        self.max_backoff_ms = Some(ms);
        self
    }

    pub fn validate(&self) -> Result<()> {
        if self.initial_backoff_ms == 0 {
            return Err(Error::configuration_with_context(
                "initial backoff must be positive",
                ErrorContext::new()
                    .with_field_path("retry.initial_backoff_ms")
                    .with_source("retry_config"),
            ));
        }
        if !(self.backoff_multiplier > 1.0) || !self.backoff_multiplier.is_finite() {
            return Err(Error::configuration_with_context(
                "backoff multiplier must be greater than 1",
                ErrorContext::new()
                    .with_field_path("retry.backoff_multiplier")
                    .with_details(format!("got {}", self.backoff_multiplier))
                    .with_source("retry_config"),
            ));
        }
        Ok(())
    }

    /// Tags match case-insensitively.
    pub fn is_retryable(&self, tag: &str) -> bool {
        self.retryable_errors
            .iter()
            .any(|t| t.eq_ignore_ascii_case(tag))
    }
}

/// Per-call overrides; unset fields fall back to the manager's config.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RetryOverrides {
    pub max_retries: Option<u32>,
    pub initial_backoff_ms: Option<u64>,
    pub backoff_multiplier: Option<f64>,
    pub retryable_errors: Option<Vec<String>>,
}

impl RetryOverrides {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn max_retries(mut self, n: u32) -> Self {
        self.max_retries = Some(n);
        self
    }

    pub fn initial_backoff_ms(mut self, ms: u64) -> Self {
        self.initial_backoff_ms = Some(ms);
        self
    }

    pub fn backoff_multiplier(mut self, multiplier: f64) -> Self {
        self.backoff_multiplier = Some(multiplier);
        self
    }

    pub fn retryable_errors<I, S>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.retryable_errors = Some(tags.into_iter().map(Into::into).collect());
        self
    }
}

/// Lets a successful return value report a failure of its own.
pub trait RetryOutcome {
    /// The error this value describes, if any.
    fn failure(&self) -> Option<Error>;
}

impl RetryOutcome for ChatResult {
    fn failure(&self) -> Option<Error> {
        self.failure_details().map(|(tag, message)| Error::Failed {
            tag: tag.to_string(),
            message: message.to_string(),
        })
    }
}

/// A decoded provider body with a non-empty `error` field.
impl RetryOutcome for Value {
    fn failure(&self) -> Option<Error> {
        match self.get("error")? {
            Value::Object(err) if !err.is_empty() => {
                let message = err
                    .get("message")
                    .and_then(Value::as_str)
                    .unwrap_or("Unknown error");
                Some(Error::api(err.get("type").and_then(Value::as_str), message))
            }
            Value::String(message) if !message.is_empty() => {
                Some(Error::tagged("unknown", message.clone()))
            }
            _ => None,
        }
    }
}

impl RetryOutcome for Usage {
    fn failure(&self) -> Option<Error> {
        None
    }
}

impl RetryOutcome for () {
    fn failure(&self) -> Option<Error> {
        None
    }
}

pub struct RetryManager {
    config: RetryConfig,
}

impl RetryManager {
    pub fn new(config: RetryConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &RetryConfig {
        &self.config
    }

    /// Merge overrides into the configured policy and validate the result.
    pub fn resolve(&self, overrides: Option<&RetryOverrides>) -> Result<RetryConfig> {
        let mut policy = self.config.clone();
        if let Some(o) = overrides {
            if let Some(n) = o.max_retries {
                policy.max_retries = n;
            }
            if let Some(ms) = o.initial_backoff_ms {
                policy.initial_backoff_ms = ms;
            }
            if let Some(m) = o.backoff_multiplier {
                policy.backoff_multiplier = m;
            }
            if let Some(tags) = &o.retryable_errors {
                policy.retryable_errors = tags.clone();
            }
        }
        policy.validate()?;
        Ok(policy)
    }

    /// Run `operation` until it succeeds, fails with a non-retryable tag, or
    /// uses up `max_retries` retries. The last error is returned unchanged.
    pub async fn execute_with_retry<F, Fut, T>(
        &self,
        mut operation: F,
        overrides: Option<&RetryOverrides>,
    ) -> Result<T>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T>>,
        T: RetryOutcome,
    {
        let policy = self.resolve(overrides)?;
        let mut attempts: u32 = 0;
        let mut backoff_ms = policy.initial_backoff_ms as f64;
        let mut last_error: Option<String> = None;

        while attempts <= policy.max_retries {
            attempts += 1;
            let err = match operation().await {
                Ok(value) => match value.failure() {
                    None => return Ok(value),
                    Some(err) => err,
                },
                Err(e) => e,
            };

            if !policy.is_retryable(err.tag()) || attempts > policy.max_retries {
                return Err(err);
            }

            let sleep_ms = match policy.max_backoff_ms {
                Some(cap) => backoff_ms.min(cap as f64),
                None => backoff_ms,
            };
            warn!(
                attempt = attempts,
                max_retries = policy.max_retries,
                backoff_ms = sleep_ms as u64,
                error_type = err.tag(),
                error = %err,
                "call failed, retrying"
            );
            last_error = Some(err.to_string());

            tokio::time::sleep(Duration::from_millis(sleep_ms as u64)).await;
            backoff_ms = next_backoff(backoff_ms, policy.backoff_multiplier);
        }

        Err(Error::RetriesExhausted {
            retries: policy.max_retries,
            last_error: last_error.unwrap_or_else(|| "Unknown error".to_string()),
        })
    }
}

impl Default for RetryManager {
    fn default() -> Self {
        Self::new(RetryConfig::default())
    }
}

/// `current * multiplier * (0.5 + U[0, 1])`
fn next_backoff(current_ms: f64, multiplier: f64) -> f64 {
    let mut rng = rand::thread_rng();
    current_ms * multiplier * (0.5 + rng.gen_range(0.0..=1.0))
}
