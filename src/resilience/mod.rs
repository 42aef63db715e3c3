//! 弹性模式模块：提供带指数退避和抖动的重试机制。
//!
//! # Resilience Module
//!
//! Bounded retries for provider calls. Retryability is decided by the error's
//! tag, so the set of transient failures is pure configuration.
//!
//! ```rust,no_run
//! use llm_nexus::resilience::{RetryConfig, RetryManager, RetryOverrides};
//! use llm_nexus::Error;
//!
//! # async fn run() -> llm_nexus::Result<()> {
//! let retry = RetryManager::new(RetryConfig::new().with_max_retries(2));
//! let value: serde_json::Value = retry
//!     .execute_with_retry(
//!         || async { Err(Error::tagged("rate_limit", "slow down")) },
//!         Some(&RetryOverrides::new().initial_backoff_ms(250)),
//!     )
//!     .await?;
//! # let _ = value;
//! # Ok(())
//! # }
//! ```

pub mod retry;

pub use retry::{
    RetryConfig, RetryManager, RetryOutcome, RetryOverrides, DEFAULT_RETRYABLE_ERRORS,
};
