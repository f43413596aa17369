//! Retry policy and backoff for outbound calls
//!
//! The transport owns the retry loop; this module only answers two
//! questions for it: should this failure be retried, and how long to wait
//! first. Delays follow
//!
//! ```text
//! delay(attempt) = min(base * 2^attempt + jitter, max_delay)
//! ```
//!
//! where `jitter` is drawn uniformly from `[0, base]`. A rate-limited
//! failure raises the delay to at least the upstream `retry-after`, still
//! bounded by `max_delay`.

use std::time::Duration;

use mixtape_domain::{ClientSettings, DomainError};
use rand::Rng;
use thiserror::Error;

use crate::error::is_retryable;

/// Errors that can occur when building a retry configuration
#[derive(Debug, Error, PartialEq, Eq)]
pub enum RetryError {
    /// The retry strategy configuration is invalid
    #[error("Invalid retry configuration: {message}")]
    InvalidConfiguration { message: String },
}

/// Trait for determining whether an error should be retried
pub trait RetryPolicy<E> {
    /// Determine if the error should be retried and how long to wait
    fn should_retry(&self, error: &E, attempt: u32) -> RetryDecision;
}

/// Decision for whether to retry an operation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetryDecision {
    /// Retry the operation after the given delay
    RetryAfter(Duration),
    /// Don't retry the operation
    Stop,
}

impl RetryDecision {
    #[must_use]
    pub const fn is_retry(self) -> bool {
        matches!(self, Self::RetryAfter(_))
    }
}

/// Jitter type for adding randomness to retry delays
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Jitter {
    /// No jitter
    None,
    /// Add a uniform random value in `[0, base_delay]`
    Additive,
}

/// Configuration for retry behavior
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryConfig {
    /// Maximum number of retries after the first attempt
    pub max_retries: u32,
    /// Base backoff unit
    pub base_delay: Duration,
    /// Upper bound for any single delay
    pub max_delay: Duration,
    /// Jitter type for randomizing delays
    pub jitter: Jitter,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self::from(&ClientSettings::default())
    }
}

impl From<&ClientSettings> for RetryConfig {
    fn from(settings: &ClientSettings) -> Self {
        Self {
            max_retries: settings.retries,
            base_delay: settings.retry_delay(),
            max_delay: settings.max_retry_delay(),
            jitter: Jitter::Additive,
        }
    }
}

impl RetryConfig {
    /// Create a configuration builder
    pub fn builder() -> RetryConfigBuilder {
        RetryConfigBuilder::new()
    }

    /// Validate the configuration
    ///
    /// # Errors
    /// Returns [`RetryError::InvalidConfiguration`] when the base delay
    /// exceeds the cap.
    pub fn validate(&self) -> Result<(), RetryError> {
        if self.base_delay > self.max_delay {
            return Err(RetryError::InvalidConfiguration {
                message: format!(
                    "base_delay {:?} must not exceed max_delay {:?}",
                    self.base_delay, self.max_delay
                ),
            });
        }
        Ok(())
    }

    /// Delay before retry number `attempt + 1`.
    ///
    /// `attempt` is the zero-based index of the attempt that just failed.
    #[must_use]
    pub fn backoff_delay(&self, attempt: u32) -> Duration {
        let base_ms = duration_millis(self.base_delay);
        let exponential = base_ms.saturating_mul(2u64.saturating_pow(attempt));
        let jitter = match self.jitter {
            Jitter::None => 0,
            Jitter::Additive if base_ms == 0 => 0,
            Jitter::Additive => rand::thread_rng().gen_range(0..=base_ms),
        };
        let delay = Duration::from_millis(exponential.saturating_add(jitter));
        delay.min(self.max_delay)
    }

    /// Backoff delay raised to at least `retry_after`, still capped.
    #[must_use]
    pub fn delay_for(&self, attempt: u32, retry_after: Option<Duration>) -> Duration {
        let delay = self.backoff_delay(attempt);
        match retry_after {
            Some(upstream) if upstream > delay => upstream.min(self.max_delay),
            _ => delay,
        }
    }
}

fn duration_millis(duration: Duration) -> u64 {
    u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)
}

/// Builder for `RetryConfig` with fluent API
#[derive(Debug)]
pub struct RetryConfigBuilder {
    config: RetryConfig,
}

impl Default for RetryConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl RetryConfigBuilder {
    pub fn new() -> Self {
        Self { config: RetryConfig::default() }
    }

    #[must_use]
    pub fn max_retries(mut self, retries: u32) -> Self {
        self.config.max_retries = retries;
        self
    }

    #[must_use]
    pub fn base_delay(mut self, delay: Duration) -> Self {
        self.config.base_delay = delay;
        self
    }

    #[must_use]
    pub fn max_delay(mut self, delay: Duration) -> Self {
        self.config.max_delay = delay;
        self
    }

    #[must_use]
    pub fn no_jitter(mut self) -> Self {
        self.config.jitter = Jitter::None;
        self
    }

    /// # Errors
    /// See [`RetryConfig::validate`].
    pub fn build(self) -> Result<RetryConfig, RetryError> {
        self.config.validate()?;
        Ok(self.config)
    }
}

/// Retries transient failures: no response, 429 or 5xx.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransientFailurePolicy {
    config: RetryConfig,
}

impl TransientFailurePolicy {
    pub fn new(config: RetryConfig) -> Self {
        Self { config }
    }

    #[must_use]
    pub fn config(&self) -> &RetryConfig {
        &self.config
    }
}

impl RetryPolicy<DomainError> for TransientFailurePolicy {
    fn should_retry(&self, error: &DomainError, attempt: u32) -> RetryDecision {
        if attempt >= self.config.max_retries || !is_retryable(error) {
            return RetryDecision::Stop;
        }
        let retry_after = error.retry_after_ms.map(Duration::from_millis);
        RetryDecision::RetryAfter(self.config.delay_for(attempt, retry_after))
    }
}
