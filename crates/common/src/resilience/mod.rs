//! Resilience patterns for transient upstream failures
//!
//! This module provides the retry policy the HTTP transport consults after
//! every failed attempt:
//! - **[`RetryConfig`]**: bounded exponential backoff with additive jitter
//! - **[`TransientFailurePolicy`]**: retries only failures that can succeed
//!   unchanged (no response, 429, 5xx)
//!
//! The retry loop itself lives in the transport so every stage stays
//! observable on its own.

pub mod retry;

pub use retry::{
    Jitter, RetryConfig, RetryConfigBuilder, RetryDecision, RetryError, RetryPolicy,
    TransientFailurePolicy,
};
