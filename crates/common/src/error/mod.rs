//! Error taxonomy
//!
//! Every failure the client can produce ends up as a
//! [`mixtape_domain::DomainError`]. This module holds the pieces that get it
//! there and describe it afterwards:
//!
//! 1. **[`registry`]**: static metadata per [`ErrorCode`] (retryability,
//!    default message, severity, default status)
//! 2. **[`classify`]**: raw failure to `DomainError`, in a fixed priority
//!    order
//! 3. **[`normalize`]**: the serializable [`NormalizedError`] projection
//!
//! ## ErrorClassification Trait
//!
//! [`ErrorClassification`] gives retry loops and log sinks one interface to
//! ask an error how it should be treated:
//!
//! - **`is_retryable()`**: can the same call succeed if repeated?
//! - **`severity()`**: how loud should monitoring be?
//! - **`is_critical()`**: does this need a human?
//! - **`retry_after()`**: upstream-suggested delay, if any
//!
//! ## Examples
//!
//! ```rust
//! use mixtape_common::error::{classify, to_normalized, HttpFailure};
//! use mixtape_domain::ErrorCode;
//!
//! let error = classify(HttpFailure::new(429, "").with_retry_after("2"), None);
//! assert_eq!(error.code, ErrorCode::RateLimit);
//! assert_eq!(error.retry_after_ms, Some(2_000));
//!
//! let normalized = to_normalized(&error);
//! assert!(normalized.is_retryable);
//! ```

use std::time::Duration;

use mixtape_domain::{DomainError, ErrorCode, ErrorSeverity};

pub mod classify;
pub mod normalize;
pub mod registry;

pub use classify::{
    classify, extract_upstream_message, is_token_expired, parse_retry_after_ms, Failure,
    HttpFailure, TransportFailure, TransportFailureKind,
};
pub use normalize::{is_retryable, to_normalized, NormalizedError};
pub use registry::{lookup_metadata, ErrorTypeMetadata};

/// Standard interface for classifying errors by their characteristics.
pub trait ErrorClassification {
    /// Check if this error is retryable
    fn is_retryable(&self) -> bool;

    /// Get the error severity level
    fn severity(&self) -> ErrorSeverity;

    /// Check if this is an error requiring immediate attention
    fn is_critical(&self) -> bool;

    /// Get the suggested retry delay if applicable
    ///
    /// Returns `Some(Duration)` when the upstream named a delay (a
    /// `retry-after` header), `None` otherwise.
    fn retry_after(&self) -> Option<Duration>;
}

impl ErrorClassification for DomainError {
    fn is_retryable(&self) -> bool {
        normalize::is_retryable(self)
    }

    fn severity(&self) -> ErrorSeverity {
        lookup_metadata(self.code).severity
    }

    fn is_critical(&self) -> bool {
        // Bad credentials never fix themselves.
        self.code == ErrorCode::Authentication
    }

    fn retry_after(&self) -> Option<Duration> {
        self.retry_after_ms.filter(|ms| *ms > 0).map(Duration::from_millis)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classification_reads_registry() {
        let error = DomainError::new(ErrorCode::InvalidResponse, "missing name");
        assert_eq!(error.severity(), ErrorSeverity::High);
        assert!(!ErrorClassification::is_retryable(&error));
        assert!(!error.is_critical());
    }

    #[test]
    fn retry_after_ignores_zero() {
        let error = DomainError::new(ErrorCode::RateLimit, "slow").with_retry_after_ms(0);
        assert_eq!(error.retry_after(), None);
        let error = error.with_retry_after_ms(1_500);
        assert_eq!(error.retry_after(), Some(Duration::from_millis(1_500)));
    }

    #[test]
    fn authentication_is_critical() {
        assert!(DomainError::new(ErrorCode::Authentication, "bad secret").is_critical());
        assert!(!DomainError::new(ErrorCode::TokenExpired, "stale").is_critical());
    }
}
