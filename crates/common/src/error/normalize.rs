//! Log- and wire-facing projection of [`DomainError`].

use chrono::{DateTime, Utc};
use mixtape_domain::{DomainError, ErrorCode, ErrorContext, ErrorSeverity};
use serde::{Deserialize, Serialize};

use super::registry::lookup_metadata;

/// Serializable snapshot of a [`DomainError`] plus its registry metadata.
///
/// Derived on demand and never stored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NormalizedError {
    pub code: ErrorCode,
    pub message: String,
    /// The error's own status, or the code's default when it has none
    pub status_code: u16,
    pub context: ErrorContext,
    pub is_retryable: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub retry_after_ms: Option<u64>,
    pub severity: ErrorSeverity,
    pub timestamp: DateTime<Utc>,
}

/// Whether repeating the failed call can succeed without changing it.
#[must_use]
pub fn is_retryable(error: &DomainError) -> bool {
    matches!(error.code, ErrorCode::RateLimit | ErrorCode::Network)
        || error.status_code.is_some_and(|status| status >= 500)
}

/// Project `error` into a [`NormalizedError`] stamped with the current time.
#[must_use]
pub fn to_normalized(error: &DomainError) -> NormalizedError {
    let metadata = lookup_metadata(error.code);
    NormalizedError {
        code: error.code,
        message: error.message.clone(),
        status_code: error.status_code.unwrap_or(metadata.default_status_code),
        context: error.context.clone(),
        is_retryable: is_retryable(error),
        retry_after_ms: error.retry_after_ms,
        severity: metadata.severity,
        timestamp: Utc::now(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn retryable_by_code_or_server_status() {
        assert!(is_retryable(&DomainError::new(ErrorCode::Network, "down")));
        assert!(is_retryable(&DomainError::new(ErrorCode::RateLimit, "slow").with_status(429)));
        assert!(is_retryable(&DomainError::new(ErrorCode::ServerError, "boom").with_status(502)));
        assert!(is_retryable(&DomainError::new(ErrorCode::Unknown, "odd").with_status(500)));
        assert!(!is_retryable(&DomainError::new(ErrorCode::NotFound, "gone").with_status(404)));
        assert!(!is_retryable(&DomainError::new(ErrorCode::InvalidResponse, "bad body")));
    }

    #[test]
    fn normalized_falls_back_to_default_status() {
        let normalized = to_normalized(&DomainError::new(ErrorCode::Network, "refused"));
        assert_eq!(normalized.status_code, 503);
        assert_eq!(normalized.severity, ErrorSeverity::Medium);
        assert!(normalized.is_retryable);
    }

    #[test]
    fn normalized_serializes_camel_case() {
        let error = DomainError::new(ErrorCode::RateLimit, "slow down")
            .with_status(429)
            .with_retry_after_ms(2_000)
            .for_resource("track", Some("abc"));

        let json = serde_json::to_value(to_normalized(&error)).unwrap();

        assert_eq!(json["code"], "RATE_LIMIT");
        assert_eq!(json["statusCode"], 429);
        assert_eq!(json["isRetryable"], true);
        assert_eq!(json["retryAfterMs"], 2_000);
        assert_eq!(json["severity"], "medium");
        assert_eq!(json["context"]["resourceType"], "track");
        assert!(json.get("timestamp").is_some());
    }

    #[test]
    fn normalized_timestamp_is_fresh() {
        let error = DomainError::new(ErrorCode::NotFound, "gone").with_status(404);
        let first = to_normalized(&error);
        let second = to_normalized(&error);
        assert!(second.timestamp >= first.timestamp);
        assert!(first.timestamp >= error.context.timestamp);
    }
}
