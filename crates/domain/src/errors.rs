//! Error types used throughout the client
//!
//! Every failure that reaches a caller is a [`DomainError`]: one struct with
//! a closed [`ErrorCode`] callers can match on, a human-readable message and
//! an [`ErrorContext`] for diagnostics. Construction problems (missing
//! credentials, malformed configuration) are a separate [`ConfigError`] and
//! never surface as a `DomainError`.

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::impl_domain_status_conversions;

/* -------------------------------------------------------------------------- */
/* Error codes */
/* -------------------------------------------------------------------------- */

/// Stable, closed set of failure kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    /// The request never reached a server (connect refused, DNS, timeout)
    Network,
    /// Upstream answered 429
    RateLimit,
    /// Upstream rejected the request parameters
    Validation,
    /// Credentials or bearer token rejected
    Authentication,
    /// Bearer token expired upstream
    TokenExpired,
    /// Resource does not exist
    NotFound,
    /// Malformed catalog id
    InvalidId,
    /// Unrecognized market code
    InvalidMarket,
    /// Upstream response violated the expected contract
    InvalidResponse,
    /// Upstream 5xx
    ServerError,
    /// Anything else
    Unknown,
}

impl ErrorCode {
    /// Every code, in declaration order.
    pub const ALL: [ErrorCode; 11] = [
        ErrorCode::Network,
        ErrorCode::RateLimit,
        ErrorCode::Validation,
        ErrorCode::Authentication,
        ErrorCode::TokenExpired,
        ErrorCode::NotFound,
        ErrorCode::InvalidId,
        ErrorCode::InvalidMarket,
        ErrorCode::InvalidResponse,
        ErrorCode::ServerError,
        ErrorCode::Unknown,
    ];

    /// Wire name of the code (`RATE_LIMIT`, `NOT_FOUND`, ...).
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Network => "NETWORK",
            Self::RateLimit => "RATE_LIMIT",
            Self::Validation => "VALIDATION",
            Self::Authentication => "AUTHENTICATION",
            Self::TokenExpired => "TOKEN_EXPIRED",
            Self::NotFound => "NOT_FOUND",
            Self::InvalidId => "INVALID_ID",
            Self::InvalidMarket => "INVALID_MARKET",
            Self::InvalidResponse => "INVALID_RESPONSE",
            Self::ServerError => "SERVER_ERROR",
            Self::Unknown => "UNKNOWN",
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ErrorCode {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let wanted = s.to_ascii_uppercase();
        Self::ALL
            .into_iter()
            .find(|code| code.as_str() == wanted)
            .ok_or_else(|| format!("Invalid ErrorCode: {s}"))
    }
}

/// Severity levels attached to each error code
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ErrorSeverity {
    Low,
    Medium,
    High,
}

impl_domain_status_conversions!(ErrorSeverity {
    Low => "low",
    Medium => "medium",
    High => "high",
});

/* -------------------------------------------------------------------------- */
/* Error context */
/* -------------------------------------------------------------------------- */

/// The outbound request a failure concerned.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RequestInfo {
    pub method: String,
    pub path: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    /// Zero-based attempt that produced the failure
    pub attempt: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<u16>,
}

impl RequestInfo {
    pub fn new(method: impl Into<String>, path: impl Into<String>) -> Self {
        Self { method: method.into(), path: path.into(), url: None, attempt: 0, status: None }
    }

    #[must_use]
    pub fn with_url(mut self, url: impl Into<String>) -> Self {
        self.url = Some(url.into());
        self
    }

    #[must_use]
    pub fn with_attempt(mut self, attempt: u32) -> Self {
        self.attempt = attempt;
        self
    }

    #[must_use]
    pub fn with_status(mut self, status: u16) -> Self {
        self.status = Some(status);
        self
    }
}

/// Diagnostic context carried by a [`DomainError`].
///
/// Contexts are merged, never mutated in place: [`ErrorContext::merge`]
/// keeps every field already set on `self` and only fills the gaps from the
/// other context.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorContext {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub resource_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub resource_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub request_info: Option<RequestInfo>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub validation_details: Option<serde_json::Value>,
    pub timestamp: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub correlation_id: Option<String>,
}

impl Default for ErrorContext {
    fn default() -> Self {
        Self::new()
    }
}

impl ErrorContext {
    /// Empty context stamped with the current time.
    #[must_use]
    pub fn new() -> Self {
        Self {
            resource_type: None,
            resource_id: None,
            request_info: None,
            validation_details: None,
            timestamp: Utc::now(),
            correlation_id: None,
        }
    }

    /// Context naming the logical resource a call concerned.
    pub fn for_resource(resource_type: impl Into<String>, resource_id: Option<String>) -> Self {
        Self { resource_type: Some(resource_type.into()), resource_id, ..Self::new() }
    }

    #[must_use]
    pub fn with_request(mut self, request_info: RequestInfo) -> Self {
        self.request_info = Some(request_info);
        self
    }

    #[must_use]
    pub fn with_validation_details(mut self, details: serde_json::Value) -> Self {
        self.validation_details = Some(details);
        self
    }

    #[must_use]
    pub fn with_correlation_id(mut self, correlation_id: impl Into<String>) -> Self {
        self.correlation_id = Some(correlation_id.into());
        self
    }

    /// Fill unset fields from `other`; fields already set on `self` win.
    #[must_use]
    pub fn merge(self, other: ErrorContext) -> Self {
        Self {
            resource_type: self.resource_type.or(other.resource_type),
            resource_id: self.resource_id.or(other.resource_id),
            request_info: self.request_info.or(other.request_info),
            validation_details: self.validation_details.or(other.validation_details),
            timestamp: self.timestamp,
            correlation_id: self.correlation_id.or(other.correlation_id),
        }
    }
}

/* -------------------------------------------------------------------------- */
/* Domain error */
/* -------------------------------------------------------------------------- */

/// Underlying failure kept for diagnostics.
pub type ErrorCause = Arc<dyn std::error::Error + Send + Sync + 'static>;

/// Normalized failure returned by every fallible client operation.
///
/// Cheap to clone so one refresh failure can be handed to every caller that
/// was waiting on it.
#[derive(Debug, Clone)]
pub struct DomainError {
    pub message: String,
    pub status_code: Option<u16>,
    pub code: ErrorCode,
    pub context: ErrorContext,
    /// Only set for `RATE_LIMIT`
    pub retry_after_ms: Option<u64>,
    cause: Option<ErrorCause>,
}

impl DomainError {
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            status_code: None,
            code,
            context: ErrorContext::new(),
            retry_after_ms: None,
            cause: None,
        }
    }

    #[must_use]
    pub fn with_status(mut self, status_code: u16) -> Self {
        self.status_code = Some(status_code);
        self
    }

    #[must_use]
    pub fn with_retry_after_ms(mut self, retry_after_ms: u64) -> Self {
        self.retry_after_ms = Some(retry_after_ms);
        self
    }

    #[must_use]
    pub fn with_cause<E>(mut self, cause: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        self.cause = Some(Arc::new(cause));
        self
    }

    #[must_use]
    pub fn with_shared_cause(mut self, cause: ErrorCause) -> Self {
        self.cause = Some(cause);
        self
    }

    /// Merge `context` into this error's context without overwriting fields
    /// that are already set.
    #[must_use]
    pub fn with_context(mut self, context: ErrorContext) -> Self {
        self.context = self.context.merge(context);
        self
    }

    /// Attach the resource a failing call concerned.
    #[must_use]
    pub fn for_resource(self, resource_type: &str, resource_id: Option<&str>) -> Self {
        self.with_context(ErrorContext::for_resource(
            resource_type,
            resource_id.map(str::to_string),
        ))
    }

    #[must_use]
    pub fn cause(&self) -> Option<&ErrorCause> {
        self.cause.as_ref()
    }

    #[must_use]
    pub fn is(&self, code: ErrorCode) -> bool {
        self.code == code
    }

    /// Key/value pairs suitable for structured logging.
    pub fn tracing_fields(&self) -> Vec<(&'static str, String)> {
        let mut fields = vec![("code", self.code.to_string()), ("message", self.message.clone())];
        if let Some(status) = self.status_code {
            fields.push(("status_code", status.to_string()));
        }
        if let Some(retry) = self.retry_after_ms {
            fields.push(("retry_after_ms", retry.to_string()));
        }
        if let Some(resource_type) = &self.context.resource_type {
            fields.push(("resource_type", resource_type.clone()));
        }
        if let Some(resource_id) = &self.context.resource_id {
            fields.push(("resource_id", resource_id.clone()));
        }
        if let Some(request) = &self.context.request_info {
            fields.push(("method", request.method.clone()));
            fields.push(("path", request.path.clone()));
            fields.push(("attempt", request.attempt.to_string()));
        }
        if let Some(correlation_id) = &self.context.correlation_id {
            fields.push(("correlation_id", correlation_id.clone()));
        }
        fields
    }
}

impl fmt::Display for DomainError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.status_code {
            Some(status) => write!(f, "[{}:{}] {}", self.code, status, self.message),
            None => write!(f, "[{}] {}", self.code, self.message),
        }
    }
}

impl std::error::Error for DomainError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.cause.as_deref().map(|cause| cause as &(dyn std::error::Error + 'static))
    }
}

/// Result type alias for client operations
pub type Result<T> = std::result::Result<T, DomainError>;

/* -------------------------------------------------------------------------- */
/* Configuration errors */
/* -------------------------------------------------------------------------- */

/// Irrecoverable construction-time failures.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing required configuration field '{0}'")]
    MissingField(&'static str),

    #[error("Invalid configuration for '{field}': {message}")]
    Invalid { field: &'static str, message: String },

    #[error("Failed to load configuration: {0}")]
    Load(String),
}
