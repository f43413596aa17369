//! Failure classification
//!
//! Turns whatever went wrong during a call into a [`DomainError`]. The
//! priority order is fixed:
//!
//! 1. An existing [`DomainError`] passes through, gaining only missing
//!    context fields.
//! 2. An HTTP response is classified by status, with the upstream message
//!    consulted for the few codes the status alone cannot distinguish.
//! 3. A request that never reached a server becomes `NETWORK`.
//! 4. Anything else becomes `UNKNOWN` with the original failure as cause.
//!
//! Message-text matching only happens here. Callers always branch on
//! [`ErrorCode`], never on the message.

use std::fmt;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use mixtape_domain::{DomainError, ErrorCause, ErrorCode, ErrorContext};
use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;

use super::registry::lookup_metadata;

// Upstream 400/401 bodies only carry free text; these are the phrasings the
// catalog API and its OAuth endpoint use.
static TOKEN_EXPIRED_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\btoken\b.*\bexpired\b")
        .expect("TOKEN_EXPIRED_REGEX should compile - this is a bug")
});

static MARKET_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\b(market|country)\b")
        .expect("MARKET_REGEX should compile - this is a bug")
});

static INVALID_ID_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)(\binvalid\b.*\bid\b|\bbase62\b)")
        .expect("INVALID_ID_REGEX should compile - this is a bug")
});

/// Upstream text kept in messages is cut to this many characters.
const MAX_BODY_MESSAGE_CHARS: usize = 512;

/* -------------------------------------------------------------------------- */
/* Raw failures */
/* -------------------------------------------------------------------------- */

/// A non-2xx response as received.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpFailure {
    pub status: u16,
    /// Raw `retry-after` header value
    pub retry_after: Option<String>,
    pub body: String,
}

impl HttpFailure {
    pub fn new(status: u16, body: impl Into<String>) -> Self {
        Self { status, retry_after: None, body: body.into() }
    }

    #[must_use]
    pub fn with_retry_after(mut self, value: impl Into<String>) -> Self {
        self.retry_after = Some(value.into());
        self
    }
}

/// Why a request never produced a response.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransportFailureKind {
    Connect,
    Dns,
    Timeout,
    /// Request could not be written (broken pipe, TLS handshake, ...)
    Request,
}

impl fmt::Display for TransportFailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Connect => write!(f, "connection failed"),
            Self::Dns => write!(f, "DNS resolution failed"),
            Self::Timeout => write!(f, "request timed out"),
            Self::Request => write!(f, "request could not be sent"),
        }
    }
}

/// A request that did not reach a server.
#[derive(Debug, Clone)]
pub struct TransportFailure {
    pub kind: TransportFailureKind,
    pub message: String,
    pub cause: Option<ErrorCause>,
}

impl TransportFailure {
    pub fn new(kind: TransportFailureKind, message: impl Into<String>) -> Self {
        Self { kind, message: message.into(), cause: None }
    }

    #[must_use]
    pub fn with_cause<E>(mut self, cause: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        self.cause = Some(Arc::new(cause));
        self
    }
}

/// Everything [`classify`] accepts.
#[derive(Debug, Clone)]
pub enum Failure {
    Domain(DomainError),
    Http(HttpFailure),
    Transport(TransportFailure),
    Other { message: String, cause: Option<ErrorCause> },
}

impl Failure {
    /// Failure with no better description than its message.
    pub fn other(message: impl Into<String>) -> Self {
        Self::Other { message: message.into(), cause: None }
    }

    /// Wrap an arbitrary error, keeping it as the cause.
    pub fn from_error<E>(error: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        Self::Other { message: error.to_string(), cause: Some(Arc::new(error)) }
    }

    /// Whether a server produced a response for this failure.
    #[must_use]
    pub fn has_response(&self) -> bool {
        match self {
            Self::Http(_) => true,
            Self::Domain(error) => error.status_code.is_some(),
            Self::Transport(_) | Self::Other { .. } => false,
        }
    }
}

impl From<DomainError> for Failure {
    fn from(error: DomainError) -> Self {
        Self::Domain(error)
    }
}

impl From<HttpFailure> for Failure {
    fn from(failure: HttpFailure) -> Self {
        Self::Http(failure)
    }
}

impl From<TransportFailure> for Failure {
    fn from(failure: TransportFailure) -> Self {
        Self::Transport(failure)
    }
}

/* -------------------------------------------------------------------------- */
/* Classification */
/* -------------------------------------------------------------------------- */

/// Classify `failure` and merge `context` into the result.
///
/// Fields already present on a passed-through [`DomainError`] are never
/// overwritten by `context`.
pub fn classify(failure: impl Into<Failure>, context: Option<ErrorContext>) -> DomainError {
    let error = match failure.into() {
        Failure::Domain(error) => error,
        Failure::Http(response) => classify_http(&response),
        Failure::Transport(transport) => classify_transport(transport),
        Failure::Other { message, cause } => {
            let message = if message.trim().is_empty() {
                lookup_metadata(ErrorCode::Unknown).default_message.to_string()
            } else {
                message
            };
            let error = DomainError::new(ErrorCode::Unknown, message);
            match cause {
                Some(cause) => error.with_shared_cause(cause),
                None => error,
            }
        }
    };

    match context {
        Some(context) => error.with_context(context),
        None => error,
    }
}

/// Whether `error` is an upstream 401 rejecting an expired access token.
///
/// Such errors stay `AUTHENTICATION`; this only tells the caller that
/// dropping the cached token and fetching a new one would help.
#[must_use]
pub fn is_token_expired(error: &DomainError) -> bool {
    error.is(ErrorCode::Authentication)
        && error.status_code == Some(401)
        && TOKEN_EXPIRED_REGEX.is_match(&error.message)
}

fn classify_http(response: &HttpFailure) -> DomainError {
    let upstream = extract_upstream_message(&response.body);
    let text = upstream.as_deref().unwrap_or_default();

    let code = match response.status {
        429 => ErrorCode::RateLimit,
        401 => ErrorCode::Authentication,
        404 => ErrorCode::NotFound,
        400 if MARKET_REGEX.is_match(text) => ErrorCode::InvalidMarket,
        400 if INVALID_ID_REGEX.is_match(text) => ErrorCode::InvalidId,
        400 => ErrorCode::Validation,
        status if status >= 500 => ErrorCode::ServerError,
        _ => ErrorCode::Unknown,
    };

    let message = upstream.unwrap_or_else(|| lookup_metadata(code).default_message.to_string());
    let error = DomainError::new(code, message).with_status(response.status);

    if code == ErrorCode::RateLimit {
        error.with_retry_after_ms(parse_retry_after_ms(response.retry_after.as_deref()))
    } else {
        error
    }
}

fn classify_transport(transport: TransportFailure) -> DomainError {
    let message = if transport.message.trim().is_empty() {
        format!("{}: {}", lookup_metadata(ErrorCode::Network).default_message, transport.kind)
    } else {
        transport.message
    };
    let error = DomainError::new(ErrorCode::Network, message);
    match transport.cause {
        Some(cause) => error.with_shared_cause(cause),
        None => error,
    }
}

/// Milliseconds to wait according to a `retry-after` header.
///
/// Accepts delta-seconds (fractional values allowed) and HTTP dates. Absent,
/// negative or unparseable values yield 0.
#[must_use]
pub fn parse_retry_after_ms(value: Option<&str>) -> u64 {
    let Some(value) = value.map(str::trim).filter(|v| !v.is_empty()) else {
        return 0;
    };

    if let Ok(seconds) = value.parse::<f64>() {
        return seconds_to_millis(seconds);
    }

    DateTime::parse_from_rfc2822(value)
        .map(|date| {
            let delta = date.with_timezone(&Utc) - Utc::now();
            u64::try_from(delta.num_milliseconds()).unwrap_or(0)
        })
        .unwrap_or(0)
}

#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn seconds_to_millis(seconds: f64) -> u64 {
    if !seconds.is_finite() || seconds <= 0.0 {
        return 0;
    }
    (seconds * 1000.0).round() as u64
}

/// Human-readable message from an upstream error body.
///
/// Understands the catalog envelope `{"error": {"status", "message"}}`, the
/// OAuth envelope `{"error", "error_description"}` and a bare
/// `{"message"}`. Anything else falls back to the trimmed raw body.
#[must_use]
pub fn extract_upstream_message(body: &str) -> Option<String> {
    let trimmed = body.trim();
    if trimmed.is_empty() {
        return None;
    }

    if let Ok(json) = serde_json::from_str::<Value>(trimmed) {
        if let Some(message) = message_from_json(&json) {
            return Some(message);
        }
    }

    Some(truncate(trimmed))
}

fn message_from_json(json: &Value) -> Option<String> {
    match json.get("error") {
        Some(Value::Object(inner)) => non_empty_str(inner.get("message")),
        Some(error @ Value::String(_)) => {
            non_empty_str(json.get("error_description")).or_else(|| non_empty_str(Some(error)))
        }
        _ => non_empty_str(json.get("message")),
    }
}

fn non_empty_str(value: Option<&Value>) -> Option<String> {
    value.and_then(Value::as_str).map(str::trim).filter(|s| !s.is_empty()).map(str::to_string)
}

fn truncate(text: &str) -> String {
    match text.char_indices().nth(MAX_BODY_MESSAGE_CHARS) {
        Some((end, _)) => format!("{}...", &text[..end]),
        None => text.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use mixtape_domain::RequestInfo;

    use super::*;

    fn http(status: u16, body: &str) -> HttpFailure {
        HttpFailure::new(status, body)
    }

    fn catalog_body(status: u16, message: &str) -> String {
        serde_json::json!({ "error": { "status": status, "message": message } }).to_string()
    }

    #[test]
    fn rate_limit_converts_retry_after_to_millis() {
        let error = classify(http(429, "").with_retry_after("3"), None);
        assert_eq!(error.code, ErrorCode::RateLimit);
        assert_eq!(error.status_code, Some(429));
        assert_eq!(error.retry_after_ms, Some(3_000));
    }

    #[test]
    fn rate_limit_without_header_defaults_to_zero() {
        let error = classify(http(429, ""), None);
        assert_eq!(error.retry_after_ms, Some(0));
        assert_eq!(error.message, "Rate limit exceeded");
    }

    #[test]
    fn retry_after_clamps_and_tolerates_garbage() {
        assert_eq!(parse_retry_after_ms(Some("-5")), 0);
        assert_eq!(parse_retry_after_ms(Some("soon")), 0);
        assert_eq!(parse_retry_after_ms(Some("1.5")), 1_500);
        assert_eq!(parse_retry_after_ms(Some(" 2 ")), 2_000);
        assert_eq!(parse_retry_after_ms(None), 0);
        assert_eq!(parse_retry_after_ms(Some("Wed, 21 Oct 2015 07:28:00 GMT")), 0);
    }

    #[test]
    fn unauthorized_is_always_authentication() {
        let expired = classify(http(401, &catalog_body(401, "The access token expired")), None);
        assert_eq!(expired.code, ErrorCode::Authentication);
        assert!(is_token_expired(&expired));

        let invalid = classify(http(401, &catalog_body(401, "Invalid access token")), None);
        assert_eq!(invalid.code, ErrorCode::Authentication);
        assert_eq!(invalid.message, "Invalid access token");
        assert!(!is_token_expired(&invalid));
    }

    #[test]
    fn token_expiry_needs_an_upstream_401() {
        let refresh_failure =
            DomainError::new(ErrorCode::Authentication, "Refresh token expired").with_status(400);
        assert!(!is_token_expired(&refresh_failure));

        let server = classify(http(500, &catalog_body(500, "token expired")), None);
        assert!(!is_token_expired(&server));
    }

    #[test]
    fn bad_request_sniffs_market_and_id() {
        let market = classify(http(400, &catalog_body(400, "Invalid market code")), None);
        assert_eq!(market.code, ErrorCode::InvalidMarket);

        let id = classify(http(400, &catalog_body(400, "invalid id")), None);
        assert_eq!(id.code, ErrorCode::InvalidId);

        let base62 = classify(http(400, &catalog_body(400, "Invalid base62 id")), None);
        assert_eq!(base62.code, ErrorCode::InvalidId);

        let other = classify(http(400, &catalog_body(400, "limit must be <= 50")), None);
        assert_eq!(other.code, ErrorCode::Validation);
        assert_eq!(other.status_code, Some(400));
    }

    #[test]
    fn status_mapping_covers_remaining_ranges() {
        assert_eq!(classify(http(404, ""), None).code, ErrorCode::NotFound);
        assert_eq!(classify(http(500, ""), None).code, ErrorCode::ServerError);
        assert_eq!(classify(http(503, "upstream"), None).code, ErrorCode::ServerError);
        assert_eq!(classify(http(403, ""), None).code, ErrorCode::Unknown);
        assert_eq!(classify(http(418, ""), None).status_code, Some(418));
    }

    #[test]
    fn transport_failures_are_network() {
        let error = classify(
            TransportFailure::new(TransportFailureKind::Connect, "connection refused"),
            None,
        );
        assert_eq!(error.code, ErrorCode::Network);
        assert_eq!(error.status_code, None);
        assert_eq!(error.message, "connection refused");

        let timeout = classify(TransportFailure::new(TransportFailureKind::Timeout, ""), None);
        assert_eq!(timeout.message, "Network request failed: request timed out");
    }

    #[test]
    fn other_failures_keep_message_and_cause() {
        let io = std::io::Error::new(std::io::ErrorKind::Other, "disk on fire");
        let error = classify(Failure::from_error(io), None);
        assert_eq!(error.code, ErrorCode::Unknown);
        assert_eq!(error.message, "disk on fire");
        assert!(error.cause().is_some());
    }

    #[test]
    fn domain_errors_pass_through_without_overwrite() {
        let original = DomainError::new(ErrorCode::InvalidMarket, "bad market")
            .with_status(400)
            .for_resource("track", Some("abc"));
        let context = ErrorContext::for_resource("album", Some("xyz".into()))
            .with_request(RequestInfo::new("GET", "/tracks/abc"));

        let error = classify(original, Some(context));

        assert_eq!(error.code, ErrorCode::InvalidMarket);
        assert_eq!(error.context.resource_type.as_deref(), Some("track"));
        assert_eq!(error.context.resource_id.as_deref(), Some("abc"));
        assert_eq!(error.context.request_info.map(|r| r.path).as_deref(), Some("/tracks/abc"));
    }

    #[test]
    fn extracts_oauth_and_plain_messages() {
        let oauth = r#"{"error":"invalid_client","error_description":"Invalid client secret"}"#;
        assert_eq!(extract_upstream_message(oauth).as_deref(), Some("Invalid client secret"));

        let bare = r#"{"error":"invalid_grant"}"#;
        assert_eq!(extract_upstream_message(bare).as_deref(), Some("invalid_grant"));

        assert_eq!(extract_upstream_message("Bad Gateway").as_deref(), Some("Bad Gateway"));
        assert_eq!(extract_upstream_message("   "), None);

        let long = "x".repeat(MAX_BODY_MESSAGE_CHARS + 10);
        let message = extract_upstream_message(&long).unwrap_or_default();
        assert!(message.ends_with("..."));
        assert_eq!(message.len(), MAX_BODY_MESSAGE_CHARS + 3);
    }
}
