//! Integration tests for header redaction
//!
//! Log lines built from request headers must never carry credentials.

use mixtape_common::privacy::{is_sensitive_header, redact_headers, REDACTED};

/// Validates a realistic outbound header set.
///
/// # Test Steps
/// 1. Build the headers an authenticated catalog call sends
/// 2. Redact them
/// 3. Confirm no secret survives and ordinary headers are untouched
#[test]
fn authenticated_request_headers_are_log_safe() {
    let headers = [
        ("Authorization", "Bearer BQDk3x-secret"),
        ("Cookie", "sp_dc=secret-cookie"),
        ("X-Api-Key", "partner-secret"),
        ("Accept", "application/json"),
        ("User-Agent", "mixtape/0.1"),
    ];

    let redacted = redact_headers(headers);
    let rendered = format!("{redacted:?}");

    for secret in ["BQDk3x-secret", "secret-cookie", "partner-secret"] {
        assert!(!rendered.contains(secret), "{secret} leaked: {rendered}");
    }
    assert!(redacted.contains(&("Accept".to_string(), "application/json".to_string())));
    assert_eq!(redacted.iter().filter(|(_, value)| value == REDACTED).count(), 3);
}

#[test]
fn response_cookies_are_sensitive() {
    assert!(is_sensitive_header("Set-Cookie"));
    assert!(is_sensitive_header("proxy-authorization"));
    assert!(!is_sensitive_header("content-length"));
}
