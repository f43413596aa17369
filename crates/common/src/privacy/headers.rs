//! Header redaction
//!
//! Header names are compared case-insensitively. Exact matches cover the
//! standard credential headers; any name containing `api-key` or `apikey`
//! is treated as a vendor key header.

use std::borrow::Cow;

/// Replacement for every sensitive header value.
pub const REDACTED: &str = "[REDACTED]";

const SENSITIVE_HEADERS: &[&str] = &["authorization", "proxy-authorization", "cookie", "set-cookie"];

const SENSITIVE_FRAGMENTS: &[&str] = &["api-key", "apikey"];

/// Whether values of header `name` must never be logged.
#[must_use]
pub fn is_sensitive_header(name: &str) -> bool {
    let name = name.trim().to_ascii_lowercase();
    SENSITIVE_HEADERS.contains(&name.as_str())
        || SENSITIVE_FRAGMENTS.iter().any(|fragment| name.contains(fragment))
}

/// `value`, or [`REDACTED`] if `name` is sensitive.
#[must_use]
pub fn redact_header_value<'a>(name: &str, value: &'a str) -> Cow<'a, str> {
    if is_sensitive_header(name) {
        Cow::Borrowed(REDACTED)
    } else {
        Cow::Borrowed(value)
    }
}

/// Owned, log-safe copy of a header list.
pub fn redact_headers<'a, I>(headers: I) -> Vec<(String, String)>
where
    I: IntoIterator<Item = (&'a str, &'a str)>,
{
    headers
        .into_iter()
        .map(|(name, value)| (name.to_string(), redact_header_value(name, value).into_owned()))
        .collect()
}
