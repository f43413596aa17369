//! Privacy Module
//!
//! Keeps credentials out of logs. Everything the transport logs about
//! headers goes through [`headers`] first.

pub mod headers;

// Re-export commonly used items
pub use headers::{is_sensitive_header, redact_header_value, redact_headers, REDACTED};
