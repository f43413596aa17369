//! Shared building blocks for the Mixtape client crates.
//!
//! # Feature Tiers
//!
//! Enable cargo features to opt into the tiers you need:
//! - `foundation`: error taxonomy, validation, header redaction
//! - `runtime`: async infrastructure (retry policy, token management)
//! - `observability`: tracing (pulled in by `runtime`)
//! - `test-utils`: mocks and fixtures for downstream tests

#![forbid(unsafe_code)]
#![warn(rust_2018_idioms)]
#![warn(clippy::all, clippy::perf, clippy::complexity, clippy::suspicious)]

// Foundation tier
// -----------------------------------------------------------------
#[cfg(feature = "foundation")]
pub mod error;
#[cfg(feature = "foundation")]
pub mod privacy;
#[cfg(feature = "foundation")]
pub mod validation;

// Runtime tier
// --------------------------------------------------------------------
#[cfg(feature = "runtime")]
pub mod auth;
#[cfg(feature = "runtime")]
pub mod resilience;

// Testing utilities
// ---------------------------------------------------------------
#[cfg(any(feature = "runtime", feature = "test-utils"))]
pub mod testing;

// Re-export commonly used types and traits for convenience
// ------------------------
#[cfg(feature = "runtime")]
pub use auth::{Token, TokenEndpointClient, TokenExchange, TokenManager, TokenRequest, TokenResponse};
#[cfg(feature = "foundation")]
pub use error::{
    classify, is_retryable, is_token_expired, lookup_metadata, to_normalized, ErrorClassification,
    ErrorTypeMetadata, Failure, HttpFailure, NormalizedError, TransportFailure,
    TransportFailureKind,
};
#[cfg(feature = "foundation")]
pub use privacy::{is_sensitive_header, redact_headers};
#[cfg(feature = "runtime")]
pub use resilience::{
    Jitter, RetryConfig, RetryConfigBuilder, RetryDecision, RetryError, RetryPolicy,
    TransientFailurePolicy,
};
#[cfg(feature = "foundation")]
pub use validation::{
    is_valid_catalog_id, require_catalog_id, require_market, validate_market_code,
    validate_required_fields,
};
