//! Traits for token endpoint operations
//!
//! The token manager only talks to the endpoint through [`TokenExchange`],
//! so tests can swap in a mock and count calls.

use async_trait::async_trait;
use mixtape_domain::DomainError;

use super::types::{TokenRequest, TokenResponse};

/// Trait for OAuth token endpoint operations
#[async_trait]
pub trait TokenExchange: Send + Sync {
    /// Exchange a grant for a fresh token.
    ///
    /// # Errors
    /// Returns an `AUTHENTICATION` [`DomainError`] if the endpoint is
    /// unreachable, rejects the grant or answers with an unreadable body.
    async fn exchange(&self, request: &TokenRequest) -> Result<TokenResponse, DomainError>;
}
