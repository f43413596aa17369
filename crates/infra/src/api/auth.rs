//! Bearer-token seam between the transport and the token manager
//!
//! The transport only needs "a valid access token right now"; everything
//! about caching and refresh stays behind [`AccessTokenProvider`].

use async_trait::async_trait;
use mixtape_common::auth::TokenManager;
use mixtape_domain::DomainError;
use tracing::debug;

/// Trait for providing access tokens
///
/// This trait allows dependency injection and testing with fixed tokens.
#[async_trait]
pub trait AccessTokenProvider: Send + Sync {
    /// Get a valid access token
    ///
    /// Implementations refresh as needed; a failure is always an
    /// `AUTHENTICATION` error.
    async fn access_token(&self) -> Result<String, DomainError>;

    /// The server rejected the token it was handed as expired. The next
    /// [`access_token`](Self::access_token) call should not return it again.
    fn invalidate(&self) {}
}

#[async_trait]
impl AccessTokenProvider for TokenManager {
    async fn access_token(&self) -> Result<String, DomainError> {
        let token = self.get_valid_token().await?;
        Ok(token.access_token)
    }

    fn invalidate(&self) {
        debug!("Upstream reported the access token as expired; invalidating cache");
        TokenManager::invalidate(self);
    }
}

/// Fixed token, for callers that manage tokens themselves.
#[derive(Clone)]
pub struct StaticTokenProvider {
    token: String,
}

impl StaticTokenProvider {
    pub fn new(token: impl Into<String>) -> Self {
        Self { token: token.into() }
    }
}

impl std::fmt::Debug for StaticTokenProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StaticTokenProvider").field("token", &"[REDACTED]").finish()
    }
}

#[async_trait]
impl AccessTokenProvider for StaticTokenProvider {
    async fn access_token(&self) -> Result<String, DomainError> {
        Ok(self.token.clone())
    }
}
