//! Token manager with single-flight refresh
//!
//! Manages the access token lifecycle:
//! - Lazy acquisition on first use
//! - Refresh once the cached token is inside its safety margin
//! - At most one refresh in flight; concurrent callers share its outcome
//! - A failed refresh leaves the cached token untouched

use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Duration;

use futures::future::{BoxFuture, FutureExt, Shared};
use mixtape_domain::{ConfigError, Credentials, DomainError, ErrorCode};
use parking_lot::{Mutex, RwLock};
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION};
use tracing::{debug, info, instrument, warn};

use super::client::TokenEndpointClient;
use super::traits::TokenExchange;
use super::types::{Token, TokenRequest};

type RefreshFuture = Shared<BoxFuture<'static, Result<Token, DomainError>>>;

/// Token manager shared by every component that needs a bearer token
///
/// Cheap to clone; clones share the cache and the in-flight refresh.
#[derive(Clone)]
pub struct TokenManager {
    inner: Arc<Inner>,
}

struct Inner {
    exchange: Arc<dyn TokenExchange>,
    current: RwLock<Option<Token>>,
    in_flight: Mutex<Option<RefreshFuture>>,
}

enum Lookup {
    Cached(Token),
    Pending(RefreshFuture),
}

impl TokenManager {
    /// Create a token manager on top of any token exchange
    pub fn new(exchange: impl TokenExchange + 'static) -> Self {
        Self::from_shared(Arc::new(exchange))
    }

    pub fn from_shared(exchange: Arc<dyn TokenExchange>) -> Self {
        Self {
            inner: Arc::new(Inner {
                exchange,
                current: RwLock::new(None),
                in_flight: Mutex::new(None),
            }),
        }
    }

    /// Token manager talking to the real token endpoint.
    ///
    /// # Errors
    /// Returns [`ConfigError`] if the credentials are incomplete.
    pub fn from_credentials(credentials: Credentials, timeout: Duration) -> Result<Self, ConfigError> {
        Ok(Self::new(TokenEndpointClient::with_timeout(credentials, timeout)?))
    }

    /// Seed a token obtained elsewhere (for example a user session).
    pub fn store_token(&self, token: Token) {
        debug!(expires_in = token.seconds_until_expiry(), "Storing externally issued token");
        *self.inner.current.write() = Some(token);
    }

    /// Cached token, without refreshing.
    #[must_use]
    pub fn current_token(&self) -> Option<Token> {
        self.inner.current.read().clone()
    }

    /// Drop the cached token; the next call starts from client credentials.
    pub fn clear(&self) {
        *self.inner.current.write() = None;
    }

    /// Mark the cached token expired so the next call refreshes it. A
    /// refresh token, if any, is kept for that refresh.
    pub fn invalidate(&self) {
        if let Some(token) = self.inner.current.write().as_mut() {
            token.expire();
        }
    }

    /// Cached token if still valid, otherwise the result of a refresh.
    ///
    /// # Errors
    /// Returns an `AUTHENTICATION` [`DomainError`] if a refresh was needed
    /// and failed.
    pub async fn get_valid_token(&self) -> Result<Token, DomainError> {
        if let Some(token) = self.valid_cached() {
            return Ok(token);
        }
        match self.lookup(false) {
            Lookup::Cached(token) => Ok(token),
            Lookup::Pending(refresh) => refresh.await,
        }
    }

    /// Fetch a new token regardless of the cached one.
    ///
    /// Joins a refresh that is already running instead of starting a second
    /// one.
    ///
    /// # Errors
    /// Returns an `AUTHENTICATION` [`DomainError`]; the cached token is left
    /// as it was.
    pub async fn refresh(&self) -> Result<Token, DomainError> {
        match self.lookup(true) {
            Lookup::Cached(token) => Ok(token),
            Lookup::Pending(refresh) => refresh.await,
        }
    }

    /// `Authorization: Bearer <token>` for a valid token.
    ///
    /// # Errors
    /// See [`TokenManager::get_valid_token`].
    pub async fn auth_header(&self) -> Result<HeaderMap, DomainError> {
        let token = self.get_valid_token().await?;
        let value = HeaderValue::from_str(&token.bearer()).map_err(|e| {
            DomainError::new(
                ErrorCode::Authentication,
                "Access token contains characters not allowed in a header",
            )
            .with_cause(e)
        })?;
        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, value);
        Ok(headers)
    }

    fn valid_cached(&self) -> Option<Token> {
        self.inner.current.read().as_ref().filter(|token| !token.is_expired()).cloned()
    }

    /// Join the running refresh or start one. With `force == false` the
    /// cache is re-checked under the slot lock, so a caller that lost the
    /// race against a just-finished refresh gets its token instead of
    /// starting another.
    fn lookup(&self, force: bool) -> Lookup {
        let mut slot = self.inner.in_flight.lock();
        if let Some(refresh) = slot.as_ref() {
            debug!("Joining in-flight token refresh");
            return Lookup::Pending(refresh.clone());
        }
        if !force {
            if let Some(token) = self.valid_cached() {
                return Lookup::Cached(token);
            }
        }

        let inner = Arc::clone(&self.inner);
        let refresh = async move {
            // A panic must not leave a poisoned future in the slot.
            let result = AssertUnwindSafe(inner.run_refresh())
                .catch_unwind()
                .await
                .unwrap_or_else(|_| {
                    warn!("Token refresh panicked");
                    Err(DomainError::new(ErrorCode::Authentication, "Token refresh panicked"))
                });
            // Cache is settled before the slot opens again.
            *inner.in_flight.lock() = None;
            result
        }
        .boxed()
        .shared();
        *slot = Some(refresh.clone());
        Lookup::Pending(refresh)
    }
}

impl Inner {
    #[instrument(skip(self))]
    async fn run_refresh(&self) -> Result<Token, DomainError> {
        let previous = self.current.read().clone();
        let request = TokenRequest::for_token(previous.as_ref());

        let previous_refresh = previous.and_then(|token| token.refresh_token);
        let outcome = self
            .exchange
            .exchange(&request)
            .await
            .and_then(|response| Token::from_response(response, previous_refresh));

        match outcome {
            Ok(token) => {
                info!(
                    grant_type = request.grant_type(),
                    expires_in = token.seconds_until_expiry(),
                    "Access token refreshed"
                );
                *self.current.write() = Some(token.clone());
                Ok(token)
            }
            Err(error) => {
                warn!(
                    grant_type = request.grant_type(),
                    code = %error.code,
                    error = %error.message,
                    "Token refresh failed"
                );
                Err(as_authentication_error(error))
            }
        }
    }
}

fn as_authentication_error(error: DomainError) -> DomainError {
    if error.is(ErrorCode::Authentication) {
        return error;
    }
    let wrapped = DomainError::new(
        ErrorCode::Authentication,
        format!("Token refresh failed: {}", error.message),
    )
    .with_context(error.context.clone());
    let wrapped = match error.status_code {
        Some(status) => wrapped.with_status(status),
        None => wrapped,
    };
    wrapped.with_shared_cause(Arc::new(error))
}

impl std::fmt::Debug for TokenManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let current = self.current_token();
        let refresh_in_flight = self.inner.in_flight.lock().is_some();
        f.debug_struct("TokenManager")
            .field("current", &current)
            .field("refresh_in_flight", &refresh_in_flight)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::TokenResponse;
    use crate::testing::MockTokenExchange;

    #[tokio::test]
    async fn first_call_fetches_with_client_credentials() {
        let exchange = MockTokenExchange::new();
        exchange.push_response(TokenResponse::bearer("first", 3_600));
        let manager = TokenManager::new(exchange.clone());

        let token = manager.get_valid_token().await.unwrap();

        assert_eq!(token.access_token, "first");
        assert_eq!(exchange.call_count(), 1);
        assert_eq!(exchange.requests(), vec![TokenRequest::ClientCredentials]);
    }

    #[tokio::test]
    async fn valid_token_is_served_from_cache() {
        let exchange = MockTokenExchange::new();
        let manager = TokenManager::new(exchange.clone());
        manager.store_token(Token::new("cached", 3_600));

        assert_eq!(manager.get_valid_token().await.unwrap().access_token, "cached");
        assert_eq!(exchange.call_count(), 0);
    }

    #[tokio::test]
    async fn token_inside_margin_triggers_refresh() {
        let exchange = MockTokenExchange::new();
        exchange.push_response(TokenResponse::bearer("renewed", 3_600));
        let manager = TokenManager::new(exchange.clone());
        manager.store_token(Token::new("stale", 30));

        assert_eq!(manager.get_valid_token().await.unwrap().access_token, "renewed");
        assert_eq!(exchange.call_count(), 1);
    }

    #[tokio::test]
    async fn refresh_uses_stored_refresh_token_and_keeps_it() {
        let exchange = MockTokenExchange::new();
        exchange.push_response(TokenResponse::bearer("renewed", 3_600));
        let manager = TokenManager::new(exchange.clone());
        manager.store_token(Token::new("session", 3_600).with_refresh_token("r-1"));

        let token = manager.refresh().await.unwrap();

        assert_eq!(exchange.requests(), vec![TokenRequest::RefreshToken("r-1".into())]);
        assert_eq!(token.refresh_token.as_deref(), Some("r-1"));
    }

    #[tokio::test]
    async fn failed_refresh_leaves_cache_untouched() {
        let exchange = MockTokenExchange::new();
        exchange.push_error(DomainError::new(ErrorCode::Network, "endpoint down"));
        let manager = TokenManager::new(exchange.clone());
        let seeded = Token::new("old", 3_600);
        manager.store_token(seeded.clone());

        let err = manager.refresh().await.unwrap_err();

        assert_eq!(err.code, ErrorCode::Authentication);
        assert!(err.message.contains("endpoint down"));
        assert_eq!(manager.current_token(), Some(seeded));
    }

    #[tokio::test]
    async fn concurrent_callers_share_one_refresh() {
        let exchange = MockTokenExchange::new().with_delay(Duration::from_millis(50));
        exchange.push_response(TokenResponse::bearer("shared", 3_600));
        let manager = TokenManager::new(exchange.clone());

        let calls = (0..10).map(|_| {
            let manager = manager.clone();
            tokio::spawn(async move { manager.get_valid_token().await })
        });
        let results = futures::future::join_all(calls).await;

        for result in results {
            assert_eq!(result.unwrap().unwrap().access_token, "shared");
        }
        assert_eq!(exchange.call_count(), 1);
    }

    #[tokio::test]
    async fn concurrent_failure_is_shared_and_slot_reopens() {
        let exchange = MockTokenExchange::new().with_delay(Duration::from_millis(20));
        exchange.push_error(DomainError::new(ErrorCode::Authentication, "bad secret"));
        exchange.push_response(TokenResponse::bearer("second", 3_600));
        let manager = TokenManager::new(exchange.clone());

        let (a, b) = tokio::join!(manager.get_valid_token(), manager.get_valid_token());
        assert_eq!(a.unwrap_err().message, "bad secret");
        assert_eq!(b.unwrap_err().message, "bad secret");
        assert_eq!(exchange.call_count(), 1);

        assert_eq!(manager.get_valid_token().await.unwrap().access_token, "second");
        assert_eq!(exchange.call_count(), 2);
    }

    #[tokio::test]
    async fn malformed_lifetime_fails_refresh_and_slot_reopens() {
        let exchange = MockTokenExchange::new();
        exchange.push_response(TokenResponse::bearer("forever", 10_i64.pow(16)));
        exchange.push_response(TokenResponse::bearer("sane", 3_600));
        let manager = TokenManager::new(exchange.clone());

        let err = manager.get_valid_token().await.unwrap_err();
        assert_eq!(err.code, ErrorCode::Authentication);
        assert!(err.message.starts_with("Malformed token response"));
        assert!(manager.current_token().is_none());

        assert_eq!(manager.get_valid_token().await.unwrap().access_token, "sane");
        assert_eq!(exchange.call_count(), 2);
    }

    #[derive(Debug)]
    struct PanickingExchange;

    #[async_trait::async_trait]
    impl TokenExchange for PanickingExchange {
        async fn exchange(&self, _request: &TokenRequest) -> Result<TokenResponse, DomainError> {
            panic!("exchange blew up");
        }
    }

    #[tokio::test]
    async fn panicking_refresh_becomes_error_and_clears_slot() {
        let manager = TokenManager::new(PanickingExchange);

        for _ in 0..2 {
            let err = manager.get_valid_token().await.unwrap_err();
            assert_eq!(err.code, ErrorCode::Authentication);
            assert_eq!(err.message, "Token refresh panicked");
        }
        assert!(!format!("{manager:?}").contains("refresh_in_flight: true"));
    }

    #[tokio::test]
    async fn debug_reports_cache_and_running_refresh() {
        let exchange = MockTokenExchange::new().with_delay(Duration::from_millis(50));
        let manager = TokenManager::new(exchange);
        manager.store_token(Token::new("stale", 10));

        let pending = tokio::spawn({
            let manager = manager.clone();
            async move { manager.get_valid_token().await }
        });
        tokio::time::sleep(Duration::from_millis(10)).await;

        let rendered = format!("{manager:?}");
        assert!(rendered.contains("refresh_in_flight: true"), "{rendered}");
        assert!(!rendered.contains("stale"));

        pending.await.unwrap().unwrap();
        assert!(format!("{manager:?}").contains("refresh_in_flight: false"));
    }

    #[tokio::test]
    async fn invalidate_and_clear() {
        let exchange = MockTokenExchange::new();
        exchange.push_response(TokenResponse::bearer("after-invalidate", 3_600));
        let manager = TokenManager::new(exchange.clone());
        manager.store_token(Token::new("t", 3_600));

        manager.invalidate();
        assert_eq!(manager.get_valid_token().await.unwrap().access_token, "after-invalidate");

        manager.clear();
        assert!(manager.current_token().is_none());
    }

    #[tokio::test]
    async fn auth_header_carries_bearer_token() {
        let exchange = MockTokenExchange::new();
        let manager = TokenManager::new(exchange);
        manager.store_token(Token::new("abc", 3_600));

        let headers = manager.auth_header().await.unwrap();
        assert_eq!(headers.get(AUTHORIZATION).unwrap(), "Bearer abc");
    }
}
