//! Mock implementations of common traits
//!
//! Provides mock objects for testing purposes.

// Allow missing error docs for test mocks - they are designed to be simple
// and errors are clearly indicated by their return types
#![allow(clippy::missing_errors_doc)]

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use mixtape_domain::{DomainError, ErrorCode};
use parking_lot::Mutex;

use crate::auth::{TokenExchange, TokenRequest, TokenResponse};

type Outcome = Result<TokenResponse, DomainError>;

/// Mock token endpoint for testing
///
/// Queued outcomes are returned in order. Once the queue is empty every call
/// succeeds with a one-hour token named after the call number.
///
/// # Examples
///
/// ```
/// use mixtape_common::auth::{TokenExchange, TokenRequest, TokenResponse};
/// use mixtape_common::testing::MockTokenExchange;
///
/// # tokio_test::block_on(async {
/// let exchange = MockTokenExchange::new();
/// exchange.push_response(TokenResponse::bearer("abc", 3600));
///
/// let response = exchange.exchange(&TokenRequest::ClientCredentials).await.unwrap();
/// assert_eq!(response.access_token, "abc");
/// assert_eq!(exchange.call_count(), 1);
/// # });
/// ```
#[derive(Debug, Clone, Default)]
pub struct MockTokenExchange {
    outcomes: Arc<Mutex<VecDeque<Outcome>>>,
    requests: Arc<Mutex<Vec<TokenRequest>>>,
    calls: Arc<AtomicUsize>,
    delay: Option<Duration>,
}

impl MockTokenExchange {
    /// Create a new mock token exchange
    pub fn new() -> Self {
        Self::default()
    }

    /// Wait this long inside every exchange, to widen race windows.
    #[must_use]
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Queue a successful response
    pub fn push_response(&self, response: TokenResponse) {
        self.outcomes.lock().push_back(Ok(response));
    }

    /// Queue a failure
    pub fn push_error(&self, error: DomainError) {
        self.outcomes.lock().push_back(Err(error));
    }

    /// Queue a rejection as the real endpoint would report it
    pub fn push_rejection(&self, message: &str) {
        self.push_error(DomainError::new(ErrorCode::Authentication, message).with_status(400));
    }

    /// Number of exchanges performed so far
    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Grants received, in call order
    pub fn requests(&self) -> Vec<TokenRequest> {
        self.requests.lock().clone()
    }
}

#[async_trait]
impl TokenExchange for MockTokenExchange {
    async fn exchange(&self, request: &TokenRequest) -> Result<TokenResponse, DomainError> {
        let call = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
        self.requests.lock().push(request.clone());

        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }

        let queued = self.outcomes.lock().pop_front();
        queued.unwrap_or_else(|| Ok(TokenResponse::bearer(format!("mock-token-{call}"), 3_600)))
    }
}
