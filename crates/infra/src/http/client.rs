use std::sync::Arc;
use std::time::Duration;

use mixtape_common::error::{
    classify, is_token_expired, Failure, HttpFailure, TransportFailure, TransportFailureKind,
};
use mixtape_common::privacy::redact_headers;
use mixtape_common::resilience::{RetryConfig, RetryDecision, RetryPolicy, TransientFailurePolicy};
use mixtape_domain::{
    ClientSettings, ConfigError, DomainError, ErrorCode, ErrorContext, RequestInfo,
};
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION, RETRY_AFTER};
use reqwest::{Client as ReqwestClient, Method};
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::{debug, instrument, warn};
use url::Url;
use uuid::Uuid;

use super::options::RequestOptions;
use super::state::{CallState, CallTracker};
use crate::api::auth::AccessTokenProvider;
use crate::errors::IntoFailure;

/// A request resolved against the base URL. Every attempt of one call
/// re-sends exactly this.
#[derive(Debug, Clone)]
pub struct PreparedRequest {
    pub method: Method,
    /// Path as the caller passed it, without the query
    pub path: String,
    pub url: Url,
    pub options: RequestOptions,
    pub correlation_id: String,
}

impl PreparedRequest {
    /// Diagnostic context for a failure of `attempt`.
    pub fn context(&self, attempt: u32, status: Option<u16>) -> ErrorContext {
        let mut info = RequestInfo::new(self.method.as_str(), &self.path)
            .with_url(self.url.as_str())
            .with_attempt(attempt);
        if let Some(status) = status {
            info = info.with_status(status);
        }
        ErrorContext::new().with_request(info).with_correlation_id(&self.correlation_id)
    }
}

/// A response the caller accepts: any 2xx, or a status it declared
/// acceptable.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AcceptedResponse {
    pub status: u16,
    pub body: Vec<u8>,
}

/// Authenticated HTTP transport with bounded retry.
///
/// Each call runs the same pipeline: [`authenticate`](Self::authenticate),
/// [`send`](Self::send), and on failure
/// [`classify_failure`](Self::classify_failure) followed by
/// [`retry_decision`](Self::retry_decision). The stages are public so they
/// can be driven one at a time.
#[derive(Clone)]
pub struct HttpTransport {
    client: ReqwestClient,
    base_url: Url,
    auth: Arc<dyn AccessTokenProvider>,
    policy: TransientFailurePolicy,
    timeout: Duration,
}

impl HttpTransport {
    /// Start building a new transport.
    pub fn builder() -> HttpTransportBuilder {
        HttpTransportBuilder::default()
    }

    /// Transport configured from `settings`.
    ///
    /// # Errors
    /// Returns [`ConfigError`] if the settings are invalid.
    pub fn new(
        settings: &ClientSettings,
        auth: Arc<dyn AccessTokenProvider>,
    ) -> Result<Self, ConfigError> {
        Self::builder().settings(settings).auth(auth).build()
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    pub fn retry_config(&self) -> &RetryConfig {
        self.policy.config()
    }

    /// `Authorization: Bearer <token>` for the current token.
    ///
    /// # Errors
    /// Returns an `AUTHENTICATION` error if no token can be obtained.
    pub async fn auth_header(&self) -> Result<HeaderMap, DomainError> {
        let value = bearer_value(&self.auth.access_token().await?)?;
        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, value);
        Ok(headers)
    }

    pub async fn get<T: DeserializeOwned>(
        &self,
        path: &str,
        options: RequestOptions,
    ) -> Result<T, DomainError> {
        self.request(Method::GET, path, options).await
    }

    pub async fn post<T: DeserializeOwned>(
        &self,
        path: &str,
        options: RequestOptions,
    ) -> Result<T, DomainError> {
        self.request(Method::POST, path, options).await
    }

    pub async fn put<T: DeserializeOwned>(
        &self,
        path: &str,
        options: RequestOptions,
    ) -> Result<T, DomainError> {
        self.request(Method::PUT, path, options).await
    }

    pub async fn delete<T: DeserializeOwned>(
        &self,
        path: &str,
        options: RequestOptions,
    ) -> Result<T, DomainError> {
        self.request(Method::DELETE, path, options).await
    }

    /// Run a call to completion: success, or a classified error once the
    /// retry policy gives up.
    ///
    /// 204/205 and declared acceptable statuses deserialize `T` from JSON
    /// `null`, so `Option<T>` yields `None` for them.
    ///
    /// # Errors
    /// Every failure is a [`DomainError`] whose context names the request.
    #[instrument(skip(self, options), fields(method = %method, path = %path))]
    pub async fn request<T: DeserializeOwned>(
        &self,
        method: Method,
        path: &str,
        options: RequestOptions,
    ) -> Result<T, DomainError> {
        let request = self.prepare(method, path, options)?;
        let mut tracker = CallTracker::new(&request.correlation_id);
        let mut attempt = 0;

        loop {
            let error = match self.attempt(&request, attempt, &mut tracker).await {
                Ok(response) => {
                    let status = response.status;
                    return match self.decode(&request, attempt, response) {
                        Ok(value) => {
                            tracker.advance(CallState::Success);
                            debug!(
                                correlation_id = %request.correlation_id,
                                status,
                                attempts = attempt + 1,
                                "Request succeeded"
                            );
                            Ok(value)
                        }
                        Err(error) => {
                            tracker.advance(CallState::Failed);
                            warn!(
                                correlation_id = %request.correlation_id,
                                status,
                                error = %error,
                                "Response body did not match the expected shape"
                            );
                            Err(error)
                        }
                    };
                }
                Err(error) => error,
            };

            if is_token_expired(&error) {
                self.auth.invalidate();
            }

            match self.retry_decision(&error, attempt) {
                RetryDecision::RetryAfter(delay) => {
                    tracker.advance(CallState::Retrying);
                    warn!(
                        correlation_id = %request.correlation_id,
                        attempt,
                        code = %error.code,
                        status = ?error.status_code,
                        delay_ms = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX),
                        "Transient failure, retrying"
                    );
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
                RetryDecision::Stop => {
                    tracker.advance(CallState::Failed);
                    warn!(
                        correlation_id = %request.correlation_id,
                        attempts = attempt + 1,
                        code = %error.code,
                        status = ?error.status_code,
                        error = %error.message,
                        "Request failed"
                    );
                    return Err(error);
                }
            }
        }
    }

    /// Resolve `path` against the base URL and assign a correlation id.
    ///
    /// # Errors
    /// Returns a `VALIDATION` error if the resulting URL does not parse.
    pub fn prepare(
        &self,
        method: Method,
        path: &str,
        options: RequestOptions,
    ) -> Result<PreparedRequest, DomainError> {
        let correlation_id = Uuid::new_v4().to_string();
        let joined = format!(
            "{}/{}",
            self.base_url.as_str().trim_end_matches('/'),
            path.trim_start_matches('/')
        );
        let mut url = Url::parse(&joined).map_err(|e| {
            DomainError::new(ErrorCode::Validation, format!("Invalid request path '{path}'"))
                .with_status(400)
                .with_cause(e)
                .with_context(
                    ErrorContext::new()
                        .with_request(RequestInfo::new(method.as_str(), path))
                        .with_correlation_id(&correlation_id),
                )
        })?;
        if !options.query.is_empty() {
            url.query_pairs_mut().extend_pairs(options.query.iter());
        }

        Ok(PreparedRequest { method, path: path.to_string(), url, options, correlation_id })
    }

    /// Stage 1: obtain the bearer header for this attempt.
    ///
    /// Cheap on every attempt after the first: the provider returns its
    /// cached token unless it has rotated.
    ///
    /// # Errors
    /// Returns the provider's error with the request context attached.
    pub async fn authenticate(
        &self,
        request: &PreparedRequest,
        attempt: u32,
    ) -> Result<HeaderValue, DomainError> {
        let token = self
            .auth
            .access_token()
            .await
            .map_err(|e| provider_failure(e, request, attempt))?;
        bearer_value(&token).map_err(|e| provider_failure(e, request, attempt))
    }

    /// Stage 2: issue one attempt under the per-attempt deadline.
    ///
    /// # Errors
    /// Returns the raw [`Failure`]: an HTTP failure for unacceptable
    /// statuses, a transport failure when no response arrived.
    pub async fn send(
        &self,
        request: &PreparedRequest,
        authorization: &HeaderValue,
        attempt: u32,
    ) -> Result<AcceptedResponse, Failure> {
        let mut builder = self
            .client
            .request(request.method.clone(), request.url.clone())
            .header(AUTHORIZATION, authorization.clone());
        for (name, value) in &request.options.headers {
            builder = builder.header(name.as_str(), value.as_str());
        }
        if let Some(body) = &request.options.body {
            builder = builder.json(body);
        }

        let authorization_text = authorization.to_str().unwrap_or_default();
        let outbound = redact_headers(
            std::iter::once((AUTHORIZATION.as_str(), authorization_text)).chain(
                request.options.headers.iter().map(|(name, value)| (name.as_str(), value.as_str())),
            ),
        );
        debug!(
            correlation_id = %request.correlation_id,
            attempt,
            method = %request.method,
            url = %request.url,
            headers = ?outbound,
            "Sending HTTP request"
        );

        let deadline = request.options.timeout.unwrap_or(self.timeout);
        let exchange = async {
            let response = builder.send().await.map_err(IntoFailure::into_failure)?;
            let status = response.status().as_u16();
            let retry_after = response
                .headers()
                .get(RETRY_AFTER)
                .and_then(|value| value.to_str().ok())
                .map(str::to_string);
            let inbound = redact_headers(response.headers().iter().map(|(name, value)| {
                (name.as_str(), value.to_str().unwrap_or("<non-ascii>"))
            }));
            debug!(
                correlation_id = %request.correlation_id,
                attempt,
                status,
                headers = ?inbound,
                "Received HTTP response"
            );
            let body = response.bytes().await.map_err(IntoFailure::into_failure)?;
            Ok::<_, Failure>((status, retry_after, body.to_vec()))
        };

        let (status, retry_after, body) = match tokio::time::timeout(deadline, exchange).await {
            Ok(result) => result?,
            Err(_) => {
                return Err(TransportFailure::new(
                    TransportFailureKind::Timeout,
                    format!(
                        "{} {} timed out after {}ms",
                        request.method,
                        request.path,
                        deadline.as_millis()
                    ),
                )
                .into());
            }
        };

        if (200..300).contains(&status) || request.options.is_acceptable(status) {
            return Ok(AcceptedResponse { status, body });
        }

        let mut failure = HttpFailure::new(status, String::from_utf8_lossy(&body));
        if let Some(retry_after) = retry_after {
            failure = failure.with_retry_after(retry_after);
        }
        Err(failure.into())
    }

    /// Stage 3: turn a raw failure into a [`DomainError`] carrying the
    /// request context.
    pub fn classify_failure(
        &self,
        request: &PreparedRequest,
        attempt: u32,
        failure: Failure,
    ) -> DomainError {
        let status = match &failure {
            Failure::Http(response) => Some(response.status),
            Failure::Domain(error) => error.status_code,
            Failure::Transport(_) | Failure::Other { .. } => None,
        };
        classify(failure, Some(request.context(attempt, status)))
    }

    /// Stage 4: retry or give up.
    pub fn retry_decision(&self, error: &DomainError, attempt: u32) -> RetryDecision {
        self.policy.should_retry(error, attempt)
    }

    /// Parse an accepted response body into `T`.
    ///
    /// # Errors
    /// Returns `INVALID_RESPONSE` when the body does not match `T`.
    pub fn decode<T: DeserializeOwned>(
        &self,
        request: &PreparedRequest,
        attempt: u32,
        response: AcceptedResponse,
    ) -> Result<T, DomainError> {
        let no_content = matches!(response.status, 204 | 205)
            || !(200..300).contains(&response.status)
            || response.body.iter().all(u8::is_ascii_whitespace);

        let decoded = if no_content {
            serde_json::from_value(Value::Null)
        } else {
            serde_json::from_slice(&response.body)
        };

        decoded.map_err(|e| {
            DomainError::new(
                ErrorCode::InvalidResponse,
                format!("Response body could not be decoded: {e}"),
            )
            .with_status(response.status)
            .with_cause(e)
            .with_context(request.context(attempt, Some(response.status)))
        })
    }

    async fn attempt(
        &self,
        request: &PreparedRequest,
        attempt: u32,
        tracker: &mut CallTracker,
    ) -> Result<AcceptedResponse, DomainError> {
        tracker.advance(CallState::Authenticating);
        let authorization = self.authenticate(request, attempt).await?;
        tracker.advance(CallState::InFlight);
        self.send(request, &authorization, attempt)
            .await
            .map_err(|failure| self.classify_failure(request, attempt, failure))
    }
}

impl std::fmt::Debug for HttpTransport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpTransport")
            .field("base_url", &self.base_url.as_str())
            .field("timeout", &self.timeout)
            .field("retry", self.policy.config())
            .finish_non_exhaustive()
    }
}

/// Token failures report the call that needed the token, whatever request
/// the provider itself made.
fn provider_failure(mut error: DomainError, request: &PreparedRequest, attempt: u32) -> DomainError {
    error.context.request_info = None;
    error.with_context(request.context(attempt, None))
}

fn bearer_value(token: &str) -> Result<HeaderValue, DomainError> {
    let mut value = HeaderValue::from_str(&format!("Bearer {token}")).map_err(|e| {
        DomainError::new(
            ErrorCode::Authentication,
            "Access token contains characters not allowed in a header",
        )
        .with_cause(e)
    })?;
    value.set_sensitive(true);
    Ok(value)
}

/// Builder for [`HttpTransport`].
#[derive(Default)]
pub struct HttpTransportBuilder {
    settings: ClientSettings,
    retry: Option<RetryConfig>,
    auth: Option<Arc<dyn AccessTokenProvider>>,
    user_agent: Option<String>,
}

impl HttpTransportBuilder {
    /// Base URL, timeout and retry budget.
    pub fn settings(mut self, settings: &ClientSettings) -> Self {
        self.settings = settings.clone();
        self
    }

    pub fn base_url(mut self, base_url: impl Into<String>) -> Self {
        self.settings.base_url = base_url.into();
        self
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.settings.timeout_ms = u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX);
        self
    }

    /// Override the retry behaviour derived from the settings.
    pub fn retry_config(mut self, retry: RetryConfig) -> Self {
        self.retry = Some(retry);
        self
    }

    pub fn auth(mut self, auth: Arc<dyn AccessTokenProvider>) -> Self {
        self.auth = Some(auth);
        self
    }

    pub fn user_agent(mut self, agent: impl Into<String>) -> Self {
        self.user_agent = Some(agent.into());
        self
    }

    /// # Errors
    /// Returns [`ConfigError`] if the auth provider is missing or any
    /// setting is invalid.
    pub fn build(self) -> Result<HttpTransport, ConfigError> {
        let auth = self.auth.ok_or(ConfigError::MissingField("auth"))?;
        self.settings.validate()?;

        let base_url = Url::parse(&self.settings.base_url).map_err(|e| ConfigError::Invalid {
            field: "base_url",
            message: e.to_string(),
        })?;

        let retry = self.retry.unwrap_or_else(|| RetryConfig::from(&self.settings));
        retry
            .validate()
            .map_err(|e| ConfigError::Invalid { field: "retry", message: e.to_string() })?;

        let timeout = self.settings.timeout();
        let mut builder = ReqwestClient::builder().connect_timeout(timeout).no_proxy();
        builder = builder.user_agent(
            self.user_agent
                .unwrap_or_else(|| concat!("mixtape/", env!("CARGO_PKG_VERSION")).to_string()),
        );
        let client = builder.build().map_err(|e| ConfigError::Invalid {
            field: "http_client",
            message: e.to_string(),
        })?;

        Ok(HttpTransport {
            client,
            base_url,
            auth,
            policy: TransientFailurePolicy::new(retry),
            timeout,
        })
    }
}
