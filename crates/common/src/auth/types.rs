//! OAuth token types
//!
//! Tokens are replaced wholesale on refresh; nothing mutates a cached token
//! except [`Token::expire`], which only moves its expiry into the past.

use std::fmt;

use chrono::{DateTime, Duration, TimeDelta, Utc};
use mixtape_domain::constants::{CLIENT_CREDENTIALS_EXPIRY_MARGIN_SECS, SESSION_EXPIRY_MARGIN_SECS};
use mixtape_domain::{DomainError, ErrorCode};
use serde::{Deserialize, Serialize};

/// Bearer token with absolute expiry.
///
/// The safety margin depends on the token kind: client-credential tokens
/// (no refresh token) are considered expired 60 s early, refreshable
/// session tokens 5 min early.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Token {
    pub access_token: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub refresh_token: Option<String>,
    pub token_type: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scope: Option<String>,
    pub expires_at: DateTime<Utc>,
}

impl Token {
    /// Token expiring `expires_in_secs` from now. Lifetimes beyond the
    /// representable range saturate.
    pub fn new(access_token: impl Into<String>, expires_in_secs: i64) -> Self {
        let expires_at = expiry_from_now(expires_in_secs).unwrap_or(if expires_in_secs < 0 {
            DateTime::<Utc>::MIN_UTC
        } else {
            DateTime::<Utc>::MAX_UTC
        });
        Self {
            access_token: access_token.into(),
            refresh_token: None,
            token_type: "Bearer".to_string(),
            scope: None,
            expires_at,
        }
    }

    #[must_use]
    pub fn with_refresh_token(mut self, refresh_token: impl Into<String>) -> Self {
        self.refresh_token = Some(refresh_token.into());
        self
    }

    #[must_use]
    pub fn with_scope(mut self, scope: impl Into<String>) -> Self {
        self.scope = Some(scope.into());
        self
    }

    /// Build from an endpoint response, keeping `previous_refresh_token`
    /// when the response does not rotate it.
    ///
    /// # Errors
    /// `AUTHENTICATION` if `expires_in` is negative or too large to turn
    /// into an expiry time.
    pub fn from_response(
        response: TokenResponse,
        previous_refresh_token: Option<String>,
    ) -> Result<Self, DomainError> {
        let expires_at = Some(response.expires_in)
            .filter(|secs| *secs >= 0)
            .and_then(expiry_from_now)
            .ok_or_else(|| {
                DomainError::new(
                    ErrorCode::Authentication,
                    format!(
                        "Malformed token response: expires_in {} is out of range",
                        response.expires_in
                    ),
                )
            })?;

        Ok(Self {
            access_token: response.access_token,
            refresh_token: response.refresh_token.or(previous_refresh_token),
            token_type: response.token_type,
            scope: response.scope,
            expires_at,
        })
    }

    /// Seconds before `expires_at` at which the token stops being served.
    #[must_use]
    pub fn expiry_margin(&self) -> Duration {
        if self.refresh_token.is_some() {
            Duration::seconds(SESSION_EXPIRY_MARGIN_SECS)
        } else {
            Duration::seconds(CLIENT_CREDENTIALS_EXPIRY_MARGIN_SECS)
        }
    }

    /// True once the token is inside its safety margin.
    #[must_use]
    pub fn is_expired(&self) -> bool {
        Utc::now() + self.expiry_margin() >= self.expires_at
    }

    #[must_use]
    pub fn seconds_until_expiry(&self) -> i64 {
        (self.expires_at - Utc::now()).num_seconds()
    }

    /// Force the token past its expiry so the next lookup refreshes it.
    pub fn expire(&mut self) {
        self.expires_at = Utc::now() - Duration::seconds(1);
    }

    /// `Authorization` header value.
    #[must_use]
    pub fn bearer(&self) -> String {
        format!("Bearer {}", self.access_token)
    }
}

impl fmt::Debug for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Token")
            .field("access_token", &"[REDACTED]")
            .field("refresh_token", &self.refresh_token.as_ref().map(|_| "[REDACTED]"))
            .field("token_type", &self.token_type)
            .field("scope", &self.scope)
            .field("expires_at", &self.expires_at)
            .finish()
    }
}

/// Token endpoint response body (RFC 6749 section 5.1).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenResponse {
    pub access_token: String,
    #[serde(default = "default_token_type")]
    pub token_type: String,
    pub expires_in: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub refresh_token: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scope: Option<String>,
}

impl TokenResponse {
    /// Minimal bearer response, mostly for tests and mocks.
    pub fn bearer(access_token: impl Into<String>, expires_in: i64) -> Self {
        Self {
            access_token: access_token.into(),
            token_type: default_token_type(),
            expires_in,
            refresh_token: None,
            scope: None,
        }
    }

    #[must_use]
    pub fn with_refresh_token(mut self, refresh_token: impl Into<String>) -> Self {
        self.refresh_token = Some(refresh_token.into());
        self
    }
}

fn expiry_from_now(secs: i64) -> Option<DateTime<Utc>> {
    TimeDelta::try_seconds(secs).and_then(|lifetime| Utc::now().checked_add_signed(lifetime))
}

fn default_token_type() -> String {
    "Bearer".to_string()
}

/// Grant sent to the token endpoint.
#[derive(Clone, PartialEq, Eq)]
pub enum TokenRequest {
    ClientCredentials,
    RefreshToken(String),
}

impl TokenRequest {
    /// Refresh grant if `current` carries a refresh token, client
    /// credentials otherwise.
    #[must_use]
    pub fn for_token(current: Option<&Token>) -> Self {
        match current.and_then(|token| token.refresh_token.clone()) {
            Some(refresh_token) => Self::RefreshToken(refresh_token),
            None => Self::ClientCredentials,
        }
    }

    #[must_use]
    pub const fn grant_type(&self) -> &'static str {
        match self {
            Self::ClientCredentials => "client_credentials",
            Self::RefreshToken(_) => "refresh_token",
        }
    }

    /// `application/x-www-form-urlencoded` body fields.
    #[must_use]
    pub fn form_params(&self) -> Vec<(&'static str, String)> {
        let mut params = vec![("grant_type", self.grant_type().to_string())];
        if let Self::RefreshToken(refresh_token) = self {
            params.push(("refresh_token", refresh_token.clone()));
        }
        params
    }
}

impl fmt::Debug for TokenRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.grant_type())
    }
}
