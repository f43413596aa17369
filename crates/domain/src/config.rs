//! Configuration structures
//!
//! `Config` is what the loader in `mixtape-infra` produces. Credentials are
//! validated eagerly: a client cannot be constructed from an incomplete set.

use std::fmt;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::constants::{
    DEFAULT_BASE_URL, DEFAULT_MAX_RETRY_DELAY_MS, DEFAULT_RETRIES, DEFAULT_RETRY_DELAY_MS,
    DEFAULT_TIMEOUT_MS, DEFAULT_TOKEN_ENDPOINT,
};
use crate::errors::ConfigError;

/// OAuth client credentials.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Credentials {
    pub client_id: String,
    pub client_secret: String,
    #[serde(default = "default_token_endpoint")]
    pub token_endpoint: String,
}

impl Credentials {
    /// Build and validate a credential set.
    ///
    /// # Errors
    /// Returns [`ConfigError`] if any field is empty or the endpoint is not an
    /// absolute http(s) URL.
    pub fn new(
        client_id: impl Into<String>,
        client_secret: impl Into<String>,
        token_endpoint: impl Into<String>,
    ) -> Result<Self, ConfigError> {
        let credentials = Self {
            client_id: client_id.into(),
            client_secret: client_secret.into(),
            token_endpoint: token_endpoint.into(),
        };
        credentials.validate()?;
        Ok(credentials)
    }

    /// Credentials against the default token endpoint.
    ///
    /// # Errors
    /// See [`Credentials::new`].
    pub fn with_default_endpoint(
        client_id: impl Into<String>,
        client_secret: impl Into<String>,
    ) -> Result<Self, ConfigError> {
        Self::new(client_id, client_secret, DEFAULT_TOKEN_ENDPOINT)
    }

    /// # Errors
    /// Returns [`ConfigError`] naming the first offending field.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.client_id.trim().is_empty() {
            return Err(ConfigError::MissingField("client_id"));
        }
        if self.client_secret.trim().is_empty() {
            return Err(ConfigError::MissingField("client_secret"));
        }
        if self.token_endpoint.trim().is_empty() {
            return Err(ConfigError::MissingField("token_endpoint"));
        }
        require_http_url("token_endpoint", &self.token_endpoint)
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("client_id", &self.client_id)
            .field("client_secret", &"[REDACTED]")
            .field("token_endpoint", &self.token_endpoint)
            .finish()
    }
}

/// Transport settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientSettings {
    /// Root every request path is appended to
    pub base_url: String,
    /// Per-attempt deadline
    pub timeout_ms: u64,
    /// Maximum retry attempts after the first try
    pub retries: u32,
    /// Base backoff unit
    pub retry_delay_ms: u64,
    /// Upper bound for any single backoff delay
    pub max_retry_delay_ms: u64,
}

impl Default for ClientSettings {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout_ms: DEFAULT_TIMEOUT_MS,
            retries: DEFAULT_RETRIES,
            retry_delay_ms: DEFAULT_RETRY_DELAY_MS,
            max_retry_delay_ms: DEFAULT_MAX_RETRY_DELAY_MS,
        }
    }
}

impl ClientSettings {
    #[must_use]
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    #[must_use]
    pub fn retry_delay(&self) -> Duration {
        Duration::from_millis(self.retry_delay_ms)
    }

    #[must_use]
    pub fn max_retry_delay(&self) -> Duration {
        Duration::from_millis(self.max_retry_delay_ms)
    }

    /// # Errors
    /// Returns [`ConfigError::Invalid`] for an unusable base URL, a zero
    /// timeout, or a base delay larger than the cap.
    pub fn validate(&self) -> Result<(), ConfigError> {
        require_http_url("base_url", &self.base_url)?;
        if self.timeout_ms == 0 {
            return Err(ConfigError::Invalid {
                field: "timeout_ms",
                message: "must be greater than 0".to_string(),
            });
        }
        if self.retry_delay_ms > self.max_retry_delay_ms {
            return Err(ConfigError::Invalid {
                field: "retry_delay_ms",
                message: format!(
                    "base delay {}ms exceeds max delay {}ms",
                    self.retry_delay_ms, self.max_retry_delay_ms
                ),
            });
        }
        Ok(())
    }
}

/// Complete client configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    pub credentials: Credentials,
    #[serde(default)]
    pub client: ClientSettings,
}

impl Config {
    /// # Errors
    /// Returns the first validation failure of either section.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.credentials.validate()?;
        self.client.validate()
    }
}

fn default_token_endpoint() -> String {
    DEFAULT_TOKEN_ENDPOINT.to_string()
}

fn require_http_url(field: &'static str, value: &str) -> Result<(), ConfigError> {
    if value.starts_with("https://") || value.starts_with("http://") {
        Ok(())
    } else {
        Err(ConfigError::Invalid {
            field,
            message: format!("'{value}' is not an absolute http(s) URL"),
        })
    }
}
