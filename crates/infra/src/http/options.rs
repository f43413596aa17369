//! Per-call request options

use std::time::Duration;

use serde_json::Value;

/// Everything a caller can vary on a single request.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RequestOptions {
    pub query: Vec<(String, String)>,
    /// JSON body; `None` sends no body
    pub body: Option<Value>,
    /// Extra headers. `Authorization` is always set by the transport.
    pub headers: Vec<(String, String)>,
    /// Per-attempt deadline overriding the configured one
    pub timeout: Option<Duration>,
    /// Non-2xx statuses the caller treats as a valid (empty) answer, for
    /// example 404 on an existence check
    pub acceptable_statuses: Vec<u16>,
}

impl RequestOptions {
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn query(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.query.push((key.into(), value.into()));
        self
    }

    /// Add `key=value` only when a value is present.
    #[must_use]
    pub fn query_opt(self, key: impl Into<String>, value: Option<impl Into<String>>) -> Self {
        match value {
            Some(value) => self.query(key, value),
            None => self,
        }
    }

    #[must_use]
    pub fn json(mut self, body: Value) -> Self {
        self.body = Some(body);
        self
    }

    #[must_use]
    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    #[must_use]
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    #[must_use]
    pub fn accept_status(mut self, status: u16) -> Self {
        if !self.acceptable_statuses.contains(&status) {
            self.acceptable_statuses.push(status);
        }
        self
    }

    pub fn is_acceptable(&self, status: u16) -> bool {
        self.acceptable_statuses.contains(&status)
    }
}
