//! Conversions from external infrastructure errors into classifiable
//! failures.
//!
//! `Failure` lives in `mixtape-common` and `reqwest::Error` in reqwest, so a
//! `From` impl is off the table; the extension trait keeps the mapping in
//! one place instead.

use std::error::Error as _;

use mixtape_common::error::{Failure, TransportFailure, TransportFailureKind};
use reqwest::Error as HttpError;
use url::ParseError as UrlError;

/// Extension trait to make the conversion explicit at call sites and in
/// tests.
pub trait IntoFailure {
    fn into_failure(self) -> Failure;
}

/* -------------------------------------------------------------------------- */
/* reqwest::Error → Failure */
/* -------------------------------------------------------------------------- */

impl IntoFailure for HttpError {
    fn into_failure(self) -> Failure {
        let kind = if self.is_timeout() {
            Some(TransportFailureKind::Timeout)
        } else if self.is_connect() {
            if looks_like_dns_failure(&self) {
                Some(TransportFailureKind::Dns)
            } else {
                Some(TransportFailureKind::Connect)
            }
        } else if self.is_request() || self.is_body() {
            Some(TransportFailureKind::Request)
        } else {
            None
        };

        match kind {
            Some(kind) => {
                let message = match self.url() {
                    Some(url) => format!("{kind} for {}", url.path()),
                    None => kind.to_string(),
                };
                Failure::Transport(TransportFailure::new(kind, message).with_cause(self))
            }
            // Builder and redirect errors: nothing was on the wire, but it is
            // not a transient network condition either.
            None => Failure::from_error(self),
        }
    }
}

/* -------------------------------------------------------------------------- */
/* url::ParseError → Failure */
/* -------------------------------------------------------------------------- */

impl IntoFailure for UrlError {
    fn into_failure(self) -> Failure {
        Failure::Other {
            message: format!("Invalid request URL: {self}"),
            cause: Some(std::sync::Arc::new(self)),
        }
    }
}

// hyper-util reports resolver failures as a connect error whose source chain
// mentions "dns error"; there is no typed accessor for it.
fn looks_like_dns_failure(error: &HttpError) -> bool {
    let mut source = error.source();
    while let Some(inner) = source {
        if inner.to_string().to_ascii_lowercase().contains("dns error") {
            return true;
        }
        source = inner.source();
    }
    false
}
