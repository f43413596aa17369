//! Shared request path for resource services
//!
//! Resource-specific services (tracks, albums, search, ...) hold a
//! [`ServiceAdapter`] and route every call through
//! [`ServiceAdapter::request`], so failures carry the resource they
//! concerned no matter which service raised them.

use std::sync::Arc;

use mixtape_common::validation;
use mixtape_domain::DomainError;
use reqwest::header::HeaderMap;
use reqwest::Method;
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::debug;

use crate::http::{HttpTransport, RequestOptions};

/// The resource a call concerns, attached to any error it produces.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Resource<'a> {
    pub resource_type: &'a str,
    pub resource_id: Option<&'a str>,
}

impl<'a> Resource<'a> {
    pub const fn new(resource_type: &'a str) -> Self {
        Self { resource_type, resource_id: None }
    }

    #[must_use]
    pub const fn with_id(mut self, resource_id: &'a str) -> Self {
        self.resource_id = Some(resource_id);
        self
    }
}

/// Base every resource service composes with.
#[derive(Debug, Clone)]
pub struct ServiceAdapter {
    transport: Arc<HttpTransport>,
}

impl ServiceAdapter {
    pub fn new(transport: Arc<HttpTransport>) -> Self {
        Self { transport }
    }

    pub fn transport(&self) -> &HttpTransport {
        &self.transport
    }

    /// Dispatch through the transport, adding `resource` to any failure.
    ///
    /// Errors are never swallowed or re-coded here.
    ///
    /// # Errors
    /// The transport's [`DomainError`] with `resource_type` and
    /// `resource_id` filled in.
    pub async fn request<T: DeserializeOwned>(
        &self,
        method: Method,
        path: &str,
        options: RequestOptions,
        resource: Resource<'_>,
    ) -> Result<T, DomainError> {
        let result = match method {
            Method::GET => self.transport.get(path, options).await,
            Method::POST => self.transport.post(path, options).await,
            Method::PUT => self.transport.put(path, options).await,
            Method::DELETE => self.transport.delete(path, options).await,
            other => self.transport.request(other, path, options).await,
        };

        result.map_err(|error| {
            debug!(
                resource_type = resource.resource_type,
                resource_id = ?resource.resource_id,
                code = %error.code,
                "Resource request failed"
            );
            error.for_resource(resource.resource_type, resource.resource_id)
        })
    }

    /// Return `response` unchanged if every field is present and truthy.
    ///
    /// # Errors
    /// `INVALID_RESPONSE` listing the missing fields.
    pub fn validate_required_fields(
        &self,
        response: Value,
        fields: &[&str],
        resource_type: &str,
    ) -> Result<Value, DomainError> {
        validation::validate_required_fields(response, fields, resource_type)
    }

    /// Two uppercase letters naming a recognized market.
    pub fn validate_market_code(&self, code: &str) -> bool {
        validation::validate_market_code(code)
    }

    /// # Errors
    /// `INVALID_MARKET` (400) for an unrecognized code; no request is made.
    pub fn require_market<'a>(&self, code: &'a str) -> Result<&'a str, DomainError> {
        validation::require_market(code)
    }

    /// # Errors
    /// `INVALID_ID` (400) for a malformed id; no request is made.
    pub fn require_id<'a>(&self, id: &'a str, resource_type: &str) -> Result<&'a str, DomainError> {
        validation::require_catalog_id(id, resource_type)
    }

    /// # Errors
    /// See [`HttpTransport::auth_header`].
    pub async fn auth_header(&self) -> Result<HeaderMap, DomainError> {
        self.transport.auth_header().await
    }
}
