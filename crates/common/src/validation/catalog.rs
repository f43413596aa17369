//! Catalog identifier and market checks
//!
//! These run before any request is built, so a malformed id or market never
//! costs a round trip.

use mixtape_domain::constants::{CATALOG_ID_LENGTH, MARKET_CODES};
use mixtape_domain::{DomainError, ErrorCode, ErrorContext};
use serde_json::json;

/// True iff `code` is two uppercase ASCII letters naming a served market.
#[must_use]
pub fn validate_market_code(code: &str) -> bool {
    code.len() == 2
        && code.bytes().all(|b| b.is_ascii_uppercase())
        && MARKET_CODES.binary_search(&code).is_ok()
}

/// True iff `id` has the shape of a catalog object id (22 base62 chars).
#[must_use]
pub fn is_valid_catalog_id(id: &str) -> bool {
    id.len() == CATALOG_ID_LENGTH && id.bytes().all(|b| b.is_ascii_alphanumeric())
}

/// `Ok(code)` for a served market, `INVALID_MARKET` otherwise.
///
/// # Errors
/// Returns an `INVALID_MARKET` error with status 400.
pub fn require_market(code: &str) -> Result<&str, DomainError> {
    if validate_market_code(code) {
        return Ok(code);
    }
    Err(DomainError::new(ErrorCode::InvalidMarket, format!("Invalid market code: '{code}'"))
        .with_status(400)
        .with_context(
            ErrorContext::new().with_validation_details(json!({ "field": "market", "value": code })),
        ))
}

/// `Ok(id)` for a well-formed catalog id, `INVALID_ID` otherwise.
///
/// # Errors
/// Returns an `INVALID_ID` error with status 400 tagged with `resource_type`.
pub fn require_catalog_id<'a>(id: &'a str, resource_type: &str) -> Result<&'a str, DomainError> {
    if is_valid_catalog_id(id) {
        return Ok(id);
    }
    Err(DomainError::new(ErrorCode::InvalidId, format!("Invalid {resource_type} id: '{id}'"))
        .with_status(400)
        .with_context(
            ErrorContext::for_resource(resource_type, Some(id.to_string()))
                .with_validation_details(json!({ "field": "id", "value": id })),
        ))
}
