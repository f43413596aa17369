//! Testing utilities and helpers
//!
//! This module provides testing utilities including:
//! - **[`fixtures`]**: Catalog ids and upstream bodies (with deterministic
//!   seeded variants)
//! - **[`mocks`]**: Mock implementations of common traits
//!
//! ## Usage
//!
//! ```rust
//! use mixtape_common::auth::{TokenManager, TokenResponse};
//! use mixtape_common::testing::MockTokenExchange;
//!
//! # tokio_test::block_on(async {
//! let exchange = MockTokenExchange::new();
//! exchange.push_response(TokenResponse::bearer("test-token", 3600));
//!
//! let tokens = TokenManager::new(exchange.clone());
//! assert_eq!(tokens.get_valid_token().await.unwrap().access_token, "test-token");
//! assert_eq!(exchange.call_count(), 1);
//! # });
//! ```

pub mod fixtures;
pub mod mocks;

// Re-export commonly used items
pub use fixtures::{
    catalog_error_body, oauth_error_body, random_catalog_id, random_catalog_id_seeded, token_body,
    track_json,
};
pub use mocks::MockTokenExchange;
