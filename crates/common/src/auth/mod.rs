//! OAuth client-credential and refresh-token handling
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────┐
//! │  TokenManager   │  Cache + single-flight refresh
//! └────────┬────────┘
//!          │
//!          └──► TokenExchange        (trait)
//!                    │
//!                    └──► TokenEndpointClient  (reqwest, Basic auth)
//! ```
//!
//! # Usage Example
//!
//! ```no_run
//! use std::time::Duration;
//!
//! use mixtape_common::auth::TokenManager;
//! use mixtape_domain::Credentials;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let credentials = Credentials::with_default_endpoint("client-id", "client-secret")?;
//! let tokens = TokenManager::from_credentials(credentials, Duration::from_secs(10))?;
//!
//! // Fetches on first use, then serves from cache until the safety margin.
//! let token = tokens.get_valid_token().await?;
//! println!("expires in {}s", token.seconds_until_expiry());
//! # Ok(())
//! # }
//! ```

pub mod client;
pub mod token_manager;
pub mod traits;
pub mod types;

// Re-export main types
pub use client::TokenEndpointClient;
pub use token_manager::TokenManager;
pub use traits::TokenExchange;
pub use types::{Token, TokenRequest, TokenResponse};
