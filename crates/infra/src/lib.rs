//! # Mixtape Infrastructure
//!
//! The impure half of the client: HTTP, configuration files, logging.
//!
//! This crate contains:
//! - The authenticated, retrying HTTP transport
//! - The service adapter resource services are built on
//! - Configuration loading from the environment or files
//! - Tracing subscriber setup
//!
//! ## Architecture
//! - Token management and the error taxonomy live in `mixtape-common`
//! - Plain data (errors, config) lives in `mixtape-domain`
//!
//! ## Wiring
//!
//! ```no_run
//! use std::sync::Arc;
//!
//! use mixtape_common::auth::TokenManager;
//! use mixtape_infra::api::{ServiceAdapter, TrackService};
//! use mixtape_infra::http::HttpTransport;
//!
//! # async fn run() -> Result<(), Box<dyn std::error::Error>> {
//! let config = mixtape_infra::config::load()?;
//! let tokens = TokenManager::from_credentials(config.credentials, config.client.timeout())?;
//! let transport = HttpTransport::new(&config.client, Arc::new(tokens))?;
//! let tracks = TrackService::new(ServiceAdapter::new(Arc::new(transport)));
//!
//! let track = tracks.get_track("11dFghVXANMlKmJXsNCbNl", Some("SE")).await?;
//! println!("{}", track.name);
//! # Ok(())
//! # }
//! ```

pub mod api;
pub mod config;
pub mod errors;
pub mod http;
pub mod observability;

// Re-export commonly used items
pub use api::{AccessTokenProvider, Resource, ServiceAdapter, TrackService};
pub use http::{HttpTransport, RequestOptions};
pub use observability::{init_tracing, TracingFormat};
