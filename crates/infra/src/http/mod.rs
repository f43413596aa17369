//! Authenticated HTTP transport
//!
//! One [`HttpTransport`] per base URL. It owns the retry policy and the
//! per-attempt deadline; callers describe a request with
//! [`RequestOptions`] and get back either a decoded body or a classified
//! [`DomainError`](mixtape_domain::DomainError).

pub mod client;
pub mod options;
pub mod state;

pub use client::{AcceptedResponse, HttpTransport, HttpTransportBuilder, PreparedRequest};
pub use options::RequestOptions;
pub use state::{CallState, CallTracker};
