//! Catalog API surface
//!
//! This module provides the pieces resource services are built from.
//!
//! # Architecture
//!
//! - [`AccessTokenProvider`] is the only thing the transport knows about
//!   authentication; [`TokenManager`](mixtape_common::auth::TokenManager)
//!   implements it
//! - [`ServiceAdapter`] routes every resource call through the transport
//!   and tags failures with the resource
//! - [`TrackService`] is the reference resource service

pub mod auth;
pub mod service;
pub mod tracks;

pub use auth::{AccessTokenProvider, StaticTokenProvider};
pub use service::{Resource, ServiceAdapter};
pub use tracks::{CatalogRef, Track, TrackService};
