//! # Mixtape Domain
//!
//! Domain types shared by every Mixtape crate.
//!
//! This crate contains:
//! - The closed error taxonomy (`ErrorCode`, `ErrorSeverity`) and the
//!   `DomainError` value every failure is normalized into
//! - Configuration structures (`Config`, `Credentials`, `ClientSettings`)
//! - Defaults and the recognized market list
//!
//! ## Architecture
//! - No dependencies on other Mixtape crates
//! - Only external dependencies allowed
//! - Pure data, no I/O

pub mod config;
pub mod constants;
pub mod errors;
pub mod macros;

// Re-export commonly used items
pub use config::*;
pub use errors::*;
