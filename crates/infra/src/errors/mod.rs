//! Error plumbing between external crates and the failure taxonomy.

pub mod conversions;

pub use conversions::IntoFailure;
