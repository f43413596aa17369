//! Macro for implementing Display and FromStr for label enums
//!
//! Several domain enums (severity levels, grant kinds) travel as lowercase
//! strings in logs and configuration. This macro gives them a single
//! Display/FromStr implementation with case-insensitive parsing.
//!
//! # Example
//!
//! ```rust
//! use mixtape_domain::impl_domain_status_conversions;
//!
//! #[derive(Debug, Clone, Copy, PartialEq, Eq)]
//! pub enum Grant {
//!     ClientCredentials,
//!     RefreshToken,
//! }
//!
//! impl_domain_status_conversions!(Grant {
//!     ClientCredentials => "client_credentials",
//!     RefreshToken => "refresh_token",
//! });
//! ```

/// Implements Display and FromStr traits for label enums
///
/// # Arguments
///
/// * `$enum_name` - The name of the enum type
/// * `$variant => $str` - Mapping of enum variants to their lowercase string
///   representations
#[macro_export]
macro_rules! impl_domain_status_conversions {
    ($enum_name:ident { $($variant:ident => $str:expr),+ $(,)? }) => {
        impl ::std::fmt::Display for $enum_name {
            fn fmt(&self, f: &mut ::std::fmt::Formatter<'_>) -> ::std::fmt::Result {
                match self {
                    $(Self::$variant => write!(f, $str),)+
                }
            }
        }

        impl ::std::str::FromStr for $enum_name {
            type Err = String;

            fn from_str(s: &str) -> ::std::result::Result<Self, Self::Err> {
                match s.to_lowercase().as_str() {
                    $($str => Ok(Self::$variant),)+
                    _ => Err(format!("Invalid {}: {}", stringify!($enum_name), s)),
                }
            }
        }
    };
}
