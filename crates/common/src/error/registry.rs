//! Static metadata for every [`ErrorCode`].
//!
//! The table is read-only and process-wide. Lookups are total: every code in
//! the closed set has exactly one entry.

use mixtape_domain::{ErrorCode, ErrorSeverity};
use serde::Serialize;

/// Facts about an error code that do not depend on a particular failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorTypeMetadata {
    pub is_retryable: bool,
    pub default_message: &'static str,
    pub severity: ErrorSeverity,
    pub default_status_code: u16,
}

const NETWORK: ErrorTypeMetadata = ErrorTypeMetadata {
    is_retryable: true,
    default_message: "Network request failed",
    severity: ErrorSeverity::Medium,
    default_status_code: 503,
};

const RATE_LIMIT: ErrorTypeMetadata = ErrorTypeMetadata {
    is_retryable: true,
    default_message: "Rate limit exceeded",
    severity: ErrorSeverity::Medium,
    default_status_code: 429,
};

const VALIDATION: ErrorTypeMetadata = ErrorTypeMetadata {
    is_retryable: false,
    default_message: "Request validation failed",
    severity: ErrorSeverity::Low,
    default_status_code: 400,
};

const AUTHENTICATION: ErrorTypeMetadata = ErrorTypeMetadata {
    is_retryable: false,
    default_message: "Authentication failed",
    severity: ErrorSeverity::High,
    default_status_code: 401,
};

const TOKEN_EXPIRED: ErrorTypeMetadata = ErrorTypeMetadata {
    is_retryable: false,
    default_message: "Access token expired",
    severity: ErrorSeverity::Medium,
    default_status_code: 401,
};

const NOT_FOUND: ErrorTypeMetadata = ErrorTypeMetadata {
    is_retryable: false,
    default_message: "Resource not found",
    severity: ErrorSeverity::Low,
    default_status_code: 404,
};

const INVALID_ID: ErrorTypeMetadata = ErrorTypeMetadata {
    is_retryable: false,
    default_message: "Invalid catalog id",
    severity: ErrorSeverity::Low,
    default_status_code: 400,
};

const INVALID_MARKET: ErrorTypeMetadata = ErrorTypeMetadata {
    is_retryable: false,
    default_message: "Invalid market code",
    severity: ErrorSeverity::Low,
    default_status_code: 400,
};

const INVALID_RESPONSE: ErrorTypeMetadata = ErrorTypeMetadata {
    is_retryable: false,
    default_message: "Invalid response from server",
    severity: ErrorSeverity::High,
    default_status_code: 502,
};

const SERVER_ERROR: ErrorTypeMetadata = ErrorTypeMetadata {
    is_retryable: true,
    default_message: "Upstream server error",
    severity: ErrorSeverity::High,
    default_status_code: 500,
};

const UNKNOWN: ErrorTypeMetadata = ErrorTypeMetadata {
    is_retryable: false,
    default_message: "An unknown error occurred",
    severity: ErrorSeverity::Medium,
    default_status_code: 500,
};

/// Metadata for `code`.
#[must_use]
pub const fn lookup_metadata(code: ErrorCode) -> &'static ErrorTypeMetadata {
    match code {
        ErrorCode::Network => &NETWORK,
        ErrorCode::RateLimit => &RATE_LIMIT,
        ErrorCode::Validation => &VALIDATION,
        ErrorCode::Authentication => &AUTHENTICATION,
        ErrorCode::TokenExpired => &TOKEN_EXPIRED,
        ErrorCode::NotFound => &NOT_FOUND,
        ErrorCode::InvalidId => &INVALID_ID,
        ErrorCode::InvalidMarket => &INVALID_MARKET,
        ErrorCode::InvalidResponse => &INVALID_RESPONSE,
        ErrorCode::ServerError => &SERVER_ERROR,
        ErrorCode::Unknown => &UNKNOWN,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_code_has_metadata() {
        for code in ErrorCode::ALL {
            let meta = lookup_metadata(code);
            assert!(!meta.default_message.is_empty(), "{code}");
            assert!((400..600).contains(&meta.default_status_code), "{code}");
        }
    }

    #[test]
    fn retryable_codes_are_transient_ones() {
        let retryable: Vec<_> =
            ErrorCode::ALL.into_iter().filter(|code| lookup_metadata(*code).is_retryable).collect();
        assert_eq!(retryable, vec![ErrorCode::Network, ErrorCode::RateLimit, ErrorCode::ServerError]);
    }

    #[test]
    fn status_defaults_match_http_semantics() {
        assert_eq!(lookup_metadata(ErrorCode::RateLimit).default_status_code, 429);
        assert_eq!(lookup_metadata(ErrorCode::NotFound).default_status_code, 404);
        assert_eq!(lookup_metadata(ErrorCode::Authentication).default_status_code, 401);
        assert_eq!(lookup_metadata(ErrorCode::InvalidMarket).severity, ErrorSeverity::Low);
        assert_eq!(lookup_metadata(ErrorCode::InvalidResponse).severity, ErrorSeverity::High);
    }
}
