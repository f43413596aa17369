//! Integration tests for `mixtape_common::validation`.

use mixtape_common::validation::{
    is_valid_catalog_id, require_catalog_id, require_market, validate_market_code,
    validate_required_fields,
};
use mixtape_domain::constants::MARKET_CODES;
use mixtape_domain::ErrorCode;
use serde_json::json;

/// Every listed market passes; lowercase spellings of the same codes fail.
#[test]
fn market_list_round_trip() {
    for code in MARKET_CODES {
        assert!(validate_market_code(code), "{code}");
        assert!(!validate_market_code(&code.to_lowercase()), "{code}");
    }
}

/// Placeholder and unassigned codes are rejected even though they have the
/// right shape.
#[test]
fn placeholder_markets_are_rejected() {
    for code in ["XX", "AA", "ZZ", "QQ"] {
        let err = require_market(code).unwrap_err();
        assert_eq!(err.code, ErrorCode::InvalidMarket);
        assert_eq!(err.status_code, Some(400));
    }
}

#[test]
fn catalog_ids_require_exact_base62_shape() {
    assert!(is_valid_catalog_id("11dFghVXANMlKmJXsNCbNl"));
    for bad in ["", "short", "11dFghVXANMlKmJXsNCbNl1", "11dFghVXANMlKmJXsNCb-l", "11dFghVXANMlKmJXsNCb l"] {
        assert!(!is_valid_catalog_id(bad), "{bad}");
        let err = require_catalog_id(bad, "album").unwrap_err();
        assert_eq!(err.code, ErrorCode::InvalidId);
        assert_eq!(err.context.resource_type.as_deref(), Some("album"));
    }
}

/// Validates the falsy rules: null, false, 0 and "" are missing; anything
/// else, including empty arrays, is present.
#[test]
fn required_fields_falsy_rules() {
    let body = json!({
        "id": "abc",
        "name": "Song",
        "popularity": 0,
        "explicit": false,
        "preview_url": null,
        "label": "",
        "genres": [],
        "duration_ms": 1
    });

    assert!(validate_required_fields(body.clone(), &["id", "name", "genres", "duration_ms"], "track").is_ok());

    let err = validate_required_fields(
        body,
        &["popularity", "explicit", "preview_url", "label", "absent"],
        "track",
    )
    .unwrap_err();
    assert_eq!(err.code, ErrorCode::InvalidResponse);
    assert_eq!(
        err.context.validation_details,
        Some(json!({ "missingFields": ["popularity", "explicit", "preview_url", "label", "absent"] }))
    );
}
