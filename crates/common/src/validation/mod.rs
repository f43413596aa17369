// Validation Module - request inputs and response shapes
mod catalog;
mod fields;

pub use catalog::{is_valid_catalog_id, require_catalog_id, require_market, validate_market_code};
pub use fields::validate_required_fields;
