//! Response shape checks

use mixtape_domain::{DomainError, ErrorCode, ErrorContext};
use serde_json::{json, Value};

/// Return `response` unchanged if every field in `fields` is present and
/// truthy.
///
/// A field is missing when it is absent, `null`, `false`, `0` or `""`.
/// Dotted names (`album.id`) walk into nested objects.
///
/// # Errors
/// Returns `INVALID_RESPONSE` listing every missing field in
/// `validation_details.missingFields`.
pub fn validate_required_fields(
    response: Value,
    fields: &[&str],
    resource_type: &str,
) -> Result<Value, DomainError> {
    let missing: Vec<&str> =
        fields.iter().copied().filter(|field| !is_truthy(lookup(&response, field))).collect();

    if missing.is_empty() {
        return Ok(response);
    }

    Err(DomainError::new(
        ErrorCode::InvalidResponse,
        format!("Invalid {resource_type} response: missing required field(s) {}", missing.join(", ")),
    )
    .with_context(
        ErrorContext::for_resource(resource_type, None)
            .with_validation_details(json!({ "missingFields": missing })),
    ))
}

fn lookup<'a>(value: &'a Value, path: &str) -> Option<&'a Value> {
    path.split('.').try_fold(value, |current, segment| current.get(segment))
}

fn is_truthy(value: Option<&Value>) -> bool {
    match value {
        None | Some(Value::Null) => false,
        Some(Value::Bool(flag)) => *flag,
        Some(Value::Number(number)) => number.as_f64().is_some_and(|n| n != 0.0),
        Some(Value::String(text)) => !text.is_empty(),
        Some(Value::Array(_) | Value::Object(_)) => true,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn passes_complete_response_through() {
        let body = json!({ "id": "abc", "name": "Song", "popularity": 10 });
        let out = validate_required_fields(body.clone(), &["id", "name"], "track").unwrap();
        assert_eq!(out, body);
    }

    #[test]
    fn falsy_values_count_as_missing() {
        let body = json!({ "id": "", "name": null, "explicit": false, "duration_ms": 0 });
        let err = validate_required_fields(body, &["id", "name", "explicit", "duration_ms"], "track")
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::InvalidResponse);
        assert_eq!(err.context.resource_type.as_deref(), Some("track"));
        assert_eq!(
            err.context.validation_details,
            Some(json!({ "missingFields": ["id", "name", "explicit", "duration_ms"] }))
        );
    }

    #[test]
    fn empty_collections_are_present() {
        let body = json!({ "artists": [], "album": {} });
        assert!(validate_required_fields(body, &["artists", "album"], "track").is_ok());
    }

    #[test]
    fn dotted_paths_walk_objects() {
        let body = json!({ "album": { "id": "xyz", "name": "" } });
        let err = validate_required_fields(body, &["album.id", "album.name", "album.type"], "track")
            .unwrap_err();
        assert!(err.message.contains("album.name, album.type"));
    }
}
