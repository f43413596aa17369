//! Test fixture generators
//!
//! Catalog ids and upstream response bodies shaped like the real API.
//!
//! For deterministic tests, use the `*_seeded` variants with a fixed seed.

use mixtape_domain::constants::CATALOG_ID_LENGTH;
use rand::distributions::Alphanumeric;
use rand::{Rng, SeedableRng};
use serde_json::{json, Value};

/// Generate a random, well-formed catalog id
///
/// **Note:** This uses a non-deterministic RNG. For deterministic tests,
/// use [`random_catalog_id_seeded`] instead.
///
/// # Examples
///
/// ```
/// use mixtape_common::testing::fixtures::random_catalog_id;
/// use mixtape_common::validation::is_valid_catalog_id;
///
/// assert!(is_valid_catalog_id(&random_catalog_id()));
/// ```
pub fn random_catalog_id() -> String {
    rand::thread_rng().sample_iter(&Alphanumeric).take(CATALOG_ID_LENGTH).map(char::from).collect()
}

/// Generate a catalog id from a seed (deterministic)
///
/// # Examples
///
/// ```
/// use mixtape_common::testing::fixtures::random_catalog_id_seeded;
///
/// assert_eq!(random_catalog_id_seeded(42), random_catalog_id_seeded(42));
/// ```
pub fn random_catalog_id_seeded(seed: u64) -> String {
    let rng = rand::rngs::StdRng::seed_from_u64(seed);
    rng.sample_iter(&Alphanumeric).take(CATALOG_ID_LENGTH).map(char::from).collect()
}

/// Minimal track object as returned by `GET /tracks/{id}`
pub fn track_json(id: &str, name: &str) -> Value {
    json!({
        "id": id,
        "name": name,
        "type": "track",
        "uri": format!("spotify:track:{id}"),
        "duration_ms": 215_000,
        "explicit": false,
        "popularity": 57,
        "artists": [{ "id": random_catalog_id_seeded(7), "name": "Fixture Artist" }],
        "album": { "id": random_catalog_id_seeded(11), "name": "Fixture Album" }
    })
}

/// Catalog API error envelope
pub fn catalog_error_body(status: u16, message: &str) -> Value {
    json!({ "error": { "status": status, "message": message } })
}

/// OAuth endpoint error envelope
pub fn oauth_error_body(error: &str, description: &str) -> Value {
    json!({ "error": error, "error_description": description })
}

/// Token endpoint success body
pub fn token_body(access_token: &str, expires_in: i64) -> Value {
    json!({ "access_token": access_token, "token_type": "Bearer", "expires_in": expires_in })
}
