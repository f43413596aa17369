//! Track lookups

use mixtape_domain::{DomainError, ErrorCode};
use reqwest::Method;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::instrument;

use super::service::{Resource, ServiceAdapter};
use crate::http::RequestOptions;

const RESOURCE_TYPE: &str = "track";
const REQUIRED_FIELDS: &[&str] = &["id", "name"];

/// Reference to an artist or album embedded in a track.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogRef {
    pub id: String,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Track {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub uri: Option<String>,
    #[serde(default)]
    pub duration_ms: u64,
    #[serde(default)]
    pub explicit: bool,
    #[serde(default)]
    pub popularity: Option<u8>,
    #[serde(default)]
    pub preview_url: Option<String>,
    #[serde(default)]
    pub artists: Vec<CatalogRef>,
    #[serde(default)]
    pub album: Option<CatalogRef>,
}

/// Track endpoints on top of the shared adapter.
#[derive(Debug, Clone)]
pub struct TrackService {
    adapter: ServiceAdapter,
}

impl TrackService {
    pub fn new(adapter: ServiceAdapter) -> Self {
        Self { adapter }
    }

    /// `GET /tracks/{id}`, optionally relinked for `market`.
    ///
    /// The id and market are checked before any request is made.
    ///
    /// # Errors
    /// `INVALID_ID` / `INVALID_MARKET` for bad input, `INVALID_RESPONSE` if
    /// the body lacks `id` or `name`, otherwise whatever the transport
    /// raised, tagged with the track id.
    #[instrument(skip(self))]
    pub async fn get_track(&self, id: &str, market: Option<&str>) -> Result<Track, DomainError> {
        let id = self.adapter.require_id(id, RESOURCE_TYPE)?;
        let market = market
            .map(|code| self.adapter.require_market(code))
            .transpose()
            .map_err(|e| e.for_resource(RESOURCE_TYPE, Some(id)))?;

        let body: Value = self
            .adapter
            .request(
                Method::GET,
                &format!("/tracks/{id}"),
                RequestOptions::new().query_opt("market", market),
                Resource::new(RESOURCE_TYPE).with_id(id),
            )
            .await?;

        let body = self
            .adapter
            .validate_required_fields(body, REQUIRED_FIELDS, RESOURCE_TYPE)
            .map_err(|e| e.for_resource(RESOURCE_TYPE, Some(id)))?;

        decode_track(body, id)
    }

    /// Whether the catalog knows `id`. A 404 is an answer here, not an error.
    ///
    /// # Errors
    /// `INVALID_ID` for a malformed id, otherwise any non-404 failure.
    pub async fn track_exists(&self, id: &str) -> Result<bool, DomainError> {
        let id = self.adapter.require_id(id, RESOURCE_TYPE)?;
        let body: Option<Value> = self
            .adapter
            .request(
                Method::GET,
                &format!("/tracks/{id}"),
                RequestOptions::new().accept_status(404),
                Resource::new(RESOURCE_TYPE).with_id(id),
            )
            .await?;
        Ok(body.is_some())
    }
}

fn decode_track(body: Value, id: &str) -> Result<Track, DomainError> {
    serde_json::from_value(body).map_err(|e| {
        DomainError::new(ErrorCode::InvalidResponse, format!("Invalid track response: {e}"))
            .with_cause(e)
            .for_resource(RESOURCE_TYPE, Some(id))
    })
}
