//! Nominatim geocoding client.
//!
//! Blocking client for a Nominatim-compatible `/search` endpoint. Requests
//! always ask for up to five candidates with address details and extra
//! tags, and carry the identifying User-Agent the usage policy requires.

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use crate::core::config::GeocodingConfig;

/// Maximum number of candidates requested, enough to disambiguate
/// intersection queries.
pub const RESULT_LIMIT: u32 = 5;

/// Errors from the geocoding service.
#[derive(Debug, Error)]
pub enum GeocodeError {
    #[error("Geocoding API request timed out")]
    Timeout,

    #[error("Network error when geocoding location: {0}")]
    Transport(String),

    #[error("Geocoding API returned status {0}")]
    Status(u16),

    #[error("Failed to parse geocoding response: {0}")]
    Malformed(String),
}

/// One geocoding result.
///
/// Candidates live only for the duration of one resolution call; they are
/// never persisted. Latitude and longitude arrive as strings on the wire.
#[derive(Debug, Clone, Deserialize)]
pub struct GeocodeCandidate {
    #[serde(default)]
    pub display_name: String,

    pub lat: String,
    pub lon: String,

    /// Coarse feature type, e.g. "residential" or "tertiary".
    #[serde(rename = "type", default)]
    pub kind: Option<String>,

    /// Coarse feature class, e.g. "highway" or "amenity".
    #[serde(default)]
    pub class: Option<String>,

    /// Extra OSM tags, when available.
    #[serde(default)]
    pub extratags: Option<serde_json::Value>,
}

#[derive(Serialize)]
struct SearchQuery<'a> {
    q: &'a str,
    format: &'static str,
    limit: u32,
    addressdetails: u8,
    extratags: u8,
}

/// Client for a Nominatim-compatible geocoding API.
pub struct GeocodeClient {
    base_url: String,
    user_agent: String,
    http: reqwest::blocking::Client,
}

impl GeocodeClient {
    /// Build a client from configuration.
    pub fn new(config: &GeocodingConfig) -> Result<Self, GeocodeError> {
        let http = reqwest::blocking::Client::builder()
            .timeout(std::time::Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| GeocodeError::Transport(e.to_string()))?;

        Ok(Self {
            base_url: config.base_url.trim_end_matches('/').to_string(),
            user_agent: config.user_agent.clone(),
            http,
        })
    }

    /// Geocode a free-text location, returning the ranked candidates.
    pub fn search(&self, location: &str) -> Result<Vec<GeocodeCandidate>, GeocodeError> {
        let query = serde_urlencoded::to_string(SearchQuery {
            q: location,
            format: "json",
            limit: RESULT_LIMIT,
            addressdetails: 1,
            extratags: 1,
        })
        .map_err(|e| GeocodeError::Malformed(e.to_string()))?;

        let url = format!("{}/search?{}", self.base_url, query);
        debug!("Geocoding request: {}", url);

        let response = self
            .http
            .get(&url)
            .header(reqwest::header::USER_AGENT, &self.user_agent)
            .send()
            .map_err(|e| {
                if e.is_timeout() {
                    GeocodeError::Timeout
                } else {
                    GeocodeError::Transport(e.to_string())
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(GeocodeError::Status(status.as_u16()));
        }

        response
            .json()
            .map_err(|e| GeocodeError::Malformed(e.to_string()))
    }
}
