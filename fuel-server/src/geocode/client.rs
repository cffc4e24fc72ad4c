//! Nominatim geocoding HTTP client.
//!
//! Nominatim's usage policy requires an identifying `User-Agent` and at most
//! one request per second. This client only issues single requests; pacing
//! and retries belong to the enrichment pipeline.

use reqwest::header::{HeaderMap, HeaderValue, USER_AGENT};
use serde::Deserialize;

use crate::domain::Coordinate;

use super::error::GeocodeError;
use super::{GeocodeAttempt, Geocoder};

/// Default base URL for the public Nominatim instance.
const DEFAULT_BASE_URL: &str = "https://nominatim.openstreetmap.org";

/// Default request timeout in seconds.
const DEFAULT_TIMEOUT_SECS: u64 = 10;

/// One entry of a Nominatim search response. Coordinates arrive as strings.
#[derive(Debug, Deserialize)]
struct SearchHit {
    lat: String,
    lon: String,
}

/// Configuration for the Nominatim client.
#[derive(Debug, Clone)]
pub struct NominatimConfig {
    /// Identifying User-Agent, required by the usage policy
    pub user_agent: String,
    /// Base URL for the API
    pub base_url: String,
    /// Request timeout in seconds
    pub timeout_secs: u64,
}

impl NominatimConfig {
    /// Create a new config with the given User-Agent.
    pub fn new(user_agent: impl Into<String>) -> Self {
        Self {
            user_agent: user_agent.into(),
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout_secs: DEFAULT_TIMEOUT_SECS,
        }
    }

    /// Set a custom base URL (self-hosted instance or testing).
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }

    /// Set request timeout.
    pub fn with_timeout(mut self, secs: u64) -> Self {
        self.timeout_secs = secs;
        self
    }
}

/// Nominatim search API client.
#[derive(Debug, Clone)]
pub struct NominatimClient {
    http: reqwest::Client,
    base_url: String,
}

impl NominatimClient {
    /// Create a new Nominatim client with the given configuration.
    pub fn new(config: NominatimConfig) -> Result<Self, GeocodeError> {
        let mut headers = HeaderMap::new();

        let user_agent =
            HeaderValue::from_str(&config.user_agent).map_err(|_| GeocodeError::Api {
                status: 0,
                message: "Invalid User-Agent format".to_string(),
            })?;
        headers.insert(USER_AGENT, user_agent);

        let http = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(std::time::Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self {
            http,
            base_url: config.base_url.trim_end_matches('/').to_string(),
        })
    }

    /// Resolve an address to the coordinates of the best match.
    pub async fn lookup(&self, address: &str) -> Result<Coordinate, GeocodeError> {
        let url = format!("{}/search", self.base_url);

        let response = self
            .http
            .get(&url)
            .query(&[("q", address), ("format", "json"), ("limit", "1")])
            .send()
            .await?;

        let status = response.status();

        if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
            return Err(GeocodeError::RateLimited);
        }

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(GeocodeError::Api {
                status: status.as_u16(),
                message: body,
            });
        }

        let body = response.text().await?;
        parse_search_response(&body)
    }
}

impl Geocoder for NominatimClient {
    async fn geocode(&self, address: &str) -> GeocodeAttempt {
        match self.lookup(address).await {
            Ok(coordinate) => GeocodeAttempt::Success(coordinate),
            Err(e) if e.is_transient() => GeocodeAttempt::TransientFailure(e.to_string()),
            Err(e) => GeocodeAttempt::PermanentFailure(e.to_string()),
        }
    }
}

/// Parse a Nominatim `format=json` search body into the first hit's
/// coordinates.
fn parse_search_response(body: &str) -> Result<Coordinate, GeocodeError> {
    let hits: Vec<SearchHit> = serde_json::from_str(body).map_err(|e| GeocodeError::Json {
        message: e.to_string(),
    })?;

    let hit = hits.first().ok_or(GeocodeError::NotFound)?;

    let lat: f64 = hit.lat.parse().map_err(|_| GeocodeError::InvalidResult {
        message: format!("latitude {:?} is not a number", hit.lat),
    })?;
    let lon: f64 = hit.lon.parse().map_err(|_| GeocodeError::InvalidResult {
        message: format!("longitude {:?} is not a number", hit.lon),
    })?;

    Coordinate::new(lat, lon).map_err(|e| GeocodeError::InvalidResult {
        message: e.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_builder() {
        let config = NominatimConfig::new("fuel-planner/0.1 (ops@example.com)")
            .with_base_url("http://localhost:8080")
            .with_timeout(3);

        assert_eq!(config.user_agent, "fuel-planner/0.1 (ops@example.com)");
        assert_eq!(config.base_url, "http://localhost:8080");
        assert_eq!(config.timeout_secs, 3);
    }

    #[test]
    fn config_defaults() {
        let config = NominatimConfig::new("ua");
        assert_eq!(config.base_url, DEFAULT_BASE_URL);
        assert_eq!(config.timeout_secs, DEFAULT_TIMEOUT_SECS);
    }

    #[test]
    fn client_creation() {
        let client = NominatimClient::new(NominatimConfig::new("ua").with_base_url("http://x/"));
        assert_eq!(client.unwrap().base_url, "http://x");
    }

    #[test]
    fn invalid_user_agent_rejected() {
        assert!(NominatimClient::new(NominatimConfig::new("bad\nagent")).is_err());
    }

    #[test]
    fn parse_first_hit() {
        let body = r#"[
            {"place_id": 1, "lat": "36.5623", "lon": "-95.1560", "display_name": "Big Cabin"},
            {"place_id": 2, "lat": "0", "lon": "0"}
        ]"#;
        let c = parse_search_response(body).unwrap();
        assert_eq!(c.lat(), 36.5623);
        assert_eq!(c.lon(), -95.1560);
    }

    #[test]
    fn parse_empty_is_not_found() {
        assert!(matches!(
            parse_search_response("[]"),
            Err(GeocodeError::NotFound)
        ));
    }

    #[test]
    fn parse_bad_coordinates() {
        let body = r#"[{"lat": "north", "lon": "-95.1"}]"#;
        assert!(matches!(
            parse_search_response(body),
            Err(GeocodeError::InvalidResult { .. })
        ));

        let body = r#"[{"lat": "95.0", "lon": "-95.1"}]"#;
        assert!(matches!(
            parse_search_response(body),
            Err(GeocodeError::InvalidResult { .. })
        ));
    }

    #[test]
    fn parse_malformed_json() {
        let err = parse_search_response("<html>").unwrap_err();
        assert!(matches!(err, GeocodeError::Json { .. }));
        assert!(!err.is_transient());
    }
}
