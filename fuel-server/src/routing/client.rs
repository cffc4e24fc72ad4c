//! OpenRouteService directions client.

use std::time::Duration;

use reqwest::header::{ACCEPT, HeaderMap, HeaderValue};

use crate::domain::{Coordinate, RawRoute};

use super::RouteProvider;
use super::error::RoutingError;
use super::types::{DirectionsResponse, convert_directions};

/// Default base URL for the hosted OpenRouteService API.
const DEFAULT_BASE_URL: &str = "https://api.openrouteservice.org";

/// Default routing profile.
const DEFAULT_PROFILE: &str = "driving-car";

/// Default request timeout in seconds.
const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Configuration for the OpenRouteService client.
#[derive(Debug, Clone)]
pub struct OrsConfig {
    /// API key
    pub api_key: String,
    /// Base URL for the API
    pub base_url: String,
    /// Routing profile, e.g. `driving-car` or `driving-hgv`
    pub profile: String,
    /// Request timeout in seconds
    pub timeout_secs: u64,
}

impl OrsConfig {
    /// Create a new config with the given API key.
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            base_url: DEFAULT_BASE_URL.to_string(),
            profile: DEFAULT_PROFILE.to_string(),
            timeout_secs: DEFAULT_TIMEOUT_SECS,
        }
    }

    /// Set a custom base URL (self-hosted instance or testing).
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }

    /// Set the routing profile.
    pub fn with_profile(mut self, profile: impl Into<String>) -> Self {
        self.profile = profile.into();
        self
    }

    /// Set request timeout.
    pub fn with_timeout(mut self, secs: u64) -> Self {
        self.timeout_secs = secs;
        self
    }
}

/// OpenRouteService directions API client.
#[derive(Debug, Clone)]
pub struct OrsClient {
    http: reqwest::Client,
    api_key: String,
    directions_url: String,
}

impl OrsClient {
    /// Create a new client with the given configuration.
    pub fn new(config: OrsConfig) -> Result<Self, RoutingError> {
        let mut headers = HeaderMap::new();
        headers.insert(
            ACCEPT,
            HeaderValue::from_static("application/geo+json, application/json"),
        );

        let http = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        let directions_url = format!(
            "{}/v2/directions/{}",
            config.base_url.trim_end_matches('/'),
            config.profile
        );

        Ok(Self {
            http,
            api_key: config.api_key,
            directions_url,
        })
    }

    /// Request a driving route between two points.
    pub async fn directions(
        &self,
        start: Coordinate,
        end: Coordinate,
    ) -> Result<RawRoute, RoutingError> {
        let start = lon_lat_param(&start);
        let end = lon_lat_param(&end);

        let response = self
            .http
            .get(&self.directions_url)
            .query(&[
                ("api_key", self.api_key.as_str()),
                ("start", start.as_str()),
                ("end", end.as_str()),
            ])
            .send()
            .await?;

        let status = response.status();

        if status == reqwest::StatusCode::UNAUTHORIZED || status == reqwest::StatusCode::FORBIDDEN
        {
            return Err(RoutingError::Unauthorized);
        }

        if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
            return Err(RoutingError::RateLimited);
        }

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(RoutingError::Api {
                status: status.as_u16(),
                message: body,
            });
        }

        let body = response.text().await?;
        parse_directions(&body)
    }
}

impl RouteProvider for OrsClient {
    async fn route(&self, start: Coordinate, end: Coordinate) -> Result<RawRoute, RoutingError> {
        self.directions(start, end).await
    }
}

/// Format a coordinate the way the directions GET endpoint expects.
fn lon_lat_param(c: &Coordinate) -> String {
    format!("{},{}", c.lon(), c.lat())
}

fn parse_directions(body: &str) -> Result<RawRoute, RoutingError> {
    let response: DirectionsResponse =
        serde_json::from_str(body).map_err(|e| RoutingError::Json {
            message: e.to_string(),
        })?;
    convert_directions(response)
}
