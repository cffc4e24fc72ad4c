//! Geocoder client adapter.
//!
//! Resolves a street address to coordinates through an external service.
//! Each call yields a [`GeocodeAttempt`] so callers can drive retries from
//! an explicit per-attempt result rather than from error types.

mod client;
mod error;
mod mock;

use std::future::Future;

use crate::domain::Coordinate;

pub use client::{NominatimClient, NominatimConfig};
pub use error::GeocodeError;
pub use mock::ScriptedGeocoder;

/// Outcome of a single geocoding request.
#[derive(Debug, Clone, PartialEq)]
pub enum GeocodeAttempt {
    /// The address resolved to a coordinate.
    Success(Coordinate),
    /// The service was unavailable, timed out or rate limited us.
    TransientFailure(String),
    /// The address cannot be resolved; retrying will not help.
    PermanentFailure(String),
}

/// Address to coordinate resolver.
pub trait Geocoder: Send + Sync {
    /// Make one geocoding request for `address`.
    fn geocode(&self, address: &str) -> impl Future<Output = GeocodeAttempt> + Send;
}

/// Geocoder selected at startup: the live Nominatim service, or a fixture
/// file for offline runs.
#[derive(Clone)]
pub enum GeocoderBackend {
    Nominatim(NominatimClient),
    Scripted(ScriptedGeocoder),
}

impl Geocoder for GeocoderBackend {
    async fn geocode(&self, address: &str) -> GeocodeAttempt {
        match self {
            GeocoderBackend::Nominatim(client) => client.geocode(address).await,
            GeocoderBackend::Scripted(scripted) => scripted.geocode(address).await,
        }
    }
}
