//! Gas station records.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::Coordinate;

/// Country suffix appended to every geocoding query.
const ADDRESS_COUNTRY: &str = "USA";

/// Error returned when parsing an invalid station identifier.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid station id: {reason}")]
pub struct InvalidStationId {
    reason: &'static str,
}

/// Stable identifier of a gas station (the price feed's truckstop code).
///
/// Leading and trailing whitespace is stripped; an empty identifier is
/// rejected.
///
/// # Examples
///
/// ```
/// use fuel_server::domain::StationId;
///
/// let id = StationId::parse(" 7 ").unwrap();
/// assert_eq!(id.as_str(), "7");
///
/// assert!(StationId::parse("   ").is_err());
/// ```
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct StationId(String);

impl StationId {
    /// Parse a station identifier.
    pub fn parse(s: &str) -> Result<Self, InvalidStationId> {
        let trimmed = s.trim();
        if trimmed.is_empty() {
            return Err(InvalidStationId {
                reason: "must not be empty",
            });
        }
        Ok(StationId(trimmed.to_string()))
    }

    /// Returns the identifier as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for StationId {
    type Error = InvalidStationId;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        StationId::parse(&s)
    }
}

impl From<StationId> for String {
    fn from(id: StationId) -> Self {
        id.0
    }
}

impl fmt::Debug for StationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "StationId({})", self.0)
    }
}

impl fmt::Display for StationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Geocoding state of a station's current address.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GeocodeState {
    /// Not yet resolved; a later enrichment run will try again.
    Pending,
    /// `location` holds the coordinates of the current address.
    Resolved,
    /// The geocoder reported the current address as unresolvable.
    Unresolvable,
}

/// A gas station with its latest known price.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GasStation {
    pub id: StationId,
    pub name: String,
    /// Street part of the address.
    pub address: String,
    pub city: String,
    pub state: String,
    pub rack_id: Option<String>,
    /// Retail price in USD per gallon. Unknown prices are excluded from
    /// route planning.
    pub price: Option<f64>,
    /// Resolved coordinates. Present exactly when `geocode` is `Resolved`.
    pub location: Option<Coordinate>,
    pub geocode: GeocodeState,
    pub last_updated: DateTime<Utc>,
}

impl GasStation {
    /// Address string sent to the geocoder: street, city, state and country.
    pub fn full_address(&self) -> String {
        full_address(&self.address, &self.city, &self.state)
    }

    /// Whether the station can be matched against a route and priced.
    pub fn is_route_matchable(&self) -> bool {
        self.location.is_some() && self.price.is_some()
    }
}

/// Join the non-empty address parts with the country suffix.
pub fn full_address(street: &str, city: &str, state: &str) -> String {
    [street.trim(), city.trim(), state.trim(), ADDRESS_COUNTRY]
        .into_iter()
        .filter(|part| !part.is_empty())
        .collect::<Vec<_>>()
        .join(", ")
}
