//! Geographic coordinates.

use std::fmt;

use geo::{Distance, Haversine, Point};
use serde::{Deserialize, Serialize};

/// Meters in one statute mile.
pub const METERS_PER_MILE: f64 = 1609.34;

/// Error returned when a coordinate is out of range or malformed.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid coordinate: {reason}")]
pub struct InvalidCoordinate {
    reason: &'static str,
}

/// A validated WGS84 latitude/longitude pair.
///
/// Latitude is always within `[-90, 90]` and longitude within `[-180, 180]`.
///
/// # Examples
///
/// ```
/// use fuel_server::domain::Coordinate;
///
/// let nyc = Coordinate::new(40.7128, -74.0060).unwrap();
/// assert_eq!(nyc.lat(), 40.7128);
///
/// // Query strings put longitude first
/// let dc = Coordinate::parse_lon_lat("-77.0369,38.9072").unwrap();
/// assert_eq!(dc.lon(), -77.0369);
///
/// assert!(Coordinate::new(91.0, 0.0).is_err());
/// ```
#[derive(Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawCoordinate")]
pub struct Coordinate {
    lat: f64,
    lon: f64,
}

#[derive(Deserialize)]
struct RawCoordinate {
    lat: f64,
    lon: f64,
}

impl TryFrom<RawCoordinate> for Coordinate {
    type Error = InvalidCoordinate;

    fn try_from(raw: RawCoordinate) -> Result<Self, Self::Error> {
        Coordinate::new(raw.lat, raw.lon)
    }
}

impl Coordinate {
    /// Create a coordinate from latitude and longitude in degrees.
    pub fn new(lat: f64, lon: f64) -> Result<Self, InvalidCoordinate> {
        if !lat.is_finite() || !lon.is_finite() {
            return Err(InvalidCoordinate {
                reason: "must be finite numbers",
            });
        }
        if !(-90.0..=90.0).contains(&lat) {
            return Err(InvalidCoordinate {
                reason: "latitude must be between -90 and 90",
            });
        }
        if !(-180.0..=180.0).contains(&lon) {
            return Err(InvalidCoordinate {
                reason: "longitude must be between -180 and 180",
            });
        }
        Ok(Self { lat, lon })
    }

    /// Parse the `"longitude,latitude"` form used by routing query strings.
    pub fn parse_lon_lat(s: &str) -> Result<Self, InvalidCoordinate> {
        let (lon, lat) = s.split_once(',').ok_or(InvalidCoordinate {
            reason: "expected 'longitude,latitude'",
        })?;
        let lon: f64 = lon.trim().parse().map_err(|_| InvalidCoordinate {
            reason: "longitude is not a number",
        })?;
        let lat: f64 = lat.trim().parse().map_err(|_| InvalidCoordinate {
            reason: "latitude is not a number",
        })?;
        Self::new(lat, lon)
    }

    /// Latitude in degrees.
    pub fn lat(&self) -> f64 {
        self.lat
    }

    /// Longitude in degrees.
    pub fn lon(&self) -> f64 {
        self.lon
    }

    /// Great-circle distance to another coordinate, in miles.
    pub fn distance_miles(&self, other: &Coordinate) -> f64 {
        Haversine.distance(self.to_point(), other.to_point()) / METERS_PER_MILE
    }

    /// Convert to a `geo` point (x = longitude, y = latitude).
    pub fn to_point(&self) -> Point<f64> {
        Point::new(self.lon, self.lat)
    }
}

impl fmt::Debug for Coordinate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Coordinate({}, {})", self.lat, self.lon)
    }
}

impl fmt::Display for Coordinate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.6},{:.6}", self.lat, self.lon)
    }
}
