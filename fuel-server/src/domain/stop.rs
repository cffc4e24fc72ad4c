//! Request-scoped fuel stop types.

use serde::Serialize;

use super::{Coordinate, StationId};

/// A priced, located station that lies close enough to a route to be used
/// as a fuel stop.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CandidateStop {
    pub station_id: StationId,
    pub name: String,
    pub location: Coordinate,
    /// USD per gallon.
    pub price: f64,
    /// Cumulative route distance of the nearest polyline vertex, in miles.
    pub distance_from_start: f64,
    /// Distance between the station and that vertex, in miles.
    pub offset_miles: f64,
}

/// A candidate stop chosen by the optimizer, with its purchase.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PlannedStop {
    #[serde(flatten)]
    pub stop: CandidateStop,
    /// Miles driven since the previous fill (or the start) on arrival.
    pub distance_since_last_fill: f64,
    /// Gallons bought here: the fuel consumed until the next fill or the
    /// destination.
    pub gallons: f64,
    /// `gallons * price`, in USD.
    pub cost: f64,
}
