//! Data transfer objects for web requests and responses.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::{Coordinate, GasStation, GeocodeState, PlannedStop};
use crate::planner::TripPlan;

/// Query for a trip plan. Both ends are `longitude,latitude`.
#[derive(Debug, Deserialize)]
pub struct RouteQuery {
    pub start: String,
    pub end: String,
}

/// Query for stations around a point.
#[derive(Debug, Deserialize)]
pub struct NearQuery {
    /// `longitude,latitude`
    pub point: String,

    /// Search radius; defaults to the planner's proximity threshold
    pub radius_miles: Option<f64>,
}

/// A planned trip.
#[derive(Debug, Serialize)]
pub struct RoutePlanResponse {
    /// Route length, rounded to two decimals
    pub total_distance_miles: f64,

    /// Driving time reported by the routing service
    pub total_duration_seconds: f64,

    /// Fuel bought at stops, rounded to cents
    pub total_fuel_cost_usd: f64,

    pub total_gallons: f64,

    pub fuel_stops: Vec<FuelStopResult>,

    /// Route vertices as `[lat, lon]`
    pub route_geometry: Vec<[f64; 2]>,
}

impl RoutePlanResponse {
    pub fn from_plan(plan: &TripPlan) -> Self {
        Self {
            total_distance_miles: round2(plan.total_distance_miles),
            total_duration_seconds: plan.total_duration_seconds,
            total_fuel_cost_usd: round2(plan.total_fuel_cost),
            total_gallons: round2(plan.total_gallons),
            fuel_stops: plan.stops.iter().map(FuelStopResult::from_stop).collect(),
            route_geometry: plan.route_geometry.iter().map(lat_lon).collect(),
        }
    }
}

/// A fuel stop in a planned trip.
#[derive(Debug, Serialize)]
pub struct FuelStopResult {
    pub station_id: String,
    pub name: String,

    /// `[lat, lon]`
    pub location: [f64; 2],

    pub fuel_price_per_gallon: f64,
    pub distance_from_start_miles: f64,
    pub distance_since_last_fill_miles: f64,

    /// How far the station sits from the route
    pub offset_miles: f64,

    pub gallons: f64,
    pub cost_usd: f64,
}

impl FuelStopResult {
    pub fn from_stop(planned: &PlannedStop) -> Self {
        let stop = &planned.stop;
        Self {
            station_id: stop.station_id.to_string(),
            name: stop.name.clone(),
            location: lat_lon(&stop.location),
            fuel_price_per_gallon: stop.price,
            distance_from_start_miles: round2(stop.distance_from_start),
            distance_since_last_fill_miles: round2(planned.distance_since_last_fill),
            offset_miles: round2(stop.offset_miles),
            gallons: round2(planned.gallons),
            cost_usd: round2(planned.cost),
        }
    }
}

/// A catalog station.
#[derive(Debug, Serialize)]
pub struct StationResult {
    pub id: String,
    pub name: String,
    pub address: String,
    pub city: String,
    pub state: String,
    pub rack_id: Option<String>,
    pub price: Option<f64>,

    /// `[lat, lon]`, once geocoded
    pub location: Option<[f64; 2]>,

    pub geocode: GeocodeState,
    pub last_updated: DateTime<Utc>,
}

impl From<&GasStation> for StationResult {
    fn from(station: &GasStation) -> Self {
        Self {
            id: station.id.to_string(),
            name: station.name.clone(),
            address: station.address.clone(),
            city: station.city.clone(),
            state: station.state.clone(),
            rack_id: station.rack_id.clone(),
            price: station.price,
            location: station.location.as_ref().map(lat_lon),
            geocode: station.geocode,
            last_updated: station.last_updated,
        }
    }
}

/// A station near a queried point.
#[derive(Debug, Serialize)]
pub struct NearbyStation {
    #[serde(flatten)]
    pub station: StationResult,
    pub distance_miles: f64,
}

/// Stations around a point, nearest first.
#[derive(Debug, Serialize)]
pub struct NearResponse {
    pub stations: Vec<NearbyStation>,
}

/// Error response body.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub code: &'static str,
}

fn lat_lon(c: &Coordinate) -> [f64; 2] {
    [c.lat(), c.lon()]
}

fn round2(x: f64) -> f64 {
    (x * 100.0).round() / 100.0
}
