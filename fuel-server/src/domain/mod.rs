//! Domain types for the fuel stop planner.
//!
//! This module contains the core value types shared by the station catalog,
//! the enrichment pipeline and the route planner. Types that carry external
//! input validate it at construction time, so code that receives them can
//! trust their invariants.

mod coord;
mod route;
mod station;
mod stop;

pub use coord::{Coordinate, InvalidCoordinate, METERS_PER_MILE};
pub use route::{InvalidRoute, RawRoute, RoutePoint};
pub use station::{GasStation, GeocodeState, InvalidStationId, StationId, full_address};
pub use stop::{CandidateStop, PlannedStop};
