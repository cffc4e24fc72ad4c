//! Fuel stop planner.
//!
//! Given a driving route and the station catalog, this module answers:
//! "where should I stop for fuel, and what will it cost?"
//!
//! The route is indexed by cumulative distance, nearby priced stations
//! become candidate stops, an optimizer picks a sequence of stops that
//! never exceeds the vehicle's range, and the cost calculator prices the
//! fuel bought at each stop.

mod config;
mod cost;
mod index;
mod matcher;
mod optimize;
mod plan;

pub use config::{
    DEFAULT_FUEL_ECONOMY_MPG, DEFAULT_PROXIMITY_MILES, DEFAULT_RANGE_MILES, DEFAULT_ROUTE_TIMEOUT,
    InvalidPlannerConfig, OptimizerStrategy, PlannerConfig,
};
pub use cost::{FuelCost, calculate_cost};
pub use index::{RouteDistanceIndex, cumulative_distances};
pub use matcher::{CandidateMatcher, LinearScan, SpatialMatch, VertexMatch};
pub use optimize::{OptimizeError, greedy, min_cost, select_stops};
pub use plan::{PlanError, TripPlan, TripPlanner, plan_route};
