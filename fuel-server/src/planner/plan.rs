//! Trip planning: route fetch, candidate matching, stop selection, cost.

use tracing::{debug, info, warn};

use crate::catalog::{CatalogSnapshot, StationCatalog};
use crate::domain::{Coordinate, PlannedStop, RawRoute};
use crate::routing::RouteProvider;

use super::config::PlannerConfig;
use super::cost::calculate_cost;
use super::index::RouteDistanceIndex;
use super::matcher::{CandidateMatcher, SpatialMatch};
use super::optimize::{OptimizeError, select_stops};

/// Error from trip planning.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum PlanError {
    /// The routing service failed or timed out
    #[error("routing service unavailable: {0}")]
    UpstreamUnavailable(String),

    /// No stop sequence gets the vehicle to the destination
    #[error("no fuel plan reaches the destination: stuck at mile {position:.1}, range ends at mile {reach:.1}")]
    FeasibilityUnreachable { position: f64, reach: f64 },
}

impl From<OptimizeError> for PlanError {
    fn from(e: OptimizeError) -> Self {
        match e {
            OptimizeError::FeasibilityUnreachable { position, reach } => {
                PlanError::FeasibilityUnreachable { position, reach }
            }
        }
    }
}

/// A complete fuel plan for one trip.
#[derive(Debug, Clone, PartialEq)]
pub struct TripPlan {
    pub total_distance_miles: f64,
    pub total_duration_seconds: f64,
    /// USD spent at stops. The starting tank is not counted.
    pub total_fuel_cost: f64,
    pub total_gallons: f64,
    pub stops: Vec<PlannedStop>,
    /// The route as driven, without detours to stations.
    pub route_geometry: Vec<Coordinate>,
}

/// Plan fuel stops along an already-fetched route.
///
/// Pure computation over the route and a catalog snapshot.
pub fn plan_route<M: CandidateMatcher>(
    route: &RawRoute,
    snapshot: &CatalogSnapshot,
    config: &PlannerConfig,
    matcher: &M,
) -> Result<TripPlan, PlanError> {
    let index = RouteDistanceIndex::new(route, snapshot, config.proximity_miles(), matcher);
    debug!(
        stations = snapshot.len(),
        located = snapshot.located_count(),
        vertices = index.points().len(),
        candidates = index.candidates().len(),
        total_miles = index.total_distance(),
        "indexed route"
    );

    let chosen = select_stops(
        index.candidates(),
        index.total_distance(),
        config.range_miles(),
        config.strategy(),
    )?;
    let stops = chosen
        .into_iter()
        .map(|i| index.candidates()[i].clone())
        .collect();
    let fuel = calculate_cost(stops, index.total_distance(), config);

    Ok(TripPlan {
        total_distance_miles: index.total_distance(),
        total_duration_seconds: route.total_duration_seconds(),
        total_fuel_cost: fuel.total_cost,
        total_gallons: fuel.total_gallons,
        stops: fuel.stops,
        route_geometry: route.points().to_vec(),
    })
}

/// Plans trips against the shared catalog using a route provider.
pub struct TripPlanner<R> {
    routes: R,
    catalog: StationCatalog,
    config: PlannerConfig,
}

impl<R: RouteProvider> TripPlanner<R> {
    pub fn new(routes: R, catalog: StationCatalog, config: PlannerConfig) -> Self {
        Self {
            routes,
            catalog,
            config,
        }
    }

    pub fn config(&self) -> &PlannerConfig {
        &self.config
    }

    pub fn catalog(&self) -> &StationCatalog {
        &self.catalog
    }

    /// Plan a trip from `start` to `end`.
    ///
    /// The routing call is the only suspension point and is bounded by the
    /// configured timeout. It is not retried.
    pub async fn plan(&self, start: Coordinate, end: Coordinate) -> Result<TripPlan, PlanError> {
        let timeout = self.config.route_timeout();
        let route = match tokio::time::timeout(timeout, self.routes.route(start, end)).await {
            Ok(Ok(route)) => route,
            Ok(Err(e)) => {
                warn!(%start, %end, error = %e, "routing request failed");
                return Err(PlanError::UpstreamUnavailable(e.to_string()));
            }
            Err(_) => {
                warn!(%start, %end, ?timeout, "routing request timed out");
                return Err(PlanError::UpstreamUnavailable(format!(
                    "no response within {} s",
                    timeout.as_secs_f64()
                )));
            }
        };

        let snapshot = self.catalog.snapshot().await;
        let plan = plan_route(&route, &snapshot, &self.config, &SpatialMatch)?;

        info!(
            %start,
            %end,
            miles = plan.total_distance_miles,
            stops = plan.stops.len(),
            cost = plan.total_fuel_cost,
            "planned trip"
        );
        Ok(plan)
    }
}
