//! Fuel purchase and cost calculation.

use serde::Serialize;

use crate::domain::{CandidateStop, PlannedStop};

use super::config::PlannerConfig;

/// Purchases for a chosen stop sequence.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FuelCost {
    pub stops: Vec<PlannedStop>,
    /// USD.
    pub total_cost: f64,
    /// Gallons bought along the way; the starting tank is not included.
    pub total_gallons: f64,
}

impl FuelCost {
    /// No stops, nothing bought.
    pub fn empty() -> Self {
        Self {
            stops: Vec::new(),
            total_cost: 0.0,
            total_gallons: 0.0,
        }
    }
}

/// Price the fuel bought at each stop.
///
/// Each stop buys exactly the fuel needed to reach the next stop or the
/// destination, capped at one tank.
pub fn calculate_cost(
    stops: Vec<CandidateStop>,
    total_distance: f64,
    config: &PlannerConfig,
) -> FuelCost {
    let mpg = config.fuel_economy_mpg();
    let tank = config.tank_gallons();

    let next_fills: Vec<f64> = stops
        .iter()
        .skip(1)
        .map(|s| s.distance_from_start)
        .chain(std::iter::once(total_distance))
        .collect();

    let mut previous_fill = 0.0;
    let mut planned = Vec::with_capacity(stops.len());
    for (stop, next_fill) in stops.into_iter().zip(next_fills) {
        let here = stop.distance_from_start;
        let gallons = ((next_fill - here) / mpg).min(tank);
        let cost = gallons * stop.price;

        planned.push(PlannedStop {
            distance_since_last_fill: here - previous_fill,
            gallons,
            cost,
            stop,
        });
        previous_fill = here;
    }

    let total_cost = planned.iter().map(|s| s.cost).sum();
    let total_gallons = planned.iter().map(|s| s.gallons).sum();

    FuelCost {
        stops: planned,
        total_cost,
        total_gallons,
    }
}
