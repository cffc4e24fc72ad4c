//! Vehicle and planning configuration.

use std::fmt;
use std::str::FromStr;
use std::time::Duration;

/// Default vehicle range on a full tank, in miles.
pub const DEFAULT_RANGE_MILES: f64 = 500.0;

/// Default fuel economy, in miles per gallon.
pub const DEFAULT_FUEL_ECONOMY_MPG: f64 = 10.0;

/// Default maximum distance between a station and the route, in miles.
pub const DEFAULT_PROXIMITY_MILES: f64 = 5.0;

/// Default time allowed for the routing service to answer.
pub const DEFAULT_ROUTE_TIMEOUT: Duration = Duration::from_secs(15);

/// How fuel stops are chosen among the candidates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OptimizerStrategy {
    /// Cheapest reachable stop with one-step lookahead, repeated until the
    /// destination is in range.
    Greedy,
    /// Exact minimum-cost stop sequence.
    #[default]
    MinCost,
}

impl FromStr for OptimizerStrategy {
    type Err = InvalidPlannerConfig;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "greedy" => Ok(Self::Greedy),
            "min_cost" | "min-cost" | "mincost" => Ok(Self::MinCost),
            _ => Err(InvalidPlannerConfig {
                reason: "strategy must be 'greedy' or 'min_cost'",
            }),
        }
    }
}

impl fmt::Display for OptimizerStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Greedy => write!(f, "greedy"),
            Self::MinCost => write!(f, "min_cost"),
        }
    }
}

/// Error returned when planner settings are out of range.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid planner config: {reason}")]
pub struct InvalidPlannerConfig {
    reason: &'static str,
}

/// Configuration parameters for trip planning.
#[derive(Debug, Clone, PartialEq)]
pub struct PlannerConfig {
    range_miles: f64,
    fuel_economy_mpg: f64,
    proximity_miles: f64,
    route_timeout: Duration,
    strategy: OptimizerStrategy,
}

fn positive(value: f64) -> bool {
    value.is_finite() && value > 0.0
}

impl PlannerConfig {
    /// Create a configuration for a vehicle.
    pub fn new(
        range_miles: f64,
        fuel_economy_mpg: f64,
        proximity_miles: f64,
    ) -> Result<Self, InvalidPlannerConfig> {
        if !positive(range_miles) {
            return Err(InvalidPlannerConfig {
                reason: "range must be a positive number of miles",
            });
        }
        if !positive(fuel_economy_mpg) {
            return Err(InvalidPlannerConfig {
                reason: "fuel economy must be a positive number of miles per gallon",
            });
        }
        if !positive(proximity_miles) {
            return Err(InvalidPlannerConfig {
                reason: "proximity must be a positive number of miles",
            });
        }

        Ok(Self {
            range_miles,
            fuel_economy_mpg,
            proximity_miles,
            route_timeout: DEFAULT_ROUTE_TIMEOUT,
            strategy: OptimizerStrategy::default(),
        })
    }

    pub fn with_route_timeout(mut self, timeout: Duration) -> Self {
        self.route_timeout = timeout;
        self
    }

    pub fn with_strategy(mut self, strategy: OptimizerStrategy) -> Self {
        self.strategy = strategy;
        self
    }

    /// Maximum distance between fills, in miles.
    pub fn range_miles(&self) -> f64 {
        self.range_miles
    }

    /// Miles per gallon.
    pub fn fuel_economy_mpg(&self) -> f64 {
        self.fuel_economy_mpg
    }

    /// Maximum station-to-route distance for a candidate, in miles.
    pub fn proximity_miles(&self) -> f64 {
        self.proximity_miles
    }

    pub fn route_timeout(&self) -> Duration {
        self.route_timeout
    }

    pub fn strategy(&self) -> OptimizerStrategy {
        self.strategy
    }

    /// Tank capacity in gallons.
    pub fn tank_gallons(&self) -> f64 {
        self.range_miles / self.fuel_economy_mpg
    }
}

impl Default for PlannerConfig {
    fn default() -> Self {
        Self {
            range_miles: DEFAULT_RANGE_MILES,
            fuel_economy_mpg: DEFAULT_FUEL_ECONOMY_MPG,
            proximity_miles: DEFAULT_PROXIMITY_MILES,
            route_timeout: DEFAULT_ROUTE_TIMEOUT,
            strategy: OptimizerStrategy::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config() {
        let config = PlannerConfig::default();

        assert_eq!(config.range_miles(), 500.0);
        assert_eq!(config.fuel_economy_mpg(), 10.0);
        assert_eq!(config.proximity_miles(), 5.0);
        assert_eq!(config.route_timeout(), Duration::from_secs(15));
        assert_eq!(config.strategy(), OptimizerStrategy::MinCost);
        assert_eq!(config.tank_gallons(), 50.0);
    }

    #[test]
    fn custom_config() {
        let config = PlannerConfig::new(300.0, 6.5, 2.0)
            .unwrap()
            .with_route_timeout(Duration::from_secs(3))
            .with_strategy(OptimizerStrategy::Greedy);

        assert_eq!(config.range_miles(), 300.0);
        assert_eq!(config.fuel_economy_mpg(), 6.5);
        assert_eq!(config.proximity_miles(), 2.0);
        assert_eq!(config.route_timeout(), Duration::from_secs(3));
        assert_eq!(config.strategy(), OptimizerStrategy::Greedy);
    }

    #[test]
    fn rejects_non_positive_values() {
        assert!(PlannerConfig::new(0.0, 10.0, 5.0).is_err());
        assert!(PlannerConfig::new(500.0, -1.0, 5.0).is_err());
        assert!(PlannerConfig::new(500.0, 10.0, 0.0).is_err());
        assert!(PlannerConfig::new(f64::INFINITY, 10.0, 5.0).is_err());
        assert!(PlannerConfig::new(500.0, f64::NAN, 5.0).is_err());
    }

    #[test]
    fn strategy_parsing() {
        assert_eq!("greedy".parse::<OptimizerStrategy>(), Ok(OptimizerStrategy::Greedy));
        assert_eq!(" MIN_COST ".parse::<OptimizerStrategy>(), Ok(OptimizerStrategy::MinCost));
        assert_eq!("min-cost".parse::<OptimizerStrategy>(), Ok(OptimizerStrategy::MinCost));
        assert!("cheapest".parse::<OptimizerStrategy>().is_err());
        assert_eq!(OptimizerStrategy::MinCost.to_string(), "min_cost");
    }
}
