//! Environment-driven application configuration.
//!
//! Values come from process environment variables, after an optional
//! `.env` file has been loaded. Anything not set falls back to the
//! defaults of the component it configures.

use std::net::{Ipv4Addr, SocketAddr, SocketAddrV4};
use std::path::PathBuf;
use std::str::FromStr;

use crate::cache::CacheConfig;
use crate::enrich::EnrichConfig;
use crate::geocode::NominatimConfig;
use crate::planner::{
    DEFAULT_FUEL_ECONOMY_MPG, DEFAULT_PROXIMITY_MILES, DEFAULT_RANGE_MILES, InvalidPlannerConfig,
    OptimizerStrategy, PlannerConfig,
};
use crate::routing::OrsConfig;

/// Address the server binds when `BIND_ADDR` is unset.
pub const DEFAULT_BIND_ADDR: SocketAddr =
    SocketAddr::V4(SocketAddrV4::new(Ipv4Addr::LOCALHOST, 3000));

/// Catalog file used when `CATALOG_PATH` is unset.
pub const DEFAULT_CATALOG_PATH: &str = "stations.json";

/// User-Agent sent to Nominatim when `NOMINATIM_USER_AGENT` is unset.
pub const DEFAULT_USER_AGENT: &str = concat!("fuel-server/", env!("CARGO_PKG_VERSION"));

/// Error loading configuration.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ConfigError {
    /// A variable is set but cannot be parsed
    #[error("invalid value {value:?} for {name}: {reason}")]
    Invalid {
        name: &'static str,
        value: String,
        reason: String,
    },

    /// Vehicle settings are out of range
    #[error(transparent)]
    Planner(#[from] InvalidPlannerConfig),
}

/// Complete application configuration.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub bind_addr: SocketAddr,
    pub catalog_path: PathBuf,
    pub ors: OrsConfig,
    pub nominatim: NominatimConfig,
    /// Replaces Nominatim with a JSON fixture of address to `[lat, lon]`
    pub geocoder_fixture: Option<PathBuf>,
    pub planner: PlannerConfig,
    pub enrich: EnrichConfig,
    pub cache: CacheConfig,
}

impl AppConfig {
    /// Load a `.env` file if present, then read the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();
        Self::from_env_with(|name| std::env::var(name).ok())
    }

    /// Read configuration from a custom variable lookup.
    pub fn from_env_with(env: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let lookup = |name: &str| env(name).filter(|v| !v.trim().is_empty());

        let bind_addr = parse_or(&lookup, "BIND_ADDR", DEFAULT_BIND_ADDR)?;
        let catalog_path = lookup("CATALOG_PATH")
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_CATALOG_PATH));

        let mut ors = OrsConfig::new(lookup("ORS_API_KEY").unwrap_or_default());
        if let Some(url) = lookup("ORS_BASE_URL") {
            ors = ors.with_base_url(url);
        }

        let user_agent =
            lookup("NOMINATIM_USER_AGENT").unwrap_or_else(|| DEFAULT_USER_AGENT.to_string());
        let mut nominatim = NominatimConfig::new(user_agent);
        if let Some(url) = lookup("NOMINATIM_BASE_URL") {
            nominatim = nominatim.with_base_url(url);
        }

        let range = parse_or(&lookup, "VEHICLE_RANGE_MILES", DEFAULT_RANGE_MILES)?;
        let mpg = parse_or(&lookup, "FUEL_ECONOMY_MPG", DEFAULT_FUEL_ECONOMY_MPG)?;
        let proximity = parse_or(&lookup, "PROXIMITY_MILES", DEFAULT_PROXIMITY_MILES)?;
        let strategy = parse_or(&lookup, "OPTIMIZER_STRATEGY", OptimizerStrategy::default())?;
        let planner = PlannerConfig::new(range, mpg, proximity)?.with_strategy(strategy);

        Ok(Self {
            bind_addr,
            catalog_path,
            ors,
            nominatim,
            geocoder_fixture: lookup("GEOCODER_FIXTURE").map(PathBuf::from),
            planner,
            enrich: EnrichConfig::default(),
            cache: CacheConfig::default(),
        })
    }
}

/// Parse a variable, or use `default` when it is unset.
fn parse_or<T>(
    lookup: &impl Fn(&str) -> Option<String>,
    name: &'static str,
    default: T,
) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    let Some(value) = lookup(name) else {
        return Ok(default);
    };
    value.trim().parse().map_err(|e: T::Err| ConfigError::Invalid {
        name,
        reason: e.to_string(),
        value,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn load(vars: &[(&str, &str)]) -> Result<AppConfig, ConfigError> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        AppConfig::from_env_with(|name| vars.get(name).cloned())
    }

    #[test]
    fn defaults_when_unset() {
        let config = load(&[]).unwrap();

        assert_eq!(config.bind_addr, "127.0.0.1:3000".parse::<SocketAddr>().unwrap());
        assert_eq!(config.catalog_path, PathBuf::from("stations.json"));
        assert_eq!(config.ors.api_key, "");
        assert_eq!(config.ors.base_url, "https://api.openrouteservice.org");
        assert!(config.nominatim.user_agent.starts_with("fuel-server/"));
        assert_eq!(config.geocoder_fixture, None);
        assert_eq!(config.planner, PlannerConfig::default());
    }

    #[test]
    fn reads_overrides() {
        let config = load(&[
            ("BIND_ADDR", "0.0.0.0:8080"),
            ("CATALOG_PATH", "/var/lib/fuel/stations.json"),
            ("ORS_API_KEY", "secret"),
            ("ORS_BASE_URL", "http://localhost:8082/ors"),
            ("NOMINATIM_USER_AGENT", "acme-fleet/2.0 (ops@acme.test)"),
            ("NOMINATIM_BASE_URL", "http://localhost:7070"),
            ("GEOCODER_FIXTURE", "fixtures/geocodes.json"),
            ("VEHICLE_RANGE_MILES", "300"),
            ("FUEL_ECONOMY_MPG", "6.5"),
            ("PROXIMITY_MILES", "2"),
            ("OPTIMIZER_STRATEGY", "greedy"),
        ])
        .unwrap();

        assert_eq!(config.bind_addr.port(), 8080);
        assert_eq!(config.catalog_path, PathBuf::from("/var/lib/fuel/stations.json"));
        assert_eq!(config.ors.api_key, "secret");
        assert_eq!(config.ors.base_url, "http://localhost:8082/ors");
        assert_eq!(config.nominatim.user_agent, "acme-fleet/2.0 (ops@acme.test)");
        assert_eq!(config.nominatim.base_url, "http://localhost:7070");
        assert_eq!(config.geocoder_fixture, Some(PathBuf::from("fixtures/geocodes.json")));
        assert_eq!(config.planner.range_miles(), 300.0);
        assert_eq!(config.planner.fuel_economy_mpg(), 6.5);
        assert_eq!(config.planner.proximity_miles(), 2.0);
        assert_eq!(config.planner.strategy(), OptimizerStrategy::Greedy);
    }

    #[test]
    fn blank_values_are_unset() {
        let config = load(&[("VEHICLE_RANGE_MILES", "  "), ("CATALOG_PATH", "")]).unwrap();
        assert_eq!(config.planner.range_miles(), DEFAULT_RANGE_MILES);
        assert_eq!(config.catalog_path, PathBuf::from(DEFAULT_CATALOG_PATH));
    }

    #[test]
    fn unparsable_number_names_variable() {
        let err = load(&[("FUEL_ECONOMY_MPG", "ten")]).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { name: "FUEL_ECONOMY_MPG", .. }));
        assert!(err.to_string().contains("\"ten\""));
    }

    #[test]
    fn out_of_range_vehicle_rejected() {
        let err = load(&[("VEHICLE_RANGE_MILES", "-5")]).unwrap_err();
        assert!(matches!(err, ConfigError::Planner(_)));
    }

    #[test]
    fn bad_bind_addr_rejected() {
        let err = load(&[("BIND_ADDR", "localhost")]).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { name: "BIND_ADDR", .. }));
    }
}
