//! Scripted geocoder for testing and offline development.
//!
//! Answers are scripted per address as a queue of attempts. Addresses can
//! also be loaded from a JSON fixture mapping address to `[lat, lon]`.

use std::collections::{HashMap, VecDeque};
use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard};

use crate::domain::Coordinate;

use super::error::GeocodeError;
use super::{GeocodeAttempt, Geocoder};

#[derive(Default)]
struct ScriptState {
    /// Remaining scripted attempts per address.
    scripts: HashMap<String, VecDeque<GeocodeAttempt>>,
    /// Addresses that always resolve, consulted after the scripts.
    fixed: HashMap<String, Coordinate>,
    /// Answer once an address has no scripted attempts left.
    fallback: Option<GeocodeAttempt>,
    /// Every address requested, in order.
    calls: Vec<String>,
}

/// In-memory geocoder with scripted answers.
///
/// Scripted attempts are answered first, then fixed resolutions. Any other
/// request gets the fallback answer, which defaults to a permanent
/// "not found" failure.
#[derive(Clone, Default)]
pub struct ScriptedGeocoder {
    state: Arc<Mutex<ScriptState>>,
}

impl ScriptedGeocoder {
    /// Create a geocoder that knows no addresses.
    pub fn new() -> Self {
        Self::default()
    }

    /// Load a fixture file: a JSON object mapping address to `[lat, lon]`.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, GeocodeError> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path).map_err(|e| GeocodeError::Json {
            message: format!("failed to read {}: {}", path.display(), e),
        })?;
        let entries: HashMap<String, [f64; 2]> =
            serde_json::from_str(&json).map_err(|e| GeocodeError::Json {
                message: format!("failed to parse {}: {}", path.display(), e),
            })?;

        let geocoder = Self::new();
        for (address, [lat, lon]) in entries {
            let coordinate = Coordinate::new(lat, lon).map_err(|e| GeocodeError::InvalidResult {
                message: format!("{address}: {e}"),
            })?;
            geocoder.always_resolve(&address, coordinate);
        }
        Ok(geocoder)
    }

    /// Answer used once an address has no scripted attempts left.
    pub fn with_fallback(self, attempt: GeocodeAttempt) -> Self {
        self.lock().fallback = Some(attempt);
        self
    }

    /// Queue attempts for an address, answered in order.
    pub fn script(&self, address: &str, attempts: impl IntoIterator<Item = GeocodeAttempt>) {
        self.lock()
            .scripts
            .entry(address.to_string())
            .or_default()
            .extend(attempts);
    }

    /// Resolve an address to the same coordinate on every request.
    pub fn always_resolve(&self, address: &str, coordinate: Coordinate) {
        self.lock().fixed.insert(address.to_string(), coordinate);
    }

    /// Addresses requested so far, in order.
    pub fn calls(&self) -> Vec<String> {
        self.lock().calls.clone()
    }

    /// Number of requests made so far.
    pub fn call_count(&self) -> usize {
        self.lock().calls.len()
    }

    fn lock(&self) -> MutexGuard<'_, ScriptState> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn next_attempt(&self, address: &str) -> GeocodeAttempt {
        let mut state = self.lock();
        state.calls.push(address.to_string());

        if let Some(attempt) = state.scripts.get_mut(address).and_then(|q| q.pop_front()) {
            return attempt;
        }
        if let Some(coordinate) = state.fixed.get(address) {
            return GeocodeAttempt::Success(*coordinate);
        }

        state
            .fallback
            .clone()
            .unwrap_or_else(|| GeocodeAttempt::PermanentFailure("address not found".to_string()))
    }
}

impl Geocoder for ScriptedGeocoder {
    async fn geocode(&self, address: &str) -> GeocodeAttempt {
        self.next_attempt(address)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn coord() -> Coordinate {
        Coordinate::new(35.0, -97.0).unwrap()
    }

    #[tokio::test]
    async fn scripted_attempts_in_order() {
        let geocoder = ScriptedGeocoder::new();
        geocoder.script(
            "a",
            [
                GeocodeAttempt::TransientFailure("timeout".into()),
                GeocodeAttempt::Success(coord()),
            ],
        );

        assert!(matches!(
            geocoder.geocode("a").await,
            GeocodeAttempt::TransientFailure(_)
        ));
        assert_eq!(geocoder.geocode("a").await, GeocodeAttempt::Success(coord()));
        // Script used up: default fallback
        assert!(matches!(
            geocoder.geocode("a").await,
            GeocodeAttempt::PermanentFailure(_)
        ));
        assert_eq!(geocoder.call_count(), 3);
    }

    #[tokio::test]
    async fn fallback_applies_to_unknown_addresses() {
        let geocoder = ScriptedGeocoder::new()
            .with_fallback(GeocodeAttempt::TransientFailure("unreachable".into()));

        assert!(matches!(
            geocoder.geocode("anything").await,
            GeocodeAttempt::TransientFailure(_)
        ));
        assert_eq!(geocoder.calls(), vec!["anything".to_string()]);
    }

    #[tokio::test]
    async fn load_fixture_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("geocodes.json");
        std::fs::write(&path, r#"{"Tulsa, OK, USA": [36.15, -95.99]}"#).unwrap();

        let geocoder = ScriptedGeocoder::from_file(&path).unwrap();
        let answer = geocoder.geocode("Tulsa, OK, USA").await;
        assert_eq!(
            answer,
            GeocodeAttempt::Success(Coordinate::new(36.15, -95.99).unwrap())
        );
    }

    #[test]
    fn fixture_with_bad_coordinate_fails() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("geocodes.json");
        std::fs::write(&path, r#"{"Nowhere": [200.0, 0.0]}"#).unwrap();

        assert!(ScriptedGeocoder::from_file(&path).is_err());
    }
}
