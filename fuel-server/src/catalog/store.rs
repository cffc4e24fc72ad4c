//! Shared, thread-safe station catalog.

use std::collections::HashMap;
use std::collections::hash_map::Entry;
use std::sync::Arc;

use chrono::Utc;
use tokio::sync::RwLock;
use tracing::debug;

use crate::domain::{Coordinate, GasStation, GeocodeState, StationId};

use super::error::CatalogError;
use super::file::CatalogFile;
use super::snapshot::CatalogSnapshot;

/// Mutable station fields supplied by an ingestion run.
#[derive(Debug, Clone, PartialEq)]
pub struct StationUpdate {
    pub id: StationId,
    pub name: String,
    pub address: String,
    pub city: String,
    pub state: String,
    pub rack_id: Option<String>,
    pub price: Option<f64>,
}

/// What an upsert did to the stored record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpsertChange {
    /// A new station was inserted.
    Created,
    /// At least one field of an existing station changed.
    Updated,
    /// The update matched the stored record exactly.
    Unchanged,
}

/// Result of an upsert: the stored record after the write.
#[derive(Debug, Clone, PartialEq)]
pub struct UpsertOutcome {
    pub station: GasStation,
    pub change: UpsertChange,
}

/// Thread-safe station catalog keyed by station identifier.
///
/// Cloning the catalog yields another handle to the same stations. Every
/// write happens under a single lock acquisition, so readers never observe
/// a partially updated station.
#[derive(Clone, Default)]
pub struct StationCatalog {
    inner: Arc<RwLock<HashMap<StationId, GasStation>>>,
    file: Option<CatalogFile>,
}

impl StationCatalog {
    /// Create an empty, memory-only catalog.
    pub fn new() -> Self {
        Self::default()
    }

    /// Open a catalog backed by a JSON file, loading any existing stations.
    pub fn open(file: CatalogFile) -> Result<Self, CatalogError> {
        let stations = file.load()?;
        let map = stations.into_iter().map(|s| (s.id.clone(), s)).collect();

        Ok(Self {
            inner: Arc::new(RwLock::new(map)),
            file: Some(file),
        })
    }

    /// Insert a station, or overwrite the mutable fields of an existing one.
    ///
    /// Changing the address clears the stored location and returns the
    /// station to `GeocodeState::Pending`. The timestamp only moves when a
    /// field actually changes.
    pub async fn upsert(&self, update: StationUpdate) -> UpsertOutcome {
        let mut guard = self.inner.write().await;
        let now = Utc::now();

        let existing = match guard.entry(update.id.clone()) {
            Entry::Vacant(slot) => {
                let station = GasStation {
                    id: update.id,
                    name: update.name,
                    address: update.address,
                    city: update.city,
                    state: update.state,
                    rack_id: update.rack_id,
                    price: update.price,
                    location: None,
                    geocode: GeocodeState::Pending,
                    last_updated: now,
                };
                slot.insert(station.clone());
                return UpsertOutcome {
                    station,
                    change: UpsertChange::Created,
                };
            }
            Entry::Occupied(slot) => slot.into_mut(),
        };

        let address_changed = existing.address != update.address
            || existing.city != update.city
            || existing.state != update.state;
        let changed = address_changed
            || existing.name != update.name
            || existing.rack_id != update.rack_id
            || existing.price != update.price;

        if !changed {
            return UpsertOutcome {
                station: existing.clone(),
                change: UpsertChange::Unchanged,
            };
        }

        if address_changed {
            debug!(station = %existing.id, "address changed, clearing location");
            existing.location = None;
            existing.geocode = GeocodeState::Pending;
        }
        existing.name = update.name;
        existing.address = update.address;
        existing.city = update.city;
        existing.state = update.state;
        existing.rack_id = update.rack_id;
        existing.price = update.price;
        existing.last_updated = now;

        UpsertOutcome {
            station: existing.clone(),
            change: UpsertChange::Updated,
        }
    }

    /// Store the geocoded location for a station.
    ///
    /// `for_address` is the full address that was geocoded. If the stored
    /// address has changed since, the location is discarded and `Ok(false)`
    /// is returned.
    pub async fn set_location(
        &self,
        id: &StationId,
        for_address: &str,
        location: Coordinate,
    ) -> Result<bool, CatalogError> {
        let mut guard = self.inner.write().await;
        let station = guard
            .get_mut(id)
            .ok_or_else(|| CatalogError::NotFound(id.clone()))?;

        if station.full_address() != for_address {
            return Ok(false);
        }

        station.location = Some(location);
        station.geocode = GeocodeState::Resolved;
        station.last_updated = Utc::now();
        Ok(true)
    }

    /// Record that the station's current address cannot be geocoded.
    ///
    /// Guarded by `for_address` in the same way as [`Self::set_location`].
    pub async fn mark_unresolvable(
        &self,
        id: &StationId,
        for_address: &str,
    ) -> Result<bool, CatalogError> {
        let mut guard = self.inner.write().await;
        let station = guard
            .get_mut(id)
            .ok_or_else(|| CatalogError::NotFound(id.clone()))?;

        if station.full_address() != for_address {
            return Ok(false);
        }

        station.location = None;
        station.geocode = GeocodeState::Unresolvable;
        station.last_updated = Utc::now();
        Ok(true)
    }

    /// Look up a station by identifier.
    pub async fn get_by_id(&self, id: &StationId) -> Option<GasStation> {
        let guard = self.inner.read().await;
        guard.get(id).cloned()
    }

    /// Get the number of stations in the catalog.
    pub async fn len(&self) -> usize {
        let guard = self.inner.read().await;
        guard.len()
    }

    /// Check if the catalog is empty.
    pub async fn is_empty(&self) -> bool {
        let guard = self.inner.read().await;
        guard.is_empty()
    }

    /// Take an immutable, spatially indexed copy of the catalog.
    pub async fn snapshot(&self) -> CatalogSnapshot {
        let stations: Vec<GasStation> = {
            let guard = self.inner.read().await;
            guard.values().cloned().collect()
        };
        CatalogSnapshot::new(stations)
    }

    /// Located stations within `radius_miles` of `point`, nearest first.
    pub async fn query_near(&self, point: &Coordinate, radius_miles: f64) -> Vec<(GasStation, f64)> {
        let snapshot = self.snapshot().await;
        snapshot
            .query_near(point, radius_miles)
            .into_iter()
            .map(|(station, distance)| (station.clone(), distance))
            .collect()
    }

    /// Write the catalog to its backing file, if it has one.
    ///
    /// Returns the number of stations written.
    pub async fn flush(&self) -> Result<usize, CatalogError> {
        let Some(file) = self.file.clone() else {
            return Ok(0);
        };

        let mut stations: Vec<GasStation> = {
            let guard = self.inner.read().await;
            guard.values().cloned().collect()
        };
        stations.sort_by(|a, b| a.id.cmp(&b.id));
        let count = stations.len();

        tokio::task::spawn_blocking(move || file.save(&stations))
            .await
            .map_err(|e| CatalogError::File {
                message: format!("catalog writer task failed: {}", e),
            })??;

        Ok(count)
    }
}
