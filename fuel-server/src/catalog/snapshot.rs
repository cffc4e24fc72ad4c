//! Immutable catalog snapshot with a spatial index.
//!
//! Planning requests work on a snapshot so they never hold the catalog lock
//! while matching stations against a route. The R-tree stores located
//! stations as `[lon, lat]` points; radius queries search a conservative
//! bounding box and then filter by great-circle distance.

use rstar::primitives::GeomWithData;
use rstar::{AABB, RTree};

use crate::domain::{Coordinate, GasStation};

/// Lower bound on miles per degree of latitude, so bounding boxes built
/// from it always contain the true search circle.
const MIN_MILES_PER_DEGREE: f64 = 68.0;

type IndexedStation = GeomWithData<[f64; 2], usize>;

/// A point-in-time copy of the catalog.
pub struct CatalogSnapshot {
    /// Stations ordered by identifier.
    stations: Vec<GasStation>,
    tree: RTree<IndexedStation>,
}

impl CatalogSnapshot {
    /// Build a snapshot from a set of stations.
    pub fn new(mut stations: Vec<GasStation>) -> Self {
        stations.sort_by(|a, b| a.id.cmp(&b.id));

        let located = stations
            .iter()
            .enumerate()
            .filter_map(|(idx, s)| {
                s.location
                    .map(|c| IndexedStation::new([c.lon(), c.lat()], idx))
            })
            .collect();

        Self {
            stations,
            tree: RTree::bulk_load(located),
        }
    }

    /// All stations, ordered by identifier.
    pub fn stations(&self) -> &[GasStation] {
        &self.stations
    }

    pub fn len(&self) -> usize {
        self.stations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stations.is_empty()
    }

    /// Number of stations with a resolved location.
    pub fn located_count(&self) -> usize {
        self.tree.size()
    }

    /// Located stations within `radius_miles` of `point`.
    ///
    /// Returns `(station, distance_miles)` pairs, nearest first, ties broken
    /// by station identifier.
    pub fn query_near(&self, point: &Coordinate, radius_miles: f64) -> Vec<(&GasStation, f64)> {
        if !radius_miles.is_finite() || radius_miles < 0.0 {
            return Vec::new();
        }

        let envelope = search_envelope(point, radius_miles);
        let mut hits: Vec<(&GasStation, f64)> = self
            .tree
            .locate_in_envelope(&envelope)
            .filter_map(|entry| {
                let station = &self.stations[entry.data];
                let location = station.location?;
                let distance = point.distance_miles(&location);
                (distance <= radius_miles).then_some((station, distance))
            })
            .collect();

        hits.sort_by(|a, b| a.1.total_cmp(&b.1).then_with(|| a.0.id.cmp(&b.0.id)));
        hits
    }
}

/// Bounding box (in `[lon, lat]` degrees) containing every point within
/// `radius_miles` of `center`.
fn search_envelope(center: &Coordinate, radius_miles: f64) -> AABB<[f64; 2]> {
    let lat_delta = radius_miles / MIN_MILES_PER_DEGREE;
    let min_lat = (center.lat() - lat_delta).max(-90.0);
    let max_lat = (center.lat() + lat_delta).min(90.0);

    // Longitude degrees shrink towards the poles; size the box for the
    // edge nearest the pole.
    let widest_lat = min_lat.abs().max(max_lat.abs());
    let cos = widest_lat.to_radians().cos();
    let lon_delta = if cos > 1e-6 {
        radius_miles / (MIN_MILES_PER_DEGREE * cos)
    } else {
        f64::INFINITY
    };

    let (min_lon, max_lon) =
        if center.lon() - lon_delta < -180.0 || center.lon() + lon_delta > 180.0 {
            // Crosses the antimeridian (or the pole): search every longitude.
            (-180.0, 180.0)
        } else {
            (center.lon() - lon_delta, center.lon() + lon_delta)
        };

    AABB::from_corners([min_lon, min_lat], [max_lon, max_lat])
}
