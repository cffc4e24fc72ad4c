//! Route distance index: cumulative distances and candidate stops.

use std::collections::HashMap;
use std::ops::Range;

use crate::catalog::CatalogSnapshot;
use crate::domain::{CandidateStop, RawRoute, RoutePoint};

use super::matcher::CandidateMatcher;

/// Polyline vertices with cumulative distances, scaled so that the last
/// vertex sits exactly at the route's reported total distance.
pub fn cumulative_distances(route: &RawRoute) -> Vec<RoutePoint> {
    let total = route.total_distance_miles();
    let points = route.points();

    let mut prefix = Vec::with_capacity(points.len());
    let mut sum = 0.0;
    prefix.push(0.0);
    for leg in route.leg_distances() {
        sum += leg;
        prefix.push(sum);
    }

    let scale = if sum > 0.0 { total / sum } else { 0.0 };
    let mut distances: Vec<f64> = prefix.iter().map(|d| (d * scale).min(total)).collect();
    if let Some(last) = distances.last_mut() {
        if points.len() > 1 {
            *last = total;
        }
    }

    points
        .iter()
        .zip(distances)
        .map(|(coordinate, distance_from_start)| RoutePoint {
            coordinate: *coordinate,
            distance_from_start,
        })
        .collect()
}

/// Candidate fuel stops along one route.
///
/// Candidates are ordered by distance from start, then price, then station
/// identifier, and all lie strictly between the start and the destination.
#[derive(Debug, Clone)]
pub struct RouteDistanceIndex {
    points: Vec<RoutePoint>,
    total_distance: f64,
    candidates: Vec<CandidateStop>,
}

impl RouteDistanceIndex {
    /// Index a route against a catalog snapshot.
    pub fn new<M: CandidateMatcher>(
        route: &RawRoute,
        snapshot: &CatalogSnapshot,
        proximity_miles: f64,
        matcher: &M,
    ) -> Self {
        let points = cumulative_distances(route);
        let total_distance = route.total_distance_miles();

        let matches = matcher.match_stations(route.points(), snapshot, proximity_miles);

        // Stations at identical coordinates collapse to the cheapest one.
        let mut by_location: HashMap<(u64, u64), CandidateStop> = HashMap::new();
        for m in matches {
            let (Some(location), Some(price)) = (m.station.location, m.station.price) else {
                continue;
            };
            let distance_from_start = points[m.vertex].distance_from_start;
            if distance_from_start <= 0.0 || distance_from_start >= total_distance {
                continue;
            }

            let candidate = CandidateStop {
                station_id: m.station.id.clone(),
                name: m.station.name.clone(),
                location,
                price,
                distance_from_start,
                offset_miles: m.offset_miles,
            };
            let key = (location.lat().to_bits(), location.lon().to_bits());
            by_location
                .entry(key)
                .and_modify(|current| {
                    let cheaper = candidate.price < current.price
                        || (candidate.price == current.price
                            && candidate.station_id < current.station_id);
                    if cheaper {
                        *current = candidate.clone();
                    }
                })
                .or_insert(candidate);
        }

        let mut candidates: Vec<CandidateStop> = by_location.into_values().collect();
        candidates.sort_by(|a, b| {
            a.distance_from_start
                .total_cmp(&b.distance_from_start)
                .then(a.price.total_cmp(&b.price))
                .then_with(|| a.station_id.cmp(&b.station_id))
        });

        Self {
            points,
            total_distance,
            candidates,
        }
    }

    pub fn points(&self) -> &[RoutePoint] {
        &self.points
    }

    /// Route length in miles.
    pub fn total_distance(&self) -> f64 {
        self.total_distance
    }

    /// All candidates, ordered by distance then price.
    pub fn candidates(&self) -> &[CandidateStop] {
        &self.candidates
    }

    /// Candidates with distance from start in `(window_start, window_end]`.
    pub fn stations_within(&self, window_start: f64, window_end: f64) -> &[CandidateStop] {
        &self.candidates[window(&self.candidates, window_start, window_end)]
    }
}

/// Index range of the candidates in `(window_start, window_end]`.
///
/// `candidates` must be ordered by distance from start. An inverted window
/// is empty.
pub fn window(candidates: &[CandidateStop], window_start: f64, window_end: f64) -> Range<usize> {
    let lo = candidates.partition_point(|c| c.distance_from_start <= window_start);
    let hi = candidates.partition_point(|c| c.distance_from_start <= window_end);
    lo..hi.max(lo)
}
