//! Station-to-route matching strategies.
//!
//! A station matches a route when its nearest polyline vertex lies within
//! the proximity threshold. Both strategies return the same matches: the
//! linear scan is the reference, the spatial variant asks the catalog's
//! R-tree for stations near each vertex instead.

use std::collections::BTreeMap;

use crate::catalog::CatalogSnapshot;
use crate::domain::{Coordinate, GasStation, StationId};

/// A station paired with its nearest route vertex.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VertexMatch<'a> {
    pub station: &'a GasStation,
    /// Index into the polyline.
    pub vertex: usize,
    /// Great-circle distance from the station to that vertex, in miles.
    pub offset_miles: f64,
}

/// Strategy for finding stations near a polyline.
///
/// Implementations consider only stations that are route-matchable (located
/// and priced), resolve vertex ties to the earliest vertex, and return
/// matches ordered by station identifier.
pub trait CandidateMatcher {
    fn match_stations<'a>(
        &self,
        points: &[Coordinate],
        snapshot: &'a CatalogSnapshot,
        proximity_miles: f64,
    ) -> Vec<VertexMatch<'a>>;
}

/// Compare every station with every vertex.
#[derive(Debug, Clone, Copy, Default)]
pub struct LinearScan;

impl CandidateMatcher for LinearScan {
    fn match_stations<'a>(
        &self,
        points: &[Coordinate],
        snapshot: &'a CatalogSnapshot,
        proximity_miles: f64,
    ) -> Vec<VertexMatch<'a>> {
        let mut matches = Vec::new();

        for station in snapshot.stations().iter().filter(|s| s.is_route_matchable()) {
            let Some(location) = station.location else {
                continue;
            };

            let mut nearest: Option<(usize, f64)> = None;
            for (vertex, point) in points.iter().enumerate() {
                let distance = point.distance_miles(&location);
                if nearest.is_none_or(|(_, best)| distance < best) {
                    nearest = Some((vertex, distance));
                }
            }

            if let Some((vertex, offset_miles)) = nearest {
                if offset_miles <= proximity_miles {
                    matches.push(VertexMatch {
                        station,
                        vertex,
                        offset_miles,
                    });
                }
            }
        }

        matches
    }
}

/// Query the snapshot's spatial index around each vertex.
#[derive(Debug, Clone, Copy, Default)]
pub struct SpatialMatch;

impl CandidateMatcher for SpatialMatch {
    fn match_stations<'a>(
        &self,
        points: &[Coordinate],
        snapshot: &'a CatalogSnapshot,
        proximity_miles: f64,
    ) -> Vec<VertexMatch<'a>> {
        let mut best: BTreeMap<&'a StationId, VertexMatch<'a>> = BTreeMap::new();

        for (vertex, point) in points.iter().enumerate() {
            for (station, distance) in snapshot.query_near(point, proximity_miles) {
                if !station.is_route_matchable() {
                    continue;
                }
                let candidate = VertexMatch {
                    station,
                    vertex,
                    offset_miles: distance,
                };
                best.entry(&station.id)
                    .and_modify(|current| {
                        if distance < current.offset_miles {
                            *current = candidate;
                        }
                    })
                    .or_insert(candidate);
            }
        }

        best.into_values().collect()
    }
}
