//! Routed polylines as returned by the routing service.

use serde::Serialize;

use super::Coordinate;

/// Error returned when a routed polyline is internally inconsistent.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid route: {reason}")]
pub struct InvalidRoute {
    reason: &'static str,
}

/// A route between two points, before any distance indexing.
///
/// `leg_distances[i]` is the distance in miles between `points[i]` and
/// `points[i + 1]`, so there is always exactly one leg fewer than points.
#[derive(Debug, Clone, PartialEq)]
pub struct RawRoute {
    points: Vec<Coordinate>,
    leg_distances: Vec<f64>,
    total_distance_miles: f64,
    total_duration_seconds: f64,
}

impl RawRoute {
    /// Create a route from vertices and explicit leg distances.
    pub fn new(
        points: Vec<Coordinate>,
        leg_distances: Vec<f64>,
        total_distance_miles: f64,
        total_duration_seconds: f64,
    ) -> Result<Self, InvalidRoute> {
        if points.is_empty() {
            return Err(InvalidRoute {
                reason: "polyline has no points",
            });
        }
        if leg_distances.len() + 1 != points.len() {
            return Err(InvalidRoute {
                reason: "leg count must be one less than point count",
            });
        }
        if leg_distances.iter().any(|d| !d.is_finite() || *d < 0.0) {
            return Err(InvalidRoute {
                reason: "leg distances must be finite and non-negative",
            });
        }
        if !total_distance_miles.is_finite() || total_distance_miles < 0.0 {
            return Err(InvalidRoute {
                reason: "total distance must be finite and non-negative",
            });
        }
        if !total_duration_seconds.is_finite() || total_duration_seconds < 0.0 {
            return Err(InvalidRoute {
                reason: "total duration must be finite and non-negative",
            });
        }

        Ok(Self {
            points,
            leg_distances,
            total_distance_miles,
            total_duration_seconds,
        })
    }

    /// Create a route whose leg distances are the great-circle lengths
    /// between consecutive vertices.
    pub fn from_polyline(
        points: Vec<Coordinate>,
        total_distance_miles: f64,
        total_duration_seconds: f64,
    ) -> Result<Self, InvalidRoute> {
        let legs = points
            .windows(2)
            .map(|pair| pair[0].distance_miles(&pair[1]))
            .collect();
        Self::new(points, legs, total_distance_miles, total_duration_seconds)
    }

    pub fn points(&self) -> &[Coordinate] {
        &self.points
    }

    pub fn leg_distances(&self) -> &[f64] {
        &self.leg_distances
    }

    /// Total driving distance reported by the routing service, in miles.
    pub fn total_distance_miles(&self) -> f64 {
        self.total_distance_miles
    }

    /// Total driving time reported by the routing service, in seconds.
    pub fn total_duration_seconds(&self) -> f64 {
        self.total_duration_seconds
    }
}

/// A polyline vertex with its cumulative distance from the route start.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct RoutePoint {
    pub coordinate: Coordinate,
    /// Miles from the first vertex along the polyline.
    pub distance_from_start: f64,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn coord(lat: f64, lon: f64) -> Coordinate {
        Coordinate::new(lat, lon).unwrap()
    }

    #[test]
    fn from_polyline_computes_legs() {
        let route = RawRoute::from_polyline(
            vec![coord(40.0, -100.0), coord(40.0, -99.0), coord(40.0, -98.0)],
            105.0,
            3600.0,
        )
        .unwrap();

        assert_eq!(route.leg_distances().len(), 2);
        // One degree of longitude at 40N is roughly 53 miles
        for leg in route.leg_distances() {
            assert!((leg - 53.0).abs() < 1.0, "got {leg}");
        }
    }

    #[test]
    fn single_point_route_is_valid() {
        let route = RawRoute::from_polyline(vec![coord(40.0, -100.0)], 0.0, 0.0).unwrap();
        assert!(route.leg_distances().is_empty());
        assert_eq!(route.total_distance_miles(), 0.0);
    }

    #[test]
    fn rejects_empty_polyline() {
        assert!(RawRoute::from_polyline(vec![], 0.0, 0.0).is_err());
    }

    #[test]
    fn rejects_mismatched_legs() {
        let err = RawRoute::new(vec![coord(0.0, 0.0), coord(0.0, 1.0)], vec![], 10.0, 0.0);
        assert!(err.is_err());
    }

    #[test]
    fn rejects_negative_values() {
        let points = vec![coord(0.0, 0.0), coord(0.0, 1.0)];
        assert!(RawRoute::new(points.clone(), vec![-1.0], 10.0, 0.0).is_err());
        assert!(RawRoute::new(points.clone(), vec![1.0], -10.0, 0.0).is_err());
        assert!(RawRoute::new(points, vec![1.0], 10.0, f64::NAN).is_err());
    }
}
