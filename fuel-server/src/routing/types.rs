//! OpenRouteService directions response types (GeoJSON format).
//!
//! Only the fields the planner needs are modelled. Everything is optional
//! so that a structurally incomplete response turns into a descriptive
//! error instead of a generic parse failure.

use serde::Deserialize;

use crate::domain::{Coordinate, METERS_PER_MILE, RawRoute};

use super::error::RoutingError;

/// Top-level GeoJSON feature collection.
#[derive(Debug, Deserialize)]
pub struct DirectionsResponse {
    #[serde(default)]
    pub features: Vec<RouteFeature>,
}

/// One route.
#[derive(Debug, Deserialize)]
pub struct RouteFeature {
    pub geometry: Option<LineString>,
    pub properties: Option<RouteProperties>,
}

/// Route geometry as `[lon, lat]` pairs.
#[derive(Debug, Deserialize)]
pub struct LineString {
    pub coordinates: Vec<[f64; 2]>,
}

#[derive(Debug, Deserialize)]
pub struct RouteProperties {
    pub summary: Option<RouteSummary>,
}

/// Route totals. The service omits both fields for zero-length routes.
#[derive(Debug, Deserialize)]
pub struct RouteSummary {
    /// Meters.
    #[serde(default)]
    pub distance: f64,
    /// Seconds.
    #[serde(default)]
    pub duration: f64,
}

/// Convert the first route of a directions response into a `RawRoute`.
pub fn convert_directions(response: DirectionsResponse) -> Result<RawRoute, RoutingError> {
    let feature = response
        .features
        .into_iter()
        .next()
        .ok_or_else(|| RoutingError::InvalidResponse("no route features".to_string()))?;

    let geometry = feature
        .geometry
        .ok_or_else(|| RoutingError::InvalidResponse("missing route geometry".to_string()))?;
    let summary = feature
        .properties
        .and_then(|p| p.summary)
        .ok_or_else(|| RoutingError::InvalidResponse("missing route summary".to_string()))?;

    let points = geometry
        .coordinates
        .iter()
        .map(|[lon, lat]| Coordinate::new(*lat, *lon))
        .collect::<Result<Vec<_>, _>>()
        .map_err(|e| RoutingError::InvalidResponse(e.to_string()))?;

    RawRoute::from_polyline(points, summary.distance / METERS_PER_MILE, summary.duration)
        .map_err(|e| RoutingError::InvalidResponse(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(json: &str) -> Result<RawRoute, RoutingError> {
        let response: DirectionsResponse = serde_json::from_str(json).unwrap();
        convert_directions(response)
    }

    #[test]
    fn converts_geometry_and_summary() {
        let route = parse(
            r#"{
                "type": "FeatureCollection",
                "features": [{
                    "geometry": {"type": "LineString", "coordinates": [[-74.0, 40.7], [-75.0, 39.8], [-77.0, 38.9]]},
                    "properties": {"summary": {"distance": 350000, "duration": 12600}}
                }]
            }"#,
        )
        .unwrap();

        assert_eq!(route.points().len(), 3);
        assert_eq!(route.points()[0].lat(), 40.7);
        assert_eq!(route.points()[0].lon(), -74.0);
        assert_eq!(route.leg_distances().len(), 2);
        assert!((route.total_distance_miles() - 217.48).abs() < 0.01);
        assert_eq!(route.total_duration_seconds(), 12600.0);
    }

    #[test]
    fn zero_length_route_has_empty_summary() {
        let route = parse(
            r#"{"features": [{
                "geometry": {"coordinates": [[-74.0, 40.7], [-74.0, 40.7]]},
                "properties": {"summary": {}}
            }]}"#,
        )
        .unwrap();
        assert_eq!(route.total_distance_miles(), 0.0);
    }

    #[test]
    fn empty_features_rejected() {
        let err = parse(r#"{"features": []}"#).unwrap_err();
        assert!(err.to_string().contains("no route features"));
    }

    #[test]
    fn missing_geometry_rejected() {
        let err = parse(
            r#"{"features": [{"properties": {"summary": {"distance": 350000, "duration": 12600}}}]}"#,
        )
        .unwrap_err();
        assert!(err.to_string().contains("missing route geometry"));
    }

    #[test]
    fn missing_summary_rejected() {
        let err = parse(
            r#"{"features": [{"geometry": {"coordinates": [[-74.0, 40.7], [-77.0, 38.9]]}, "properties": {}}]}"#,
        )
        .unwrap_err();
        assert!(err.to_string().contains("missing route summary"));
    }

    #[test]
    fn out_of_range_vertex_rejected() {
        let err = parse(
            r#"{"features": [{
                "geometry": {"coordinates": [[-74.0, 140.7]]},
                "properties": {"summary": {"distance": 0}}
            }]}"#,
        )
        .unwrap_err();
        assert!(matches!(err, RoutingError::InvalidResponse(_)));
    }
}
