//! Walking-directions provider client.
//!
//! The provider is an opaque external collaborator: it returns an
//! ordered polyline plus total distance/duration, and this module never
//! second-guesses its routing. When it is unavailable or returns an
//! unusable route, callers fall back to the two-point straight line via
//! [`straight_line_fallback`] and score that instead; provider failure
//! is never surfaced to the end user as a hard error.

use anyhow::{anyhow, Result};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::geo::polyline_length;
use crate::models::Coordinate;
use crate::Config;

/// Walking pace used to estimate duration for fallback routes: 5 km/h.
const WALKING_SECS_PER_METER: f64 = 0.72;

// ---

/// A provider-supplied (or fallback) walking route.
#[derive(Debug, Clone)]
pub struct ProviderRoute {
    // ---
    pub points: Vec<Coordinate>,
    pub distance_m: f64,
    pub duration_s: f64,
}

#[derive(Serialize)]
struct ProviderPoint {
    x: String,
    y: String,
}

impl From<Coordinate> for ProviderPoint {
    fn from(c: Coordinate) -> Self {
        // Provider convention: x is longitude, y is latitude.
        Self {
            x: c.lng.to_string(),
            y: c.lat.to_string(),
        }
    }
}

#[derive(Serialize)]
struct DirectionsRequest {
    origin: ProviderPoint,
    destination: ProviderPoint,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    waypoints: Vec<ProviderPoint>,
    priority: &'static str,
}

#[derive(Deserialize)]
struct DirectionsResponse {
    #[serde(default)]
    routes: Vec<ProviderRouteBody>,
}

#[derive(Deserialize)]
struct ProviderRouteBody {
    result_code: i32,
    #[serde(default)]
    result_msg: String,
    summary: RouteSummary,
    #[serde(default)]
    sections: Vec<RouteSection>,
}

#[derive(Deserialize)]
struct RouteSummary {
    distance: f64,
    duration: f64,
}

#[derive(Deserialize)]
struct RouteSection {
    #[serde(default)]
    roads: Vec<RouteRoad>,
}

#[derive(Deserialize)]
struct RouteRoad {
    /// Flattened `[lng, lat, lng, lat, ...]` vertex list.
    #[serde(default)]
    vertexes: Vec<f64>,
}

// ---

/// Fetch a walking route from the configured provider.
///
/// Errors here are recoverable by design; the route handler maps any
/// failure to the straight-line fallback.
pub async fn fetch_walking_route(
    client: &reqwest::Client,
    config: &Config,
    start: Coordinate,
    end: Coordinate,
    waypoints: &[Coordinate],
) -> Result<ProviderRoute> {
    // ---
    let body = DirectionsRequest {
        origin: start.into(),
        destination: end.into(),
        waypoints: waypoints.iter().copied().map(Into::into).collect(),
        priority: "RECOMMEND",
    };

    let mut request = client.post(&config.directions_api_url).json(&body);
    if let Some(key) = &config.directions_api_key {
        request = request.header("Authorization", format!("KakaoAK {key}"));
    }

    let response: DirectionsResponse = request.send().await?.error_for_status()?.json().await?;

    let route = response
        .routes
        .into_iter()
        .next()
        .ok_or_else(|| anyhow!("directions provider returned no routes"))?;

    if route.result_code != 0 {
        return Err(anyhow!(
            "directions provider rejected the request: {} ({})",
            route.result_msg,
            route.result_code
        ));
    }

    let points = extract_route_points(&route.sections);
    if points.len() < 2 {
        return Err(anyhow!("directions provider returned an empty polyline"));
    }

    debug!(
        "Provider route: {} points, {:.0} m, {:.0} s",
        points.len(),
        route.summary.distance,
        route.summary.duration
    );

    Ok(ProviderRoute {
        points,
        distance_m: route.summary.distance,
        duration_s: route.summary.duration,
    })
}

/// Flatten the provider's per-road vertex lists into one ordered
/// polyline.
fn extract_route_points(sections: &[RouteSection]) -> Vec<Coordinate> {
    // ---
    let mut points = Vec::new();

    for section in sections {
        for road in &section.roads {
            for pair in road.vertexes.chunks_exact(2) {
                points.push(Coordinate::new(pair[1], pair[0]));
            }
        }
    }

    points
}

/// Required degraded path when the provider fails: a two-point
/// straight-line route between start and end, scored exactly like a
/// provider route (one segment), with duration estimated at walking
/// pace.
pub fn straight_line_fallback(start: Coordinate, end: Coordinate) -> ProviderRoute {
    // ---
    let points = vec![start, end];
    let distance_m = polyline_length(&points);

    ProviderRoute {
        points,
        distance_m,
        duration_s: distance_m * WALKING_SECS_PER_METER,
    }
}

#[cfg(test)]
mod tests {
    // ---
    use super::*;

    #[test]
    fn vertexes_flatten_in_lng_lat_order() {
        // ---
        let body: DirectionsResponse = serde_json::from_str(
            r#"{
                "routes": [{
                    "result_code": 0,
                    "result_msg": "OK",
                    "summary": { "distance": 1200.0, "duration": 900.0 },
                    "sections": [{
                        "roads": [
                            { "vertexes": [127.0, 37.50, 127.001, 37.501] },
                            { "vertexes": [127.002, 37.502] }
                        ]
                    }]
                }]
            }"#,
        )
        .unwrap();

        let points = extract_route_points(&body.routes[0].sections);
        assert_eq!(points.len(), 3);
        assert_eq!(points[0], Coordinate::new(37.50, 127.0));
        assert_eq!(points[2], Coordinate::new(37.502, 127.002));
    }

    #[test]
    fn fallback_route_is_two_points_with_finite_duration() {
        // ---
        let start = Coordinate::new(37.5000, 127.0000);
        let end = Coordinate::new(37.5090, 127.0000);

        let route = straight_line_fallback(start, end);
        assert_eq!(route.points.len(), 2);
        assert_eq!(route.points[0], start);
        assert_eq!(route.points[1], end);
        assert!(route.distance_m > 900.0 && route.distance_m < 1_100.0);
        assert_eq!(route.distance_m, polyline_length(&route.points));
        assert!((route.duration_s - route.distance_m * WALKING_SECS_PER_METER).abs() < 1e-9);
    }

    #[test]
    fn zero_length_fallback_is_still_well_formed() {
        // ---
        let p = Coordinate::new(37.5, 127.0);
        let route = straight_line_fallback(p, p);
        assert_eq!(route.points.len(), 2);
        assert_eq!(route.distance_m, 0.0);
        assert_eq!(route.duration_s, 0.0);
    }
}
