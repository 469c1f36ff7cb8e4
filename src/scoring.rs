//! Route segmentation and quietness scoring.
//!
//! Pure computation over an externally-supplied polyline and spot
//! catalog: sample quietness around every route point, split the route
//! into consecutive-pair segments, and reduce to one distance-weighted
//! aggregate. Every input shape produces a score; degenerate routes and
//! empty catalogs fall back to the ambient default instead of erroring.

use std::collections::HashMap;

use crate::geo::{haversine_distance, point_key};
use crate::models::{Coordinate, QuietSpot, RouteSegment};

/// Fallback quietness for route points with no rated spot nearby, and
/// for degenerate (empty or zero-length) routes. "Moderate" on the
/// 0-100 scale.
pub const AMBIENT_QUIETNESS: f64 = 60.0;

/// Default radius within which a spot contributes to a route point's
/// quietness sample.
pub const SAMPLE_RADIUS_M: f64 = 200.0;

// ---

/// How [`find_nearby_quiet_spots`] decides a spot is "near the route".
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProximityPolicy {
    /// A spot qualifies if it is within range of any route point.
    /// Thorough; cost grows with route length.
    FullRoute,
    /// A spot qualifies only near the start or end point, ignoring the
    /// path interior. Cheap, and what the interactive map used.
    EndpointsOnly,
}

/// Quietness sample for every route point, keyed by [`point_key`].
///
/// Each point averages the `quiet_rating` of all spots within
/// `sample_radius_m`; a point with no spot in range gets
/// [`AMBIENT_QUIETNESS`]. Every route point receives a value, because
/// segment scoring requires both endpoints.
pub fn collect_quietness_samples(
    route_points: &[Coordinate],
    spots: &[QuietSpot],
    sample_radius_m: f64,
) -> HashMap<String, f64> {
    // ---
    let mut samples = HashMap::with_capacity(route_points.len());

    for point in route_points {
        let mut total = 0.0;
        let mut nearby = 0u32;

        for spot in spots {
            if haversine_distance(*point, spot.coordinate()) <= sample_radius_m {
                total += f64::from(spot.quiet_rating);
                nearby += 1;
            }
        }

        let quietness = if nearby > 0 {
            total / f64::from(nearby)
        } else {
            AMBIENT_QUIETNESS
        };

        samples.insert(point_key(*point), quietness);
    }

    samples
}

/// n-1 segments for n route points; empty for a degenerate route of
/// fewer than two points. Segment score is the mean of its endpoint
/// samples; a missing sample (foreign point) counts as ambient.
pub fn build_segments(
    route_points: &[Coordinate],
    samples: &HashMap<String, f64>,
) -> Vec<RouteSegment> {
    // ---
    route_points
        .windows(2)
        .map(|pair| {
            let (start, end) = (pair[0], pair[1]);

            let start_q = samples
                .get(&point_key(start))
                .copied()
                .unwrap_or(AMBIENT_QUIETNESS);
            let end_q = samples
                .get(&point_key(end))
                .copied()
                .unwrap_or(AMBIENT_QUIETNESS);

            RouteSegment {
                start,
                end,
                distance_m: haversine_distance(start, end),
                quietness_score: (start_q + end_q) / 2.0,
            }
        })
        .collect()
}

/// Distance-weighted mean of segment scores.
///
/// Distance is the weight, not segment count: a short noisy segment
/// must not dominate an otherwise long quiet route. An empty segment
/// list or zero total distance yields [`AMBIENT_QUIETNESS`].
pub fn aggregate_quietness(segments: &[RouteSegment]) -> f64 {
    // ---
    let total_distance: f64 = segments.iter().map(|s| s.distance_m).sum();
    if segments.is_empty() || total_distance <= 0.0 {
        return AMBIENT_QUIETNESS;
    }

    let weighted: f64 = segments
        .iter()
        .map(|s| s.quietness_score * s.distance_m)
        .sum();

    weighted / total_distance
}

/// Spots within `max_distance_m` of the route, under the configured
/// proximity policy.
pub fn find_nearby_quiet_spots(
    route_points: &[Coordinate],
    spots: &[QuietSpot],
    max_distance_m: f64,
    policy: ProximityPolicy,
) -> Vec<QuietSpot> {
    // ---
    if route_points.is_empty() || spots.is_empty() {
        return Vec::new();
    }

    match policy {
        ProximityPolicy::FullRoute => spots
            .iter()
            .filter(|spot| {
                route_points
                    .iter()
                    .any(|p| haversine_distance(*p, spot.coordinate()) <= max_distance_m)
            })
            .cloned()
            .collect(),
        ProximityPolicy::EndpointsOnly => {
            let start = route_points[0];
            let end = route_points[route_points.len() - 1];

            spots
                .iter()
                .filter(|spot| {
                    let c = spot.coordinate();
                    haversine_distance(start, c) <= max_distance_m
                        || haversine_distance(end, c) <= max_distance_m
                })
                .cloned()
                .collect()
        }
    }
}

/// Sample, segment, and aggregate in one pass. Returns the segments and
/// the distance-weighted aggregate score.
pub fn score_route(
    route_points: &[Coordinate],
    spots: &[QuietSpot],
    sample_radius_m: f64,
) -> (Vec<RouteSegment>, f64) {
    // ---
    let samples = collect_quietness_samples(route_points, spots, sample_radius_m);
    let segments = build_segments(route_points, &samples);
    let aggregate = aggregate_quietness(&segments);
    (segments, aggregate)
}

#[cfg(test)]
mod tests {
    // ---
    use super::*;

    fn spot(id: &str, lat: f64, lng: f64, rating: u8) -> QuietSpot {
        // ---
        QuietSpot {
            id: id.to_string(),
            name: format!("spot {id}"),
            lat,
            lng,
            quiet_rating: rating,
            category: "park".to_string(),
            like_count: 0,
            dislike_count: 0,
        }
    }

    /// Three points going due north, ~1 km apart.
    fn straight_route() -> Vec<Coordinate> {
        // ---
        vec![
            Coordinate::new(37.5000, 127.0000),
            Coordinate::new(37.5090, 127.0000),
            Coordinate::new(37.5180, 127.0000),
        ]
    }

    #[test]
    fn samples_average_nearby_spots() {
        // ---
        let points = vec![Coordinate::new(37.5000, 127.0000)];
        let spots = vec![
            spot("a", 37.5001, 127.0001, 90),
            spot("b", 37.5002, 127.0000, 50),
            // ~2 km away, outside the radius.
            spot("c", 37.5180, 127.0000, 10),
        ];

        let samples = collect_quietness_samples(&points, &spots, SAMPLE_RADIUS_M);
        let q = samples[&point_key(points[0])];
        assert!((q - 70.0).abs() < 1e-9, "got {q}");
    }

    #[test]
    fn empty_catalog_falls_back_to_ambient_everywhere() {
        // ---
        let points = straight_route();
        let (segments, aggregate) = score_route(&points, &[], SAMPLE_RADIUS_M);

        assert_eq!(segments.len(), 2);
        for segment in &segments {
            assert_eq!(segment.quietness_score, AMBIENT_QUIETNESS);
        }
        assert_eq!(aggregate, AMBIENT_QUIETNESS);
    }

    #[test]
    fn three_spot_scenario_scores_moderate() {
        // ---
        // One spot at each route point, rated 90 / 50 / 10. Segment
        // scores are the endpoint means (70 and 30); equal segment
        // lengths make the weighted aggregate ~50.
        let points = straight_route();
        let spots = vec![
            spot("a", points[0].lat, points[0].lng, 90),
            spot("b", points[1].lat, points[1].lng, 50),
            spot("c", points[2].lat, points[2].lng, 10),
        ];

        let (segments, aggregate) = score_route(&points, &spots, SAMPLE_RADIUS_M);

        assert_eq!(segments.len(), 2);
        assert!((segments[0].quietness_score - 70.0).abs() < 1e-6);
        assert!((segments[1].quietness_score - 30.0).abs() < 1e-6);
        assert!((aggregate - 50.0).abs() < 0.5, "got {aggregate}");
    }

    #[test]
    fn single_point_route_has_no_segments_and_ambient_aggregate() {
        // ---
        let points = vec![Coordinate::new(37.5, 127.0)];
        let (segments, aggregate) = score_route(&points, &[], SAMPLE_RADIUS_M);

        assert!(segments.is_empty());
        assert_eq!(aggregate, AMBIENT_QUIETNESS);
    }

    #[test]
    fn zero_length_route_does_not_divide_by_zero() {
        // ---
        let p = Coordinate::new(37.5, 127.0);
        let (segments, aggregate) = score_route(&[p, p], &[], SAMPLE_RADIUS_M);

        assert_eq!(segments.len(), 1);
        assert_eq!(segments[0].distance_m, 0.0);
        assert_eq!(aggregate, AMBIENT_QUIETNESS);
        assert!(aggregate.is_finite());
    }

    #[test]
    fn aggregate_stays_within_segment_score_bounds() {
        // ---
        let points = straight_route();
        let spots = vec![
            spot("a", points[0].lat, points[0].lng, 95),
            spot("c", points[2].lat, points[2].lng, 5),
        ];

        let (segments, aggregate) = score_route(&points, &spots, SAMPLE_RADIUS_M);
        let min = segments
            .iter()
            .map(|s| s.quietness_score)
            .fold(f64::INFINITY, f64::min);
        let max = segments
            .iter()
            .map(|s| s.quietness_score)
            .fold(f64::NEG_INFINITY, f64::max);

        assert!(aggregate >= min && aggregate <= max);
    }

    #[test]
    fn distance_weighting_favors_the_long_segment() {
        // ---
        // Quiet 2 km leg followed by a noisy 200 m leg: the aggregate
        // must sit near the long quiet leg, not the midpoint.
        let segments = vec![
            RouteSegment {
                start: Coordinate::new(37.50, 127.0),
                end: Coordinate::new(37.52, 127.0),
                distance_m: 2_000.0,
                quietness_score: 90.0,
            },
            RouteSegment {
                start: Coordinate::new(37.52, 127.0),
                end: Coordinate::new(37.521, 127.0),
                distance_m: 200.0,
                quietness_score: 10.0,
            },
        ];

        let aggregate = aggregate_quietness(&segments);
        assert!((aggregate - 82.7).abs() < 0.1, "got {aggregate}");
    }

    #[test]
    fn endpoint_policy_ignores_interior_spots() {
        // ---
        let points = straight_route();
        let interior = spot("mid", points[1].lat, points[1].lng, 80);
        let near_start = spot("start", points[0].lat, points[0].lng, 80);
        let catalog = vec![interior, near_start];

        let endpoints =
            find_nearby_quiet_spots(&points, &catalog, 300.0, ProximityPolicy::EndpointsOnly);
        let full = find_nearby_quiet_spots(&points, &catalog, 300.0, ProximityPolicy::FullRoute);

        let endpoint_ids: Vec<_> = endpoints.iter().map(|s| s.id.as_str()).collect();
        let full_ids: Vec<_> = full.iter().map(|s| s.id.as_str()).collect();
        assert_eq!(endpoint_ids, ["start"]);
        assert_eq!(full_ids, ["mid", "start"]);
    }

    #[test]
    fn empty_inputs_yield_no_nearby_spots() {
        // ---
        let points = straight_route();
        assert!(find_nearby_quiet_spots(&[], &[], 300.0, ProximityPolicy::FullRoute).is_empty());
        assert!(
            find_nearby_quiet_spots(&points, &[], 300.0, ProximityPolicy::EndpointsOnly)
                .is_empty()
        );
    }
}
