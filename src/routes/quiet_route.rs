//! Quiet-route scoring endpoints.
//!
//! `POST /route/quiet` runs the full pipeline for one request: fetch a
//! walking route from the directions provider (or fall back to the
//! straight line), fetch the spot catalog (or fall back to an empty
//! one), sample quietness along the polyline, aggregate, classify the
//! presentation tier, and report nearby quiet spots. Scoring always
//! produces an answer; upstream failures only degrade precision.
//!
//! `GET /route/latest` returns the most recently published descriptor.
//! Publication goes through the superseding-token session, so a slow
//! stale computation can never replace a fresher result.

use axum::{
    extract::State, http::StatusCode, response::IntoResponse, routing::get, routing::post, Json,
    Router,
};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use super::AppState;
use crate::directions::{fetch_walking_route, straight_line_fallback};
use crate::models::{Coordinate, QuietSpot, RouteDescriptor, RouteSegment};
use crate::scoring::{find_nearby_quiet_spots, score_route};
use crate::tier::classify_presentation_tier;
use crate::Config;

// ---

pub fn router() -> Router<AppState> {
    // ---
    Router::new()
        .route("/route/quiet", post(quiet_route_handler))
        .route("/route/latest", get(latest_route_handler))
}

#[derive(Debug, Deserialize)]
pub struct QuietRouteRequest {
    // ---
    pub start: Coordinate,
    pub end: Coordinate,
    #[serde(default)]
    pub waypoints: Vec<Coordinate>,
}

#[derive(Serialize)]
struct QuietRouteResponse {
    // ---
    route: RouteDescriptor,
    /// Per-segment scores, in route order, for consumers that render
    /// the polyline piecewise.
    segments: Vec<RouteSegment>,
    nearby_spots: Vec<QuietSpot>,
    /// True when a newer request superseded this one before it could
    /// publish; the caller should prefer the fresher result.
    superseded: bool,
}

async fn quiet_route_handler(
    State(state): State<AppState>,
    Json(request): Json<QuietRouteRequest>,
) -> impl IntoResponse {
    // ---
    info!(
        "POST /route/quiet - ({:.4},{:.4}) -> ({:.4},{:.4}), {} waypoints",
        request.start.lat,
        request.start.lng,
        request.end.lat,
        request.end.lng,
        request.waypoints.len()
    );

    if let Err(message) = validate_request(&request) {
        return (StatusCode::BAD_REQUEST, Json(message)).into_response();
    }

    let token = state.session.begin();

    // Step 1: walking route from the provider, or the straight line.
    let (provider_route, fallback) = match fetch_walking_route(
        &state.http,
        &state.config,
        request.start,
        request.end,
        &request.waypoints,
    )
    .await
    {
        Ok(route) => (route, false),
        Err(e) => {
            warn!("Directions provider failed, using straight-line fallback: {}", e);
            (straight_line_fallback(request.start, request.end), true)
        }
    };

    // Step 2: spot catalog; an empty catalog just means ambient scores.
    let spots = match fetch_spot_catalog(&state.http, &state.config).await {
        Ok(spots) => spots,
        Err(e) => {
            warn!("Spot catalog unavailable, scoring with ambient defaults: {}", e);
            Vec::new()
        }
    };

    // Step 3: sample, segment, aggregate, classify.
    let (segments, aggregate) =
        score_route(&provider_route.points, &spots, state.config.sample_radius_m);
    let tier = classify_presentation_tier(aggregate);

    debug!(
        "Scored {} segments, aggregate {:.1}, tier {}",
        segments.len(),
        aggregate,
        tier.label()
    );

    let nearby_spots = find_nearby_quiet_spots(
        &provider_route.points,
        &spots,
        state.config.nearby_spot_distance_m,
        state.config.proximity_policy,
    );

    let descriptor = RouteDescriptor {
        id: uuid::Uuid::new_v4(),
        points: provider_route.points,
        total_distance_m: provider_route.distance_m,
        total_duration_s: provider_route.duration_s,
        aggregate_quietness: aggregate,
        tier,
        color: tier.route_color(),
        fallback,
    };

    let published = state.session.publish(token, descriptor.clone());

    let response = QuietRouteResponse {
        route: descriptor,
        segments,
        nearby_spots,
        superseded: !published,
    };

    (StatusCode::OK, Json(response)).into_response()
}

async fn latest_route_handler(State(state): State<AppState>) -> impl IntoResponse {
    // ---
    match state.session.latest() {
        Some(descriptor) => (StatusCode::OK, Json(descriptor)).into_response(),
        None => (StatusCode::NOT_FOUND, Json("No route computed yet")).into_response(),
    }
}

/// Fail fast on malformed coordinates instead of letting NaN propagate
/// through the scoring math.
fn validate_request(request: &QuietRouteRequest) -> Result<(), String> {
    // ---
    let mut all = vec![("start".to_string(), request.start), ("end".to_string(), request.end)];
    for (i, wp) in request.waypoints.iter().enumerate() {
        all.push((format!("waypoint {i}"), *wp));
    }

    for (label, coord) in all {
        if !coord.is_valid() {
            return Err(format!(
                "{} coordinate is out of range: ({}, {})",
                label, coord.lat, coord.lng
            ));
        }
    }

    Ok(())
}

/// Fetch the full spot catalog from the spots-listing service,
/// following `next_cursor` pagination up to the configured page limit.
async fn fetch_spot_catalog(
    client: &reqwest::Client,
    config: &Config,
) -> anyhow::Result<Vec<QuietSpot>> {
    // ---
    let mut all_spots = Vec::new();
    let mut cursor: Option<String> = None;
    let mut page_count = 0;

    loop {
        if page_count >= config.spots_max_pages {
            debug!(
                "Hit spot catalog page limit of {}, fetched {} spots so far",
                config.spots_max_pages,
                all_spots.len()
            );
            break;
        }
        page_count += 1;

        let url = if let Some(ref cursor) = cursor {
            format!("{}?cursor={}", config.spots_api_url, cursor)
        } else {
            config.spots_api_url.clone()
        };

        debug!("Fetching spot catalog page {} from: {}", page_count, url);

        let response: serde_json::Value = client
            .get(&url)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        if let Some(items) = response.get("results").and_then(|d| d.as_array()) {
            for (i, item) in items.iter().enumerate() {
                match serde_json::from_value::<QuietSpot>(item.clone()) {
                    Ok(spot) => all_spots.push(spot),
                    Err(e) => {
                        debug!("Skipping unparseable spot {} on page {}: {}", i, page_count, e)
                    }
                }
            }
        } else {
            debug!("Spot catalog page {} has no 'results' array", page_count);
        }

        cursor = response
            .get("next_cursor")
            .and_then(|c| c.as_str())
            .map(String::from);

        if cursor.is_none() {
            break;
        }
    }

    info!(
        "Fetched {} spots from {} catalog pages",
        all_spots.len(),
        page_count
    );
    Ok(all_spots)
}
