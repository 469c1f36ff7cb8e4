//! Integrated current-state places endpoint.
//!
//! Serves the merged view the map consumes: every unexpired population
//! row, plus crowd-station rows after regional balancing. Balancing is
//! applied to the crowd rows only; population rows are area-level and
//! already one-per-dong.

use axum::{
    extract::Query, extract::State, http::StatusCode, response::IntoResponse, routing::get, Json,
    Router,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use super::AppState;
use crate::balance::balance_by_region;
use crate::models::{ClassifiedPlace, PlaceSource};

// ---

pub fn router() -> Router<AppState> {
    // ---
    Router::new().route("/places", get(handler))
}

/// Query parameters for filtering the integrated place list.
#[derive(Debug, Deserialize)]
pub struct PlacesQuery {
    region: Option<String>,
    /// Keep only rows at or below this crowd level (0..=2).
    max_crowd_level: Option<u8>,
    limit: Option<u32>,
}

#[derive(Serialize)]
struct PlacesMetadata {
    // ---
    total: usize,
    population_rows: usize,
    crowd_stations: usize,
    timestamp: DateTime<Utc>,
}

#[derive(Serialize)]
struct PlacesResponse {
    data: Vec<ClassifiedPlace>,
    metadata: PlacesMetadata,
}

async fn handler(
    Query(params): Query<PlacesQuery>,
    State(state): State<AppState>,
) -> impl IntoResponse {
    // ---
    debug!("GET /places - {:?}", params);

    let snapshot = state.store.snapshot();

    let (population, crowd): (Vec<_>, Vec<_>) = snapshot
        .into_iter()
        .partition(|place| place.source == PlaceSource::Population);

    let balanced_crowd = balance_by_region(crowd, state.config.per_region_limit);

    let population_rows = population.len();
    let crowd_stations = balanced_crowd.len();

    let data = apply_filters(
        population.into_iter().chain(balanced_crowd).collect(),
        &params,
    );

    info!(
        "GET /places - returning {} rows ({} population, {} crowd)",
        data.len(),
        population_rows,
        crowd_stations
    );

    let response = PlacesResponse {
        metadata: PlacesMetadata {
            total: data.len(),
            population_rows,
            crowd_stations,
            timestamp: Utc::now(),
        },
        data,
    };

    (StatusCode::OK, Json(response)).into_response()
}

/// Apply query filters to the integrated place list.
fn apply_filters(places: Vec<ClassifiedPlace>, params: &PlacesQuery) -> Vec<ClassifiedPlace> {
    // ---
    places
        .into_iter()
        .filter(|p| params.region.as_ref().map_or(true, |r| &p.region == r))
        .filter(|p| {
            params
                .max_crowd_level
                .map_or(true, |max| p.crowd_level.as_u8() <= max)
        })
        .take(params.limit.unwrap_or(1000) as usize)
        .collect()
}
