use std::sync::Arc;

use axum::Router;

use crate::store::{PlaceStore, SystemClock};
use crate::supersede::RouteSession;
use crate::Config;

mod health;
mod places;
mod quiet_route;

// ---

/// State shared by every route handler.
#[derive(Clone)]
pub struct AppState {
    // ---
    pub store: Arc<PlaceStore<SystemClock>>,
    pub session: Arc<RouteSession>,
    pub config: Config,
    pub http: reqwest::Client,
}

pub fn router(state: AppState) -> Router {
    // ---
    Router::new()
        .merge(places::router())
        .merge(quiet_route::router())
        .merge(health::router())
        .with_state(state)
}
