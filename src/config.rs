//! Configuration loader for the `quietroute` backend service.
//!
//! Centralizes all runtime configuration values and their defaults,
//! loading from environment variables (with optional `.env` file support
//! provided by the caller). Consolidating configuration here keeps
//! `env::var` calls out of the pipeline and scoring code.

use std::env;

use anyhow::{anyhow, Result};

use crate::scoring::ProximityPolicy;

/// Parse an optional integer environment variable with a default value.
macro_rules! parse_env_num {
    ($var_name:expr, $ty:ty, $default:expr) => {
        env::var($var_name)
            .ok()
            .map(|v| v.parse::<$ty>())
            .transpose()
            .map_err(|e| anyhow!("Invalid {}: {}", $var_name, e))?
            .unwrap_or($default)
    };
}

/// Parse a required string environment variable.
macro_rules! require_env {
    ($var_name:expr) => {
        env::var($var_name)
            .map_err(|_| anyhow!("{} must be set in .env or environment", $var_name))?
    };
}

/// Strongly typed application configuration.
///
/// All fields are immutable after loading, ensuring a consistent
/// configuration snapshot for the lifetime of the application.
#[derive(Debug, Clone)]
pub struct Config {
    // ---
    /// Dong-level population feed URL (city open-data API).
    pub population_api_url: String,

    /// Realtime crowd-station feed URL. Optional; crowd collection is
    /// skipped when unset.
    pub crowd_api_url: Option<String>,

    /// Spots catalog service base URL.
    pub spots_api_url: String,

    /// Walking-directions provider URL.
    pub directions_api_url: String,

    /// Directions provider API key, sent as an Authorization header
    /// when present.
    pub directions_api_key: Option<String>,

    /// Seconds between collection passes.
    pub collect_interval_secs: u64,

    /// Maximum number of spot-catalog pages to fetch (safety limit).
    pub spots_max_pages: u32,

    /// Per-region cap applied to crowd-station rows.
    pub per_region_limit: usize,

    /// Radius within which a spot contributes to a point's quietness.
    pub sample_radius_m: f64,

    /// Distance bound for the nearby-quiet-spots listing.
    pub nearby_spot_distance_m: f64,

    /// Which route-proximity selection policy is active.
    pub proximity_policy: ProximityPolicy,

    /// Geohash precision for stored place rows.
    pub geohash_precision: usize,
}

/// Load configuration from environment variables with defaults.
///
/// Required:
/// - `POPULATION_API_URL` – dong-level population feed URL
/// - `SPOTS_API_URL` – spots catalog service URL
/// - `DIRECTIONS_API_URL` – walking-directions provider URL
///
/// Optional:
/// - `CROWD_API_URL` – realtime crowd-station feed URL
/// - `DIRECTIONS_API_KEY` – provider credential
/// - `COLLECT_INTERVAL_SECS` – collection period (default: 300)
/// - `SPOTS_MAX_PAGES` – max catalog pages per fetch (default: 100)
/// - `PER_REGION_LIMIT` – crowd rows kept per region (default: 8)
/// - `SAMPLE_RADIUS_M` – quietness sample radius (default: 200)
/// - `NEARBY_SPOT_DISTANCE_M` – nearby-spot bound (default: 500)
/// - `ROUTE_PROXIMITY_POLICY` – `endpoints_only` (default) or `full_route`
/// - `GEOHASH_PRECISION` – stored-row geohash length (default: 7)
///
/// Returns an error if any required variable is missing or invalid.
pub fn load_from_env() -> Result<Config> {
    // ---
    let population_api_url = require_env!("POPULATION_API_URL");
    let spots_api_url = require_env!("SPOTS_API_URL");
    let directions_api_url = require_env!("DIRECTIONS_API_URL");

    let crowd_api_url = env::var("CROWD_API_URL").ok();
    let directions_api_key = env::var("DIRECTIONS_API_KEY").ok();

    let collect_interval_secs = parse_env_num!("COLLECT_INTERVAL_SECS", u64, 300);
    let spots_max_pages = parse_env_num!("SPOTS_MAX_PAGES", u32, 100);
    let per_region_limit = parse_env_num!("PER_REGION_LIMIT", usize, crate::balance::PER_REGION_LIMIT);
    let sample_radius_m = parse_env_num!("SAMPLE_RADIUS_M", f64, crate::scoring::SAMPLE_RADIUS_M);
    let nearby_spot_distance_m = parse_env_num!("NEARBY_SPOT_DISTANCE_M", f64, 500.0);
    let geohash_precision = parse_env_num!("GEOHASH_PRECISION", usize, crate::geo::GEOHASH_PRECISION);

    let proximity_policy = match env::var("ROUTE_PROXIMITY_POLICY").ok().as_deref() {
        None | Some("endpoints_only") => ProximityPolicy::EndpointsOnly,
        Some("full_route") => ProximityPolicy::FullRoute,
        Some(other) => {
            return Err(anyhow!(
                "Invalid ROUTE_PROXIMITY_POLICY '{}': expected 'endpoints_only' or 'full_route'",
                other
            ))
        }
    };

    Ok(Config {
        population_api_url,
        crowd_api_url,
        spots_api_url,
        directions_api_url,
        directions_api_key,
        collect_interval_secs,
        spots_max_pages,
        per_region_limit,
        sample_radius_m,
        nearby_spot_distance_m,
        proximity_policy,
        geohash_precision,
    })
}

impl Config {
    /// Log the loaded configuration for debugging purposes. Credentials
    /// are masked.
    pub fn log_config(&self) {
        // ---
        tracing::info!("Configuration loaded:");
        tracing::info!("  POPULATION_API_URL     : {}", self.population_api_url);
        tracing::info!(
            "  CROWD_API_URL          : {}",
            self.crowd_api_url.as_deref().unwrap_or("(unset, crowd collection disabled)")
        );
        tracing::info!("  SPOTS_API_URL          : {}", self.spots_api_url);
        tracing::info!("  DIRECTIONS_API_URL     : {}", self.directions_api_url);
        tracing::info!(
            "  DIRECTIONS_API_KEY     : {}",
            if self.directions_api_key.is_some() { "****" } else { "(unset)" }
        );
        tracing::info!("  COLLECT_INTERVAL_SECS  : {}", self.collect_interval_secs);
        tracing::info!("  SPOTS_MAX_PAGES        : {}", self.spots_max_pages);
        tracing::info!("  PER_REGION_LIMIT       : {}", self.per_region_limit);
        tracing::info!("  SAMPLE_RADIUS_M        : {}", self.sample_radius_m);
        tracing::info!("  NEARBY_SPOT_DISTANCE_M : {}", self.nearby_spot_distance_m);
        tracing::info!("  ROUTE_PROXIMITY_POLICY : {:?}", self.proximity_policy);
        tracing::info!("  GEOHASH_PRECISION      : {}", self.geohash_precision);
    }
}
