//! Application entry point for the `quietroute` backend service.
//!
//! This binary orchestrates the full startup sequence:
//! - Loading configuration from environment variables or `.env`
//! - Initializing structured logging/tracing
//! - Creating the in-memory current-state place store
//! - Spawning the background feed collector
//! - Mounting all API routes via the `routes` gateway
//! - Binding the axum HTTP server and serving requests
//!
//! # Environment Variables
//! - `POPULATION_API_URL` (**required**) – dong-level population feed
//! - `SPOTS_API_URL` (**required**) – spots catalog service
//! - `DIRECTIONS_API_URL` (**required**) – walking-directions provider
//! - `QUIETROUTE_LOG_LEVEL` (optional) – log verbosity (default: `debug`)
//! - `QUIETROUTE_SPAN_EVENTS` (optional) – span event mode for tracing
//!
//! See `config.rs` for the full list of optional settings.

use std::{env, net::SocketAddr, sync::Arc};

use anyhow::Result;
use axum::Router;
use dotenvy::dotenv;
use is_terminal::IsTerminal;
use tracing_subscriber::filter::EnvFilter;
use tracing_subscriber::fmt::format::FmtSpan;

use quietroute::routes::{self, AppState};
use quietroute::store::{PlaceStore, SystemClock};
use quietroute::supersede::RouteSession;
use quietroute::{collector, config};

// ---

#[tokio::main]
async fn main() -> Result<()> {
    // ---
    init_tracing();
    dotenv().ok();

    let cfg = config::load_from_env()?;
    cfg.log_config();

    let store = Arc::new(PlaceStore::new(SystemClock));
    let session = Arc::new(RouteSession::new());

    // Background collection; the first pass runs immediately so the
    // store is warm before the first /places request.
    tokio::spawn(collector::run(store.clone(), cfg.clone()));

    let state = AppState {
        store,
        session,
        config: cfg,
        http: reqwest::Client::new(),
    };

    let app: Router = routes::router(state);

    let addr = SocketAddr::from(([0, 0, 0, 0], 8080));
    tracing::info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

// ---

/// Initialize the global tracing subscriber for structured logging.
///
/// Configures [`tracing_subscriber`] with:
/// - Log target, file, and line number output enabled
/// - Color output controlled by TTY detection and `FORCE_COLOR` env var:
///   - `FORCE_COLOR=1|true|yes`: force colors on
///   - `FORCE_COLOR=0|false|no`: force colors off
///   - unset or other values: auto-detect TTY
/// - Span event emission mode controlled by `QUIETROUTE_SPAN_EVENTS`:
///   - `"full"`       : emit ENTER, EXIT, and CLOSE events with timing
///   - `"enter_exit"` : emit ENTER and EXIT only
///   - unset or other values: emit CLOSE events only (default)
/// - Log level controlled by the `QUIETROUTE_LOG_LEVEL` env var
///
/// Called once at startup before any logging or tracing macros are
/// invoked; installs the subscriber globally for the process lifetime.
fn init_tracing() {
    // ---
    let span_events = match env::var("QUIETROUTE_SPAN_EVENTS").as_deref() {
        Ok("full") => FmtSpan::FULL,
        Ok("enter_exit") => FmtSpan::ENTER | FmtSpan::EXIT,
        _ => FmtSpan::CLOSE,
    };

    // Determine if we should use colors
    let use_color = match env::var("FORCE_COLOR").as_deref() {
        Ok("1") | Ok("true") | Ok("yes") => true,
        Ok("0") | Ok("false") | Ok("no") => false,
        _ => std::io::stdout().is_terminal(),
    };

    // Use RUST_LOG if available, otherwise fall back to QUIETROUTE_LOG_LEVEL
    let env_filter = if env::var("RUST_LOG").is_ok() {
        EnvFilter::from_default_env()
    } else {
        let level = match env::var("QUIETROUTE_LOG_LEVEL").ok().as_deref() {
            Some("trace") => "trace",
            Some("debug") => "debug",
            Some("info") => "info",
            Some("warn") => "warn",
            Some("error") => "error",
            _ => "debug",
        };
        EnvFilter::new(format!("{level},hyper=warn,reqwest=warn"))
    };

    tracing_subscriber::fmt()
        .with_target(true)
        .with_file(true)
        .with_line_number(true)
        .with_span_events(span_events)
        .with_env_filter(env_filter)
        .with_ansi(use_color)
        .compact()
        .init();
}
