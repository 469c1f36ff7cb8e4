//! Quiet-route scoring and geospatial bucketing service.
//!
//! The pipeline has two halves sharing one set of geo primitives:
//!
//! - **Collection**: poll city open-data feeds for population and
//!   crowd observations, classify them into ordinal crowd/noise levels
//!   and regions, deduplicate and balance them, and keep the results as
//!   TTL-expiring current-state rows ([`collector`], [`classify`],
//!   [`balance`], [`store`]).
//! - **Scoring**: given a walking route and the quiet-spot catalog,
//!   sample quietness along the polyline, aggregate a distance-weighted
//!   score, and classify a presentation tier ([`scoring`], [`tier`],
//!   [`directions`]).
//!
//! Both halves are exposed over a small axum API ([`routes`]); scoring
//! always produces an answer, degrading to ambient defaults and the
//! straight-line fallback rather than failing.

pub mod balance;
pub mod classify;
pub mod collector;
pub mod config;
pub mod directions;
pub mod geo;
pub mod models;
pub mod routes;
pub mod scoring;
pub mod store;
pub mod supersede;
pub mod tier;

pub use config::Config;

// Re-exported so route handlers and the binary depend on the crate
// root rather than on individual module paths.
pub use models::{
    ClassifiedPlace, Coordinate, CrowdLevel, NoiseLevel, PlaceSource, QuietSpot, RouteDescriptor,
    RouteSegment, SensorRecord,
};
pub use tier::PresentationTier;
