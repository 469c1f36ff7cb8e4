//! Data models for the quiet-route pipeline.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize, Serializer};

// ---

/// A WGS-84 point. Plain value type, no validation on construction;
/// callers at the HTTP boundary check `is_valid` before scoring.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinate {
    // ---
    pub lat: f64,
    pub lng: f64,
}

impl Coordinate {
    // ---
    pub fn new(lat: f64, lng: f64) -> Self {
        Self { lat, lng }
    }

    /// Range check used at the API boundary. Scoring math itself is
    /// unguarded: garbage in produces a numeric result, not a panic.
    pub fn is_valid(&self) -> bool {
        // ---
        self.lat.is_finite()
            && self.lng.is_finite()
            && (-90.0..=90.0).contains(&self.lat)
            && (-180.0..=180.0).contains(&self.lng)
    }
}

/// A user- or system-registered point of interest from the spots
/// catalog service. Read-only to the scoring engine.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuietSpot {
    // ---
    pub id: String,
    pub name: String,
    pub lat: f64,
    pub lng: f64,
    /// Intrinsic quietness signal, 0-100, higher = quieter.
    pub quiet_rating: u8,
    pub category: String,
    #[serde(default)]
    pub like_count: u32,
    #[serde(default)]
    pub dislike_count: u32,
}

impl QuietSpot {
    // ---
    pub fn coordinate(&self) -> Coordinate {
        Coordinate::new(self.lat, self.lng)
    }
}

/// Raw crowd observation from the realtime station feed. Ephemeral;
/// at most one "current" record per station survives deduplication.
#[derive(Debug, Clone, Deserialize)]
pub struct SensorRecord {
    // ---
    pub station_id: String,
    pub coordinate: Coordinate,
    /// Upstream congestion label ("1"/"2" or ITIS codes "1545"/"1546").
    pub congestion_code: String,
    pub timestamp: DateTime<Utc>,
    pub district_hint: Option<String>,
}

/// Ordinal crowd bucket derived from a population count. Serialized as
/// the integer 0/1/2 the stored rows and frontend expect.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum CrowdLevel {
    Low = 0,
    Medium = 1,
    High = 2,
}

/// Ordinal noise bucket, correlated with but bucketed independently of
/// crowd level (some feeds only carry one signal).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum NoiseLevel {
    Low = 0,
    Medium = 1,
    High = 2,
}

impl Serialize for CrowdLevel {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u8(*self as u8)
    }
}

impl Serialize for NoiseLevel {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u8(*self as u8)
    }
}

impl CrowdLevel {
    pub fn as_u8(self) -> u8 {
        self as u8
    }
}

impl NoiseLevel {
    pub fn as_u8(self) -> u8 {
        self as u8
    }
}

/// Which collection path produced a stored place row. Population rows
/// are served in full; crowd-station rows get region balancing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PlaceSource {
    Population,
    CrowdStation,
}

/// Derived "current state" row. Levels are recomputed from source data
/// on every collection pass; no stored level is authoritative.
#[derive(Debug, Clone, Serialize)]
pub struct ClassifiedPlace {
    // ---
    pub id: String,
    pub name: String,
    pub lat: f64,
    pub lng: f64,
    pub population: u32,
    pub crowd_level: CrowdLevel,
    pub noise_level: NoiseLevel,
    pub region: String,
    pub geohash: String,
    pub category: String,
    pub source: PlaceSource,
    pub recommendation: &'static str,
    pub last_updated: DateTime<Utc>,
    /// Explicit district from the feed, when the feed carries one.
    /// Balancing prefers this over deriving the region from the name.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub district_hint: Option<String>,
}

impl ClassifiedPlace {
    // ---
    pub fn coordinate(&self) -> Coordinate {
        Coordinate::new(self.lat, self.lng)
    }
}

/// One consecutive-pair slice of a route. Computed fresh per request,
/// never persisted.
#[derive(Debug, Clone, Serialize)]
pub struct RouteSegment {
    // ---
    pub start: Coordinate,
    pub end: Coordinate,
    pub distance_m: f64,
    /// 0-100, mean of the endpoint quietness samples.
    pub quietness_score: f64,
}

/// The engine's output for one route request. Discarded when the user
/// clears or replaces the route; no server-side persistence.
#[derive(Debug, Clone, Serialize)]
pub struct RouteDescriptor {
    // ---
    pub id: uuid::Uuid,
    pub points: Vec<Coordinate>,
    pub total_distance_m: f64,
    pub total_duration_s: f64,
    pub aggregate_quietness: f64,
    pub tier: crate::tier::PresentationTier,
    /// Polyline stroke color for the rendering consumer.
    pub color: &'static str,
    /// True when the directions provider failed and the straight-line
    /// fallback was scored instead.
    pub fallback: bool,
}

#[cfg(test)]
mod tests {
    // ---
    use super::*;

    #[test]
    fn coordinate_validation() {
        // ---
        assert!(Coordinate::new(37.5665, 126.9780).is_valid());
        assert!(Coordinate::new(-90.0, 180.0).is_valid());

        assert!(!Coordinate::new(91.0, 0.0).is_valid());
        assert!(!Coordinate::new(0.0, -180.5).is_valid());
        assert!(!Coordinate::new(f64::NAN, 0.0).is_valid());
        assert!(!Coordinate::new(0.0, f64::INFINITY).is_valid());
    }

    #[test]
    fn levels_serialize_as_integers() {
        // ---
        let crowd = serde_json::to_string(&CrowdLevel::High).unwrap();
        let noise = serde_json::to_string(&NoiseLevel::Low).unwrap();

        assert_eq!(crowd, "2");
        assert_eq!(noise, "0");
    }

    #[test]
    fn place_source_serializes_snake_case() {
        // ---
        let s = serde_json::to_string(&PlaceSource::CrowdStation).unwrap();
        assert_eq!(s, "\"crowd_station\"");
    }
}
