//! Deduplication and regional balancing of raw crowd records.
//!
//! The realtime station feed re-reports every station on every poll and
//! clusters heavily around a few districts. Dedup keeps one current
//! record per station; balancing caps per-region counts so one busy
//! district cannot drown out the rest of the map.

use std::collections::{HashMap, HashSet};

use tracing::debug;

use crate::classify::{KNOWN_DISTRICTS, OTHER_DISTRICT};
use crate::models::{ClassifiedPlace, SensorRecord};

/// Default cap on stored crowd rows per region.
pub const PER_REGION_LIMIT: usize = 8;

// ---

/// Keep only the record with the latest timestamp per `station_id`.
///
/// Timestamps are compared as parsed date values, never lexically.
/// When several records for a station share the same timestamp the
/// surviving one is arbitrary; callers must not rely on first-wins.
/// Idempotent: running it twice yields the same set.
pub fn dedup_latest_by_station(records: Vec<SensorRecord>) -> Vec<SensorRecord> {
    // ---
    let mut latest: HashMap<String, SensorRecord> = HashMap::new();

    for record in records {
        match latest.get(&record.station_id) {
            Some(existing) if existing.timestamp >= record.timestamp => {}
            _ => {
                latest.insert(record.station_id.clone(), record);
            }
        }
    }

    latest.into_values().collect()
}

/// Region a place row counts against: the explicit feed district when
/// present, else a district-name substring of the place name, else the
/// generic other-district bucket.
fn region_of(place: &ClassifiedPlace) -> String {
    // ---
    if let Some(district) = &place.district_hint {
        return district.clone();
    }

    KNOWN_DISTRICTS
        .iter()
        .find(|district| place.name.contains(*district))
        .map(|district| (*district).to_string())
        .unwrap_or_else(|| OTHER_DISTRICT.to_string())
}

/// Two-stage order-preserving filter over classified places:
///
/// 1. Coordinate-bucket dedup: lat/lng rounded to 3 decimal places
///    (~100 m grid); only the first record per bucket survives.
/// 2. Per-region cap: records are dropped once their region has
///    reached `per_region_limit`.
///
/// Output preserves the relative input order of kept records, so this
/// is deliberately not order-independent: earlier records win buckets
/// and region slots.
pub fn balance_by_region(
    places: Vec<ClassifiedPlace>,
    per_region_limit: usize,
) -> Vec<ClassifiedPlace> {
    // ---
    let mut seen_buckets: HashSet<(i64, i64)> = HashSet::new();
    let mut region_counts: HashMap<String, usize> = HashMap::new();

    let balanced: Vec<ClassifiedPlace> = places
        .into_iter()
        .filter(|place| {
            let bucket = (
                (place.lat * 1000.0).round() as i64,
                (place.lng * 1000.0).round() as i64,
            );
            if !seen_buckets.insert(bucket) {
                return false;
            }

            let count = region_counts.entry(region_of(place)).or_insert(0);
            *count += 1;
            *count <= per_region_limit
        })
        .collect();

    debug!(
        "Regional distribution after balancing: {:?}",
        region_counts
    );

    balanced
}
