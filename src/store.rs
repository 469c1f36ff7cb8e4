//! In-memory current-state store for classified places.
//!
//! Replaces the original deployment's TTL-expiring table plus its global
//! in-memory cache with one explicit object: rows carry an expiry
//! computed from a per-source TTL, and expiry is evaluated against an
//! injected clock so staleness is testable without wall-clock sleeps.

use std::collections::BTreeMap;
use std::sync::RwLock;

use chrono::{DateTime, Duration, Utc};

use crate::models::ClassifiedPlace;

/// TTL for dong-level population rows (refreshed hourly upstream).
pub const POPULATION_TTL_SECS: i64 = 24 * 60 * 60;

/// TTL for realtime crowd-station rows.
pub const CROWD_TTL_SECS: i64 = 60 * 60;

// ---

/// Time source for expiry checks. Production uses [`SystemClock`];
/// tests inject a manual clock and advance it explicitly.
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

/// Wall-clock time.
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

struct StoredPlace {
    place: ClassifiedPlace,
    expires_at: DateTime<Utc>,
}

/// Keyed current-state rows: one row per place id, newest write wins.
/// Reads skip expired rows; writes prune them.
pub struct PlaceStore<C: Clock> {
    // ---
    clock: C,
    entries: RwLock<BTreeMap<String, StoredPlace>>,
}

impl<C: Clock> PlaceStore<C> {
    // ---
    pub fn new(clock: C) -> Self {
        Self {
            clock,
            entries: RwLock::new(BTreeMap::new()),
        }
    }

    /// Insert or replace rows, each expiring `ttl_secs` from now.
    pub fn upsert_batch(&self, places: Vec<ClassifiedPlace>, ttl_secs: i64) {
        // ---
        let now = self.clock.now();
        let expires_at = now + Duration::seconds(ttl_secs);

        let mut entries = self.entries.write().expect("place store lock poisoned");
        entries.retain(|_, stored| stored.expires_at > now);

        for place in places {
            entries.insert(place.id.clone(), StoredPlace { place, expires_at });
        }
    }

    /// All unexpired rows, in stable (id) order.
    pub fn snapshot(&self) -> Vec<ClassifiedPlace> {
        // ---
        let now = self.clock.now();
        let entries = self.entries.read().expect("place store lock poisoned");

        entries
            .values()
            .filter(|stored| stored.expires_at > now)
            .map(|stored| stored.place.clone())
            .collect()
    }

    pub fn len(&self) -> usize {
        self.snapshot().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
