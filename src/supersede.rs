//! Superseding-token guard for route computations.
//!
//! Route scoring is triggered by rapid user interaction and involves
//! slow upstream fetches, so a later request must prevail over a
//! dangling earlier one. Each computation takes a generation token at
//! the start and may only publish its result if no newer token has been
//! issued since; a slow stale computation silently loses.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::RwLock;

use crate::models::RouteDescriptor;

// ---

/// One interaction slot's route state: a generation counter plus the
/// most recently published descriptor.
#[derive(Default)]
pub struct RouteSession {
    // ---
    generation: AtomicU64,
    latest: RwLock<Option<RouteDescriptor>>,
}

impl RouteSession {
    // ---
    pub fn new() -> Self {
        Self::default()
    }

    /// Start a new computation, superseding all earlier tokens.
    pub fn begin(&self) -> u64 {
        self.generation.fetch_add(1, Ordering::SeqCst) + 1
    }

    /// True while no later computation has begun.
    pub fn is_current(&self, token: u64) -> bool {
        self.generation.load(Ordering::SeqCst) == token
    }

    /// Publish a result if its token is still current. Returns whether
    /// the result was accepted.
    pub fn publish(&self, token: u64, descriptor: RouteDescriptor) -> bool {
        // ---
        if !self.is_current(token) {
            return false;
        }

        let mut latest = self.latest.write().expect("route session lock poisoned");
        // Re-check under the lock so two racing publishers cannot both
        // pass the unlocked check and write out of order.
        if !self.is_current(token) {
            return false;
        }
        *latest = Some(descriptor);
        true
    }

    /// The most recently published descriptor, if any.
    pub fn latest(&self) -> Option<RouteDescriptor> {
        self.latest
            .read()
            .expect("route session lock poisoned")
            .clone()
    }
}
