//! Presentation tier: the discrete classification of an aggregate
//! quietness score that rendering consumers use to pick a route style.

use serde::Serialize;

// ---

/// Four-tier step function over the 0-100 quietness scale. Total: every
/// float maps to exactly one tier, NaN included (NaN fails every
/// comparison and lands in `Busy`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PresentationTier {
    VeryQuiet,
    Quiet,
    Moderate,
    Busy,
}

/// Tier boundaries are inclusive on the lower bound of each higher
/// tier, so exactly 80.0 is `VeryQuiet` and the ambient default 60.0
/// classifies as `Quiet`.
pub fn classify_presentation_tier(aggregate_quietness: f64) -> PresentationTier {
    // ---
    if aggregate_quietness >= 80.0 {
        PresentationTier::VeryQuiet
    } else if aggregate_quietness >= 60.0 {
        PresentationTier::Quiet
    } else if aggregate_quietness >= 40.0 {
        PresentationTier::Moderate
    } else {
        PresentationTier::Busy
    }
}

impl PresentationTier {
    /// Polyline stroke color used by the map renderer.
    pub fn route_color(self) -> &'static str {
        // ---
        match self {
            PresentationTier::VeryQuiet => "#4CAF50",
            PresentationTier::Quiet => "#8BC34A",
            PresentationTier::Moderate => "#FFC107",
            PresentationTier::Busy => "#FF9800",
        }
    }

    pub fn label(self) -> &'static str {
        // ---
        match self {
            PresentationTier::VeryQuiet => "very quiet",
            PresentationTier::Quiet => "quiet",
            PresentationTier::Moderate => "moderate",
            PresentationTier::Busy => "busy",
        }
    }
}
