//! Region and crowd/noise classification over raw population counts.
//!
//! Two crowd threshold schemes exist and are not interchangeable:
//! the general scheme (3000/8000) for rows with no area context, and an
//! area-type-aware scheme whose thresholds shift down for residential
//! areas and up for entertainment districts. Curated areas in the static
//! table carry an [`AreaKind`] and get the type-aware scheme; everything
//! else (gu-level fallbacks, unknown codes) gets the general scheme.

use crate::models::{Coordinate, CrowdLevel, NoiseLevel};

/// Fallback region label when no district box matches.
pub const OTHER_DISTRICT: &str = "기타구";

/// District names recognized by the name-substring fallback in
/// region balancing.
pub const KNOWN_DISTRICTS: [&str; 6] =
    ["강남구", "중구", "종로구", "용산구", "마포구", "영등포구"];

// ---

/// Area character of a curated place, from the static area table.
/// Shifts the crowd thresholds the way the original dataset did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AreaKind {
    Residential,
    Luxury,
    Entertainment,
    Shopping,
    Business,
    Cultural,
    General,
}

impl AreaKind {
    /// (medium, high) population thresholds for this area type.
    pub fn crowd_thresholds(self) -> (u32, u32) {
        // ---
        match self {
            AreaKind::Residential | AreaKind::Luxury => (2_000, 5_000),
            AreaKind::Entertainment | AreaKind::Shopping => (5_000, 12_000),
            AreaKind::Business | AreaKind::Cultural | AreaKind::General => (3_000, 8_000),
        }
    }

    pub fn label(self) -> &'static str {
        // ---
        match self {
            AreaKind::Residential => "주거 지역",
            AreaKind::Luxury => "고급 주거지",
            AreaKind::Entertainment => "유흥 지역",
            AreaKind::Shopping => "쇼핑 지역",
            AreaKind::Business => "비즈니스 지구",
            AreaKind::Cultural => "문화 지역",
            AreaKind::General => "일반 지역",
        }
    }
}

/// General crowd bucketing: `<3000` low, `<8000` medium, else high.
/// Use for rows with no known area type.
pub fn classify_crowd_level(population: u32) -> CrowdLevel {
    classify_crowd_level_for(population, AreaKind::General)
}

/// Area-type-aware crowd bucketing. `AreaKind::General` reduces to the
/// general scheme, so the two schemes never disagree on untyped rows.
pub fn classify_crowd_level_for(population: u32, kind: AreaKind) -> CrowdLevel {
    // ---
    let (medium, high) = kind.crowd_thresholds();
    if population < medium {
        CrowdLevel::Low
    } else if population < high {
        CrowdLevel::Medium
    } else {
        CrowdLevel::High
    }
}

/// Noise bucketing, independent of crowd level: `<5000` low,
/// `<10000` medium, else high.
pub fn classify_noise_level(population: u32) -> NoiseLevel {
    // ---
    if population < 5_000 {
        NoiseLevel::Low
    } else if population < 10_000 {
        NoiseLevel::Medium
    } else {
        NoiseLevel::High
    }
}

/// Coarse district lookup by point-in-rectangle against six fixed
/// bounding boxes. Not a polygon test; boxes overlap real district
/// borders loosely and the first match wins.
pub fn resolve_region_name(coord: Coordinate) -> &'static str {
    // ---
    const BOXES: [(f64, f64, f64, f64, &str); 6] = [
        (37.49, 37.53, 127.02, 127.08, "강남구"),
        (37.54, 37.58, 126.97, 127.02, "중구"),
        (37.57, 37.61, 126.95, 127.00, "종로구"),
        (37.52, 37.56, 126.95, 127.00, "용산구"),
        (37.53, 37.57, 126.90, 126.95, "마포구"),
        (37.48, 37.52, 126.85, 126.92, "영등포구"),
    ];

    for (lat_min, lat_max, lng_min, lng_max, name) in BOXES {
        if coord.lat >= lat_min
            && coord.lat <= lat_max
            && coord.lng >= lng_min
            && coord.lng <= lng_max
        {
            return name;
        }
    }

    OTHER_DISTRICT
}

/// Walking recommendation attached to every stored place row.
pub fn walking_recommendation(population: u32) -> &'static str {
    // ---
    if population < 3_000 {
        "여유로운 산책하기 좋음"
    } else if population < 8_000 {
        "적당한 활기의 거리 산책"
    } else {
        "사람 많은 번화가"
    }
}
