//! Shared geo primitives: great-circle distance, geohash bucketing, and
//! the stable point key used by the quietness sampler.
//!
//! The original data paths each carried their own copy of these helpers;
//! everything in this crate goes through this one module so distance and
//! bucket semantics cannot drift between the collector and the scorer.

use crate::Coordinate;

/// Mean Earth radius in meters.
const EARTH_RADIUS_M: f64 = 6_371_000.0;

/// Base-32 alphabet of the standard geohash encoding. This is the only
/// geohash encoding used anywhere in this crate; every stored row and
/// bucket key is base-32 so prefix grouping stays consistent.
const GEOHASH_BASE32: &[u8] = b"0123456789bcdefghjkmnpqrstuvwxyz";

/// Default geohash precision for stored place rows.
pub const GEOHASH_PRECISION: usize = 7;

// ---

/// Great-circle distance between two coordinates in meters, by the
/// haversine formula. Inputs are not validated; invalid lat/lng yields
/// a numeric (possibly NaN) result rather than an error.
pub fn haversine_distance(a: Coordinate, b: Coordinate) -> f64 {
    // ---
    let phi1 = a.lat.to_radians();
    let phi2 = b.lat.to_radians();
    let d_phi = (b.lat - a.lat).to_radians();
    let d_lambda = (b.lng - a.lng).to_radians();

    let h = (d_phi / 2.0).sin().powi(2)
        + phi1.cos() * phi2.cos() * (d_lambda / 2.0).sin().powi(2);
    let c = 2.0 * h.sqrt().atan2((1.0 - h).sqrt());

    EARTH_RADIUS_M * c
}

/// Sum of consecutive-pair distances along a polyline, in meters.
pub fn polyline_length(points: &[Coordinate]) -> f64 {
    // ---
    points
        .windows(2)
        .map(|w| haversine_distance(w[0], w[1]))
        .sum()
}

/// Geohash of a coordinate as a base-32 string of exactly `precision`
/// characters. Interleaved binary subdivision, longitude bit first,
/// accumulating 5 bits per output character.
///
/// Geohash equality is a coarse bucket key for deduplication and
/// lightweight spatial grouping, not a distance metric.
pub fn geohash(coord: Coordinate, precision: usize) -> String {
    // ---
    let mut lat_range = (-90.0_f64, 90.0_f64);
    let mut lng_range = (-180.0_f64, 180.0_f64);

    let mut hash = String::with_capacity(precision);
    let mut even_bit = true;
    let mut bit = 0u8;
    let mut ch = 0usize;

    while hash.len() < precision {
        if even_bit {
            let mid = (lng_range.0 + lng_range.1) / 2.0;
            if coord.lng >= mid {
                ch |= 1 << (4 - bit);
                lng_range.0 = mid;
            } else {
                lng_range.1 = mid;
            }
        } else {
            let mid = (lat_range.0 + lat_range.1) / 2.0;
            if coord.lat >= mid {
                ch |= 1 << (4 - bit);
                lat_range.0 = mid;
            } else {
                lat_range.1 = mid;
            }
        }

        even_bit = !even_bit;

        if bit < 4 {
            bit += 1;
        } else {
            hash.push(GEOHASH_BASE32[ch] as char);
            bit = 0;
            ch = 0;
        }
    }

    hash
}

/// Stable map key for a route point, truncated to 6 decimal places so
/// repeated points hash identically regardless of float noise further
/// down the fraction.
pub fn point_key(coord: Coordinate) -> String {
    format!("{:.6},{:.6}", coord.lat, coord.lng)
}

#[cfg(test)]
mod tests {
    // ---
    use super::*;

    const SEOUL_CITY_HALL: Coordinate = Coordinate { lat: 37.5665, lng: 126.9780 };
    const GANGNAM_STATION: Coordinate = Coordinate { lat: 37.4979, lng: 127.0276 };

    #[test]
    fn distance_is_symmetric() {
        // ---
        let ab = haversine_distance(SEOUL_CITY_HALL, GANGNAM_STATION);
        let ba = haversine_distance(GANGNAM_STATION, SEOUL_CITY_HALL);
        assert!((ab - ba).abs() < 1e-9);
    }

    #[test]
    fn distance_to_self_is_zero() {
        assert_eq!(haversine_distance(SEOUL_CITY_HALL, SEOUL_CITY_HALL), 0.0);
    }

    #[test]
    fn distance_magnitude_is_plausible() {
        // ---
        // City Hall to Gangnam station is roughly 8.8 km as the crow flies.
        let d = haversine_distance(SEOUL_CITY_HALL, GANGNAM_STATION);
        assert!(d > 8_000.0 && d < 10_000.0, "got {d}");
    }

    #[test]
    fn one_degree_of_latitude() {
        // ---
        let a = Coordinate::new(37.0, 127.0);
        let b = Coordinate::new(38.0, 127.0);
        let d = haversine_distance(a, b);
        // ~111.2 km per degree of latitude.
        assert!((d - 111_195.0).abs() < 200.0, "got {d}");
    }

    #[test]
    fn geohash_has_requested_length_and_is_deterministic() {
        // ---
        for precision in [1, 5, 7, 9, 12] {
            let h = geohash(SEOUL_CITY_HALL, precision);
            assert_eq!(h.len(), precision);
            assert_eq!(h, geohash(SEOUL_CITY_HALL, precision));
        }
    }

    #[test]
    fn geohash_known_value() {
        // ---
        // Independently computed reference hash for Seoul City Hall.
        assert_eq!(geohash(SEOUL_CITY_HALL, 7), "wydm9qy");
    }

    #[test]
    fn nearby_points_share_a_prefix() {
        // ---
        let a = geohash(Coordinate::new(37.5665, 126.9780), 7);
        let b = geohash(Coordinate::new(37.5666, 126.9781), 7);
        assert_eq!(a[..5], b[..5]);
    }

    #[test]
    fn point_key_is_precision_stable() {
        // ---
        let a = Coordinate::new(37.123_456_4, 127.000_000_1);
        let b = Coordinate::new(37.123_456_2, 127.000_000_3);
        assert_eq!(point_key(a), point_key(b));
        assert_eq!(point_key(a), "37.123456,127.000000");
    }

    #[test]
    fn polyline_length_sums_pairs() {
        // ---
        let pts = vec![
            Coordinate::new(37.50, 127.00),
            Coordinate::new(37.51, 127.00),
            Coordinate::new(37.52, 127.00),
        ];
        let total = polyline_length(&pts);
        let first = haversine_distance(pts[0], pts[1]);
        let second = haversine_distance(pts[1], pts[2]);
        assert!((total - (first + second)).abs() < 1e-9);
    }
}
