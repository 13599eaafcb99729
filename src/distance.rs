// (c) Copyright 2025 Mikołaj Kuranowski
// SPDX-License-Identifier: MIT

/// Mean radius of Earth, in kilometers.
/// Source: https://en.wikipedia.org/wiki/Earth_radius#Arithmetic_mean_radius
pub const EARTH_RADIUS: f64 = 6371.0088;

/// Mean diameter of Earth, in kilometers.
/// Source: https://en.wikipedia.org/wiki/Earth_radius#Arithmetic_mean_radius
const EARTH_DIAMETER: f64 = EARTH_RADIUS + EARTH_RADIUS;

/// Calculates the great-circle distance between two lat-lon positions
/// on Earth using the [haversine formula](https://en.wikipedia.org/wiki/Haversine_formula).
/// Returns the result in kilometers.
pub fn earth_distance(lat1: f64, lon1: f64, lat2: f64, lon2: f64) -> f64 {
    let lat1 = lat1.to_radians();
    let lon1 = lon1.to_radians();
    let lat2 = lat2.to_radians();
    let lon2 = lon2.to_radians();

    let sin_dlat_half = ((lat2 - lat1) * 0.5).sin();
    let sin_dlon_half = ((lon2 - lon1) * 0.5).sin();

    let h = sin_dlat_half * sin_dlat_half + lat1.cos() * lat2.cos() * sin_dlon_half * sin_dlon_half;

    // Rounding may push h a hair above 1 for antipodal points
    EARTH_DIAMETER * h.min(1.0).sqrt().asin()
}

/// Lower bound of the great-circle distance from a position to any point on the
/// parallel `axis_lat`. Any path changing latitude by Δ is at least `R·Δ` long.
pub(crate) fn parallel_distance_bound(lat: f64, axis_lat: f64) -> f64 {
    EARTH_RADIUS * (lat - axis_lat).abs().to_radians()
}

/// Lower bound of the great-circle distance from a position to the meridian at `axis_lon`
/// (the cross-track distance). Returns zero when the meridian is more than 90° away,
/// as the bound stops being meaningful there.
pub(crate) fn meridian_distance_bound(lat: f64, lon: f64, axis_lon: f64) -> f64 {
    let dlon = (lon - axis_lon).abs().to_radians();
    if dlon >= std::f64::consts::FRAC_PI_2 {
        return 0.0;
    }
    EARTH_RADIUS * (dlon.sin() * lat.to_radians().cos()).asin()
}

#[cfg(test)]
mod tests {
    use super::*;

    macro_rules! assert_almost_eq {
        ($a:expr, $b:expr) => {
            assert!(
                (($a - $b).abs() < 1e-4),
                "assertion failed: {} ≈ {}",
                $a,
                $b
            )
        };
    }

    #[test]
    fn earth_distance_one_degree() {
        // One degree along a meridian is R·π/180
        assert_almost_eq!(earth_distance(0.0, 0.0, 1.0, 0.0), 111.19508);
        assert_almost_eq!(earth_distance(0.0, 0.0, 0.0, 1.0), 111.19508);
        assert_eq!(earth_distance(52.23, 21.01, 52.23, 21.01), 0.0);
    }

    #[test]
    fn earth_distance_symmetric() {
        let a = earth_distance(52.2297, 21.0122, 50.0647, 19.9450);
        let b = earth_distance(50.0647, 19.9450, 52.2297, 21.0122);
        assert_eq!(a, b);
        assert!(a > 250.0 && a < 255.0);
    }

    #[test]
    fn bounds_do_not_exceed_distance() {
        let (lat, lon) = (60.0, 10.0);
        for &(lat2, lon2) in &[(59.0, 12.0), (61.5, 10.0), (60.0, 11.0), (70.0, 30.0)] {
            let d = earth_distance(lat, lon, lat2, lon2);
            assert!(parallel_distance_bound(lat, lat2) <= d + 1e-9);
            assert!(meridian_distance_bound(lat, lon, lon2) <= d + 1e-9);
        }
    }
}
