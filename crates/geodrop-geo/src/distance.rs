use crate::Coordinates;

/// Mean Earth radius used by the haversine formula
pub const EARTH_RADIUS_METERS: f64 = 6_371_000.0;

/// Great-circle distance between two points in meters.
///
/// `a = sin²(Δφ/2) + cos φ1 · cos φ2 · sin²(Δλ/2)`, `d = 2R · atan2(√a, √(1−a))`
pub fn haversine_distance(a: &Coordinates, b: &Coordinates) -> f64 {
    let phi1 = a.latitude().to_radians();
    let phi2 = b.latitude().to_radians();
    let delta_phi = (b.latitude() - a.latitude()).to_radians();
    let delta_lambda = (b.longitude() - a.longitude()).to_radians();

    let h = (delta_phi / 2.0).sin().powi(2)
        + phi1.cos() * phi2.cos() * (delta_lambda / 2.0).sin().powi(2);
    // Rounding can push h a hair past 1 for antipodal points
    let h = h.clamp(0.0, 1.0);

    2.0 * EARTH_RADIUS_METERS * h.sqrt().atan2((1.0 - h).sqrt())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn point(latitude: f64, longitude: f64) -> Coordinates {
        Coordinates::new(latitude, longitude).unwrap()
    }

    #[test]
    fn test_zero_for_identical_points() {
        let istanbul = point(41.0082, 28.9784);
        assert_eq!(haversine_distance(&istanbul, &istanbul), 0.0);
    }

    #[test]
    fn test_symmetry() {
        let pairs = [
            (point(41.0082, 28.9784), point(41.0090, 28.9790)),
            (point(-33.8688, 151.2093), point(51.5074, -0.1278)),
            (point(89.9, 10.0), point(89.9, -170.0)),
            (point(0.0, 179.9), point(0.0, -179.9)),
        ];
        for (a, b) in pairs {
            let forward = haversine_distance(&a, &b);
            let backward = haversine_distance(&b, &a);
            assert!((forward - backward).abs() < 1e-9, "{forward} != {backward}");
        }
    }

    #[test]
    fn test_one_degree_of_latitude() {
        // 2πR / 360
        let expected = 2.0 * std::f64::consts::PI * EARTH_RADIUS_METERS / 360.0;
        let d = haversine_distance(&point(0.0, 0.0), &point(1.0, 0.0));
        assert!((d - expected).abs() < 1e-6);
    }

    #[test]
    fn test_antipodal_points() {
        let d = haversine_distance(&point(0.0, 0.0), &point(0.0, 180.0));
        let half_circumference = std::f64::consts::PI * EARTH_RADIUS_METERS;
        assert!((d - half_circumference).abs() < 1e-3);
    }

    #[test]
    fn test_short_distance_across_antimeridian() {
        let d = haversine_distance(&point(0.0, 179.9995), &point(0.0, -179.9995));
        assert!(d > 100.0 && d < 120.0, "{d}");
    }

    #[test]
    fn test_high_latitude_longitude_span_shrinks() {
        let equator = haversine_distance(&point(0.0, 0.0), &point(0.0, 0.001));
        let arctic = haversine_distance(&point(80.0, 0.0), &point(80.0, 0.001));
        assert!(arctic < equator / 5.0);
    }
}
