//! Great-circle distance between coordinates.

use crime_dashboard_crime_models::Coordinate;

/// Mean Earth radius in kilometers.
pub const EARTH_RADIUS_KM: f64 = 6371.0;

/// Haversine distance between two coordinates, in kilometers.
///
/// Total for any finite input and symmetric in its arguments.
#[must_use]
pub fn haversine_km(from: Coordinate, to: Coordinate) -> f64 {
    let lat1 = from.latitude.to_radians();
    let lat2 = to.latitude.to_radians();
    let delta_lat = (to.latitude - from.latitude).to_radians();
    let delta_lon = (to.longitude - from.longitude).to_radians();

    let a = (delta_lat / 2.0).sin().powi(2)
        + lat1.cos() * lat2.cos() * (delta_lon / 2.0).sin().powi(2);
    let c = 2.0 * a.sqrt().atan2((1.0 - a).sqrt());

    EARTH_RADIUS_KM * c
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_for_identical_points() {
        let a = Coordinate::new(11.0168, 76.9558);
        assert!(haversine_km(a, a).abs() < f64::EPSILON);
    }

    #[test]
    fn symmetric() {
        let a = Coordinate::new(11.0168, 76.9558);
        let b = Coordinate::new(13.0827, 80.2707);
        assert!((haversine_km(a, b) - haversine_km(b, a)).abs() < 1e-9);
    }

    #[test]
    fn one_degree_of_longitude_at_equator() {
        let d = haversine_km(Coordinate::new(0.0, 0.0), Coordinate::new(0.0, 1.0));
        assert!((d - 111.19).abs() < 0.5, "got {d}");
    }

    #[test]
    fn coimbatore_to_chennai() {
        let d = haversine_km(
            Coordinate::new(11.0168, 76.9558),
            Coordinate::new(13.0827, 80.2707),
        );
        assert!((d - 425.0).abs() < 10.0, "got {d}");
    }
}
