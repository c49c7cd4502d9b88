use crate::{
    distance::{haversine_distance, EARTH_RADIUS_METERS},
    GeoError, GeoResult,
};
use serde::{Deserialize, Serialize};

/// A validated point on the Earth's surface.
///
/// Latitude lies in [-90, 90] and longitude in [-180, 180]; both are finite.
/// Construction is the only place validation happens, so every `Coordinates`
/// value in the system is known to be in range.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawCoordinates")]
pub struct Coordinates {
    latitude: f64,
    longitude: f64,
}

#[derive(Deserialize)]
struct RawCoordinates {
    latitude: f64,
    longitude: f64,
}

impl TryFrom<RawCoordinates> for Coordinates {
    type Error = GeoError;

    fn try_from(raw: RawCoordinates) -> GeoResult<Self> {
        Coordinates::new(raw.latitude, raw.longitude)
    }
}

impl Coordinates {
    pub fn new(latitude: f64, longitude: f64) -> GeoResult<Self> {
        if !latitude.is_finite() || !longitude.is_finite() {
            return Err(GeoError::NotFinite);
        }
        if !(-90.0..=90.0).contains(&latitude) {
            return Err(GeoError::LatitudeOutOfRange(latitude));
        }
        if !(-180.0..=180.0).contains(&longitude) {
            return Err(GeoError::LongitudeOutOfRange(longitude));
        }

        Ok(Self {
            latitude,
            longitude,
        })
    }

    /// Build from GeoJSON `[longitude, latitude]` order
    pub fn from_lon_lat(longitude: f64, latitude: f64) -> GeoResult<Self> {
        Self::new(latitude, longitude)
    }

    pub fn latitude(&self) -> f64 {
        self.latitude
    }

    pub fn longitude(&self) -> f64 {
        self.longitude
    }

    /// Great-circle distance to `other` in meters
    pub fn distance_to(&self, other: &Coordinates) -> f64 {
        haversine_distance(self, other)
    }

    /// True when `other` is no further than `radius_meters` away (inclusive)
    pub fn within(&self, other: &Coordinates, radius_meters: f64) -> bool {
        self.distance_to(other) <= radius_meters
    }

    /// Destination point after travelling `meters` along the great circle
    /// starting at `bearing_degrees` (0 = north, 90 = east).
    pub fn offset(&self, bearing_degrees: f64, meters: f64) -> Coordinates {
        let angular = meters / EARTH_RADIUS_METERS;
        let bearing = bearing_degrees.to_radians();
        let phi1 = self.latitude.to_radians();
        let lambda1 = self.longitude.to_radians();

        let phi2 = (phi1.sin() * angular.cos() + phi1.cos() * angular.sin() * bearing.cos())
            .clamp(-1.0, 1.0)
            .asin();
        let lambda2 = lambda1
            + (bearing.sin() * angular.sin() * phi1.cos())
                .atan2(angular.cos() - phi1.sin() * phi2.sin());

        let latitude = phi2.to_degrees().clamp(-90.0, 90.0);
        let longitude = (lambda2.to_degrees() + 540.0).rem_euclid(360.0) - 180.0;

        Coordinates {
            latitude,
            longitude,
        }
    }
}

impl std::fmt::Display for Coordinates {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({:.6}, {:.6})", self.latitude, self.longitude)
    }
}
