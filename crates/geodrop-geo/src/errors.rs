use thiserror::Error;

pub type GeoResult<T> = Result<T, GeoError>;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum GeoError {
    #[error("Latitude {0} is outside [-90, 90]")]
    LatitudeOutOfRange(f64),

    #[error("Longitude {0} is outside [-180, 180]")]
    LongitudeOutOfRange(f64),

    #[error("Coordinate component is not a finite number")]
    NotFinite,
}
