use crate::error::CliResult;
use geodrop_geo::{haversine_distance, Coordinates};

pub fn execute(
    from_latitude: f64,
    from_longitude: f64,
    to_latitude: f64,
    to_longitude: f64,
) -> CliResult<()> {
    let from = Coordinates::new(from_latitude, from_longitude)?;
    let to = Coordinates::new(to_latitude, to_longitude)?;
    println!("📏 {} → {}: {:.2} m", from, to, haversine_distance(&from, &to));
    Ok(())
}
