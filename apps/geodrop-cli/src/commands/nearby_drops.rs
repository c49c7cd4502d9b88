use super::open_database;
use crate::config::CliConfig;
use crate::error::{CliError, CliResult};
use chrono::Utc;
use geodrop_geo::Coordinates;

pub fn execute(
    config: &CliConfig,
    latitude: f64,
    longitude: f64,
    radius: Option<f64>,
    limit: Option<usize>,
) -> CliResult<()> {
    let center = Coordinates::new(latitude, longitude)?;
    let radius = radius.unwrap_or(config.claims.nearby_radius_meters);
    if !radius.is_finite() || radius < 0.0 {
        return Err(CliError::InvalidConfig(format!(
            "Search radius must be a non-negative number of meters, got {}",
            radius
        )));
    }
    let limit = limit.unwrap_or(config.claims.nearby_limit);

    println!("🔍 Drops within {} m of {}", radius, center);
    let db = open_database(config)?;
    let found = db.read_nearby(&center, radius, limit)?;

    if found.is_empty() {
        println!("   (none)");
        return Ok(());
    }

    let now = Utc::now();
    for nearby in &found {
        let view = nearby.drop.projection(now);
        println!(
            "   {:>8.1} m  {}  {:?}  {}  \"{}\"",
            nearby.distance_meters, view.id, view.status, view.amount, view.message
        );
    }
    println!("✅ {} drop(s)", found.len());
    Ok(())
}
