use super::open_database;
use crate::config::CliConfig;
use crate::error::CliResult;
use chrono::Utc;

pub fn execute(config: &CliConfig, limit: Option<usize>, unsettled: bool) -> CliResult<()> {
    let limit = limit.unwrap_or(config.claims.nearby_limit);
    let db = open_database(config)?;

    let drops = if unsettled {
        println!("⏳ Claimed drops awaiting settlement (limit {})", limit);
        db.read_unsettled(limit)?
    } else {
        println!("📋 Most recent drops (limit {})", limit);
        db.read_recent(limit)?
    };

    if drops.is_empty() {
        println!("   (none)");
        return Ok(());
    }

    let now = Utc::now();
    for drop in &drops {
        let view = drop.projection(now);
        println!(
            "   {}  {:<9}  {:>10}  {}  {}",
            view.id,
            format!("{:?}", view.status),
            view.amount,
            view.location,
            view.claimant
                .as_ref()
                .map(|c| c.to_string())
                .unwrap_or_default()
        );
    }
    println!("✅ {} drop(s)", drops.len());
    Ok(())
}
