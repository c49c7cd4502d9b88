pub mod attach_settlement;
pub mod claim_drop;
pub mod create_drop;
pub mod distance;
pub mod init_db;
pub mod list_drops;
pub mod nearby_drops;
pub mod show_drop;

use crate::config::CliConfig;
use crate::error::{CliError, CliResult};
use geodrop_claims::{ClaimVerifier, DropProjection};
use geodrop_db::DropDatabase;

pub(crate) fn open_database(config: &CliConfig) -> CliResult<DropDatabase> {
    DropDatabase::open(&config.database_path, config.claims.store_timeout()).map_err(|e| {
        CliError::InvalidConfig(format!(
            "Failed to open database {} (run `geodrop init-db` first?): {}",
            config.database_path.display(),
            e
        ))
    })
}

pub(crate) fn open_verifier(config: CliConfig) -> CliResult<ClaimVerifier<DropDatabase>> {
    let db = open_database(&config)?;
    Ok(ClaimVerifier::with_audience(db, config.audience, config.claims))
}

pub(crate) fn print_projection(drop: &DropProjection) {
    println!("📍 Drop {}", drop.id);
    println!("   Status: {:?}", drop.status);
    println!("   Location: {}", drop.location);
    println!("   Amount: {}", drop.amount);
    println!("   Message: {}", drop.message);
    if let Some(expires_at) = drop.expires_at {
        println!("   Expires: {}", expires_at.to_rfc3339());
    }
    if let Some(claimant) = &drop.claimant {
        println!("   Claimed by: {}", claimant);
    }
    if let Some(claimed_at) = drop.claimed_at {
        println!("   Claimed at: {}", claimed_at.to_rfc3339());
    }
    match &drop.settlement_ref {
        Some(settlement_ref) => println!("   Settlement: {}", settlement_ref),
        None if drop.claimant.is_some() => println!("   Settlement: ⏳ pending"),
        None => {}
    }
}
