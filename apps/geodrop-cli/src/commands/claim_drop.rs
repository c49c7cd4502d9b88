use super::{open_verifier, print_projection};
use crate::config::CliConfig;
use crate::error::CliResult;
use geodrop_claims::{ClaimRequest, ClaimService};

pub fn execute(
    config: CliConfig,
    drop_id: String,
    claimant: String,
    latitude: f64,
    longitude: f64,
    settlement_ref: Option<String>,
) -> CliResult<()> {
    println!("🎯 {} claiming drop {} from ({}, {})", claimant, drop_id, latitude, longitude);

    let service = ClaimService::new(open_verifier(config)?);
    let request = ClaimRequest {
        drop_id,
        claimant_id: claimant,
        claimant_latitude: latitude,
        claimant_longitude: longitude,
        settlement_ref,
    };

    match service.claim(&request) {
        Ok(projection) => {
            println!("✅ Claim accepted");
            print_projection(&projection);
            Ok(())
        }
        Err(rejection) => {
            println!("❌ Claim rejected: {}", rejection.kind);
            if let Some(distance) = rejection.distance_meters {
                println!("   You are {} m from the drop", distance);
            }
            Err(rejection.into())
        }
    }
}
