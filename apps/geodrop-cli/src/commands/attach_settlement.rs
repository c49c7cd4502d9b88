use super::{open_verifier, print_projection};
use crate::config::CliConfig;
use crate::error::CliResult;
use geodrop_claims::{AttachSettlementRequest, ClaimService};

pub fn execute(config: CliConfig, drop_id: String, settlement_ref: String) -> CliResult<()> {
    println!("🔗 Attaching settlement {} to drop {}", settlement_ref, drop_id);

    let service = ClaimService::new(open_verifier(config)?);
    let projection = service.attach_settlement(&AttachSettlementRequest {
        drop_id,
        settlement_ref,
    })?;

    println!("✅ Drop settled");
    print_projection(&projection);
    Ok(())
}
