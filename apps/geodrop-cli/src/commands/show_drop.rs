use super::{open_verifier, print_projection};
use crate::config::CliConfig;
use crate::error::CliResult;
use chrono::Utc;
use geodrop_claims::DropId;

pub fn execute(config: &CliConfig, drop_id: &str, json: bool) -> CliResult<()> {
    let drop_id: DropId = drop_id.parse()?;
    let verifier = open_verifier(config.clone())?;
    let projection = verifier.view(&drop_id, Utc::now())?;

    if json {
        println!("{}", serde_json::to_string_pretty(&projection)?);
    } else {
        print_projection(&projection);
    }
    Ok(())
}
