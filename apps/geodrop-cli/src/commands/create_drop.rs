use super::{open_database, print_projection};
use crate::config::CliConfig;
use crate::error::{CliError, CliResult};
use chrono::{DateTime, TimeDelta, Utc};
use geodrop_claims::{AccountId, AudienceScope, Drop, NewDrop};
use geodrop_geo::Coordinates;
use rust_decimal::Decimal;

pub struct CreateDropArgs {
    pub latitude: f64,
    pub longitude: f64,
    pub amount: Decimal,
    pub message: String,
    pub creator: String,
    pub group: Option<String>,
    pub expires_in_minutes: Option<i64>,
}

pub fn execute(config: &CliConfig, args: CreateDropArgs) -> CliResult<()> {
    let location = Coordinates::new(args.latitude, args.longitude)?;
    let creator: AccountId = args.creator.parse()?;
    let audience = match args.group {
        Some(group) => AudienceScope::restricted(group),
        None => AudienceScope::Public,
    };

    let now = Utc::now();
    let expires_at = args
        .expires_in_minutes
        .map(|minutes| expiry_after(now, minutes))
        .transpose()?;

    let drop = Drop::create(
        NewDrop {
            location,
            amount: args.amount,
            message: args.message,
            creator,
            audience,
            expires_at,
        },
        now,
    )?;

    let db = open_database(config)?;
    db.insert_drop(&drop)?;

    println!("✅ Drop created");
    print_projection(&drop.projection(now));
    Ok(())
}

fn expiry_after(now: DateTime<Utc>, minutes: i64) -> CliResult<DateTime<Utc>> {
    TimeDelta::try_minutes(minutes)
        .and_then(|delta| now.checked_add_signed(delta))
        .ok_or_else(|| {
            CliError::InvalidConfig(format!(
                "--expires-in-minutes {} is out of range",
                minutes
            ))
        })
}
