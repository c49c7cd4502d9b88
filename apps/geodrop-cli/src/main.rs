use clap::{Parser, Subcommand};
use rust_decimal::Decimal;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

mod commands;
mod config;
mod error;

use config::CliConfig;
use error::CliResult;

#[derive(Parser)]
#[command(name = "geodrop")]
#[command(about = "GeoDrop CLI - Location-pinned drops, claimed once by whoever gets there")]
#[command(version)]
struct Cli {
    /// YAML configuration file
    #[arg(short, long, global = true, default_value = "geodrop.yaml")]
    config: PathBuf,

    /// Database file (overrides the configuration file)
    #[arg(long, global = true)]
    db: Option<PathBuf>,

    /// Log filter, e.g. "info" or "geodrop_claims=debug"
    #[arg(long, global = true, default_value = "warn")]
    log: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create an empty drop database
    InitDb {
        /// Replace an existing database file
        #[arg(long)]
        overwrite: bool,
    },

    /// Pin a new drop
    CreateDrop {
        #[arg(long, allow_hyphen_values = true)]
        latitude: f64,

        #[arg(long, allow_hyphen_values = true)]
        longitude: f64,

        /// Amount carried by the drop (at least 0.1)
        #[arg(long)]
        amount: Decimal,

        /// Note shown to the finder (at most 200 characters)
        #[arg(long)]
        message: String,

        /// Creator account id
        #[arg(long)]
        creator: String,

        /// Restrict claiming to members of this audience group
        #[arg(long)]
        group: Option<String>,

        /// Expire the drop this many minutes from now
        #[arg(long)]
        expires_in_minutes: Option<i64>,
    },

    /// Show one drop
    Show {
        drop_id: String,

        /// Print the drop as JSON
        #[arg(long)]
        json: bool,
    },

    /// List recent drops
    List {
        /// Maximum number of drops (defaults to the configured nearby_limit)
        #[arg(short, long)]
        limit: Option<usize>,

        /// Only claimed drops still waiting for settlement
        #[arg(long)]
        unsettled: bool,
    },

    /// Find drops around a point, nearest first
    Nearby {
        #[arg(long, allow_hyphen_values = true)]
        latitude: f64,

        #[arg(long, allow_hyphen_values = true)]
        longitude: f64,

        /// Search radius in meters (defaults to the configured nearby_radius_meters)
        #[arg(short, long)]
        radius: Option<f64>,

        #[arg(short, long)]
        limit: Option<usize>,
    },

    /// Claim a drop from the given position
    Claim {
        drop_id: String,

        /// Claimant account id
        #[arg(long)]
        claimant: String,

        #[arg(long, allow_hyphen_values = true)]
        latitude: f64,

        #[arg(long, allow_hyphen_values = true)]
        longitude: f64,

        /// Reference of an already confirmed transfer, stored with the claim
        #[arg(long)]
        settlement_ref: Option<String>,
    },

    /// Record the settlement reference of a claimed drop
    AttachSettlement {
        drop_id: String,
        settlement_ref: String,
    },

    /// Great-circle distance between two points, in meters
    Distance {
        #[arg(allow_hyphen_values = true)]
        from_latitude: f64,
        #[arg(allow_hyphen_values = true)]
        from_longitude: f64,
        #[arg(allow_hyphen_values = true)]
        to_latitude: f64,
        #[arg(allow_hyphen_values = true)]
        to_longitude: f64,
    },
}

fn main() -> CliResult<()> {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(&cli.log))
        .with_writer(std::io::stderr)
        .init();

    let mut config = CliConfig::load(&cli.config)?;
    if let Some(db) = cli.db {
        config.database_path = db;
    }

    match cli.command {
        Commands::InitDb { overwrite } => commands::init_db::execute(&config, overwrite),

        Commands::CreateDrop {
            latitude,
            longitude,
            amount,
            message,
            creator,
            group,
            expires_in_minutes,
        } => commands::create_drop::execute(
            &config,
            commands::create_drop::CreateDropArgs {
                latitude,
                longitude,
                amount,
                message,
                creator,
                group,
                expires_in_minutes,
            },
        ),

        Commands::Show { drop_id, json } => commands::show_drop::execute(&config, &drop_id, json),

        Commands::List { limit, unsettled } => {
            commands::list_drops::execute(&config, limit, unsettled)
        }

        Commands::Nearby {
            latitude,
            longitude,
            radius,
            limit,
        } => commands::nearby_drops::execute(&config, latitude, longitude, radius, limit),

        Commands::Claim {
            drop_id,
            claimant,
            latitude,
            longitude,
            settlement_ref,
        } => commands::claim_drop::execute(
            config,
            drop_id,
            claimant,
            latitude,
            longitude,
            settlement_ref,
        ),

        Commands::AttachSettlement {
            drop_id,
            settlement_ref,
        } => commands::attach_settlement::execute(config, drop_id, settlement_ref),

        Commands::Distance {
            from_latitude,
            from_longitude,
            to_latitude,
            to_longitude,
        } => commands::distance::execute(from_latitude, from_longitude, to_latitude, to_longitude),
    }
}
