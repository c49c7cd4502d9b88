use crate::config::CliConfig;
use crate::error::CliResult;
use geodrop_db::DropDatabase;

pub fn execute(config: &CliConfig, overwrite: bool) -> CliResult<()> {
    println!(
        "🗄️  Creating drop database at {}",
        config.database_path.display()
    );

    let db = DropDatabase::create_file(
        &config.database_path,
        overwrite,
        config.claims.store_timeout(),
    )?;

    if !db.verify_schema()? {
        return Err(crate::error::CliError::CommandExecution(
            "Database schema check failed after initialization".to_string(),
        ));
    }

    println!("✅ Database ready");
    Ok(())
}
