use anyhow::Context;
use clap::Parser;
use std::process::ExitCode;

use qtl_atlas::{
    BuildConfig, Error,
    config::init_tracing,
    handlers::{store_atlas, unify_sources},
    storage::SqliteStore,
};

#[tokio::main]
async fn main() -> ExitCode {
    let config = BuildConfig::parse();
    init_tracing(&config.log_level);

    match run(config).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("Error: {:#}", err);
            ExitCode::from(err.downcast_ref::<Error>().map_or(1, Error::exit_code))
        }
    }
}

async fn run(config: BuildConfig) -> anyhow::Result<()> {
    tracing::info!("Building {} from {} files", config.database.display(), config.input.len());

    // A source that fails to parse must not leave a database file behind
    let records = unify_sources(&config.input, config.skip_rows).await?;
    let store = SqliteStore::create(&config.database, &config.table)
        .with_context(|| format!("opening {}", config.database.display()))?;
    let summary = store_atlas(&store, records, config.input.len()).await?;

    tracing::info!(
        "Wrote {} QTL records to table {} in {}",
        summary.records,
        store.table(),
        config.database.display()
    );
    Ok(())
}
