use anyhow::Context;
use clap::Parser;
use std::process::ExitCode;

use qtl_atlas::{
    Error, QueryConfig,
    config::init_tracing,
    formats::{read_markers, write_report},
    handlers::find_overlaps,
    storage::SqliteStore,
};

#[tokio::main]
async fn main() -> ExitCode {
    let config = QueryConfig::parse();
    init_tracing(&config.log_level);

    match run(config).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("Error: {:#}", err);
            ExitCode::from(err.downcast_ref::<Error>().map_or(1, Error::exit_code))
        }
    }
}

async fn run(config: QueryConfig) -> anyhow::Result<()> {
    // All validation happens before anything is read or written
    let params = config.query_params()?;

    let markers = read_markers(&config.input)
        .await
        .with_context(|| format!("reading markers from {}", config.input.display()))?;
    tracing::info!("Read {} markers from {}", markers.len(), config.input.display());

    let store = SqliteStore::open(&config.database, &config.table)?;
    let rows = find_overlaps(&store, &markers, &params).await?;

    // The report is only written once every marker has been queried
    let mut report = Vec::new();
    write_report(&mut report, &rows)?;
    tokio::fs::write(&config.output, report)
        .await
        .with_context(|| format!("writing {}", config.output.display()))?;

    tracing::info!("Wrote {} QTL hits to {}", rows.len(), config.output.display());
    Ok(())
}
