use anyhow::{Context, Result};
use cbb_rust_core::dates::yesterday;
use cbb_rust_core::pipelines::ingest_team_stats;
use cbb_rust_core::providers::TeamRankingsProvider;
use cbb_rust_core::{IngestConfig, IngestContext, PgStore};
use dotenv::dotenv;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    dotenv().ok();

    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    info!("Starting TeamRankings stats ingest...");

    let config = IngestConfig::from_env()?;
    config.log_summary();
    let dates = config.date_range(yesterday())?;

    let store = PgStore::connect(&config.database_url, config.db_pool.clone())
        .await
        .context("Failed to connect to database")?;
    let source = TeamRankingsProvider::new()?;

    let ctx = IngestContext::new(store, source)
        .with_throttle(config.stats_throttle())
        .with_batch_size(config.batch_size);
    let report = ingest_team_stats(&ctx, &config.stats, dates).await?;

    info!("TeamRankings ingest finished ({} observations)", report.records_assembled);
    Ok(())
}
