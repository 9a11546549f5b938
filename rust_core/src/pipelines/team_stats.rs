//! TeamRankings stat tables into `tr_team_daily_stats`.

use crate::assemble::assemble_daily_stat;
use crate::context::IngestContext;
use crate::dates::DateRange;
use crate::models::StatRow;
use crate::providers::StatSource;
use crate::report::IngestReport;
use crate::store::{load_team_directory, IngestStore};
use anyhow::Result;
use tracing::info;

const PROGRESS_EVERY: usize = 10;

/// Scrape each stat over the range, then write that stat's observations.
pub async fn ingest_team_stats<S, T>(
    ctx: &IngestContext<S, T>,
    stats: &[String],
    dates: DateRange,
) -> Result<IngestReport>
where
    S: IngestStore,
    T: StatSource,
{
    let teams = load_team_directory(&ctx.store).await?;
    let mut report = IngestReport::new("team_stats");

    for (i, stat) in stats.iter().enumerate() {
        if i > 0 {
            ctx.throttle.pause_group().await;
        }
        info!("Scraping {} for {} dates", stat, dates.len());

        let rows = scrape_stat(ctx, stat, dates, &mut report).await;
        if rows.is_empty() {
            info!("Nothing found for {} from {}", stat, dates.start());
            continue;
        }
        report.rows_scraped += rows.len();

        let mut records = Vec::with_capacity(rows.len());
        for row in &rows {
            match assemble_daily_stat(row, &teams) {
                Ok(record) => records.push(record),
                Err(reason) => report.skip(&format!("{} {}", stat, row.date), &reason),
            }
        }

        report.records_assembled += records.len();
        let outcome = ctx.batcher.submit(&ctx.store, records).await;
        info!("✅ {}: {} rows written", stat, outcome.rows_written);
        report.writes.merge(&outcome);
    }

    report.dates_processed = dates.len();
    report.log_summary();
    Ok(report)
}

/// One stat across every date in the range; failed dates are logged and skipped.
async fn scrape_stat<S, T>(
    ctx: &IngestContext<S, T>,
    stat: &str,
    dates: DateRange,
    report: &mut IngestReport,
) -> Vec<StatRow>
where
    T: StatSource,
{
    let mut rows = Vec::new();
    for (i, date) in dates.iter().enumerate() {
        if i > 0 {
            ctx.throttle.pause().await;
        }
        if (i + 1) % PROGRESS_EVERY == 0 {
            info!("Progress: day {} of {}, scraping {} for {}", i + 1, dates.len(), stat, date);
        }
        match ctx.source.stat_table(stat, date).await {
            Ok(table) => rows.extend(table),
            Err(e) => report.fail_date(date, &e),
        }
    }
    rows
}
