//! Final results from the FanMatch pages into `games`.

use super::SiteResolver;
use crate::assemble::{assemble_result, result_teams, SkipReason};
use crate::context::IngestContext;
use crate::dates::DateRange;
use crate::models::ScrapedGame;
use crate::providers::GameSource;
use crate::report::IngestReport;
use crate::store::{load_team_directory, IngestStore};
use anyhow::Result;
use tracing::info;

pub async fn ingest_results<S, G>(ctx: &IngestContext<S, G>, dates: DateRange) -> Result<IngestReport>
where
    S: IngestStore,
    G: GameSource,
{
    let teams = load_team_directory(&ctx.store).await?;
    let mut sites = SiteResolver::new();
    let mut report = IngestReport::new("fanmatch_results");

    for (i, date) in dates.iter().enumerate() {
        if i > 0 {
            ctx.throttle.pause().await;
        }
        report.dates_processed += 1;

        let games = match ctx.source.fanmatch(date).await {
            Ok(games) => games,
            Err(e) => {
                report.fail_date(date, &e);
                continue;
            }
        };
        if games.is_empty() {
            info!("No results for {}", date);
            continue;
        }
        report.rows_scraped += games.len();

        let mut records = Vec::with_capacity(games.len());
        for game in &games {
            let ids = match result_teams(game, &teams) {
                Ok(ids) => ids,
                // Scheduled games belong to the prediction pipeline.
                Err(SkipReason::NotFinal) => continue,
                Err(reason) => {
                    report.skip(&matchup(game), &reason);
                    continue;
                }
            };
            let site = sites
                .site(&ctx.store, game.location.as_deref(), ids.0, ids.1)
                .await;
            match assemble_result(date, game, ids, site) {
                Ok(record) => records.push(record),
                Err(reason) => report.skip(&matchup(game), &reason),
            }
        }

        report.records_assembled += records.len();
        let outcome = ctx.batcher.submit(&ctx.store, records).await;
        info!("✅ {}: {} results written for {}", ctx.source.provider_name(), outcome.rows_written, date);
        report.writes.merge(&outcome);
    }

    report.log_summary();
    Ok(report)
}

pub(crate) fn matchup(game: &ScrapedGame) -> String {
    format!("{} vs {}", game.team1, game.team2)
}
