//! Pre-game predictions from the FanMatch pages into `day_schedule`.

use super::results::matchup;
use super::SiteResolver;
use crate::assemble::{assemble_prediction, prediction_teams};
use crate::context::IngestContext;
use crate::dates::DateRange;
use crate::providers::GameSource;
use crate::report::IngestReport;
use crate::store::{load_team_directory, IngestStore};
use anyhow::Result;
use tracing::info;

pub async fn ingest_predictions<S, G>(ctx: &IngestContext<S, G>, dates: DateRange) -> Result<IngestReport>
where
    S: IngestStore,
    G: GameSource,
{
    let teams = load_team_directory(&ctx.store).await?;
    let mut sites = SiteResolver::new();
    let mut report = IngestReport::new("day_schedule");

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
            info!("No games scheduled for {}", date);
            continue;
        }
        report.rows_scraped += games.len();

        let mut records = Vec::with_capacity(games.len());
        for game in &games {
            let ids = match prediction_teams(game, &teams) {
                Ok(ids) => ids,
                Err(reason) => {
                    report.skip(&matchup(game), &reason);
                    continue;
                }
            };
            let site = sites
                .site(&ctx.store, game.location.as_deref(), ids.0, ids.1)
                .await;
            match assemble_prediction(date, game, ids, site) {
                Ok(record) => records.push(record),
                Err(reason) => report.skip(&matchup(game), &reason),
            }
        }

        report.records_assembled += records.len();
        let outcome = ctx.batcher.submit(&ctx.store, records).await;
        info!("✅ {} predictions written for {}", outcome.rows_written, date);
        report.writes.merge(&outcome);
    }

    report.log_summary();
    Ok(report)
}
