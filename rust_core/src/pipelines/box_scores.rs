//! Half-by-half box scores merged into existing `games` rows.
//!
//! Runs in two phases. Collection walks the date range, fetching every box
//! score page with randomized pacing. Upload then groups what was collected
//! by date, matches each line against that date's stored games and applies
//! the updates in chunks.

use crate::assemble::{assemble_box_score_line, assemble_box_score_update, SkipReason};
use crate::context::IngestContext;
use crate::dates::DateRange;
use crate::identity::TeamDirectory;
use crate::matching::GameLookup;
use crate::models::{BoxScoreLine, BoxScoreUpdate};
use crate::normalize::clean_team_name;
use crate::providers::GameSource;
use crate::report::IngestReport;
use crate::store::{load_team_directory, IngestStore};
use anyhow::Result;
use chrono::NaiveDate;
use std::collections::BTreeMap;
use tracing::{error, info, warn};

pub async fn ingest_box_scores<S, G>(ctx: &IngestContext<S, G>, dates: DateRange) -> Result<IngestReport>
where
    S: IngestStore,
    G: GameSource,
{
    let teams = load_team_directory(&ctx.store).await?;
    let mut report = IngestReport::new("box_score");

    let lines = collect_box_scores(ctx, &teams, dates, &mut report).await;
    info!("✅ Total collected box score rows: {}", lines.len());
    upload_box_scores(ctx, lines, &mut report).await;

    report.log_summary();
    Ok(report)
}

/// Fetch and assemble every box score in the range.
pub async fn collect_box_scores<S, G>(
    ctx: &IngestContext<S, G>,
    teams: &TeamDirectory,
    dates: DateRange,
    report: &mut IngestReport,
) -> Vec<BoxScoreLine>
where
    S: IngestStore,
    G: GameSource,
{
    let mut lines = Vec::new();

    for date in dates.iter() {
        report.dates_processed += 1;
        info!("Collecting box scores for {}", date);

        let links = match ctx.source.box_score_links(date).await {
            Ok(links) => links,
            Err(e) => {
                report.fail_date(date, &e);
                continue;
            }
        };
        if links.is_empty() {
            info!("No games found for {}", date);
            continue;
        }
        report.rows_scraped += links.len();

        for link in &links {
            let context = format!("{} vs {}", link.team1, link.team2);
            let ids = match teams.resolve_pair(&clean_team_name(&link.team1), &clean_team_name(&link.team2)) {
                Ok(ids) => ids,
                Err(names) => {
                    report.skip(&context, &SkipReason::UnresolvedTeams(names));
                    continue;
                }
            };

            ctx.throttle.pause().await;
            let line = match ctx.source.line_score(&link.url).await {
                Ok(Some(line)) => line,
                Ok(None) => {
                    info!("No line score at {}", link.url);
                    report.skipped += 1;
                    continue;
                }
                Err(e) => {
                    warn!("⚠️ Failed to fetch {}: {:#}", link.url, e);
                    report.skipped += 1;
                    ctx.throttle.cool_down().await;
                    continue;
                }
            };

            match assemble_box_score_line(date, ids, &line, teams) {
                Ok(line) => lines.push(line),
                Err(reason) => report.skip(&context, &reason),
            }
        }
        info!("Collected {} games so far", lines.len());
    }

    lines
}

/// Match collected lines to stored games and apply the updates.
///
/// A line with no stored game on its date is skipped. A failed update aborts
/// the rest of that date; other dates still run.
pub async fn upload_box_scores<S, G>(
    ctx: &IngestContext<S, G>,
    lines: Vec<BoxScoreLine>,
    report: &mut IngestReport,
) where
    S: IngestStore,
{
    let mut by_date: BTreeMap<NaiveDate, Vec<BoxScoreLine>> = BTreeMap::new();
    for line in lines {
        by_date.entry(line.game_date).or_default().push(line);
    }

    for (date, lines) in by_date {
        let stored = match ctx.store.games_on(date).await {
            Ok(rows) => rows,
            Err(e) => {
                report.fail_date(date, &e);
                continue;
            }
        };
        let lookup = GameLookup::from_rows(date, &stored);
        info!("Loaded {} games for {}", lookup.len(), date);

        let mut updates: Vec<BoxScoreUpdate> = Vec::with_capacity(lines.len());
        let mut skipped = 0;
        for line in &lines {
            match lookup.find(line.team1_id, line.team2_id) {
                Some(game) => updates.push(assemble_box_score_update(line, game)),
                None => {
                    let reason = SkipReason::NoStoredGame(line.team1_id, line.team2_id);
                    report.skip(&date.to_string(), &reason);
                    skipped += 1;
                }
            }
        }
        report.records_assembled += updates.len();
        info!("{} matched, {} skipped for {}", updates.len(), skipped, date);

        for chunk in ctx.batcher.chunks(&updates) {
            match ctx.store.apply_box_scores(chunk).await {
                Ok(updated) => report.rows_updated += updated,
                Err(e) => {
                    error!("Box score update failed for {}: {:#}", date, e);
                    report.fail_date(date, &e);
                    break;
                }
            }
        }
    }
}
