//! PostgreSQL store operations
//!
//! Reference lookups and chunked upserts for the games, day_schedule and
//! tr_team_daily_stats tables.

use super::IngestStore;
use crate::db::check_pool_health;
use crate::db::pool::{create_pool, DbPoolConfig};
use crate::models::{
    AliasRow, ArenaRow, BoxScoreUpdate, DailyStatRecord, PredictionRecord, RecordBatch,
    ResultRecord, StoredGame, TeamRow,
};
use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::NaiveDate;
use sqlx::{PgPool, Postgres, QueryBuilder};
use tracing::debug;

#[derive(Debug, Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Connect with the given pool configuration and check the connection.
    pub async fn connect(database_url: &str, config: DbPoolConfig) -> Result<Self> {
        let pool = create_pool(database_url, config).await?;
        check_pool_health(&pool).await?;
        Ok(Self::new(pool))
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    async fn upsert_results(&self, rows: &[ResultRecord]) -> Result<u64> {
        let mut qb: QueryBuilder<Postgres> = QueryBuilder::new(
            "INSERT INTO games (
                game_date, team1_id, team1_rank, team2_id, team2_rank,
                winner_id, winner_score, loser_id, loser_score, predicted_score,
                game_total, actual_score, win_probability, predicted_possessions,
                actual_possessions, ot, ot_count, arena_id, home_team_id,
                is_neutral_site, location_text
            ) ",
        );
        qb.push_values(rows, |mut b, r| {
            b.push_bind(r.game_date)
                .push_bind(r.team1_id)
                .push_bind(r.team1_rank.clone())
                .push_bind(r.team2_id)
                .push_bind(r.team2_rank.clone())
                .push_bind(r.winner_id)
                .push_bind(r.winner_score)
                .push_bind(r.loser_id)
                .push_bind(r.loser_score)
                .push_bind(r.predicted_score.clone())
                .push_bind(r.game_total)
                .push_bind(r.actual_score.clone())
                .push_bind(r.win_probability.clone())
                .push_bind(r.predicted_possessions)
                .push_bind(r.actual_possessions)
                .push_bind(r.ot)
                .push_bind(r.ot_count)
                .push_bind(r.site.arena_id)
                .push_bind(r.site.home_team_id)
                .push_bind(r.site.is_neutral_site)
                .push_bind(r.location_text.clone());
        });
        // A matchup is one row whichever team is listed first. When the order
        // flips, half scores move with their team. ot_count from the result
        // feed is a lower bound; keep a larger count from the box-score merge.
        qb.push(
            " ON CONFLICT (game_date, LEAST(team1_id, team2_id), GREATEST(team1_id, team2_id))
            DO UPDATE SET
                h1_t1_score = CASE WHEN games.team1_id = EXCLUDED.team1_id
                    THEN games.h1_t1_score ELSE games.h1_t2_score END,
                h2_t1_score = CASE WHEN games.team1_id = EXCLUDED.team1_id
                    THEN games.h2_t1_score ELSE games.h2_t2_score END,
                ot_t1_score = CASE WHEN games.team1_id = EXCLUDED.team1_id
                    THEN games.ot_t1_score ELSE games.ot_t2_score END,
                h1_t2_score = CASE WHEN games.team1_id = EXCLUDED.team1_id
                    THEN games.h1_t2_score ELSE games.h1_t1_score END,
                h2_t2_score = CASE WHEN games.team1_id = EXCLUDED.team1_id
                    THEN games.h2_t2_score ELSE games.h2_t1_score END,
                ot_t2_score = CASE WHEN games.team1_id = EXCLUDED.team1_id
                    THEN games.ot_t2_score ELSE games.ot_t1_score END,
                team1_id = EXCLUDED.team1_id,
                team2_id = EXCLUDED.team2_id,
                team1_rank = EXCLUDED.team1_rank,
                team2_rank = EXCLUDED.team2_rank,
                winner_id = EXCLUDED.winner_id,
                winner_score = EXCLUDED.winner_score,
                loser_id = EXCLUDED.loser_id,
                loser_score = EXCLUDED.loser_score,
                predicted_score = EXCLUDED.predicted_score,
                game_total = EXCLUDED.game_total,
                actual_score = EXCLUDED.actual_score,
                win_probability = EXCLUDED.win_probability,
                predicted_possessions = EXCLUDED.predicted_possessions,
                actual_possessions = EXCLUDED.actual_possessions,
                ot = EXCLUDED.ot,
                ot_count = GREATEST(games.ot_count, EXCLUDED.ot_count),
                arena_id = EXCLUDED.arena_id,
                home_team_id = EXCLUDED.home_team_id,
                is_neutral_site = EXCLUDED.is_neutral_site,
                location_text = EXCLUDED.location_text",
        );

        let result = qb
            .build()
            .execute(&self.pool)
            .await
            .context("Failed to upsert games")?;
        Ok(result.rows_affected())
    }

    async fn upsert_predictions(&self, rows: &[PredictionRecord]) -> Result<u64> {
        let mut qb: QueryBuilder<Postgres> = QueryBuilder::new(
            "INSERT INTO day_schedule (
                game_date, team1_id, team2_id, predicted_winner, predicted_loser,
                predicted_score, predicted_possessions, win_probability, location,
                city, state, arena_id, home_team_id, is_neutral_site
            ) ",
        );
        qb.push_values(rows, |mut b, r| {
            b.push_bind(r.game_date)
                .push_bind(r.team1_id)
                .push_bind(r.team2_id)
                .push_bind(r.predicted_winner)
                .push_bind(r.predicted_loser)
                .push_bind(r.predicted_score.clone())
                .push_bind(r.predicted_possessions)
                .push_bind(r.win_probability.clone())
                .push_bind(r.location.clone())
                .push_bind(r.city.clone())
                .push_bind(r.state.clone())
                .push_bind(r.site.arena_id)
                .push_bind(r.site.home_team_id)
                .push_bind(r.site.is_neutral_site);
        });
        qb.push(
            " ON CONFLICT (game_date, LEAST(team1_id, team2_id), GREATEST(team1_id, team2_id))
            DO UPDATE SET
                team1_id = EXCLUDED.team1_id,
                team2_id = EXCLUDED.team2_id,
                predicted_winner = EXCLUDED.predicted_winner,
                predicted_loser = EXCLUDED.predicted_loser,
                predicted_score = EXCLUDED.predicted_score,
                predicted_possessions = EXCLUDED.predicted_possessions,
                win_probability = EXCLUDED.win_probability,
                location = EXCLUDED.location,
                city = EXCLUDED.city,
                state = EXCLUDED.state,
                arena_id = EXCLUDED.arena_id,
                home_team_id = EXCLUDED.home_team_id,
                is_neutral_site = EXCLUDED.is_neutral_site",
        );

        let result = qb
            .build()
            .execute(&self.pool)
            .await
            .context("Failed to upsert day_schedule")?;
        Ok(result.rows_affected())
    }

    async fn upsert_daily_stats(&self, rows: &[DailyStatRecord]) -> Result<u64> {
        let mut qb: QueryBuilder<Postgres> = QueryBuilder::new(
            "INSERT INTO tr_team_daily_stats (
                team_id, stat_name, stat_value, stat_date, season_year, source
            ) ",
        );
        qb.push_values(rows, |mut b, r| {
            b.push_bind(r.team_id)
                .push_bind(r.stat_name.clone())
                .push_bind(r.stat_value)
                .push_bind(r.stat_date)
                .push_bind(r.season_year)
                .push_bind(r.source.clone());
        });
        qb.push(
            " ON CONFLICT (team_id, stat_name, stat_date) DO UPDATE SET
                stat_value = EXCLUDED.stat_value,
                season_year = EXCLUDED.season_year,
                source = EXCLUDED.source",
        );

        let result = qb
            .build()
            .execute(&self.pool)
            .await
            .context("Failed to upsert tr_team_daily_stats")?;
        Ok(result.rows_affected())
    }
}

#[async_trait]
impl IngestStore for PgStore {
    async fn teams(&self) -> Result<Vec<TeamRow>> {
        sqlx::query_as::<_, TeamRow>("SELECT team_id, team_name FROM teams")
            .fetch_all(&self.pool)
            .await
            .context("Failed to load teams")
    }

    async fn team_aliases(&self) -> Result<Vec<AliasRow>> {
        sqlx::query_as::<_, AliasRow>("SELECT alias_name, canonical_team_id FROM team_aliases")
            .fetch_all(&self.pool)
            .await
            .context("Failed to load team aliases")
    }

    async fn arenas_named(&self, arena_name: &str) -> Result<Vec<ArenaRow>> {
        sqlx::query_as::<_, ArenaRow>(
            "SELECT arena_id, team_id FROM arenas WHERE arena_name = $1 ORDER BY arena_id",
        )
        .bind(arena_name)
        .fetch_all(&self.pool)
        .await
        .with_context(|| format!("Failed to look up arena {:?}", arena_name))
    }

    async fn games_on(&self, date: NaiveDate) -> Result<Vec<StoredGame>> {
        sqlx::query_as::<_, StoredGame>(
            "SELECT game_id, team1_id, team2_id FROM games WHERE game_date = $1",
        )
        .bind(date)
        .fetch_all(&self.pool)
        .await
        .with_context(|| format!("Failed to load games for {}", date))
    }

    async fn upsert(&self, batch: RecordBatch<'_>) -> Result<u64> {
        if batch.is_empty() {
            return Ok(0);
        }
        match batch {
            RecordBatch::Results(rows) => self.upsert_results(rows).await,
            RecordBatch::Predictions(rows) => self.upsert_predictions(rows).await,
            RecordBatch::DailyStats(rows) => self.upsert_daily_stats(rows).await,
        }
    }

    async fn apply_box_scores(&self, updates: &[BoxScoreUpdate]) -> Result<u64> {
        let mut updated = 0;
        for update in updates {
            let t1 = update.team1;
            let t2 = update.team2;
            let result = sqlx::query(
                r#"
                UPDATE games SET
                    h1_t1_score = COALESCE($2, h1_t1_score),
                    h2_t1_score = COALESCE($3, h2_t1_score),
                    ot_t1_score = COALESCE($4, ot_t1_score),
                    h1_t2_score = COALESCE($5, h1_t2_score),
                    h2_t2_score = COALESCE($6, h2_t2_score),
                    ot_t2_score = COALESCE($7, ot_t2_score),
                    ot_count = $8
                WHERE game_id = $1
                "#,
            )
            .bind(update.game_id)
            .bind(t1.map(|h| h.h1))
            .bind(t1.map(|h| h.h2))
            .bind(t1.map(|h| h.ot))
            .bind(t2.map(|h| h.h1))
            .bind(t2.map(|h| h.h2))
            .bind(t2.map(|h| h.ot))
            .bind(update.ot_count)
            .execute(&self.pool)
            .await
            .with_context(|| format!("Failed to apply box score to game {}", update.game_id))?;

            debug!("Applied box score to game {}", update.game_id);
            updated += result.rows_affected();
        }
        Ok(updated)
    }

    fn store_name(&self) -> &str {
        "postgres"
    }
}
