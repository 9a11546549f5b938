//! Assembled records, one type per record kind.
//!
//! These are the payloads handed to the store. Each kind carries its own
//! natural key so the batcher can de-duplicate before submitting.

use super::{ArenaId, GameId, TeamId};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Where a game is played and who, if anyone, is at home.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SiteAssignment {
    pub arena_id: Option<ArenaId>,
    pub home_team_id: Option<TeamId>,
    /// `None` when the arena could not be resolved.
    pub is_neutral_site: Option<bool>,
}

impl SiteAssignment {
    pub fn unresolved() -> Self {
        Self::default()
    }
}

/// Final result of a completed game (`games` table).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResultRecord {
    pub game_date: NaiveDate,
    pub team1_id: TeamId,
    pub team1_rank: String,
    pub team2_id: TeamId,
    pub team2_rank: String,
    pub winner_id: TeamId,
    pub winner_score: i32,
    pub loser_id: TeamId,
    pub loser_score: i32,
    pub predicted_score: Option<String>,
    pub game_total: i32,
    pub actual_score: String,
    pub win_probability: Option<String>,
    pub predicted_possessions: Option<i32>,
    pub actual_possessions: Option<i32>,
    pub ot: bool,
    pub ot_count: i32,
    pub site: SiteAssignment,
    pub location_text: Option<String>,
}

/// Pre-game prediction (`day_schedule` table).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PredictionRecord {
    pub game_date: NaiveDate,
    pub team1_id: TeamId,
    pub team2_id: TeamId,
    pub predicted_winner: TeamId,
    pub predicted_loser: TeamId,
    pub predicted_score: Option<String>,
    pub predicted_possessions: Option<i32>,
    pub win_probability: Option<String>,
    pub location: Option<String>,
    pub city: Option<String>,
    pub state: Option<String>,
    pub site: SiteAssignment,
}

/// First half, second half and overtime points for one side.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HalfScores {
    pub h1: i32,
    pub h2: i32,
    pub ot: i32,
}

/// A resolved line-score row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SideScore {
    pub team_id: TeamId,
    pub halves: HalfScores,
}

/// A collected box score, not yet matched against a stored game.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BoxScoreLine {
    pub game_date: NaiveDate,
    pub team1_id: TeamId,
    pub team2_id: TeamId,
    pub sides: Vec<SideScore>,
    pub ot_count: i32,
}

/// Half-by-half fields merged into an existing `games` row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BoxScoreUpdate {
    pub game_id: GameId,
    pub team1: Option<HalfScores>,
    pub team2: Option<HalfScores>,
    pub ot_count: i32,
}

/// One team's daily stat observation (`tr_team_daily_stats` table).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailyStatRecord {
    pub team_id: TeamId,
    pub stat_name: String,
    pub stat_value: Option<f64>,
    pub stat_date: NaiveDate,
    pub season_year: i32,
    pub source: String,
}

/// Natural key of a game row: date plus the unordered team pair, lower id first.
pub type GameKey = (NaiveDate, TeamId, TeamId);

/// Key for a matchup on a date; `(a, b)` and `(b, a)` give the same key.
pub fn game_key(date: NaiveDate, a: TeamId, b: TeamId) -> GameKey {
    (date, a.min(b), a.max(b))
}

/// Natural key of a stat row.
pub type StatKey = (TeamId, String, NaiveDate);

impl ResultRecord {
    pub fn natural_key(&self) -> GameKey {
        game_key(self.game_date, self.team1_id, self.team2_id)
    }
}

impl PredictionRecord {
    pub fn natural_key(&self) -> GameKey {
        game_key(self.game_date, self.team1_id, self.team2_id)
    }
}

impl DailyStatRecord {
    pub fn natural_key(&self) -> StatKey {
        (self.team_id, self.stat_name.clone(), self.stat_date)
    }
}

/// A chunk of records of one kind, tagged for the store.
#[derive(Debug, Clone, Copy)]
pub enum RecordBatch<'a> {
    Results(&'a [ResultRecord]),
    Predictions(&'a [PredictionRecord]),
    DailyStats(&'a [DailyStatRecord]),
}

impl RecordBatch<'_> {
    pub fn len(&self) -> usize {
        match self {
            RecordBatch::Results(rows) => rows.len(),
            RecordBatch::Predictions(rows) => rows.len(),
            RecordBatch::DailyStats(rows) => rows.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Target table name.
    pub fn table(&self) -> &'static str {
        match self {
            RecordBatch::Results(_) => "games",
            RecordBatch::Predictions(_) => "day_schedule",
            RecordBatch::DailyStats(_) => "tr_team_daily_stats",
        }
    }

    /// Uniqueness constraint the upsert resolves conflicts on.
    pub fn conflict_columns(&self) -> &'static str {
        match self {
            RecordBatch::Results(_) | RecordBatch::Predictions(_) => {
                "game_date, LEAST(team1_id, team2_id), GREATEST(team1_id, team2_id)"
            }
            RecordBatch::DailyStats(_) => "team_id, stat_name, stat_date",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_batch_targets() {
        let stats: Vec<DailyStatRecord> = Vec::new();
        let batch = RecordBatch::DailyStats(&stats);
        assert!(batch.is_empty());
        assert_eq!(batch.table(), "tr_team_daily_stats");
        assert_eq!(batch.conflict_columns(), "team_id, stat_name, stat_date");

        let results: Vec<ResultRecord> = Vec::new();
        assert_eq!(RecordBatch::Results(&results).table(), "games");
        let predictions: Vec<PredictionRecord> = Vec::new();
        assert_eq!(
            RecordBatch::Predictions(&predictions).conflict_columns(),
            "game_date, LEAST(team1_id, team2_id), GREATEST(team1_id, team2_id)"
        );
    }

    #[test]
    fn test_game_key_ignores_team_order() {
        let date = NaiveDate::from_ymd_opt(2024, 2, 5).unwrap();
        assert_eq!(game_key(date, 4, 3), game_key(date, 3, 4));
        assert_eq!(game_key(date, 4, 3), (date, 3, 4));
    }
}
