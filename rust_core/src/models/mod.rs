// Shared models for the college basketball ingest services
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

pub mod records;

pub use records::*;

/// Stable team identifier (`teams.team_id`).
pub type TeamId = i32;
/// Stable arena identifier (`arenas.arena_id`).
pub type ArenaId = i32;
/// Stored game identifier (`games.game_id`).
pub type GameId = i64;

// ============================================================================
// Reference rows (read-only tables)
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct TeamRow {
    pub team_id: TeamId,
    pub team_name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct AliasRow {
    pub alias_name: String,
    pub canonical_team_id: TeamId,
}

/// An arena candidate for a scraped arena name.
///
/// `home_team_id` is `None` for tournament and other neutral venues.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct ArenaRow {
    pub arena_id: ArenaId,
    #[sqlx(rename = "team_id")]
    pub home_team_id: Option<TeamId>,
}

/// The identifying columns of a game already in the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct StoredGame {
    pub game_id: GameId,
    pub team1_id: TeamId,
    pub team2_id: TeamId,
}

// ============================================================================
// Scraped (raw) rows
// ============================================================================

/// One row of the FanMatch table, before any name resolution.
///
/// Team names still carry seed/rank decorations; every optional field is
/// `None` when the cell was absent or unparsable.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ScrapedGame {
    pub team1: String,
    pub team1_rank: Option<String>,
    pub team2: String,
    pub team2_rank: Option<String>,
    pub result: Option<ScrapedResult>,
    pub prediction: Option<ScrapedPrediction>,
    pub location: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ScrapedResult {
    pub winner: String,
    pub loser: String,
    pub winner_score: i32,
    pub loser_score: i32,
    pub possessions: Option<i32>,
    /// Overtime indicator as scraped ("OT", "2OT"), or a missing marker.
    pub ot: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ScrapedPrediction {
    pub predicted_winner: String,
    pub predicted_loser: String,
    /// Predicted score text, e.g. "78-72".
    pub predicted_score: Option<String>,
    /// Win probability text, e.g. "65%".
    pub win_probability: Option<String>,
    pub predicted_possessions: Option<i32>,
}

/// A FanMatch row that links to a box score page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BoxScoreLink {
    pub team1: String,
    pub team2: String,
    pub url: String,
}

/// Per-period scoring table from a box score page.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineScore {
    pub teams: Vec<LineScoreTeam>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineScoreTeam {
    pub team_name: String,
    /// Regulation periods followed by any overtime periods.
    pub periods: Vec<i32>,
    pub total: i32,
}

/// One team's value from a TeamRankings stat table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatRow {
    pub team: String,
    pub value: Option<String>,
    pub stat: String,
    pub date: NaiveDate,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scraped_game_default_is_empty() {
        let game = ScrapedGame::default();
        assert!(game.result.is_none());
        assert!(game.prediction.is_none());
        assert!(game.location.is_none());
    }
}
