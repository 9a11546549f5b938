//! Record assembly.
//!
//! Turns scraped rows plus resolved identifiers into the typed records the
//! store accepts. Everything here is pure; store lookups (arenas, stored games)
//! are done by the pipelines and passed in.

use crate::identity::TeamDirectory;
use crate::location::ParsedLocation;
use crate::models::{
    ArenaRow, BoxScoreLine, BoxScoreUpdate, DailyStatRecord, HalfScores, LineScore,
    LineScoreTeam, PredictionRecord, ResultRecord, ScrapedGame, SideScore, SiteAssignment,
    StatRow, StoredGame, TeamId,
};
use crate::normalize::{clean_rank, clean_team_name, clean_value, is_missing, season_year};
use chrono::NaiveDate;
use thiserror::Error;
use tracing::debug;

/// Source tag stored with TeamRankings observations.
pub const TEAMRANKINGS_SOURCE: &str = "TR";

/// Regulation periods in a line score; anything after is overtime.
pub const REGULATION_PERIODS: usize = 4;

/// Why a scraped row did not become a record.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SkipReason {
    #[error("unresolved team names: {}", .0.join(", "))]
    UnresolvedTeams(Vec<String>),
    #[error("game has no final result")]
    NotFinal,
    #[error("game has no prediction")]
    NoPrediction,
    #[error("line score for {0:?} has {1} periods")]
    IncompleteLineScore(String, usize),
    #[error("no stored game for teams {0} and {1}")]
    NoStoredGame(TeamId, TeamId),
}

/// Decide home team and neutral site from the game's arena.
///
/// A resolved arena whose home team plays in the game makes that team the
/// home side. Any other resolved arena is a neutral site. An unresolved arena
/// leaves both home team and neutral flag unknown.
pub fn determine_site(arena: Option<ArenaRow>, team1: TeamId, team2: TeamId) -> SiteAssignment {
    let Some(arena) = arena else {
        return SiteAssignment::unresolved();
    };

    let home_team_id = arena
        .home_team_id
        .filter(|&home| home == team1 || home == team2);

    SiteAssignment {
        arena_id: Some(arena.arena_id),
        home_team_id,
        is_neutral_site: Some(home_team_id.is_none()),
    }
}

/// Overtime periods implied by an indicator like "OT" or "2OT".
///
/// Missing indicator means no overtime. Without an explicit count a single
/// overtime is assumed; the box-score merge later overwrites this count.
pub fn overtime_count(indicator: Option<&str>) -> i32 {
    if is_missing(indicator) {
        return 0;
    }
    let text = indicator.unwrap_or_default().trim();
    let digits: String = text.chars().take_while(|c| c.is_ascii_digit()).collect();
    digits.parse::<i32>().ok().filter(|&n| n > 0).unwrap_or(1)
}

/// Resolve winner and loser of a completed game.
pub fn result_teams(game: &ScrapedGame, teams: &TeamDirectory) -> Result<(TeamId, TeamId), SkipReason> {
    let result = game.result.as_ref().ok_or(SkipReason::NotFinal)?;
    teams
        .resolve_pair(&clean_team_name(&result.winner), &clean_team_name(&result.loser))
        .map_err(SkipReason::UnresolvedTeams)
}

/// Resolve predicted winner and loser.
pub fn prediction_teams(
    game: &ScrapedGame,
    teams: &TeamDirectory,
) -> Result<(TeamId, TeamId), SkipReason> {
    let prediction = game.prediction.as_ref().ok_or(SkipReason::NoPrediction)?;
    teams
        .resolve_pair(
            &clean_team_name(&prediction.predicted_winner),
            &clean_team_name(&prediction.predicted_loser),
        )
        .map_err(SkipReason::UnresolvedTeams)
}

/// Build the final-result record for a completed game.
pub fn assemble_result(
    date: NaiveDate,
    game: &ScrapedGame,
    (winner_id, loser_id): (TeamId, TeamId),
    site: SiteAssignment,
) -> Result<ResultRecord, SkipReason> {
    let result = game.result.as_ref().ok_or(SkipReason::NotFinal)?;

    let winner_listed_first = clean_team_name(&result.winner) == clean_team_name(&game.team1);
    let (winner_rank, loser_rank) = if winner_listed_first {
        (clean_rank(game.team1_rank.as_deref()), clean_rank(game.team2_rank.as_deref()))
    } else {
        (clean_rank(game.team2_rank.as_deref()), clean_rank(game.team1_rank.as_deref()))
    };

    let ot_count = overtime_count(result.ot.as_deref());
    let prediction = game.prediction.as_ref();

    Ok(ResultRecord {
        game_date: date,
        team1_id: winner_id,
        team1_rank: winner_rank,
        team2_id: loser_id,
        team2_rank: loser_rank,
        winner_id,
        winner_score: result.winner_score,
        loser_id,
        loser_score: result.loser_score,
        predicted_score: prediction.and_then(|p| p.predicted_score.clone()),
        game_total: result.winner_score + result.loser_score,
        actual_score: format!("{}-{}", result.winner_score, result.loser_score),
        win_probability: prediction.and_then(|p| p.win_probability.clone()),
        predicted_possessions: prediction.and_then(|p| p.predicted_possessions),
        actual_possessions: result.possessions,
        ot: ot_count > 0,
        ot_count,
        site,
        location_text: game.location.clone(),
    })
}

/// Build the pre-game prediction record.
pub fn assemble_prediction(
    date: NaiveDate,
    game: &ScrapedGame,
    (winner_id, loser_id): (TeamId, TeamId),
    site: SiteAssignment,
) -> Result<PredictionRecord, SkipReason> {
    let prediction = game.prediction.as_ref().ok_or(SkipReason::NoPrediction)?;
    let location = game
        .location
        .as_deref()
        .map(ParsedLocation::parse)
        .unwrap_or_default();

    Ok(PredictionRecord {
        game_date: date,
        team1_id: winner_id,
        team2_id: loser_id,
        predicted_winner: winner_id,
        predicted_loser: loser_id,
        predicted_score: prediction.predicted_score.clone(),
        predicted_possessions: prediction.predicted_possessions,
        win_probability: prediction.win_probability.clone(),
        location: game.location.clone(),
        city: location.city,
        state: location.state,
        site,
    })
}

/// First half, second half and overtime subtotals for one line-score row.
pub fn half_scores(team: &LineScoreTeam) -> Result<HalfScores, SkipReason> {
    let p = &team.periods;
    if p.len() < REGULATION_PERIODS {
        return Err(SkipReason::IncompleteLineScore(team.team_name.clone(), p.len()));
    }
    let h1 = p[0] + p[1];
    let h2 = p[2] + p[3];
    let ot = if p.len() > REGULATION_PERIODS {
        team.total - h1 - h2
    } else {
        0
    };
    Ok(HalfScores { h1, h2, ot })
}

/// Overtime periods in a line score.
pub fn line_score_overtimes(line: &LineScore) -> i32 {
    line.teams
        .iter()
        .map(|t| t.periods.len().saturating_sub(REGULATION_PERIODS))
        .max()
        .unwrap_or(0) as i32
}

/// Build a collected box score for a matchup whose teams already resolved.
///
/// Line-score rows whose name does not resolve are dropped and that side's
/// subtotals stay empty.
pub fn assemble_box_score_line(
    date: NaiveDate,
    (team1_id, team2_id): (TeamId, TeamId),
    line: &LineScore,
    teams: &TeamDirectory,
) -> Result<BoxScoreLine, SkipReason> {
    let mut sides = Vec::with_capacity(2);
    for row in &line.teams {
        let name = clean_team_name(&row.team_name);
        match teams.resolve(&name) {
            Some(team_id) if team_id == team1_id || team_id == team2_id => {
                sides.push(SideScore {
                    team_id,
                    halves: half_scores(row)?,
                });
            }
            Some(team_id) => {
                debug!("Line score team {} ({}) is not in this matchup", name, team_id);
            }
            None => debug!("Line score team {:?} did not resolve", name),
        }
    }

    Ok(BoxScoreLine {
        game_date: date,
        team1_id,
        team2_id,
        sides,
        ot_count: line_score_overtimes(line),
    })
}

/// Attribute a collected box score to a stored game's team columns.
pub fn assemble_box_score_update(line: &BoxScoreLine, stored: &StoredGame) -> BoxScoreUpdate {
    let side = |team_id: TeamId| {
        line.sides
            .iter()
            .find(|s| s.team_id == team_id)
            .map(|s| s.halves)
    };
    BoxScoreUpdate {
        game_id: stored.game_id,
        team1: side(stored.team1_id),
        team2: side(stored.team2_id),
        ot_count: line.ot_count,
    }
}

/// Build a daily stat observation.
pub fn assemble_daily_stat(row: &StatRow, teams: &TeamDirectory) -> Result<DailyStatRecord, SkipReason> {
    let team_id = teams
        .resolve(&row.team)
        .ok_or_else(|| SkipReason::UnresolvedTeams(vec![row.team.clone()]))?;

    Ok(DailyStatRecord {
        team_id,
        stat_name: row.stat.clone(),
        stat_value: clean_value(row.value.as_deref()),
        stat_date: row.date,
        season_year: season_year(row.date),
        source: TEAMRANKINGS_SOURCE.to_string(),
    })
}
