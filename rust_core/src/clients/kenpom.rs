//! KenPom client.
//!
//! Logs in once with a cookie-backed session, then fetches FanMatch day pages
//! and box score pages. Parsing is split into free functions over the page
//! HTML so it can be exercised without the network.

use super::html::{cell_text, find_table, selector, table_rows, HtmlParseError};
use crate::config::KenPomCredentials;
use crate::models::{
    BoxScoreLink, LineScore, LineScoreTeam, ScrapedGame, ScrapedPrediction, ScrapedResult,
};
use crate::normalize::{clean_team_name, parse_int};
use anyhow::{anyhow, Context, Result};
use chrono::NaiveDate;
use regex::Regex;
use reqwest::Client;
use scraper::Html;
use std::sync::OnceLock;
use tracing::{debug, info, warn};

pub const KENPOM_BASE_URL: &str = "https://kenpom.com";

const FANMATCH_TABLE: &str = "#fanmatch-table";
const LINESCORE_TABLE: &str = "#linescore-table2";
const USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36";

// FanMatch columns: Game, Prediction, Time, Location, ...
const GAME_COL: usize = 0;
const PREDICTION_COL: usize = 1;
const LOCATION_COL: usize = 3;

static FINAL_RE: OnceLock<Option<Regex>> = OnceLock::new();
static SCHEDULED_RE: OnceLock<Option<Regex>> = OnceLock::new();
static PREDICTION_RE: OnceLock<Option<Regex>> = OnceLock::new();

/// "7 Duke 80, 15 North Carolina 75 [70] OT"
fn final_re() -> Option<&'static Regex> {
    FINAL_RE.get_or_init(|| {
        Regex::new(
            r"^(?:(?P<r1>\d+)\s+)?(?P<t1>.+?)\s+(?P<s1>\d+),\s+(?:(?P<r2>\d+)\s+)?(?P<t2>.+?)\s+(?P<s2>\d+)(?:\s+(?P<ot1>\d*OT))?(?:\s+\[(?P<poss>\d+)\])?(?:\s+(?P<ot2>\d*OT))?",
        )
        .ok()
    })
    .as_ref()
}

/// "7 Duke vs. 15 North Carolina" or "15 North Carolina at 7 Duke"
fn scheduled_re() -> Option<&'static Regex> {
    SCHEDULED_RE.get_or_init(|| {
        Regex::new(
            r"^(?:(?P<r1>\d+)\s+)?(?P<t1>.+?)\s+(?:vs\.|at)\s+(?:(?P<r2>\d+)\s+)?(?P<t2>.+?)\s*$",
        )
        .ok()
    })
    .as_ref()
}

/// "Duke 78-72 (65%) [68]"
fn prediction_re() -> Option<&'static Regex> {
    PREDICTION_RE.get_or_init(|| {
        Regex::new(
            r"^(?P<team>.+?)\s+(?P<score>\d+-\d+)\s+\((?P<prob>[\d.]+%)\)(?:\s+\[(?P<poss>\d+)\])?",
        )
        .ok()
    })
    .as_ref()
}

#[derive(Clone)]
pub struct KenPomClient {
    client: Client,
    base_url: String,
}

impl std::fmt::Debug for KenPomClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KenPomClient")
            .field("base_url", &self.base_url)
            .finish()
    }
}

impl KenPomClient {
    pub fn new() -> Result<Self> {
        Self::with_base_url(KENPOM_BASE_URL)
    }

    pub fn with_base_url(base_url: &str) -> Result<Self> {
        let client = Client::builder()
            .cookie_store(true)
            .user_agent(USER_AGENT)
            .build()
            .context("Failed to build KenPom HTTP client")?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    /// Build a client and log in. Failure here is fatal for the run.
    pub async fn login(credentials: &KenPomCredentials) -> Result<Self> {
        let client = Self::new()?;
        client.authenticate(credentials).await?;
        Ok(client)
    }

    async fn authenticate(&self, credentials: &KenPomCredentials) -> Result<()> {
        let url = format!("{}/handlers/login_handler.php", self.base_url);
        let body = self
            .client
            .post(&url)
            .form(&[
                ("email", credentials.user.as_str()),
                ("password", credentials.password.as_str()),
                ("submit", "Login!"),
            ])
            .send()
            .await
            .context("KenPom login request failed")?
            .error_for_status()
            .context("KenPom login rejected")?
            .text()
            .await?;

        let page = body.to_lowercase();
        if !page.contains("logout") && !page.contains("log out") {
            return Err(anyhow!("KenPom login did not produce a session for {}", credentials.user));
        }
        info!("Logged in to KenPom as {}", credentials.user);
        Ok(())
    }

    async fn get_html(&self, url: &str) -> Result<String> {
        debug!("GET {}", url);
        self.client
            .get(url)
            .send()
            .await
            .with_context(|| format!("Request to {} failed", url))?
            .error_for_status()
            .with_context(|| format!("Bad status from {}", url))?
            .text()
            .await
            .with_context(|| format!("Failed to read body from {}", url))
    }

    fn fanmatch_url(&self, date: NaiveDate) -> String {
        format!("{}/fanmatch.php?d={}", self.base_url, date.format("%Y-%m-%d"))
    }

    /// FanMatch rows for one date.
    pub async fn fanmatch(&self, date: NaiveDate) -> Result<Vec<ScrapedGame>> {
        let html = self.get_html(&self.fanmatch_url(date)).await?;
        let games = parse_fanmatch(&html)?;
        debug!("Parsed {} FanMatch rows for {}", games.len(), date);
        Ok(games)
    }

    /// Box score links for one date; a page without the table yields none.
    pub async fn box_score_links(&self, date: NaiveDate) -> Result<Vec<BoxScoreLink>> {
        let html = self.get_html(&self.fanmatch_url(date)).await?;
        Ok(parse_box_score_links(&html, &self.base_url)?)
    }

    /// Line score from one box score page, or `None` when the page has none.
    pub async fn line_score(&self, url: &str) -> Result<Option<LineScore>> {
        let html = self.get_html(url).await?;
        Ok(parse_line_score(&html)?)
    }
}

/// Parse the FanMatch table into scraped games.
///
/// Rows whose game cell matches neither the final nor the scheduled form are
/// dropped with a debug log. KenPom omits the table on days with no games, so
/// a page without it yields an empty list.
pub fn parse_fanmatch(html: &str) -> Result<Vec<ScrapedGame>, HtmlParseError> {
    let document = Html::parse_document(html);
    let table = match find_table(&document, FANMATCH_TABLE) {
        Ok(table) => table,
        Err(HtmlParseError::MissingTable(_)) => {
            debug!("No FanMatch table on page");
            return Ok(Vec::new());
        }
        Err(e) => return Err(e),
    };

    let games = table_rows(table)?
        .iter()
        .filter_map(|cells| {
            let game = parse_fanmatch_row(cells);
            if game.is_none() {
                debug!("Unparsed FanMatch row: {:?}", cells.first());
            }
            game
        })
        .collect();
    Ok(games)
}

fn parse_fanmatch_row(cells: &[String]) -> Option<ScrapedGame> {
    let game_cell = cells.get(GAME_COL)?;
    let mut game = parse_game_cell(game_cell)?;

    if let Some(cell) = cells.get(PREDICTION_COL) {
        game.prediction = parse_prediction_cell(cell, &game.team1, &game.team2);
    }
    game.location = cells
        .get(LOCATION_COL)
        .map(|c| c.trim().to_string())
        .filter(|c| !c.is_empty());
    Some(game)
}

/// Teams, ranks and, for completed games, the final result.
pub fn parse_game_cell(text: &str) -> Option<ScrapedGame> {
    let text = text.trim();

    if let Some(caps) = final_re()?.captures(text) {
        let team1 = caps["t1"].trim().to_string();
        let team2 = caps["t2"].trim().to_string();
        let score1: i32 = caps["s1"].parse().ok()?;
        let score2: i32 = caps["s2"].parse().ok()?;
        let ot = caps
            .name("ot1")
            .or_else(|| caps.name("ot2"))
            .map(|m| m.as_str().to_string());

        let (winner, loser, winner_score, loser_score) = if score1 >= score2 {
            (team1.clone(), team2.clone(), score1, score2)
        } else {
            (team2.clone(), team1.clone(), score2, score1)
        };

        return Some(ScrapedGame {
            team1,
            team1_rank: caps.name("r1").map(|m| m.as_str().to_string()),
            team2,
            team2_rank: caps.name("r2").map(|m| m.as_str().to_string()),
            result: Some(ScrapedResult {
                winner,
                loser,
                winner_score,
                loser_score,
                possessions: parse_int(caps.name("poss").map(|m| m.as_str())),
                ot,
            }),
            prediction: None,
            location: None,
        });
    }

    let caps = scheduled_re()?.captures(text)?;
    Some(ScrapedGame {
        team1: caps["t1"].trim().to_string(),
        team1_rank: caps.name("r1").map(|m| m.as_str().to_string()),
        team2: caps["t2"].trim().to_string(),
        team2_rank: caps.name("r2").map(|m| m.as_str().to_string()),
        result: None,
        prediction: None,
        location: None,
    })
}

/// Predicted winner, score, probability and tempo.
///
/// The predicted loser is whichever listed team is not the predicted winner;
/// a winner matching neither listed team yields `None`.
pub fn parse_prediction_cell(text: &str, team1: &str, team2: &str) -> Option<ScrapedPrediction> {
    let caps = prediction_re()?.captures(text.trim())?;
    let winner = caps["team"].trim().to_string();
    let winner_clean = clean_team_name(&winner);

    let loser = if winner_clean == clean_team_name(team1) {
        team2
    } else if winner_clean == clean_team_name(team2) {
        team1
    } else {
        debug!("Prediction winner {:?} is not {:?} or {:?}", winner, team1, team2);
        return None;
    };

    Some(ScrapedPrediction {
        predicted_winner: winner,
        predicted_loser: loser.to_string(),
        predicted_score: Some(caps["score"].to_string()),
        win_probability: Some(caps["prob"].to_string()),
        predicted_possessions: parse_int(caps.name("poss").map(|m| m.as_str())),
    })
}

/// Rows of the FanMatch table that carry two team links and a box score link.
///
/// A page without the table yields an empty list.
pub fn parse_box_score_links(html: &str, base_url: &str) -> Result<Vec<BoxScoreLink>, HtmlParseError> {
    let document = Html::parse_document(html);
    let table = match find_table(&document, FANMATCH_TABLE) {
        Ok(table) => table,
        Err(HtmlParseError::MissingTable(_)) => return Ok(Vec::new()),
        Err(e) => return Err(e),
    };

    let row_sel = selector("tr")?;
    let link_sel = selector("a[href]")?;
    let base = base_url.trim_end_matches('/');

    let mut links = Vec::new();
    for row in table.select(&row_sel) {
        let mut teams = Vec::new();
        let mut box_href = None;
        for anchor in row.select(&link_sel) {
            let href = anchor.value().attr("href").unwrap_or_default();
            if href.contains("team.php?") {
                teams.push(cell_text(anchor));
            } else if href.contains("box.php?") && box_href.is_none() {
                box_href = Some(href.trim_start_matches('/').to_string());
            }
        }
        if let (2, Some(href)) = (teams.len(), box_href) {
            links.push(BoxScoreLink {
                team1: teams[0].clone(),
                team2: teams[1].clone(),
                url: format!("{}/{}", base, href),
            });
        }
    }
    Ok(links)
}

/// Per-period scoring from a box score page.
///
/// Each data row is team name, one cell per period, then the total. Rows with
/// non-numeric scores are dropped.
pub fn parse_line_score(html: &str) -> Result<Option<LineScore>, HtmlParseError> {
    let document = Html::parse_document(html);
    let table = match find_table(&document, LINESCORE_TABLE) {
        Ok(table) => table,
        Err(HtmlParseError::MissingTable(_)) => return Ok(None),
        Err(e) => return Err(e),
    };

    let mut teams = Vec::new();
    for cells in table_rows(table)? {
        let Some((name, scores)) = cells.split_first() else {
            continue;
        };
        let Some((total, periods)) = scores.split_last() else {
            continue;
        };
        let periods: Option<Vec<i32>> = periods.iter().map(|c| c.trim().parse().ok()).collect();
        match (periods, total.trim().parse::<i32>()) {
            (Some(periods), Ok(total)) => teams.push(LineScoreTeam {
                team_name: name.trim().to_string(),
                periods,
                total,
            }),
            _ => warn!("Unparsed line score row for {:?}", name),
        }
    }

    if teams.is_empty() {
        return Err(HtmlParseError::EmptyTable(LINESCORE_TABLE.to_string()));
    }
    Ok(Some(LineScore { teams }))
}

#[cfg(test)]
mod tests {
    use super::*;

    const FANMATCH_PAGE: &str = r#"
        <html><body>
        <table id="fanmatch-table">
          <thead><tr><th>Game</th><th>Prediction</th><th>Time (ET)</th><th>Location</th></tr></thead>
          <tbody>
            <tr>
              <td>7 <a href="team.php?team=Duke">Duke</a> 80, 15 <a href="team.php?team=North+Carolina">North Carolina</a> 75 [70] <a href="box.php?g=1234">OT</a></td>
              <td>Duke 78-72 (65%) [68]</td>
              <td>Final</td>
              <td>Durham, NC Cameron Indoor Stadium</td>
            </tr>
            <tr>
              <td>12 <a href="team.php?team=Kansas">Kansas</a> vs. 40 <a href="team.php?team=Iowa+St.">Iowa St.</a></td>
              <td>Kansas 74-70 (62%) [66]</td>
              <td>9:00 pm</td>
              <td>Kansas City, MO T-Mobile Center</td>
            </tr>
          </tbody>
        </table>
        </body></html>"#;

    #[test]
    fn test_parse_fanmatch_final_and_scheduled() {
        let games = parse_fanmatch(FANMATCH_PAGE).unwrap();
        assert_eq!(games.len(), 2);

        let final_game = &games[0];
        assert_eq!(final_game.team1, "Duke");
        assert_eq!(final_game.team1_rank.as_deref(), Some("7"));
        let result = final_game.result.as_ref().unwrap();
        assert_eq!(result.winner, "Duke");
        assert_eq!(result.loser, "North Carolina");
        assert_eq!((result.winner_score, result.loser_score), (80, 75));
        assert_eq!(result.possessions, Some(70));
        assert_eq!(result.ot.as_deref(), Some("OT"));
        assert_eq!(
            final_game.location.as_deref(),
            Some("Durham, NC Cameron Indoor Stadium")
        );

        let scheduled = &games[1];
        assert!(scheduled.result.is_none());
        assert_eq!(scheduled.team2, "Iowa St.");
        let prediction = scheduled.prediction.as_ref().unwrap();
        assert_eq!(prediction.predicted_winner, "Kansas");
        assert_eq!(prediction.predicted_loser, "Iowa St.");
        assert_eq!(prediction.win_probability.as_deref(), Some("62%"));
        assert_eq!(prediction.predicted_possessions, Some(66));
    }

    #[test]
    fn test_fanmatch_without_table_is_empty() {
        let html = "<html><body><p>No games scheduled for this date.</p></body></html>";
        assert!(parse_fanmatch(html).unwrap().is_empty());
    }

    #[test]
    fn test_game_cell_second_team_wins() {
        let game = parse_game_cell("Vermont 61, 3 Duke 66 [64]").unwrap();
        let result = game.result.unwrap();
        assert_eq!(result.winner, "Duke");
        assert_eq!(result.winner_score, 66);
        assert_eq!(result.ot, None);
        assert_eq!(game.team1_rank, None);
        assert_eq!(game.team2_rank.as_deref(), Some("3"));
    }

    #[test]
    fn test_game_cell_double_overtime() {
        let game = parse_game_cell("Purdue 90, Indiana 88 2OT [80]").unwrap();
        assert_eq!(game.result.unwrap().ot.as_deref(), Some("2OT"));
    }

    #[test]
    fn test_prediction_for_unknown_team_dropped() {
        assert!(parse_prediction_cell("Gonzaga 80-70 (90%)", "Duke", "Kansas").is_none());
    }

    #[test]
    fn test_parse_box_score_links() {
        let links = parse_box_score_links(FANMATCH_PAGE, "https://kenpom.com/").unwrap();
        assert_eq!(
            links,
            vec![BoxScoreLink {
                team1: "Duke".to_string(),
                team2: "North Carolina".to_string(),
                url: "https://kenpom.com/box.php?g=1234".to_string(),
            }]
        );
    }

    #[test]
    fn test_box_score_links_without_table() {
        assert!(parse_box_score_links("<p>none</p>", KENPOM_BASE_URL)
            .unwrap()
            .is_empty());
    }

    #[test]
    fn test_parse_line_score_with_overtime() {
        let html = r#"
            <table id="linescore-table2">
              <tr><th></th><th>1</th><th>2</th><th>3</th><th>4</th><th>OT</th><th>T</th></tr>
              <tr><td>Duke</td><td>20</td><td>18</td><td>17</td><td>15</td><td>10</td><td>80</td></tr>
              <tr><td>North Carolina</td><td>15</td><td>20</td><td>16</td><td>19</td><td>5</td><td>75</td></tr>
            </table>"#;
        let line = parse_line_score(html).unwrap().unwrap();
        assert_eq!(line.teams.len(), 2);
        assert_eq!(line.teams[0].periods, vec![20, 18, 17, 15, 10]);
        assert_eq!(line.teams[1].total, 75);
    }

    #[test]
    fn test_line_score_missing_table() {
        assert_eq!(parse_line_score("<html></html>").unwrap(), None);
    }

    #[tokio::test]
    #[ignore] // Requires network access and KENPOM_USER / KENPOM_PW
    async fn test_live_fanmatch() {
        dotenv::dotenv().ok();
        let config = crate::config::IngestConfig::from_env().unwrap();
        let client = KenPomClient::login(config.kenpom_credentials().unwrap())
            .await
            .unwrap();
        let day = NaiveDate::from_ymd_opt(2024, 2, 3).unwrap();
        assert!(!client.fanmatch(day).await.unwrap().is_empty());
    }
}
