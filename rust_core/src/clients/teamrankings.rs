//! TeamRankings stat tables.
//!
//! Each stat page holds one table; the team column is found by its header and
//! the value is the third column (current season to date).

use super::html::{cell_text, find_table, selector, table_rows, HtmlParseError};
use crate::models::StatRow;
use anyhow::{Context, Result};
use chrono::NaiveDate;
use reqwest::Client;
use scraper::Html;
use tracing::debug;

pub const TEAMRANKINGS_BASE_URL: &str = "https://www.teamrankings.com";

const VALUE_COL: usize = 2;
const DEFAULT_TEAM_COL: usize = 1;

#[derive(Debug, Clone)]
pub struct TeamRankingsClient {
    client: Client,
    base_url: String,
}

impl TeamRankingsClient {
    pub fn new() -> Result<Self> {
        Self::with_base_url(TEAMRANKINGS_BASE_URL)
    }

    pub fn with_base_url(base_url: &str) -> Result<Self> {
        let client = Client::builder()
            .user_agent("Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36")
            .build()
            .context("Failed to build TeamRankings HTTP client")?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn stat_url(&self, stat: &str, date: NaiveDate) -> String {
        format!(
            "{}/ncaa-basketball/stat/{}?date={}",
            self.base_url,
            stat,
            date.format("%Y-%m-%d")
        )
    }

    /// One stat's table as of `date`.
    pub async fn stat_table(&self, stat: &str, date: NaiveDate) -> Result<Vec<StatRow>> {
        let url = self.stat_url(stat, date);
        debug!("GET {}", url);
        let html = self
            .client
            .get(&url)
            .send()
            .await
            .with_context(|| format!("Request to {} failed", url))?
            .error_for_status()
            .with_context(|| format!("Bad status from {}", url))?
            .text()
            .await?;
        Ok(parse_stat_table(&html, stat, date)?)
    }
}

/// Team name and third-column value for every row of the page's first table.
pub fn parse_stat_table(html: &str, stat: &str, date: NaiveDate) -> Result<Vec<StatRow>, HtmlParseError> {
    let document = Html::parse_document(html);
    let table = find_table(&document, "table")?;

    let header_sel = selector("th")?;
    let team_col = table
        .select(&header_sel)
        .position(|th| cell_text(th).eq_ignore_ascii_case("team"))
        .unwrap_or(DEFAULT_TEAM_COL);

    let rows: Vec<StatRow> = table_rows(table)?
        .into_iter()
        .filter_map(|cells| {
            let team = cells.get(team_col)?.trim().to_string();
            if team.is_empty() {
                return None;
            }
            Some(StatRow {
                team,
                value: cells.get(VALUE_COL).map(|v| v.trim().to_string()),
                stat: stat.to_string(),
                date,
            })
        })
        .collect();

    if rows.is_empty() {
        return Err(HtmlParseError::EmptyTable("table".to_string()));
    }
    Ok(rows)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 1, 15).unwrap()
    }

    #[test]
    fn test_parse_stat_table() {
        let html = r#"
            <table class="tr-table datatable scrollable">
              <thead><tr><th>Rank</th><th>Team</th><th>2023</th><th>Last 3</th></tr></thead>
              <tbody>
                <tr><td>1</td><td><a href="/ncaa-basketball/team/duke">Duke</a></td><td>41.2%</td><td>44.0%</td></tr>
                <tr><td>2</td><td>Kansas</td><td>--</td><td>39.1%</td></tr>
              </tbody>
            </table>"#;
        let rows = parse_stat_table(html, "three-point-pct", day()).unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].team, "Duke");
        assert_eq!(rows[0].value.as_deref(), Some("41.2%"));
        assert_eq!(rows[0].stat, "three-point-pct");
        assert_eq!(rows[1].value.as_deref(), Some("--"));
    }

    #[test]
    fn test_page_without_table() {
        assert!(parse_stat_table("<p>rate limited</p>", "three-point-pct", day()).is_err());
    }

    #[test]
    fn test_stat_url() {
        let client = TeamRankingsClient::new().unwrap();
        assert_eq!(
            client.stat_url("free-throw-pct", day()),
            "https://www.teamrankings.com/ncaa-basketball/stat/free-throw-pct?date=2024-01-15"
        );
    }

    #[tokio::test]
    #[ignore] // Requires network access
    async fn test_live_stat_table() {
        let client = TeamRankingsClient::new().unwrap();
        let rows = client.stat_table("three-point-pct", day()).await.unwrap();
        assert!(rows.len() > 300);
    }
}
