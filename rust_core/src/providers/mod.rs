//! Source abstractions for the ingest pipelines
//!
//! Pipelines read games and stat tables through these traits so the scraping
//! sites can be swapped for canned pages in tests.

use crate::models::{BoxScoreLink, LineScore, ScrapedGame, StatRow};
use anyhow::Result;
use async_trait::async_trait;
use chrono::NaiveDate;

pub mod kenpom;
pub mod teamrankings;

pub use kenpom::KenPomProvider;
pub use teamrankings::TeamRankingsProvider;

/// Ratings site with per-day game tables and box scores.
#[async_trait]
pub trait GameSource: Send + Sync {
    /// All scraped games listed for a date.
    async fn fanmatch(&self, date: NaiveDate) -> Result<Vec<ScrapedGame>>;

    /// Box score links for games on a date.
    async fn box_score_links(&self, date: NaiveDate) -> Result<Vec<BoxScoreLink>>;

    /// Line score behind one box score link; `None` when the page has none.
    async fn line_score(&self, url: &str) -> Result<Option<LineScore>>;

    /// Provider name for logging
    fn provider_name(&self) -> &str;
}

/// Site publishing one team-level stat table per date.
#[async_trait]
pub trait StatSource: Send + Sync {
    async fn stat_table(&self, stat: &str, date: NaiveDate) -> Result<Vec<StatRow>>;

    /// Provider name for logging
    fn provider_name(&self) -> &str;
}
