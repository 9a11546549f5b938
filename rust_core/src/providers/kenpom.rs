//! KenPom game source
//!
//! Wraps the logged-in KenPom client.

use super::GameSource;
use crate::clients::kenpom::KenPomClient;
use crate::config::KenPomCredentials;
use crate::models::{BoxScoreLink, LineScore, ScrapedGame};
use anyhow::Result;
use async_trait::async_trait;
use chrono::NaiveDate;

pub struct KenPomProvider {
    client: KenPomClient,
}

impl KenPomProvider {
    pub fn new(client: KenPomClient) -> Self {
        Self { client }
    }

    /// Log in and wrap the session.
    pub async fn login(credentials: &KenPomCredentials) -> Result<Self> {
        Ok(Self::new(KenPomClient::login(credentials).await?))
    }
}

#[async_trait]
impl GameSource for KenPomProvider {
    async fn fanmatch(&self, date: NaiveDate) -> Result<Vec<ScrapedGame>> {
        self.client.fanmatch(date).await
    }

    async fn box_score_links(&self, date: NaiveDate) -> Result<Vec<BoxScoreLink>> {
        self.client.box_score_links(date).await
    }

    async fn line_score(&self, url: &str) -> Result<Option<LineScore>> {
        self.client.line_score(url).await
    }

    fn provider_name(&self) -> &str {
        "kenpom"
    }
}
