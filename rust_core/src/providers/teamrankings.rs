//! TeamRankings stat source

use super::StatSource;
use crate::clients::teamrankings::TeamRankingsClient;
use crate::models::StatRow;
use anyhow::Result;
use async_trait::async_trait;
use chrono::NaiveDate;

pub struct TeamRankingsProvider {
    client: TeamRankingsClient,
}

impl TeamRankingsProvider {
    pub fn new() -> Result<Self> {
        Ok(Self {
            client: TeamRankingsClient::new()?,
        })
    }
}

#[async_trait]
impl StatSource for TeamRankingsProvider {
    async fn stat_table(&self, stat: &str, date: NaiveDate) -> Result<Vec<StatRow>> {
        self.client.stat_table(stat, date).await
    }

    fn provider_name(&self) -> &str {
        "teamrankings"
    }
}
