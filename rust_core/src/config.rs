//! Configuration for the ingest services
//!
//! Everything comes from the process environment (a `.env` file is loaded by
//! each binary first).

use crate::batch::DEFAULT_BATCH_SIZE;
use crate::dates::DateRange;
use crate::db::DbPoolConfig;
use crate::throttle::{Delay, Throttle};
use anyhow::{anyhow, Result};
use chrono::NaiveDate;
use std::env;
use std::time::Duration;
use tracing::info;

/// Stats scraped from TeamRankings when `TR_STATS` is unset.
pub const DEFAULT_STATS: [&str; 10] = [
    "three-point-pct",
    "two-point-pct",
    "free-throw-pct",
    "free-throws-made-per-game",
    "three-point-rate",
    "opponent-three-point-pct",
    "opponent-two-point-pct",
    "opponent-free-throw-pct",
    "opponent-free-throws-made-per-game",
    "opponent-three-point-rate",
];

#[derive(Clone)]
pub struct KenPomCredentials {
    pub user: String,
    pub password: String,
}

impl std::fmt::Debug for KenPomCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KenPomCredentials")
            .field("user", &self.user)
            .field("password", &"<redacted>")
            .finish()
    }
}

#[derive(Debug, Clone)]
pub struct IngestConfig {
    // Database
    pub database_url: String,
    pub db_pool: DbPoolConfig,

    // Sources
    pub kenpom: Option<KenPomCredentials>,
    pub stats: Vec<String>,

    // Date range
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,

    // Writes
    pub batch_size: usize,

    // Pacing
    pub fanmatch_delay_secs: u64,
    pub stat_delay_secs: u64,
    pub stat_switch_delay_secs: u64,
    pub box_score_jitter_min_secs: u64,
    pub box_score_jitter_max_secs: u64,
    pub box_score_cooldown_secs: u64,
}

impl IngestConfig {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build from any key lookup; `from_env` passes the process environment.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        let database_url = get("DATABASE_URL").ok_or_else(|| anyhow!("DATABASE_URL must be set"))?;

        let kenpom = match (get("KENPOM_USER"), get("KENPOM_PW")) {
            (Some(user), Some(password)) => Some(KenPomCredentials { user, password }),
            _ => None,
        };

        let stats = match get("TR_STATS") {
            Some(list) => list
                .split(',')
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .collect(),
            None => DEFAULT_STATS.iter().map(|s| s.to_string()).collect(),
        };

        let start_date = parse_date(get("INGEST_START_DATE"), "INGEST_START_DATE")?;
        let end_date = parse_date(get("INGEST_END_DATE"), "INGEST_END_DATE")?;
        if let (Some(start), Some(end)) = (start_date, end_date) {
            if end < start {
                return Err(anyhow!("INGEST_END_DATE must be on or after INGEST_START_DATE"));
            }
        }

        let box_score_jitter_min_secs = parse_u64(get("BOX_SCORE_JITTER_MIN_SECS"), "BOX_SCORE_JITTER_MIN_SECS", 6)?;
        let box_score_jitter_max_secs = parse_u64(get("BOX_SCORE_JITTER_MAX_SECS"), "BOX_SCORE_JITTER_MAX_SECS", 15)?;
        if box_score_jitter_max_secs < box_score_jitter_min_secs {
            return Err(anyhow!(
                "BOX_SCORE_JITTER_MAX_SECS must be >= BOX_SCORE_JITTER_MIN_SECS"
            ));
        }

        Ok(Self {
            database_url,
            db_pool: DbPoolConfig::from_lookup(&get),
            kenpom,
            stats,
            start_date,
            end_date,
            batch_size: parse_usize(get("UPSERT_BATCH_SIZE"), "UPSERT_BATCH_SIZE", DEFAULT_BATCH_SIZE)?,
            fanmatch_delay_secs: parse_u64(get("FANMATCH_DELAY_SECS"), "FANMATCH_DELAY_SECS", 3)?,
            stat_delay_secs: parse_u64(get("STAT_DELAY_SECS"), "STAT_DELAY_SECS", 3)?,
            stat_switch_delay_secs: parse_u64(get("STAT_SWITCH_DELAY_SECS"), "STAT_SWITCH_DELAY_SECS", 2)?,
            box_score_jitter_min_secs,
            box_score_jitter_max_secs,
            box_score_cooldown_secs: parse_u64(get("BOX_SCORE_COOLDOWN_SECS"), "BOX_SCORE_COOLDOWN_SECS", 20)?,
        })
    }

    /// Credentials for the KenPom services; missing credentials are fatal there.
    pub fn kenpom_credentials(&self) -> Result<&KenPomCredentials> {
        self.kenpom
            .as_ref()
            .ok_or_else(|| anyhow!("KENPOM_USER and KENPOM_PW must be set"))
    }

    /// Configured range, or the single `default` date when no start is set.
    pub fn date_range(&self, default: NaiveDate) -> Result<DateRange> {
        let start = self.start_date.unwrap_or(default);
        let end = self.end_date.unwrap_or(start);
        DateRange::new(start, end)
    }

    /// Fixed pause between FanMatch dates in a backfill.
    pub fn fanmatch_throttle(&self) -> Throttle {
        Throttle {
            between_requests: Delay::Fixed(Duration::from_secs(self.fanmatch_delay_secs)),
            between_groups: Delay::None,
            cooldown: Duration::ZERO,
        }
    }

    /// Per-date pacing for the stat scraper, plus the pause between stats.
    pub fn stats_throttle(&self) -> Throttle {
        Throttle {
            between_requests: Delay::Fixed(Duration::from_secs(self.stat_delay_secs)),
            between_groups: Delay::Fixed(Duration::from_secs(self.stat_switch_delay_secs)),
            cooldown: Duration::ZERO,
        }
    }

    /// Randomized pacing between box score pages, with a cool-down after failures.
    pub fn box_score_throttle(&self) -> Throttle {
        Throttle {
            between_requests: Delay::Jitter {
                min: Duration::from_secs(self.box_score_jitter_min_secs),
                max: Duration::from_secs(self.box_score_jitter_max_secs),
            },
            between_groups: Delay::None,
            cooldown: Duration::from_secs(self.box_score_cooldown_secs),
        }
    }

    pub fn log_summary(&self) {
        info!("Configuration:");
        info!("  KenPom user: {}", self.kenpom.as_ref().map(|c| c.user.as_str()).unwrap_or("<unset>"));
        info!("  Date range: {:?} .. {:?}", self.start_date, self.end_date);
        info!("  Upsert batch size: {}", self.batch_size);
        info!("  Stats: {}", self.stats.join(", "));
        info!("  FanMatch delay: {}s", self.fanmatch_delay_secs);
        info!(
            "  Box score jitter: {}-{}s, cool-down {}s",
            self.box_score_jitter_min_secs, self.box_score_jitter_max_secs, self.box_score_cooldown_secs
        );
    }
}

fn parse_date(value: Option<String>, var_name: &str) -> Result<Option<NaiveDate>> {
    value
        .map(|v| {
            NaiveDate::parse_from_str(&v, "%Y-%m-%d")
                .map_err(|_| anyhow!("{} must be a YYYY-MM-DD date", var_name))
        })
        .transpose()
}

/// Parse an optional value as u64 with default fallback
fn parse_u64(value: Option<String>, var_name: &str, default: u64) -> Result<u64> {
    match value {
        Some(val) => val.parse().map_err(|_| anyhow!("{} must be a valid u64", var_name)),
        None => Ok(default),
    }
}

/// Parse an optional value as usize with default fallback
fn parse_usize(value: Option<String>, var_name: &str, default: usize) -> Result<usize> {
    match value {
        Some(val) => val.parse().map_err(|_| anyhow!("{} must be a valid usize", var_name)),
        None => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config(vars: &[(&str, &str)]) -> Result<IngestConfig> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        IngestConfig::from_lookup(|key| map.get(key).cloned())
    }

    #[test]
    fn test_database_url_required() {
        assert!(config(&[]).is_err());
    }

    #[test]
    fn test_defaults() {
        let cfg = config(&[("DATABASE_URL", "postgres://localhost/cbb")]).unwrap();
        assert_eq!(cfg.batch_size, DEFAULT_BATCH_SIZE);
        assert_eq!(cfg.stats.len(), 10);
        assert_eq!(cfg.stat_delay_secs, 3);
        assert_eq!(cfg.fanmatch_delay_secs, 3);
        assert_eq!(cfg.box_score_cooldown_secs, 20);
        assert!(cfg.kenpom.is_none());
        assert!(cfg.kenpom_credentials().is_err());
    }

    #[test]
    fn test_kenpom_credentials_need_both() {
        let cfg = config(&[("DATABASE_URL", "postgres://x"), ("KENPOM_USER", "me@example.com")]).unwrap();
        assert!(cfg.kenpom.is_none());

        let cfg = config(&[
            ("DATABASE_URL", "postgres://x"),
            ("KENPOM_USER", "me@example.com"),
            ("KENPOM_PW", "hunter2"),
        ])
        .unwrap();
        let creds = cfg.kenpom_credentials().unwrap();
        assert_eq!(creds.user, "me@example.com");
        assert!(!format!("{:?}", creds).contains("hunter2"));
    }

    #[test]
    fn test_fanmatch_throttle_paces_dates() {
        let cfg = config(&[("DATABASE_URL", "postgres://x")]).unwrap();
        assert_eq!(
            cfg.fanmatch_throttle().between_requests,
            Delay::Fixed(Duration::from_secs(3))
        );

        let cfg = config(&[("DATABASE_URL", "postgres://x"), ("FANMATCH_DELAY_SECS", "7")]).unwrap();
        let throttle = cfg.fanmatch_throttle();
        assert_eq!(throttle.between_requests, Delay::Fixed(Duration::from_secs(7)));
        assert_eq!(throttle.between_groups, Delay::None);
        assert_eq!(throttle.cooldown, Duration::ZERO);
    }

    #[test]
    fn test_pool_settings_read_through_lookup() {
        let cfg = config(&[("DATABASE_URL", "postgres://x"), ("DB_POOL_MAX_CONNECTIONS", "6")]).unwrap();
        assert_eq!(cfg.db_pool.max_connections, 6);
        assert_eq!(cfg.db_pool.min_connections, 1);
    }

    #[test]
    fn test_stat_list_override() {
        let cfg = config(&[("DATABASE_URL", "postgres://x"), ("TR_STATS", "three-point-pct, , free-throw-pct")]).unwrap();
        assert_eq!(cfg.stats, vec!["three-point-pct", "free-throw-pct"]);
    }

    #[test]
    fn test_date_range_defaults_to_single_day() {
        let cfg = config(&[("DATABASE_URL", "postgres://x")]).unwrap();
        let day = NaiveDate::from_ymd_opt(2024, 1, 2).unwrap();
        let range = cfg.date_range(day).unwrap();
        assert_eq!(range.iter().collect::<Vec<_>>(), vec![day]);
    }

    #[test]
    fn test_backfill_range() {
        let cfg = config(&[
            ("DATABASE_URL", "postgres://x"),
            ("INGEST_START_DATE", "2024-01-30"),
            ("INGEST_END_DATE", "2024-02-02"),
        ])
        .unwrap();
        let today = NaiveDate::from_ymd_opt(2024, 3, 1).unwrap();
        assert_eq!(cfg.date_range(today).unwrap().len(), 4);
    }

    #[test]
    fn test_invalid_values_rejected() {
        assert!(config(&[("DATABASE_URL", "postgres://x"), ("UPSERT_BATCH_SIZE", "many")]).is_err());
        assert!(config(&[("DATABASE_URL", "postgres://x"), ("INGEST_START_DATE", "01/02/2024")]).is_err());
        assert!(config(&[
            ("DATABASE_URL", "postgres://x"),
            ("INGEST_START_DATE", "2024-02-02"),
            ("INGEST_END_DATE", "2024-01-01"),
        ])
        .is_err());
        assert!(config(&[
            ("DATABASE_URL", "postgres://x"),
            ("BOX_SCORE_JITTER_MIN_SECS", "10"),
            ("BOX_SCORE_JITTER_MAX_SECS", "5"),
        ])
        .is_err());
    }
}
