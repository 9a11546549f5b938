//! Store abstraction.
//!
//! Defines the IngestStore trait the pipelines write through. The production
//! implementation is [`PgStore`]; tests use an in-memory store.

use crate::identity::TeamDirectory;
use crate::models::{AliasRow, ArenaRow, BoxScoreUpdate, RecordBatch, StoredGame, TeamRow};
use anyhow::Result;
use async_trait::async_trait;
use chrono::NaiveDate;

pub mod postgres;

pub use postgres::PgStore;

/// Reference reads and record writes against the relational store.
///
/// There is no client-side locking; overlapping writers rely on the store's
/// own conflict handling at each table's uniqueness constraint.
#[async_trait]
pub trait IngestStore: Send + Sync {
    /// All canonical team names.
    async fn teams(&self) -> Result<Vec<TeamRow>>;

    /// All alias names.
    async fn team_aliases(&self) -> Result<Vec<AliasRow>>;

    /// Arena candidates with exactly this name.
    async fn arenas_named(&self, arena_name: &str) -> Result<Vec<ArenaRow>>;

    /// Identifying columns of the games stored for one date.
    async fn games_on(&self, date: NaiveDate) -> Result<Vec<StoredGame>>;

    /// Insert-or-update one chunk; returns rows affected.
    async fn upsert(&self, batch: RecordBatch<'_>) -> Result<u64>;

    /// Merge box-score fields into existing games; stops at the first failure.
    async fn apply_box_scores(&self, updates: &[BoxScoreUpdate]) -> Result<u64>;

    /// Store name for logging
    fn store_name(&self) -> &str;
}

/// Load the two-tier team directory from the reference tables.
pub async fn load_team_directory<S: IngestStore + ?Sized>(store: &S) -> Result<TeamDirectory> {
    let teams = store.teams().await?;
    let aliases = store.team_aliases().await?;
    let directory = TeamDirectory::from_rows(&teams, &aliases);
    tracing::info!(
        "Loaded team lookup from {}: {} names",
        store.store_name(),
        directory.len()
    );
    Ok(directory)
}
