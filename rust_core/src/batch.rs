//! Upsert batching.
//!
//! Records are de-duplicated on their natural key, split into fixed-size
//! chunks and submitted one chunk per upsert. Chunks are independent: a failed
//! chunk is logged and counted, earlier chunks stay written, later chunks are
//! still submitted.

use crate::models::{DailyStatRecord, GameKey, PredictionRecord, RecordBatch, ResultRecord, StatKey};
use crate::store::IngestStore;
use serde::Serialize;
use std::collections::HashSet;
use std::hash::Hash;
use tracing::{debug, error, info};

pub const DEFAULT_BATCH_SIZE: usize = 500;

/// A record kind that can be upserted in chunks.
pub trait Batchable: Sized {
    type Key: Eq + Hash;

    /// Uniqueness key the store resolves conflicts on.
    fn key(&self) -> Self::Key;

    /// Tag a chunk for the store.
    fn batch(chunk: &[Self]) -> RecordBatch<'_>;
}

impl Batchable for ResultRecord {
    type Key = GameKey;

    fn key(&self) -> GameKey {
        self.natural_key()
    }

    fn batch(chunk: &[Self]) -> RecordBatch<'_> {
        RecordBatch::Results(chunk)
    }
}

impl Batchable for PredictionRecord {
    type Key = GameKey;

    fn key(&self) -> GameKey {
        self.natural_key()
    }

    fn batch(chunk: &[Self]) -> RecordBatch<'_> {
        RecordBatch::Predictions(chunk)
    }
}

impl Batchable for DailyStatRecord {
    type Key = StatKey;

    fn key(&self) -> StatKey {
        self.natural_key()
    }

    fn batch(chunk: &[Self]) -> RecordBatch<'_> {
        RecordBatch::DailyStats(chunk)
    }
}

/// Outcome of one batched submission.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct BatchOutcome {
    pub batches: usize,
    pub rows_submitted: usize,
    pub rows_written: u64,
    pub failed_batches: usize,
    pub failed_rows: usize,
}

impl BatchOutcome {
    pub fn merge(&mut self, other: &BatchOutcome) {
        self.batches += other.batches;
        self.rows_submitted += other.rows_submitted;
        self.rows_written += other.rows_written;
        self.failed_batches += other.failed_batches;
        self.failed_rows += other.failed_rows;
    }

    pub fn is_clean(&self) -> bool {
        self.failed_batches == 0
    }
}

#[derive(Debug, Clone, Copy)]
pub struct UpsertBatcher {
    chunk_size: usize,
}

impl Default for UpsertBatcher {
    fn default() -> Self {
        Self::new(DEFAULT_BATCH_SIZE)
    }
}

impl UpsertBatcher {
    /// A zero chunk size is treated as one.
    pub fn new(chunk_size: usize) -> Self {
        Self {
            chunk_size: chunk_size.max(1),
        }
    }

    pub fn chunk_size(&self) -> usize {
        self.chunk_size
    }

    pub fn chunks<'a, T>(&self, records: &'a [T]) -> std::slice::Chunks<'a, T> {
        records.chunks(self.chunk_size)
    }

    /// De-duplicate, chunk and upsert `records`.
    pub async fn submit<S, T>(&self, store: &S, records: Vec<T>) -> BatchOutcome
    where
        S: IngestStore + ?Sized,
        T: Batchable + Sync,
    {
        let records = dedupe_last(records);
        let mut outcome = BatchOutcome::default();

        for (i, chunk) in self.chunks(&records).enumerate() {
            let batch = T::batch(chunk);
            outcome.batches += 1;
            outcome.rows_submitted += chunk.len();

            match store.upsert(batch).await {
                Ok(written) => {
                    outcome.rows_written += written;
                    debug!(
                        "Upserted batch {} into {} ({} rows, conflict on {})",
                        i + 1,
                        batch.table(),
                        chunk.len(),
                        batch.conflict_columns()
                    );
                }
                Err(e) => {
                    outcome.failed_batches += 1;
                    outcome.failed_rows += chunk.len();
                    error!(
                        "Batch {} into {} failed ({} rows): {:#}",
                        i + 1,
                        batch.table(),
                        chunk.len(),
                        e
                    );
                }
            }
        }

        if outcome.batches > 0 {
            info!(
                "Submitted {} rows in {} batches ({} failed)",
                outcome.rows_submitted, outcome.batches, outcome.failed_batches
            );
        }
        outcome
    }
}

/// Keep the last record for each key, preserving the order of survivors.
pub fn dedupe_last<T: Batchable>(records: Vec<T>) -> Vec<T> {
    let total = records.len();
    let mut seen = HashSet::with_capacity(total);
    let mut kept: Vec<T> = Vec::with_capacity(total);
    for record in records.into_iter().rev() {
        if seen.insert(record.key()) {
            kept.push(record);
        }
    }
    kept.reverse();
    if kept.len() < total {
        debug!("Dropped {} duplicate records before upsert", total - kept.len());
    }
    kept
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn stat(team_id: i32, value: f64) -> DailyStatRecord {
        DailyStatRecord {
            team_id,
            stat_name: "three-point-pct".to_string(),
            stat_value: Some(value),
            stat_date: NaiveDate::from_ymd_opt(2024, 1, 2).unwrap(),
            season_year: 2023,
            source: "TR".to_string(),
        }
    }

    #[test]
    fn test_zero_chunk_size_clamped() {
        assert_eq!(UpsertBatcher::new(0).chunk_size(), 1);
        assert_eq!(UpsertBatcher::default().chunk_size(), DEFAULT_BATCH_SIZE);
    }

    #[test]
    fn test_chunks_cover_all_records() {
        let records: Vec<u32> = (0..1203).collect();
        let sizes: Vec<usize> = UpsertBatcher::default()
            .chunks(&records)
            .map(|c| c.len())
            .collect();
        assert_eq!(sizes, vec![500, 500, 203]);
    }

    #[test]
    fn test_dedupe_keeps_last() {
        let records = vec![stat(1, 30.0), stat(2, 31.0), stat(1, 32.0)];
        let kept = dedupe_last(records);
        assert_eq!(kept.len(), 2);
        assert_eq!(kept[0].team_id, 2);
        assert_eq!(kept[1].team_id, 1);
        assert_eq!(kept[1].stat_value, Some(32.0));
    }

    fn prediction(winner: i32, loser: i32) -> PredictionRecord {
        PredictionRecord {
            game_date: NaiveDate::from_ymd_opt(2024, 2, 5).unwrap(),
            team1_id: winner,
            team2_id: loser,
            predicted_winner: winner,
            predicted_loser: loser,
            predicted_score: None,
            predicted_possessions: None,
            win_probability: None,
            location: None,
            city: None,
            state: None,
            site: Default::default(),
        }
    }

    #[test]
    fn test_dedupe_treats_flipped_matchup_as_one_game() {
        let kept = dedupe_last(vec![prediction(3, 4), prediction(4, 3)]);
        assert_eq!(kept.len(), 1);
        assert_eq!(kept[0].predicted_winner, 4);
    }

    #[test]
    fn test_outcome_merge() {
        let mut total = BatchOutcome::default();
        total.merge(&BatchOutcome {
            batches: 2,
            rows_submitted: 600,
            rows_written: 500,
            failed_batches: 1,
            failed_rows: 100,
        });
        assert_eq!(total.batches, 2);
        assert!(!total.is_clean());
    }
}
