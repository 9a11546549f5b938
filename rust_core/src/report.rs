//! Per-run summary returned by every pipeline.

use crate::assemble::SkipReason;
use crate::batch::BatchOutcome;
use chrono::NaiveDate;
use serde::Serialize;
use tracing::{info, warn};

#[derive(Debug, Clone, Default, Serialize)]
pub struct IngestReport {
    pub pipeline: String,
    pub dates_processed: usize,
    /// Dates whose fetch or write failed as a whole.
    pub failed_dates: Vec<NaiveDate>,
    pub rows_scraped: usize,
    pub records_assembled: usize,
    pub skipped: usize,
    /// Names that failed to resolve, one entry per skipped row.
    pub missed: Vec<String>,
    pub writes: BatchOutcome,
    /// Existing games updated in place.
    pub rows_updated: u64,
}

impl IngestReport {
    pub fn new(pipeline: &str) -> Self {
        Self {
            pipeline: pipeline.to_string(),
            ..Default::default()
        }
    }

    /// Count a scraped row that did not become a record.
    pub fn skip(&mut self, context: &str, reason: &SkipReason) {
        self.skipped += 1;
        match reason {
            SkipReason::UnresolvedTeams(names) => {
                info!("Missed: {} ({})", context, names.join(", "));
                self.missed.extend(names.iter().cloned());
            }
            other => info!("Skipped {}: {}", context, other),
        }
    }

    pub fn fail_date(&mut self, date: NaiveDate, error: &anyhow::Error) {
        warn!("{} failed for {}: {:#}", self.pipeline, date, error);
        if !self.failed_dates.contains(&date) {
            self.failed_dates.push(date);
        }
    }

    pub fn is_clean(&self) -> bool {
        self.failed_dates.is_empty() && self.writes.is_clean()
    }

    pub fn log_summary(&self) {
        info!(
            "{}: {} dates, {} rows scraped, {} records, {} skipped, {} rows written, {} rows updated",
            self.pipeline,
            self.dates_processed,
            self.rows_scraped,
            self.records_assembled,
            self.skipped,
            self.writes.rows_written,
            self.rows_updated
        );
        if !self.missed.is_empty() {
            info!("Unresolved names: {}", self.missed.join(", "));
        }
        match serde_json::to_string(self) {
            Ok(json) => info!("Report: {}", json),
            Err(e) => warn!("Failed to serialize report: {}", e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::anyhow;

    #[test]
    fn test_skip_records_missed_names() {
        let mut report = IngestReport::new("fanmatch_results");
        report.skip("Duke vs Mystery", &SkipReason::UnresolvedTeams(vec!["Mystery".to_string()]));
        report.skip("Duke vs Kansas", &SkipReason::NotFinal);
        assert_eq!(report.skipped, 2);
        assert_eq!(report.missed, vec!["Mystery"]);
    }

    #[test]
    fn test_failed_date_counted_once() {
        let mut report = IngestReport::new("box_score");
        let day = NaiveDate::from_ymd_opt(2024, 1, 2).unwrap();
        report.fail_date(day, &anyhow!("timeout"));
        report.fail_date(day, &anyhow!("timeout"));
        assert_eq!(report.failed_dates, vec![day]);
        assert!(!report.is_clean());
    }
}
