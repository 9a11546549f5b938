//! Inclusive calendar date ranges.

use anyhow::{anyhow, Result};
use chrono::{Days, Local, NaiveDate};

/// Local calendar date today.
pub fn today() -> NaiveDate {
    Local::now().date_naive()
}

/// Local calendar date yesterday.
pub fn yesterday() -> NaiveDate {
    today().pred_opt().unwrap_or_else(today)
}

/// Inclusive range of dates, iterated in ascending order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateRange {
    start: NaiveDate,
    end: NaiveDate,
}

impl DateRange {
    pub fn new(start: NaiveDate, end: NaiveDate) -> Result<Self> {
        if end < start {
            return Err(anyhow!("date range end {} is before start {}", end, start));
        }
        Ok(Self { start, end })
    }

    pub fn single(date: NaiveDate) -> Self {
        Self { start: date, end: date }
    }

    pub fn start(&self) -> NaiveDate {
        self.start
    }

    pub fn end(&self) -> NaiveDate {
        self.end
    }

    /// Number of dates in the range.
    pub fn len(&self) -> usize {
        (self.end - self.start).num_days() as usize + 1
    }

    pub fn is_empty(&self) -> bool {
        false
    }

    pub fn iter(&self) -> impl Iterator<Item = NaiveDate> {
        let end = self.end;
        std::iter::successors(Some(self.start), |d| d.checked_add_days(Days::new(1)))
            .take_while(move |d| *d <= end)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    #[test]
    fn test_range_crosses_month() {
        let range = DateRange::new(d(2024, 1, 30), d(2024, 2, 2)).unwrap();
        let dates: Vec<_> = range.iter().collect();
        assert_eq!(dates, vec![d(2024, 1, 30), d(2024, 1, 31), d(2024, 2, 1), d(2024, 2, 2)]);
        assert_eq!(range.len(), 4);
    }

    #[test]
    fn test_single_day() {
        let range = DateRange::single(d(2024, 3, 1));
        assert_eq!(range.iter().count(), 1);
    }

    #[test]
    fn test_reversed_range_rejected() {
        assert!(DateRange::new(d(2024, 2, 2), d(2024, 2, 1)).is_err());
    }

    #[test]
    fn test_yesterday_before_today() {
        assert!(yesterday() < today());
    }
}
