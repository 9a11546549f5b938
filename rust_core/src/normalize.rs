//! Cleaning helpers for scraped text.
//!
//! Team names arrive with seed/rank decorations, ranks arrive as whatever the
//! table cell held, and stat values arrive as percentage text. Everything here
//! is pure and never panics on malformed input.

use chrono::{Datelike, NaiveDate};
use regex::Regex;
use std::sync::OnceLock;
use thiserror::Error;
use tracing::debug;

/// Sentinel stored for unranked teams.
pub const NOT_RANKED: &str = "NR";

/// Textual markers the scraped tables use for an empty cell.
const MISSING_MARKERS: [&str; 3] = ["", "nan", "None"];

static ANNOTATION_RE: OnceLock<Option<Regex>> = OnceLock::new();

fn annotation_re() -> Option<&'static Regex> {
    ANNOTATION_RE
        .get_or_init(|| Regex::new(r"\s*\(\d+\)").ok())
        .as_ref()
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum NormalizeError {
    #[error("value {0:?} is not a number")]
    NotNumeric(String),
    #[error("date {0:?} is not YYYY-MM-DD")]
    BadDate(String),
}

/// True when a scraped cell is absent or holds one of the missing markers.
pub fn is_missing(text: Option<&str>) -> bool {
    match text {
        None => true,
        Some(t) => MISSING_MARKERS.contains(&t.trim()),
    }
}

/// Remove `(N)` seed/rank annotations and surrounding whitespace.
///
/// `"Duke (3)"` becomes `"Duke"`. Cleaning is idempotent.
pub fn clean_team_name(name: &str) -> String {
    match annotation_re() {
        Some(re) => re.replace_all(name, "").trim().to_string(),
        None => name.trim().to_string(),
    }
}

/// Normalize a rank cell; missing ranks become [`NOT_RANKED`].
pub fn clean_rank(rank: Option<&str>) -> String {
    match rank {
        Some(r) if !is_missing(Some(r)) => r.trim().to_string(),
        _ => NOT_RANKED.to_string(),
    }
}

/// Parse a stat cell like `"38.2%"` into `38.2`.
///
/// `Ok(None)` means the cell was empty; `Err` keeps the text that failed.
pub fn parse_value(raw: Option<&str>) -> Result<Option<f64>, NormalizeError> {
    let Some(raw) = raw else {
        return Ok(None);
    };
    if is_missing(Some(raw)) {
        return Ok(None);
    }
    let trimmed = raw.trim();
    let number = trimmed.strip_suffix('%').unwrap_or(trimmed).trim();
    number
        .parse::<f64>()
        .map(Some)
        .map_err(|_| NormalizeError::NotNumeric(raw.to_string()))
}

/// Lenient form of [`parse_value`]: unparsable text yields `None`.
pub fn clean_value(raw: Option<&str>) -> Option<f64> {
    match parse_value(raw) {
        Ok(value) => value,
        Err(e) => {
            debug!("Discarding stat value: {}", e);
            None
        }
    }
}

/// Season a date belongs to: July onward counts toward that calendar year.
pub fn season_year(date: NaiveDate) -> i32 {
    if date.month() >= 7 {
        date.year()
    } else {
        date.year() - 1
    }
}

/// [`season_year`] for a `YYYY-MM-DD` string.
pub fn season_year_str(date: &str) -> Result<i32, NormalizeError> {
    NaiveDate::parse_from_str(date.trim(), "%Y-%m-%d")
        .map(season_year)
        .map_err(|_| NormalizeError::BadDate(date.to_string()))
}

/// Parse an integer cell, treating missing markers as `None`.
pub fn parse_int(raw: Option<&str>) -> Option<i32> {
    if is_missing(raw) {
        return None;
    }
    raw.and_then(|r| r.trim().parse().ok())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clean_team_name_strips_annotation() {
        assert_eq!(clean_team_name("Duke (3)"), "Duke");
        assert_eq!(clean_team_name("  North Carolina (12)  "), "North Carolina");
        assert_eq!(clean_team_name("Saint Mary's"), "Saint Mary's");
    }

    #[test]
    fn test_clean_team_name_idempotent() {
        for name in ["Duke (3)", "Texas A&M (10) (2)", "UNC", "  Iowa St. (1)"] {
            let once = clean_team_name(name);
            assert_eq!(clean_team_name(&once), once);
        }
    }

    #[test]
    fn test_clean_rank_missing_markers() {
        for rank in [None, Some(""), Some("nan"), Some("None"), Some("  nan "), Some("   ")] {
            assert_eq!(clean_rank(rank), NOT_RANKED);
        }
    }

    #[test]
    fn test_clean_rank_passthrough() {
        assert_eq!(clean_rank(Some(" 14 ")), "14");
        assert_eq!(clean_rank(Some("NaN")), "NaN");
    }

    #[test]
    fn test_parse_value() {
        assert_eq!(parse_value(Some("38.2%")), Ok(Some(38.2)));
        assert_eq!(parse_value(Some(" 17.5 ")), Ok(Some(17.5)));
        assert_eq!(parse_value(None), Ok(None));
        assert_eq!(parse_value(Some("nan")), Ok(None));
        assert_eq!(
            parse_value(Some("--")),
            Err(NormalizeError::NotNumeric("--".to_string()))
        );
    }

    #[test]
    fn test_clean_value_never_fails() {
        assert_eq!(clean_value(Some("--")), None);
        assert_eq!(clean_value(Some("abc%")), None);
        assert_eq!(clean_value(Some("0%")), Some(0.0));
    }

    #[test]
    fn test_season_year_boundaries() {
        assert_eq!(season_year_str("2022-11-07"), Ok(2022));
        assert_eq!(season_year_str("2023-04-08"), Ok(2022));
        assert_eq!(season_year_str("2023-07-01"), Ok(2023));
        assert_eq!(season_year_str("2023-06-30"), Ok(2022));
        assert!(season_year_str("2023/07/01").is_err());
    }

    #[test]
    fn test_parse_int() {
        assert_eq!(parse_int(Some("68")), Some(68));
        assert_eq!(parse_int(Some("nan")), None);
        assert_eq!(parse_int(Some("6x")), None);
        assert_eq!(parse_int(None), None);
    }
}
