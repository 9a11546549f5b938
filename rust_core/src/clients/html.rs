//! Small helpers over `scraper` shared by the page parsers.

use scraper::{ElementRef, Html, Selector};
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum HtmlParseError {
    #[error("invalid selector {0:?}")]
    BadSelector(String),
    #[error("page has no element matching {0:?}")]
    MissingTable(String),
    #[error("table {0:?} has no data rows")]
    EmptyTable(String),
}

pub fn selector(css: &str) -> Result<Selector, HtmlParseError> {
    Selector::parse(css).map_err(|_| HtmlParseError::BadSelector(css.to_string()))
}

/// Visible text of an element with whitespace runs collapsed to one space.
pub fn cell_text(element: ElementRef<'_>) -> String {
    element
        .text()
        .flat_map(str::split_whitespace)
        .collect::<Vec<_>>()
        .join(" ")
}

/// First element matching `css`, or `MissingTable`.
pub fn find_table<'a>(document: &'a Html, css: &str) -> Result<ElementRef<'a>, HtmlParseError> {
    let sel = selector(css)?;
    document
        .select(&sel)
        .next()
        .ok_or_else(|| HtmlParseError::MissingTable(css.to_string()))
}

/// Text of every `td` cell for each body row of `table`.
///
/// Header rows (only `th` cells) are skipped.
pub fn table_rows(table: ElementRef<'_>) -> Result<Vec<Vec<String>>, HtmlParseError> {
    let row_sel = selector("tr")?;
    let cell_sel = selector("td")?;
    Ok(table
        .select(&row_sel)
        .map(|row| row.select(&cell_sel).map(cell_text).collect::<Vec<_>>())
        .filter(|cells| !cells.is_empty())
        .collect())
}
