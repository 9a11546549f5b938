//! Location cell parsing.
//!
//! FanMatch prints a venue as `"City, ST Arena Name"`. The arena name may
//! contain spaces and is kept verbatim; the city may too, so the comma is the
//! primary separator. Without a comma only the arena segment is recovered.

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LocationError {
    #[error("location is empty")]
    Empty,
    #[error("no city/state separator in {0:?}")]
    NoSeparator(String),
    #[error("no arena segment in {0:?}")]
    NoArena(String),
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParsedLocation {
    pub city: Option<String>,
    pub state: Option<String>,
    pub arena: Option<String>,
}

impl ParsedLocation {
    /// Parse without failing; missing pieces come back as `None`.
    pub fn parse(text: &str) -> Self {
        match Self::try_parse(text) {
            Ok(parsed) => parsed,
            Err(e) => {
                debug!("Partial location parse: {}", e);
                Self::partial(text)
            }
        }
    }

    /// Strict parse: every component must be present.
    pub fn try_parse(text: &str) -> Result<Self, LocationError> {
        let text = text.trim();
        if text.is_empty() {
            return Err(LocationError::Empty);
        }

        let (city, rest) = text
            .split_once(',')
            .ok_or_else(|| LocationError::NoSeparator(text.to_string()))?;
        let city = non_empty(city).ok_or_else(|| LocationError::NoSeparator(text.to_string()))?;

        let rest = rest.trim_start();
        let (state, arena) = rest
            .split_once(char::is_whitespace)
            .ok_or_else(|| LocationError::NoArena(text.to_string()))?;
        let state = non_empty(state).ok_or_else(|| LocationError::NoArena(text.to_string()))?;
        let arena = non_empty(arena).ok_or_else(|| LocationError::NoArena(text.to_string()))?;

        Ok(Self {
            city: Some(city),
            state: Some(state),
            arena: Some(arena),
        })
    }

    /// Best-effort pieces of a location that failed the strict parse.
    fn partial(text: &str) -> Self {
        let text = text.trim();
        if let Some((city, rest)) = text.split_once(',') {
            let rest = rest.trim_start();
            let (state, arena) = match rest.split_once(char::is_whitespace) {
                Some((state, arena)) => (non_empty(state), non_empty(arena)),
                None => (non_empty(rest), None),
            };
            return Self {
                city: non_empty(city),
                state,
                arena,
            };
        }

        // No separator: the arena starts after the second space.
        let parts: Vec<&str> = text.splitn(3, ' ').collect();
        Self {
            city: None,
            state: None,
            arena: parts.get(2).and_then(|a| non_empty(a)),
        }
    }
}

/// Arena segment of a location cell, if any.
pub fn arena_name(text: &str) -> Option<String> {
    ParsedLocation::parse(text).arena
}

fn non_empty(s: &str) -> Option<String> {
    let s = s.trim();
    if s.is_empty() {
        None
    } else {
        Some(s.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_full_location() {
        let loc = ParsedLocation::parse("Durham, NC Cameron Indoor Stadium");
        assert_eq!(loc.city.as_deref(), Some("Durham"));
        assert_eq!(loc.state.as_deref(), Some("NC"));
        assert_eq!(loc.arena.as_deref(), Some("Cameron Indoor Stadium"));
    }

    #[test]
    fn test_parse_city_arena_template() {
        let loc = ParsedLocation::parse("City, ST Arena Name");
        assert_eq!(
            loc,
            ParsedLocation {
                city: Some("City".to_string()),
                state: Some("ST".to_string()),
                arena: Some("Arena Name".to_string()),
            }
        );
    }

    #[test]
    fn test_parse_multi_word_city() {
        let loc = ParsedLocation::parse("Chapel Hill, NC Dean E. Smith Center");
        assert_eq!(loc.city.as_deref(), Some("Chapel Hill"));
        assert_eq!(loc.state.as_deref(), Some("NC"));
        assert_eq!(loc.arena.as_deref(), Some("Dean E. Smith Center"));
    }

    #[test]
    fn test_parse_short_inputs_yield_none() {
        for text in ["", "Durham", "Durham,", "Durham, NC", "Durham NC"] {
            let loc = ParsedLocation::parse(text);
            assert!(loc.arena.is_none(), "arena for {:?}", text);
        }
        let loc = ParsedLocation::parse("Durham, NC");
        assert_eq!(loc.city.as_deref(), Some("Durham"));
        assert_eq!(loc.state.as_deref(), Some("NC"));
    }

    #[test]
    fn test_parse_without_separator_keeps_arena() {
        let loc = ParsedLocation::parse("Las Vegas T-Mobile Arena");
        assert_eq!(loc.city, None);
        assert_eq!(loc.state, None);
        assert_eq!(loc.arena.as_deref(), Some("T-Mobile Arena"));
    }

    #[test]
    fn test_try_parse_reports_reason() {
        assert_eq!(ParsedLocation::try_parse("  "), Err(LocationError::Empty));
        assert!(matches!(
            ParsedLocation::try_parse("Durham NC Cameron"),
            Err(LocationError::NoSeparator(_))
        ));
        assert!(matches!(
            ParsedLocation::try_parse("Durham, NC"),
            Err(LocationError::NoArena(_))
        ));
    }

    #[test]
    fn test_arena_name() {
        assert_eq!(
            arena_name("New York, NY Madison Square Garden").as_deref(),
            Some("Madison Square Garden")
        );
        assert_eq!(arena_name("Nowhere"), None);
    }
}
