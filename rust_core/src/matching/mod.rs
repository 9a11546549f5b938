//! Game matching for box-score merges.
//!
//! A lookup is scoped to a single date and maps an unordered team pair to the
//! stored game. Both orderings of a pair resolve to the same row.

use crate::models::{GameId, StoredGame, TeamId};
use chrono::NaiveDate;
use std::collections::HashMap;
use tracing::{debug, warn};

/// Per-date lookup: (team a, team b) -> stored game.
#[derive(Debug, Clone)]
pub struct GameLookup {
    date: NaiveDate,
    /// Both (team1, team2) and (team2, team1) are keys.
    games: HashMap<(TeamId, TeamId), StoredGame>,
}

impl GameLookup {
    pub fn new(date: NaiveDate) -> Self {
        Self {
            date,
            games: HashMap::new(),
        }
    }

    /// Build from the rows stored for `date`.
    pub fn from_rows(date: NaiveDate, rows: &[StoredGame]) -> Self {
        let mut lookup = Self::new(date);
        for row in rows {
            lookup.insert(*row);
        }
        debug!("Loaded {} games for {}", lookup.len(), date);
        lookup
    }

    pub fn insert(&mut self, game: StoredGame) {
        let forward = (game.team1_id, game.team2_id);
        let reverse = (game.team2_id, game.team1_id);
        if let Some(existing) = self.games.get(&forward) {
            if existing.game_id != game.game_id {
                warn!(
                    "Teams {} and {} have two games on {} ({} and {}); keeping {}",
                    game.team1_id, game.team2_id, self.date, existing.game_id, game.game_id,
                    existing.game_id
                );
                return;
            }
        }
        self.games.insert(forward, game);
        self.games.insert(reverse, game);
    }

    /// Stored game for a matchup, in either team order.
    pub fn find(&self, a: TeamId, b: TeamId) -> Option<&StoredGame> {
        self.games.get(&(a, b))
    }

    pub fn game_id(&self, a: TeamId, b: TeamId) -> Option<GameId> {
        self.find(a, b).map(|g| g.game_id)
    }

    pub fn date(&self) -> NaiveDate {
        self.date
    }

    /// Number of distinct games.
    pub fn len(&self) -> usize {
        self.games
            .iter()
            .filter(|(&(a, b), _)| a <= b)
            .count()
    }

    pub fn is_empty(&self) -> bool {
        self.games.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 1, 18).unwrap()
    }

    #[test]
    fn test_lookup_is_symmetric() {
        let lookup = GameLookup::from_rows(
            date(),
            &[
                StoredGame { game_id: 100, team1_id: 1, team2_id: 2 },
                StoredGame { game_id: 101, team1_id: 7, team2_id: 3 },
            ],
        );
        assert_eq!(lookup.game_id(1, 2), Some(100));
        assert_eq!(lookup.game_id(2, 1), Some(100));
        assert_eq!(lookup.game_id(3, 7), Some(101));
        assert_eq!(lookup.game_id(7, 3), Some(101));
        assert_eq!(lookup.len(), 2);
    }

    #[test]
    fn test_lookup_miss() {
        let lookup = GameLookup::from_rows(
            date(),
            &[StoredGame { game_id: 100, team1_id: 1, team2_id: 2 }],
        );
        assert_eq!(lookup.find(1, 3), None);
        assert!(GameLookup::new(date()).is_empty());
    }

    #[test]
    fn test_find_keeps_stored_orientation() {
        let lookup = GameLookup::from_rows(
            date(),
            &[StoredGame { game_id: 5, team1_id: 9, team2_id: 4 }],
        );
        let game = lookup.find(4, 9).unwrap();
        assert_eq!(game.team1_id, 9);
        assert_eq!(game.team2_id, 4);
    }

    #[test]
    fn test_duplicate_pair_keeps_first() {
        let lookup = GameLookup::from_rows(
            date(),
            &[
                StoredGame { game_id: 1, team1_id: 1, team2_id: 2 },
                StoredGame { game_id: 2, team1_id: 1, team2_id: 2 },
            ],
        );
        assert_eq!(lookup.game_id(2, 1), Some(1));
    }
}
