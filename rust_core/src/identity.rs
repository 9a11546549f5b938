//! Team and arena identity resolution.
//!
//! This module provides:
//! - A two-tier team directory: canonical names first, then aliases
//! - Exact matching only; a miss is reported by the caller, never defaulted
//! - First-candidate selection for arena names that are not unique

use crate::models::{AliasRow, ArenaRow, TeamId, TeamRow};
use std::collections::HashMap;
use tracing::{debug, warn};

/// Name → team id lookup built from the `teams` and `team_aliases` tables.
#[derive(Debug, Clone, Default)]
pub struct TeamDirectory {
    /// canonical team name -> team id
    canonical: HashMap<String, TeamId>,
    /// alias name -> canonical team id
    aliases: HashMap<String, TeamId>,
}

impl TeamDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from reference rows.
    ///
    /// A duplicated alias keeps its first mapping; the conflict is logged.
    pub fn from_rows(teams: &[TeamRow], aliases: &[AliasRow]) -> Self {
        let mut directory = Self::new();
        for team in teams {
            directory.insert_team(team.team_id, &team.team_name);
        }
        for alias in aliases {
            directory.insert_alias(&alias.alias_name, alias.canonical_team_id);
        }
        debug!(
            "Team directory loaded: {} teams, {} aliases",
            directory.canonical.len(),
            directory.aliases.len()
        );
        directory
    }

    pub fn insert_team(&mut self, team_id: TeamId, name: &str) {
        if let Some(existing) = self.canonical.insert(name.to_string(), team_id) {
            if existing != team_id {
                warn!(
                    "Canonical name {:?} maps to teams {} and {}; using {}",
                    name, existing, team_id, team_id
                );
            }
        }
    }

    pub fn insert_alias(&mut self, alias: &str, team_id: TeamId) {
        if let Some(&canonical) = self.canonical.get(alias) {
            if canonical != team_id {
                warn!(
                    "Alias {:?} -> {} is shadowed by canonical team {}",
                    alias, team_id, canonical
                );
            }
        }
        match self.aliases.get(alias) {
            Some(&existing) if existing != team_id => {
                warn!(
                    "Alias {:?} maps to teams {} and {}; keeping {}",
                    alias, existing, team_id, existing
                );
            }
            Some(_) => {}
            None => {
                self.aliases.insert(alias.to_string(), team_id);
            }
        }
    }

    /// Resolve a cleaned display name to a team id.
    pub fn resolve(&self, name: &str) -> Option<TeamId> {
        self.canonical
            .get(name)
            .or_else(|| self.aliases.get(name))
            .copied()
    }

    /// Resolve both sides of a matchup, or report the names that missed.
    pub fn resolve_pair(&self, a: &str, b: &str) -> Result<(TeamId, TeamId), Vec<String>> {
        match (self.resolve(a), self.resolve(b)) {
            (Some(a_id), Some(b_id)) => Ok((a_id, b_id)),
            (a_id, b_id) => {
                let mut missed = Vec::new();
                if a_id.is_none() {
                    missed.push(a.to_string());
                }
                if b_id.is_none() {
                    missed.push(b.to_string());
                }
                Err(missed)
            }
        }
    }

    pub fn len(&self) -> usize {
        self.canonical.len() + self.aliases.len()
    }

    pub fn is_empty(&self) -> bool {
        self.canonical.is_empty() && self.aliases.is_empty()
    }
}

/// Pick the arena to use from the candidates for one arena name.
pub fn first_arena(arena_name: &str, candidates: &[ArenaRow]) -> Option<ArenaRow> {
    if candidates.len() > 1 {
        debug!(
            "Arena {:?} has {} candidates; using arena {}",
            arena_name,
            candidates.len(),
            candidates[0].arena_id
        );
    }
    candidates.first().copied()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn directory() -> TeamDirectory {
        TeamDirectory::from_rows(
            &[
                TeamRow { team_id: 1, team_name: "Duke".to_string() },
                TeamRow { team_id: 2, team_name: "North Carolina".to_string() },
            ],
            &[
                AliasRow { alias_name: "UNC".to_string(), canonical_team_id: 2 },
                AliasRow { alias_name: "Duke".to_string(), canonical_team_id: 99 },
            ],
        )
    }

    #[test]
    fn test_resolve_canonical_then_alias() {
        let dir = directory();
        assert_eq!(dir.resolve("Duke"), Some(1));
        assert_eq!(dir.resolve("North Carolina"), Some(2));
        assert_eq!(dir.resolve("UNC"), Some(2));
    }

    #[test]
    fn test_no_fuzzy_matching() {
        let dir = directory();
        assert_eq!(dir.resolve("duke"), None);
        assert_eq!(dir.resolve("Duke "), None);
        assert_eq!(dir.resolve("N. Carolina"), None);
    }

    #[test]
    fn test_duplicate_alias_keeps_first() {
        let mut dir = TeamDirectory::new();
        dir.insert_alias("St. Mary's", 7);
        dir.insert_alias("St. Mary's", 8);
        assert_eq!(dir.resolve("St. Mary's"), Some(7));
    }

    #[test]
    fn test_resolve_pair_reports_misses() {
        let dir = directory();
        assert_eq!(dir.resolve_pair("Duke", "UNC"), Ok((1, 2)));
        assert_eq!(
            dir.resolve_pair("Gonzaga", "UNC"),
            Err(vec!["Gonzaga".to_string()])
        );
        assert_eq!(
            dir.resolve_pair("A", "B"),
            Err(vec!["A".to_string(), "B".to_string()])
        );
    }

    #[test]
    fn test_first_arena() {
        let candidates = [
            ArenaRow { arena_id: 10, home_team_id: Some(1) },
            ArenaRow { arena_id: 11, home_team_id: None },
        ];
        assert_eq!(first_arena("Cameron", &candidates), Some(candidates[0]));
        assert_eq!(first_arena("Nowhere", &[]), None);
    }
}
