//! Ingest pipelines.
//!
//! One function per scheduled job: scrape a date range, resolve names,
//! assemble records and write them through the store. Per-date and per-row
//! failures are logged and counted in the returned [`IngestReport`]; only
//! failing to load the team directory aborts a run.
//!
//! [`IngestReport`]: crate::report::IngestReport

use crate::assemble::determine_site;
use crate::identity::first_arena;
use crate::location::arena_name;
use crate::models::{ArenaRow, SiteAssignment, TeamId};
use crate::store::IngestStore;
use std::collections::HashMap;
use tracing::warn;

pub mod box_scores;
pub mod predictions;
pub mod results;
pub mod team_stats;

pub use box_scores::ingest_box_scores;
pub use predictions::ingest_predictions;
pub use results::ingest_results;
pub use team_stats::ingest_team_stats;

/// Arena lookups memoized by arena name for the length of a run.
#[derive(Debug, Default)]
pub struct SiteResolver {
    arenas: HashMap<String, Option<ArenaRow>>,
}

impl SiteResolver {
    pub fn new() -> Self {
        Self::default()
    }

    /// Arena named in a location cell; a failed lookup is logged and treated as unresolved.
    pub async fn arena<S: IngestStore + ?Sized>(
        &mut self,
        store: &S,
        location: Option<&str>,
    ) -> Option<ArenaRow> {
        let name = location.and_then(arena_name)?;
        if let Some(cached) = self.arenas.get(&name) {
            return *cached;
        }

        match store.arenas_named(&name).await {
            Ok(candidates) => {
                let arena = first_arena(&name, &candidates);
                self.arenas.insert(name, arena);
                arena
            }
            Err(e) => {
                warn!("Arena lookup failed for {:?}: {:#}", name, e);
                None
            }
        }
    }

    pub async fn site<S: IngestStore + ?Sized>(
        &mut self,
        store: &S,
        location: Option<&str>,
        team1: TeamId,
        team2: TeamId,
    ) -> SiteAssignment {
        let arena = self.arena(store, location).await;
        determine_site(arena, team1, team2)
    }
}
