//! CBB ingest core - scraping, reconciliation and storage for college basketball data.
//!
//! This crate provides:
//! - Scraped-text cleaning and arena location parsing
//! - Two-tier team identity resolution (canonical names, then aliases)
//! - Game matching against stored games, independent of team order
//! - Record assembly for results, predictions, box scores and daily stats
//! - Chunked upserts into PostgreSQL
//! - Source clients for KenPom and TeamRankings
//! - The four ingest pipelines the service binaries run

pub mod assemble;
pub mod batch;
pub mod clients;
pub mod config;
pub mod context;
pub mod dates;
pub mod db;
pub mod identity;
pub mod location;
pub mod matching;
pub mod models;
pub mod normalize;
pub mod pipelines;
pub mod providers;
pub mod report;
pub mod store;
pub mod throttle;

pub use assemble::SkipReason;
pub use batch::{BatchOutcome, UpsertBatcher};
pub use config::IngestConfig;
pub use context::IngestContext;
pub use dates::DateRange;
pub use identity::TeamDirectory;
pub use matching::GameLookup;
pub use report::IngestReport;
pub use store::{IngestStore, PgStore};
