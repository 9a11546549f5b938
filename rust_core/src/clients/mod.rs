//! HTTP clients and page parsers for the scraped sources.

pub mod html;
pub mod kenpom;
pub mod teamrankings;

pub use html::HtmlParseError;
pub use kenpom::KenPomClient;
pub use teamrankings::TeamRankingsClient;
