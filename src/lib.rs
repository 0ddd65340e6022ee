//! boardgame-keep - personal board-game catalog
//!
//! Crawls a public game database into a local SQLite catalog: sequential
//! listing enumeration, tolerant detail parsing, bounded retry, and a
//! fill-gaps-only merge that leaves user-owned state (favorites, ratings,
//! reviews) untouched across re-crawls.

pub mod application;
pub mod domain;
pub mod infrastructure;

pub use application::{IngestionEngine, IngestionSummary};
pub use domain::{GameFilter, GameRecord, GameSource, SourceError, UserAnnotation};
pub use infrastructure::{
    AppConfig, CatalogClient, ConfigManager, DatabaseConnection, GameDetailParser,
    GameRepository, ListingPageParser,
};
