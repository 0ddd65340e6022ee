//! Infrastructure layer: HTTP, markup parsing, storage, configuration, logging

pub mod catalog_client;
pub mod config;
pub mod database_connection;
pub mod game_repository;
pub mod http_client;
pub mod logging;
pub mod parsing;

pub use catalog_client::CatalogClient;
pub use config::{AppConfig, ConfigManager, CrawlerConfig, DatabaseConfig, SourceConfig};
pub use database_connection::DatabaseConnection;
pub use game_repository::GameRepository;
pub use http_client::{HttpClient, HttpClientConfig};
pub use logging::{get_log_directory, init_logging, init_logging_with_config};
pub use parsing::{GameDetailParser, ListingPageParser, ParseError, ParsingResult};
