//! Catalog ingestion binary: load config, open the store, run one crawl.

use std::sync::Arc;

use anyhow::Result;
use tracing::info;

use boardgame_keep::application::IngestionEngine;
use boardgame_keep::infrastructure::{
    CatalogClient, ConfigManager, DatabaseConnection, GameDetailParser, GameRepository,
    ListingPageParser, init_logging_with_config,
};

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    let manager = ConfigManager::new()?;
    let config = manager.initialize_on_first_run().await?;
    init_logging_with_config(&config.logging)?;

    info!("boardgame-keep {}", env!("CARGO_PKG_VERSION"));
    info!(
        "crawl starts at page {}, delay {}ms, {} attempts per item",
        config.crawler.start_page, config.crawler.request_delay_ms, config.crawler.retry_max_attempts
    );

    let db = DatabaseConnection::new(&config.database.database_url()?).await?;
    db.migrate().await?;
    let repository = GameRepository::new(db.pool().clone());

    let client = CatalogClient::new(&config.source)?;
    let engine = IngestionEngine::new(
        Arc::new(client),
        repository,
        ListingPageParser::new()?,
        GameDetailParser::new(&config.source.base_url)?,
        config.crawler.clone(),
    );

    let summary = engine.run().await?;
    info!(
        "run finished: {} new, {} refreshed, {} failed",
        summary.inserted,
        summary.merged,
        summary.failed.len()
    );
    Ok(())
}
