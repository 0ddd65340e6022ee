//! Ingestion engine: listing walk, per-item fetch with retry, reconcile
//!
//! Strictly sequential: one request in flight, a fixed courtesy delay between
//! items. The walk stops at the first listing page with zero rows. Items that
//! fail every attempt are collected and given exactly one more round after
//! the walk; survivors are reported in the run summary.

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use tracing::{debug, info, warn};

use crate::application::retry::RetryPolicy;
use crate::domain::game::{GameRecord, Upserted};
use crate::domain::services::{GameSource, SourceError};
use crate::infrastructure::config::CrawlerConfig;
use crate::infrastructure::game_repository::GameRepository;
use crate::infrastructure::parsing::{GameDetailParser, ListingPageParser};

/// What one ingestion run did.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct IngestionSummary {
    pub pages_walked: u32,
    /// Distinct identifiers seen on listing pages this run.
    pub discovered: usize,
    pub inserted: usize,
    pub merged: usize,
    pub unchanged: usize,
    pub skipped_existing: usize,
    /// Identifiers that failed the main pass and the deferred round.
    pub failed: Vec<i64>,
}

pub struct IngestionEngine {
    source: Arc<dyn GameSource>,
    repository: GameRepository,
    list_parser: ListingPageParser,
    detail_parser: GameDetailParser,
    retry: RetryPolicy,
    config: CrawlerConfig,
    request_delay: Duration,
}

impl IngestionEngine {
    pub fn new(
        source: Arc<dyn GameSource>,
        repository: GameRepository,
        list_parser: ListingPageParser,
        detail_parser: GameDetailParser,
        config: CrawlerConfig,
    ) -> Self {
        Self {
            source,
            repository,
            list_parser,
            detail_parser,
            retry: RetryPolicy::from_config(&config),
            request_delay: Duration::from_millis(config.request_delay_ms),
            config,
        }
    }

    /// Walk the listing, ingest every discovered identifier, then run the
    /// deferred retry round. Only connectivity loss aborts the run.
    pub async fn run(&self) -> Result<IngestionSummary> {
        let mut summary = IngestionSummary::default();
        let mut seen: HashSet<i64> = HashSet::new();
        let mut deferred: Vec<i64> = Vec::new();

        let mut page = self.config.start_page;
        loop {
            if let Some(max_pages) = self.config.max_pages {
                if summary.pages_walked >= max_pages {
                    info!("page cap of {max_pages} reached, stopping walk");
                    break;
                }
            }

            let raw = match self.source.listing_page(page).await {
                Ok(raw) => raw,
                Err(SourceError::NotFound) => {
                    info!("listing page {page} not found, walk complete");
                    break;
                }
                Err(err) => return Err(err.into()),
            };

            let ids = self.list_parser.game_ids(&raw);
            if ids.is_empty() {
                info!("listing page {page} has no game rows, walk complete");
                break;
            }
            debug!(page, count = ids.len(), "listing page parsed");

            for external_id in ids {
                if !seen.insert(external_id) {
                    continue;
                }
                summary.discovered += 1;

                if self.config.skip_existing
                    && self.repository.get_by_id(external_id).await?.is_some()
                {
                    debug!(external_id, "already stored, skipping");
                    summary.skipped_existing += 1;
                    continue;
                }

                match self.fetch_with_retry(external_id).await {
                    Some(record) => self.store(record, &mut summary).await,
                    None => {
                        warn!(external_id, "all attempts failed, deferring");
                        deferred.push(external_id);
                    }
                }
                tokio::time::sleep(self.request_delay).await;
            }

            summary.pages_walked += 1;
            info!(
                "page {page} done ({} discovered so far)",
                summary.discovered
            );
            page += 1;
        }

        if !deferred.is_empty() {
            info!("retrying {} deferred identifiers", deferred.len());
            for external_id in deferred {
                match self.fetch_with_retry(external_id).await {
                    Some(record) => self.store(record, &mut summary).await,
                    None => summary.failed.push(external_id),
                }
                tokio::time::sleep(self.request_delay).await;
            }
            if summary.failed.is_empty() {
                info!("deferred round recovered every identifier");
            } else {
                warn!("{} identifiers failed for good: {:?}", summary.failed.len(), summary.failed);
            }
        }

        info!(
            "ingestion complete: {} pages, {} discovered, {} inserted, {} merged, {} unchanged, {} skipped, {} failed",
            summary.pages_walked,
            summary.discovered,
            summary.inserted,
            summary.merged,
            summary.unchanged,
            summary.skipped_existing,
            summary.failed.len()
        );
        Ok(summary)
    }

    /// Fetch and parse one item, up to the policy's attempt limit. Returns
    /// `None` when every attempt failed.
    async fn fetch_with_retry(&self, external_id: i64) -> Option<GameRecord> {
        for attempt in 1..=self.retry.max_attempts {
            match self.attempt(external_id).await {
                Some(record) => return Some(record),
                None => {
                    debug!(external_id, attempt, "fetch attempt failed");
                    if let Some(backoff) = self.retry.backoff_after(attempt) {
                        tokio::time::sleep(backoff).await;
                    }
                }
            }
        }
        None
    }

    async fn attempt(&self, external_id: i64) -> Option<GameRecord> {
        let raw = match self.source.item_detail(external_id).await {
            Ok(raw) => raw,
            Err(err) => {
                debug!(external_id, "detail fetch failed: {err}");
                return None;
            }
        };
        match self.detail_parser.parse(&raw) {
            Ok(record) => Some(record),
            Err(err) => {
                debug!(external_id, "detail parse failed: {err}");
                None
            }
        }
    }

    /// A write failure drops the record for this run; the next run picks the
    /// identifier up again naturally.
    async fn store(&self, record: GameRecord, summary: &mut IngestionSummary) {
        match self.repository.upsert(&record).await {
            Ok(Upserted::Inserted) => summary.inserted += 1,
            Ok(Upserted::Merged) => summary.merged += 1,
            Ok(Upserted::Unchanged) => summary.unchanged += 1,
            Err(err) => {
                warn!(
                    external_id = record.external_id,
                    "persist failed, dropping record for this run: {err:#}"
                );
            }
        }
    }
}
