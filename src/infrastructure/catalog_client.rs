//! Remote catalog endpoints
//!
//! Maps the two catalog endpoints — HTML listing pages and XML item details —
//! onto the `GameSource` contract, translating HTTP statuses into the
//! ingestion error taxonomy. No retries here; the engine owns that policy.

use anyhow::Result;
use async_trait::async_trait;
use tracing::debug;

use super::config::SourceConfig;
use super::http_client::{HttpClient, HttpClientConfig};
use crate::domain::services::{GameSource, SourceError};

pub struct CatalogClient {
    http: HttpClient,
    base_url: String,
}

impl CatalogClient {
    pub fn new(config: &SourceConfig) -> Result<Self> {
        let http = HttpClient::new(HttpClientConfig {
            user_agent: config.user_agent.clone(),
            timeout_seconds: config.timeout_seconds,
            max_requests_per_second: config.max_requests_per_second,
            cookies: config.cookies.clone(),
        })?;
        Ok(Self {
            http,
            base_url: config.base_url.trim_end_matches('/').to_string(),
        })
    }

    fn listing_url(&self, page: u32) -> String {
        format!("{}/browse/boardgame/page/{page}", self.base_url)
    }

    fn detail_url(&self, external_id: i64) -> String {
        format!("{}/xmlapi2/thing?id={external_id}&stats=1", self.base_url)
    }

    async fn fetch(&self, url: &str) -> Result<String, SourceError> {
        let response = self
            .http
            .get(url)
            .await
            .map_err(|e| SourceError::Network(format!("{e:#}")))?;

        let status = response.status();
        if status.as_u16() == 404 {
            return Err(SourceError::NotFound);
        }
        if !status.is_success() {
            return Err(SourceError::Status {
                status: status.as_u16(),
                url: url.to_string(),
            });
        }
        response
            .text()
            .await
            .map_err(|e| SourceError::Network(e.to_string()))
    }
}

#[async_trait]
impl GameSource for CatalogClient {
    async fn listing_page(&self, page: u32) -> Result<String, SourceError> {
        debug!(page, "fetching listing page");
        self.fetch(&self.listing_url(page)).await
    }

    async fn item_detail(&self, external_id: i64) -> Result<String, SourceError> {
        debug!(external_id, "fetching item detail");
        self.fetch(&self.detail_url(external_id)).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client() -> CatalogClient {
        CatalogClient::new(&SourceConfig::default()).unwrap()
    }

    #[test]
    fn listing_url_embeds_page_number() {
        assert_eq!(
            client().listing_url(7),
            "https://boardgamegeek.com/browse/boardgame/page/7"
        );
    }

    #[test]
    fn detail_url_embeds_id_and_stats_flag() {
        assert_eq!(
            client().detail_url(167791),
            "https://boardgamegeek.com/xmlapi2/thing?id=167791&stats=1"
        );
    }
}
