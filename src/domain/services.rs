//! Service abstractions implemented by the infrastructure layer

use async_trait::async_trait;
use thiserror::Error;

/// Failures surfaced by a remote catalog source.
#[derive(Error, Debug)]
pub enum SourceError {
    #[error("network error: {0}")]
    Network(String),

    #[error("unexpected status {status} from {url}")]
    Status { status: u16, url: String },

    /// Terminal signal for listing enumeration, not a failure.
    #[error("resource not found")]
    NotFound,
}

/// A remote game catalog: one request per listing page, one per item detail.
///
/// Implementations do no retrying of their own; bounded retry is the
/// ingestion engine's responsibility.
#[async_trait]
pub trait GameSource: Send + Sync {
    /// Fetch the raw markup of one listing page.
    async fn listing_page(&self, page: u32) -> Result<String, SourceError>;

    /// Fetch the raw detail payload for one external id.
    async fn item_detail(&self, external_id: i64) -> Result<String, SourceError>;
}
