//! Port describing the remote content workspace.

use async_trait::async_trait;
use quire_content_types::PageRecord;
use thiserror::Error;

use crate::domain::blocks::ContentBlock;

/// Upstream failure. Propagated unchanged; this layer never retries.
#[derive(Debug, Error)]
pub enum SourceError {
    #[error("content request failed: {0}")]
    Http(String),
    #[error("content service answered {status}: {body}")]
    Status { status: u16, body: String },
    #[error("failed to decode content response: {0}")]
    Decode(String),
    #[error("content source misconfigured: {0}")]
    Configuration(String),
}

#[async_trait]
pub trait ContentSource: Send + Sync {
    /// Every record whose status marks it as published, in source order.
    async fn query_published_pages(&self) -> Result<Vec<PageRecord>, SourceError>;

    /// Direct lookup of a published record by its explicit slug property.
    async fn fetch_page_by_slug(&self, slug: &str) -> Result<Option<PageRecord>, SourceError>;

    /// All blocks of a page in document order. Pagination stays internal.
    async fn fetch_page_blocks(&self, page_id: &str) -> Result<Vec<ContentBlock>, SourceError>;
}
