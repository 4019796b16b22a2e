//! Document Store Adapter (C12): CRUD on [`SiteProfile`] by URL / domain /
//! status, plus append-only `CrawlLog`/`ApiRequestLog` records (spec §4.11).

use async_trait::async_trait;

use crate::error::Result;
use crate::models::{ApiRequestLog, CrawlLog, CrawlStatus, SiteProfile};

#[async_trait]
pub trait DocumentStore: Send + Sync {
    async fn store(&self, profile: SiteProfile) -> Result<()>;
    async fn get_by_url(&self, url: &str) -> Result<Option<SiteProfile>>;
    async fn get_by_id(&self, id: &str) -> Result<Option<SiteProfile>>;
    async fn update(&self, profile: SiteProfile) -> Result<()>;
    async fn delete(&self, url: &str) -> Result<()>;
    async fn get_by_domain(&self, domain: &str, limit: usize) -> Result<Vec<SiteProfile>>;
    async fn get_by_crawl_status(&self, status: CrawlStatus, limit: usize) -> Result<Vec<SiteProfile>>;
    async fn count(&self) -> Result<u64>;
    async fn count_by_status(&self, status: CrawlStatus) -> Result<u64>;

    /// Creates the minimum indexes spec §4.11 requires: a unique index on
    /// `url`, a non-unique index on `domain`, and one on
    /// `crawlMetadata.lastCrawlStatus`. A no-op for in-memory backends,
    /// which index every field implicitly; meaningful for a real database
    /// adapter behind this trait.
    async fn ensure_indexes(&self) -> Result<()>;

    async fn append_crawl_log(&self, log: CrawlLog) -> Result<()>;
    async fn append_api_request_log(&self, log: ApiRequestLog) -> Result<()>;
    async fn recent_crawl_logs(&self, limit: usize) -> Result<Vec<CrawlLog>>;
}
