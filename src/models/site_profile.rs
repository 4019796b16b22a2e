use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Outcome of one crawl attempt against a URL.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CrawlStatus {
    Success,
    Failed,
    Pending,
    Timeout,
    RobotBlocked,
    RedirectLoop,
    ContentTooLarge,
    InvalidContentType,
}

/// Crawl metadata block embedded in [`SiteProfile`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CrawlMetadata {
    pub last_crawl_time: DateTime<Utc>,
    pub first_crawl_time: DateTime<Utc>,
    pub last_crawl_status: CrawlStatus,
    pub last_error_message: Option<String>,
    pub crawl_count: u32,
    pub crawl_interval_hours: u32,
    pub user_agent: String,
    pub http_status_code: Option<u16>,
    pub content_size: Option<u64>,
    pub content_type: Option<String>,
    pub crawl_duration_ms: Option<u64>,
}

/// The canonical per-URL record (spec §3: `SiteProfile`).
///
/// Invariants: `first_crawl_time <= last_crawl_time`; `crawl_count >= 1`
/// once stored; `is_indexed` iff `last_crawl_status == Success` and text
/// content was available at write time.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SiteProfile {
    pub url: String,
    pub domain: String,
    pub id: Option<String>,

    pub title: String,
    pub description: Option<String>,
    pub keywords: Vec<String>,
    pub language: Option<String>,
    pub category: Option<String>,

    pub crawl_metadata: CrawlMetadata,

    pub page_rank: Option<f64>,
    pub content_quality: Option<f64>,
    pub word_count: Option<u32>,
    pub is_mobile: Option<bool>,
    pub has_ssl: Option<bool>,

    pub outbound_links: Vec<String>,
    pub inbound_link_count: Option<u32>,

    pub is_indexed: bool,
    pub last_modified: Option<DateTime<Utc>>,
    pub indexed_at: Option<DateTime<Utc>>,

    pub author: Option<String>,
    pub publisher: Option<String>,
    pub publish_date: Option<DateTime<Utc>>,
}

impl SiteProfile {
    /// Checks the two invariants spec.md §3 names for a stored profile.
    pub fn check_invariants(&self) -> bool {
        let ordered = self.crawl_metadata.first_crawl_time <= self.crawl_metadata.last_crawl_time;
        let counted = self.crawl_metadata.crawl_count >= 1;
        ordered && counted
    }
}
