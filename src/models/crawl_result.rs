use chrono::{DateTime, Utc};

use super::CrawlStatus;

/// Failure classification produced by the Failure Classifier (C1).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureType {
    Temporary,
    RateLimited,
    Permanent,
    Unknown,
}

/// Transient record produced by one fetch attempt (spec §3: `CrawlResult`).
#[derive(Debug, Clone)]
pub struct CrawlResult {
    pub url: String,
    pub origin_url: String,
    pub depth: u32,

    pub success: bool,
    pub raw_content: Vec<u8>,
    pub text_content: String,
    pub title: Option<String>,
    pub description: Option<String>,
    pub discovered_links: Vec<String>,

    pub http_status_code: Option<u16>,
    pub content_type: Option<String>,
    pub transport_error_code: Option<String>,
    pub error_message: Option<String>,
    pub failure_type: Option<FailureType>,
    pub status: CrawlStatus,

    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub crawl_duration_ms: u64,

    pub retry_count: u32,
    pub is_retry_attempt: bool,
    pub total_retry_time_ms: u64,
}

impl CrawlResult {
    pub fn content_size(&self) -> u64 {
        self.raw_content.len() as u64
    }
}
