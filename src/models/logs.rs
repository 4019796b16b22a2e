use chrono::{DateTime, Utc};

use super::CrawlStatus;

/// Append-only crawl audit record (SPEC_FULL §3 supplement).
#[derive(Debug, Clone)]
pub struct CrawlLog {
    pub url: String,
    pub domain: String,
    pub status: CrawlStatus,
    pub http_status_code: Option<u16>,
    pub duration_ms: u64,
    pub error_message: Option<String>,
    pub timestamp: DateTime<Utc>,
    pub session_id: String,
}

/// Append-only API request audit record (SPEC_FULL §3 supplement).
#[derive(Debug, Clone)]
pub struct ApiRequestLog {
    pub endpoint: String,
    pub method: String,
    pub status_code: u16,
    pub duration_ms: u64,
    pub remote_addr: Option<String>,
    pub timestamp: DateTime<Utc>,
    pub query: Option<String>,
}
