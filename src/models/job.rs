use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Discriminates a job's payload shape (spec §3: `Job.type`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobType {
    CrawlDomain,
    SendEmail,
    BulkCrawl,
}

/// A job's current lifecycle position (spec §3: `Job.status`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobStatus {
    Pending,
    Processing,
    Completed,
    Failed,
    Retrying,
}

/// Durable queue record (spec §3: `Job`).
///
/// Invariant: at any instant a job's `id` appears in exactly one of the
/// pending/processing/completed/failed Redis lists, and `job_queue:stats`
/// reflects that membership.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Job {
    pub id: String,
    #[serde(rename = "type")]
    pub job_type: JobType,
    pub status: JobStatus,
    pub data: Value,
    pub attempts: u32,
    pub max_attempts: u32,
    pub created_at: DateTime<Utc>,
    pub scheduled_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
    pub error_message: Option<String>,
}

/// Payload for a [`JobType::CrawlDomain`] job.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CrawlDomainJob {
    pub domain: String,
    pub seed_url: String,
    pub webmaster_email: Option<String>,
    pub max_pages: usize,
    pub session_id: Option<String>,
}

/// Payload for a [`JobType::SendEmail`] job.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmailJob {
    pub to: String,
    pub subject: String,
    pub template_name: String,
    pub template_data: Value,
    pub domain: Option<String>,
}

/// Payload for a [`JobType::BulkCrawl`] job: fans out to many `CrawlDomain` jobs.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BulkCrawlJob {
    pub domains: Vec<CrawlDomainJob>,
}
