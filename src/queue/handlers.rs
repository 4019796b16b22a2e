//! Default job handlers (spec §4.14), grounded in
//! `original_source/src/job_queue/JobQueue.cpp`'s
//! `handleCrawlDomain`/`handleSendEmail`/`handleBulkCrawl`.

use std::sync::{Arc, Weak};
use std::time::Duration;

use async_trait::async_trait;
use tracing::{info, warn};

use crate::crawler::{CrawlStatus, CrawlerManager};
use crate::models::{BulkCrawlJob, CrawlConfig, CrawlDomainJob, EmailJob, Job};

use super::job_queue::{JobHandler, JobQueue};

/// Runs a crawl to completion, polling status the way the original
/// `handleCrawlDomain` does, then schedules a webmaster notification email
/// when one was requested.
pub struct CrawlDomainHandler {
    crawler_manager: Arc<CrawlerManager>,
    queue: Weak<JobQueue>,
    poll_interval: Duration,
    timeout: Duration,
}

impl CrawlDomainHandler {
    pub fn new(crawler_manager: Arc<CrawlerManager>, queue: Weak<JobQueue>) -> Self {
        Self { crawler_manager, queue, poll_interval: Duration::from_secs(5), timeout: Duration::from_secs(600) }
    }
}

#[async_trait]
impl JobHandler for CrawlDomainHandler {
    async fn handle(&self, job: &Job) -> bool {
        let payload: CrawlDomainJob = match serde_json::from_value(job.data.clone()) {
            Ok(payload) => payload,
            Err(e) => {
                warn!(job_id = %job.id, error = %e, "crawl domain job has malformed payload");
                return false;
            }
        };

        info!(domain = %payload.domain, "starting crawl for domain job");
        let mut config = CrawlConfig::default();
        config.max_pages = payload.max_pages;
        config.max_depth = 3;
        config.respect_robots_txt = true;
        config.restrict_to_seed_domain = true;

        let session_id = match self.crawler_manager.start_crawl(&payload.seed_url, config).await {
            Ok(session_id) => session_id,
            Err(e) => {
                warn!(domain = %payload.domain, error = %e, "failed to start crawl for domain job");
                return false;
            }
        };

        let started = tokio::time::Instant::now();
        loop {
            match self.crawler_manager.get_crawl_status(&session_id).await {
                Ok(CrawlStatus::Running) => {}
                Ok(CrawlStatus::Completed) | Ok(CrawlStatus::Failed) => break,
                Err(_) => break,
            }
            if started.elapsed() > self.timeout {
                warn!(domain = %payload.domain, "crawl job timed out, stopping session");
                let _ = self.crawler_manager.stop_crawl(&session_id).await;
                return false;
            }
            tokio::time::sleep(self.poll_interval).await;
        }

        let results = self.crawler_manager.get_crawl_results(&session_id).await.unwrap_or_default();
        info!(domain = %payload.domain, pages_crawled = results.len(), "crawl job finished");

        if let Some(to) = payload.webmaster_email.clone() {
            if let Some(queue) = self.queue.upgrade() {
                let email = EmailJob {
                    to,
                    subject: "Your website has been crawled by our search engine".to_string(),
                    template_name: "webmaster_notification".to_string(),
                    template_data: serde_json::json!({
                        "domain": payload.domain,
                        "pages_crawled": results.len(),
                    }),
                    domain: Some(payload.domain.clone()),
                };
                if let Err(e) = queue.add_email_job(&email).await {
                    warn!(domain = %payload.domain, error = %e, "failed to enqueue webmaster notification");
                }
            }
        }

        true
    }
}

/// Logs the email that would be sent. Actual delivery is out of scope
/// (spec Non-goals); this mirrors the original's logging-only placeholder
/// while still running the same job lifecycle as a real handler would.
pub struct SendEmailHandler;

#[async_trait]
impl JobHandler for SendEmailHandler {
    async fn handle(&self, job: &Job) -> bool {
        let payload: EmailJob = match serde_json::from_value(job.data.clone()) {
            Ok(payload) => payload,
            Err(e) => {
                warn!(job_id = %job.id, error = %e, "send email job has malformed payload");
                return false;
            }
        };

        info!(to = %payload.to, subject = %payload.subject, template = %payload.template_name, "sending notification email");
        tokio::time::sleep(Duration::from_millis(100)).await;
        true
    }
}

/// Fans a bulk crawl job out into one `CrawlDomain` job per domain.
pub struct BulkCrawlHandler {
    queue: Weak<JobQueue>,
}

impl BulkCrawlHandler {
    pub fn new(queue: Weak<JobQueue>) -> Self {
        Self { queue }
    }
}

#[async_trait]
impl JobHandler for BulkCrawlHandler {
    async fn handle(&self, job: &Job) -> bool {
        let payload: BulkCrawlJob = match serde_json::from_value(job.data.clone()) {
            Ok(payload) => payload,
            Err(e) => {
                warn!(job_id = %job.id, error = %e, "bulk crawl job has malformed payload");
                return false;
            }
        };

        let Some(queue) = self.queue.upgrade() else {
            warn!(job_id = %job.id, "job queue dropped, cannot fan out bulk crawl");
            return false;
        };

        match queue.add_bulk_domain_crawl_jobs(&payload.domains).await {
            Ok(ids) => {
                info!(job_id = %job.id, domains = payload.domains.len(), "fanned out bulk crawl job");
                ids.len() == payload.domains.len()
            }
            Err(e) => {
                warn!(job_id = %job.id, error = %e, "failed to fan out bulk crawl job");
                false
            }
        }
    }
}
