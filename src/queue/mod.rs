//! Job Queue (C15): durable, at-least-once background work, spec §4.14/§6.

pub mod handlers;
pub mod job_queue;

use std::sync::Arc;

use crate::crawler::CrawlerManager;
use crate::models::JobType;

pub use handlers::{BulkCrawlHandler, CrawlDomainHandler, SendEmailHandler};
pub use job_queue::{JobHandler, JobQueue, QueueStats};

/// Registers the three built-in handlers (spec §4.14), the way the
/// original constructor wires them up before the first worker starts.
pub async fn install_default_handlers(queue: &Arc<JobQueue>, crawler_manager: Arc<CrawlerManager>) {
    queue
        .set_job_handler(
            JobType::CrawlDomain,
            Arc::new(CrawlDomainHandler::new(crawler_manager, Arc::downgrade(queue))),
        )
        .await;
    queue.set_job_handler(JobType::SendEmail, Arc::new(SendEmailHandler)).await;
    queue
        .set_job_handler(JobType::BulkCrawl, Arc::new(BulkCrawlHandler::new(Arc::downgrade(queue))))
        .await;
}
