//! Job Queue (C15): Redis-backed at-least-once job queue, spec §4.14/§6.
//! Grounded 1:1 in `original_source/include/job_queue/JobQueue.h` and
//! `src/job_queue/JobQueue.cpp` for the key layout and lifecycle (four lists
//! plus a stats hash), and in
//! `examples/monokrome-foiacquire/src/rate_limit/redis.rs` for the
//! idiomatic Rust surface: `redis::aio::ConnectionManager`, `redis::pipe()`
//! for batched writes, and cheap `Clone` over the connection manager.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use redis::aio::ConnectionManager;
use redis::AsyncCommands;
use serde_json::Value;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tracing::{info, instrument, warn};
use uuid::Uuid;

use crate::error::{CoreError, Result};
use crate::models::{BulkCrawlJob, CrawlDomainJob, EmailJob, Job, JobStatus, JobType};

const QUEUE_PENDING: &str = "job_queue:pending";
const QUEUE_PROCESSING: &str = "job_queue:processing";
const QUEUE_COMPLETED: &str = "job_queue:completed";
const QUEUE_FAILED: &str = "job_queue:failed";
const JOB_DATA_PREFIX: &str = "job_data:";
const STATS_KEY: &str = "job_queue:stats";

const REQUEUE_DELAY: chrono::Duration = chrono::Duration::minutes(5);

fn job_data_key(job_id: &str) -> String {
    format!("{JOB_DATA_PREFIX}{job_id}")
}

fn status_key(status: JobStatus) -> &'static str {
    match status {
        JobStatus::Pending | JobStatus::Retrying => QUEUE_PENDING,
        JobStatus::Processing => QUEUE_PROCESSING,
        JobStatus::Completed => QUEUE_COMPLETED,
        JobStatus::Failed => QUEUE_FAILED,
    }
}

fn stats_field(status: JobStatus) -> &'static str {
    match status {
        JobStatus::Pending | JobStatus::Retrying => "pending",
        JobStatus::Processing => "processing",
        JobStatus::Completed => "completed",
        JobStatus::Failed => "failed",
    }
}

fn redis_err(e: redis::RedisError) -> CoreError {
    CoreError::Other(e.into())
}

/// Queue depth snapshot (spec §4.14: `getStats`).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct QueueStats {
    pub pending: i64,
    pub processing: i64,
    pub completed: i64,
    pub failed: i64,
    pub total: i64,
}

/// A job-type-specific worker (spec §4.14: `setJobHandler`). Returns `true`
/// on success; `false` triggers the retry/backoff path in the worker loop.
#[async_trait]
pub trait JobHandler: Send + Sync {
    async fn handle(&self, job: &Job) -> bool;
}

/// Redis-backed job queue: four lists (pending/processing/completed/failed)
/// plus a `job_data:{id}` record per job and a `job_queue:stats` hash.
pub struct JobQueue {
    conn: ConnectionManager,
    handlers: Mutex<HashMap<JobType, Arc<dyn JobHandler>>>,
    running: Arc<AtomicBool>,
    workers: Mutex<Vec<JoinHandle<()>>>,
}

impl JobQueue {
    pub async fn connect(redis_url: &str) -> Result<Self> {
        let client = redis::Client::open(redis_url).map_err(redis_err)?;
        let conn = ConnectionManager::new(client).await.map_err(redis_err)?;
        Ok(Self {
            conn,
            handlers: Mutex::new(HashMap::new()),
            running: Arc::new(AtomicBool::new(false)),
            workers: Mutex::new(Vec::new()),
        })
    }

    pub async fn set_job_handler(&self, job_type: JobType, handler: Arc<dyn JobHandler>) {
        self.handlers.lock().await.insert(job_type, handler);
    }

    /// `addJob(type, data, maxAttempts) -> jobId` (spec §4.14).
    #[instrument(skip(self, data))]
    pub async fn add_job(&self, job_type: JobType, data: Value, max_attempts: u32) -> Result<String> {
        let now = Utc::now();
        let job = Job {
            id: Uuid::new_v4().to_string(),
            job_type,
            status: JobStatus::Pending,
            data,
            attempts: 0,
            max_attempts,
            created_at: now,
            scheduled_at: now,
            completed_at: None,
            error_message: None,
        };

        let payload = serde_json::to_string(&job).map_err(|e| CoreError::Other(e.into()))?;
        let mut conn = self.conn.clone();
        redis::pipe()
            .set(job_data_key(&job.id), payload)
            .lpush(QUEUE_PENDING, &job.id)
            .hincr(STATS_KEY, "pending", 1)
            .hincr(STATS_KEY, "total", 1)
            .query_async::<()>(&mut conn)
            .await
            .map_err(redis_err)?;

        info!(job_id = %job.id, job_type = ?job.job_type, "added job to queue");
        Ok(job.id)
    }

    pub async fn add_domain_crawl_job(&self, job: &CrawlDomainJob) -> Result<String> {
        let data = serde_json::to_value(job).map_err(|e| CoreError::Other(e.into()))?;
        self.add_job(JobType::CrawlDomain, data, 3).await
    }

    pub async fn add_email_job(&self, job: &EmailJob) -> Result<String> {
        let data = serde_json::to_value(job).map_err(|e| CoreError::Other(e.into()))?;
        self.add_job(JobType::SendEmail, data, 3).await
    }

    pub async fn add_bulk_crawl_job(&self, job: &BulkCrawlJob) -> Result<String> {
        let data = serde_json::to_value(job).map_err(|e| CoreError::Other(e.into()))?;
        self.add_job(JobType::BulkCrawl, data, 1).await
    }

    /// `addBulkDomainCrawlJobs` (spec §4.14): pipelines the writes the same
    /// way `addJob` does individually, batched into one round trip.
    pub async fn add_bulk_domain_crawl_jobs(&self, jobs: &[CrawlDomainJob]) -> Result<Vec<String>> {
        if jobs.is_empty() {
            return Ok(Vec::new());
        }

        let now = Utc::now();
        let mut pipe = redis::pipe();
        let mut ids = Vec::with_capacity(jobs.len());
        for domain_job in jobs {
            let job = Job {
                id: Uuid::new_v4().to_string(),
                job_type: JobType::CrawlDomain,
                status: JobStatus::Pending,
                data: serde_json::to_value(domain_job).map_err(|e| CoreError::Other(e.into()))?,
                attempts: 0,
                max_attempts: 3,
                created_at: now,
                scheduled_at: now,
                completed_at: None,
                error_message: None,
            };
            let payload = serde_json::to_string(&job).map_err(|e| CoreError::Other(e.into()))?;
            pipe.set(job_data_key(&job.id), payload).ignore();
            pipe.lpush(QUEUE_PENDING, &job.id).ignore();
            ids.push(job.id);
        }

        let mut conn = self.conn.clone();
        pipe.query_async::<()>(&mut conn).await.map_err(redis_err)?;

        redis::pipe()
            .hincr(STATS_KEY, "pending", jobs.len() as i64)
            .hincr(STATS_KEY, "total", jobs.len() as i64)
            .query_async::<()>(&mut conn)
            .await
            .map_err(redis_err)?;

        info!(count = jobs.len(), "added bulk domain crawl jobs to queue");
        Ok(ids)
    }

    /// `getJob(jobId)` (spec §4.14).
    pub async fn get_job(&self, job_id: &str) -> Result<Option<Job>> {
        let mut conn = self.conn.clone();
        let raw: Option<String> = conn.get(job_data_key(job_id)).await.map_err(redis_err)?;
        match raw {
            Some(raw) => Ok(Some(serde_json::from_str(&raw).map_err(|e| CoreError::Other(e.into()))?)),
            None => Ok(None),
        }
    }

    /// `getJobsByStatus(status)` (spec §4.14).
    pub async fn get_jobs_by_status(&self, status: JobStatus) -> Result<Vec<Job>> {
        let mut conn = self.conn.clone();
        let ids: Vec<String> = conn.lrange(status_key(status), 0, -1).await.map_err(redis_err)?;
        self.fetch_jobs(&ids).await
    }

    /// `getJobsByType(type)` (spec §4.14): scans every list since jobs of a
    /// given type can be in any lifecycle stage.
    pub async fn get_jobs_by_type(&self, job_type: JobType) -> Result<Vec<Job>> {
        let mut conn = self.conn.clone();
        let mut ids = Vec::new();
        for key in [QUEUE_PENDING, QUEUE_PROCESSING, QUEUE_COMPLETED, QUEUE_FAILED] {
            let mut batch: Vec<String> = conn.lrange(key, 0, -1).await.map_err(redis_err)?;
            ids.append(&mut batch);
        }
        let jobs = self.fetch_jobs(&ids).await?;
        Ok(jobs.into_iter().filter(|j| j.job_type == job_type).collect())
    }

    async fn fetch_jobs(&self, ids: &[String]) -> Result<Vec<Job>> {
        let mut jobs = Vec::with_capacity(ids.len());
        for id in ids {
            if let Some(job) = self.get_job(id).await? {
                jobs.push(job);
            }
        }
        Ok(jobs)
    }

    /// `getStats()` (spec §4.14).
    pub async fn get_stats(&self) -> Result<QueueStats> {
        let mut conn = self.conn.clone();
        let raw: Vec<Option<String>> = redis::cmd("HMGET")
            .arg(STATS_KEY)
            .arg(&["pending", "processing", "completed", "failed", "total"])
            .query_async(&mut conn)
            .await
            .map_err(redis_err)?;

        let parse = |i: usize| raw.get(i).and_then(|v| v.as_ref()).and_then(|v| v.parse().ok()).unwrap_or(0);
        Ok(QueueStats {
            pending: parse(0),
            processing: parse(1),
            completed: parse(2),
            failed: parse(3),
            total: parse(4),
        })
    }

    /// `startWorkers(numWorkers)` (spec §4.14): one tokio task per worker,
    /// each polling `BRPOPLPUSH` with a short timeout so `stopWorkers`
    /// drains promptly.
    pub async fn start_workers(self: &Arc<Self>, num_workers: usize) {
        if self.running.swap(true, Ordering::SeqCst) {
            warn!("workers already running");
            return;
        }

        let mut workers = self.workers.lock().await;
        for i in 0..num_workers {
            let queue = Arc::clone(self);
            workers.push(tokio::spawn(async move {
                info!(worker = i, "started job queue worker");
                queue.worker_loop().await;
                info!(worker = i, "stopped job queue worker");
            }));
        }
    }

    /// `stopWorkers()` (spec §4.14).
    pub async fn stop_workers(&self) {
        if !self.running.swap(false, Ordering::SeqCst) {
            return;
        }
        let mut workers = self.workers.lock().await;
        for handle in workers.drain(..) {
            let _ = handle.await;
        }
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    async fn worker_loop(self: Arc<Self>) {
        while self.running.load(Ordering::SeqCst) {
            match self.dequeue_job().await {
                Ok(Some(job)) => {
                    let success = self.process_job(&job).await;
                    if success {
                        if let Err(e) = self.mark_job_completed(&job).await {
                            warn!(job_id = %job.id, error = %e, "failed to mark job completed");
                        }
                    } else if job.attempts >= job.max_attempts {
                        if let Err(e) = self.mark_job_failed(&job, "max attempts reached").await {
                            warn!(job_id = %job.id, error = %e, "failed to mark job failed");
                        }
                    } else if let Err(e) = self.requeue_job(&job).await {
                        warn!(job_id = %job.id, error = %e, "failed to requeue job");
                    }
                }
                Ok(None) => {}
                Err(e) => {
                    warn!(error = %e, "worker loop error, backing off");
                    tokio::time::sleep(std::time::Duration::from_secs(5)).await;
                }
            }
        }
    }

    /// Atomically moves a job from pending to processing via `BRPOPLPUSH`.
    async fn dequeue_job(&self) -> Result<Option<Job>> {
        let mut conn = self.conn.clone();
        let job_id: Option<String> = redis::cmd("BRPOPLPUSH")
            .arg(QUEUE_PENDING)
            .arg(QUEUE_PROCESSING)
            .arg(1)
            .query_async(&mut conn)
            .await
            .map_err(redis_err)?;

        let Some(job_id) = job_id else { return Ok(None) };
        let Some(mut job) = self.get_job(&job_id).await? else { return Ok(None) };

        job.status = JobStatus::Processing;
        job.attempts += 1;
        self.update_job_in_redis(&job).await?;
        self.update_stats(JobStatus::Pending, JobStatus::Processing).await?;
        Ok(Some(job))
    }

    async fn process_job(&self, job: &Job) -> bool {
        let handler = self.handlers.lock().await.get(&job.job_type).cloned();
        match handler {
            Some(handler) => handler.handle(job).await,
            None => {
                warn!(job_type = ?job.job_type, "no handler registered for job type");
                false
            }
        }
    }

    async fn mark_job_completed(&self, job: &Job) -> Result<()> {
        let mut completed = job.clone();
        completed.status = JobStatus::Completed;
        completed.completed_at = Some(Utc::now());
        self.update_job_in_redis(&completed).await?;

        let mut conn = self.conn.clone();
        conn.lrem::<_, _, ()>(QUEUE_PROCESSING, 1, &job.id).await.map_err(redis_err)?;
        conn.lpush::<_, _, ()>(QUEUE_COMPLETED, &job.id).await.map_err(redis_err)?;
        self.update_stats(JobStatus::Processing, JobStatus::Completed).await
    }

    async fn mark_job_failed(&self, job: &Job, error: &str) -> Result<()> {
        let mut failed = job.clone();
        failed.status = JobStatus::Failed;
        failed.error_message = Some(error.to_string());
        failed.completed_at = Some(Utc::now());
        self.update_job_in_redis(&failed).await?;

        let mut conn = self.conn.clone();
        conn.lrem::<_, _, ()>(QUEUE_PROCESSING, 1, &job.id).await.map_err(redis_err)?;
        conn.lpush::<_, _, ()>(QUEUE_FAILED, &job.id).await.map_err(redis_err)?;
        self.update_stats(JobStatus::Processing, JobStatus::Failed).await
    }

    async fn requeue_job(&self, job: &Job) -> Result<()> {
        let mut requeued = job.clone();
        requeued.status = JobStatus::Pending;
        requeued.scheduled_at = Utc::now() + REQUEUE_DELAY;
        self.update_job_in_redis(&requeued).await?;

        let mut conn = self.conn.clone();
        conn.lrem::<_, _, ()>(QUEUE_PROCESSING, 1, &job.id).await.map_err(redis_err)?;
        conn.lpush::<_, _, ()>(QUEUE_PENDING, &job.id).await.map_err(redis_err)?;
        self.update_stats(JobStatus::Processing, JobStatus::Pending).await
    }

    async fn update_job_in_redis(&self, job: &Job) -> Result<()> {
        let payload = serde_json::to_string(job).map_err(|e| CoreError::Other(e.into()))?;
        let mut conn = self.conn.clone();
        conn.set::<_, _, ()>(job_data_key(&job.id), payload).await.map_err(redis_err)
    }

    async fn update_stats(&self, old: JobStatus, new: JobStatus) -> Result<()> {
        if old == new {
            return Ok(());
        }
        let mut conn = self.conn.clone();
        redis::pipe()
            .hincr(STATS_KEY, stats_field(old), -1)
            .hincr(STATS_KEY, stats_field(new), 1)
            .query_async::<()>(&mut conn)
            .await
            .map_err(redis_err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_key_routes_pending_and_retrying_to_the_same_list() {
        assert_eq!(status_key(JobStatus::Pending), QUEUE_PENDING);
        assert_eq!(status_key(JobStatus::Retrying), QUEUE_PENDING);
        assert_eq!(status_key(JobStatus::Processing), QUEUE_PROCESSING);
        assert_eq!(status_key(JobStatus::Completed), QUEUE_COMPLETED);
        assert_eq!(status_key(JobStatus::Failed), QUEUE_FAILED);
    }

    #[test]
    fn stats_field_names_match_the_redis_hash_layout() {
        assert_eq!(stats_field(JobStatus::Pending), "pending");
        assert_eq!(stats_field(JobStatus::Processing), "processing");
        assert_eq!(stats_field(JobStatus::Completed), "completed");
        assert_eq!(stats_field(JobStatus::Failed), "failed");
    }

    #[test]
    fn job_data_key_uses_the_expected_prefix() {
        assert_eq!(job_data_key("abc"), "job_data:abc");
    }

    /// The full add/dequeue/complete lifecycle (P12/P13) needs a real Redis
    /// speaking RESP — a hand-rolled protocol stand-in can't be trusted
    /// without ever running it, so these are opt-in integration tests
    /// against `TEST_REDIS_URL` rather than a mocked server.
    fn test_redis_url() -> Option<String> {
        std::env::var("TEST_REDIS_URL").ok()
    }

    #[tokio::test]
    #[ignore = "requires TEST_REDIS_URL pointing at a live Redis"]
    async fn add_dequeue_and_complete_round_trips_through_every_list() {
        let Some(url) = test_redis_url() else { return };
        let queue = JobQueue::connect(&url).await.unwrap();

        let job_id = queue
            .add_job(JobType::SendEmail, serde_json::json!({"to": "a@b.com"}), 3)
            .await
            .unwrap();

        let stored = queue.get_job(&job_id).await.unwrap().unwrap();
        assert_eq!(stored.status, JobStatus::Pending);

        let dequeued = queue.dequeue_job().await.unwrap().unwrap();
        assert_eq!(dequeued.id, job_id);
        assert_eq!(dequeued.status, JobStatus::Processing);
        assert_eq!(dequeued.attempts, 1);

        queue.mark_job_completed(&dequeued).await.unwrap();
        let completed = queue.get_job(&job_id).await.unwrap().unwrap();
        assert_eq!(completed.status, JobStatus::Completed);
        assert!(completed.completed_at.is_some());

        let stats = queue.get_stats().await.unwrap();
        assert_eq!(stats.completed, 1);
    }

    #[tokio::test]
    #[ignore = "requires TEST_REDIS_URL pointing at a live Redis"]
    async fn failed_job_under_max_attempts_is_requeued_to_pending() {
        let Some(url) = test_redis_url() else { return };
        let queue = JobQueue::connect(&url).await.unwrap();

        let job_id = queue.add_job(JobType::SendEmail, serde_json::json!({}), 3).await.unwrap();
        let dequeued = queue.dequeue_job().await.unwrap().unwrap();
        assert_eq!(dequeued.id, job_id);

        queue.requeue_job(&dequeued).await.unwrap();
        let requeued = queue.get_job(&job_id).await.unwrap().unwrap();
        assert_eq!(requeued.status, JobStatus::Pending);

        let jobs = queue.get_jobs_by_status(JobStatus::Pending).await.unwrap();
        assert!(jobs.iter().any(|j| j.id == job_id));
    }

    #[tokio::test]
    #[ignore = "requires TEST_REDIS_URL pointing at a live Redis"]
    async fn bulk_domain_crawl_jobs_enqueue_one_id_per_domain() {
        let Some(url) = test_redis_url() else { return };
        let queue = JobQueue::connect(&url).await.unwrap();

        let jobs = vec![
            CrawlDomainJob {
                domain: "a.example".to_string(),
                seed_url: "https://a.example".to_string(),
                webmaster_email: None,
                max_pages: 10,
                session_id: None,
            },
            CrawlDomainJob {
                domain: "b.example".to_string(),
                seed_url: "https://b.example".to_string(),
                webmaster_email: None,
                max_pages: 10,
                session_id: None,
            },
        ];

        let ids = queue.add_bulk_domain_crawl_jobs(&jobs).await.unwrap();
        assert_eq!(ids.len(), 2);
    }
}
