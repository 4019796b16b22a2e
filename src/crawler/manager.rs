//! Crawler Manager (C9): owns every live crawl session (spec §4.8).
//! Generalizes the teacher's implicit single-crawl-per-process model (its
//! `main.rs`/`server.rs` only ever drive one `Crawler`) to the spec's
//! many-concurrent-sessions requirement, using one `tokio::task` per session
//! and a `watch` channel as the stop flag (spec §5).

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::{watch, Mutex};
use tokio::task::JoinHandle;
use tracing::instrument;
use uuid::Uuid;

use crate::error::{CoreError, Result};
use crate::models::{CrawlConfig, CrawlResult};
use crate::storage::ContentStorage;

use super::content_parser::ContentParser;
use super::domain_manager::DomainManager;
use super::fetcher::PageFetcher;
use super::metrics::CrawlMetrics;
use super::robots::RobotsPolicy;
use super::session::{Crawler, SessionStatus};

struct SessionHandle {
    join_handle: JoinHandle<Vec<CrawlResult>>,
    stop_tx: watch::Sender<bool>,
    status: Arc<Mutex<SessionStatus>>,
}

/// `getCrawlStatus` external surface shape (spec §4.8/§9).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CrawlStatus {
    Running,
    Completed,
    Failed,
}

pub struct CrawlerManager {
    domain_manager: Arc<DomainManager>,
    robots: Arc<RobotsPolicy>,
    metrics: Arc<CrawlMetrics>,
    fetcher: Arc<dyn PageFetcher>,
    parser: Arc<dyn ContentParser>,
    storage: Arc<ContentStorage>,
    sessions: Mutex<HashMap<String, SessionHandle>>,
}

impl CrawlerManager {
    pub fn new(
        domain_manager: Arc<DomainManager>,
        robots: Arc<RobotsPolicy>,
        metrics: Arc<CrawlMetrics>,
        fetcher: Arc<dyn PageFetcher>,
        parser: Arc<dyn ContentParser>,
        storage: Arc<ContentStorage>,
    ) -> Self {
        Self { domain_manager, robots, metrics, fetcher, parser, storage, sessions: Mutex::new(HashMap::new()) }
    }

    /// `startCrawl(seedUrl, config) -> sessionId` (spec §4.8).
    #[instrument(skip(self, config))]
    pub async fn start_crawl(&self, seed_url: &str, config: CrawlConfig) -> Result<String> {
        let session_id = Uuid::new_v4().to_string();
        let (stop_tx, stop_rx) = watch::channel(false);

        let mut crawler = Crawler::new(
            session_id.clone(),
            config,
            self.domain_manager.clone(),
            self.robots.clone(),
            self.metrics.clone(),
            self.fetcher.clone(),
            self.parser.clone(),
            self.storage.clone(),
            stop_rx,
        );
        if !crawler.add_seed_url(seed_url) {
            return Err(CoreError::InvalidRequest {
                field: "seed_url".to_string(),
                message: "could not normalize seed URL".to_string(),
            });
        }

        let status = Arc::new(Mutex::new(SessionStatus::Running));
        let status_for_task = status.clone();
        let join_handle = tokio::spawn(async move {
            let outcome = crawler.start().await;
            *status_for_task.lock().await = outcome;
            crawler.results().to_vec()
        });

        self.sessions
            .lock()
            .await
            .insert(session_id.clone(), SessionHandle { join_handle, stop_tx, status });

        Ok(session_id)
    }

    /// `getCrawlStatus(sessionId)` (spec §4.8).
    pub async fn get_crawl_status(&self, session_id: &str) -> Result<CrawlStatus> {
        let sessions = self.sessions.lock().await;
        let handle = sessions.get(session_id).ok_or(CoreError::NotFound)?;
        if handle.join_handle.is_finished() {
            return Ok(match *handle.status.lock().await {
                SessionStatus::Running => CrawlStatus::Completed,
                SessionStatus::Completed => CrawlStatus::Completed,
                SessionStatus::Failed => CrawlStatus::Failed,
            });
        }
        Ok(CrawlStatus::Running)
    }

    /// `getCrawlResults(sessionId)` (spec §4.8): only meaningful once the
    /// session has completed; returns what has accumulated so far otherwise
    /// by awaiting join only if finished.
    pub async fn get_crawl_results(&self, session_id: &str) -> Result<Vec<CrawlResult>> {
        let mut sessions = self.sessions.lock().await;
        let handle = sessions.get_mut(session_id).ok_or(CoreError::NotFound)?;
        if handle.join_handle.is_finished() {
            let handle = sessions.remove(session_id).unwrap();
            return handle.join_handle.await.map_err(|e| CoreError::Other(e.into()));
        }
        Ok(Vec::new())
    }

    /// `stopCrawl(sessionId)` (spec §4.8).
    pub async fn stop_crawl(&self, session_id: &str) -> Result<()> {
        let sessions = self.sessions.lock().await;
        let handle = sessions.get(session_id).ok_or(CoreError::NotFound)?;
        handle.stop_tx.send(true).ok();
        Ok(())
    }

    /// `getActiveSessions()` (spec §4.8).
    pub async fn active_sessions(&self) -> Vec<String> {
        let sessions = self.sessions.lock().await;
        let mut active = Vec::new();
        for (id, handle) in sessions.iter() {
            if !handle.join_handle.is_finished() {
                active.push(id.clone());
            }
        }
        active
    }

    /// Periodic reaper dropping finished session handles whose results have
    /// already been collected by `getCrawlResults`, bounding `sessions`'
    /// memory (spec §5: bounded resource growth).
    pub async fn reap_finished(&self) {
        let mut sessions = self.sessions.lock().await;
        sessions.retain(|_, handle| !handle.join_handle.is_finished());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crawler::content_parser::ScraperContentParser;
    use crate::crawler::fetcher::FetchOutcome;
    use crate::storage::memory_store::InMemoryDocumentStore;
    use crate::storage::tantivy_index::TantivyFullTextIndex;
    use async_trait::async_trait;

    struct StubFetcher;

    #[async_trait]
    impl PageFetcher for StubFetcher {
        async fn fetch(&self, url: &str, _config: &CrawlConfig) -> FetchOutcome {
            FetchOutcome {
                final_url: url.to_string(),
                http_status: Some(200),
                content_type: Some("text/html".to_string()),
                raw_bytes: b"<html><head><title>T</title></head><body>hi</body></html>".to_vec(),
                transport_code: None,
                error_message: None,
                retry_after_secs: None,
            }
        }
    }

    fn manager() -> CrawlerManager {
        let storage = Arc::new(ContentStorage::new(
            Arc::new(InMemoryDocumentStore::new()),
            Arc::new(TantivyFullTextIndex::open_temporary("t").unwrap()),
        ));
        CrawlerManager::new(
            Arc::new(DomainManager::new(CrawlConfig::default())),
            Arc::new(RobotsPolicy::new(reqwest::Client::new())),
            Arc::new(CrawlMetrics::new()),
            Arc::new(StubFetcher),
            Arc::new(ScraperContentParser),
            storage,
        )
    }

    #[tokio::test]
    async fn start_crawl_runs_to_completion_and_reports_status() {
        let manager = manager();
        let mut config = CrawlConfig::default();
        config.max_pages = 1;
        config.respect_robots_txt = false;

        let session_id = manager.start_crawl("https://example.com/", config).await.unwrap();
        for _ in 0..50 {
            if manager.get_crawl_status(&session_id).await.unwrap() == CrawlStatus::Completed {
                break;
            }
            tokio::time::sleep(std::time::Duration::from_millis(20)).await;
        }
        assert_eq!(manager.get_crawl_status(&session_id).await.unwrap(), CrawlStatus::Completed);
        let results = manager.get_crawl_results(&session_id).await.unwrap();
        assert_eq!(results.len(), 1);
    }

    #[tokio::test]
    async fn unknown_session_id_is_not_found() {
        let manager = manager();
        assert!(manager.get_crawl_status("missing").await.is_err());
    }
}
