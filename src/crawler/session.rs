//! Crawler (C8): a single crawl session's main loop (spec §4.7). Generalizes
//! the teacher's recursive `Crawler::crawl` into an iterative loop over the
//! Frontier, since recursion does not compose with `maxPages`/backoff
//! re-enqueue scheduling the way iteration does.

use std::sync::Arc;
use std::sync::RwLock as StdRwLock;

use chrono::Utc;
use tokio::sync::watch;
use tokio::time::sleep;
use tracing::instrument;

use crate::models::{CrawlConfig, CrawlLog, CrawlResult, CrawlStatus, FailureType};
use crate::storage::ContentStorage;

use super::content_parser::ContentParser;
use super::domain_manager::DomainManager;
use super::failure_classifier;
use super::fetcher::PageFetcher;
use super::frontier::Frontier;
use super::metrics::CrawlMetrics;
use super::robots::RobotsPolicy;

/// `getCrawlStatus` enum (spec §9 Open Question, resolved in SPEC_FULL §9).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionStatus {
    Running,
    Completed,
    Failed,
}

pub struct Crawler {
    session_id: String,
    config: StdRwLock<CrawlConfig>,
    frontier: Frontier,
    domain_manager: Arc<DomainManager>,
    robots: Arc<RobotsPolicy>,
    metrics: Arc<CrawlMetrics>,
    fetcher: Arc<dyn PageFetcher>,
    parser: Arc<dyn ContentParser>,
    storage: Arc<ContentStorage>,
    results: Vec<CrawlResult>,
    stop_rx: watch::Receiver<bool>,
}

impl Crawler {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        session_id: String,
        config: CrawlConfig,
        domain_manager: Arc<DomainManager>,
        robots: Arc<RobotsPolicy>,
        metrics: Arc<CrawlMetrics>,
        fetcher: Arc<dyn PageFetcher>,
        parser: Arc<dyn ContentParser>,
        storage: Arc<ContentStorage>,
        stop_rx: watch::Receiver<bool>,
    ) -> Self {
        let frontier = Frontier::new(config.max_pages * 20);
        Self {
            session_id,
            config: StdRwLock::new(config),
            frontier,
            domain_manager,
            robots,
            metrics,
            fetcher,
            parser,
            storage,
            results: Vec::new(),
            stop_rx,
        }
    }

    /// `addSeedURL(url)` (spec §4.7).
    pub fn add_seed_url(&mut self, url: &str) -> bool {
        self.frontier.enqueue(url, 0, 100)
    }

    /// `updateConfig(config)` (spec §4.7): hot-reloadable mid-session.
    pub fn update_config(&self, new_config: CrawlConfig) {
        self.domain_manager.update_config(new_config.clone());
        *self.config.write().unwrap() = new_config;
    }

    /// `reset()` (spec §4.7): clears frontier/results, keeps config.
    pub fn reset(&mut self) {
        self.frontier.reset();
        self.results.clear();
    }

    pub fn results(&self) -> &[CrawlResult] {
        &self.results
    }

    fn should_stop(&self) -> bool {
        *self.stop_rx.borrow()
    }

    /// `start()` (spec §4.7): drains the frontier until exhaustion, a stop
    /// signal, or `maxPages` is reached.
    #[instrument(skip(self), fields(session_id = %self.session_id))]
    pub async fn start(&mut self) -> SessionStatus {
        let max_pages = self.config.read().unwrap().max_pages;

        while self.results.len() < max_pages && !self.frontier.is_empty() {
            if self.should_stop() {
                tracing::info!(session_id = %self.session_id, "crawl session stopped");
                return SessionStatus::Completed;
            }

            let Some((url, depth)) = self.frontier.dequeue() else { break };
            let config = self.config.read().unwrap().clone();
            let domain = match url::Url::parse(&url).ok().and_then(|u| u.host_str().map(str::to_string)) {
                Some(d) => d,
                None => continue,
            };

            if self.domain_manager.is_circuit_breaker_open(&domain) {
                self.metrics.record_circuit_breaker_triggered();
                continue;
            }

            let delay = self.domain_manager.get_delay(&domain);
            if delay > std::time::Duration::ZERO {
                sleep(delay).await;
            }

            if config.respect_robots_txt {
                let (allowed, _crawl_delay) = self.robots.check(&domain, &url, &config.user_agent).await;
                if !allowed {
                    self.record_result(self.build_blocked_result(&url, depth));
                    continue;
                }
            }

            self.crawl_one(&url, depth, &domain, &config).await;
        }

        SessionStatus::Completed
    }

    fn build_blocked_result(&self, url: &str, depth: u32) -> CrawlResult {
        let now = Utc::now();
        CrawlResult {
            url: url.to_string(),
            origin_url: url.to_string(),
            depth,
            success: false,
            raw_content: Vec::new(),
            text_content: String::new(),
            title: None,
            description: None,
            discovered_links: Vec::new(),
            http_status_code: None,
            content_type: None,
            transport_error_code: None,
            error_message: Some("blocked by robots.txt".to_string()),
            failure_type: None,
            status: CrawlStatus::RobotBlocked,
            started_at: now,
            finished_at: now,
            crawl_duration_ms: 0,
            retry_count: 0,
            is_retry_attempt: false,
            total_retry_time_ms: 0,
        }
    }

    async fn crawl_one(&mut self, url: &str, depth: u32, domain: &str, config: &CrawlConfig) {
        self.metrics.record_request(domain);
        let started_at = Utc::now();
        let mut retry_count = 0u32;
        let mut total_retry_time_ms = 0u64;

        loop {
            let outcome = self.fetcher.fetch(url, config).await;
            let success = outcome.http_status.map(|s| (200..300).contains(&s)).unwrap_or(false);

            if success {
                self.domain_manager.record_success(domain);
                self.metrics.record_success(domain);

                let parsed = self.parser.parse(
                    &String::from_utf8_lossy(&outcome.raw_bytes),
                    &outcome.final_url,
                    &config.selectors,
                );

                let finished_at = Utc::now();
                let result = CrawlResult {
                    url: outcome.final_url.clone(),
                    origin_url: url.to_string(),
                    depth,
                    success: true,
                    raw_content: outcome.raw_bytes,
                    text_content: if config.extract_text_content { parsed.text_content } else { String::new() },
                    title: parsed.title,
                    description: parsed.description,
                    discovered_links: parsed.outbound_links.clone(),
                    http_status_code: outcome.http_status,
                    content_type: outcome.content_type,
                    transport_error_code: None,
                    error_message: None,
                    failure_type: None,
                    status: CrawlStatus::Success,
                    started_at,
                    finished_at,
                    crawl_duration_ms: (finished_at - started_at).num_milliseconds().max(0) as u64,
                    retry_count,
                    is_retry_attempt: retry_count > 0,
                    total_retry_time_ms,
                };

                if depth < config.max_depth {
                    for link in &parsed.outbound_links {
                        if config.restrict_to_seed_domain
                            && url::Url::parse(link).ok().and_then(|u| u.host_str().map(str::to_string)).as_deref()
                                != Some(domain)
                        {
                            continue;
                        }
                        self.frontier.enqueue(link, depth + 1, 0);
                    }
                }

                self.store_and_log(result, domain).await;
                return;
            }

            let failure_type = failure_classifier::classify(
                outcome.http_status,
                outcome.transport_code.as_deref(),
                outcome.error_message.as_deref().unwrap_or(""),
                config,
            );

            if failure_type == FailureType::RateLimited {
                self.domain_manager.record_rate_limit(domain, outcome.retry_after_secs);
                self.metrics.record_rate_limited(domain);
            } else {
                self.domain_manager.record_failure(domain, failure_type, outcome.error_message.as_deref().unwrap_or(""));
            }
            self.metrics.record_failure(domain, failure_type);

            if failure_classifier::should_retry(failure_type, retry_count, config.retry.max_retries) {
                let delay = failure_classifier::next_delay(retry_count + 1, config, failure_type);
                total_retry_time_ms += delay.as_millis() as u64;
                retry_count += 1;
                self.metrics.record_retry();
                sleep(delay).await;
                continue;
            }

            let finished_at = Utc::now();
            let status = match failure_type {
                FailureType::RateLimited => CrawlStatus::Failed,
                _ => CrawlStatus::Failed,
            };
            let result = CrawlResult {
                url: url.to_string(),
                origin_url: url.to_string(),
                depth,
                success: false,
                raw_content: Vec::new(),
                text_content: String::new(),
                title: None,
                description: None,
                discovered_links: Vec::new(),
                http_status_code: outcome.http_status,
                content_type: outcome.content_type,
                transport_error_code: outcome.transport_code,
                error_message: outcome.error_message,
                failure_type: Some(failure_type),
                status,
                started_at,
                finished_at,
                crawl_duration_ms: (finished_at - started_at).num_milliseconds().max(0) as u64,
                retry_count,
                is_retry_attempt: retry_count > 0,
                total_retry_time_ms,
            };
            self.store_and_log(result, domain).await;
            return;
        }
    }

    async fn store_and_log(&mut self, result: CrawlResult, domain: &str) {
        let log = CrawlLog {
            url: result.url.clone(),
            domain: domain.to_string(),
            status: result.status,
            http_status_code: result.http_status_code,
            duration_ms: result.crawl_duration_ms,
            error_message: result.error_message.clone(),
            timestamp: Utc::now(),
            session_id: self.session_id.clone(),
        };

        if let Err(e) = self.storage.store_crawl_result(result.clone()).await {
            tracing::warn!(session_id = %self.session_id, error = %e, "failed to persist crawl result");
        }
        self.storage.append_crawl_log(log).await.ok();

        self.record_result(result);
    }

    fn record_result(&mut self, result: CrawlResult) {
        self.results.push(result);
    }
}
