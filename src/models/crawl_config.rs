use std::collections::HashSet;
use std::time::Duration;

/// Retry knobs nested inside [`CrawlConfig`].
#[derive(Debug, Clone)]
pub struct RetryConfig {
    pub max_retries: u32,
    pub base_retry_delay: Duration,
    pub backoff_multiplier: f64,
    pub max_retry_delay: Duration,
    pub retryable_http_codes: HashSet<u16>,
    pub retryable_transport_codes: HashSet<String>,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: 3,
            base_retry_delay: Duration::from_millis(500),
            backoff_multiplier: 2.0,
            max_retry_delay: Duration::from_secs(30),
            retryable_http_codes: HashSet::new(),
            retryable_transport_codes: HashSet::new(),
        }
    }
}

/// Circuit-breaker knobs nested inside [`CrawlConfig`].
#[derive(Debug, Clone)]
pub struct CircuitBreakerConfig {
    pub failure_threshold: u32,
    pub reset_time: Duration,
}

impl Default for CircuitBreakerConfig {
    fn default() -> Self {
        Self {
            failure_threshold: 5,
            reset_time: Duration::from_secs(5 * 60),
        }
    }
}

/// Optional CSS selector lists used by the Content Parser (C7).
#[derive(Debug, Clone, Default)]
pub struct SelectorLists {
    pub article_selectors: Vec<String>,
    pub title_selectors: Vec<String>,
    pub content_selectors: Vec<String>,
}

/// Per-session crawl knobs (spec §3: `CrawlConfig`).
#[derive(Debug, Clone)]
pub struct CrawlConfig {
    pub max_pages: usize,
    pub max_depth: u32,
    pub politeness_delay: Duration,
    pub user_agent: String,
    pub max_concurrent_connections: usize,
    pub request_timeout: Duration,
    pub respect_robots_txt: bool,
    pub follow_redirects: bool,
    pub max_redirects: u32,
    pub restrict_to_seed_domain: bool,
    pub spa_rendering_enabled: bool,
    pub extract_text_content: bool,
    pub retry: RetryConfig,
    pub circuit_breaker: CircuitBreakerConfig,
    pub rate_limit_delay: Duration,
    pub selectors: SelectorLists,
}

impl Default for CrawlConfig {
    fn default() -> Self {
        Self {
            max_pages: 15,
            max_depth: 5,
            politeness_delay: Duration::from_secs(1),
            user_agent: "CrawlyRustCrawler".to_string(),
            max_concurrent_connections: 4,
            request_timeout: Duration::from_secs(15),
            respect_robots_txt: true,
            follow_redirects: true,
            max_redirects: 5,
            restrict_to_seed_domain: true,
            spa_rendering_enabled: false,
            extract_text_content: true,
            retry: RetryConfig::default(),
            circuit_breaker: CircuitBreakerConfig::default(),
            rate_limit_delay: Duration::from_secs(60),
            selectors: SelectorLists::default(),
        }
    }
}
