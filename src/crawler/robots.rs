//! Robots Policy (C5): per-host robots.txt fetch + allow/deny evaluation.
//! Grounded in the teacher's `RobotsCache`/`DefaultMatcher` usage in
//! `crawly.rs`, generalized into a standalone cache with refresh tracking.

use std::collections::HashMap;
use std::time::{Duration, Instant};

use robotstxt::DefaultMatcher;
use tokio::sync::RwLock;

const CACHE_TTL: Duration = Duration::from_secs(60 * 60);

struct RobotsEntry {
    content: String,
    crawl_delay: Option<Duration>,
    fetched_at: Instant,
}

pub struct RobotsPolicy {
    client: reqwest::Client,
    cache: RwLock<HashMap<String, RobotsEntry>>,
}

impl RobotsPolicy {
    pub fn new(client: reqwest::Client) -> Self {
        Self { client, cache: RwLock::new(HashMap::new()) }
    }

    async fn fetch_entry(&self, domain: &str, robots_url: &str) -> Option<(String, Option<Duration>)> {
        {
            let cache = self.cache.read().await;
            if let Some(entry) = cache.get(domain) {
                if entry.fetched_at.elapsed() < CACHE_TTL {
                    return Some((entry.content.clone(), entry.crawl_delay));
                }
            }
        }

        let response = self.client.get(robots_url).send().await.ok()?;
        let content = response.text().await.ok()?;
        let crawl_delay = content
            .lines()
            .filter_map(|line| {
                if line.to_lowercase().contains("crawl-delay") {
                    line.split(':').nth(1)?.trim().parse::<u64>().ok()
                } else {
                    None
                }
            })
            .next()
            .map(Duration::from_secs);

        let mut cache = self.cache.write().await;
        cache.insert(
            domain.to_string(),
            RobotsEntry { content: content.clone(), crawl_delay, fetched_at: Instant::now() },
        );
        Some((content, crawl_delay))
    }

    /// Returns `(allowed, crawl_delay)` for `url` under `user_agent`. A
    /// robots.txt fetch failure is treated as "allowed" (fail-open), as in
    /// the teacher (`self.client.get(&robots_url).send().await` falls
    /// through to `None` on error, which skips the disallow check).
    pub async fn check(&self, domain: &str, url: &str, user_agent: &str) -> (bool, Option<Duration>) {
        let robots_url = format!("https://{domain}/robots.txt");
        match self.fetch_entry(domain, &robots_url).await {
            Some((content, crawl_delay)) => {
                let allowed =
                    DefaultMatcher::default().one_agent_allowed_by_robots(&content, user_agent, url);
                (allowed, crawl_delay)
            }
            None => (true, None),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn unreachable_host_fails_open() {
        let policy = RobotsPolicy::new(reqwest::Client::new());
        let (allowed, delay) = policy
            .check("nonexistent.invalid.example", "https://nonexistent.invalid.example/x", "bot")
            .await;
        assert!(allowed);
        assert!(delay.is_none());
    }
}
