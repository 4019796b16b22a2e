//! In-process [`DocumentStore`] implementation.
//!
//! No database driver ships in the teacher's stack; the spec treats the
//! store as swappable behind a trait (§9 Design Note), so this backend —
//! a mutex-guarded map plus secondary indexes — stands in for a real
//! database adapter, which would implement the same trait.

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;

use crate::error::{CoreError, Result};
use crate::models::{ApiRequestLog, CrawlLog, CrawlStatus, SiteProfile};

use super::document_store::DocumentStore;

#[derive(Default)]
struct Inner {
    by_url: HashMap<String, SiteProfile>,
    by_id: HashMap<String, String>,
    crawl_logs: Vec<CrawlLog>,
    api_logs: Vec<ApiRequestLog>,
}

pub struct InMemoryDocumentStore {
    inner: Mutex<Inner>,
}

impl Default for InMemoryDocumentStore {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryDocumentStore {
    pub fn new() -> Self {
        Self { inner: Mutex::new(Inner::default()) }
    }
}

#[async_trait]
impl DocumentStore for InMemoryDocumentStore {
    async fn store(&self, profile: SiteProfile) -> Result<()> {
        let mut inner = self.inner.lock().unwrap();
        if let Some(id) = &profile.id {
            inner.by_id.insert(id.clone(), profile.url.clone());
        }
        inner.by_url.insert(profile.url.clone(), profile);
        Ok(())
    }

    async fn get_by_url(&self, url: &str) -> Result<Option<SiteProfile>> {
        Ok(self.inner.lock().unwrap().by_url.get(url).cloned())
    }

    async fn get_by_id(&self, id: &str) -> Result<Option<SiteProfile>> {
        let inner = self.inner.lock().unwrap();
        Ok(inner.by_id.get(id).and_then(|url| inner.by_url.get(url).cloned()))
    }

    async fn update(&self, profile: SiteProfile) -> Result<()> {
        let mut inner = self.inner.lock().unwrap();
        if !inner.by_url.contains_key(&profile.url) {
            return Err(CoreError::NotFound);
        }
        if let Some(id) = &profile.id {
            inner.by_id.insert(id.clone(), profile.url.clone());
        }
        inner.by_url.insert(profile.url.clone(), profile);
        Ok(())
    }

    async fn delete(&self, url: &str) -> Result<()> {
        let mut inner = self.inner.lock().unwrap();
        inner.by_url.remove(url);
        Ok(())
    }

    async fn get_by_domain(&self, domain: &str, limit: usize) -> Result<Vec<SiteProfile>> {
        let inner = self.inner.lock().unwrap();
        Ok(inner
            .by_url
            .values()
            .filter(|p| p.domain == domain)
            .take(limit)
            .cloned()
            .collect())
    }

    async fn get_by_crawl_status(&self, status: CrawlStatus, limit: usize) -> Result<Vec<SiteProfile>> {
        let inner = self.inner.lock().unwrap();
        Ok(inner
            .by_url
            .values()
            .filter(|p| p.crawl_metadata.last_crawl_status == status)
            .take(limit)
            .cloned()
            .collect())
    }

    async fn count(&self) -> Result<u64> {
        Ok(self.inner.lock().unwrap().by_url.len() as u64)
    }

    async fn count_by_status(&self, status: CrawlStatus) -> Result<u64> {
        let inner = self.inner.lock().unwrap();
        Ok(inner.by_url.values().filter(|p| p.crawl_metadata.last_crawl_status == status).count() as u64)
    }

    async fn ensure_indexes(&self) -> Result<()> {
        Ok(())
    }

    async fn append_crawl_log(&self, log: CrawlLog) -> Result<()> {
        self.inner.lock().unwrap().crawl_logs.push(log);
        Ok(())
    }

    async fn append_api_request_log(&self, log: ApiRequestLog) -> Result<()> {
        self.inner.lock().unwrap().api_logs.push(log);
        Ok(())
    }

    async fn recent_crawl_logs(&self, limit: usize) -> Result<Vec<CrawlLog>> {
        let inner = self.inner.lock().unwrap();
        Ok(inner.crawl_logs.iter().rev().take(limit).cloned().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn sample_profile(url: &str) -> SiteProfile {
        let now = Utc::now();
        SiteProfile {
            url: url.to_string(),
            domain: "example.com".to_string(),
            id: Some("1".to_string()),
            title: "Title".to_string(),
            description: None,
            keywords: vec![],
            language: None,
            category: None,
            crawl_metadata: crate::models::CrawlMetadata {
                last_crawl_time: now,
                first_crawl_time: now,
                last_crawl_status: CrawlStatus::Success,
                last_error_message: None,
                crawl_count: 1,
                crawl_interval_hours: 24,
                user_agent: "test".to_string(),
                http_status_code: Some(200),
                content_size: Some(10),
                content_type: Some("text/html".to_string()),
                crawl_duration_ms: Some(5),
            },
            page_rank: None,
            content_quality: None,
            word_count: None,
            is_mobile: None,
            has_ssl: Some(true),
            outbound_links: vec![],
            inbound_link_count: None,
            is_indexed: true,
            last_modified: None,
            indexed_at: Some(now),
            author: None,
            publisher: None,
            publish_date: None,
        }
    }

    #[tokio::test]
    async fn store_then_get_by_url_round_trips() {
        let store = InMemoryDocumentStore::new();
        store.store(sample_profile("https://example.com/a")).await.unwrap();
        let fetched = store.get_by_url("https://example.com/a").await.unwrap();
        assert!(fetched.is_some());
        assert_eq!(store.count().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn update_missing_profile_errors() {
        let store = InMemoryDocumentStore::new();
        let result = store.update(sample_profile("https://example.com/missing")).await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn get_by_domain_filters_correctly() {
        let store = InMemoryDocumentStore::new();
        store.store(sample_profile("https://example.com/a")).await.unwrap();
        let mut other = sample_profile("https://other.com/b");
        other.domain = "other.com".to_string();
        store.store(other).await.unwrap();

        let results = store.get_by_domain("example.com", 10).await.unwrap();
        assert_eq!(results.len(), 1);
    }
}
