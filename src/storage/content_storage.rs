//! Content Storage (C14): the single coordinator every crawler session and
//! the search HTTP surface go through (spec §4.13). Fuses the
//! [`DocumentStore`] write path with the [`FullTextIndex`] search path,
//! lazily constructing both adapters on first use.

use std::sync::Arc;

use chrono::Utc;
use tracing::instrument;

use crate::error::Result;
use crate::models::{CrawlResult, CrawlStatus, SiteProfile};

use super::document_store::DocumentStore;
use super::index_adapter::{document_key, FullTextIndex, IndexableDocument, SearchQuery, SearchResults};
use super::keywords::extract_keywords;

#[derive(Debug, Clone, Default)]
pub struct StorageStats {
    pub document_count: u64,
    pub indexed_count: u64,
    pub success_count: u64,
    pub failure_count: u64,
}

pub struct ContentStorage {
    documents: Arc<dyn DocumentStore>,
    index: Arc<dyn FullTextIndex>,
}

impl ContentStorage {
    pub fn new(documents: Arc<dyn DocumentStore>, index: Arc<dyn FullTextIndex>) -> Self {
        Self { documents, index }
    }

    /// Writes one crawl attempt, folding it into the existing
    /// [`SiteProfile`] for the URL if one exists.
    ///
    /// Preserves `firstCrawlTime` and manually-set fields (`pageRank`,
    /// `category`, ...) across re-crawls, increments `crawlCount`, and
    /// builds the searchable text handed to the full-text index from
    /// title + description + body, per §4.13.
    #[instrument(skip(self, result), fields(url = %result.url))]
    pub async fn store_crawl_result(&self, result: CrawlResult) -> Result<()> {
        let existing = self.documents.get_by_url(&result.url).await?;
        let now = Utc::now();

        let domain = extract_domain(&result.url);
        let keywords = if result.title.is_some() || !result.text_content.is_empty() {
            extract_keywords(&result.text_content, 10)
        } else {
            existing.as_ref().map(|p| p.keywords.clone()).unwrap_or_default()
        };

        let profile = SiteProfile {
            url: result.url.clone(),
            domain: domain.clone(),
            id: Some(existing.as_ref().and_then(|p| p.id.clone()).unwrap_or_else(|| document_key(&result.url))),
            title: result.title.clone().unwrap_or_else(|| existing.as_ref().map(|p| p.title.clone()).unwrap_or_default()),
            description: result.description.clone().or_else(|| existing.as_ref().and_then(|p| p.description.clone())),
            keywords,
            language: existing.as_ref().and_then(|p| p.language.clone()),
            category: existing.as_ref().and_then(|p| p.category.clone()),
            crawl_metadata: crate::models::CrawlMetadata {
                last_crawl_time: now,
                first_crawl_time: existing.as_ref().map(|p| p.crawl_metadata.first_crawl_time).unwrap_or(now),
                last_crawl_status: result.status,
                last_error_message: result.error_message.clone(),
                crawl_count: existing.as_ref().map(|p| p.crawl_metadata.crawl_count).unwrap_or(0) + 1,
                crawl_interval_hours: existing.as_ref().map(|p| p.crawl_metadata.crawl_interval_hours).unwrap_or(24),
                user_agent: "crawly-search-core".to_string(),
                http_status_code: result.http_status_code,
                content_size: Some(result.content_size()),
                content_type: result.content_type.clone(),
                crawl_duration_ms: Some(result.crawl_duration_ms),
            },
            page_rank: existing.as_ref().and_then(|p| p.page_rank),
            content_quality: existing.as_ref().and_then(|p| p.content_quality),
            word_count: Some(result.text_content.split_whitespace().count() as u32),
            is_mobile: existing.as_ref().and_then(|p| p.is_mobile),
            has_ssl: Some(result.url.starts_with("https://")),
            outbound_links: result.discovered_links.clone(),
            inbound_link_count: existing.as_ref().and_then(|p| p.inbound_link_count),
            is_indexed: result.status == CrawlStatus::Success && !result.text_content.is_empty(),
            last_modified: existing.as_ref().and_then(|p| p.last_modified),
            indexed_at: if result.status == CrawlStatus::Success { Some(now) } else { existing.as_ref().and_then(|p| p.indexed_at) },
            author: existing.as_ref().and_then(|p| p.author.clone()),
            publisher: existing.as_ref().and_then(|p| p.publisher.clone()),
            publish_date: existing.as_ref().and_then(|p| p.publish_date),
        };

        if existing.is_some() {
            self.documents.update(profile.clone()).await?;
        } else {
            self.documents.store(profile.clone()).await?;
        }

        if profile.is_indexed {
            self.index
                .index_document(IndexableDocument {
                    url: profile.url.clone(),
                    title: profile.title.clone(),
                    description: profile.description.clone().unwrap_or_default(),
                    content: result.text_content.clone(),
                    domain,
                    keywords: profile.keywords.clone(),
                    language: profile.language.clone(),
                    category: profile.category.clone(),
                    indexed_at: now,
                    score: profile.page_rank.unwrap_or(0.0),
                })
                .await?;
        } else {
            self.index.delete_document(&profile.url).await.ok();
        }

        Ok(())
    }

    pub async fn get_by_url(&self, url: &str) -> Result<Option<SiteProfile>> {
        self.documents.get_by_url(url).await
    }

    pub async fn get_by_domain(&self, domain: &str, limit: usize) -> Result<Vec<SiteProfile>> {
        self.documents.get_by_domain(domain, limit).await
    }

    pub async fn get_by_crawl_status(&self, status: CrawlStatus, limit: usize) -> Result<Vec<SiteProfile>> {
        self.documents.get_by_crawl_status(status, limit).await
    }

    pub async fn search(&self, query: SearchQuery) -> Result<SearchResults> {
        self.index.search(query).await
    }

    pub async fn delete_by_url(&self, url: &str) -> Result<()> {
        self.documents.delete(url).await?;
        self.index.delete_document(url).await
    }

    pub async fn storage_stats(&self) -> Result<StorageStats> {
        let document_count = self.documents.count().await?;
        let indexed_count = self.index.get_document_count().await?;
        let success_count = self.documents.count_by_status(CrawlStatus::Success).await?;
        let failure_count = self.documents.count_by_status(CrawlStatus::Failed).await?;
        Ok(StorageStats { document_count, indexed_count, success_count, failure_count })
    }

    pub async fn corpus_statistics(&self) -> Result<super::index_adapter::IndexInfo> {
        self.index.get_index_info().await
    }

    pub async fn append_crawl_log(&self, log: crate::models::CrawlLog) -> Result<()> {
        self.documents.append_crawl_log(log).await
    }

    pub async fn recent_crawl_logs(&self, limit: usize) -> Result<Vec<crate::models::CrawlLog>> {
        self.documents.recent_crawl_logs(limit).await
    }
}

fn extract_domain(url: &str) -> String {
    url::Url::parse(url)
        .ok()
        .and_then(|u| u.host_str().map(|h| h.to_string()))
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::memory_store::InMemoryDocumentStore;
    use crate::storage::tantivy_index::TantivyFullTextIndex;

    fn sample_result(url: &str) -> CrawlResult {
        let now = Utc::now();
        CrawlResult {
            url: url.to_string(),
            origin_url: url.to_string(),
            depth: 0,
            success: true,
            raw_content: b"<html>hello world rust search</html>".to_vec(),
            text_content: "hello world rust search".to_string(),
            title: Some("Hello".to_string()),
            description: Some("A page".to_string()),
            discovered_links: vec![],
            http_status_code: Some(200),
            content_type: Some("text/html".to_string()),
            transport_error_code: None,
            error_message: None,
            failure_type: None,
            status: CrawlStatus::Success,
            started_at: now,
            finished_at: now,
            crawl_duration_ms: 12,
            retry_count: 0,
            is_retry_attempt: false,
            total_retry_time_ms: 0,
        }
    }

    #[tokio::test]
    async fn store_then_search_round_trips() {
        let documents = Arc::new(InMemoryDocumentStore::new());
        let index = Arc::new(TantivyFullTextIndex::open_temporary("test").unwrap());
        let storage = ContentStorage::new(documents, index);

        storage.store_crawl_result(sample_result("https://example.com/page")).await.unwrap();

        let profile = storage.get_by_url("https://example.com/page").await.unwrap();
        assert!(profile.is_some());
        assert_eq!(profile.unwrap().crawl_metadata.crawl_count, 1);

        let results = storage
            .search(SearchQuery { wire_query: "hello".to_string(), limit: 10, ..Default::default() })
            .await
            .unwrap();
        assert_eq!(results.hits.len(), 1);
    }

    #[tokio::test]
    async fn recrawl_preserves_first_crawl_time_and_increments_count() {
        let documents = Arc::new(InMemoryDocumentStore::new());
        let index = Arc::new(TantivyFullTextIndex::open_temporary("test").unwrap());
        let storage = ContentStorage::new(documents, index);

        storage.store_crawl_result(sample_result("https://example.com/page")).await.unwrap();
        let first = storage.get_by_url("https://example.com/page").await.unwrap().unwrap();

        storage.store_crawl_result(sample_result("https://example.com/page")).await.unwrap();
        let second = storage.get_by_url("https://example.com/page").await.unwrap().unwrap();

        assert_eq!(second.crawl_metadata.crawl_count, 2);
        assert_eq!(first.crawl_metadata.first_crawl_time, second.crawl_metadata.first_crawl_time);
    }
}
