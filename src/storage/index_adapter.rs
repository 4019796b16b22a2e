//! Full-text Index Adapter (C13): index/update/delete docs, execute
//! wire-syntax queries (spec §4.12).

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::error::Result;

/// One document as handed to the index: the searchable fields plus the
/// metadata the Scorer (C11) needs to reconstruct a [`crate::models::DocumentScore`].
#[derive(Debug, Clone)]
pub struct IndexableDocument {
    pub url: String,
    pub title: String,
    pub description: String,
    pub content: String,
    pub domain: String,
    pub keywords: Vec<String>,
    pub language: Option<String>,
    pub category: Option<String>,
    pub indexed_at: DateTime<Utc>,
    pub score: f64,
}

#[derive(Debug, Clone, Default)]
pub struct SearchQuery {
    /// Wire-syntax query string produced by the Query Parser (C10).
    pub wire_query: String,
    pub domain_filter: Vec<String>,
    pub offset: usize,
    pub limit: usize,
    pub highlight: bool,
}

#[derive(Debug, Clone)]
pub struct SearchHit {
    pub doc: IndexableDocument,
    pub base_score: f64,
}

#[derive(Debug, Clone, Default)]
pub struct SearchResults {
    pub hits: Vec<SearchHit>,
    pub total_count: usize,
    pub elapsed_ms: u64,
}

#[derive(Debug, Clone, Default)]
pub struct IndexInfo {
    pub document_count: u64,
    pub index_name: String,
}

#[async_trait]
pub trait FullTextIndex: Send + Sync {
    async fn initialize_index(&self) -> Result<()>;
    async fn index_document(&self, doc: IndexableDocument) -> Result<()>;
    async fn update_document(&self, doc: IndexableDocument) -> Result<()>;
    async fn delete_document(&self, url: &str) -> Result<()>;
    async fn delete_documents_by_domain(&self, domain: &str) -> Result<u64>;
    async fn search(&self, query: SearchQuery) -> Result<SearchResults>;
    async fn suggest(&self, prefix: &str, limit: usize) -> Result<Vec<String>>;
    async fn get_document_count(&self) -> Result<u64>;
    async fn get_index_info(&self) -> Result<IndexInfo>;
    async fn drop_index(&self) -> Result<()>;
}

/// `doc:{hash}` key as described in spec §6/§9, pinned to `twox-hash`
/// `XxHash64` per SPEC_FULL §6's resolution of the Open Question.
pub fn document_key(url: &str) -> String {
    use std::hash::Hasher;
    let mut hasher = twox_hash::XxHash64::with_seed(0);
    hasher.write(url.as_bytes());
    format!("doc:{:016x}", hasher.finish())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn document_key_is_deterministic() {
        assert_eq!(document_key("https://example.com"), document_key("https://example.com"));
        assert_ne!(document_key("https://example.com"), document_key("https://example.org"));
    }
}
