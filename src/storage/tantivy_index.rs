//! Full-text Index Adapter (C13), tantivy-backed.
//!
//! Grounded in the teacher's `search_engine.rs` (`SearchEngine`/`Writer`/
//! `Reader`), generalized from the teacher's single `body` field to the
//! full schema spec §4.12 names.

use std::sync::Mutex;

use async_trait::async_trait;
use chrono::{TimeZone, Utc};
use tantivy::collector::TopDocs;
use tantivy::query::QueryParser as TantivyQueryParser;
use tantivy::schema::*;
use tantivy::{doc, Index, IndexReader, IndexWriter, ReloadPolicy, Term};
use tempfile::TempDir;

use crate::error::{CoreError, Result};

use super::index_adapter::{document_key, FullTextIndex, IndexInfo, IndexableDocument, SearchHit, SearchQuery, SearchResults};

struct Fields {
    url: Field,
    title: Field,
    content: Field,
    domain: Field,
    keywords: Field,
    description: Field,
    language: Field,
    category: Field,
    indexed_at: Field,
    score: Field,
}

pub struct TantivyFullTextIndex {
    _index_dir: TempDir,
    index: Index,
    writer: Mutex<IndexWriter>,
    reader: IndexReader,
    fields: Fields,
    name: String,
}

impl TantivyFullTextIndex {
    pub fn open_temporary(name: &str) -> anyhow::Result<Self> {
        let mut builder = Schema::builder();

        let url = builder.add_text_field("url", STRING | STORED);
        let title_opts =
            TextOptions::default().set_indexing_options(
                TextFieldIndexing::default().set_tokenizer("default").set_index_option(IndexRecordOption::WithFreqsAndPositions),
            ).set_stored();
        let title = builder.add_text_field("title", title_opts.clone());
        let content = builder.add_text_field("content", TEXT | STORED);
        let domain = builder.add_text_field("domain", STRING | STORED | FAST);
        let keywords = builder.add_text_field("keywords", TEXT | STORED);
        let description = builder.add_text_field("description", TEXT | STORED);
        let language = builder.add_text_field("language", STRING | STORED);
        let category = builder.add_text_field("category", STRING | STORED);
        let indexed_at = builder.add_u64_field("indexed_at", STORED | FAST | INDEXED);
        let score = builder.add_f64_field("score", STORED | FAST | INDEXED);

        let schema = builder.build();
        let index_dir = TempDir::new()?;
        let index = Index::create_in_dir(&index_dir, schema)?;
        let writer = index.writer(50_000_000)?;
        let reader = index.reader_builder().reload_policy(ReloadPolicy::OnCommit).try_into()?;

        Ok(Self {
            _index_dir: index_dir,
            index,
            writer: Mutex::new(writer),
            reader,
            fields: Fields {
                url,
                title,
                content,
                domain,
                keywords,
                description,
                language,
                category,
                indexed_at,
                score,
            },
            name: name.to_string(),
        })
    }

    fn write_document(&self, document: &IndexableDocument) -> anyhow::Result<()> {
        let mut writer = self.writer.lock().unwrap();
        writer.delete_term(Term::from_field_text(self.fields.url, &document.url));
        writer.add_document(doc!(
            self.fields.url => document.url.clone(),
            self.fields.title => document.title.clone(),
            self.fields.content => document.content.clone(),
            self.fields.domain => document.domain.clone(),
            self.fields.keywords => document.keywords.join(" "),
            self.fields.description => document.description.clone(),
            self.fields.language => document.language.clone().unwrap_or_default(),
            self.fields.category => document.category.clone().unwrap_or_default(),
            self.fields.indexed_at => document.indexed_at.timestamp() as u64,
            self.fields.score => document.score,
        ))?;
        writer.commit()?;
        Ok(())
    }

    fn retrieved_to_document(&self, retrieved: &TantivyDocument) -> IndexableDocument {
        IndexableDocument {
            url: text_value(retrieved, self.fields.url),
            title: text_value(retrieved, self.fields.title),
            description: text_value(retrieved, self.fields.description),
            content: text_value(retrieved, self.fields.content),
            domain: text_value(retrieved, self.fields.domain),
            keywords: text_value(retrieved, self.fields.keywords)
                .split_whitespace()
                .map(|s| s.to_string())
                .collect(),
            language: non_empty(text_value(retrieved, self.fields.language)),
            category: non_empty(text_value(retrieved, self.fields.category)),
            indexed_at: u64_value(retrieved, self.fields.indexed_at)
                .and_then(|t| Utc.timestamp_opt(t as i64, 0).single())
                .unwrap_or_else(Utc::now),
            score: f64_value(retrieved, self.fields.score),
        }
    }
}

fn text_value(doc: &TantivyDocument, field: Field) -> String {
    doc.get_first(field).and_then(|v| v.as_str()).unwrap_or_default().to_string()
}

fn u64_value(doc: &TantivyDocument, field: Field) -> Option<u64> {
    doc.get_first(field).and_then(|v| v.as_u64())
}

fn f64_value(doc: &TantivyDocument, field: Field) -> f64 {
    doc.get_first(field).and_then(|v| v.as_f64()).unwrap_or(0.0)
}

fn non_empty(s: String) -> Option<String> {
    if s.is_empty() {
        None
    } else {
        Some(s)
    }
}

#[async_trait]
impl FullTextIndex for TantivyFullTextIndex {
    async fn initialize_index(&self) -> Result<()> {
        Ok(())
    }

    async fn index_document(&self, doc: IndexableDocument) -> Result<()> {
        self.write_document(&doc).map_err(|e| CoreError::IndexUnavailable(e.to_string()))
    }

    async fn update_document(&self, doc: IndexableDocument) -> Result<()> {
        self.write_document(&doc).map_err(|e| CoreError::IndexUnavailable(e.to_string()))
    }

    async fn delete_document(&self, url: &str) -> Result<()> {
        let mut writer = self.writer.lock().unwrap();
        writer.delete_term(Term::from_field_text(self.fields.url, url));
        writer.commit().map_err(|e| CoreError::IndexUnavailable(e.to_string()))?;
        Ok(())
    }

    async fn delete_documents_by_domain(&self, domain: &str) -> Result<u64> {
        let searcher = self.reader.searcher();
        let term = Term::from_field_text(self.fields.domain, domain);
        let query = tantivy::query::TermQuery::new(term.clone(), IndexRecordOption::Basic);
        let count = searcher
            .search(&query, &TopDocs::with_limit(1_000_000))
            .map(|docs| docs.len() as u64)
            .unwrap_or(0);

        let mut writer = self.writer.lock().unwrap();
        writer.delete_term(term);
        writer.commit().map_err(|e| CoreError::IndexUnavailable(e.to_string()))?;
        Ok(count)
    }

    async fn search(&self, query: SearchQuery) -> Result<SearchResults> {
        let started = std::time::Instant::now();
        let searcher = self.reader.searcher();

        let mut parser = TantivyQueryParser::for_index(
            &self.index,
            vec![self.fields.title, self.fields.content, self.fields.description, self.fields.keywords],
        );
        parser.set_field_boost(self.fields.title, 5.0);
        parser.set_field_boost(self.fields.description, 2.0);
        parser.set_field_boost(self.fields.keywords, 4.0);
        parser.set_field_boost(self.fields.content, 1.0);

        let parsed = parser
            .parse_query(&query.wire_query)
            .map_err(|e| CoreError::QueryParse(e.to_string()))?;

        let limit = (query.offset + query.limit.max(1)).max(1);
        let top_docs = searcher
            .search(&parsed, &TopDocs::with_limit(limit))
            .map_err(|e| CoreError::IndexUnavailable(e.to_string()))?;

        let mut hits = Vec::new();
        for (score, address) in top_docs.into_iter().skip(query.offset) {
            let retrieved: TantivyDocument =
                searcher.doc(address).map_err(|e| CoreError::IndexUnavailable(e.to_string()))?;
            let document = self.retrieved_to_document(&retrieved);
            if !query.domain_filter.is_empty() && !query.domain_filter.contains(&document.domain) {
                continue;
            }
            hits.push(SearchHit { doc: document, base_score: score as f64 });
        }

        Ok(SearchResults { total_count: hits.len(), hits, elapsed_ms: started.elapsed().as_millis() as u64 })
    }

    async fn suggest(&self, prefix: &str, limit: usize) -> Result<Vec<String>> {
        let searcher = self.reader.searcher();
        let query = tantivy::query::TermQuery::new(
            Term::from_field_text(self.fields.title, prefix),
            IndexRecordOption::Basic,
        );
        let top_docs = searcher
            .search(&query, &TopDocs::with_limit(limit))
            .unwrap_or_default();
        let mut out = Vec::new();
        for (_score, address) in top_docs {
            if let Ok(retrieved) = searcher.doc::<TantivyDocument>(address) {
                out.push(text_value(&retrieved, self.fields.title));
            }
        }
        Ok(out)
    }

    async fn get_document_count(&self) -> Result<u64> {
        Ok(self.reader.searcher().num_docs())
    }

    async fn get_index_info(&self) -> Result<IndexInfo> {
        Ok(IndexInfo { document_count: self.reader.searcher().num_docs(), index_name: self.name.clone() })
    }

    async fn drop_index(&self) -> Result<()> {
        let mut writer = self.writer.lock().unwrap();
        writer.delete_all_documents().map_err(|e| CoreError::IndexUnavailable(e.to_string()))?;
        writer.commit().map_err(|e| CoreError::IndexUnavailable(e.to_string()))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn sample_doc(url: &str, title: &str) -> IndexableDocument {
        IndexableDocument {
            url: url.to_string(),
            title: title.to_string(),
            description: "desc".to_string(),
            content: "body text content".to_string(),
            domain: "example.com".to_string(),
            keywords: vec!["rust".to_string()],
            language: Some("en".to_string()),
            category: None,
            indexed_at: Utc::now(),
            score: 1.0,
        }
    }

    #[tokio::test]
    async fn index_then_search_finds_the_document() {
        let index = TantivyFullTextIndex::open_temporary("search_index").unwrap();
        index.index_document(sample_doc("https://example.com/a", "Machine Learning Basics")).await.unwrap();

        let results = index
            .search(SearchQuery { wire_query: "machine".to_string(), limit: 10, ..Default::default() })
            .await
            .unwrap();
        assert_eq!(results.hits.len(), 1);
        assert_eq!(results.hits[0].doc.url, "https://example.com/a");
    }

    #[tokio::test]
    async fn delete_document_removes_it_from_results() {
        let index = TantivyFullTextIndex::open_temporary("search_index").unwrap();
        index.index_document(sample_doc("https://example.com/a", "Unique Term Zyzzyva")).await.unwrap();
        index.delete_document("https://example.com/a").await.unwrap();

        let results = index
            .search(SearchQuery { wire_query: "zyzzyva".to_string(), limit: 10, ..Default::default() })
            .await
            .unwrap();
        assert_eq!(results.hits.len(), 0);
    }

    #[test]
    fn document_key_test_hook() {
        assert!(document_key("https://example.com").starts_with("doc:"));
    }
}
