//! Content storage layer (C12–C14): document store + full-text index,
//! coordinated by [`content_storage::ContentStorage`].

pub mod document_store;
pub mod index_adapter;
pub mod content_storage;
pub mod memory_store;
pub mod tantivy_index;
pub mod keywords;

pub use content_storage::{ContentStorage, StorageStats};
pub use document_store::DocumentStore;
pub use index_adapter::{FullTextIndex, IndexInfo, SearchHit, SearchQuery, SearchResults};
