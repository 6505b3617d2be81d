//! Vector Store — where embedded passages live between indexing and retrieval.
//!
//! Session scoping is done with metadata, not partitions: every query MUST carry a
//! `session_id` filter. Backends:
//! - `InMemoryVectorStore` (default): brute-force cosine similarity, process-local.
//! - `PineconeStore`: Pinecone data-plane REST API.

use async_trait::async_trait;
use serde::Serialize;
use thiserror::Error;

pub mod filter;
pub mod memory;
pub mod pinecone;

pub use filter::MetadataFilter;
pub use memory::{InMemoryVectorStore, Retention};
pub use pinecone::PineconeStore;

pub type Metadata = serde_json::Map<String, serde_json::Value>;

#[derive(Debug, Error)]
pub enum VectorStoreError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("vector store request timed out")]
    Timeout,

    #[error("vector store error (status {status}): {message}")]
    Api { status: u16, message: String },

    #[error("vector dimension mismatch: index holds {expected}, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },

    #[error("invalid record: {0}")]
    InvalidRecord(String),
}

impl VectorStoreError {
    pub(crate) fn from_reqwest(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            VectorStoreError::Timeout
        } else {
            VectorStoreError::Http(e)
        }
    }
}

/// A single vector with its source text and filterable metadata.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VectorRecord {
    pub id: String,
    pub vector: Vec<f32>,
    pub text: String,
    pub metadata: Metadata,
}

/// One similarity hit. `score` is cosine similarity (higher = closer).
#[derive(Debug, Clone, PartialEq)]
pub struct QueryMatch {
    pub id: String,
    pub text: String,
    pub metadata: Metadata,
    pub score: f32,
}

#[async_trait]
pub trait VectorStore: Send + Sync {
    /// Inserts or replaces records by id. Either every record is accepted or the
    /// call returns an error.
    async fn upsert(&self, records: Vec<VectorRecord>) -> Result<(), VectorStoreError>;

    /// Returns up to `k` records matching `filter`, ordered by descending score.
    async fn query(
        &self,
        vector: &[f32],
        k: usize,
        filter: &MetadataFilter,
    ) -> Result<Vec<QueryMatch>, VectorStoreError>;

    /// Backend label for logs and the health endpoint.
    fn backend(&self) -> &'static str;
}
