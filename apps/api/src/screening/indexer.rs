//! Indexer — embeds passages and writes them to the shared vector store.
//!
//! `session_id` is stored as filterable metadata, not as a partition. Every vector
//! is also stamped with the embedding model id so retrieval can detect a mismatch.

use serde_json::{json, Value};
use thiserror::Error;
use tracing::info;

use crate::embedding::{Embedder, EmbeddingError};
use crate::models::Passage;
use crate::vector_store::{Metadata, VectorRecord, VectorStore, VectorStoreError};

pub(crate) const META_RESUME_ID: &str = "resume_id";
pub(crate) const META_SESSION_ID: &str = "session_id";
pub(crate) const META_SIZE: &str = "size";
pub(crate) const META_CHUNK_INDEX: &str = "chunk_index";
pub(crate) const META_OFFSET: &str = "offset";
pub(crate) const META_EMBEDDING_MODEL: &str = "embedding_model";

#[derive(Debug, Error)]
pub enum IndexError {
    #[error("embedding failed: {0}")]
    Embedding(#[from] EmbeddingError),

    #[error("vector store rejected the write: {0}")]
    Store(#[from] VectorStoreError),
}

fn passage_metadata(passage: &Passage, model_id: &str) -> Metadata {
    let mut metadata = Metadata::new();
    metadata.insert(META_RESUME_ID.to_string(), json!(passage.resume_id));
    metadata.insert(META_SESSION_ID.to_string(), json!(passage.session_id.as_str()));
    if let Some(size) = passage.size {
        metadata.insert(META_SIZE.to_string(), json!(size));
    }
    metadata.insert(META_CHUNK_INDEX.to_string(), json!(passage.chunk_index));
    metadata.insert(META_OFFSET.to_string(), json!(passage.offset));
    metadata.insert(
        META_EMBEDDING_MODEL.to_string(),
        Value::String(model_id.to_string()),
    );
    metadata
}

/// Embeds every passage, then writes them in a single upsert. Nothing is written
/// unless every embedding succeeded.
pub async fn index(
    passages: &[Passage],
    embedder: &dyn Embedder,
    store: &dyn VectorStore,
) -> Result<(), IndexError> {
    if passages.is_empty() {
        return Ok(());
    }

    let texts: Vec<String> = passages.iter().map(|p| p.text.clone()).collect();
    let vectors = embedder.embed(&texts).await?;
    if vectors.len() != passages.len() {
        return Err(IndexError::Embedding(EmbeddingError::CountMismatch {
            expected: passages.len(),
            actual: vectors.len(),
        }));
    }

    let records: Vec<VectorRecord> = passages
        .iter()
        .zip(vectors)
        .map(|(passage, vector)| VectorRecord {
            id: passage.record_id(),
            vector,
            text: passage.text.clone(),
            metadata: passage_metadata(passage, embedder.model_id()),
        })
        .collect();

    store.upsert(records).await?;
    info!(
        "Indexed {} passages into {} store",
        passages.len(),
        store.backend()
    );
    Ok(())
}
