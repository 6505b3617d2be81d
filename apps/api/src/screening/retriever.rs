//! Retriever — session-scoped similarity search for a job description.

use serde_json::Value;
use thiserror::Error;
use tracing::{error, info, warn};

use crate::embedding::{Embedder, EmbeddingError};
use crate::models::{Passage, ScoredPassage, SessionId};
use crate::screening::indexer::{
    META_CHUNK_INDEX, META_EMBEDDING_MODEL, META_OFFSET, META_RESUME_ID, META_SESSION_ID,
    META_SIZE,
};
use crate::vector_store::{Metadata, MetadataFilter, QueryMatch, VectorStore, VectorStoreError};

/// Raw passages fetched per desired resume. Several passages of one resume can crowd
/// the top of the list, so retrieval asks for more than it needs.
pub const DEFAULT_OVER_FETCH_FACTOR: usize = 5;

#[derive(Debug, Error)]
pub enum RetrievalError {
    #[error("query embedding failed: {0}")]
    Embedding(#[from] EmbeddingError),

    #[error("similarity search failed: {0}")]
    Store(#[from] VectorStoreError),

    #[error("passages were indexed with '{indexed}' but the query used '{query}'")]
    ModelMismatch { indexed: String, query: String },

    #[error("malformed record {id}: {reason}")]
    MalformedRecord { id: String, reason: String },
}

/// Number of raw passages to request for `desired_count` resumes.
pub fn fetch_budget(desired_count: usize, over_fetch_factor: usize) -> usize {
    desired_count.saturating_mul(over_fetch_factor)
}

/// Returns up to `k` passages of `session_id`, most similar to `query` first.
/// No match is an empty list, not an error.
pub async fn retrieve(
    query: &str,
    k: usize,
    session_id: &SessionId,
    embedder: &dyn Embedder,
    store: &dyn VectorStore,
) -> Result<Vec<ScoredPassage>, RetrievalError> {
    if k == 0 {
        return Ok(Vec::new());
    }

    let vector = embedder.embed_one(query).await?;
    let filter = MetadataFilter::eq(META_SESSION_ID, session_id.as_str());
    let matches = store.query(&vector, k, &filter).await?;

    let mut scored = Vec::with_capacity(matches.len());
    for m in matches {
        check_model(&m, embedder.model_id())?;
        let passage = passage_from_match(&m)?;
        if passage.session_id != *session_id {
            error!(
                "Store returned record {} from session {} for session {}; dropping it",
                m.id, passage.session_id, session_id
            );
            continue;
        }
        if m.score.is_nan() {
            warn!("Dropping record {} with NaN score", m.id);
            continue;
        }
        scored.push(ScoredPassage {
            passage,
            score: m.score,
        });
    }

    scored.sort_by(|a, b| b.score.total_cmp(&a.score));
    scored.truncate(k);

    info!(
        "Retrieved {} passages (k={}) for session {}",
        scored.len(),
        k,
        session_id
    );
    Ok(scored)
}

fn check_model(m: &QueryMatch, query_model: &str) -> Result<(), RetrievalError> {
    match m.metadata.get(META_EMBEDDING_MODEL).and_then(Value::as_str) {
        Some(indexed) if indexed != query_model => Err(RetrievalError::ModelMismatch {
            indexed: indexed.to_string(),
            query: query_model.to_string(),
        }),
        _ => Ok(()),
    }
}

fn passage_from_match(m: &QueryMatch) -> Result<Passage, RetrievalError> {
    let malformed = |reason: &str| RetrievalError::MalformedRecord {
        id: m.id.clone(),
        reason: reason.to_string(),
    };

    let resume_id = string_field(&m.metadata, META_RESUME_ID)
        .ok_or_else(|| malformed("missing resume_id"))?;
    let session_id = string_field(&m.metadata, META_SESSION_ID)
        .ok_or_else(|| malformed("missing session_id"))?;

    Ok(Passage {
        text: m.text.clone(),
        resume_id,
        session_id: SessionId::from(session_id.as_str()),
        size: uint_field(&m.metadata, META_SIZE),
        chunk_index: uint_field(&m.metadata, META_CHUNK_INDEX).unwrap_or(0) as usize,
        offset: uint_field(&m.metadata, META_OFFSET).unwrap_or(0) as usize,
    })
}

fn string_field(metadata: &Metadata, key: &str) -> Option<String> {
    metadata.get(key).and_then(Value::as_str).map(String::from)
}

/// Some stores hand integers back as floats.
fn uint_field(metadata: &Metadata, key: &str) -> Option<u64> {
    let value = metadata.get(key)?;
    value
        .as_u64()
        .or_else(|| value.as_f64().filter(|f| *f >= 0.0).map(|f| f as u64))
}
