//! Embedding — turns passage and query text into vectors.
//!
//! The same `Embedder` instance backs indexing and retrieval. `AppState` holds it as
//! `Arc<dyn Embedder>` so the pipeline can never mix models between the two stages.

use async_trait::async_trait;
use thiserror::Error;

pub mod http;

pub use http::HttpEmbedder;

/// Default model: BAAI/bge-large-en-v1.5 (1024 dimensions, cosine).
pub const DEFAULT_MODEL: &str = "BAAI/bge-large-en-v1.5";
pub const DEFAULT_DIMENSION: usize = 1024;

#[derive(Debug, Error)]
pub enum EmbeddingError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("embedding request timed out")]
    Timeout,

    #[error("embedding service error (status {status}): {message}")]
    Api { status: u16, message: String },

    #[error("expected {expected} embeddings, service returned {actual}")]
    CountMismatch { expected: usize, actual: usize },

    #[error("expected {expected}-dimensional vectors, service returned {actual}")]
    DimensionMismatch { expected: usize, actual: usize },
}

impl EmbeddingError {
    pub(crate) fn from_reqwest(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            EmbeddingError::Timeout
        } else {
            EmbeddingError::Http(e)
        }
    }
}

/// A fixed, versioned embedding function.
#[async_trait]
pub trait Embedder: Send + Sync {
    /// Identifies the model version. Stored alongside every indexed vector.
    fn model_id(&self) -> &str;

    fn dimension(&self) -> usize;

    /// Embeds each text, returning vectors in input order.
    async fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, EmbeddingError>;

    async fn embed_one(&self, text: &str) -> Result<Vec<f32>, EmbeddingError> {
        let mut vectors = self.embed(&[text.to_string()]).await?;
        vectors.pop().ok_or(EmbeddingError::CountMismatch {
            expected: 1,
            actual: 0,
        })
    }
}

/// Checks a batch returned by a service against what was asked for.
pub(crate) fn check_batch(
    vectors: &[Vec<f32>],
    expected_count: usize,
    dimension: usize,
) -> Result<(), EmbeddingError> {
    if vectors.len() != expected_count {
        return Err(EmbeddingError::CountMismatch {
            expected: expected_count,
            actual: vectors.len(),
        });
    }
    if let Some(bad) = vectors.iter().find(|v| v.len() != dimension) {
        return Err(EmbeddingError::DimensionMismatch {
            expected: dimension,
            actual: bad.len(),
        });
    }
    Ok(())
}
