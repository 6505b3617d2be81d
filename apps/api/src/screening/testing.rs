//! Fakes for the screening collaborators, shared by the unit tests.

use std::collections::{HashMap, HashSet};
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;

use crate::embedding::{Embedder, EmbeddingError};
use crate::models::{Passage, ScoredPassage, SessionId};
use crate::screening::summarizer::{Summarizer, SummaryError};
use crate::vector_store::{
    InMemoryVectorStore, MetadataFilter, QueryMatch, VectorRecord, VectorStore,
    VectorStoreError,
};

pub fn passage(resume_id: &str, session: &str, chunk_index: usize, text: &str) -> Passage {
    Passage {
        text: text.to_string(),
        resume_id: resume_id.to_string(),
        session_id: SessionId::from(session),
        size: Some(1024),
        chunk_index,
        offset: 0,
    }
}

pub fn scored(resume_id: &str, chunk_index: usize, score: f32) -> ScoredPassage {
    ScoredPassage {
        passage: passage(resume_id, "s", chunk_index, "text"),
        score,
    }
}

const VOCABULARY: [&str; 10] = [
    "rust", "python", "kafka", "postgres", "go", "kubernetes", "sales", "design", "java",
    "react",
];

/// Bag-of-keywords embedder: one dimension per vocabulary word plus a small bias
/// dimension so no vector is all zeros.
pub struct KeywordEmbedder {
    model: String,
}

impl Default for KeywordEmbedder {
    fn default() -> Self {
        Self::with_model("keyword-test-v1")
    }
}

impl KeywordEmbedder {
    pub fn with_model(model: &str) -> Self {
        Self {
            model: model.to_string(),
        }
    }

    fn vectorize(text: &str) -> Vec<f32> {
        let mut vector = vec![0.0; VOCABULARY.len() + 1];
        for token in text
            .split(|c: char| !c.is_alphanumeric())
            .map(str::to_lowercase)
        {
            if let Some(i) = VOCABULARY.iter().position(|w| *w == token) {
                vector[i] += 1.0;
            }
        }
        vector[VOCABULARY.len()] = 0.01;
        vector
    }
}

#[async_trait]
impl Embedder for KeywordEmbedder {
    fn model_id(&self) -> &str {
        &self.model
    }

    fn dimension(&self) -> usize {
        VOCABULARY.len() + 1
    }

    async fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, EmbeddingError> {
        Ok(texts.iter().map(|t| Self::vectorize(t)).collect())
    }
}

pub struct FailingEmbedder;

#[async_trait]
impl Embedder for FailingEmbedder {
    fn model_id(&self) -> &str {
        "failing"
    }

    fn dimension(&self) -> usize {
        1
    }

    async fn embed(&self, _texts: &[String]) -> Result<Vec<Vec<f32>>, EmbeddingError> {
        Err(EmbeddingError::Timeout)
    }
}

/// A store that is always unreachable.
pub struct FailingStore;

#[async_trait]
impl VectorStore for FailingStore {
    async fn upsert(&self, _records: Vec<VectorRecord>) -> Result<(), VectorStoreError> {
        Err(unavailable())
    }

    async fn query(
        &self,
        _vector: &[f32],
        _k: usize,
        _filter: &MetadataFilter,
    ) -> Result<Vec<QueryMatch>, VectorStoreError> {
        Err(unavailable())
    }

    fn backend(&self) -> &'static str {
        "failing"
    }
}

fn unavailable() -> VectorStoreError {
    VectorStoreError::Api {
        status: 503,
        message: "service unavailable".to_string(),
    }
}

/// Accepts writes but every query times out.
#[derive(Default)]
pub struct QueryFailsStore {
    inner: InMemoryVectorStore,
}

#[async_trait]
impl VectorStore for QueryFailsStore {
    async fn upsert(&self, records: Vec<VectorRecord>) -> Result<(), VectorStoreError> {
        self.inner.upsert(records).await
    }

    async fn query(
        &self,
        _vector: &[f32],
        _k: usize,
        _filter: &MetadataFilter,
    ) -> Result<Vec<QueryMatch>, VectorStoreError> {
        Err(VectorStoreError::Timeout)
    }

    fn backend(&self) -> &'static str {
        "query-fails"
    }
}

/// Accepts writes but never finds anything.
#[derive(Default)]
pub struct EmptyQueryStore {
    inner: InMemoryVectorStore,
}

#[async_trait]
impl VectorStore for EmptyQueryStore {
    async fn upsert(&self, records: Vec<VectorRecord>) -> Result<(), VectorStoreError> {
        self.inner.upsert(records).await
    }

    async fn query(
        &self,
        _vector: &[f32],
        _k: usize,
        _filter: &MetadataFilter,
    ) -> Result<Vec<QueryMatch>, VectorStoreError> {
        Ok(Vec::new())
    }

    fn backend(&self) -> &'static str {
        "empty"
    }
}

/// In-memory store whose query scores are fixed per `(resume_id, chunk_index)`.
/// Records every `k` it is asked for.
#[derive(Default)]
pub struct ScriptedStore {
    inner: InMemoryVectorStore,
    scores: HashMap<(String, u64), f32>,
    pub requested_k: Mutex<Vec<usize>>,
}

impl ScriptedStore {
    pub fn with_scores(scores: &[(&str, u64, f32)]) -> Self {
        Self {
            scores: scores
                .iter()
                .map(|(resume, chunk, score)| ((resume.to_string(), *chunk), *score))
                .collect(),
            ..Self::default()
        }
    }
}

#[async_trait]
impl VectorStore for ScriptedStore {
    async fn upsert(&self, records: Vec<VectorRecord>) -> Result<(), VectorStoreError> {
        self.inner.upsert(records).await
    }

    async fn query(
        &self,
        vector: &[f32],
        k: usize,
        filter: &MetadataFilter,
    ) -> Result<Vec<QueryMatch>, VectorStoreError> {
        self.requested_k.lock().unwrap().push(k);
        let mut matches = self.inner.query(vector, usize::MAX, filter).await?;
        for m in &mut matches {
            let resume = m.metadata["resume_id"].as_str().unwrap_or_default().to_string();
            let chunk = m.metadata["chunk_index"].as_u64().unwrap_or_default();
            if let Some(score) = self.scores.get(&(resume, chunk)) {
                m.score = *score;
            }
        }
        matches.sort_by(|a, b| b.score.total_cmp(&a.score));
        matches.truncate(k);
        Ok(matches)
    }

    fn backend(&self) -> &'static str {
        "scripted"
    }
}

/// Echoes the resume id; fails for the resume ids it was told to fail.
#[derive(Default)]
pub struct EchoSummarizer {
    failing: HashSet<String>,
}

impl EchoSummarizer {
    pub fn failing_for(resume_ids: &[&str]) -> Self {
        Self {
            failing: resume_ids.iter().map(|s| s.to_string()).collect(),
        }
    }
}

#[async_trait]
impl Summarizer for EchoSummarizer {
    async fn summarize(&self, passage: &Passage) -> Result<String, SummaryError> {
        if self.failing.contains(&passage.resume_id) {
            return Err(SummaryError::Timeout(Duration::from_secs(60)));
        }
        Ok(format!("Summary of {}", passage.resume_id))
    }
}
