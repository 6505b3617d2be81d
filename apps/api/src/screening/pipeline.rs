//! Screening pipeline — the single entry point behind `POST /api/v1/screenings`.
//!
//! Flow: validate → extract → chunk → index → retrieve (over-fetched) → aggregate →
//!       summarize → report.
//!
//! Stages run strictly in sequence. Every stage receives the `session_id` and the
//! previous stage's output as arguments. Extraction and summary failures are
//! contained per resume; indexing and retrieval failures abort the submission.

use std::collections::HashSet;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use futures::stream::{self, StreamExt};
use serde::Serialize;
use thiserror::Error;
use tracing::{info, warn};

use crate::embedding::Embedder;
use crate::models::{RankedResume, SessionId};
use crate::screening::aggregator::aggregate;
use crate::screening::chunker::{chunk, SourceDocument, DEFAULT_CHUNK_OVERLAP, DEFAULT_CHUNK_SIZE};
use crate::screening::extract::{extract_text_blocking, ResumeFile};
use crate::screening::indexer::{index, IndexError};
use crate::screening::retriever::{fetch_budget, retrieve, RetrievalError, DEFAULT_OVER_FETCH_FACTOR};
use crate::screening::summarizer::{Summarizer, SummaryError, SUMMARY_PLACEHOLDER};
use crate::vector_store::VectorStore;

pub const NO_RESULTS_MESSAGE: &str = "No relevant resumes found.";

/// Tunables for one screening run. Loaded from `Config`, passed in explicitly.
#[derive(Debug, Clone)]
pub struct ScreeningSettings {
    pub chunk_size: usize,
    pub chunk_overlap: usize,
    pub over_fetch_factor: usize,
    pub max_desired_count: usize,
    pub summary_concurrency: usize,
}

impl Default for ScreeningSettings {
    fn default() -> Self {
        Self {
            chunk_size: DEFAULT_CHUNK_SIZE,
            chunk_overlap: DEFAULT_CHUNK_OVERLAP,
            over_fetch_factor: DEFAULT_OVER_FETCH_FACTOR,
            max_desired_count: 50,
            summary_concurrency: 4,
        }
    }
}

#[derive(Debug, Clone)]
pub struct ScreeningRequest {
    pub job_description: String,
    pub resumes: Vec<ResumeFile>,
    pub desired_count: usize,
}

#[derive(Debug, Error)]
pub enum InputError {
    #[error("Please paste the job description.")]
    EmptyJobDescription,

    #[error("Please upload at least one resume.")]
    NoResumes,

    #[error("Number of resumes to return must be between 1 and {max}, got {value}.")]
    InvalidDesiredCount { value: usize, max: usize },
}

#[derive(Debug, Error)]
pub enum ScreeningError {
    #[error(transparent)]
    Input(#[from] InputError),

    #[error("Resumes could not be added to the vector index: {0}")]
    Indexing(#[from] IndexError),

    #[error("Similar resumes could not be retrieved: {0}")]
    Retrieval(#[from] RetrievalError),
}

/// A resume left out of the ranking because its text could not be used.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SkippedResume {
    pub resume_id: String,
    pub reason: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScreeningResult {
    pub rank: usize,
    pub resume_id: String,
    pub score: f32,
    pub summary: String,
    /// Set when the summary is the placeholder because generation failed.
    pub summary_error: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ScreeningReport {
    pub session_id: SessionId,
    pub created_at: DateTime<Utc>,
    pub resumes_processed: usize,
    pub passages_indexed: usize,
    pub skipped: Vec<SkippedResume>,
    pub results: Vec<ScreeningResult>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ScreeningOutcome {
    Ranked(ScreeningReport),
    /// Not a failure: nothing in this session matched.
    NoResults {
        session_id: SessionId,
        skipped: Vec<SkippedResume>,
        message: String,
    },
}

/// Owns the collaborators. Cheap to clone; holds no per-session state.
#[derive(Clone)]
pub struct ScreeningService {
    embedder: Arc<dyn Embedder>,
    store: Arc<dyn VectorStore>,
    summarizer: Arc<dyn Summarizer>,
    settings: ScreeningSettings,
}

impl ScreeningService {
    pub fn new(
        embedder: Arc<dyn Embedder>,
        store: Arc<dyn VectorStore>,
        summarizer: Arc<dyn Summarizer>,
        settings: ScreeningSettings,
    ) -> Self {
        Self {
            embedder,
            store,
            summarizer,
            settings,
        }
    }

    pub fn embedder(&self) -> &dyn Embedder {
        self.embedder.as_ref()
    }

    pub fn store(&self) -> &dyn VectorStore {
        self.store.as_ref()
    }

    pub fn settings(&self) -> &ScreeningSettings {
        &self.settings
    }

    /// Runs one submission end to end under a freshly generated session id.
    pub async fn run_screening(
        &self,
        request: ScreeningRequest,
    ) -> Result<ScreeningOutcome, ScreeningError> {
        validate(&request, &self.settings)?;
        let ScreeningRequest {
            job_description,
            resumes,
            desired_count,
        } = request;

        let session_id = SessionId::generate();
        info!(
            "Screening session {}: {} resumes, desired_count={}",
            session_id,
            resumes.len(),
            desired_count
        );

        // Extract + chunk
        let (documents, mut skipped) = extract_documents(resumes, &session_id).await;
        let passages = chunk(
            &documents,
            &session_id,
            self.settings.chunk_size,
            self.settings.chunk_overlap,
        );
        let chunked: HashSet<&str> = passages.iter().map(|p| p.resume_id.as_str()).collect();
        for doc in documents.iter().filter(|d| !chunked.contains(d.resume_id.as_str())) {
            warn!(
                "Session {}: no extractable text in {}, skipping",
                session_id, doc.resume_id
            );
            skipped.push(SkippedResume {
                resume_id: doc.resume_id.clone(),
                reason: "no extractable text".to_string(),
            });
        }
        let resumes_processed = chunked.len();
        info!(
            "Session {}: {} passages from {} resumes",
            session_id,
            passages.len(),
            resumes_processed
        );

        if passages.is_empty() {
            return Ok(no_results(session_id, skipped));
        }

        // Index
        index(&passages, self.embedder(), self.store()).await?;

        // Retrieve + aggregate
        let k = fetch_budget(desired_count, self.settings.over_fetch_factor);
        let scored = retrieve(
            &job_description,
            k,
            &session_id,
            self.embedder(),
            self.store(),
        )
        .await?;
        let ranking = aggregate(&scored, desired_count);
        info!(
            "Session {}: {} passages collapsed into {} ranked resumes",
            session_id,
            scored.len(),
            ranking.len()
        );

        if ranking.is_empty() {
            return Ok(no_results(session_id, skipped));
        }

        // Summarize
        let results = self.summarize_all(&ranking, &session_id).await;

        Ok(ScreeningOutcome::Ranked(ScreeningReport {
            session_id,
            created_at: Utc::now(),
            resumes_processed,
            passages_indexed: passages.len(),
            skipped,
            results,
        }))
    }

    /// Summaries run concurrently; `buffered` yields them in ranking order.
    /// A failed summary becomes the placeholder and the rest continue.
    async fn summarize_all(
        &self,
        ranking: &[RankedResume],
        session_id: &SessionId,
    ) -> Vec<ScreeningResult> {
        let summarizer = Arc::clone(&self.summarizer);
        let outcomes: Vec<Result<String, SummaryError>> = stream::iter(ranking.to_vec())
            .map(move |ranked| {
                let summarizer = Arc::clone(&summarizer);
                async move { summarizer.summarize(&ranked.representative).await }
            })
            .buffered(self.settings.summary_concurrency.max(1))
            .boxed()
            .collect()
            .await;

        ranking
            .iter()
            .zip(outcomes)
            .enumerate()
            .map(|(i, (ranked, outcome))| {
                let (summary, summary_error) = match outcome {
                    Ok(summary) => (summary, None),
                    Err(e) => {
                        warn!(
                            "Session {}: summary for {} failed: {}",
                            session_id, ranked.resume_id, e
                        );
                        (SUMMARY_PLACEHOLDER.to_string(), Some(e.to_string()))
                    }
                };
                ScreeningResult {
                    rank: i + 1,
                    resume_id: ranked.resume_id.clone(),
                    score: ranked.best_score,
                    summary,
                    summary_error,
                }
            })
            .collect()
    }
}

fn validate(request: &ScreeningRequest, settings: &ScreeningSettings) -> Result<(), InputError> {
    if request.job_description.trim().is_empty() {
        return Err(InputError::EmptyJobDescription);
    }
    if request.resumes.is_empty() {
        return Err(InputError::NoResumes);
    }
    if request.desired_count == 0 || request.desired_count > settings.max_desired_count {
        return Err(InputError::InvalidDesiredCount {
            value: request.desired_count,
            max: settings.max_desired_count,
        });
    }
    Ok(())
}

fn no_results(session_id: SessionId, skipped: Vec<SkippedResume>) -> ScreeningOutcome {
    info!("Session {}: {}", session_id, NO_RESULTS_MESSAGE);
    ScreeningOutcome::NoResults {
        session_id,
        skipped,
        message: NO_RESULTS_MESSAGE.to_string(),
    }
}

/// Extracts every file concurrently. Unreadable files become `SkippedResume`s.
async fn extract_documents(
    files: Vec<ResumeFile>,
    session_id: &SessionId,
) -> (Vec<SourceDocument>, Vec<SkippedResume>) {
    let names = unique_resume_ids(files.iter().map(|f| f.name.as_str()));
    let extractions = files.into_iter().zip(names).map(|(file, resume_id)| async move {
        let size = file.size();
        (resume_id, size, extract_text_blocking(file).await)
    });

    let mut documents = Vec::new();
    let mut skipped = Vec::new();
    for (resume_id, size, outcome) in futures::future::join_all(extractions).await {
        match outcome {
            Ok(text) => documents.push(SourceDocument {
                text,
                resume_id,
                size: Some(size),
            }),
            Err(e) => {
                warn!(
                    "Session {}: could not read {}: {}",
                    session_id, resume_id, e
                );
                skipped.push(SkippedResume {
                    resume_id,
                    reason: e.to_string(),
                });
            }
        }
    }
    (documents, skipped)
}

/// Resume ids must be unique within a session; repeated file names get a
/// " (2)", " (3)", ... suffix.
fn unique_resume_ids<'a>(names: impl Iterator<Item = &'a str>) -> Vec<String> {
    let names: Vec<&str> = names.collect();
    let mut taken: HashSet<String> = HashSet::new();
    let mut ids = Vec::with_capacity(names.len());
    for name in &names {
        let base = if name.trim().is_empty() {
            "uploaded_resume.pdf"
        } else {
            name
        };
        let mut candidate = base.to_string();
        let mut n = 2;
        while !taken.insert(candidate.clone()) {
            candidate = format!("{base} ({n})");
            n += 1;
        }
        ids.push(candidate);
    }
    ids
}
