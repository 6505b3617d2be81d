// Resume Screening
// Implements: extraction, chunking, indexing, session-scoped retrieval,
// per-resume aggregation, summarization.
// All LLM calls go through llm_client; all vectors go through vector_store.

pub mod aggregator;
pub mod chunker;
pub mod extract;
pub mod handlers;
pub mod indexer;
pub mod pipeline;
pub mod prompts;
pub mod retriever;
pub mod summarizer;

#[cfg(test)]
pub mod testing;

pub use pipeline::{ScreeningService, ScreeningSettings};
