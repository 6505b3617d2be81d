//! Summarizer — produces a short synopsis of a resume's representative passage.
//!
//! `ScreeningService` holds an `Arc<dyn Summarizer>`. The call is awaited to completion;
//! timeouts and service failures come back as `SummaryError`, never as an empty string.

use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;
use tracing::debug;

use crate::llm_client::prompts::FACTUAL_INSTRUCTION;
use crate::llm_client::{LlmClient, LlmError};
use crate::models::Passage;
use crate::screening::prompts::{SUMMARY_PROMPT_TEMPLATE, SUMMARY_SYSTEM};

/// Shown in place of a summary that could not be generated.
pub const SUMMARY_PLACEHOLDER: &str = "Summary unavailable.";

#[derive(Debug, Error)]
pub enum SummaryError {
    #[error("summary generation failed: {0}")]
    Llm(#[from] LlmError),

    #[error("summary generation timed out after {0:?}")]
    Timeout(Duration),
}

#[async_trait]
pub trait Summarizer: Send + Sync {
    async fn summarize(&self, passage: &Passage) -> Result<String, SummaryError>;
}

/// Summarizer backed by the shared `LlmClient`.
pub struct LlmSummarizer {
    llm: LlmClient,
    timeout: Duration,
}

impl LlmSummarizer {
    pub fn new(llm: LlmClient, timeout: Duration) -> Self {
        Self { llm, timeout }
    }
}

pub fn build_summary_prompt(passage: &Passage) -> String {
    SUMMARY_PROMPT_TEMPLATE
        .replace("{resume_id}", &passage.resume_id)
        .replace("{passage}", &passage.text)
}

#[async_trait]
impl Summarizer for LlmSummarizer {
    async fn summarize(&self, passage: &Passage) -> Result<String, SummaryError> {
        let prompt = build_summary_prompt(passage);
        let system = format!("{SUMMARY_SYSTEM}\n\n{FACTUAL_INSTRUCTION}");

        let summary = tokio::time::timeout(self.timeout, self.llm.complete_text(&prompt, &system))
            .await
            .map_err(|_| SummaryError::Timeout(self.timeout))?
            .map_err(|e| match e {
                LlmError::Timeout => SummaryError::Timeout(self.timeout),
                other => SummaryError::Llm(other),
            })?;

        debug!(
            "Summarized {} ({} chars)",
            passage.resume_id,
            summary.len()
        );
        Ok(summary)
    }
}
