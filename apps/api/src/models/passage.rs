use serde::{Deserialize, Serialize};

use crate::models::session::SessionId;

/// One chunk of a resume's text: the unit of embedding and retrieval.
///
/// A passage belongs to exactly one resume and one session and is never mutated
/// after the chunker creates it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Passage {
    pub text: String,
    /// Originating resume, usually the uploaded file name.
    pub resume_id: String,
    pub session_id: SessionId,
    /// Byte length of the source file. Informational only.
    pub size: Option<u64>,
    /// Position of this chunk within its resume.
    pub chunk_index: usize,
    /// Character offset of the chunk's first character in the source text.
    pub offset: usize,
}

impl Passage {
    /// Stable record id used when upserting into a vector store.
    pub fn record_id(&self) -> String {
        format!("{}:{}:{}", self.session_id, self.resume_id, self.chunk_index)
    }
}

/// A passage returned by a similarity query. Higher score = more similar.
///
/// Scores are only comparable within a single retrieval call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoredPassage {
    pub passage: Passage,
    pub score: f32,
}

/// One resume in the final ranking with the passage that earned its best score.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RankedResume {
    pub resume_id: String,
    pub best_score: f32,
    pub representative: Passage,
}
