//! Chunker — splits resume text into overlapping, fixed-size passages.
//!
//! Sizes are measured in characters. A chunk ends at the last paragraph break, line
//! break, or space found in the back half of its window, else at a hard cut.
//! Consecutive chunks overlap by `chunk_overlap` characters, so the union of all
//! chunks always covers the whole source text in order.

use crate::models::{Passage, SessionId};

pub const DEFAULT_CHUNK_SIZE: usize = 1000;
pub const DEFAULT_CHUNK_OVERLAP: usize = 200;

/// Preferred break points, strongest first.
const SEPARATORS: [&str; 3] = ["\n\n", "\n", " "];

/// Extracted text of one resume, ready to be chunked.
#[derive(Debug, Clone)]
pub struct SourceDocument {
    pub text: String,
    pub resume_id: String,
    pub size: Option<u64>,
}

/// Chunks every document and tags each passage with its resume and `session_id`.
/// Blank documents contribute no passages.
pub fn chunk(
    documents: &[SourceDocument],
    session_id: &SessionId,
    chunk_size: usize,
    chunk_overlap: usize,
) -> Vec<Passage> {
    documents
        .iter()
        .flat_map(|doc| {
            split_text(&doc.text, chunk_size, chunk_overlap)
                .into_iter()
                .enumerate()
                .map(|(chunk_index, (offset, text))| Passage {
                    text,
                    resume_id: doc.resume_id.clone(),
                    session_id: session_id.clone(),
                    size: doc.size,
                    chunk_index,
                    offset,
                })
        })
        .collect()
}

/// Returns `(char_offset, chunk_text)` pairs in source order.
pub fn split_text(text: &str, chunk_size: usize, chunk_overlap: usize) -> Vec<(usize, String)> {
    if text.trim().is_empty() {
        return Vec::new();
    }
    let chunk_size = chunk_size.max(1);
    let overlap = chunk_overlap.min(chunk_size - 1);

    let chars: Vec<(usize, char)> = text.char_indices().collect();
    let n = chars.len();
    let byte_at = |i: usize| if i == n { text.len() } else { chars[i].0 };

    let mut chunks = Vec::new();
    let mut start = 0;
    let mut prev_end = 0;
    loop {
        let hard_end = (start + chunk_size).min(n);
        let end = if hard_end == n {
            n
        } else {
            // Never end at or before the previous chunk's end.
            let floor = (start + chunk_size / 2).max(prev_end + 1).max(start + 1);
            find_break(&chars, start, floor, hard_end).unwrap_or(hard_end)
        };

        chunks.push((start, text[byte_at(start)..byte_at(end)].to_string()));
        if end == n {
            break;
        }
        prev_end = end;
        start = end.saturating_sub(overlap).max(start + 1);
    }
    chunks
}

/// Latest position in `floor..=hard_end` that sits just after a separator.
fn find_break(chars: &[(usize, char)], start: usize, floor: usize, hard_end: usize) -> Option<usize> {
    SEPARATORS.iter().find_map(|sep| {
        let sep: Vec<char> = sep.chars().collect();
        (floor..=hard_end).rev().find(|&end| {
            end >= start + sep.len()
                && chars[end - sep.len()..end]
                    .iter()
                    .map(|(_, c)| *c)
                    .eq(sep.iter().copied())
        })
    })
}
