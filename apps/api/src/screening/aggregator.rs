//! Aggregator — collapses passage-level hits into a per-resume ranking.
//!
//! Each resume is represented by its single best-scoring passage; scores are never
//! averaged across a resume's passages.

use std::collections::HashSet;

use crate::models::{RankedResume, ScoredPassage};

/// Returns at most `desired_count` resumes, best first.
///
/// Algorithm:
/// 1. Stable sort by descending score (ties keep input order).
/// 2. Walk the sorted list; the first passage seen for a resume becomes its
///    representative and its score the resume's best score.
/// 3. Stop once `desired_count` distinct resumes are recorded.
///
/// Fewer distinct resumes than requested returns all of them. An empty input is an
/// empty ranking, which callers treat as "no relevant resumes".
pub fn aggregate(scored: &[ScoredPassage], desired_count: usize) -> Vec<RankedResume> {
    let mut sorted: Vec<&ScoredPassage> = scored.iter().collect();
    sorted.sort_by(|a, b| b.score.total_cmp(&a.score));

    let mut seen: HashSet<&str> = HashSet::new();
    let mut ranking = Vec::new();
    for hit in sorted {
        if ranking.len() >= desired_count {
            break;
        }
        if seen.insert(hit.passage.resume_id.as_str()) {
            ranking.push(RankedResume {
                resume_id: hit.passage.resume_id.clone(),
                best_score: hit.score,
                representative: hit.passage.clone(),
            });
        }
    }
    ranking
}
