use std::collections::{HashMap, HashSet, VecDeque};

use async_trait::async_trait;
use serde_json::Value;
use tokio::sync::RwLock;
use tracing::{debug, info};

use crate::vector_store::{
    MetadataFilter, QueryMatch, VectorRecord, VectorStore, VectorStoreError,
};

/// Record cap for the in-memory backend. Once exceeded, whole groups (records sharing
/// a value of `group_field`) are dropped oldest first.
#[derive(Debug, Clone)]
pub struct Retention {
    pub max_records: usize,
    pub group_field: String,
}

#[derive(Default)]
struct Inner {
    /// Fixed by the first upsert; every later vector must match it.
    dimension: Option<usize>,
    /// Insertion order, so equal scores come back in the order they were indexed.
    order: Vec<String>,
    records: HashMap<String, VectorRecord>,
    /// Groups in first-seen order, with the record ids each one owns.
    groups: VecDeque<String>,
    members: HashMap<String, Vec<String>>,
}

impl Inner {
    /// Drops the oldest groups until the cap holds. Groups in `protected` are kept
    /// even if that leaves the store over the cap.
    fn evict(&mut self, max_records: usize, protected: &HashSet<String>) -> usize {
        let mut evicted = 0;
        while self.records.len() > max_records {
            let Some(pos) = self.groups.iter().position(|g| !protected.contains(g)) else {
                break;
            };
            let Some(group) = self.groups.remove(pos) else {
                break;
            };
            for id in self.members.remove(&group).unwrap_or_default() {
                if self.records.remove(&id).is_some() {
                    evicted += 1;
                }
            }
        }
        if evicted > 0 {
            self.order.retain(|id| self.records.contains_key(id));
        }
        evicted
    }
}

/// Process-local store that scans every record on query.
#[derive(Default)]
pub struct InMemoryVectorStore {
    inner: RwLock<Inner>,
    retention: Option<Retention>,
}

impl InMemoryVectorStore {
    /// Unbounded store. Everything written stays until the process exits.
    pub fn new() -> Self {
        Self::default()
    }

    /// Store that keeps at most `retention.max_records` records, dropping the oldest
    /// groups first.
    pub fn bounded(retention: Retention) -> Self {
        Self {
            inner: RwLock::default(),
            retention: Some(retention),
        }
    }

    #[cfg(test)]
    pub async fn len(&self) -> usize {
        self.inner.read().await.records.len()
    }
}

fn group_of(record: &VectorRecord, field: &str) -> String {
    record
        .metadata
        .get(field)
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string()
}

#[async_trait]
impl VectorStore for InMemoryVectorStore {
    async fn upsert(&self, records: Vec<VectorRecord>) -> Result<(), VectorStoreError> {
        let mut inner = self.inner.write().await;

        // Validate the whole batch before touching the index.
        let expected = inner
            .dimension
            .or_else(|| records.first().map(|r| r.vector.len()));
        if let Some(expected) = expected {
            if let Some(bad) = records.iter().find(|r| r.vector.len() != expected) {
                return Err(VectorStoreError::DimensionMismatch {
                    expected,
                    actual: bad.vector.len(),
                });
            }
        }
        if let Some(bad) = records.iter().find(|r| r.vector.is_empty()) {
            return Err(VectorStoreError::InvalidRecord(format!(
                "record {} has an empty vector",
                bad.id
            )));
        }

        let count = records.len();
        let mut touched = HashSet::new();
        inner.dimension = expected;
        for record in records {
            if !inner.records.contains_key(&record.id) {
                inner.order.push(record.id.clone());
                if let Some(retention) = &self.retention {
                    let group = group_of(&record, &retention.group_field);
                    if !inner.members.contains_key(&group) {
                        inner.groups.push_back(group.clone());
                    }
                    inner
                        .members
                        .entry(group.clone())
                        .or_default()
                        .push(record.id.clone());
                    touched.insert(group);
                }
            }
            inner.records.insert(record.id.clone(), record);
        }
        debug!("In-memory store upserted {count} records");

        if let Some(retention) = &self.retention {
            let evicted = inner.evict(retention.max_records, &touched);
            if evicted > 0 {
                info!(
                    "In-memory store evicted {evicted} records; {} remain",
                    inner.records.len()
                );
            }
        }
        Ok(())
    }

    async fn query(
        &self,
        vector: &[f32],
        k: usize,
        filter: &MetadataFilter,
    ) -> Result<Vec<QueryMatch>, VectorStoreError> {
        let inner = self.inner.read().await;

        if let Some(expected) = inner.dimension {
            if vector.len() != expected {
                return Err(VectorStoreError::DimensionMismatch {
                    expected,
                    actual: vector.len(),
                });
            }
        }

        let mut matches: Vec<QueryMatch> = inner
            .order
            .iter()
            .filter_map(|id| inner.records.get(id))
            .filter(|record| filter.matches(&record.metadata))
            .map(|record| QueryMatch {
                id: record.id.clone(),
                text: record.text.clone(),
                metadata: record.metadata.clone(),
                score: cosine_similarity(vector, &record.vector),
            })
            .collect();

        matches.sort_by(|a, b| b.score.total_cmp(&a.score));
        matches.truncate(k);
        Ok(matches)
    }

    fn backend(&self) -> &'static str {
        "memory"
    }
}

/// Cosine similarity in [-1, 1]. Zero-norm vectors score 0.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    let (mut dot, mut norm_a, mut norm_b) = (0.0_f32, 0.0_f32, 0.0_f32);
    for (x, y) in a.iter().zip(b) {
        dot += x * y;
        norm_a += x * x;
        norm_b += y * y;
    }
    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }
    dot / (norm_a.sqrt() * norm_b.sqrt())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::vector_store::Metadata;
    use serde_json::json;

    fn record(id: &str, vector: Vec<f32>, session: &str) -> VectorRecord {
        let mut metadata = Metadata::new();
        metadata.insert("session_id".to_string(), json!(session));
        VectorRecord {
            id: id.to_string(),
            vector,
            text: format!("text of {id}"),
            metadata,
        }
    }

    #[test]
    fn test_cosine_identical_is_one() {
        let score = cosine_similarity(&[1.0, 2.0, 3.0], &[1.0, 2.0, 3.0]);
        assert!((score - 1.0).abs() < 1e-6, "Score was {score}");
    }

    #[test]
    fn test_cosine_orthogonal_is_zero() {
        assert_eq!(cosine_similarity(&[1.0, 0.0], &[0.0, 1.0]), 0.0);
    }

    #[test]
    fn test_cosine_zero_vector_is_zero() {
        assert_eq!(cosine_similarity(&[0.0, 0.0], &[1.0, 1.0]), 0.0);
    }

    #[tokio::test]
    async fn test_query_orders_by_descending_similarity() {
        let store = InMemoryVectorStore::new();
        store
            .upsert(vec![
                record("far", vec![0.0, 1.0], "s1"),
                record("near", vec![1.0, 0.1], "s1"),
                record("mid", vec![1.0, 1.0], "s1"),
            ])
            .await
            .unwrap();

        let hits = store
            .query(&[1.0, 0.0], 10, &MetadataFilter::eq("session_id", "s1"))
            .await
            .unwrap();
        let ids: Vec<&str> = hits.iter().map(|h| h.id.as_str()).collect();
        assert_eq!(ids, vec!["near", "mid", "far"]);
    }

    #[tokio::test]
    async fn test_query_respects_k_and_filter() {
        let store = InMemoryVectorStore::new();
        store
            .upsert(vec![
                record("a", vec![1.0, 0.0], "s1"),
                record("b", vec![1.0, 0.0], "s2"),
                record("c", vec![0.9, 0.1], "s1"),
                record("d", vec![0.5, 0.5], "s1"),
            ])
            .await
            .unwrap();

        let hits = store
            .query(&[1.0, 0.0], 2, &MetadataFilter::eq("session_id", "s1"))
            .await
            .unwrap();
        assert_eq!(hits.len(), 2);
        assert!(hits.iter().all(|h| h.metadata["session_id"] == "s1"));
    }

    #[tokio::test]
    async fn test_query_no_matches_is_empty() {
        let store = InMemoryVectorStore::new();
        store
            .upsert(vec![record("a", vec![1.0, 0.0], "s1")])
            .await
            .unwrap();
        let hits = store
            .query(&[1.0, 0.0], 5, &MetadataFilter::eq("session_id", "other"))
            .await
            .unwrap();
        assert!(hits.is_empty());
    }

    #[tokio::test]
    async fn test_upsert_replaces_by_id() {
        let store = InMemoryVectorStore::new();
        store
            .upsert(vec![record("a", vec![1.0, 0.0], "s1")])
            .await
            .unwrap();
        store
            .upsert(vec![record("a", vec![0.0, 1.0], "s1")])
            .await
            .unwrap();
        assert_eq!(store.len().await, 1);
    }

    #[tokio::test]
    async fn test_dimension_mismatch_rejects_whole_batch() {
        let store = InMemoryVectorStore::new();
        store
            .upsert(vec![record("a", vec![1.0, 0.0], "s1")])
            .await
            .unwrap();

        let err = store
            .upsert(vec![
                record("b", vec![1.0, 0.0], "s1"),
                record("c", vec![1.0, 0.0, 0.0], "s1"),
            ])
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            VectorStoreError::DimensionMismatch {
                expected: 2,
                actual: 3
            }
        ));
        assert_eq!(store.len().await, 1);
    }

    fn retention(max_records: usize) -> Retention {
        Retention {
            max_records,
            group_field: "session_id".to_string(),
        }
    }

    #[tokio::test]
    async fn test_bounded_store_drops_oldest_session_first() {
        let store = InMemoryVectorStore::bounded(retention(3));
        store
            .upsert(vec![
                record("s1:a", vec![1.0, 0.0], "s1"),
                record("s1:b", vec![1.0, 0.0], "s1"),
            ])
            .await
            .unwrap();
        store
            .upsert(vec![
                record("s2:a", vec![1.0, 0.0], "s2"),
                record("s2:b", vec![1.0, 0.0], "s2"),
            ])
            .await
            .unwrap();

        assert_eq!(store.len().await, 2);
        let old = store
            .query(&[1.0, 0.0], 10, &MetadataFilter::eq("session_id", "s1"))
            .await
            .unwrap();
        assert!(old.is_empty());
        let current = store
            .query(&[1.0, 0.0], 10, &MetadataFilter::eq("session_id", "s2"))
            .await
            .unwrap();
        assert_eq!(current.len(), 2);
    }

    #[tokio::test]
    async fn test_bounded_store_keeps_a_batch_larger_than_the_cap() {
        let store = InMemoryVectorStore::bounded(retention(1));
        store
            .upsert(vec![
                record("s1:a", vec![1.0, 0.0], "s1"),
                record("s1:b", vec![0.0, 1.0], "s1"),
            ])
            .await
            .unwrap();
        assert_eq!(store.len().await, 2);
    }

    #[tokio::test]
    async fn test_bounded_store_does_not_grow_across_sessions() {
        let store = InMemoryVectorStore::bounded(retention(2));
        for i in 0..5 {
            let session = format!("s{i}");
            store
                .upsert(vec![record(&format!("{session}:a"), vec![1.0, 0.0], &session)])
                .await
                .unwrap();
            assert!(store.len().await <= 2);
        }
        let latest = store
            .query(&[1.0, 0.0], 10, &MetadataFilter::eq("session_id", "s4"))
            .await
            .unwrap();
        assert_eq!(latest.len(), 1);
    }

    #[tokio::test]
    async fn test_unbounded_store_keeps_everything() {
        let store = InMemoryVectorStore::new();
        for i in 0..5 {
            let session = format!("s{i}");
            store
                .upsert(vec![record(&format!("{session}:a"), vec![1.0, 0.0], &session)])
                .await
                .unwrap();
        }
        assert_eq!(store.len().await, 5);
    }

    #[tokio::test]
    async fn test_query_dimension_mismatch_is_error() {
        let store = InMemoryVectorStore::new();
        store
            .upsert(vec![record("a", vec![1.0, 0.0], "s1")])
            .await
            .unwrap();
        let result = store
            .query(&[1.0, 0.0, 0.0], 1, &MetadataFilter::eq("session_id", "s1"))
            .await;
        assert!(matches!(
            result,
            Err(VectorStoreError::DimensionMismatch { .. })
        ));
    }
}
