//! Pinecone data-plane client (`/vectors/upsert`, `/query`).
//!
//! The index must be created with the cosine metric so returned scores are similarities.
//! Passage text travels in the `text` metadata field.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, warn};

use crate::vector_store::{
    Metadata, MetadataFilter, QueryMatch, VectorRecord, VectorStore, VectorStoreError,
};

/// Pinecone's recommended upsert batch size.
const UPSERT_BATCH: usize = 100;
const TEXT_FIELD: &str = "text";

#[derive(Debug, Serialize)]
struct PineconeVector<'a> {
    id: &'a str,
    values: &'a [f32],
    metadata: Metadata,
}

#[derive(Debug, Serialize)]
struct UpsertRequest<'a> {
    vectors: Vec<PineconeVector<'a>>,
    #[serde(skip_serializing_if = "str::is_empty")]
    namespace: &'a str,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct QueryRequest<'a> {
    vector: &'a [f32],
    top_k: usize,
    filter: Value,
    include_metadata: bool,
    #[serde(skip_serializing_if = "str::is_empty")]
    namespace: &'a str,
}

#[derive(Debug, Deserialize)]
struct QueryResponse {
    #[serde(default)]
    matches: Vec<PineconeMatch>,
}

#[derive(Debug, Deserialize)]
struct PineconeMatch {
    id: String,
    score: f32,
    #[serde(default)]
    metadata: Metadata,
}

#[derive(Clone)]
pub struct PineconeStore {
    client: Client,
    host: String,
    api_key: String,
    namespace: String,
}

impl PineconeStore {
    pub fn new(
        host: &str,
        api_key: String,
        namespace: String,
        timeout: Duration,
    ) -> Result<Self, VectorStoreError> {
        let host = host.trim_end_matches('/');
        let host = if host.starts_with("http://") || host.starts_with("https://") {
            host.to_string()
        } else {
            format!("https://{host}")
        };
        Ok(Self {
            client: Client::builder().timeout(timeout).build()?,
            host,
            api_key,
            namespace,
        })
    }

    async fn post<T: Serialize>(
        &self,
        path: &str,
        body: &T,
    ) -> Result<reqwest::Response, VectorStoreError> {
        let response = self
            .client
            .post(format!("{}{path}", self.host))
            .header("Api-Key", &self.api_key)
            .json(body)
            .send()
            .await
            .map_err(VectorStoreError::from_reqwest)?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            warn!("Pinecone {path} returned {status}: {message}");
            return Err(VectorStoreError::Api {
                status: status.as_u16(),
                message,
            });
        }
        Ok(response)
    }
}

fn to_pinecone_vector(record: &VectorRecord) -> PineconeVector<'_> {
    let mut metadata = record.metadata.clone();
    metadata.insert(TEXT_FIELD.to_string(), Value::String(record.text.clone()));
    PineconeVector {
        id: &record.id,
        values: &record.vector,
        metadata,
    }
}

fn into_query_match(m: PineconeMatch) -> QueryMatch {
    let mut metadata = m.metadata;
    let text = match metadata.remove(TEXT_FIELD) {
        Some(Value::String(s)) => s,
        _ => String::new(),
    };
    QueryMatch {
        id: m.id,
        text,
        metadata,
        score: m.score,
    }
}

#[async_trait]
impl VectorStore for PineconeStore {
    async fn upsert(&self, records: Vec<VectorRecord>) -> Result<(), VectorStoreError> {
        for batch in records.chunks(UPSERT_BATCH) {
            let body = UpsertRequest {
                vectors: batch.iter().map(to_pinecone_vector).collect(),
                namespace: &self.namespace,
            };
            self.post("/vectors/upsert", &body).await?;
        }
        debug!("Pinecone upserted {} records", records.len());
        Ok(())
    }

    async fn query(
        &self,
        vector: &[f32],
        k: usize,
        filter: &MetadataFilter,
    ) -> Result<Vec<QueryMatch>, VectorStoreError> {
        if k == 0 {
            return Ok(Vec::new());
        }
        let body = QueryRequest {
            vector,
            top_k: k,
            filter: filter.to_pinecone(),
            include_metadata: true,
            namespace: &self.namespace,
        };
        let response: QueryResponse = self
            .post("/query", &body)
            .await?
            .json()
            .await
            .map_err(VectorStoreError::from_reqwest)?;

        let mut matches: Vec<QueryMatch> =
            response.matches.into_iter().map(into_query_match).collect();
        matches.sort_by(|a, b| b.score.total_cmp(&a.score));
        Ok(matches)
    }

    fn backend(&self) -> &'static str {
        "pinecone"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_host_gets_https_scheme() {
        let store = PineconeStore::new(
            "recruiter-abc.svc.pinecone.io/",
            "key".to_string(),
            String::new(),
            Duration::from_secs(1),
        )
        .unwrap();
        assert_eq!(store.host, "https://recruiter-abc.svc.pinecone.io");
    }

    #[test]
    fn test_query_request_shape() {
        let vector = [0.1_f32, 0.2];
        let body = serde_json::to_value(QueryRequest {
            vector: &vector,
            top_k: 25,
            filter: MetadataFilter::eq("session_id", "abc").to_pinecone(),
            include_metadata: true,
            namespace: "",
        })
        .unwrap();
        assert_eq!(body["topK"], 25);
        assert_eq!(body["includeMetadata"], true);
        assert_eq!(body["filter"], json!({"session_id": {"$eq": "abc"}}));
        assert!(body.get("namespace").is_none());
    }

    #[test]
    fn test_text_moves_into_metadata_and_back() {
        let mut metadata = Metadata::new();
        metadata.insert("name".to_string(), json!("a.pdf"));
        let record = VectorRecord {
            id: "s:a.pdf:0".to_string(),
            vector: vec![1.0],
            text: "Rust, Kafka".to_string(),
            metadata,
        };
        let outgoing = to_pinecone_vector(&record);
        assert_eq!(outgoing.metadata[TEXT_FIELD], "Rust, Kafka");

        let back = into_query_match(PineconeMatch {
            id: record.id.clone(),
            score: 0.8,
            metadata: outgoing.metadata,
        });
        assert_eq!(back.text, "Rust, Kafka");
        assert!(!back.metadata.contains_key(TEXT_FIELD));
        assert_eq!(back.metadata["name"], "a.pdf");
    }

    #[test]
    fn test_query_response_tolerates_missing_matches() {
        let parsed: QueryResponse = serde_json::from_str(r#"{"namespace": ""}"#).unwrap();
        assert!(parsed.matches.is_empty());
    }
}
