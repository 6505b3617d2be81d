//! HTTP client for a text-embeddings-inference style server (`POST /embed`).

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::Serialize;
use tracing::debug;

use crate::embedding::{check_batch, Embedder, EmbeddingError};

/// Server-side limit on inputs per request.
const MAX_BATCH: usize = 32;

#[derive(Debug, Serialize)]
struct EmbedRequest<'a> {
    inputs: &'a [String],
    normalize: bool,
    truncate: bool,
}

#[derive(Clone)]
pub struct HttpEmbedder {
    client: Client,
    endpoint: String,
    model: String,
    dimension: usize,
}

impl HttpEmbedder {
    pub fn new(
        base_url: &str,
        model: String,
        dimension: usize,
        timeout: Duration,
    ) -> Result<Self, EmbeddingError> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            endpoint: format!("{}/embed", base_url.trim_end_matches('/')),
            model,
            dimension,
        })
    }

    async fn embed_batch(&self, inputs: &[String]) -> Result<Vec<Vec<f32>>, EmbeddingError> {
        let response = self
            .client
            .post(&self.endpoint)
            .json(&EmbedRequest {
                inputs,
                normalize: true,
                truncate: true,
            })
            .send()
            .await
            .map_err(EmbeddingError::from_reqwest)?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(EmbeddingError::Api {
                status: status.as_u16(),
                message,
            });
        }

        let vectors: Vec<Vec<f32>> = response
            .json()
            .await
            .map_err(EmbeddingError::from_reqwest)?;
        check_batch(&vectors, inputs.len(), self.dimension)?;
        Ok(vectors)
    }
}

#[async_trait]
impl Embedder for HttpEmbedder {
    fn model_id(&self) -> &str {
        &self.model
    }

    fn dimension(&self) -> usize {
        self.dimension
    }

    async fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, EmbeddingError> {
        let mut vectors = Vec::with_capacity(texts.len());
        for batch in texts.chunks(MAX_BATCH) {
            vectors.extend(self.embed_batch(batch).await?);
        }
        debug!("Embedded {} texts with {}", texts.len(), self.model);
        Ok(vectors)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_endpoint_strips_trailing_slash() {
        let embedder = HttpEmbedder::new(
            "http://localhost:8081/",
            "bge".to_string(),
            4,
            Duration::from_secs(1),
        )
        .unwrap();
        assert_eq!(embedder.endpoint, "http://localhost:8081/embed");
        assert_eq!(embedder.model_id(), "bge");
        assert_eq!(embedder.dimension(), 4);
    }

    #[test]
    fn test_request_serializes_tei_shape() {
        let inputs = vec!["rust engineer".to_string()];
        let body = serde_json::to_value(EmbedRequest {
            inputs: &inputs,
            normalize: true,
            truncate: true,
        })
        .unwrap();
        assert_eq!(body["inputs"][0], "rust engineer");
        assert_eq!(body["normalize"], true);
    }
}
