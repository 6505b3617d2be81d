mod config;
mod embedding;
mod errors;
mod llm_client;
mod models;
mod routes;
mod screening;
mod state;
mod vector_store;

use anyhow::Result;
use std::net::SocketAddr;
use std::sync::Arc;
use tower::ServiceBuilder;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::{Config, VectorStoreConfig};
use crate::embedding::{Embedder, HttpEmbedder};
use crate::llm_client::LlmClient;
use crate::routes::build_router;
use crate::screening::summarizer::LlmSummarizer;
use crate::screening::ScreeningService;
use crate::state::AppState;
use crate::screening::indexer::META_SESSION_ID;
use crate::vector_store::{InMemoryVectorStore, PineconeStore, Retention, VectorStore};

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration first (fails fast on missing required env vars)
    let config = Config::from_env()?;

    // Initialize structured logging
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!(
                "{}={}",
                env!("CARGO_CRATE_NAME"),
                &config.rust_log
            ))
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting Screener API v{}", env!("CARGO_PKG_VERSION"));

    // Initialize embedding client (shared by indexing and retrieval)
    let embedder: Arc<dyn Embedder> = Arc::new(HttpEmbedder::new(
        &config.embedding_url,
        config.embedding_model.clone(),
        config.embedding_dimension,
        config.http_timeout,
    )?);
    info!(
        "Embedding client initialized (model: {}, dim: {})",
        embedder.model_id(),
        embedder.dimension()
    );

    // Initialize vector store
    let store = build_vector_store(&config)?;
    info!("Vector store initialized (backend: {})", store.backend());

    // Initialize LLM client + summarizer
    // Per-attempt timeout; the summarizer bounds the whole retrying call.
    let llm = LlmClient::new(config.anthropic_api_key.clone(), config.http_timeout)?;
    info!("LLM client initialized (model: {})", llm_client::MODEL);
    let summarizer = Arc::new(LlmSummarizer::new(llm, config.summary_timeout));

    let screening = ScreeningService::new(
        embedder,
        store,
        summarizer,
        config.screening_settings(),
    );
    info!("Screening settings: {:?}", screening.settings());

    // Build app state
    let state = AppState { screening };

    // Build router
    let app = build_router(state, config.max_upload_bytes).layer(
        ServiceBuilder::new()
            .layer(TraceLayer::new_for_http())
            .layer(CorsLayer::permissive()), // TODO: restrict CORS origins to the UI host
    );

    let addr: SocketAddr = format!("0.0.0.0:{}", config.port).parse()?;
    info!("Listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

/// Constructs the vector store selected by `VECTOR_STORE`.
fn build_vector_store(config: &Config) -> Result<Arc<dyn VectorStore>> {
    Ok(match &config.vector_store {
        VectorStoreConfig::Memory { max_records } => {
            Arc::new(InMemoryVectorStore::bounded(Retention {
                max_records: *max_records,
                group_field: META_SESSION_ID.to_string(),
            }))
        }
        VectorStoreConfig::Pinecone {
            api_key,
            index_host,
            namespace,
        } => Arc::new(PineconeStore::new(
            index_host,
            api_key.clone(),
            namespace.clone(),
            config.http_timeout,
        )?),
    })
}
