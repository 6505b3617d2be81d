use crate::screening::ScreeningService;

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    /// Owns the embedder, vector store and summarizer. Holds no per-session state:
    /// every request gets its own session id inside `run_screening`.
    pub screening: ScreeningService,
}
