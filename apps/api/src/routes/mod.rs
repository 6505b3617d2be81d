pub mod health;

use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};

use crate::screening::handlers;
use crate::state::AppState;

pub fn build_router(state: AppState, max_upload_bytes: usize) -> Router {
    Router::new()
        .route("/health", get(health::health_handler))
        // Screening API
        .route(
            "/api/v1/screenings",
            post(handlers::handle_create_screening),
        )
        .layer(DefaultBodyLimit::max(max_upload_bytes))
        .with_state(state)
}
