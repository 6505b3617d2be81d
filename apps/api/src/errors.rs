use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

use crate::screening::pipeline::ScreeningError;

/// Application-level error type.
/// Implements `IntoResponse` so Axum handlers can return `Result<T, AppError>`.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Validation error: {0}")]
    Validation(String),

    #[error(transparent)]
    Screening(#[from] ScreeningError),
}

impl AppError {
    fn parts(&self) -> (StatusCode, &'static str, String) {
        match self {
            AppError::Validation(msg) => (StatusCode::BAD_REQUEST, "VALIDATION_ERROR", msg.clone()),
            AppError::Screening(ScreeningError::Input(e)) => {
                (StatusCode::BAD_REQUEST, "VALIDATION_ERROR", e.to_string())
            }
            AppError::Screening(e @ ScreeningError::Indexing(_)) => {
                tracing::error!("Indexing error: {e}");
                (StatusCode::BAD_GATEWAY, "INDEXING_ERROR", e.to_string())
            }
            AppError::Screening(e @ ScreeningError::Retrieval(_)) => {
                tracing::error!("Retrieval error: {e}");
                (StatusCode::BAD_GATEWAY, "RETRIEVAL_ERROR", e.to_string())
            }
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code, message) = self.parts();

        let body = Json(json!({
            "error": {
                "code": code,
                "message": message
            }
        }));

        (status, body).into_response()
    }
}
