//! Axum route handlers for the Screening API.

use axum::{
    extract::{Multipart, State},
    Json,
};

use crate::errors::AppError;
use crate::screening::extract::ResumeFile;
use crate::screening::pipeline::{ScreeningOutcome, ScreeningRequest};
use crate::state::AppState;

/// Used when the form omits `desired_count`.
const DEFAULT_DESIRED_COUNT: usize = 5;

/// POST /api/v1/screenings
///
/// Multipart form: `job_description` (text), `desired_count` (integer, optional),
/// one or more `resumes` file parts. File parts under any other name are ignored.
/// Returns the ranked shortlist or a `no_results` outcome.
pub async fn handle_create_screening(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<Json<ScreeningOutcome>, AppError> {
    let request = read_screening_form(&mut multipart).await?;
    let outcome = state.screening.run_screening(request).await?;
    Ok(Json(outcome))
}

async fn read_screening_form(multipart: &mut Multipart) -> Result<ScreeningRequest, AppError> {
    let malformed = |e: axum::extract::multipart::MultipartError| {
        AppError::Validation(format!("Malformed upload: {e}"))
    };

    let mut job_description = String::new();
    let mut desired_count = DEFAULT_DESIRED_COUNT;
    let mut resumes = Vec::new();

    while let Some(field) = multipart.next_field().await.map_err(malformed)? {
        let name = field.name().unwrap_or_default().to_string();
        let file_name = field.file_name().map(str::to_string);

        match (name.as_str(), file_name) {
            ("job_description", None) => {
                job_description = field.text().await.map_err(malformed)?;
            }
            ("desired_count", None) => {
                let raw = field.text().await.map_err(malformed)?;
                desired_count = parse_desired_count(&raw)?;
            }
            ("resumes", Some(file_name)) => {
                let bytes = field.bytes().await.map_err(malformed)?;
                resumes.push(ResumeFile::new(file_name, bytes));
            }
            (other, Some(file_name)) => {
                tracing::debug!("Ignoring file '{file_name}' sent as form field '{other}'");
            }
            (other, None) => {
                tracing::debug!("Ignoring unknown form field '{other}'");
            }
        }
    }

    Ok(ScreeningRequest {
        job_description,
        resumes,
        desired_count,
    })
}

fn parse_desired_count(raw: &str) -> Result<usize, AppError> {
    raw.trim()
        .parse::<usize>()
        .map_err(|_| AppError::Validation(format!("desired_count must be a whole number, got '{raw}'")))
}
