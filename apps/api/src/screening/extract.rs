//! Text extraction from uploaded resume files.
//!
//! PDF parsing is CPU-bound and can panic on malformed input, so each file is parsed
//! inside `tokio::task::spawn_blocking`; a panic becomes an `ExtractionError` for that
//! file only.

use bytes::Bytes;
use thiserror::Error;

/// An uploaded resume as received from the client.
#[derive(Debug, Clone)]
pub struct ResumeFile {
    pub name: String,
    pub bytes: Bytes,
}

impl ResumeFile {
    pub fn new(name: impl Into<String>, bytes: impl Into<Bytes>) -> Self {
        Self {
            name: name.into(),
            bytes: bytes.into(),
        }
    }

    pub fn size(&self) -> u64 {
        self.bytes.len() as u64
    }
}

#[derive(Debug, Error)]
pub enum ExtractionError {
    #[error("could not read PDF: {0}")]
    Pdf(String),

    #[error("unsupported file type: {0}")]
    UnsupportedFormat(String),

    #[error("extraction aborted: {0}")]
    Aborted(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FileKind {
    Pdf,
    PlainText,
}

fn detect_kind(file: &ResumeFile) -> Option<FileKind> {
    let name = file.name.to_ascii_lowercase();
    if file.bytes.starts_with(b"%PDF") || name.ends_with(".pdf") {
        Some(FileKind::Pdf)
    } else if name.ends_with(".txt") || name.ends_with(".md") {
        Some(FileKind::PlainText)
    } else {
        None
    }
}

/// Extracts raw text from a single file. May return an empty string for a readable
/// file that contains no text (e.g. a scanned PDF).
pub fn extract_text(file: &ResumeFile) -> Result<String, ExtractionError> {
    match detect_kind(file) {
        Some(FileKind::Pdf) => pdf_extract::extract_text_from_mem(&file.bytes)
            .map_err(|e| ExtractionError::Pdf(e.to_string())),
        Some(FileKind::PlainText) => Ok(String::from_utf8_lossy(&file.bytes).into_owned()),
        None => Err(ExtractionError::UnsupportedFormat(file.name.clone())),
    }
}

/// Runs `extract_text` off the async executor.
pub async fn extract_text_blocking(file: ResumeFile) -> Result<String, ExtractionError> {
    tokio::task::spawn_blocking(move || extract_text(&file))
        .await
        .map_err(|e| ExtractionError::Aborted(e.to_string()))?
}
