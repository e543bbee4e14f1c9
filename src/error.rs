use thiserror::Error;

use crate::services::form_validation::FieldErrors;

/// Failures surfaced by the desk workflows. All of them are recoverable by
/// the user retrying or correcting input.
#[derive(Debug, Error)]
pub enum DeskError {
    #[error("no record matches {0}")]
    NotFound(String),

    #[error("capture device unavailable: {0}")]
    CaptureUnavailable(String),

    #[error("validation failed for {} field(s)", .0.len())]
    ValidationFailed(FieldErrors),

    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}

pub type DeskResult<T> = Result<T, DeskError>;
