//! Error types shared by the study log library.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum CoreError {
    /// A caller passed a value outside the accepted domain (e.g. month 13).
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// A record failed write-time validation.
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Record not found: {id}")]
    NotFound { id: String },

    /// A mutating operation was attempted without a session token.
    #[error("Not authenticated: run `studylog login --token <TOKEN>` first")]
    Unauthorized,

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

pub type CoreResult<T> = Result<T, CoreError>;
