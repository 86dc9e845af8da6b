//! Error types for the vision layer.

use thiserror::Error;

/// Errors that can occur while calling a vision-language model.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum VisionError {
    /// Connection could not be established or was dropped.
    #[error("transport error: {0}")]
    Transport(String),

    /// The model did not answer within the allotted time.
    #[error("request timed out: {0}")]
    Timeout(String),

    /// The endpoint answered with a non-success status.
    #[error("HTTP {status}: {body}")]
    Http { status: u16, body: String },

    /// Credentials were rejected (401/403).
    #[error("unauthorized: {0}")]
    Unauthorized(String),

    /// The model answered but produced no text.
    #[error("empty response: {0}")]
    EmptyResponse(String),

    /// The backend could not be constructed.
    #[error("configuration error: {0}")]
    Config(String),
}

impl VisionError {
    /// Whether a second attempt has a reasonable chance of succeeding.
    ///
    /// Rate limiting and server-side failures are transient; anything the
    /// model actually said, or a rejected credential, is not.
    pub fn is_transient(&self) -> bool {
        match self {
            VisionError::Transport(_) | VisionError::Timeout(_) => true,
            VisionError::Http { status, .. } => *status == 429 || *status >= 500,
            VisionError::Unauthorized(_)
            | VisionError::EmptyResponse(_)
            | VisionError::Config(_) => false,
        }
    }
}
