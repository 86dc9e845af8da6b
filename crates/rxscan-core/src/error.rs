//! Error types for the rxscan-core library.

use std::time::Duration;

use thiserror::Error;

/// Main error type for the rxscan library.
#[derive(Error, Debug)]
pub enum RxError {
    /// The model call or its answer failed.
    #[error("extraction error: {0}")]
    Extraction(#[from] ExtractionError),

    /// Image decoding or re-encoding failed.
    #[error("image error: {0}")]
    Image(#[from] image::ImageError),

    /// The image bytes are not in a format the model accepts.
    #[error("unsupported image: {0}")]
    UnsupportedImage(String),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Input that is not well-formed enough to validate.
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// Configuration error.
    #[error("configuration error: {0}")]
    Config(String),
}

/// Errors raised while turning an image into a raw extraction.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ExtractionError {
    /// Connection to the model failed.
    #[error("model transport failed: {0}")]
    Transport(String),

    /// The model call exceeded its time budget.
    #[error("model call timed out after {0:?}")]
    Timeout(Duration),

    /// The model endpoint returned a non-success status.
    #[error("model endpoint returned HTTP {status}: {body}")]
    Http { status: u16, body: String },

    /// Credentials were rejected.
    #[error("model credentials rejected: {0}")]
    Unauthorized(String),

    /// The model answered without any text.
    #[error("model returned no content: {0}")]
    EmptyResponse(String),

    /// The backend itself is unusable (bad client setup).
    #[error("model backend unavailable: {0}")]
    Backend(String),

    /// The model answered but the answer is not a usable JSON record.
    #[error("failed to parse model output ({reason}): {excerpt}")]
    Parse { reason: String, excerpt: String },
}

impl ExtractionError {
    /// Whether a retry is worth attempting.
    pub fn is_transient(&self) -> bool {
        match self {
            ExtractionError::Transport(_) | ExtractionError::Timeout(_) => true,
            ExtractionError::Http { status, .. } => *status == 429 || *status >= 500,
            ExtractionError::Unauthorized(_)
            | ExtractionError::EmptyResponse(_)
            | ExtractionError::Backend(_)
            | ExtractionError::Parse { .. } => false,
        }
    }
}

#[cfg(feature = "native")]
impl ExtractionError {
    /// Convert a backend failure, recording `budget` for timeouts the
    /// backend reported itself.
    pub fn from_vision(err: rxscan_vision::VisionError, budget: Duration) -> Self {
        use rxscan_vision::VisionError;

        match err {
            VisionError::Transport(msg) => ExtractionError::Transport(msg),
            VisionError::Timeout(_) => ExtractionError::Timeout(budget),
            VisionError::Http { status, body } => ExtractionError::Http { status, body },
            VisionError::Unauthorized(msg) => ExtractionError::Unauthorized(msg),
            VisionError::EmptyResponse(msg) => ExtractionError::EmptyResponse(msg),
            VisionError::Config(msg) => ExtractionError::Backend(msg),
        }
    }
}

/// Result type for the rxscan library.
pub type Result<T> = std::result::Result<T, RxError>;
