//! Vision-language model abstraction layer for rxscan.
//!
//! This crate provides a unified interface for sending an image plus an
//! instruction to a vision-language model and getting text back:
//! - `GeminiBackend` talks to the Google Generative Language REST API
//! - `MockBackend` replays scripted answers for tests and offline runs

mod backend;
mod error;
mod request;

pub use backend::VisionBackend;
pub use backend::mock::{MockBackend, MockReply};
pub use error::VisionError;
pub use request::{VisionRequest, VisionResponse};

#[cfg(feature = "gemini")]
pub use backend::gemini::GeminiBackend;

/// Result type for vision operations.
pub type Result<T> = std::result::Result<T, VisionError>;
