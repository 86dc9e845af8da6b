//! Core library for prescription image extraction and validation.
//!
//! This crate provides:
//! - Image preprocessing (RGB conversion, downscaling, JPEG re-encoding)
//! - Vision-model extraction with a time budget and transient-failure retries
//! - Lenient parsing of model answers into raw extractions
//! - Deterministic validation and confidence-based triage
//!   (`verified` / `needs_review` / `rejected`)

pub mod error;
pub mod extraction;
pub mod models;
pub mod preprocessing;
pub mod validation;

#[cfg(feature = "native")]
pub mod pipeline;

pub use error::{ExtractionError, Result, RxError};
pub use extraction::{EXTRACTION_PROMPT, parse_model_response};
pub use models::config::{
    DEFAULT_MODEL, DEFAULT_REVIEW_THRESHOLD, DEFAULT_VERIFY_THRESHOLD, ModelConfig,
    PreprocessConfig, RxConfig, ValidationConfig,
};
pub use models::prescription::{
    Medication, RawExtraction, ValidationResult, VerificationStatus, VerifiedPrescription,
};
pub use preprocessing::{ImagePreprocessor, PreparedImage};
pub use validation::Validator;

#[cfg(feature = "native")]
pub use extraction::{PrescriptionExtractor, VisionExtractor};
#[cfg(feature = "native")]
pub use pipeline::PrescriptionAnalyzer;

/// Re-export vision backend types.
#[cfg(feature = "native")]
pub use rxscan_vision::{GeminiBackend, MockBackend, VisionBackend, VisionError};
