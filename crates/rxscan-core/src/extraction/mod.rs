//! Turning prescription images into raw extractions.

pub mod prompt;
mod response;

#[cfg(feature = "native")]
mod extractor;

pub use prompt::EXTRACTION_PROMPT;
pub use response::parse_model_response;

#[cfg(feature = "native")]
pub use extractor::VisionExtractor;

#[cfg(feature = "native")]
use crate::{
    error::ExtractionError, models::prescription::RawExtraction, preprocessing::PreparedImage,
};

/// Something that reads a prescription image into an unvalidated extraction.
#[cfg(feature = "native")]
#[async_trait::async_trait]
pub trait PrescriptionExtractor: Send + Sync {
    /// Extract prescription fields from a prepared image.
    async fn extract(&self, image: &PreparedImage) -> Result<RawExtraction, ExtractionError>;

    /// Tag of the model producing the extractions.
    fn model_version(&self) -> &str;
}
