//! End-to-end analysis: preprocess, extract, validate.

use std::time::Instant;

use tracing::{debug, info};

use crate::error::Result;
use crate::extraction::PrescriptionExtractor;
use crate::models::config::RxConfig;
use crate::models::prescription::VerifiedPrescription;
use crate::preprocessing::ImagePreprocessor;
use crate::validation::Validator;

/// Runs one prescription image through the whole pipeline.
///
/// Stateless between calls; share it by reference across tasks.
pub struct PrescriptionAnalyzer<E> {
    preprocessor: ImagePreprocessor,
    extractor: E,
    validator: Validator,
}

impl<E: PrescriptionExtractor> PrescriptionAnalyzer<E> {
    pub fn new(extractor: E, preprocessor: ImagePreprocessor, validator: Validator) -> Self {
        Self {
            preprocessor,
            extractor,
            validator,
        }
    }

    /// Build an analyzer from configuration, checking it first.
    pub fn from_config(extractor: E, config: &RxConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self::new(
            extractor,
            ImagePreprocessor::from_config(&config.preprocessing),
            Validator::new(config.validation)?,
        ))
    }

    pub fn extractor(&self) -> &E {
        &self.extractor
    }

    pub fn validator(&self) -> &Validator {
        &self.validator
    }

    /// Analyze raw image bytes.
    ///
    /// Fails if the image cannot be prepared or the model gives no usable
    /// answer; a record is only produced from an actual extraction.
    pub async fn analyze(&self, image_bytes: &[u8]) -> Result<VerifiedPrescription> {
        let start = Instant::now();

        let image = self.preprocessor.prepare(image_bytes)?;
        debug!(
            width = image.width,
            height = image.height,
            bytes = image.bytes.len(),
            "Prepared image"
        );

        let extraction = self.extractor.extract(&image).await?;
        let record = self
            .validator
            .validate_extraction(extraction, self.extractor.model_version());

        info!(
            status = %record.verification_status(),
            confidence = record.confidence_score(),
            elapsed_ms = start.elapsed().as_millis() as u64,
            "Analyzed prescription"
        );

        Ok(record)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{ExtractionError, RxError};
    use crate::extraction::VisionExtractor;
    use crate::models::prescription::VerificationStatus;
    use image::{DynamicImage, ImageFormat, Rgb, RgbImage};
    use pretty_assertions::assert_eq;
    use rxscan_vision::MockBackend;
    use std::io::Cursor;
    use std::time::Duration;

    const ANSWER: &str = r#"```json
{
  "patient_name": "John Doe",
  "doctor_name": "Dr. Jane Smith",
  "date": "2024-11-26",
  "medications": [
    {"name": "Amoxicillin", "dosage": "500mg", "frequency": "three times daily", "duration": "7 days"}
  ],
  "special_instructions": "Take with food",
  "warnings": [],
  "verification_status": "needs_review",
  "confidence_score": 0.92
}
```"#;

    fn png() -> Vec<u8> {
        let image = RgbImage::from_pixel(32, 16, Rgb([255, 255, 255]));
        let mut bytes = Vec::new();
        DynamicImage::ImageRgb8(image)
            .write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png)
            .unwrap();
        bytes
    }

    fn analyzer(backend: MockBackend) -> PrescriptionAnalyzer<VisionExtractor<MockBackend>> {
        let extractor = VisionExtractor::new(backend).with_retries(1, Duration::from_millis(1));
        PrescriptionAnalyzer::from_config(extractor, &RxConfig::default()).unwrap()
    }

    #[tokio::test]
    async fn test_analyze_verified_prescription() {
        let analyzer = analyzer(MockBackend::new("gemini-1.5-flash").with_response(ANSWER));
        let record = analyzer.analyze(&png()).await.unwrap();

        assert_eq!(record.verification_status(), VerificationStatus::Verified);
        assert_eq!(record.confidence_score(), 0.92);
        assert_eq!(record.accuracy_percentage(), 92.0);
        assert_eq!(record.model_version(), "gemini-1.5-flash");
        assert_eq!(record.medications().len(), 1);
    }

    #[tokio::test]
    async fn test_unreadable_image_never_reaches_model() {
        let analyzer = analyzer(MockBackend::new("m").with_response(ANSWER));
        let err = analyzer.analyze(b"definitely not an image").await.unwrap_err();

        assert!(matches!(err, RxError::Image(_)));
        assert_eq!(analyzer.extractor().backend().calls(), 0);
    }

    #[tokio::test]
    async fn test_model_failure_aborts() {
        let analyzer = analyzer(MockBackend::new("m").with_response("no idea"));
        let err = analyzer.analyze(&png()).await.unwrap_err();

        assert!(matches!(err, RxError::Extraction(ExtractionError::Parse { .. })));
    }

    #[test]
    fn test_invalid_config_rejected() {
        let mut config = RxConfig::default();
        config.validation.review_threshold = 0.9;
        let extractor = VisionExtractor::new(MockBackend::new("m"));

        assert!(PrescriptionAnalyzer::from_config(extractor, &config).is_err());
    }
}
