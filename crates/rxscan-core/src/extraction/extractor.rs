//! Vision-model extractor with a per-call time budget and retries.

use std::time::Duration;

use async_trait::async_trait;
use rxscan_vision::{VisionBackend, VisionRequest};
use tracing::{debug, warn};

use super::{PrescriptionExtractor, parse_model_response, prompt::EXTRACTION_PROMPT};
use crate::error::ExtractionError;
use crate::models::config::ModelConfig;
use crate::models::prescription::RawExtraction;
use crate::preprocessing::PreparedImage;

/// Extractor sending images to a [`VisionBackend`].
pub struct VisionExtractor<B> {
    backend: B,
    timeout: Duration,
    max_retries: u32,
    retry_delay: Duration,
}

impl<B: VisionBackend> VisionExtractor<B> {
    /// Create an extractor with the default time budget and retry policy.
    pub fn new(backend: B) -> Self {
        Self::from_config(backend, &ModelConfig::default())
    }

    pub fn from_config(backend: B, config: &ModelConfig) -> Self {
        Self {
            backend,
            timeout: config.timeout(),
            max_retries: config.max_retries,
            retry_delay: config.retry_delay(),
        }
    }

    /// Set the time budget of a single model call.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Set how many extra attempts follow a transient failure.
    pub fn with_retries(mut self, max_retries: u32, delay: Duration) -> Self {
        self.max_retries = max_retries;
        self.retry_delay = delay;
        self
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    async fn attempt(&self, request: &VisionRequest) -> Result<RawExtraction, ExtractionError> {
        let response = tokio::time::timeout(self.timeout, self.backend.generate(request))
            .await
            .map_err(|_| ExtractionError::Timeout(self.timeout))?
            .map_err(|e| ExtractionError::from_vision(e, self.timeout))?;

        debug!(
            model = %response.model,
            latency_ms = response.latency_ms,
            chars = response.text.len(),
            "Model answered"
        );

        parse_model_response(&response.text)
    }
}

#[async_trait]
impl<B: VisionBackend> PrescriptionExtractor for VisionExtractor<B> {
    async fn extract(&self, image: &PreparedImage) -> Result<RawExtraction, ExtractionError> {
        let request = VisionRequest::new(EXTRACTION_PROMPT, image.bytes.clone(), image.mime_type.clone());

        let mut retries = 0;
        loop {
            match self.attempt(&request).await {
                Ok(extraction) => return Ok(extraction),
                Err(err) if err.is_transient() && retries < self.max_retries => {
                    retries += 1;
                    warn!(
                        retry = retries,
                        max_retries = self.max_retries,
                        error = %err,
                        "Model call failed, retrying"
                    );
                    tokio::time::sleep(self.retry_delay).await;
                }
                Err(err) => return Err(err),
            }
        }
    }

    fn model_version(&self) -> &str {
        self.backend.model_name()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rxscan_vision::{MockBackend, VisionError};

    const ANSWER: &str = r#"{"patient_name": "John Doe", "medications": [{"name": "Amoxicillin"}], "confidence_score": 0.9}"#;

    fn image() -> PreparedImage {
        PreparedImage {
            bytes: vec![0xFF, 0xD8, 0xFF],
            mime_type: "image/jpeg".to_string(),
            width: 1,
            height: 1,
        }
    }

    fn extractor(backend: MockBackend) -> VisionExtractor<MockBackend> {
        VisionExtractor::new(backend)
            .with_timeout(Duration::from_secs(2))
            .with_retries(1, Duration::from_millis(1))
    }

    #[tokio::test]
    async fn test_successful_extraction() {
        let extractor = extractor(MockBackend::new("gemini-1.5-flash").with_response(ANSWER));
        let extraction = extractor.extract(&image()).await.unwrap();

        assert_eq!(extraction.patient_name.as_deref(), Some("John Doe"));
        assert_eq!(extractor.model_version(), "gemini-1.5-flash");
        assert_eq!(extractor.backend().calls(), 1);
    }

    #[tokio::test]
    async fn test_transport_failure_then_success() {
        let backend = MockBackend::new("m")
            .with_error(VisionError::Transport("connection reset".into()))
            .with_response(ANSWER);
        let extractor = extractor(backend);

        let extraction = extractor.extract(&image()).await.unwrap();
        assert_eq!(extraction.confidence_score, Some(0.9));
        assert_eq!(extractor.backend().calls(), 2);
    }

    #[tokio::test]
    async fn test_retries_are_bounded() {
        let backend = MockBackend::new("m").with_error(VisionError::Http {
            status: 503,
            body: "overloaded".into(),
        });
        let extractor = extractor(backend);

        let err = extractor.extract(&image()).await.unwrap_err();
        assert_eq!(err, ExtractionError::Http { status: 503, body: "overloaded".into() });
        assert_eq!(extractor.backend().calls(), 2);
    }

    #[tokio::test]
    async fn test_parse_failure_is_not_retried() {
        let backend = MockBackend::new("m").with_response("I cannot read this prescription.");
        let extractor = extractor(backend).with_retries(3, Duration::from_millis(1));

        let err = extractor.extract(&image()).await.unwrap_err();
        assert!(matches!(err, ExtractionError::Parse { .. }));
        assert_eq!(extractor.backend().calls(), 1);
    }

    #[tokio::test]
    async fn test_unauthorized_is_not_retried() {
        let backend = MockBackend::new("m").with_error(VisionError::Unauthorized("bad key".into()));
        let extractor = extractor(backend);

        let err = extractor.extract(&image()).await.unwrap_err();
        assert!(matches!(err, ExtractionError::Unauthorized(_)));
        assert_eq!(extractor.backend().calls(), 1);
    }

    #[tokio::test]
    async fn test_slow_backend_times_out() {
        let backend = MockBackend::new("m")
            .with_response(ANSWER)
            .with_delay(Duration::from_millis(500));
        let extractor = extractor(backend)
            .with_timeout(Duration::from_millis(20))
            .with_retries(0, Duration::ZERO);

        let err = extractor.extract(&image()).await.unwrap_err();
        assert_eq!(err, ExtractionError::Timeout(Duration::from_millis(20)));
    }
}
