//! Vision backend implementations.

#[cfg(feature = "gemini")]
pub mod gemini;

pub mod mock;

use async_trait::async_trait;

use crate::{Result, VisionRequest, VisionResponse};

/// Trait for vision-language model backends.
///
/// This trait abstracts over different model providers so that the
/// extraction pipeline only ever sees text coming back, never a provider's
/// wire format.
#[async_trait]
pub trait VisionBackend: Send + Sync {
    /// Send one image plus instruction and return the model's text answer.
    async fn generate(&self, request: &VisionRequest) -> Result<VisionResponse>;

    /// Identifier of the model this backend talks to.
    fn model_name(&self) -> &str;
}
