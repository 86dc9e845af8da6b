//! Request and response types exchanged with a vision backend.

/// A single image-plus-instruction request.
#[derive(Debug, Clone)]
pub struct VisionRequest {
    /// Instruction text sent alongside the image.
    pub prompt: String,

    /// Encoded image bytes.
    pub image: Vec<u8>,

    /// MIME type of `image` (e.g. `image/jpeg`).
    pub mime_type: String,
}

impl VisionRequest {
    /// Create a new request.
    pub fn new(prompt: impl Into<String>, image: Vec<u8>, mime_type: impl Into<String>) -> Self {
        Self {
            prompt: prompt.into(),
            image,
            mime_type: mime_type.into(),
        }
    }
}

/// Text answer produced by a vision backend.
#[derive(Debug, Clone, PartialEq)]
pub struct VisionResponse {
    /// Raw text produced by the model.
    pub text: String,

    /// Model identifier that produced the answer.
    pub model: String,

    /// Round-trip latency in milliseconds.
    pub latency_ms: u64,
}
