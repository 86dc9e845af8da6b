//! Configuration structures for the extraction pipeline.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::RxError;

/// Confidence at or above which a complete record is auto-verified.
pub const DEFAULT_VERIFY_THRESHOLD: f64 = 0.85;

/// Confidence below which a record is rejected outright.
pub const DEFAULT_REVIEW_THRESHOLD: f64 = 0.50;

/// Model tag used when nothing else is configured.
pub const DEFAULT_MODEL: &str = "gemini-1.5-flash";

/// Main configuration for the rxscan pipeline.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct RxConfig {
    /// Vision model configuration.
    pub model: ModelConfig,

    /// Validation thresholds.
    pub validation: ValidationConfig,

    /// Image preprocessing configuration.
    pub preprocessing: PreprocessConfig,
}

/// Vision model access configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ModelConfig {
    /// Backend provider name.
    pub provider: String,

    /// Model identifier, also reported as `model_version`.
    pub model_name: String,

    /// API base URL.
    pub base_url: String,

    /// API key. Prefer `api_key_env` so the key stays out of config files.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    /// Environment variable consulted when `api_key` is unset.
    pub api_key_env: String,

    /// Time budget for a single model call, in seconds.
    pub timeout_secs: u64,

    /// Extra attempts after a transient failure.
    pub max_retries: u32,

    /// Delay between attempts, in milliseconds.
    pub retry_delay_ms: u64,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            provider: "gemini".to_string(),
            model_name: DEFAULT_MODEL.to_string(),
            base_url: "https://generativelanguage.googleapis.com/v1beta".to_string(),
            api_key: None,
            api_key_env: "GOOGLE_API_KEY".to_string(),
            timeout_secs: 10,
            max_retries: 1,
            retry_delay_ms: 500,
        }
    }
}

impl ModelConfig {
    /// Time budget for one call.
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// Delay between attempts.
    pub fn retry_delay(&self) -> Duration {
        Duration::from_millis(self.retry_delay_ms)
    }

    /// Resolve the API key from the config value or the named environment variable.
    pub fn resolve_api_key(&self) -> Result<String, RxError> {
        if let Some(key) = self.api_key.as_ref().filter(|k| !k.trim().is_empty()) {
            return Ok(key.clone());
        }

        std::env::var(&self.api_key_env)
            .ok()
            .filter(|k| !k.trim().is_empty())
            .ok_or_else(|| {
                RxError::Config(format!(
                    "no API key configured; set model.api_key or the {} environment variable",
                    self.api_key_env
                ))
            })
    }
}

/// Confidence thresholds driving verification status.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ValidationConfig {
    /// Minimum confidence for `verified` (with no completeness warnings).
    pub verify_threshold: f64,

    /// Minimum confidence for `needs_review`; anything lower is `rejected`.
    pub review_threshold: f64,
}

impl Default for ValidationConfig {
    fn default() -> Self {
        Self {
            verify_threshold: DEFAULT_VERIFY_THRESHOLD,
            review_threshold: DEFAULT_REVIEW_THRESHOLD,
        }
    }
}

impl ValidationConfig {
    /// Check that both thresholds are in [0, 1] and ordered.
    pub fn validate(&self) -> Result<(), RxError> {
        for (name, value) in [
            ("verify_threshold", self.verify_threshold),
            ("review_threshold", self.review_threshold),
        ] {
            if !value.is_finite() || !(0.0..=1.0).contains(&value) {
                return Err(RxError::Config(format!(
                    "validation.{} must be within [0, 1], got {}",
                    name, value
                )));
            }
        }

        if self.review_threshold > self.verify_threshold {
            return Err(RxError::Config(format!(
                "validation.review_threshold ({}) exceeds validation.verify_threshold ({})",
                self.review_threshold, self.verify_threshold
            )));
        }

        Ok(())
    }
}

/// Image preprocessing configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PreprocessConfig {
    /// Normalize and re-encode images before sending them.
    pub enabled: bool,

    /// Maximum image dimension (longer side).
    pub max_image_size: u32,

    /// JPEG quality used when re-encoding (1 - 100).
    pub jpeg_quality: u8,
}

impl Default for PreprocessConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            max_image_size: 2048,
            jpeg_quality: 95,
        }
    }
}

impl RxConfig {
    /// Load configuration from a JSON file.
    pub fn from_file(path: &std::path::Path) -> Result<Self, std::io::Error> {
        let content = std::fs::read_to_string(path)?;
        serde_json::from_str(&content).map_err(|e| {
            std::io::Error::new(std::io::ErrorKind::InvalidData, e.to_string())
        })
    }

    /// Save configuration to a JSON file.
    pub fn save(&self, path: &std::path::Path) -> Result<(), std::io::Error> {
        let content = serde_json::to_string_pretty(self).map_err(|e| {
            std::io::Error::new(std::io::ErrorKind::InvalidData, e.to_string())
        })?;
        std::fs::write(path, content)
    }

    /// Check the whole configuration for values the pipeline cannot run with.
    pub fn validate(&self) -> Result<(), RxError> {
        self.validation.validate()?;

        if self.model.timeout_secs == 0 {
            return Err(RxError::Config("model.timeout_secs must be positive".to_string()));
        }
        if self.model.model_name.trim().is_empty() {
            return Err(RxError::Config("model.model_name must not be empty".to_string()));
        }
        if self.preprocessing.max_image_size == 0 {
            return Err(RxError::Config(
                "preprocessing.max_image_size must be positive".to_string(),
            ));
        }
        if !(1..=100).contains(&self.preprocessing.jpeg_quality) {
            return Err(RxError::Config(format!(
                "preprocessing.jpeg_quality must be within 1-100, got {}",
                self.preprocessing.jpeg_quality
            )));
        }

        Ok(())
    }
}
