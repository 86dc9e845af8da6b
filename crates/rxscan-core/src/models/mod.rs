//! Data models and configuration.

pub mod config;
pub mod prescription;

pub use config::{ModelConfig, PreprocessConfig, RxConfig, ValidationConfig};
pub use prescription::{
    Medication, RawExtraction, ValidationResult, VerificationStatus, VerifiedPrescription,
};
