//! Deterministic validation of prescription extractions and records.

pub mod rules;

use chrono::{DateTime, Utc};
use serde_json::Value;
use tracing::debug;

use crate::error::{Result, RxError};
use crate::models::config::ValidationConfig;
use crate::models::prescription::{
    RawExtraction, ValidationResult, VerificationStatus, VerifiedPrescription,
};

use rules::confidence::low_confidence_advisory;
use rules::record::read_record;
use rules::{IssueList, RecordView, check_completeness, classify, effective_confidence};

/// Rule-based validator assigning a verification status.
///
/// Holds only thresholds, so one instance can be shared across tasks.
#[derive(Debug, Clone)]
pub struct Validator {
    config: ValidationConfig,
}

impl Default for Validator {
    fn default() -> Self {
        Self {
            config: ValidationConfig::default(),
        }
    }
}

impl Validator {
    /// Create a validator, rejecting inconsistent thresholds.
    pub fn new(config: ValidationConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &ValidationConfig {
        &self.config
    }

    /// Validate a model extraction, stamping the current time.
    pub fn validate_extraction(
        &self,
        extraction: RawExtraction,
        model_version: &str,
    ) -> VerifiedPrescription {
        self.validate_extraction_at(extraction, model_version, Utc::now())
    }

    /// Validate a model extraction with an explicit analysis time.
    pub fn validate_extraction_at(
        &self,
        extraction: RawExtraction,
        model_version: &str,
        analyzed_at: DateTime<Utc>,
    ) -> VerifiedPrescription {
        let mut warnings = IssueList::new();
        warnings.extend(extraction.warnings.iter().cloned());

        let findings = check_completeness(&RecordView::from(&extraction));
        let complete = !findings.iter().any(|f| f.blocks_verification());

        let (confidence, clamped) = effective_confidence(extraction.confidence_score);

        warnings.extend(findings.into_iter().map(|f| f.message));
        if let Some(finding) = &clamped {
            warnings.push(finding.message.clone());
        }
        if let Some(finding) = low_confidence_advisory(confidence, &self.config) {
            warnings.push(finding.message);
        }

        let mut status = classify(confidence, complete, &self.config);
        if clamped.is_some() && status == VerificationStatus::Verified {
            status = VerificationStatus::NeedsReview;
        }

        debug!(
            status = %status,
            confidence,
            complete,
            warnings = warnings.len(),
            model_version,
            "Validated extraction"
        );

        VerifiedPrescription::new(
            extraction,
            warnings.into_vec(),
            status,
            confidence,
            analyzed_at,
            model_version,
        )
    }

    /// Validate a directly supplied record.
    ///
    /// Never fails: structural problems are reported in `errors`, missing
    /// content in `warnings`.
    pub fn validate_record(&self, record: &Value) -> ValidationResult {
        let mut errors = IssueList::new();
        let mut warnings = IssueList::new();

        if let Some(fields) = read_record(record, &mut errors) {
            warnings.extend(
                check_completeness(&fields.view())
                    .into_iter()
                    .filter(|f| !fields.explains(f))
                    .map(|f| f.message),
            );

            if let Some(score) = fields.confidence.score() {
                if let Some(finding) = low_confidence_advisory(score, &self.config) {
                    warnings.push(finding.message);
                }
            }
        }

        debug!(
            errors = errors.len(),
            warnings = warnings.len(),
            "Validated record"
        );

        ValidationResult::new(warnings.into_vec(), errors.into_vec())
    }

    /// Validate a record given as JSON text.
    ///
    /// Text that is not JSON at all is a configuration-level failure of the
    /// caller, not a validation finding.
    pub fn validate_record_json(&self, json: &str) -> Result<ValidationResult> {
        let value: Value = serde_json::from_str(json)
            .map_err(|e| RxError::InvalidInput(format!("record is not valid JSON: {}", e)))?;
        Ok(self.validate_record(&value))
    }
}
