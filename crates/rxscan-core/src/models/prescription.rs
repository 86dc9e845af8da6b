//! Prescription data models: raw model output and validated records.

use chrono::{DateTime, SecondsFormat, Utc};
use serde::ser::{SerializeStruct, Serializer};
use serde::{Deserialize, Serialize};

use crate::validation::rules::confidence::accuracy_percentage;

/// A single prescribed medication.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Medication {
    /// Drug name. A medication without a name is not counted as present.
    pub name: String,

    /// Dosage amount and unit (e.g. "500mg").
    pub dosage: String,

    /// How often to take it.
    pub frequency: String,

    /// Treatment duration.
    pub duration: String,
}

impl Medication {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    pub fn with_dosage(mut self, dosage: impl Into<String>) -> Self {
        self.dosage = dosage.into();
        self
    }

    pub fn with_frequency(mut self, frequency: impl Into<String>) -> Self {
        self.frequency = frequency.into();
        self
    }

    pub fn with_duration(mut self, duration: impl Into<String>) -> Self {
        self.duration = duration.into();
        self
    }

    /// Whether the medication carries a usable name.
    pub fn has_name(&self) -> bool {
        !self.name.trim().is_empty()
    }
}

/// Unvalidated structured guess produced by the extractor.
///
/// Fields the model could not read are `None` or empty; nothing here is
/// filled in by the pipeline itself.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RawExtraction {
    pub patient_name: Option<String>,
    pub doctor_name: Option<String>,

    /// Prescription date as written or normalized by the model.
    pub date: Option<String>,

    pub medications: Vec<Medication>,
    pub special_instructions: Option<String>,

    /// Warnings reported by the model, in order, without duplicates.
    pub warnings: Vec<String>,

    /// Model-reported confidence. `None` counts as 0.
    pub confidence_score: Option<f64>,
}

impl RawExtraction {
    /// Add a warning unless an identical one is already present.
    pub fn push_warning(&mut self, warning: impl Into<String>) {
        let warning = warning.into();
        if !self.warnings.contains(&warning) {
            self.warnings.push(warning);
        }
    }
}

/// Terminal classification of a prescription record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VerificationStatus {
    /// Safe to auto-accept.
    Verified,
    /// Usable, but a human must check it.
    NeedsReview,
    /// Too unreliable to use.
    Rejected,
}

impl VerificationStatus {
    /// Wire name of the status.
    pub fn as_str(&self) -> &'static str {
        match self {
            VerificationStatus::Verified => "verified",
            VerificationStatus::NeedsReview => "needs_review",
            VerificationStatus::Rejected => "rejected",
        }
    }
}

impl std::fmt::Display for VerificationStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A validated prescription with its confidence-based status.
///
/// Only the validator creates these; once created a record never changes.
/// A changed input needs a fresh validation.
#[derive(Debug, Clone, PartialEq)]
pub struct VerifiedPrescription {
    patient_name: Option<String>,
    doctor_name: Option<String>,
    date: Option<String>,
    medications: Vec<Medication>,
    special_instructions: Option<String>,
    warnings: Vec<String>,
    verification_status: VerificationStatus,
    confidence_score: f64,
    analyzed_at: DateTime<Utc>,
    model_version: String,
}

impl VerifiedPrescription {
    pub(crate) fn new(
        extraction: RawExtraction,
        warnings: Vec<String>,
        verification_status: VerificationStatus,
        confidence_score: f64,
        analyzed_at: DateTime<Utc>,
        model_version: impl Into<String>,
    ) -> Self {
        Self {
            patient_name: extraction.patient_name,
            doctor_name: extraction.doctor_name,
            date: extraction.date,
            medications: extraction.medications,
            special_instructions: extraction.special_instructions,
            warnings,
            verification_status,
            confidence_score,
            analyzed_at,
            model_version: model_version.into(),
        }
    }

    pub fn patient_name(&self) -> Option<&str> {
        self.patient_name.as_deref()
    }

    pub fn doctor_name(&self) -> Option<&str> {
        self.doctor_name.as_deref()
    }

    pub fn date(&self) -> Option<&str> {
        self.date.as_deref()
    }

    pub fn medications(&self) -> &[Medication] {
        &self.medications
    }

    pub fn special_instructions(&self) -> Option<&str> {
        self.special_instructions.as_deref()
    }

    /// Model warnings followed by validator warnings.
    pub fn warnings(&self) -> &[String] {
        &self.warnings
    }

    pub fn verification_status(&self) -> VerificationStatus {
        self.verification_status
    }

    /// Confidence in [0, 1].
    pub fn confidence_score(&self) -> f64 {
        self.confidence_score
    }

    /// Confidence as a percentage rounded to one decimal.
    pub fn accuracy_percentage(&self) -> f64 {
        accuracy_percentage(self.confidence_score)
    }

    /// When validation ran.
    pub fn analyzed_at(&self) -> DateTime<Utc> {
        self.analyzed_at
    }

    pub fn model_version(&self) -> &str {
        &self.model_version
    }
}

impl Serialize for VerifiedPrescription {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut state = serializer.serialize_struct("VerifiedPrescription", 11)?;
        state.serialize_field("patient_name", &self.patient_name)?;
        state.serialize_field("doctor_name", &self.doctor_name)?;
        state.serialize_field("date", &self.date)?;
        state.serialize_field("medications", &self.medications)?;
        state.serialize_field("special_instructions", &self.special_instructions)?;
        state.serialize_field("warnings", &self.warnings)?;
        state.serialize_field("verification_status", &self.verification_status)?;
        state.serialize_field("confidence_score", &self.confidence_score)?;
        state.serialize_field("accuracy_percentage", &self.accuracy_percentage())?;
        state.serialize_field(
            "analyzed_at",
            &self.analyzed_at.to_rfc3339_opts(SecondsFormat::Millis, true),
        )?;
        state.serialize_field("model_version", &self.model_version)?;
        state.end()
    }
}

/// Outcome of validating a directly supplied record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ValidationResult {
    is_valid: bool,
    warnings: Vec<String>,
    errors: Vec<String>,
}

impl ValidationResult {
    /// Build a result; validity follows from `errors` being empty.
    pub fn new(warnings: Vec<String>, errors: Vec<String>) -> Self {
        Self {
            is_valid: errors.is_empty(),
            warnings,
            errors,
        }
    }

    pub fn is_valid(&self) -> bool {
        self.is_valid
    }

    pub fn warnings(&self) -> &[String] {
        &self.warnings
    }

    pub fn errors(&self) -> &[String] {
        &self.errors
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_status_wire_names() {
        assert_eq!(
            serde_json::to_value(VerificationStatus::NeedsReview).unwrap(),
            "needs_review"
        );
        let parsed: VerificationStatus = serde_json::from_str("\"rejected\"").unwrap();
        assert_eq!(parsed, VerificationStatus::Rejected);
        assert_eq!(VerificationStatus::Verified.to_string(), "verified");
    }

    #[test]
    fn test_verified_prescription_serialization() {
        let extraction = RawExtraction {
            patient_name: Some("John Doe".to_string()),
            medications: vec![Medication::new("Amoxicillin").with_dosage("500mg")],
            confidence_score: Some(0.92),
            ..RawExtraction::default()
        };
        let analyzed_at = Utc.with_ymd_and_hms(2024, 11, 26, 9, 30, 0).unwrap();
        let record = VerifiedPrescription::new(
            extraction,
            vec!["Doctor name is missing".to_string()],
            VerificationStatus::NeedsReview,
            0.92,
            analyzed_at,
            "gemini-1.5-flash",
        );

        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(json["patient_name"], "John Doe");
        assert!(json["doctor_name"].is_null());
        assert_eq!(json["medications"][0]["dosage"], "500mg");
        assert_eq!(json["medications"][0]["frequency"], "");
        assert_eq!(json["verification_status"], "needs_review");
        assert_eq!(json["accuracy_percentage"], 92.0);
        assert_eq!(json["analyzed_at"], "2024-11-26T09:30:00.000Z");
        assert_eq!(json["model_version"], "gemini-1.5-flash");
    }

    #[test]
    fn test_validation_result_validity_follows_errors() {
        let ok = ValidationResult::new(vec!["Doctor name is missing".to_string()], vec![]);
        assert!(ok.is_valid());

        let bad = ValidationResult::new(vec![], vec!["medications must be a list".to_string()]);
        assert!(!bad.is_valid());

        let json = serde_json::to_value(&bad).unwrap();
        assert_eq!(json["is_valid"], false);
        assert_eq!(json["errors"][0], "medications must be a list");
    }

    #[test]
    fn test_push_warning_deduplicates() {
        let mut extraction = RawExtraction::default();
        extraction.push_warning("Handwriting unclear");
        extraction.push_warning("Handwriting unclear");
        assert_eq!(extraction.warnings, vec!["Handwriting unclear".to_string()]);
    }

    #[test]
    fn test_medication_defaults_when_fields_missing() {
        let med: Medication = serde_json::from_str(r#"{"name": "Ibuprofen"}"#).unwrap();
        assert_eq!(med, Medication::new("Ibuprofen"));
        assert!(med.has_name());
        assert!(!Medication::new("  ").has_name());
    }
}
