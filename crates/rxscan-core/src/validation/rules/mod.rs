//! Rule-based checks shared by both validation entry points.

pub mod completeness;
pub mod confidence;
pub mod dates;
pub mod patterns;
pub mod record;

pub use completeness::{RecordView, check_completeness};
pub use confidence::{accuracy_percentage, classify, effective_confidence};
pub use dates::parse_prescription_date;

/// How a finding affects the verification decision.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    /// A required field is missing; blocks `verified`.
    Completeness,
    /// Informational for the reviewer; does not affect status.
    Advisory,
}

/// The record field a finding is about.
///
/// Medication indices are zero-based positions in the medication list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Subject {
    PatientName,
    DoctorName,
    Date,
    Medications,
    MedicationName(usize),
    MedicationDosage(usize),
    Confidence,
}

/// A single human-readable observation about a record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Finding {
    pub severity: Severity,
    pub subject: Subject,
    pub message: String,
}

impl Finding {
    pub fn completeness(subject: Subject, message: impl Into<String>) -> Self {
        Self {
            severity: Severity::Completeness,
            subject,
            message: message.into(),
        }
    }

    pub fn advisory(subject: Subject, message: impl Into<String>) -> Self {
        Self {
            severity: Severity::Advisory,
            subject,
            message: message.into(),
        }
    }

    pub fn blocks_verification(&self) -> bool {
        self.severity == Severity::Completeness
    }
}

/// Ordered list of messages where each cause appears at most once.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IssueList {
    items: Vec<String>,
}

impl IssueList {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append `message` unless it is already present. Returns whether it was added.
    pub fn push(&mut self, message: impl Into<String>) -> bool {
        let message = message.into();
        if self.items.contains(&message) {
            return false;
        }
        self.items.push(message);
        true
    }

    pub fn extend<I, S>(&mut self, messages: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        for message in messages {
            self.push(message);
        }
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn as_slice(&self) -> &[String] {
        &self.items
    }

    pub fn into_vec(self) -> Vec<String> {
        self.items
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_issue_list_keeps_first_occurrence_order() {
        let mut issues = IssueList::new();
        assert!(issues.push("Patient name is missing"));
        assert!(issues.push("Doctor name is missing"));
        assert!(!issues.push("Patient name is missing"));
        issues.extend(["No medications found", "Doctor name is missing"]);

        assert_eq!(
            issues.into_vec(),
            vec![
                "Patient name is missing".to_string(),
                "Doctor name is missing".to_string(),
                "No medications found".to_string(),
            ]
        );
    }

    #[test]
    fn test_only_completeness_blocks() {
        assert!(
            Finding::completeness(Subject::PatientName, "Patient name is missing")
                .blocks_verification()
        );
        assert!(
            !Finding::advisory(Subject::MedicationDosage(0), "Dosage missing for Ibuprofen")
                .blocks_verification()
        );
    }
}
