//! Field completeness and plausibility checks.

use std::collections::HashSet;

use super::{Finding, Subject, parse_prescription_date};
use crate::models::prescription::{Medication, RawExtraction};

/// Borrowed view of the fields the completeness rules look at.
#[derive(Debug, Clone, Copy)]
pub struct RecordView<'a> {
    pub patient_name: Option<&'a str>,
    pub doctor_name: Option<&'a str>,
    pub date: Option<&'a str>,
    pub medications: &'a [Medication],
}

impl<'a> From<&'a RawExtraction> for RecordView<'a> {
    fn from(extraction: &'a RawExtraction) -> Self {
        Self {
            patient_name: extraction.patient_name.as_deref(),
            doctor_name: extraction.doctor_name.as_deref(),
            date: extraction.date.as_deref(),
            medications: &extraction.medications,
        }
    }
}

fn present(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

/// Run every completeness and plausibility rule over a record.
///
/// Findings come back in a stable order: header fields, then medications.
pub fn check_completeness(record: &RecordView<'_>) -> Vec<Finding> {
    let mut findings = Vec::new();

    if present(record.patient_name).is_none() {
        findings.push(Finding::completeness(Subject::PatientName, "Patient name is missing"));
    }

    if present(record.doctor_name).is_none() {
        findings.push(Finding::completeness(Subject::DoctorName, "Doctor name is missing"));
    }

    match present(record.date) {
        None => findings.push(Finding::completeness(
            Subject::Date,
            "Prescription date is missing",
        )),
        Some(date) if parse_prescription_date(date).is_none() => {
            findings.push(Finding::advisory(Subject::Date, format!(
                "Prescription date '{}' is not in a recognizable format",
                date
            )));
        }
        Some(_) => {}
    }

    if record.medications.is_empty() {
        findings.push(Finding::completeness(Subject::Medications, "No medications found"));
    }

    let mut seen_names = HashSet::new();
    let mut repeated = HashSet::new();

    for (index, medication) in record.medications.iter().enumerate() {
        if !medication.has_name() {
            findings.push(Finding::completeness(Subject::MedicationName(index), format!(
                "Medication #{} is missing a name",
                index + 1
            )));
            continue;
        }

        let name = medication.name.trim();

        if medication.dosage.trim().is_empty() {
            findings.push(Finding::advisory(
                Subject::MedicationDosage(index),
                format!("Dosage missing for {}", name),
            ));
        }

        let key = name.to_lowercase();
        if !seen_names.insert(key.clone()) && repeated.insert(key) {
            findings.push(Finding::advisory(Subject::MedicationName(index), format!(
                "Medication '{}' is listed more than once",
                name
            )));
        }
    }

    findings
}

#[cfg(test)]
mod tests {
    use super::*;
    use super::super::Severity;
    use pretty_assertions::assert_eq;

    fn complete_record() -> RawExtraction {
        RawExtraction {
            patient_name: Some("John Doe".to_string()),
            doctor_name: Some("Dr. Jane Smith".to_string()),
            date: Some("2024-11-26".to_string()),
            medications: vec![
                Medication::new("Amoxicillin")
                    .with_dosage("500mg")
                    .with_frequency("Three times daily")
                    .with_duration("7 days"),
            ],
            ..RawExtraction::default()
        }
    }

    fn messages(findings: &[Finding]) -> Vec<&str> {
        findings.iter().map(|f| f.message.as_str()).collect()
    }

    #[test]
    fn test_complete_record_has_no_findings() {
        let record = complete_record();
        assert!(check_completeness(&RecordView::from(&record)).is_empty());
    }

    #[test]
    fn test_missing_header_fields() {
        let record = RawExtraction {
            patient_name: Some("   ".to_string()),
            ..complete_record()
        };
        let record = RawExtraction {
            doctor_name: None,
            date: None,
            ..record
        };

        let findings = check_completeness(&RecordView::from(&record));
        assert_eq!(
            messages(&findings),
            vec![
                "Patient name is missing",
                "Doctor name is missing",
                "Prescription date is missing",
            ]
        );
        assert!(findings.iter().all(Finding::blocks_verification));
    }

    #[test]
    fn test_empty_medication_list() {
        let record = RawExtraction {
            medications: Vec::new(),
            ..complete_record()
        };
        let findings = check_completeness(&RecordView::from(&record));
        assert_eq!(messages(&findings), vec!["No medications found"]);
    }

    #[test]
    fn test_each_unnamed_medication_reported_once() {
        let record = RawExtraction {
            medications: vec![
                Medication::new("Amoxicillin").with_dosage("500mg"),
                Medication::new("").with_dosage("10mg"),
                Medication::new(" "),
            ],
            ..complete_record()
        };
        let findings = check_completeness(&RecordView::from(&record));
        assert_eq!(
            messages(&findings),
            vec!["Medication #2 is missing a name", "Medication #3 is missing a name"]
        );
    }

    #[test]
    fn test_advisories_do_not_block() {
        let record = RawExtraction {
            date: Some("sometime in spring".to_string()),
            medications: vec![
                Medication::new("Ibuprofen"),
                Medication::new("ibuprofen").with_dosage("200mg"),
                Medication::new("IBUPROFEN").with_dosage("200mg"),
            ],
            ..complete_record()
        };
        let findings = check_completeness(&RecordView::from(&record));

        assert_eq!(
            messages(&findings),
            vec![
                "Prescription date 'sometime in spring' is not in a recognizable format",
                "Dosage missing for Ibuprofen",
                "Medication 'ibuprofen' is listed more than once",
            ]
        );
        assert!(findings.iter().all(|f| f.severity == Severity::Advisory));
    }
}
