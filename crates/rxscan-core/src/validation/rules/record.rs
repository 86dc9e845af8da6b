//! Structural reading of directly supplied prescription records.
//!
//! Records arrive as arbitrary JSON. Anything with the wrong shape becomes
//! an error message; everything readable is handed to the completeness rules.

use serde_json::{Map, Value};

use super::{Finding, IssueList, RecordView, Subject};
use crate::models::prescription::Medication;

/// State of the `confidence_score` field of a supplied record.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ConfidenceField {
    /// Not supplied; treated as 0.
    Absent,
    /// A number within [0, 1].
    Valid(f64),
    /// Present but unusable; an error has been recorded.
    Invalid,
}

impl ConfidenceField {
    /// Score to judge the record by, if one can be determined.
    pub fn score(&self) -> Option<f64> {
        match self {
            ConfidenceField::Absent => Some(0.0),
            ConfidenceField::Valid(v) => Some(*v),
            ConfidenceField::Invalid => None,
        }
    }
}

/// Fields recovered from a supplied record.
#[derive(Debug, Clone)]
pub struct RecordFields {
    pub patient_name: Option<String>,
    pub doctor_name: Option<String>,
    pub date: Option<String>,
    pub medications: Vec<Medication>,
    pub confidence: ConfidenceField,
    malformed: Vec<Subject>,
}

impl RecordFields {
    pub fn view(&self) -> RecordView<'_> {
        RecordView {
            patient_name: self.patient_name.as_deref(),
            doctor_name: self.doctor_name.as_deref(),
            date: self.date.as_deref(),
            medications: &self.medications,
        }
    }

    /// Whether `finding` restates a type error already reported for its field.
    pub fn explains(&self, finding: &Finding) -> bool {
        self.malformed.contains(&finding.subject)
    }
}

/// Read a record, appending one error per structural problem.
///
/// Returns `None` when the input is not a JSON object at all.
pub fn read_record(value: &Value, errors: &mut IssueList) -> Option<RecordFields> {
    let Some(object) = value.as_object() else {
        errors.push(format!("Record must be a JSON object, got {}", kind_of(value)));
        return None;
    };

    let mut reader = Reader {
        errors,
        malformed: Vec::new(),
    };

    let patient_name = reader.string(object, "patient_name", "patient_name", Some(Subject::PatientName));
    let doctor_name = reader.string(object, "doctor_name", "doctor_name", Some(Subject::DoctorName));
    let date = reader.string(object, "date", "date", Some(Subject::Date));
    // Type-checked only; no rule looks at the instructions.
    reader.string(object, "special_instructions", "special_instructions", None);
    let medications = reader.medications(object);
    read_warnings(object, reader.errors);
    let confidence = read_confidence(object, reader.errors);

    Some(RecordFields {
        patient_name,
        doctor_name,
        date,
        medications,
        confidence,
        malformed: reader.malformed,
    })
}

struct Reader<'a> {
    errors: &'a mut IssueList,
    malformed: Vec<Subject>,
}

impl Reader<'_> {
    fn string(
        &mut self,
        object: &Map<String, Value>,
        key: &str,
        label: &str,
        subject: Option<Subject>,
    ) -> Option<String> {
        match object.get(key) {
            None | Some(Value::Null) => None,
            Some(Value::String(s)) => Some(s.clone()),
            Some(other) => {
                self.errors
                    .push(format!("{} must be a string, got {}", label, kind_of(other)));
                self.malformed.extend(subject);
                None
            }
        }
    }

    /// Entries that are not objects become empty placeholders so that
    /// medication numbering follows the input list.
    fn medications(&mut self, object: &Map<String, Value>) -> Vec<Medication> {
        let entries = match object.get("medications") {
            None | Some(Value::Null) => return Vec::new(),
            Some(Value::Array(entries)) => entries,
            Some(other) => {
                self.errors
                    .push(format!("medications must be a list, got {}", kind_of(other)));
                self.malformed.push(Subject::Medications);
                return Vec::new();
            }
        };

        let mut medications = Vec::with_capacity(entries.len());
        for (index, entry) in entries.iter().enumerate() {
            let Some(fields) = entry.as_object() else {
                self.errors.push(format!(
                    "medications[{}] must be an object, got {}",
                    index,
                    kind_of(entry)
                ));
                self.malformed.push(Subject::MedicationName(index));
                medications.push(Medication::default());
                continue;
            };

            let mut field = |key: &str, subject: Option<Subject>| {
                let label = format!("medications[{}].{}", index, key);
                self.string(fields, key, &label, subject).unwrap_or_default()
            };

            medications.push(Medication {
                name: field("name", Some(Subject::MedicationName(index))),
                dosage: field("dosage", Some(Subject::MedicationDosage(index))),
                frequency: field("frequency", None),
                duration: field("duration", None),
            });
        }
        medications
    }
}

fn read_warnings(object: &Map<String, Value>, errors: &mut IssueList) {
    match object.get("warnings") {
        None | Some(Value::Null) => {}
        Some(Value::Array(items)) if items.iter().all(Value::is_string) => {}
        Some(_) => {
            errors.push("warnings must be a list of strings");
        }
    }
}

fn read_confidence(object: &Map<String, Value>, errors: &mut IssueList) -> ConfidenceField {
    match object.get("confidence_score") {
        None | Some(Value::Null) => ConfidenceField::Absent,
        Some(Value::Number(n)) => match n.as_f64() {
            Some(v) if v.is_finite() && (0.0..=1.0).contains(&v) => ConfidenceField::Valid(v),
            _ => {
                errors.push(format!("confidence_score {} is outside [0, 1]", n));
                ConfidenceField::Invalid
            }
        },
        Some(other) => {
            errors.push(format!(
                "confidence_score must be a number, got {}",
                kind_of(other)
            ));
            ConfidenceField::Invalid
        }
    }
}

fn kind_of(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "a list",
        Value::Object(_) => "an object",
    }
}
