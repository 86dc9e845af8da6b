//! Lenient parsing of the model's text answer into a raw extraction.

use serde_json::{Map, Value};
use tracing::warn;

use crate::error::ExtractionError;
use crate::models::prescription::{Medication, RawExtraction};
use crate::validation::rules::patterns::JSON_FENCE;

/// Longest excerpt of a bad answer kept for diagnostics.
const EXCERPT_CHARS: usize = 200;

/// Parse a model answer.
///
/// Accepts a fenced block, a bare object, or an object surrounded by prose.
/// Fields the model filled with the wrong kind of value are dropped or
/// coerced, and each such repair is noted in the extraction's warnings.
pub fn parse_model_response(text: &str) -> Result<RawExtraction, ExtractionError> {
    let candidate = locate_json(text).ok_or_else(|| parse_error("no JSON object found", text))?;

    let value: Value = serde_json::from_str(candidate)
        .map_err(|e| parse_error(&format!("invalid JSON: {}", e), text))?;

    let Value::Object(object) = value else {
        return Err(parse_error("top-level JSON is not an object", text));
    };

    let mut notes = Vec::new();
    let mut extraction = RawExtraction {
        patient_name: text_field(&object, "patient_name", &mut notes),
        doctor_name: text_field(&object, "doctor_name", &mut notes),
        date: text_field(&object, "date", &mut notes),
        medications: medications(&object, &mut notes),
        special_instructions: text_field(&object, "special_instructions", &mut notes),
        warnings: Vec::new(),
        confidence_score: confidence(object.get("confidence_score")),
    };

    for warning in warnings(object.get("warnings")) {
        extraction.push_warning(warning);
    }
    for note in notes {
        warn!("{}", note);
        extraction.push_warning(note);
    }

    Ok(extraction)
}

fn locate_json(text: &str) -> Option<&str> {
    if let Some(caps) = JSON_FENCE.captures(text) {
        let inner = caps.get(1).map_or("", |m| m.as_str()).trim();
        if inner.starts_with('{') {
            return Some(inner);
        }
    }

    let start = text.find('{')?;
    let end = text.rfind('}')?;
    (end > start).then(|| &text[start..=end])
}

fn parse_error(reason: &str, text: &str) -> ExtractionError {
    ExtractionError::Parse {
        reason: reason.to_string(),
        excerpt: excerpt(text),
    }
}

fn excerpt(text: &str) -> String {
    let trimmed = text.trim();
    match trimmed.char_indices().nth(EXCERPT_CHARS) {
        Some((idx, _)) => format!("{}...", &trimmed[..idx]),
        None => trimmed.to_string(),
    }
}

/// Textual form of a scalar; `None` for empty strings and null.
fn text_of(value: &Value) -> Option<String> {
    let text = match value {
        Value::String(s) => s.trim().to_string(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Null | Value::Array(_) | Value::Object(_) => return None,
    };
    (!text.is_empty()).then_some(text)
}

fn text_field(object: &Map<String, Value>, key: &str, notes: &mut Vec<String>) -> Option<String> {
    let value = object.get(key)?;
    if matches!(value, Value::Array(_) | Value::Object(_)) {
        notes.push(format!("Ignored non-text value for {}", key));
        return None;
    }
    text_of(value)
}

fn medications(object: &Map<String, Value>, notes: &mut Vec<String>) -> Vec<Medication> {
    let entries = match object.get("medications") {
        None | Some(Value::Null) => return Vec::new(),
        Some(Value::Array(entries)) => entries,
        Some(_) => {
            notes.push("Ignored medications value that is not a list".to_string());
            return Vec::new();
        }
    };

    let mut medications = Vec::with_capacity(entries.len());
    for (index, entry) in entries.iter().enumerate() {
        match entry {
            Value::Object(fields) => {
                let field = |key: &str| fields.get(key).and_then(text_of).unwrap_or_default();
                medications.push(Medication {
                    name: field("name"),
                    dosage: field("dosage"),
                    frequency: field("frequency"),
                    duration: field("duration"),
                });
            }
            Value::String(name) if !name.trim().is_empty() => {
                medications.push(Medication::new(name.trim()));
            }
            _ => notes.push(format!("Skipped unreadable medication entry #{}", index + 1)),
        }
    }
    medications
}

fn warnings(value: Option<&Value>) -> Vec<String> {
    match value {
        Some(Value::Array(items)) => items
            .iter()
            .filter_map(|item| item.as_str())
            .map(str::trim)
            .filter(|w| !w.is_empty())
            .map(str::to_string)
            .collect(),
        Some(Value::String(single)) if !single.trim().is_empty() => vec![single.trim().to_string()],
        _ => Vec::new(),
    }
}

fn confidence(value: Option<&Value>) -> Option<f64> {
    match value? {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok().filter(|v| v.is_finite()),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    const BARE: &str = r#"{
        "patient_name": "John Doe",
        "doctor_name": "Dr. Jane Smith",
        "date": "2024-11-26",
        "medications": [
            {"name": "Amoxicillin", "dosage": "500mg", "frequency": "three times daily", "duration": "7 days"}
        ],
        "special_instructions": "Take with food",
        "warnings": [],
        "verification_status": "verified",
        "confidence_score": 0.92
    }"#;

    #[test]
    fn test_bare_object() {
        let extraction = parse_model_response(BARE).unwrap();
        assert_eq!(extraction.patient_name.as_deref(), Some("John Doe"));
        assert_eq!(extraction.date.as_deref(), Some("2024-11-26"));
        assert_eq!(
            extraction.medications,
            vec![
                Medication::new("Amoxicillin")
                    .with_dosage("500mg")
                    .with_frequency("three times daily")
                    .with_duration("7 days")
            ]
        );
        assert_eq!(extraction.confidence_score, Some(0.92));
        assert!(extraction.warnings.is_empty());
    }

    #[test]
    fn test_fenced_and_prose_wrapped() {
        let fenced = format!("```json\n{}\n```", BARE);
        let bare_fence = format!("```\n{}\n```", BARE);
        let prose = format!("Here is the extracted data:\n{}\nLet me know if you need more.", BARE);

        let expected = parse_model_response(BARE).unwrap();
        assert_eq!(parse_model_response(&fenced).unwrap(), expected);
        assert_eq!(parse_model_response(&bare_fence).unwrap(), expected);
        assert_eq!(parse_model_response(&prose).unwrap(), expected);
    }

    #[test]
    fn test_prose_without_json() {
        let err = parse_model_response("I'm sorry, I cannot read this image.").unwrap_err();
        match err {
            ExtractionError::Parse { reason, excerpt } => {
                assert_eq!(reason, "no JSON object found");
                assert_eq!(excerpt, "I'm sorry, I cannot read this image.");
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[test]
    fn test_invalid_json_and_long_excerpt() {
        let text = format!("{{\"patient_name\": {}", "x".repeat(500));
        let text = format!("{}}}", text);
        let err = parse_model_response(&text).unwrap_err();
        match err {
            ExtractionError::Parse { reason, excerpt } => {
                assert!(reason.starts_with("invalid JSON"));
                assert_eq!(excerpt.chars().count(), EXCERPT_CHARS + 3);
                assert!(excerpt.ends_with("..."));
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[test]
    fn test_fenced_array_is_rejected() {
        let err = parse_model_response("```json\n[1, 2]\n``` and {oops}").unwrap_err();
        assert!(matches!(err, ExtractionError::Parse { .. }));
    }

    #[test]
    fn test_empty_strings_are_absent() {
        let extraction =
            parse_model_response(r#"{"patient_name": "  ", "doctor_name": "", "date": null}"#).unwrap();
        assert_eq!(extraction.patient_name, None);
        assert_eq!(extraction.doctor_name, None);
        assert_eq!(extraction.date, None);
        assert_eq!(extraction.confidence_score, None);
    }

    #[test]
    fn test_lenient_field_coercion() {
        let extraction = parse_model_response(
            r#"{
                "patient_name": "Jane Roe",
                "medications": ["Ibuprofen", {"name": "Metformin", "dosage": 500}, 42],
                "warnings": "Handwriting unclear",
                "confidence_score": "0.7"
            }"#,
        )
        .unwrap();

        assert_eq!(
            extraction.medications,
            vec![Medication::new("Ibuprofen"), Medication::new("Metformin").with_dosage("500")]
        );
        assert_eq!(extraction.confidence_score, Some(0.7));
        assert_eq!(
            extraction.warnings,
            vec![
                "Handwriting unclear".to_string(),
                "Skipped unreadable medication entry #3".to_string(),
            ]
        );
    }

    #[test]
    fn test_medications_not_a_list() {
        let extraction =
            parse_model_response(r#"{"medications": {"name": "Aspirin"}, "patient_name": ["A"]}"#).unwrap();
        assert!(extraction.medications.is_empty());
        assert_eq!(extraction.patient_name, None);
        assert_eq!(
            extraction.warnings,
            vec![
                "Ignored non-text value for patient_name".to_string(),
                "Ignored medications value that is not a list".to_string(),
            ]
        );
    }
}
