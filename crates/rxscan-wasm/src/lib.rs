//! WASM bindings for prescription validation.
//!
//! Model calls stay on the server; the browser side parses model answers
//! and runs the same deterministic validation as the native pipeline.

use serde::Serialize;
use wasm_bindgen::prelude::*;

use rxscan_core::{ValidationConfig, Validator};

/// Initialize panic hook for better error messages in console.
#[wasm_bindgen(start)]
pub fn init() {
    #[cfg(feature = "console_error_panic_hook")]
    console_error_panic_hook::set_once();
}

/// Version information.
#[wasm_bindgen]
pub fn version() -> String {
    env!("CARGO_PKG_VERSION").to_string()
}

fn to_js<T: Serialize>(value: &T) -> Result<JsValue, JsValue> {
    value
        .serialize(&serde_wasm_bindgen::Serializer::json_compatible())
        .map_err(|e| JsValue::from_str(&e.to_string()))
}

fn from_js(value: JsValue) -> Result<serde_json::Value, JsValue> {
    serde_wasm_bindgen::from_value(value).map_err(|e| JsValue::from_str(&e.to_string()))
}

fn extraction_from_value(
    validator: &Validator,
    value: &serde_json::Value,
    model_version: &str,
) -> Result<rxscan_core::VerifiedPrescription, String> {
    let text = serde_json::to_string(value).map_err(|e| e.to_string())?;
    let extraction = rxscan_core::parse_model_response(&text).map_err(|e| e.to_string())?;
    Ok(validator.validate_extraction(extraction, model_version))
}

/// Validate a prescription record object with the default thresholds.
///
/// Returns `{ is_valid, warnings, errors }`.
#[wasm_bindgen]
pub fn validate_record(record: JsValue) -> Result<JsValue, JsValue> {
    let value = from_js(record)?;
    to_js(&Validator::default().validate_record(&value))
}

/// Validate a prescription record given as JSON text.
#[wasm_bindgen]
pub fn validate_record_json(json: &str) -> Result<String, JsValue> {
    let result = Validator::default()
        .validate_record_json(json)
        .map_err(|e| JsValue::from_str(&e.to_string()))?;
    serde_json::to_string(&result).map_err(|e| JsValue::from_str(&e.to_string()))
}

/// Assign a verification status to a raw model extraction.
#[wasm_bindgen]
pub fn validate_extraction(extraction: JsValue, model_version: &str) -> Result<JsValue, JsValue> {
    let value = from_js(extraction)?;
    let record = extraction_from_value(&Validator::default(), &value, model_version)
        .map_err(|e| JsValue::from_str(&e))?;
    to_js(&record)
}

/// Parse a model's text answer into a raw extraction.
#[wasm_bindgen]
pub fn parse_model_response(text: &str) -> Result<JsValue, JsValue> {
    let extraction =
        rxscan_core::parse_model_response(text).map_err(|e| JsValue::from_str(&e.to_string()))?;
    to_js(&extraction)
}

/// Validator with custom thresholds for browser use.
#[wasm_bindgen]
pub struct PrescriptionValidator {
    validator: Validator,
}

#[wasm_bindgen]
impl PrescriptionValidator {
    /// Create a validator; thresholds must be in [0, 1] with review <= verify.
    #[wasm_bindgen(constructor)]
    pub fn new(verify_threshold: f64, review_threshold: f64) -> Result<PrescriptionValidator, JsValue> {
        let validator = Validator::new(ValidationConfig {
            verify_threshold,
            review_threshold,
        })
        .map_err(|e| JsValue::from_str(&e.to_string()))?;
        Ok(Self { validator })
    }

    /// Validator with the default 0.85 / 0.50 thresholds.
    #[wasm_bindgen(js_name = withDefaults)]
    pub fn with_defaults() -> PrescriptionValidator {
        Self {
            validator: Validator::default(),
        }
    }

    #[wasm_bindgen(getter)]
    pub fn verify_threshold(&self) -> f64 {
        self.validator.config().verify_threshold
    }

    #[wasm_bindgen(getter)]
    pub fn review_threshold(&self) -> f64 {
        self.validator.config().review_threshold
    }

    #[wasm_bindgen]
    pub fn validate_record(&self, record: JsValue) -> Result<JsValue, JsValue> {
        let value = from_js(record)?;
        to_js(&self.validator.validate_record(&value))
    }

    #[wasm_bindgen]
    pub fn validate_extraction(&self, extraction: JsValue, model_version: &str) -> Result<JsValue, JsValue> {
        let value = from_js(extraction)?;
        let record = extraction_from_value(&self.validator, &value, model_version)
            .map_err(|e| JsValue::from_str(&e))?;
        to_js(&record)
    }
}
