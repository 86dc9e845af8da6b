//! Instruction sent with every prescription image.

/// Extraction instruction. The model must answer with a bare JSON object.
pub const EXTRACTION_PROMPT: &str = r#"Analyze this prescription image and extract the following information as a single JSON object:

{
  "patient_name": "patient name, or empty string if not readable",
  "doctor_name": "prescriber name, or empty string if not readable",
  "date": "prescription date in YYYY-MM-DD format, or empty string",
  "medications": [
    {
      "name": "medication name",
      "dosage": "dosage amount and unit",
      "frequency": "how often to take it",
      "duration": "treatment duration"
    }
  ],
  "special_instructions": "any special instructions, or empty string",
  "warnings": ["unclear or ambiguous text, possible drug interactions"],
  "confidence_score": 0.0
}

Guidelines:
1. Transcribe only what is visible. Never guess missing values; leave them empty.
2. Identify every medication with its dosage, frequency and duration.
3. Add a warning for each unclear or ambiguous part of the prescription.
4. Set confidence_score between 0.0 and 1.0 from image quality and text clarity.

Return ONLY valid JSON, without markdown formatting or explanations."#;
