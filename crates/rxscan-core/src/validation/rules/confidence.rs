//! Confidence normalization and status classification.

use super::{Finding, Subject};
use crate::models::config::ValidationConfig;
use crate::models::prescription::VerificationStatus;

/// Turn a model-reported confidence into a usable score in [0, 1].
///
/// Missing or non-finite values count as 0. Out-of-range values are clamped
/// and reported as an advisory.
pub fn effective_confidence(reported: Option<f64>) -> (f64, Option<Finding>) {
    let value = match reported {
        Some(v) if v.is_finite() => v,
        _ => return (0.0, None),
    };

    if (0.0..=1.0).contains(&value) {
        return (value, None);
    }

    let clamped = value.clamp(0.0, 1.0);
    let finding = Finding::advisory(Subject::Confidence, format!(
        "Model-reported confidence {} is outside [0, 1] and was clamped to {}",
        value, clamped
    ));
    (clamped, Some(finding))
}

/// Classify a record from its confidence and completeness.
pub fn classify(confidence: f64, complete: bool, thresholds: &ValidationConfig) -> VerificationStatus {
    if confidence >= thresholds.verify_threshold && complete {
        VerificationStatus::Verified
    } else if confidence >= thresholds.review_threshold {
        VerificationStatus::NeedsReview
    } else {
        VerificationStatus::Rejected
    }
}

/// Advisory shown when confidence is below the auto-verification bar.
pub fn low_confidence_advisory(confidence: f64, thresholds: &ValidationConfig) -> Option<Finding> {
    (confidence < thresholds.verify_threshold).then(|| {
        Finding::advisory(Subject::Confidence, format!(
            "Low confidence score ({:.2} < {:.2}) - manual review recommended",
            confidence, thresholds.verify_threshold
        ))
    })
}

/// Confidence as a percentage rounded to one decimal place.
///
/// Ties round away from zero.
pub fn accuracy_percentage(confidence: f64) -> f64 {
    (confidence * 1000.0).round() / 10.0
}
