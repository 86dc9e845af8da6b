//! Common regex patterns for prescription parsing.

use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    // Calendar dates, whole-value matches
    pub static ref DATE_YMD: Regex = Regex::new(
        r"^(\d{4})[./\-](\d{1,2})[./\-](\d{1,2})$"
    ).unwrap();

    pub static ref DATE_DMY: Regex = Regex::new(
        r"^(\d{1,2})[./\-](\d{1,2})[./\-](\d{4}|\d{2})$"
    ).unwrap();

    pub static ref DATE_DAY_MONTH_YEAR: Regex = Regex::new(
        r"(?i)^(\d{1,2})(?:st|nd|rd|th)?\s+([a-z]{3,9})\.?,?\s+(\d{4})$"
    ).unwrap();

    pub static ref DATE_MONTH_DAY_YEAR: Regex = Regex::new(
        r"(?i)^([a-z]{3,9})\.?\s+(\d{1,2})(?:st|nd|rd|th)?,?\s+(\d{4})$"
    ).unwrap();

    // Markdown code fences around model output
    pub static ref JSON_FENCE: Regex = Regex::new(
        r"(?s)```(?:json|JSON)?\s*(.*?)```"
    ).unwrap();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_date_patterns() {
        assert!(DATE_YMD.is_match("2024-11-26"));
        assert!(DATE_DMY.is_match("26/11/2024"));
        assert!(DATE_DMY.is_match("26.11.24"));
        assert!(DATE_DAY_MONTH_YEAR.is_match("26 November 2024"));
        assert!(DATE_DAY_MONTH_YEAR.is_match("26th Nov, 2024"));
        assert!(DATE_MONTH_DAY_YEAR.is_match("November 26, 2024"));
        assert!(!DATE_YMD.is_match("next Tuesday"));
    }

    #[test]
    fn test_json_fence() {
        let caps = JSON_FENCE.captures("```json\n{\"a\": 1}\n```").unwrap();
        assert_eq!(caps[1].trim(), "{\"a\": 1}");
    }
}
