//! Date recognition for prescription dates.

use chrono::NaiveDate;

use super::patterns::{DATE_DAY_MONTH_YEAR, DATE_DMY, DATE_MONTH_DAY_YEAR, DATE_YMD};

/// Parse a prescription date written in one of the common layouts.
///
/// Numeric dates are read day-first; when that is not a valid date the
/// month-first reading is tried (`11/26/2024`).
pub fn parse_prescription_date(text: &str) -> Option<NaiveDate> {
    let text = text.trim();

    // YYYY-MM-DD or YYYY/MM/DD
    if let Some(caps) = DATE_YMD.captures(text) {
        let year: i32 = caps[1].parse().ok()?;
        let month: u32 = caps[2].parse().ok()?;
        let day: u32 = caps[3].parse().ok()?;
        return NaiveDate::from_ymd_opt(year, month, day);
    }

    // DD.MM.YYYY, DD/MM/YYYY, DD-MM-YYYY, two-digit years allowed
    if let Some(caps) = DATE_DMY.captures(text) {
        let first: u32 = caps[1].parse().ok()?;
        let second: u32 = caps[2].parse().ok()?;
        let year = parse_year(&caps[3]);
        return NaiveDate::from_ymd_opt(year, second, first)
            .or_else(|| NaiveDate::from_ymd_opt(year, first, second));
    }

    // "26 November 2024"
    if let Some(caps) = DATE_DAY_MONTH_YEAR.captures(text) {
        let day: u32 = caps[1].parse().ok()?;
        let month = month_to_number(&caps[2])?;
        let year: i32 = caps[3].parse().ok()?;
        return NaiveDate::from_ymd_opt(year, month, day);
    }

    // "November 26, 2024"
    if let Some(caps) = DATE_MONTH_DAY_YEAR.captures(text) {
        let month = month_to_number(&caps[1])?;
        let day: u32 = caps[2].parse().ok()?;
        let year: i32 = caps[3].parse().ok()?;
        return NaiveDate::from_ymd_opt(year, month, day);
    }

    None
}

fn parse_year(s: &str) -> i32 {
    let year: i32 = s.parse().unwrap_or(0);
    if year < 100 {
        // Two-digit year: assume 2000s for 00-50, 1900s for 51-99
        if year <= 50 {
            2000 + year
        } else {
            1900 + year
        }
    } else {
        year
    }
}

fn month_to_number(month: &str) -> Option<u32> {
    let month = month.to_lowercase();
    let number = match month.get(..3)? {
        "jan" => 1,
        "feb" => 2,
        "mar" => 3,
        "apr" => 4,
        "may" => 5,
        "jun" => 6,
        "jul" => 7,
        "aug" => 8,
        "sep" => 9,
        "oct" => 10,
        "nov" => 11,
        "dec" => 12,
        _ => return None,
    };
    Some(number)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> Option<NaiveDate> {
        NaiveDate::from_ymd_opt(y, m, d)
    }

    #[test]
    fn test_iso_date() {
        assert_eq!(parse_prescription_date("2024-11-26"), date(2024, 11, 26));
        assert_eq!(parse_prescription_date(" 2024/1/5 "), date(2024, 1, 5));
    }

    #[test]
    fn test_day_first_numeric() {
        assert_eq!(parse_prescription_date("26.11.2024"), date(2024, 11, 26));
        assert_eq!(parse_prescription_date("05/01/2024"), date(2024, 1, 5));
    }

    #[test]
    fn test_month_first_fallback() {
        assert_eq!(parse_prescription_date("11/26/2024"), date(2024, 11, 26));
    }

    #[test]
    fn test_written_months() {
        assert_eq!(parse_prescription_date("26 November 2024"), date(2024, 11, 26));
        assert_eq!(parse_prescription_date("3rd Feb 2025"), date(2025, 2, 3));
        assert_eq!(parse_prescription_date("November 26, 2024"), date(2024, 11, 26));
    }

    #[test]
    fn test_two_digit_year() {
        assert_eq!(parse_prescription_date("26.11.24"), date(2024, 11, 26));
    }

    #[test]
    fn test_unrecognized() {
        assert_eq!(parse_prescription_date("illegible"), None);
        assert_eq!(parse_prescription_date("2024-13-45"), None);
        assert_eq!(parse_prescription_date("31 Smarch 2024"), None);
    }
}
