//! Date normalization shared by contract extraction and schedule generation.
//!
//! Three input shapes are recognized:
//! - `DD/MM/YYYY` (day and month may be a single digit)
//! - `D <mese> YYYY` with an Italian month name, case-insensitive
//! - ISO `YYYY-MM-DD`
//!
//! [`normalize_date`] reports failure explicitly. Call sites pick their own
//! policy: extraction maps failure to `null`, schedule generation falls back
//! to a reference date through [`normalize_date_or`].

use chrono::{Datelike, Days, Months, NaiveDate, Utc};
use lazy_static::lazy_static;
use regex::Regex;
use tracing::warn;

use crate::error::DateError;

lazy_static! {
    static ref DATE_SLASHED: Regex = Regex::new(
        r"^\s*(\d{1,2})/(\d{1,2})/(\d{4})\s*$"
    ).unwrap();

    static ref DATE_ITALIAN_LONG: Regex = Regex::new(
        r"(?i)(\d{1,2})\s+(\p{L}+)\s+(\d{4})"
    ).unwrap();

    static ref DATE_ISO: Regex = Regex::new(
        r"^\s*(\d{4})-(\d{2})-(\d{2})\s*$"
    ).unwrap();
}

/// Normalize an Italian or ISO date string.
pub fn normalize_date(input: &str) -> Result<NaiveDate, DateError> {
    if let Some(caps) = DATE_SLASHED.captures(input) {
        return build_date(input, &caps[3], parse_u32(&caps[2]), &caps[1]);
    }

    if input.contains('/') {
        return Err(DateError::Unrecognized(input.to_string()));
    }

    if let Some(caps) = DATE_ITALIAN_LONG.captures(input) {
        if let Some(month) = italian_month_to_number(&caps[2]) {
            return build_date(input, &caps[3], Some(month), &caps[1]);
        }
    }

    if let Some(caps) = DATE_ISO.captures(input) {
        return build_date(input, &caps[1], parse_u32(&caps[2]), &caps[3]);
    }

    Err(DateError::Unrecognized(input.to_string()))
}

/// Normalize a date, substituting `fallback` when the input is not recognized.
///
/// The substitution is logged so malformed contract dates stay visible.
pub fn normalize_date_or(input: &str, fallback: NaiveDate) -> NaiveDate {
    match normalize_date(input) {
        Ok(date) => date,
        Err(e) => {
            warn!(input, error = %e, fallback = %to_iso(fallback), "date normalization failed, using fallback");
            fallback
        }
    }
}

/// Normalize a date and render it as `YYYY-MM-DD`.
pub fn normalize_to_iso(input: &str) -> Result<String, DateError> {
    normalize_date(input).map(to_iso)
}

/// Render a date as zero-padded `YYYY-MM-DD`.
pub fn to_iso(date: NaiveDate) -> String {
    date.format("%Y-%m-%d").to_string()
}

/// Current UTC calendar date.
pub fn today() -> NaiveDate {
    Utc::now().date_naive()
}

/// Add calendar months, letting an out-of-range day roll into the next month.
///
/// `2025-10-31` plus 4 months is `2026-03-03`, not a clamped `2026-02-28`.
/// Returns `None` only when the result leaves chrono's supported range.
pub fn add_months(date: NaiveDate, months: u32) -> Option<NaiveDate> {
    let first = date.with_day(1)?;
    let shifted = first.checked_add_months(Months::new(months))?;
    shifted.checked_add_days(Days::new(u64::from(date.day() - 1)))
}

/// Map an Italian month name to its number.
pub fn italian_month_to_number(month: &str) -> Option<u32> {
    match month.to_lowercase().as_str() {
        "gennaio" => Some(1),
        "febbraio" => Some(2),
        "marzo" => Some(3),
        "aprile" => Some(4),
        "maggio" => Some(5),
        "giugno" => Some(6),
        "luglio" => Some(7),
        "agosto" => Some(8),
        "settembre" => Some(9),
        "ottobre" => Some(10),
        "novembre" => Some(11),
        "dicembre" => Some(12),
        _ => None,
    }
}

fn parse_u32(s: &str) -> Option<u32> {
    s.parse().ok()
}

fn build_date(
    input: &str,
    year: &str,
    month: Option<u32>,
    day: &str,
) -> Result<NaiveDate, DateError> {
    let invalid = || DateError::Invalid(input.to_string());
    let year: i32 = year.parse().map_err(|_| invalid())?;
    let month = month.ok_or_else(invalid)?;
    let day = parse_u32(day).ok_or_else(invalid)?;

    NaiveDate::from_ymd_opt(year, month, day).ok_or_else(invalid)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_slashed_date() {
        assert_eq!(normalize_to_iso("10/10/2025").unwrap(), "2025-10-10");
        assert_eq!(normalize_to_iso("1/9/2025").unwrap(), "2025-09-01");
    }

    #[test]
    fn test_italian_long_date() {
        assert_eq!(normalize_to_iso("10 ottobre 2025").unwrap(), "2025-10-10");
        assert_eq!(normalize_to_iso("5 GENNAIO 2026").unwrap(), "2026-01-05");
        assert_eq!(
            normalize_to_iso("entro il 25 settembre 2025").unwrap(),
            "2025-09-25"
        );
    }

    #[test]
    fn test_iso_is_idempotent() {
        assert_eq!(normalize_to_iso("2025-10-10").unwrap(), "2025-10-10");
        let once = normalize_to_iso("10 ottobre 2025").unwrap();
        assert_eq!(normalize_to_iso(&once).unwrap(), once);
    }

    #[test]
    fn test_unrecognized_shapes() {
        assert_eq!(
            normalize_date("October 10, 2025"),
            Err(DateError::Unrecognized("October 10, 2025".to_string()))
        );
        assert!(matches!(
            normalize_date("10 brumaio 2025"),
            Err(DateError::Unrecognized(_))
        ));
        assert!(matches!(normalize_date("10/2025"), Err(DateError::Unrecognized(_))));
        assert!(matches!(normalize_date(""), Err(DateError::Unrecognized(_))));
    }

    #[test]
    fn test_invalid_calendar_date() {
        assert!(matches!(normalize_date("31/02/2025"), Err(DateError::Invalid(_))));
        assert!(matches!(normalize_date("2025-13-01"), Err(DateError::Invalid(_))));
    }

    #[test]
    fn test_fallback() {
        let fallback = ymd(2026, 1, 1);
        assert_eq!(normalize_date_or("not a date", fallback), fallback);
        assert_eq!(normalize_date_or("10/10/2025", fallback), ymd(2025, 10, 10));
    }

    #[test]
    fn test_add_months() {
        let start = ymd(2025, 10, 10);
        assert_eq!(add_months(start, 0), Some(start));
        assert_eq!(add_months(start, 4), Some(ymd(2026, 2, 10)));
        assert_eq!(add_months(start, 8), Some(ymd(2026, 6, 10)));
    }

    #[test]
    fn test_add_months_rolls_over_short_months() {
        assert_eq!(add_months(ymd(2025, 10, 31), 4), Some(ymd(2026, 3, 3)));
        assert_eq!(add_months(ymd(2024, 1, 30), 1), Some(ymd(2024, 3, 1)));
    }
}
