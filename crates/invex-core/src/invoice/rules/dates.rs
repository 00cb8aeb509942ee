//! Date normalization for ambiguous numeric date strings.

use chrono::{Datelike, NaiveDate};
use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    static ref DIGIT_RUN: Regex = Regex::new(r"\d+").unwrap();
}

/// Known formats, tried in order; the first successful parse wins.
const DATE_FORMATS: &[&str] = &[
    "%m/%d/%Y", "%m/%d/%y", "%d/%m/%Y", "%d/%m/%y", "%Y-%m-%d", "%m-%d-%Y", "%d-%m-%Y",
];

/// Normalize an OCR date string to ISO `YYYY-MM-DD`.
///
/// Tries the format list first, then falls back to a digit-run magnitude
/// heuristic: a first group over 31 must be the year, otherwise
/// month-day-year order is assumed. When day and month are both <= 31 the
/// input is inherently ambiguous and the month-first reading wins; this is
/// a documented accuracy limit, not something to resolve further. Invalid
/// or hopeless input is `None` - this function never panics.
pub fn normalize_date(raw: &str) -> Option<String> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }

    for format in DATE_FORMATS {
        if let Ok(date) = NaiveDate::parse_from_str(trimmed, format) {
            // chrono's %Y accepts short years; require a real 4-digit year
            // so 2-digit inputs reach the %y formats instead.
            if format.contains("%Y") && date.year() < 1000 {
                continue;
            }
            return Some(date.format("%Y-%m-%d").to_string());
        }
    }

    heuristic_date(trimmed)
}

/// Magnitude heuristic over the digit runs of an unparseable date string.
fn heuristic_date(raw: &str) -> Option<String> {
    let groups: Vec<i64> = DIGIT_RUN
        .find_iter(raw)
        .filter_map(|m| m.as_str().parse().ok())
        .collect();
    let first = *groups.first()?;

    let (year, month, day) = if groups.len() >= 3 {
        if first > 31 {
            (first, groups[1], groups[2])
        } else {
            // month-day-year order assumed
            (groups[2], first, groups[1])
        }
    } else if first > 31 {
        // A lone year, possibly with a month; missing parts default to 1.
        (first, groups.get(1).copied().unwrap_or(1), 1)
    } else {
        return None;
    };

    let year = pivot_century(year);
    if !(1..=9999).contains(&year) {
        return None;
    }
    let month = u32::try_from(month).ok()?;
    let day = u32::try_from(day).ok()?;

    NaiveDate::from_ymd_opt(year as i32, month, day).map(|d| d.format("%Y-%m-%d").to_string())
}

fn pivot_century(year: i64) -> i64 {
    if year < 100 {
        // Two-digit year: 2000s below 50, 1900s otherwise.
        if year < 50 { 2000 + year } else { 1900 + year }
    } else {
        year
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_month_first_slash_format() {
        assert_eq!(normalize_date("01/15/2024").as_deref(), Some("2024-01-15"));
    }

    #[test]
    fn test_day_first_when_month_is_impossible() {
        // Day 15 cannot be a month, so the d-m-Y reading applies.
        assert_eq!(normalize_date("15-01-2024").as_deref(), Some("2024-01-15"));
        assert_eq!(normalize_date("15/01/2024").as_deref(), Some("2024-01-15"));
    }

    #[test]
    fn test_ambiguous_dates_read_month_first() {
        // Both components fit either reading; month-first is the policy.
        assert_eq!(normalize_date("03/04/2024").as_deref(), Some("2024-03-04"));
    }

    #[test]
    fn test_iso_passthrough() {
        assert_eq!(normalize_date("2024-01-15").as_deref(), Some("2024-01-15"));
    }

    #[test]
    fn test_two_digit_year() {
        assert_eq!(normalize_date("01/15/24").as_deref(), Some("2024-01-15"));
    }

    #[test]
    fn test_heuristic_year_first_digit_runs() {
        // Dots are not in the format list; the digit-run heuristic applies
        // and the first group over 31 is the year.
        assert_eq!(normalize_date("2024.01.15").as_deref(), Some("2024-01-15"));
    }

    #[test]
    fn test_heuristic_month_first_digit_runs() {
        assert_eq!(normalize_date("01.15.2024").as_deref(), Some("2024-01-15"));
    }

    #[test]
    fn test_heuristic_century_pivot() {
        // "15.01.49": month-first order with a 2-digit year below the pivot.
        assert_eq!(normalize_date("1.15.49").as_deref(), Some("2049-01-15"));
        assert_eq!(normalize_date("1.15.99").as_deref(), Some("1999-01-15"));
    }

    #[test]
    fn test_heuristic_lone_year() {
        assert_eq!(normalize_date("2024").as_deref(), Some("2024-01-01"));
    }

    #[test]
    fn test_garbage_is_none() {
        assert_eq!(normalize_date("garbage"), None);
        assert_eq!(normalize_date(""), None);
        assert_eq!(normalize_date("  "), None);
    }

    #[test]
    fn test_invalid_calendar_date_is_none() {
        assert_eq!(normalize_date("13/45/2024"), None);
        assert_eq!(normalize_date("2024.13.45"), None);
    }

    #[test]
    fn test_absurd_year_is_none() {
        assert_eq!(normalize_date("20240115"), None);
    }
}
