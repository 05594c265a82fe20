//! Deadline parsing and formatting
//!
//! Scholarship deadlines arrive in whatever shape the student copied from a
//! listing. Everything is normalized to a calendar date (`YYYY-MM-DD`).

use chrono::{DateTime, Datelike, NaiveDate, Utc};

use crate::types::{Result, TrackerError};

/// Formats that carry a full date
const FULL_DATE_FORMATS: &[&str] = &[
    "%Y-%m-%d",
    "%Y/%m/%d",
    "%m/%d/%Y",
    "%m-%d-%Y",
    "%B %d, %Y",
    "%B %d %Y",
    "%d %B %Y",
    "%d %B, %Y",
];

/// Normalize a free-form deadline relative to `today`.
///
/// - full dates: `2025-12-01`, `12/01/2025`, `December 1, 2025`, `Dec 1st 2025`
/// - RFC 3339 timestamps keep their date part
/// - month and year only (`March 2025`, `03/2025`) mean the first of the month
/// - month and day only (`March 15`, `3/15`) mean the next occurrence on or after `today`
pub fn normalize_deadline(input: &str, today: NaiveDate) -> Option<NaiveDate> {
    let cleaned = strip_ordinals(input.trim());
    let value = cleaned.trim().trim_end_matches('.');
    if value.is_empty() {
        return None;
    }

    if let Ok(ts) = DateTime::parse_from_rfc3339(value) {
        return Some(ts.with_timezone(&Utc).date_naive());
    }

    for format in FULL_DATE_FORMATS {
        if let Ok(date) = NaiveDate::parse_from_str(value, format) {
            return Some(date);
        }
    }

    if has_year(value) {
        // Month and year only: pin to the first of the month
        let month_year = [
            (format!("1 {value}"), "%d %B %Y"),
            (format!("01/{value}"), "%d/%m/%Y"),
            (format!("01-{value}"), "%d-%m-%Y"),
        ];
        return month_year
            .iter()
            .find_map(|(candidate, format)| NaiveDate::parse_from_str(candidate, format).ok());
    }

    // No year: this year, or next year when the date already passed
    let with_year = |year: i32| {
        [
            (format!("{value} {year}"), "%B %d %Y"),
            (format!("{value} {year}"), "%d %B %Y"),
            (format!("{value}/{year}"), "%m/%d/%Y"),
        ]
        .iter()
        .find_map(|(candidate, format)| NaiveDate::parse_from_str(candidate, format).ok())
    };

    let this_year = with_year(today.year())?;
    if this_year < today {
        with_year(today.year() + 1)
    } else {
        Some(this_year)
    }
}

/// Parse a date-valued request field, naming the field on failure
pub fn parse_date_field(field: &str, value: &str) -> Result<NaiveDate> {
    normalize_deadline(value, Utc::now().date_naive()).ok_or_else(|| {
        TrackerError::validation(field, format!("{field} is not a recognizable date: '{value}'"))
    })
}

/// Whether a deadline has passed
pub fn is_past(date: NaiveDate, today: NaiveDate) -> bool {
    date < today
}

/// Display form used in emails and history details, e.g. `Dec 1, 2025`
pub fn format_display(date: NaiveDate) -> String {
    date.format("%b %-d, %Y").to_string()
}

fn has_year(value: &str) -> bool {
    let bytes = value.as_bytes();
    bytes.windows(4).enumerate().any(|(i, w)| {
        let bounded_left = i == 0 || !bytes[i - 1].is_ascii_digit();
        let bounded_right = bytes.get(i + 4).map_or(true, |b| !b.is_ascii_digit());
        bounded_left
            && bounded_right
            && w.iter().all(u8::is_ascii_digit)
            && (w.starts_with(b"19") || w.starts_with(b"20"))
    })
}

/// `1st`, `22nd`, `3rd`, `15th` -> plain numbers
fn strip_ordinals(value: &str) -> String {
    let chars: Vec<char> = value.chars().collect();
    let mut out = String::with_capacity(value.len());
    let mut i = 0;
    while i < chars.len() {
        let c = chars[i];
        out.push(c);
        if c.is_ascii_digit() {
            if let (Some(a), Some(b)) = (chars.get(i + 1), chars.get(i + 2)) {
                let suffix = [a.to_ascii_lowercase(), b.to_ascii_lowercase()];
                let ordinal = matches!(suffix, ['s', 't'] | ['n', 'd'] | ['r', 'd'] | ['t', 'h']);
                let boundary = chars.get(i + 3).map_or(true, |n| !n.is_alphanumeric());
                if ordinal && boundary {
                    i += 3;
                    continue;
                }
            }
        }
        i += 1;
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    #[test]
    fn test_full_dates() {
        let today = d(2025, 6, 1);
        assert_eq!(normalize_deadline("2025-12-01", today), Some(d(2025, 12, 1)));
        assert_eq!(normalize_deadline("12/01/2025", today), Some(d(2025, 12, 1)));
        assert_eq!(normalize_deadline("December 1, 2025", today), Some(d(2025, 12, 1)));
        assert_eq!(normalize_deadline("Dec 1, 2025", today), Some(d(2025, 12, 1)));
        assert_eq!(normalize_deadline("1 December 2025", today), Some(d(2025, 12, 1)));
        assert_eq!(normalize_deadline("March 15th, 2026", today), Some(d(2026, 3, 15)));
        assert_eq!(
            normalize_deadline("2025-12-01T17:00:00Z", today),
            Some(d(2025, 12, 1))
        );
    }

    #[test]
    fn test_month_and_year() {
        let today = d(2025, 6, 1);
        assert_eq!(normalize_deadline("March 2026", today), Some(d(2026, 3, 1)));
        assert_eq!(normalize_deadline("03/2026", today), Some(d(2026, 3, 1)));
    }

    #[test]
    fn test_missing_year_rolls_forward() {
        let today = d(2025, 6, 1);
        assert_eq!(normalize_deadline("March 15", today), Some(d(2026, 3, 15)));
        assert_eq!(normalize_deadline("September 30", today), Some(d(2025, 9, 30)));
        assert_eq!(normalize_deadline("6/1", today), Some(d(2025, 6, 1)));
    }

    #[test]
    fn test_garbage() {
        let today = d(2025, 6, 1);
        assert_eq!(normalize_deadline("", today), None);
        assert_eq!(normalize_deadline("rolling", today), None);
        assert_eq!(normalize_deadline("13/45/2025", today), None);
    }

    #[test]
    fn test_parse_date_field_names_field() {
        let err = parse_date_field("nextActionDueDate", "soon").unwrap_err();
        assert_eq!(err.field(), Some("nextActionDueDate"));
    }

    #[test]
    fn test_is_past_and_display() {
        assert!(is_past(d(2025, 1, 1), d(2025, 1, 2)));
        assert!(!is_past(d(2025, 1, 2), d(2025, 1, 2)));
        assert_eq!(format_display(d(2025, 12, 1)), "Dec 1, 2025");
    }
}
