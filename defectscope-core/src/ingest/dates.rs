//! Flexible timestamp parsing for export cells
//!
//! Jira exports mix formats depending on locale and field origin:
//! ISO 8601 (`2023-08-10T10:17:00.000Z`), SQL-ish
//! (`2023-11-02 00:00:00.0`), bare dates (`2023-11-02`), and the
//! day-first form (`10.08.2023 13:17`). All of them normalize to UTC.
//!
//! An unparseable cell yields `None`; the importer records a warning and
//! moves on instead of failing the row.

use chrono::{DateTime, NaiveDate, NaiveDateTime, TimeZone, Utc};

/// Naive formats tried in order after RFC 3339.
const NAIVE_DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S%.f",
    "%d.%m.%Y %H:%M:%S",
    "%d.%m.%Y %H:%M",
];

const NAIVE_DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%d.%m.%Y"];

/// Parse a timestamp cell, returning `None` for blank or malformed input.
pub fn parse_flexible(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }

    if let Ok(ts) = DateTime::parse_from_rfc3339(raw) {
        return Some(ts.with_timezone(&Utc));
    }

    for format in NAIVE_DATETIME_FORMATS {
        if let Ok(naive) = NaiveDateTime::parse_from_str(raw, format) {
            return Some(Utc.from_utc_datetime(&naive));
        }
    }

    for format in NAIVE_DATE_FORMATS {
        if let Ok(date) = NaiveDate::parse_from_str(raw, format) {
            return Some(Utc.from_utc_datetime(&date.and_hms_opt(0, 0, 0)?));
        }
    }

    None
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parsed(raw: &str) -> String {
        parse_flexible(raw)
            .expect("should parse")
            .format("%Y-%m-%dT%H:%M:%S")
            .to_string()
    }

    #[test]
    fn test_iso_with_zone() {
        assert_eq!(parsed("2023-08-10T10:17:00.000Z"), "2023-08-10T10:17:00");
        assert_eq!(parsed("2023-08-10T12:17:00+02:00"), "2023-08-10T10:17:00");
    }

    #[test]
    fn test_iso_naive() {
        assert_eq!(parsed("2023-08-10T10:17:00"), "2023-08-10T10:17:00");
    }

    #[test]
    fn test_sql_style() {
        assert_eq!(parsed("2023-11-02 00:00:00.0"), "2023-11-02T00:00:00");
        assert_eq!(parsed("2023-11-02 08:49:13"), "2023-11-02T08:49:13");
    }

    #[test]
    fn test_bare_dates() {
        assert_eq!(parsed("2023-11-02"), "2023-11-02T00:00:00");
        assert_eq!(parsed("10.08.2023"), "2023-08-10T00:00:00");
    }

    #[test]
    fn test_day_first_with_time() {
        assert_eq!(parsed("10.08.2023 13:17"), "2023-08-10T13:17:00");
        assert_eq!(parsed("07.02.2024 11:49:30"), "2024-02-07T11:49:30");
    }

    #[test]
    fn test_blank_and_garbage() {
        assert_eq!(parse_flexible(""), None);
        assert_eq!(parse_flexible("   "), None);
        assert_eq!(parse_flexible("not a date"), None);
        assert_eq!(parse_flexible("2023-13-45"), None);
    }
}
