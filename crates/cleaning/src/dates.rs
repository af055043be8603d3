//! Raw timestamp text -> calendar date

use chrono::{DateTime, NaiveDate, NaiveDateTime};

const DATETIME_FORMATS: &[&str] = &["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"];
const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%Y/%m/%d"];

/// Parse a review timestamp into its date; anything unrecognised is `None`
pub fn parse_review_date(raw: &str) -> Option<NaiveDate> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }

    if let Ok(ts) = DateTime::parse_from_rfc3339(raw) {
        return Some(ts.date_naive());
    }

    DATETIME_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(raw, fmt).ok())
        .map(|ts| ts.date())
        .or_else(|| {
            DATE_FORMATS
                .iter()
                .find_map(|fmt| NaiveDate::parse_from_str(raw, fmt).ok())
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ymd(y: i32, m: u32, d: u32) -> Option<NaiveDate> {
        NaiveDate::from_ymd_opt(y, m, d)
    }

    #[test]
    fn test_rfc3339() {
        assert_eq!(parse_review_date("2024-05-01T10:40:00Z"), ymd(2024, 5, 1));
        assert_eq!(parse_review_date("2024-05-01T23:10:00+03:00"), ymd(2024, 5, 1));
    }

    #[test]
    fn test_naive_forms() {
        assert_eq!(parse_review_date("2024-05-01T10:40:00"), ymd(2024, 5, 1));
        assert_eq!(parse_review_date("2024-05-01 10:40:00.123456"), ymd(2024, 5, 1));
        assert_eq!(parse_review_date("2024-05-01"), ymd(2024, 5, 1));
        assert_eq!(parse_review_date("2024/05/01"), ymd(2024, 5, 1));
    }

    #[test]
    fn test_unparseable_is_none() {
        assert_eq!(parse_review_date(""), None);
        assert_eq!(parse_review_date("yesterday"), None);
        assert_eq!(parse_review_date("2024-13-45"), None);
    }
}
