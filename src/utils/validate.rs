use crate::model::attendance::AttendanceStatus;
use chrono::{NaiveDate, NaiveTime};
use std::str::FromStr;

/// Shared eager validation for the attendance surface. The recorder, the
/// list view and both exports all parse their inputs through these helpers;
/// each failure is a single human-readable complaint naming the field, and
/// callers collect them into the `details` array of a VALIDATION_ERROR.

pub fn parse_date(field: &str, value: &str) -> Result<NaiveDate, String> {
    NaiveDate::parse_from_str(value.trim(), "%Y-%m-%d")
        .map_err(|_| format!("{} must be a valid date (YYYY-MM-DD)", field))
}

pub fn parse_time(field: &str, value: &str) -> Result<NaiveTime, String> {
    NaiveTime::parse_from_str(value.trim(), "%H:%M")
        .map_err(|_| format!("{} must be a valid time (HH:MM)", field))
}

pub fn parse_status(value: &str) -> Result<AttendanceStatus, String> {
    AttendanceStatus::from_str(value.trim())
        .map_err(|_| "status must be one of PRESENT, ABSENT, LEAVE, HALF_DAY".to_string())
}

pub fn check_range(from: NaiveDate, to: NaiveDate) -> Result<(), String> {
    if to < from {
        Err("date_to must not be earlier than date_from".to_string())
    } else {
        Ok(())
    }
}

/// Booleans arrive from the SPA as the strings "true"/"1"; anything else
/// (including absence) is false.
pub fn query_flag(value: Option<&str>) -> bool {
    matches!(value.map(str::trim), Some("true") | Some("1"))
}

/// Same policy for JSON bodies, where the client may send either a real
/// boolean or the string form.
pub fn json_flag(value: Option<&serde_json::Value>) -> bool {
    match value {
        Some(serde_json::Value::Bool(b)) => *b,
        Some(serde_json::Value::String(s)) => query_flag(Some(s)),
        _ => false,
    }
}

/// Pagination clamps: page is 1-based, pageSize capped at 100, default 10.
pub fn clamp_paging(page: Option<u32>, page_size: Option<u32>) -> (u32, u32) {
    let page = page.unwrap_or(1).max(1);
    let page_size = page_size.unwrap_or(10).clamp(1, 100);
    (page, page_size)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn date_errors_name_the_field() {
        let err = parse_date("date_from", "03/04/2024").unwrap_err();
        assert!(err.starts_with("date_from "), "got: {err}");
        assert!(parse_date("from", "2024-03-04").is_ok());
    }

    #[test]
    fn time_must_be_hh_mm() {
        assert!(parse_time("clock_in", "09:30").is_ok());
        assert!(parse_time("clock_in", "9:30am").is_err());
        assert!(parse_time("clock_in", "25:00").is_err());
    }

    #[test]
    fn status_rejects_unknown_values() {
        assert_eq!(parse_status("HALF_DAY").unwrap(), AttendanceStatus::HalfDay);
        assert!(parse_status("VACATION").is_err());
    }

    #[test]
    fn inverted_ranges_are_rejected() {
        let from = "2024-03-08".parse().unwrap();
        let to = "2024-03-04".parse().unwrap();
        assert!(check_range(from, to).is_err());
        assert!(check_range(to, from).is_ok());
        assert!(check_range(from, from).is_ok());
    }

    #[test]
    fn flags_accept_true_and_one_only() {
        assert!(query_flag(Some("true")));
        assert!(query_flag(Some("1")));
        assert!(!query_flag(Some("false")));
        assert!(!query_flag(Some("yes")));
        assert!(!query_flag(None));
    }

    #[test]
    fn json_flags_accept_both_shapes() {
        assert!(json_flag(Some(&json!(true))));
        assert!(json_flag(Some(&json!("true"))));
        assert!(!json_flag(Some(&json!("no"))));
        assert!(!json_flag(None));
    }

    #[test]
    fn paging_is_clamped() {
        assert_eq!(clamp_paging(None, None), (1, 10));
        assert_eq!(clamp_paging(Some(0), Some(0)), (1, 1));
        assert_eq!(clamp_paging(Some(3), Some(500)), (3, 100));
    }
}
