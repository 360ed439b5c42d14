use crate::error::ApiError;
use crate::model::attendance::AttendanceStatus;
use crate::model::employee::EmployeeRef;
use crate::utils::date_range::expand_range;
use crate::utils::validate::{check_range, json_flag, parse_date, parse_status, parse_time};
use chrono::{NaiveDate, NaiveTime};
use serde::Deserialize;
use sqlx::MySqlPool;
use utoipa::ToSchema;

/// Range-apply request body. Everything arrives loosely typed (the SPA sends
/// dates and flags as strings) and is validated eagerly here, before any
/// database work.
#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct ApplyAttendance {
    #[schema(example = 1)]
    pub employee_id: Option<u64>,
    #[schema(example = "EMP-001")]
    pub employee_code: Option<String>,
    #[schema(example = "2024-03-04")]
    pub date_from: Option<String>,
    #[schema(example = "2024-03-08")]
    pub date_to: Option<String>,
    #[schema(example = "ABSENT")]
    pub status: Option<String>,
    #[schema(example = "09:00")]
    pub clock_in: Option<String>,
    #[schema(example = "17:30")]
    pub clock_out: Option<String>,
    #[serde(rename = "includeWeekends")]
    #[schema(value_type = Option<bool>)]
    pub include_weekends: Option<serde_json::Value>,
}

/// Validated form of an apply request, ready to expand and write.
#[derive(Debug, PartialEq)]
pub struct ApplyPlan {
    pub date_from: NaiveDate,
    pub date_to: NaiveDate,
    pub status: AttendanceStatus,
    pub clock_in: Option<NaiveTime>,
    pub clock_out: Option<NaiveTime>,
    pub include_weekends: bool,
}

/// Eager validation pass: collects every field complaint before rejecting,
/// so the client can surface them all at once. `date_to` defaults to
/// `date_from` for single-day applies.
pub fn validate_apply(body: &ApplyAttendance) -> Result<ApplyPlan, ApiError> {
    let mut details = Vec::new();

    if body.employee_id.is_none() && body.employee_code.is_none() {
        details.push("employee_id or employee_code is required".to_string());
    }

    let date_from = match body.date_from.as_deref() {
        Some(raw) => match parse_date("date_from", raw) {
            Ok(d) => Some(d),
            Err(e) => {
                details.push(e);
                None
            }
        },
        None => {
            details.push("date_from is required".to_string());
            None
        }
    };

    let date_to = match body.date_to.as_deref() {
        Some(raw) => match parse_date("date_to", raw) {
            Ok(d) => Some(d),
            Err(e) => {
                details.push(e);
                None
            }
        },
        None => date_from,
    };

    if let (Some(from), Some(to)) = (date_from, date_to) {
        if let Err(e) = check_range(from, to) {
            details.push(e);
        }
    }

    let status = match body.status.as_deref() {
        Some(raw) => match parse_status(raw) {
            Ok(s) => Some(s),
            Err(e) => {
                details.push(e);
                None
            }
        },
        None => {
            details.push("status is required".to_string());
            None
        }
    };

    let clock_in = match body.clock_in.as_deref().filter(|v| !v.trim().is_empty()) {
        Some(raw) => match parse_time("clock_in", raw) {
            Ok(t) => Some(t),
            Err(e) => {
                details.push(e);
                None
            }
        },
        None => None,
    };
    let clock_out = match body.clock_out.as_deref().filter(|v| !v.trim().is_empty()) {
        Some(raw) => match parse_time("clock_out", raw) {
            Ok(t) => Some(t),
            Err(e) => {
                details.push(e);
                None
            }
        },
        None => None,
    };

    if !details.is_empty() {
        return Err(ApiError::validation("invalid attendance payload", details));
    }

    // Unwraps cannot fail: any None pushed a detail above.
    Ok(ApplyPlan {
        date_from: date_from.unwrap(),
        date_to: date_to.unwrap(),
        status: status.unwrap(),
        clock_in,
        clock_out,
        include_weekends: json_flag(body.include_weekends.as_ref()),
    })
}

/// Resolves the target employee for a write. Unlike the read paths, a miss
/// here is a hard 404.
pub async fn resolve_target(
    pool: &MySqlPool,
    body: &ApplyAttendance,
) -> Result<EmployeeRef, ApiError> {
    let row = if let Some(id) = body.employee_id {
        sqlx::query_as::<_, EmployeeRef>(
            "SELECT id, employee_code, name FROM employees WHERE id = ?",
        )
        .bind(id)
        .fetch_optional(pool)
        .await?
    } else {
        sqlx::query_as::<_, EmployeeRef>(
            "SELECT id, employee_code, name FROM employees WHERE employee_code = ?",
        )
        .bind(body.employee_code.as_deref().unwrap_or_default())
        .fetch_optional(pool)
        .await?
    };

    row.ok_or_else(|| ApiError::NotFound("employee not found".to_string()))
}

/// Writes one exception row per included day, all inside a single
/// transaction: either every day lands or none does. The same clock_in /
/// clock_out pair is stamped on every day of the range. Returns the
/// affected dates in calendar order.
pub async fn apply_range(
    pool: &MySqlPool,
    employee: &EmployeeRef,
    plan: &ApplyPlan,
) -> Result<Vec<NaiveDate>, ApiError> {
    let days = expand_range(plan.date_from, plan.date_to, plan.include_weekends);
    if days.is_empty() {
        return Ok(days);
    }

    let mut tx = pool.begin().await?;
    for day in &days {
        sqlx::query(
            r#"
            INSERT INTO attendance_exceptions (employee_id, work_date, status, clock_in, clock_out)
            VALUES (?, ?, ?, ?, ?)
            ON DUPLICATE KEY UPDATE
                status = VALUES(status),
                clock_in = VALUES(clock_in),
                clock_out = VALUES(clock_out)
            "#,
        )
        .bind(employee.id)
        .bind(day)
        .bind(plan.status.to_string())
        .bind(plan.clock_in)
        .bind(plan.clock_out)
        .execute(&mut *tx)
        .await
        .map_err(|e| {
            // Dropping the transaction rolls back every prior day.
            tracing::error!(error = %e, employee_id = employee.id, %day, "range-apply upsert failed");
            ApiError::Internal
        })?;
    }
    tx.commit().await?;

    Ok(days)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn body(from: &str, to: Option<&str>, status: &str) -> ApplyAttendance {
        ApplyAttendance {
            employee_id: Some(1),
            date_from: Some(from.to_string()),
            date_to: to.map(str::to_string),
            status: Some(status.to_string()),
            ..Default::default()
        }
    }

    #[test]
    fn weekday_week_expands_to_five_days() {
        let plan = validate_apply(&body("2024-03-04", Some("2024-03-08"), "ABSENT")).unwrap();
        let days = expand_range(plan.date_from, plan.date_to, plan.include_weekends);
        let expected: Vec<NaiveDate> = [
            "2024-03-04",
            "2024-03-05",
            "2024-03-06",
            "2024-03-07",
            "2024-03-08",
        ]
        .iter()
        .map(|s| s.parse().unwrap())
        .collect();
        assert_eq!(days, expected);
    }

    #[test]
    fn date_to_defaults_to_date_from() {
        let plan = validate_apply(&body("2024-03-04", None, "PRESENT")).unwrap();
        assert_eq!(plan.date_from, plan.date_to);
    }

    #[test]
    fn missing_fields_are_all_reported() {
        let err = validate_apply(&ApplyAttendance::default()).unwrap_err();
        match err {
            ApiError::Validation { details, .. } => {
                assert_eq!(details.len(), 3);
                assert!(details.iter().any(|d| d.contains("employee_id")));
                assert!(details.iter().any(|d| d.contains("date_from")));
                assert!(details.iter().any(|d| d.contains("status")));
            }
            other => panic!("expected validation error, got {other:?}"),
        }
    }

    #[test]
    fn inverted_range_is_rejected() {
        let err = validate_apply(&body("2024-03-08", Some("2024-03-04"), "ABSENT")).unwrap_err();
        match err {
            ApiError::Validation { details, .. } => {
                assert!(details.iter().any(|d| d.contains("date_to")));
            }
            other => panic!("expected validation error, got {other:?}"),
        }
    }

    #[test]
    fn bad_clock_and_status_are_rejected_together() {
        let mut b = body("2024-03-04", None, "SOMETIMES");
        b.clock_in = Some("9am".to_string());
        let err = validate_apply(&b).unwrap_err();
        match err {
            ApiError::Validation { details, .. } => {
                assert!(details.iter().any(|d| d.contains("status")));
                assert!(details.iter().any(|d| d.contains("clock_in")));
            }
            other => panic!("expected validation error, got {other:?}"),
        }
    }

    #[test]
    fn one_clock_pair_is_kept_for_the_whole_range() {
        let mut b = body("2024-03-04", Some("2024-03-08"), "HALF_DAY");
        b.clock_in = Some("09:00".to_string());
        b.clock_out = Some("13:00".to_string());
        let plan = validate_apply(&b).unwrap();
        // The recorder stamps this same pair on every day it writes.
        assert_eq!(plan.clock_in, chrono::NaiveTime::from_hms_opt(9, 0, 0));
        assert_eq!(plan.clock_out, chrono::NaiveTime::from_hms_opt(13, 0, 0));
    }

    #[test]
    fn include_weekends_accepts_the_stringly_form() {
        let mut b = body("2024-03-04", Some("2024-03-10"), "ABSENT");
        b.include_weekends = Some(json!("true"));
        let plan = validate_apply(&b).unwrap();
        assert!(plan.include_weekends);
        let days = expand_range(plan.date_from, plan.date_to, plan.include_weekends);
        assert_eq!(days.len(), 7);
    }
}
