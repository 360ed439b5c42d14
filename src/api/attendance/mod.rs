pub mod engine;
pub mod recorder;
pub mod report_csv;
pub mod report_pdf;

use crate::auth::auth::AuthUser;
use crate::config::Config;
use crate::error::ApiError;
use crate::utils::export::{export_filename, org_now};
use crate::utils::validate::{check_range, clamp_paging, parse_date, query_flag};
use actix_web::{HttpResponse, web};
use chrono::NaiveDate;
use engine::{EmployeeFilter, computed_rows, fetch_exceptions_all, fetch_exceptions_page,
             paginate, resolve_employees, summarize};
use report_csv::{CsvRow, write_csv};
use report_pdf::{PdfMeta, pivot_counters, render_summary_pdf};
use serde::{Deserialize, Serialize};
use sqlx::MySqlPool;
use utoipa::IntoParams;

/// Query surface shared by the list view and both exports. Dates and flags
/// arrive as strings from the SPA and are validated here, not by serde, so
/// rejections can name the offending field.
#[derive(Debug, Default, Deserialize, IntoParams)]
pub struct AttendanceQuery {
    /// Filter by employee id (wins over code and q)
    pub employee_id: Option<u64>,
    /// Filter by unique employee code
    pub employee_code: Option<String>,
    /// Free-text search over code/name/email (ACTIVE employees only)
    pub q: Option<String>,
    /// Range start, YYYY-MM-DD
    pub from: Option<String>,
    /// Range end, YYYY-MM-DD
    pub to: Option<String>,
    /// Exceptions view: one row per record instead of per-employee summary
    pub detail: Option<String>,
    /// Materialize every included day instead of exceptions-only
    #[serde(rename = "includeComputed")]
    pub include_computed: Option<String>,
    /// Keep Saturdays/Sundays in the expanded range
    #[serde(rename = "includeWeekends")]
    pub include_weekends: Option<String>,
    /// Page number, 1-based
    pub page: Option<u32>,
    /// Rows per page (1..100, default 10)
    #[serde(rename = "pageSize")]
    pub page_size: Option<u32>,
}

#[derive(Serialize)]
pub struct ListResponse<T: Serialize> {
    pub data: Vec<T>,
    pub page: u32,
    #[serde(rename = "pageSize")]
    pub page_size: u32,
    pub total: i64,
}

fn text_filter(value: &Option<String>) -> Option<String> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

fn employee_filter(query: &AttendanceQuery) -> EmployeeFilter {
    EmployeeFilter {
        employee_id: query.employee_id,
        employee_code: text_filter(&query.employee_code),
        q: text_filter(&query.q),
    }
}

fn parse_opt_date(
    field: &str,
    value: Option<&str>,
    details: &mut Vec<String>,
) -> Option<NaiveDate> {
    match value.map(str::trim).filter(|v| !v.is_empty()) {
        Some(raw) => match parse_date(field, raw) {
            Ok(d) => Some(d),
            Err(e) => {
                details.push(e);
                None
            }
        },
        None => None,
    }
}

/// Parses and cross-checks the date range; `require_both` is the computed
/// view's refusal to materialize an unbounded range.
fn parse_range(
    query: &AttendanceQuery,
    require_both: bool,
) -> Result<(Option<NaiveDate>, Option<NaiveDate>), ApiError> {
    let mut details = Vec::new();
    let from = parse_opt_date("from", query.from.as_deref(), &mut details);
    let to = parse_opt_date("to", query.to.as_deref(), &mut details);

    if require_both {
        if query.from.as_deref().map(str::trim).unwrap_or("").is_empty() {
            details.push("from is required".to_string());
        }
        if query.to.as_deref().map(str::trim).unwrap_or("").is_empty() {
            details.push("to is required".to_string());
        }
    }
    if let (Some(from), Some(to)) = (from, to) {
        if let Err(e) = check_range(from, to) {
            details.push(e);
        }
    }

    if details.is_empty() {
        Ok((from, to))
    } else {
        Err(ApiError::validation("invalid attendance query", details))
    }
}

/// Apply an attendance status across a date range
#[utoipa::path(
    post,
    path = "/api/attendance",
    request_body = recorder::ApplyAttendance,
    responses(
        (status = 201, description = "Status applied to every included day", body = Object, example = json!({
            "ok": true,
            "employee_id": 1,
            "status": "ABSENT",
            "days": ["2024-03-04", "2024-03-05", "2024-03-06", "2024-03-07", "2024-03-08"]
        })),
        (status = 400, description = "Validation error", body = Object, example = json!({
            "error": {"code": "VALIDATION_ERROR", "message": "invalid attendance payload", "details": ["date_from is required"]}
        })),
        (status = 404, description = "Employee not found"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden")
    ),
    security(("bearer_auth" = [])),
    tag = "Attendance"
)]
pub async fn apply_attendance(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    payload: web::Json<recorder::ApplyAttendance>,
) -> actix_web::Result<HttpResponse> {
    auth.require_hr_or_admin()?;

    let plan = recorder::validate_apply(&payload)?;
    let employee = recorder::resolve_target(pool.get_ref(), &payload).await?;
    let days = recorder::apply_range(pool.get_ref(), &employee, &plan).await?;

    Ok(HttpResponse::Created().json(serde_json::json!({
        "ok": true,
        "employee_id": employee.id,
        "status": plan.status,
        "days": days
            .iter()
            .map(|d| d.format("%Y-%m-%d").to_string())
            .collect::<Vec<_>>(),
    })))
}

/// List attendance: exceptions-only (summary or detail) or fully computed
#[utoipa::path(
    get,
    path = "/api/attendance",
    params(AttendanceQuery),
    responses(
        (status = 200, description = "Paginated attendance rows", body = Object, example = json!({
            "data": [{
                "employee_id": 1,
                "employee_code": "EMP-001",
                "name": "John Doe",
                "start_date": "2024-03-04",
                "end_date": "2024-03-08",
                "days": 5,
                "status": "ABSENT"
            }],
            "page": 1,
            "pageSize": 10,
            "total": 1
        })),
        (status = 400, description = "Validation error"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden")
    ),
    security(("bearer_auth" = [])),
    tag = "Attendance"
)]
pub async fn list_attendance(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    config: web::Data<Config>,
    query: web::Query<AttendanceQuery>,
) -> actix_web::Result<HttpResponse> {
    auth.require_hr_or_admin()?;

    let include_computed = query_flag(query.include_computed.as_deref());
    let include_weekends = query_flag(query.include_weekends.as_deref());
    let detail = query_flag(query.detail.as_deref());
    let (page, page_size) = clamp_paging(query.page, query.page_size);

    let (from, to) = parse_range(&query, include_computed)?;
    let emps = resolve_employees(pool.get_ref(), &employee_filter(&query)).await?;

    if include_computed {
        // parse_range enforced both bounds above.
        let rows = computed_rows(
            pool.get_ref(),
            &emps,
            from.unwrap(),
            to.unwrap(),
            include_weekends,
            config.max_report_cells,
        )
        .await?;
        let (data, total) = paginate(rows, page, page_size);
        return Ok(HttpResponse::Ok().json(ListResponse {
            data,
            page,
            page_size,
            total,
        }));
    }

    let ids: Vec<u64> = emps.iter().map(|e| e.id).collect();

    if detail {
        let (data, total) =
            fetch_exceptions_page(pool.get_ref(), &ids, from, to, page, page_size).await?;
        return Ok(HttpResponse::Ok().json(ListResponse {
            data,
            page,
            page_size,
            total,
        }));
    }

    let rows = fetch_exceptions_all(pool.get_ref(), &ids, from, to).await?;
    let (data, total) = paginate(summarize(&rows), page, page_size);
    Ok(HttpResponse::Ok().json(ListResponse {
        data,
        page,
        page_size,
        total,
    }))
}

/// Export attendance as CSV (full filtered set, no paging)
#[utoipa::path(
    get,
    path = "/api/attendance/export.csv",
    params(AttendanceQuery),
    responses(
        (status = 200, description = "CSV attachment", content_type = "text/csv"),
        (status = 400, description = "Validation error"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden")
    ),
    security(("bearer_auth" = [])),
    tag = "Attendance"
)]
pub async fn export_attendance_csv(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    config: web::Data<Config>,
    query: web::Query<AttendanceQuery>,
) -> actix_web::Result<HttpResponse> {
    auth.require_hr_or_admin()?;

    let include_computed = query_flag(query.include_computed.as_deref());
    let include_weekends = query_flag(query.include_weekends.as_deref());

    let (from, to) = parse_range(&query, include_computed)?;
    let emps = resolve_employees(pool.get_ref(), &employee_filter(&query)).await?;

    let rows: Vec<CsvRow> = if include_computed {
        computed_rows(
            pool.get_ref(),
            &emps,
            from.unwrap(),
            to.unwrap(),
            include_weekends,
            config.max_report_cells,
        )
        .await?
        .iter()
        .map(CsvRow::from)
        .collect()
    } else {
        let ids: Vec<u64> = emps.iter().map(|e| e.id).collect();
        fetch_exceptions_all(pool.get_ref(), &ids, from, to)
            .await?
            .iter()
            .map(CsvRow::from)
            .collect()
    };

    let body = write_csv(&rows)?;
    let filter_label = text_filter(&query.q).or_else(|| text_filter(&query.employee_code));
    let filename = export_filename(
        "attendance",
        "csv",
        from,
        to,
        filter_label.as_deref(),
        include_weekends,
        include_computed,
        org_now(config.org_tz_offset),
    );

    Ok(HttpResponse::Ok()
        .content_type("text/csv; charset=utf-8")
        .insert_header((
            actix_web::http::header::CONTENT_DISPOSITION,
            format!("attachment; filename=\"{}\"", filename),
        ))
        .body(body))
}

/// Export the computed attendance summary as a tabular PDF
#[utoipa::path(
    get,
    path = "/api/attendance/summary.pdf",
    params(AttendanceQuery),
    responses(
        (status = 200, description = "PDF attachment", content_type = "application/pdf"),
        (status = 400, description = "Validation error or no employees matched"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden")
    ),
    security(("bearer_auth" = [])),
    tag = "Attendance"
)]
pub async fn attendance_summary_pdf(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    config: web::Data<Config>,
    query: web::Query<AttendanceQuery>,
) -> actix_web::Result<HttpResponse> {
    auth.require_hr_or_admin()?;

    let include_weekends = query_flag(query.include_weekends.as_deref());

    // The summary always runs on the computed view, so the range is
    // mandatory here regardless of flags.
    let (from, to) = parse_range(&query, true)?;
    let (from, to) = (from.unwrap(), to.unwrap());

    let emps = resolve_employees(pool.get_ref(), &employee_filter(&query)).await?;
    if emps.is_empty() {
        // Unlike CSV/JSON, an empty summary document is treated as an error.
        return Err(ApiError::NoMatch("no employees matched filters".to_string()).into());
    }

    let rows = computed_rows(
        pool.get_ref(),
        &emps,
        from,
        to,
        include_weekends,
        config.max_report_cells,
    )
    .await?;
    let (totals, grand) = pivot_counters(&rows);

    let generated_at = org_now(config.org_tz_offset);
    let meta = PdfMeta {
        date_from: from,
        date_to: to,
        include_weekends,
        generated_at,
    };
    let body = render_summary_pdf(&meta, &totals, &grand)?;

    let filter_label = text_filter(&query.q).or_else(|| text_filter(&query.employee_code));
    let filename = export_filename(
        "attendance_summary",
        "pdf",
        Some(from),
        Some(to),
        filter_label.as_deref(),
        include_weekends,
        true,
        generated_at,
    );

    Ok(HttpResponse::Ok()
        .content_type("application/pdf")
        .insert_header((
            actix_web::http::header::CONTENT_DISPOSITION,
            format!("attachment; filename=\"{}\"", filename),
        ))
        .body(body))
}
