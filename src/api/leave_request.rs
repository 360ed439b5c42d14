use crate::auth::auth::AuthUser;
use crate::error::ApiError;
use crate::model::leave_request::LeaveResponse;
use crate::utils::validate::{check_range, clamp_paging, parse_date};
use actix_web::{HttpResponse, web};
use serde::{Deserialize, Serialize};
use sqlx::MySqlPool;
use utoipa::{IntoParams, ToSchema};

/* =========================
Leave registry: the engine consumes APPROVED spans from here; the endpoints
below are the thin surface HR uses to keep that registry current.
========================= */

#[derive(Deserialize, ToSchema)]
pub struct CreateLeave {
    #[schema(example = 1000)]
    pub employee_id: u64,
    #[schema(example = "2026-01-01")]
    pub date_from: Option<String>,
    #[schema(example = "2026-01-03")]
    pub date_to: Option<String>,
}

#[derive(Deserialize, IntoParams, ToSchema)]
pub struct LeaveFilter {
    /// Filter by employee ID
    #[schema(example = 123)]
    pub employee_id: Option<u64>,
    /// Filter by leave status
    #[schema(example = "PENDING")]
    pub status: Option<String>,
    /// Pagination page number (start with 1)
    #[schema(example = 1)]
    pub page: Option<u32>,
    /// Pagination per page number
    #[serde(rename = "pageSize")]
    #[schema(example = 10)]
    pub page_size: Option<u32>,
}

#[derive(Serialize, ToSchema)]
pub struct LeaveListResponse {
    pub data: Vec<LeaveResponse>,
    #[schema(example = 1)]
    pub page: u32,
    #[serde(rename = "pageSize")]
    #[schema(example = 10)]
    pub page_size: u32,
    #[schema(example = 1)]
    pub total: i64,
}

// Helper enum for typed SQLx binding
enum FilterValue<'a> {
    U64(u64),
    Str(&'a str),
}

/* =========================
Record leave request (HR/Admin, on behalf of an employee)
========================= */
#[utoipa::path(
    post,
    path = "/api/leave",
    request_body(
        content = CreateLeave,
        description = "Leave request payload",
        content_type = "application/json"
    ),
    responses(
        (status = 201, description = "Leave request recorded", body = Object, example = json!({
            "message": "Leave request recorded",
            "status": "PENDING"
        })),
        (status = 400, description = "Bad request"),
        (status = 404, description = "Employee not found"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden")
    ),
    security(("bearer_auth" = [])),
    tag = "Leave"
)]
pub async fn create_leave(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    payload: web::Json<CreateLeave>,
) -> actix_web::Result<HttpResponse> {
    auth.require_hr_or_admin()?;

    let mut details = Vec::new();
    let date_from = match payload.date_from.as_deref() {
        Some(raw) => parse_date("date_from", raw).map_err(|e| details.push(e)).ok(),
        None => {
            details.push("date_from is required".to_string());
            None
        }
    };
    let date_to = match payload.date_to.as_deref() {
        Some(raw) => parse_date("date_to", raw).map_err(|e| details.push(e)).ok(),
        None => date_from,
    };
    if let (Some(from), Some(to)) = (date_from, date_to) {
        if let Err(e) = check_range(from, to) {
            details.push(e);
        }
    }
    if !details.is_empty() {
        return Err(ApiError::validation("invalid leave payload", details).into());
    }

    let exists = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM employees WHERE id = ?")
        .bind(payload.employee_id)
        .fetch_one(pool.get_ref())
        .await
        .map_err(|e| {
            tracing::error!(error = %e, employee_id = payload.employee_id, "Failed to check employee");
            ApiError::Internal
        })?;
    if exists == 0 {
        return Err(ApiError::NotFound("employee not found".to_string()).into());
    }

    sqlx::query(
        "INSERT INTO leave_requests (employee_id, date_from, date_to, status) VALUES (?, ?, ?, 'PENDING')",
    )
    .bind(payload.employee_id)
    .bind(date_from.unwrap())
    .bind(date_to.unwrap())
    .execute(pool.get_ref())
    .await
    .map_err(|e| {
        tracing::error!(error = %e, employee_id = payload.employee_id, "Failed to create leave request");
        ApiError::Internal
    })?;

    Ok(HttpResponse::Created().json(serde_json::json!({
        "message": "Leave request recorded",
        "status": "PENDING"
    })))
}

/* =========================
Approve leave (HR/Admin)
========================= */
#[utoipa::path(
    put,
    path = "/api/leave/{leave_id}/approve",
    params(
        ("leave_id" = u64, Path, description = "ID of the leave request to approve")
    ),
    responses(
        (status = 200, description = "Leave approved", body = Object, example = json!({
            "message": "Leave approved"
        })),
        (status = 400, description = "Leave request not found or already processed"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden")
    ),
    security(("bearer_auth" = [])),
    tag = "Leave"
)]
pub async fn approve_leave(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    path: web::Path<u64>,
) -> actix_web::Result<HttpResponse> {
    auth.require_hr_or_admin()?;

    let leave_id = path.into_inner();

    let result = sqlx::query(
        "UPDATE leave_requests SET status = 'APPROVED' WHERE id = ? AND status = 'PENDING'",
    )
    .bind(leave_id)
    .execute(pool.get_ref())
    .await
    .map_err(|e| {
        tracing::error!(error = %e, leave_id, "Approve leave failed");
        ApiError::Internal
    })?;

    if result.rows_affected() == 0 {
        return Err(ApiError::validation(
            "Leave request not found or already processed",
            Vec::new(),
        )
        .into());
    }

    Ok(HttpResponse::Ok().json(serde_json::json!({
        "message": "Leave approved"
    })))
}

/* =========================
Reject leave (HR/Admin)
========================= */
#[utoipa::path(
    put,
    path = "/api/leave/{leave_id}/reject",
    params(
        ("leave_id" = u64, Path, description = "ID of the leave request to reject")
    ),
    responses(
        (status = 200, description = "Leave rejected", body = Object, example = json!({
            "message": "Leave rejected"
        })),
        (status = 400, description = "Leave request not found or already processed"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden")
    ),
    security(("bearer_auth" = [])),
    tag = "Leave"
)]
pub async fn reject_leave(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    path: web::Path<u64>,
) -> actix_web::Result<HttpResponse> {
    auth.require_hr_or_admin()?;

    let leave_id = path.into_inner();

    let result = sqlx::query(
        "UPDATE leave_requests SET status = 'REJECTED' WHERE id = ? AND status = 'PENDING'",
    )
    .bind(leave_id)
    .execute(pool.get_ref())
    .await
    .map_err(|e| {
        tracing::error!(error = %e, leave_id, "Reject leave failed");
        ApiError::Internal
    })?;

    if result.rows_affected() == 0 {
        return Err(ApiError::validation(
            "Leave request not found or already processed",
            Vec::new(),
        )
        .into());
    }

    Ok(HttpResponse::Ok().json(serde_json::json!({
        "message": "Leave rejected"
    })))
}

/* =========================
List leave requests
========================= */
#[utoipa::path(
    get,
    path = "/api/leave",
    params(LeaveFilter),
    responses(
        (status = 200, description = "Paginated leave list", body = LeaveListResponse),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden")
    ),
    security(("bearer_auth" = [])),
    tag = "Leave"
)]
pub async fn leave_list(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    query: web::Query<LeaveFilter>,
) -> actix_web::Result<HttpResponse> {
    auth.require_hr_or_admin()?;

    let (page, page_size) = clamp_paging(query.page, query.page_size);
    let offset = (page - 1) as i64 * page_size as i64;

    // -------------------------
    // WHERE clause
    // -------------------------
    let mut where_sql = String::from(" WHERE 1=1");
    let mut args: Vec<FilterValue> = Vec::new();

    if let Some(emp_id) = query.employee_id {
        where_sql.push_str(" AND employee_id = ?");
        args.push(FilterValue::U64(emp_id));
    }

    if let Some(status) = query.status.as_deref() {
        where_sql.push_str(" AND status = ?");
        args.push(FilterValue::Str(status));
    }

    // -------------------------
    // COUNT query
    // -------------------------
    let count_sql = format!("SELECT COUNT(*) FROM leave_requests{}", where_sql);

    let mut count_q = sqlx::query_scalar::<_, i64>(&count_sql);
    for arg in &args {
        count_q = match arg {
            FilterValue::U64(v) => count_q.bind(*v),
            FilterValue::Str(s) => count_q.bind(*s),
        };
    }

    let total = count_q.fetch_one(pool.get_ref()).await.map_err(|e| {
        tracing::error!(error = %e, "Failed to count leave requests");
        ApiError::Internal
    })?;

    // -------------------------
    // DATA query
    // -------------------------
    let data_sql = format!(
        r#"
        SELECT id, employee_id, date_from, date_to, status, created_at
        FROM leave_requests
        {}
        ORDER BY created_at DESC
        LIMIT ? OFFSET ?
        "#,
        where_sql
    );

    let mut data_q = sqlx::query_as::<_, LeaveResponse>(&data_sql);
    for arg in args {
        data_q = match arg {
            FilterValue::U64(v) => data_q.bind(v),
            FilterValue::Str(s) => data_q.bind(s),
        };
    }

    let leaves = data_q
        .bind(page_size as i64)
        .bind(offset)
        .fetch_all(pool.get_ref())
        .await
        .map_err(|e| {
            tracing::error!(error = %e, "Failed to fetch leave list");
            ApiError::Internal
        })?;

    Ok(HttpResponse::Ok().json(LeaveListResponse {
        data: leaves,
        page,
        page_size,
        total,
    }))
}
