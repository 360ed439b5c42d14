use crate::auth::auth::AuthUser;
use crate::error::ApiError;
use crate::model::employee::Employee;
use crate::utils::validate::clamp_paging;
use actix_web::{HttpResponse, web};
use serde::{Deserialize, Serialize};
use sqlx::MySqlPool;
use utoipa::{IntoParams, ToSchema};

const EMPLOYEE_COLUMNS: &str =
    "id, employee_code, name, email, phone, department, title, status, join_date";

#[derive(Debug, Deserialize, IntoParams)]
pub struct EmployeeQuery {
    /// Case-insensitive match on code, name or email
    pub q: Option<String>,
    /// Filter by status; defaults to ACTIVE
    pub status: Option<String>,
    /// Page number, 1-based
    pub page: Option<u32>,
    /// Rows per page (1..100, default 10)
    #[serde(rename = "pageSize")]
    pub page_size: Option<u32>,
}

#[derive(Serialize, ToSchema)]
pub struct EmployeeListResponse {
    pub data: Vec<Employee>,
    #[schema(example = 1)]
    pub page: u32,
    #[serde(rename = "pageSize")]
    #[schema(example = 10)]
    pub page_size: u32,
    #[schema(example = 42)]
    pub total: i64,
}

// Typed bind values for the dynamically assembled WHERE clause.
enum FilterValue<'a> {
    Str(&'a str),
    Like(String),
}

/// Search/list employees (the attendance typeahead feeds from this)
#[utoipa::path(
    get,
    path = "/api/employees",
    params(EmployeeQuery),
    responses(
        (status = 200, description = "Paginated employee list", body = EmployeeListResponse),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden")
    ),
    security(("bearer_auth" = [])),
    tag = "Employee"
)]
pub async fn list_employees(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    query: web::Query<EmployeeQuery>,
) -> actix_web::Result<HttpResponse> {
    auth.require_hr_or_admin()?;

    let (page, page_size) = clamp_paging(query.page, query.page_size);
    let offset = (page - 1) as i64 * page_size as i64;

    // -------------------------
    // WHERE clause
    // -------------------------
    let mut where_sql = String::from(" WHERE 1=1");
    let mut args: Vec<FilterValue> = Vec::new();

    let status = query.status.as_deref().map(str::trim).unwrap_or("ACTIVE");
    if !status.eq_ignore_ascii_case("ALL") {
        where_sql.push_str(" AND status = ?");
        args.push(FilterValue::Str(status));
    }

    if let Some(q) = query.q.as_deref().map(str::trim).filter(|q| !q.is_empty()) {
        where_sql
            .push_str(" AND (LOWER(employee_code) LIKE ? OR LOWER(name) LIKE ? OR LOWER(email) LIKE ?)");
        let like = format!("%{}%", q.to_lowercase());
        args.push(FilterValue::Like(like.clone()));
        args.push(FilterValue::Like(like.clone()));
        args.push(FilterValue::Like(like));
    }

    // -------------------------
    // COUNT query
    // -------------------------
    let count_sql = format!("SELECT COUNT(*) FROM employees{}", where_sql);
    let mut count_q = sqlx::query_scalar::<_, i64>(&count_sql);
    for arg in &args {
        count_q = match arg {
            FilterValue::Str(s) => count_q.bind(*s),
            FilterValue::Like(l) => count_q.bind(l.clone()),
        };
    }
    let total = count_q.fetch_one(pool.get_ref()).await.map_err(|e| {
        tracing::error!(error = %e, "Failed to count employees");
        ApiError::Internal
    })?;

    // -------------------------
    // DATA query
    // -------------------------
    let data_sql = format!(
        "SELECT {} FROM employees{} ORDER BY name ASC, id ASC LIMIT ? OFFSET ?",
        EMPLOYEE_COLUMNS, where_sql
    );
    let mut data_q = sqlx::query_as::<_, Employee>(&data_sql);
    for arg in &args {
        data_q = match arg {
            FilterValue::Str(s) => data_q.bind(*s),
            FilterValue::Like(l) => data_q.bind(l.clone()),
        };
    }
    let employees = data_q
        .bind(page_size as i64)
        .bind(offset)
        .fetch_all(pool.get_ref())
        .await
        .map_err(|e| {
            tracing::error!(error = %e, "Failed to fetch employees");
            ApiError::Internal
        })?;

    Ok(HttpResponse::Ok().json(EmployeeListResponse {
        data: employees,
        page,
        page_size,
        total,
    }))
}

/// Get Employee by ID
#[utoipa::path(
    get,
    path = "/api/employees/{employee_id}",
    params(
        ("employee_id", Path, description = "Employee ID")
    ),
    responses(
        (status = 200, description = "Employee found", body = Employee),
        (status = 404, description = "Employee not found"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden")
    ),
    security(("bearer_auth" = [])),
    tag = "Employee"
)]
pub async fn get_employee(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    path: web::Path<u64>,
) -> actix_web::Result<HttpResponse> {
    auth.require_hr_or_admin()?;

    let employee_id = path.into_inner();

    let sql = format!("SELECT {} FROM employees WHERE id = ?", EMPLOYEE_COLUMNS);
    let employee = sqlx::query_as::<_, Employee>(&sql)
        .bind(employee_id)
        .fetch_optional(pool.get_ref())
        .await
        .map_err(|e| {
            tracing::error!(error = %e, employee_id, "Failed to fetch employee");
            ApiError::Internal
        })?;

    match employee {
        Some(emp) => Ok(HttpResponse::Ok().json(emp)),
        None => Err(ApiError::NotFound("employee not found".to_string()).into()),
    }
}
