use crate::error::ApiError;
use crate::model::attendance::{AttendanceStatus, MIXED_STATUS, resolve_status};
use crate::model::employee::EmployeeRef;
use crate::model::leave_request::LeaveSpan;
use crate::utils::date_range::expand_range;
use chrono::{NaiveDate, NaiveTime};
use serde::Serialize;
use sqlx::MySqlPool;
use std::collections::HashMap;
use std::str::FromStr;
use utoipa::ToSchema;

/// Employee filter as accepted by every read path. Resolution precedence:
/// explicit id, then explicit code, then free-text query; with none given,
/// the filter resolves to all ACTIVE employees.
#[derive(Debug, Default)]
pub struct EmployeeFilter {
    pub employee_id: Option<u64>,
    pub employee_code: Option<String>,
    pub q: Option<String>,
}

/// One raw exception row, joined with the employee it belongs to.
#[derive(Debug, Clone, Serialize, sqlx::FromRow, ToSchema)]
pub struct ExceptionRecord {
    pub employee_id: u64,
    #[schema(example = "EMP-001")]
    pub employee_code: String,
    pub name: String,
    #[schema(example = "2024-03-04", value_type = String, format = "date")]
    pub work_date: NaiveDate,
    #[schema(example = "ABSENT")]
    pub status: String,
    #[schema(example = "09:00", value_type = String, nullable = true)]
    pub clock_in: Option<NaiveTime>,
    #[schema(example = "17:30", value_type = String, nullable = true)]
    pub clock_out: Option<NaiveTime>,
}

/// Aggregated exceptions-only row: one employee's exception span within the
/// queried range.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct SummaryRecord {
    pub employee_id: u64,
    #[schema(example = "EMP-001")]
    pub employee_code: String,
    pub name: String,
    #[schema(example = "2024-03-04", value_type = String, format = "date")]
    pub start_date: NaiveDate,
    #[schema(example = "2024-03-08", value_type = String, format = "date")]
    pub end_date: NaiveDate,
    #[schema(example = 5)]
    pub days: i64,
    #[schema(example = "MIXED")]
    pub status: String,
}

/// One materialized (employee, day) cell of the computed view.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct ResolvedDayRow {
    pub employee_id: u64,
    #[schema(example = "EMP-001")]
    pub employee_code: String,
    pub name: String,
    #[schema(example = "2024-03-04", value_type = String, format = "date")]
    pub work_date: NaiveDate,
    pub status: AttendanceStatus,
}

fn in_placeholders(count: usize) -> String {
    vec!["?"; count].join(",")
}

/// Resolves the employee filter into concrete employees, ordered by name.
/// Unknown id/code/query yields an empty set, not an error, so the
/// search-as-you-type flow stays smooth.
pub async fn resolve_employees(
    pool: &MySqlPool,
    filter: &EmployeeFilter,
) -> Result<Vec<EmployeeRef>, ApiError> {
    if let Some(id) = filter.employee_id {
        let rows = sqlx::query_as::<_, EmployeeRef>(
            "SELECT id, employee_code, name FROM employees WHERE id = ?",
        )
        .bind(id)
        .fetch_all(pool)
        .await?;
        return Ok(rows);
    }

    if let Some(code) = filter.employee_code.as_deref() {
        let rows = sqlx::query_as::<_, EmployeeRef>(
            "SELECT id, employee_code, name FROM employees WHERE employee_code = ?",
        )
        .bind(code)
        .fetch_all(pool)
        .await?;
        return Ok(rows);
    }

    if let Some(q) = filter.q.as_deref() {
        let like = format!("%{}%", q.trim().to_lowercase());
        let rows = sqlx::query_as::<_, EmployeeRef>(
            r#"
            SELECT id, employee_code, name FROM employees
            WHERE status = 'ACTIVE'
              AND (LOWER(employee_code) LIKE ? OR LOWER(name) LIKE ? OR LOWER(email) LIKE ?)
            ORDER BY name ASC, id ASC
            "#,
        )
        .bind(&like)
        .bind(&like)
        .bind(&like)
        .fetch_all(pool)
        .await?;
        return Ok(rows);
    }

    let rows = sqlx::query_as::<_, EmployeeRef>(
        "SELECT id, employee_code, name FROM employees WHERE status = 'ACTIVE' ORDER BY name ASC, id ASC",
    )
    .fetch_all(pool)
    .await?;
    Ok(rows)
}

fn range_conditions(
    where_sql: &mut String,
    from: Option<NaiveDate>,
    to: Option<NaiveDate>,
) {
    if from.is_some() {
        where_sql.push_str(" AND a.work_date >= ?");
    }
    if to.is_some() {
        where_sql.push_str(" AND a.work_date <= ?");
    }
}

/// Exceptions-only detail page: SQL pagination with a separate COUNT pass
/// over the same filtered set.
pub async fn fetch_exceptions_page(
    pool: &MySqlPool,
    employee_ids: &[u64],
    from: Option<NaiveDate>,
    to: Option<NaiveDate>,
    page: u32,
    page_size: u32,
) -> Result<(Vec<ExceptionRecord>, i64), ApiError> {
    if employee_ids.is_empty() {
        return Ok((Vec::new(), 0));
    }

    let mut where_sql = format!(
        "WHERE a.employee_id IN ({})",
        in_placeholders(employee_ids.len())
    );
    range_conditions(&mut where_sql, from, to);

    let count_sql = format!(
        "SELECT COUNT(*) FROM attendance_exceptions a JOIN employees e ON e.id = a.employee_id {}",
        where_sql
    );
    let mut count_q = sqlx::query_scalar::<_, i64>(&count_sql);
    for id in employee_ids {
        count_q = count_q.bind(id);
    }
    if let Some(from) = from {
        count_q = count_q.bind(from);
    }
    if let Some(to) = to {
        count_q = count_q.bind(to);
    }
    let total = count_q.fetch_one(pool).await?;

    let offset = (page - 1) as i64 * page_size as i64;
    let data_sql = format!(
        r#"
        SELECT a.employee_id, e.employee_code, e.name,
               a.work_date, a.status, a.clock_in, a.clock_out
        FROM attendance_exceptions a
        JOIN employees e ON e.id = a.employee_id
        {}
        ORDER BY a.work_date DESC, e.name ASC
        LIMIT ? OFFSET ?
        "#,
        where_sql
    );
    let mut data_q = sqlx::query_as::<_, ExceptionRecord>(&data_sql);
    for id in employee_ids {
        data_q = data_q.bind(id);
    }
    if let Some(from) = from {
        data_q = data_q.bind(from);
    }
    if let Some(to) = to {
        data_q = data_q.bind(to);
    }
    let rows = data_q
        .bind(page_size as i64)
        .bind(offset)
        .fetch_all(pool)
        .await?;

    Ok((rows, total))
}

/// Unpaginated variant feeding the summary aggregation and the CSV export.
pub async fn fetch_exceptions_all(
    pool: &MySqlPool,
    employee_ids: &[u64],
    from: Option<NaiveDate>,
    to: Option<NaiveDate>,
) -> Result<Vec<ExceptionRecord>, ApiError> {
    if employee_ids.is_empty() {
        return Ok(Vec::new());
    }

    let mut where_sql = format!(
        "WHERE a.employee_id IN ({})",
        in_placeholders(employee_ids.len())
    );
    range_conditions(&mut where_sql, from, to);

    let data_sql = format!(
        r#"
        SELECT a.employee_id, e.employee_code, e.name,
               a.work_date, a.status, a.clock_in, a.clock_out
        FROM attendance_exceptions a
        JOIN employees e ON e.id = a.employee_id
        {}
        ORDER BY a.work_date DESC, e.name ASC
        "#,
        where_sql
    );
    let mut data_q = sqlx::query_as::<_, ExceptionRecord>(&data_sql);
    for id in employee_ids {
        data_q = data_q.bind(id);
    }
    if let Some(from) = from {
        data_q = data_q.bind(from);
    }
    if let Some(to) = to {
        data_q = data_q.bind(to);
    }
    Ok(data_q.fetch_all(pool).await?)
}

/// Collapses raw exception rows into one row per employee: min/max date in
/// range, row count, and the status — MIXED when more than one distinct
/// status occurs. Output ordered end-date descending, then name ascending.
pub fn summarize(rows: &[ExceptionRecord]) -> Vec<SummaryRecord> {
    let mut groups: HashMap<u64, SummaryRecord> = HashMap::new();
    let mut mixed: HashMap<u64, bool> = HashMap::new();

    for row in rows {
        match groups.get_mut(&row.employee_id) {
            Some(acc) => {
                acc.start_date = acc.start_date.min(row.work_date);
                acc.end_date = acc.end_date.max(row.work_date);
                acc.days += 1;
                if acc.status != row.status {
                    mixed.insert(row.employee_id, true);
                }
            }
            None => {
                groups.insert(
                    row.employee_id,
                    SummaryRecord {
                        employee_id: row.employee_id,
                        employee_code: row.employee_code.clone(),
                        name: row.name.clone(),
                        start_date: row.work_date,
                        end_date: row.work_date,
                        days: 1,
                        status: row.status.clone(),
                    },
                );
            }
        }
    }

    let mut out: Vec<SummaryRecord> = groups
        .into_values()
        .map(|mut acc| {
            if mixed.get(&acc.employee_id).copied().unwrap_or(false) {
                acc.status = MIXED_STATUS.to_string();
            }
            acc
        })
        .collect();
    out.sort_by(|a, b| b.end_date.cmp(&a.end_date).then(a.name.cmp(&b.name)));
    out
}

/// Crosses the included day set with the employee set and applies the
/// resolution rule per cell. `emps` must already be name-ordered; output is
/// day descending, then name ascending, matching the interactive sort.
pub fn materialize(
    emps: &[EmployeeRef],
    days: &[NaiveDate],
    exceptions: &HashMap<(u64, NaiveDate), AttendanceStatus>,
    leave: &HashMap<u64, Vec<LeaveSpan>>,
) -> Vec<ResolvedDayRow> {
    let mut rows = Vec::with_capacity(emps.len() * days.len());
    for day in days.iter().rev() {
        for emp in emps {
            let exception = exceptions.get(&(emp.id, *day)).copied();
            let on_leave = leave
                .get(&emp.id)
                .map(|spans| spans.iter().any(|span| span.covers(*day)))
                .unwrap_or(false);
            rows.push(ResolvedDayRow {
                employee_id: emp.id,
                employee_code: emp.employee_code.clone(),
                name: emp.name.clone(),
                work_date: *day,
                status: resolve_status(exception, on_leave),
            });
        }
    }
    rows
}

/// Fully computed view: every (employee, included day) cell resolved. The
/// expansion is a cross join, so the materialized size is checked against
/// the configured ceiling before any query runs.
pub async fn computed_rows(
    pool: &MySqlPool,
    emps: &[EmployeeRef],
    from: NaiveDate,
    to: NaiveDate,
    include_weekends: bool,
    max_cells: usize,
) -> Result<Vec<ResolvedDayRow>, ApiError> {
    let days = expand_range(from, to, include_weekends);
    if emps.is_empty() || days.is_empty() {
        return Ok(Vec::new());
    }

    let cells = emps.len().saturating_mul(days.len());
    if cells > max_cells {
        return Err(ApiError::validation(
            "date range too large to compute",
            vec![format!(
                "range would materialize {} cells (limit {})",
                cells, max_cells
            )],
        ));
    }

    let ids: Vec<u64> = emps.iter().map(|e| e.id).collect();

    let exc_sql = format!(
        "SELECT employee_id, work_date, status FROM attendance_exceptions \
         WHERE employee_id IN ({}) AND work_date BETWEEN ? AND ?",
        in_placeholders(ids.len())
    );
    let mut exc_q = sqlx::query_as::<_, (u64, NaiveDate, String)>(&exc_sql);
    for id in &ids {
        exc_q = exc_q.bind(id);
    }
    let raw_exceptions = exc_q.bind(from).bind(to).fetch_all(pool).await?;

    let mut exceptions = HashMap::with_capacity(raw_exceptions.len());
    for (employee_id, work_date, status) in raw_exceptions {
        let status = AttendanceStatus::from_str(&status).map_err(|_| {
            tracing::error!(employee_id, %work_date, status = %status, "unrecognized status in exception row");
            ApiError::Internal
        })?;
        exceptions.insert((employee_id, work_date), status);
    }

    let leave_sql = format!(
        "SELECT employee_id, date_from, date_to FROM leave_requests \
         WHERE status = 'APPROVED' AND employee_id IN ({}) \
           AND date_from <= ? AND date_to >= ?",
        in_placeholders(ids.len())
    );
    let mut leave_q = sqlx::query_as::<_, LeaveSpan>(&leave_sql);
    for id in &ids {
        leave_q = leave_q.bind(id);
    }
    let spans = leave_q.bind(to).bind(from).fetch_all(pool).await?;

    let mut leave: HashMap<u64, Vec<LeaveSpan>> = HashMap::new();
    for span in spans {
        leave.entry(span.employee_id).or_default().push(span);
    }

    Ok(materialize(emps, &days, &exceptions, &leave))
}

/// In-memory page slice for views materialized in application code. `total`
/// reflects the full set regardless of the requested page.
pub fn paginate<T>(rows: Vec<T>, page: u32, page_size: u32) -> (Vec<T>, i64) {
    let total = rows.len() as i64;
    let start = (page as usize - 1).saturating_mul(page_size as usize);
    let data = rows
        .into_iter()
        .skip(start)
        .take(page_size as usize)
        .collect();
    (data, total)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(s: &str) -> NaiveDate {
        s.parse().unwrap()
    }

    fn emp(id: u64, code: &str, name: &str) -> EmployeeRef {
        EmployeeRef {
            id,
            employee_code: code.to_string(),
            name: name.to_string(),
        }
    }

    fn exc(id: u64, code: &str, name: &str, date: &str, status: &str) -> ExceptionRecord {
        ExceptionRecord {
            employee_id: id,
            employee_code: code.to_string(),
            name: name.to_string(),
            work_date: d(date),
            status: status.to_string(),
            clock_in: None,
            clock_out: None,
        }
    }

    #[test]
    fn single_status_aggregates_to_that_status() {
        let rows = vec![
            exc(1, "EMP-001", "Alice", "2024-03-04", "ABSENT"),
            exc(1, "EMP-001", "Alice", "2024-03-05", "ABSENT"),
            exc(1, "EMP-001", "Alice", "2024-03-06", "ABSENT"),
        ];
        let summary = summarize(&rows);
        assert_eq!(summary.len(), 1);
        assert_eq!(summary[0].days, 3);
        assert_eq!(summary[0].status, "ABSENT");
        assert_eq!(summary[0].start_date, d("2024-03-04"));
        assert_eq!(summary[0].end_date, d("2024-03-06"));
    }

    #[test]
    fn differing_statuses_aggregate_to_mixed() {
        let rows = vec![
            exc(1, "EMP-001", "Alice", "2024-03-04", "ABSENT"),
            exc(1, "EMP-001", "Alice", "2024-03-05", "HALF_DAY"),
        ];
        let summary = summarize(&rows);
        assert_eq!(summary[0].status, MIXED_STATUS);
        assert_eq!(summary[0].days, 2);
    }

    #[test]
    fn summary_orders_by_end_date_desc_then_name() {
        let rows = vec![
            exc(1, "EMP-001", "Zoe", "2024-03-08", "ABSENT"),
            exc(2, "EMP-002", "Alice", "2024-03-08", "LEAVE"),
            exc(3, "EMP-003", "Bob", "2024-03-04", "ABSENT"),
        ];
        let summary = summarize(&rows);
        let names: Vec<&str> = summary.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(names, vec!["Alice", "Zoe", "Bob"]);
    }

    #[test]
    fn materialized_cells_follow_the_resolution_rule() {
        // ABSENT exceptions Mon-Fri, then a computed week that also
        // includes the untouched weekend.
        let emps = vec![emp(1, "EMP-001", "Alice")];
        let days = expand_range(d("2024-03-04"), d("2024-03-10"), true);
        let mut exceptions = HashMap::new();
        for day in expand_range(d("2024-03-04"), d("2024-03-08"), false) {
            exceptions.insert((1u64, day), AttendanceStatus::Absent);
        }
        let rows = materialize(&emps, &days, &exceptions, &HashMap::new());

        assert_eq!(rows.len(), 7);
        // Day-descending: first rows are the untouched weekend.
        assert_eq!(rows[0].work_date, d("2024-03-10"));
        assert_eq!(rows[0].status, AttendanceStatus::Present);
        assert_eq!(rows[1].work_date, d("2024-03-09"));
        assert_eq!(rows[1].status, AttendanceStatus::Present);
        for row in &rows[2..] {
            assert_eq!(row.status, AttendanceStatus::Absent);
        }
    }

    #[test]
    fn leave_fills_uncovered_days_but_never_overrides_exceptions() {
        let emps = vec![emp(1, "EMP-001", "Alice")];
        let days = vec![d("2024-03-04"), d("2024-03-05")];
        let mut exceptions = HashMap::new();
        exceptions.insert((1u64, d("2024-03-04")), AttendanceStatus::Present);
        let mut leave = HashMap::new();
        leave.insert(
            1u64,
            vec![LeaveSpan {
                employee_id: 1,
                date_from: d("2024-03-04"),
                date_to: d("2024-03-05"),
            }],
        );
        let rows = materialize(&emps, &days, &exceptions, &leave);
        // Day-descending: 03-05 first (leave fallback), then the override.
        assert_eq!(rows[0].status, AttendanceStatus::Leave);
        assert_eq!(rows[1].status, AttendanceStatus::Present);
    }

    #[test]
    fn materialize_orders_names_within_a_day() {
        let emps = vec![emp(2, "EMP-002", "Alice"), emp(1, "EMP-001", "Zoe")];
        let days = vec![d("2024-03-04"), d("2024-03-05")];
        let rows = materialize(&emps, &days, &HashMap::new(), &HashMap::new());
        assert_eq!(rows[0].name, "Alice");
        assert_eq!(rows[0].work_date, d("2024-03-05"));
        assert_eq!(rows[1].name, "Zoe");
        assert_eq!(rows[2].work_date, d("2024-03-04"));
    }

    #[test]
    fn paginate_reports_full_total() {
        let rows: Vec<u32> = (0..25).collect();
        let (data, total) = paginate(rows, 3, 10);
        assert_eq!(total, 25);
        assert_eq!(data, vec![20, 21, 22, 23, 24]);

        let (data, total) = paginate(Vec::<u32>::new(), 1, 10);
        assert_eq!(total, 0);
        assert!(data.is_empty());
    }
}
