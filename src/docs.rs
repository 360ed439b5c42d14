use crate::api::attendance::engine::{ExceptionRecord, ResolvedDayRow, SummaryRecord};
use crate::api::attendance::recorder::ApplyAttendance;
use crate::api::employee::EmployeeListResponse;
use crate::api::leave_request::{CreateLeave, LeaveFilter, LeaveListResponse};
use crate::model::attendance::AttendanceStatus;
use crate::model::employee::Employee;
use crate::model::leave_request::LeaveResponse;
use utoipa::OpenApi;

#[derive(OpenApi)]
#[openapi(
    info(
        title = "HRWays API",
        version = "1.0.0",
        description = r#"
## HRWays — small-business HR console

Attendance is the heart of this API: explicitly recorded exceptions
(ABSENT / LEAVE / HALF_DAY / PRESENT overrides) are reconciled with approved
leave spans and a default-present assumption into a per-day, per-employee
status, queryable interactively or exported as CSV and PDF.

### Key Features
- **Attendance**
  - Apply a status across a date range (weekday-only or full week)
  - Exceptions-only review (per-employee summary or per-day detail)
  - Fully computed day-by-day view with identical business rules
  - CSV export and tabular PDF summary with running totals
- **Employee directory**
  - Search and fetch the employees the attendance views resolve against
- **Leave**
  - Record, approve and reject leave requests; approved spans feed the
    attendance computation

### Security
All endpoints require a **JWT Bearer token** carrying the HR or ADMIN role.

### Response Format
- JSON-based RESTful responses; errors as `{"error": {code, message, details}}`
- Pagination supported for list endpoints

---
Built with **Rust**, **Actix Web**, **SQLx**, and **Utoipa**.
"#,
    ),
    paths(
        crate::api::attendance::apply_attendance,
        crate::api::attendance::list_attendance,
        crate::api::attendance::export_attendance_csv,
        crate::api::attendance::attendance_summary_pdf,

        crate::api::employee::list_employees,
        crate::api::employee::get_employee,

        crate::api::leave_request::leave_list,
        crate::api::leave_request::create_leave,
        crate::api::leave_request::approve_leave,
        crate::api::leave_request::reject_leave
    ),
    components(
        schemas(
            ApplyAttendance,
            AttendanceStatus,
            ExceptionRecord,
            SummaryRecord,
            ResolvedDayRow,
            Employee,
            EmployeeListResponse,
            CreateLeave,
            LeaveFilter,
            LeaveResponse,
            LeaveListResponse
        )
    ),
    tags(
        (name = "Attendance", description = "Attendance recording, review and exports"),
        (name = "Employee", description = "Employee directory (read surface)"),
        (name = "Leave", description = "Leave registry APIs"),
    )
)]
pub struct ApiDoc;
