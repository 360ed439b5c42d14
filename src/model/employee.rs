use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Debug, Serialize, Deserialize, sqlx::FromRow, ToSchema)]
#[schema(
    example = json!({
        "id": 1,
        "employee_code": "EMP-001",
        "name": "John Doe",
        "email": "john.doe@company.com",
        "phone": "+8801712345678",
        "department": "Finance",
        "title": "Accountant",
        "status": "ACTIVE",
        "join_date": "2024-01-01"
    })
)]
pub struct Employee {
    #[schema(example = 1)]
    pub id: u64,

    #[schema(example = "EMP-001")]
    pub employee_code: String,

    #[schema(example = "John Doe")]
    pub name: String,

    #[schema(example = "john.doe@company.com")]
    pub email: String,

    #[schema(example = "+8801712345678", nullable = true)]
    pub phone: Option<String>,

    #[schema(example = "Finance", nullable = true)]
    pub department: Option<String>,

    #[schema(example = "Accountant", nullable = true)]
    pub title: Option<String>,

    #[schema(example = "ACTIVE")]
    pub status: String,

    #[schema(example = "2024-01-01", value_type = String, format = "date", nullable = true)]
    pub join_date: Option<NaiveDate>,
}

/// The slice of an employee the attendance engine carries through its views:
/// enough to key, label and sort a row.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct EmployeeRef {
    pub id: u64,
    pub employee_code: String,
    pub name: String,
}
