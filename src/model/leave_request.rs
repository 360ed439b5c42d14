use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::prelude::FromRow;
use utoipa::ToSchema;

#[derive(Serialize, Deserialize, FromRow, ToSchema)]
pub struct LeaveResponse {
    #[schema(example = 1)]
    pub id: u64,
    #[schema(example = 1000)]
    pub employee_id: u64,
    #[schema(example = "2026-01-01", format = "date", value_type = String)]
    pub date_from: NaiveDate,
    #[schema(example = "2026-01-03", format = "date", value_type = String)]
    pub date_to: NaiveDate,
    #[schema(example = "PENDING", value_type = String)]
    pub status: Option<String>,
    #[schema(example = "2026-01-01T00:00:00Z", format = "date-time", value_type = String)]
    pub created_at: Option<DateTime<Utc>>,
}

/// Approved leave span as consumed by the resolution engine. Dates are
/// inclusive calendar dates.
#[derive(Debug, Clone, Copy, sqlx::FromRow)]
pub struct LeaveSpan {
    pub employee_id: u64,
    pub date_from: NaiveDate,
    pub date_to: NaiveDate,
}

impl LeaveSpan {
    pub fn covers(&self, day: NaiveDate) -> bool {
        self.date_from <= day && day <= self.date_to
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(s: &str) -> NaiveDate {
        s.parse().unwrap()
    }

    #[test]
    fn span_endpoints_are_inclusive() {
        let span = LeaveSpan {
            employee_id: 1,
            date_from: d("2024-03-04"),
            date_to: d("2024-03-06"),
        };
        assert!(span.covers(d("2024-03-04")));
        assert!(span.covers(d("2024-03-06")));
        assert!(!span.covers(d("2024-03-03")));
        assert!(!span.covers(d("2024-03-07")));
    }
}
