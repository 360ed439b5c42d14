use serde::{Deserialize, Serialize};
use strum_macros::{Display, EnumString};
use utoipa::ToSchema;

/// Explicitly recordable attendance statuses. `PRESENT` only appears in the
/// exception table as an override of an approved leave span; it is also the
/// default for days carrying neither an exception nor approved leave.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString, ToSchema,
)]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AttendanceStatus {
    Present,
    Absent,
    Leave,
    HalfDay,
}

/// Status label used by the aggregated exceptions view when an employee has
/// more than one distinct status within the queried range.
pub const MIXED_STATUS: &str = "MIXED";

/// The resolution rule every view must honor: an exception row always wins,
/// approved leave is the fallback signal, PRESENT is the default.
pub fn resolve_status(exception: Option<AttendanceStatus>, on_approved_leave: bool) -> AttendanceStatus {
    match exception {
        Some(status) => status,
        None if on_approved_leave => AttendanceStatus::Leave,
        None => AttendanceStatus::Present,
    }
}
