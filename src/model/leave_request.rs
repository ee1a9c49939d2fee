use chrono::{DateTime, NaiveDate, Utc};
use serde::Serialize;
use sqlx::FromRow;
use strum_macros::{AsRefStr, Display, EnumString};
use utoipa::ToSchema;

/// Lifecycle of a single request.
///
/// `pending` -> `hod_approved` -> `admin_approved`
/// `pending` -> `rejected` (by HOD)
/// `hod_approved` -> `rejected` (by admin)
///
/// Terminal states accept no further transition; both decision endpoints
/// carry the expected precursor status in their UPDATE guard.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Display, EnumString, AsRefStr)]
pub enum LeaveStatus {
    #[strum(serialize = "pending")]
    Pending,
    #[strum(serialize = "hod_approved")]
    HodApproved,
    #[strum(serialize = "admin_approved")]
    AdminApproved,
    #[strum(serialize = "rejected")]
    Rejected,
}

/// Request row joined with requester name/department and leave-type name,
/// as served by the listing and detail endpoints.
#[derive(Serialize, FromRow, ToSchema)]
pub struct LeaveRequestView {
    #[schema(example = 1)]
    pub id: i64,
    pub user_id: i64,
    pub leave_type_id: i64,
    #[schema(example = "2026-01-05", format = "date", value_type = String)]
    pub start_date: NaiveDate,
    #[schema(example = "2026-01-09", format = "date", value_type = String)]
    pub end_date: NaiveDate,
    /// Working days in the inclusive range, weekends and holidays excluded.
    #[schema(example = 5)]
    pub days: i64,
    pub reason: Option<String>,
    #[schema(example = "pending")]
    pub status: String,
    pub hod_comment: Option<String>,
    pub admin_comment: Option<String>,
    #[schema(format = "date-time", value_type = String)]
    pub created_at: DateTime<Utc>,
    #[schema(format = "date-time", value_type = String)]
    pub updated_at: DateTime<Utc>,
    #[schema(example = "Charlie Employee")]
    pub full_name: String,
    #[schema(example = "Annual")]
    pub leave_type: String,
    #[schema(example = "Engineering")]
    pub department: Option<String>,
}
