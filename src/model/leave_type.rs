use serde::Serialize;
use sqlx::FromRow;
use utoipa::ToSchema;

/// Immutable catalog row. `editable` is advisory only.
#[derive(Serialize, FromRow, ToSchema)]
pub struct LeaveType {
    #[schema(example = 1)]
    pub id: i64,
    #[schema(example = "Annual")]
    pub name: String,
    #[schema(example = 21)]
    pub default_days: i64,
    pub editable: i64,
}
