use serde::Serialize;
use sqlx::FromRow;
use utoipa::ToSchema;

/// Department row joined with its HOD's profile; `hod_*` fields are null
/// for a leaderless department.
#[derive(Serialize, FromRow, ToSchema)]
pub struct DepartmentWithHod {
    #[schema(example = 1)]
    pub id: i64,
    #[schema(example = "Engineering")]
    pub name: String,
    pub hod_user_id: Option<i64>,
    pub hod_name: Option<String>,
    pub hod_email: Option<String>,
}
