use serde::Serialize;
use sqlx::FromRow;
use utoipa::ToSchema;

/// Directory view of a user; the password hash never leaves the auth layer.
#[derive(Serialize, FromRow, ToSchema)]
pub struct UserPublic {
    #[schema(example = 1)]
    pub id: i64,
    #[schema(example = "Charlie Employee")]
    pub full_name: String,
    #[schema(example = "emp@example.com", format = "email")]
    pub email: String,
    #[schema(example = "employee")]
    pub role: String,
    #[schema(example = "Engineering")]
    pub department: Option<String>,
}
