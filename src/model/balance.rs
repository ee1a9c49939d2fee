use serde::Serialize;
use sqlx::FromRow;
use utoipa::ToSchema;

/// Balance row joined with display names. `full_name` is only populated in
/// the admin-wide listing.
#[derive(Serialize, FromRow, ToSchema)]
pub struct BalanceView {
    pub user_id: i64,
    pub leave_type_id: i64,
    #[schema(example = 21)]
    pub remaining_days: i64,
    #[schema(example = "Annual")]
    pub leave_type: String,
    pub full_name: Option<String>,
}
