use crate::auth::auth::AuthUser;
use crate::error::ApiError;
use crate::model::leave_type::LeaveType;
use actix_web::{HttpResponse, web};
use sqlx::SqlitePool;

/// The seeded leave-type catalog.
#[utoipa::path(
    get,
    path = "/api/v1/leave_types",
    responses(
        (status = 200, description = "Leave types", body = [LeaveType]),
        (status = 401, description = "Unauthorized")
    ),
    security(("bearer_auth" = [])),
    tag = "Leave"
)]
pub async fn list_leave_types(
    _auth: AuthUser,
    pool: web::Data<SqlitePool>,
) -> Result<HttpResponse, ApiError> {
    let rows = sqlx::query_as::<_, LeaveType>(
        "SELECT id, name, default_days, editable FROM leave_types",
    )
    .fetch_all(pool.get_ref())
    .await?;

    Ok(HttpResponse::Ok().json(rows))
}
