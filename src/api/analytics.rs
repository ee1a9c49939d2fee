use crate::auth::auth::AuthUser;
use crate::error::ApiError;
use actix_web::{HttpResponse, web};
use serde::Serialize;
use sqlx::{FromRow, SqlitePool};
use utoipa::ToSchema;

#[derive(Serialize, FromRow, ToSchema)]
pub struct DepartmentUsage {
    #[schema(example = "Engineering")]
    pub department: Option<String>,
    #[schema(example = 12)]
    pub days: i64,
}

#[derive(Serialize, FromRow, ToSchema)]
pub struct TypeUsage {
    #[serde(rename = "type")]
    #[schema(example = "Annual")]
    pub leave_type: String,
    #[schema(example = 12)]
    pub days: i64,
}

/// Finally-approved leave days summed per department (admin only).
#[utoipa::path(
    get,
    path = "/api/v1/analytics/departments",
    responses(
        (status = 200, description = "Days per department", body = [DepartmentUsage]),
        (status = 403, description = "Forbidden")
    ),
    security(("bearer_auth" = [])),
    tag = "Analytics"
)]
pub async fn departments_usage(
    auth: AuthUser,
    pool: web::Data<SqlitePool>,
) -> Result<HttpResponse, ApiError> {
    auth.require_admin()?;

    let rows = sqlx::query_as::<_, DepartmentUsage>(
        r#"
        SELECT u.department AS department, SUM(lr.days) AS days
        FROM leave_requests lr
        JOIN users u ON u.id = lr.user_id
        WHERE lr.status = 'admin_approved'
        GROUP BY u.department
        "#,
    )
    .fetch_all(pool.get_ref())
    .await?;

    Ok(HttpResponse::Ok().json(rows))
}

/// Finally-approved leave days summed per leave type (admin only).
#[utoipa::path(
    get,
    path = "/api/v1/analytics/types",
    responses(
        (status = 200, description = "Days per leave type", body = [TypeUsage]),
        (status = 403, description = "Forbidden")
    ),
    security(("bearer_auth" = [])),
    tag = "Analytics"
)]
pub async fn types_usage(
    auth: AuthUser,
    pool: web::Data<SqlitePool>,
) -> Result<HttpResponse, ApiError> {
    auth.require_admin()?;

    let rows = sqlx::query_as::<_, TypeUsage>(
        r#"
        SELECT lt.name AS leave_type, SUM(lr.days) AS days
        FROM leave_requests lr
        JOIN leave_types lt ON lt.id = lr.leave_type_id
        WHERE lr.status = 'admin_approved'
        GROUP BY lt.name
        "#,
    )
    .fetch_all(pool.get_ref())
    .await?;

    Ok(HttpResponse::Ok().json(rows))
}
