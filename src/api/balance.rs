use crate::auth::auth::AuthUser;
use crate::error::ApiError;
use crate::model::balance::BalanceView;
use crate::model::role::Role;
use actix_web::{HttpResponse, web};
use serde::Deserialize;
use serde_json::json;
use sqlx::SqlitePool;
use utoipa::ToSchema;

#[derive(Deserialize, ToSchema)]
pub struct SetBalance {
    #[schema(example = 16)]
    pub remaining_days: i64,
}

/// Balance listing: admin sees every user's rows, everyone else their own.
#[utoipa::path(
    get,
    path = "/api/v1/balances",
    responses(
        (status = 200, description = "Balance rows", body = [BalanceView]),
        (status = 401, description = "Unauthorized")
    ),
    security(("bearer_auth" = [])),
    tag = "Balance"
)]
pub async fn list_balances(
    auth: AuthUser,
    pool: web::Data<SqlitePool>,
) -> Result<HttpResponse, ApiError> {
    let rows = if auth.role == Role::Admin {
        sqlx::query_as::<_, BalanceView>(
            r#"
            SELECT ulb.user_id, ulb.leave_type_id, ulb.remaining_days,
                   lt.name AS leave_type, u.full_name
            FROM user_leave_balances ulb
            JOIN users u ON u.id = ulb.user_id
            JOIN leave_types lt ON lt.id = ulb.leave_type_id
            "#,
        )
        .fetch_all(pool.get_ref())
        .await?
    } else {
        sqlx::query_as::<_, BalanceView>(
            r#"
            SELECT ulb.user_id, ulb.leave_type_id, ulb.remaining_days,
                   lt.name AS leave_type, NULL AS full_name
            FROM user_leave_balances ulb
            JOIN leave_types lt ON lt.id = ulb.leave_type_id
            WHERE ulb.user_id = ?
            "#,
        )
        .bind(auth.user_id)
        .fetch_all(pool.get_ref())
        .await?
    };

    Ok(HttpResponse::Ok().json(rows))
}

/// Admin override of a single balance row; upserts by (user, leave type).
#[utoipa::path(
    put,
    path = "/api/v1/balances/{user_id}/{leave_type_id}",
    params(
        ("user_id" = i64, Path, description = "User ID"),
        ("leave_type_id" = i64, Path, description = "Leave type ID")
    ),
    request_body = SetBalance,
    responses(
        (status = 200, description = "Balance set"),
        (status = 400, description = "Unknown user or leave type"),
        (status = 403, description = "Forbidden")
    ),
    security(("bearer_auth" = [])),
    tag = "Balance"
)]
pub async fn set_balance(
    auth: AuthUser,
    pool: web::Data<SqlitePool>,
    path: web::Path<(i64, i64)>,
    payload: web::Json<SetBalance>,
) -> Result<HttpResponse, ApiError> {
    auth.require_admin()?;

    let (user_id, leave_type_id) = path.into_inner();

    let user_exists: Option<i64> = sqlx::query_scalar("SELECT id FROM users WHERE id = ?")
        .bind(user_id)
        .fetch_optional(pool.get_ref())
        .await?;
    if user_exists.is_none() {
        return Err(ApiError::reference("invalid user"));
    }

    let type_exists: Option<i64> = sqlx::query_scalar("SELECT id FROM leave_types WHERE id = ?")
        .bind(leave_type_id)
        .fetch_optional(pool.get_ref())
        .await?;
    if type_exists.is_none() {
        return Err(ApiError::reference("invalid leave type"));
    }

    let updated = sqlx::query(
        "UPDATE user_leave_balances SET remaining_days = ? WHERE user_id = ? AND leave_type_id = ?",
    )
    .bind(payload.remaining_days)
    .bind(user_id)
    .bind(leave_type_id)
    .execute(pool.get_ref())
    .await?;

    if updated.rows_affected() == 0 {
        sqlx::query(
            "INSERT INTO user_leave_balances(user_id, leave_type_id, remaining_days) VALUES(?, ?, ?)",
        )
        .bind(user_id)
        .bind(leave_type_id)
        .bind(payload.remaining_days)
        .execute(pool.get_ref())
        .await?;
    }

    Ok(HttpResponse::Ok().json(json!({ "ok": true })))
}
