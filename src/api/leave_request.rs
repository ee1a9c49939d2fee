use crate::auth::auth::AuthUser;
use crate::config::Config;
use crate::error::ApiError;
use crate::model::leave_request::{LeaveRequestView, LeaveStatus};
use crate::model::role::Role;
use crate::utils::workdays::count_working_days;
use actix_web::{HttpResponse, web};
use chrono::{NaiveDate, Utc};
use serde::Deserialize;
use serde_json::json;
use sqlx::SqlitePool;
use tracing::info;
use utoipa::ToSchema;

#[derive(Deserialize, ToSchema)]
pub struct ApplyLeave {
    #[schema(example = 1)]
    pub leave_type_id: i64,
    #[schema(example = "2026-01-05", format = "date", value_type = String)]
    pub start_date: NaiveDate,
    #[schema(example = "2026-01-09", format = "date", value_type = String)]
    pub end_date: NaiveDate,
    #[schema(example = "family matters")]
    pub reason: Option<String>,
}

#[derive(Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum LeaveAction {
    Approve,
    Reject,
}

#[derive(Deserialize, ToSchema)]
pub struct ActionReq {
    pub action: LeaveAction,
    pub comment: Option<String>,
}

const LEAVE_VIEW_SELECT: &str = r#"
    SELECT lr.id, lr.user_id, lr.leave_type_id, lr.start_date, lr.end_date,
           lr.days, lr.reason, lr.status, lr.hod_comment, lr.admin_comment,
           lr.created_at, lr.updated_at,
           u.full_name, lt.name AS leave_type, u.department
    FROM leave_requests lr
    JOIN users u ON u.id = lr.user_id
    JOIN leave_types lt ON lt.id = lr.leave_type_id
"#;

/// Submit a leave request for the calling user.
///
/// The balance check here is advisory: no days are reserved until the
/// admin's final approval.
#[utoipa::path(
    post,
    path = "/api/v1/leave",
    request_body = ApplyLeave,
    responses(
        (status = 200, description = "Request submitted as pending"),
        (status = 400, description = "Empty working-day range or insufficient balance"),
        (status = 401, description = "Unauthorized")
    ),
    security(("bearer_auth" = [])),
    tag = "Leave"
)]
pub async fn apply(
    auth: AuthUser,
    pool: web::Data<SqlitePool>,
    config: web::Data<Config>,
    payload: web::Json<ApplyLeave>,
) -> Result<HttpResponse, ApiError> {
    let type_exists: Option<i64> = sqlx::query_scalar("SELECT id FROM leave_types WHERE id = ?")
        .bind(payload.leave_type_id)
        .fetch_optional(pool.get_ref())
        .await?;
    if type_exists.is_none() {
        return Err(ApiError::reference("invalid leave type"));
    }

    let days = count_working_days(payload.start_date, payload.end_date, &config.holidays);
    if days <= 0 {
        return Err(ApiError::validation("invalid date range"));
    }

    let remaining: Option<i64> = sqlx::query_scalar(
        "SELECT remaining_days FROM user_leave_balances WHERE user_id = ? AND leave_type_id = ?",
    )
    .bind(auth.user_id)
    .bind(payload.leave_type_id)
    .fetch_optional(pool.get_ref())
    .await?;

    let remaining = remaining.ok_or_else(|| ApiError::validation("no balance"))?;
    if remaining < days {
        return Err(ApiError::validation("insufficient balance"));
    }

    let now = Utc::now();

    let result = sqlx::query(
        r#"
        INSERT INTO leave_requests
            (user_id, leave_type_id, start_date, end_date, days, reason, status, created_at, updated_at)
        VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(auth.user_id)
    .bind(payload.leave_type_id)
    .bind(payload.start_date)
    .bind(payload.end_date)
    .bind(days)
    .bind(&payload.reason)
    .bind(LeaveStatus::Pending.as_ref())
    .bind(now)
    .bind(now)
    .execute(pool.get_ref())
    .await?;

    info!(user_id = auth.user_id, days, "Leave request submitted");

    Ok(HttpResponse::Ok().json(json!({ "ok": true, "id": result.last_insert_rowid() })))
}

/// Role-scoped listing: employees see their own history, a HOD sees the
/// pending queue of their department, admin sees everything awaiting a
/// decision or final sign-off.
#[utoipa::path(
    get,
    path = "/api/v1/leave",
    responses(
        (status = 200, description = "Leave requests", body = [LeaveRequestView]),
        (status = 401, description = "Unauthorized")
    ),
    security(("bearer_auth" = [])),
    tag = "Leave"
)]
pub async fn list(auth: AuthUser, pool: web::Data<SqlitePool>) -> Result<HttpResponse, ApiError> {
    let rows = match auth.role {
        Role::Employee => {
            let sql = format!("{LEAVE_VIEW_SELECT} WHERE lr.user_id = ? ORDER BY lr.created_at DESC");
            sqlx::query_as::<_, LeaveRequestView>(&sql)
                .bind(auth.user_id)
                .fetch_all(pool.get_ref())
                .await?
        }
        Role::Hod => {
            // a pure to-do queue: pending only, own department only
            let sql = format!(
                "{LEAVE_VIEW_SELECT} WHERE lr.status = 'pending' AND u.department = ? ORDER BY lr.created_at DESC"
            );
            sqlx::query_as::<_, LeaveRequestView>(&sql)
                .bind(auth.own_department()?)
                .fetch_all(pool.get_ref())
                .await?
        }
        Role::Admin => {
            let sql = format!(
                "{LEAVE_VIEW_SELECT} WHERE lr.status IN ('pending', 'hod_approved') ORDER BY lr.created_at DESC"
            );
            sqlx::query_as::<_, LeaveRequestView>(&sql)
                .fetch_all(pool.get_ref())
                .await?
        }
    };

    Ok(HttpResponse::Ok().json(rows))
}

/// Fetch one request, scoped like the listing.
#[utoipa::path(
    get,
    path = "/api/v1/leave/{id}",
    params(("id" = i64, Path, description = "Leave request ID")),
    responses(
        (status = 200, description = "Leave request", body = LeaveRequestView),
        (status = 403, description = "Not the caller's request or department"),
        (status = 404, description = "Not found")
    ),
    security(("bearer_auth" = [])),
    tag = "Leave"
)]
pub async fn get_one(
    auth: AuthUser,
    pool: web::Data<SqlitePool>,
    path: web::Path<i64>,
) -> Result<HttpResponse, ApiError> {
    let id = path.into_inner();

    let sql = format!("{LEAVE_VIEW_SELECT} WHERE lr.id = ?");
    let row = sqlx::query_as::<_, LeaveRequestView>(&sql)
        .bind(id)
        .fetch_optional(pool.get_ref())
        .await?
        .ok_or_else(|| ApiError::not_found("not found"))?;

    match auth.role {
        Role::Admin => {}
        Role::Hod => {
            if row.department.as_deref() != Some(auth.own_department()?) {
                return Err(ApiError::authorization("not your dept"));
            }
        }
        Role::Employee => {
            if row.user_id != auth.user_id {
                return Err(ApiError::authorization("forbidden"));
            }
        }
    }

    Ok(HttpResponse::Ok().json(row))
}

/// First-stage decision by the requester's department head.
/// Only a `pending` request can be decided.
#[utoipa::path(
    post,
    path = "/api/v1/leave/{id}/hod_action",
    params(("id" = i64, Path, description = "Leave request ID")),
    request_body = ActionReq,
    responses(
        (status = 200, description = "Decision recorded"),
        (status = 400, description = "Request already decided"),
        (status = 403, description = "Not a HOD, or another department's request"),
        (status = 404, description = "Not found")
    ),
    security(("bearer_auth" = [])),
    tag = "Leave"
)]
pub async fn hod_action(
    auth: AuthUser,
    pool: web::Data<SqlitePool>,
    path: web::Path<i64>,
    payload: web::Json<ActionReq>,
) -> Result<HttpResponse, ApiError> {
    auth.require_hod()?;

    let id = path.into_inner();

    let row = sqlx::query_as::<_, (String, Option<String>)>(
        r#"
        SELECT lr.status, u.department
        FROM leave_requests lr
        JOIN users u ON u.id = lr.user_id
        WHERE lr.id = ?
        "#,
    )
    .bind(id)
    .fetch_optional(pool.get_ref())
    .await?
    .ok_or_else(|| ApiError::not_found("not found"))?;

    let (status, department) = row;

    if department.as_deref() != Some(auth.own_department()?) {
        return Err(ApiError::authorization("not your dept"));
    }
    if status != LeaveStatus::Pending.as_ref() {
        return Err(ApiError::conflict("request already decided"));
    }

    let next = match payload.action {
        LeaveAction::Approve => LeaveStatus::HodApproved,
        LeaveAction::Reject => LeaveStatus::Rejected,
    };

    // status guard in the WHERE clause closes the race with a concurrent
    // decision on the same request
    let result = sqlx::query(
        "UPDATE leave_requests SET status = ?, hod_comment = ?, updated_at = ? WHERE id = ? AND status = 'pending'",
    )
    .bind(next.as_ref())
    .bind(&payload.comment)
    .bind(Utc::now())
    .bind(id)
    .execute(pool.get_ref())
    .await?;

    if result.rows_affected() == 0 {
        return Err(ApiError::conflict("request already decided"));
    }

    info!(leave_id = id, status = %next, "HOD decision recorded");

    Ok(HttpResponse::Ok().json(json!({ "ok": true })))
}

/// Final decision by the admin. Approval re-validates the balance and
/// deducts it in the same transaction as the status flip; this is the only
/// place the ledger is ever decremented.
#[utoipa::path(
    post,
    path = "/api/v1/leave/{id}/admin_action",
    params(("id" = i64, Path, description = "Leave request ID")),
    request_body = ActionReq,
    responses(
        (status = 200, description = "Decision recorded"),
        (status = 400, description = "Not awaiting final approval, or insufficient balance"),
        (status = 403, description = "Forbidden"),
        (status = 404, description = "Not found")
    ),
    security(("bearer_auth" = [])),
    tag = "Leave"
)]
pub async fn admin_action(
    auth: AuthUser,
    pool: web::Data<SqlitePool>,
    path: web::Path<i64>,
    payload: web::Json<ActionReq>,
) -> Result<HttpResponse, ApiError> {
    auth.require_admin()?;

    let id = path.into_inner();

    let mut tx = pool.begin().await?;

    let row = sqlx::query_as::<_, (i64, i64, i64, String)>(
        "SELECT user_id, leave_type_id, days, status FROM leave_requests WHERE id = ?",
    )
    .bind(id)
    .fetch_optional(&mut *tx)
    .await?
    .ok_or_else(|| ApiError::not_found("not found"))?;

    let (user_id, leave_type_id, days, status) = row;

    if status != LeaveStatus::HodApproved.as_ref() {
        return Err(ApiError::conflict("request is not awaiting final approval"));
    }

    let next = match payload.action {
        LeaveAction::Approve => {
            let remaining: Option<i64> = sqlx::query_scalar(
                "SELECT remaining_days FROM user_leave_balances WHERE user_id = ? AND leave_type_id = ?",
            )
            .bind(user_id)
            .bind(leave_type_id)
            .fetch_optional(&mut *tx)
            .await?;

            let remaining = remaining.ok_or_else(|| ApiError::validation("no balance"))?;
            if remaining < days {
                return Err(ApiError::validation("insufficient balance"));
            }

            // guarded decrement: cannot take the row negative even if a
            // concurrent approval read the same balance
            let deducted = sqlx::query(
                r#"
                UPDATE user_leave_balances
                SET remaining_days = remaining_days - ?
                WHERE user_id = ? AND leave_type_id = ? AND remaining_days >= ?
                "#,
            )
            .bind(days)
            .bind(user_id)
            .bind(leave_type_id)
            .bind(days)
            .execute(&mut *tx)
            .await?;

            if deducted.rows_affected() == 0 {
                return Err(ApiError::validation("insufficient balance"));
            }

            LeaveStatus::AdminApproved
        }
        LeaveAction::Reject => LeaveStatus::Rejected,
    };

    let result = sqlx::query(
        "UPDATE leave_requests SET status = ?, admin_comment = ?, updated_at = ? WHERE id = ? AND status = 'hod_approved'",
    )
    .bind(next.as_ref())
    .bind(&payload.comment)
    .bind(Utc::now())
    .bind(id)
    .execute(&mut *tx)
    .await?;

    if result.rows_affected() == 0 {
        return Err(ApiError::conflict("request already decided"));
    }

    tx.commit().await?;

    info!(leave_id = id, status = %next, "Admin decision recorded");

    Ok(HttpResponse::Ok().json(json!({ "ok": true })))
}
