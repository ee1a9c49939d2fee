use crate::auth::auth::AuthUser;
use crate::auth::password::hash_password;
use crate::config::Config;
use crate::error::ApiError;
use crate::model::role::Role;
use crate::model::user::UserPublic;
use crate::utils::email_cache;
use crate::utils::email_filter;
use actix_web::{HttpResponse, web};
use serde::Deserialize;
use serde_json::json;
use sqlx::SqlitePool;
use tracing::info;
use utoipa::ToSchema;

#[derive(Deserialize, ToSchema)]
pub struct CreateUser {
    #[schema(example = "Charlie Employee")]
    pub full_name: String,
    #[schema(example = "emp@example.com", format = "email")]
    pub email: String,
    pub password: String,
    #[schema(example = "employee")]
    pub role: String,
    #[schema(example = "Engineering")]
    pub department: Option<String>,
}

#[derive(Deserialize, ToSchema)]
pub struct UpdateUser {
    pub full_name: String,
    pub role: String,
    pub department: Option<String>,
}

#[derive(Deserialize, ToSchema)]
pub struct ResetPassword {
    pub password: String,
}

/// true  => email AVAILABLE
/// false => email TAKEN
///
/// Cuckoo filter gives a fast negative, the moka cache a fast positive,
/// the store is the fallback.
pub async fn is_email_available(email: &str, pool: &SqlitePool) -> bool {
    let email = email.to_lowercase();

    if !email_filter::might_exist(&email) {
        return true;
    }

    if email_cache::is_taken(&email).await {
        return false;
    }

    let exists = sqlx::query_scalar::<_, bool>(
        "SELECT EXISTS(SELECT 1 FROM users WHERE email = ? LIMIT 1)",
    )
    .bind(&email)
    .fetch_one(pool)
    .await
    .unwrap_or(true); // fail-safe

    !exists
}

/// List users (admin only)
#[utoipa::path(
    get,
    path = "/api/v1/users",
    responses(
        (status = 200, description = "User list", body = [UserPublic]),
        (status = 403, description = "Forbidden")
    ),
    security(("bearer_auth" = [])),
    tag = "User"
)]
pub async fn list_users(
    auth: AuthUser,
    pool: web::Data<SqlitePool>,
) -> Result<HttpResponse, ApiError> {
    auth.require_admin()?;

    let rows = sqlx::query_as::<_, UserPublic>(
        "SELECT id, full_name, email, role, department FROM users ORDER BY full_name",
    )
    .fetch_all(pool.get_ref())
    .await?;

    Ok(HttpResponse::Ok().json(rows))
}

/// Create a user (admin only). Role decides the department rules:
/// admins carry none, a HOD claims the department's (vacant) leadership,
/// employees may only join a department that already has a HOD. Seeds one
/// balance row per leave type at its default allotment.
#[utoipa::path(
    post,
    path = "/api/v1/users",
    request_body = CreateUser,
    responses(
        (status = 200, description = "User created"),
        (status = 400, description = "Validation or constraint failure"),
        (status = 403, description = "Forbidden")
    ),
    security(("bearer_auth" = [])),
    tag = "User"
)]
pub async fn create_user(
    auth: AuthUser,
    pool: web::Data<SqlitePool>,
    config: web::Data<Config>,
    payload: web::Json<CreateUser>,
) -> Result<HttpResponse, ApiError> {
    auth.require_admin()?;

    let full_name = payload.full_name.trim();
    let email = payload.email.trim().to_lowercase();

    if full_name.is_empty() || email.is_empty() || payload.password.is_empty() {
        return Err(ApiError::validation("missing fields"));
    }
    if payload.password.len() < config.min_password_len {
        return Err(ApiError::validation("password too short"));
    }

    let role = payload
        .role
        .parse::<Role>()
        .map_err(|_| ApiError::validation("invalid role"))?;

    if !is_email_available(&email, pool.get_ref()).await {
        return Err(ApiError::conflict("email exists"));
    }

    let password_hash = hash_password(&payload.password);

    let mut tx = pool.begin().await?;

    // re-check inside the transaction; the filter/cache path is advisory
    let exists: bool =
        sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM users WHERE email = ? LIMIT 1)")
            .bind(&email)
            .fetch_one(&mut *tx)
            .await?;
    if exists {
        return Err(ApiError::conflict("email exists"));
    }

    let department = match role {
        // an admin never belongs to a department
        Role::Admin => None,
        Role::Hod => {
            let dept = payload
                .department
                .as_deref()
                .map(str::trim)
                .filter(|d| !d.is_empty())
                .ok_or_else(|| ApiError::validation("HOD must have a department"))?;

            let current_hod: Option<Option<i64>> =
                sqlx::query_scalar("SELECT hod_user_id FROM departments WHERE name = ?")
                    .bind(dept)
                    .fetch_optional(&mut *tx)
                    .await?;

            if let Some(Some(_)) = current_hod {
                return Err(ApiError::conflict("department already has HOD"));
            }
            Some(dept.to_string())
        }
        Role::Employee => {
            let dept = payload
                .department
                .as_deref()
                .map(str::trim)
                .filter(|d| !d.is_empty())
                .ok_or_else(|| ApiError::validation("employee must have a department"))?;

            let current_hod: Option<Option<i64>> =
                sqlx::query_scalar("SELECT hod_user_id FROM departments WHERE name = ?")
                    .bind(dept)
                    .fetch_optional(&mut *tx)
                    .await?;

            match current_hod {
                Some(Some(_)) => {}
                // a leaderless department cannot take new staff
                _ => {
                    return Err(ApiError::validation(
                        "department must exist and have a HOD",
                    ));
                }
            }
            Some(dept.to_string())
        }
    };

    let result = sqlx::query(
        "INSERT INTO users(full_name, email, password_hash, role, department) VALUES(?, ?, ?, ?, ?)",
    )
    .bind(full_name)
    .bind(&email)
    .bind(&password_hash)
    .bind(role.as_ref())
    .bind(&department)
    .execute(&mut *tx)
    .await?;

    let user_id = result.last_insert_rowid();

    if role == Role::Hod {
        // the department row may not exist yet; create it pointing at the
        // new HOD in the same transaction as the user insert
        if let Some(dept) = &department {
            upsert_department_hod(&mut tx, dept, user_id).await?;
        }
    }

    seed_balances(&mut tx, user_id).await?;

    tx.commit().await?;

    email_filter::insert(&email);
    email_cache::mark_taken(&email).await;

    info!(user_id, role = %role, "User created");

    Ok(HttpResponse::Ok().json(json!({ "ok": true, "id": user_id })))
}

/// Update a user's name, role, and department (admin only). A sitting HOD
/// cannot be demoted or relocated until the department's leadership is
/// reassigned.
#[utoipa::path(
    put,
    path = "/api/v1/users/{id}",
    params(("id" = i64, Path, description = "User ID")),
    request_body = UpdateUser,
    responses(
        (status = 200, description = "Updated"),
        (status = 400, description = "Validation or constraint failure"),
        (status = 404, description = "User not found")
    ),
    security(("bearer_auth" = [])),
    tag = "User"
)]
pub async fn update_user(
    auth: AuthUser,
    pool: web::Data<SqlitePool>,
    path: web::Path<i64>,
    payload: web::Json<UpdateUser>,
) -> Result<HttpResponse, ApiError> {
    auth.require_admin()?;

    let id = path.into_inner();
    let role = payload
        .role
        .parse::<Role>()
        .map_err(|_| ApiError::validation("invalid role"))?;
    let department = payload
        .department
        .as_deref()
        .map(str::trim)
        .filter(|d| !d.is_empty());

    let mut tx = pool.begin().await?;

    let exists: Option<i64> = sqlx::query_scalar("SELECT id FROM users WHERE id = ?")
        .bind(id)
        .fetch_optional(&mut *tx)
        .await?;
    if exists.is_none() {
        return Err(ApiError::not_found("not found"));
    }

    let led_department: Option<String> =
        sqlx::query_scalar("SELECT name FROM departments WHERE hod_user_id = ?")
            .bind(id)
            .fetch_optional(&mut *tx)
            .await?;

    if let Some(led) = &led_department {
        if role != Role::Hod || department != Some(led.as_str()) {
            return Err(ApiError::conflict(format!(
                "user is HOD for department \"{led}\"; reassign HOD before changing role/department"
            )));
        }
    }

    if role == Role::Hod {
        let dept = department.ok_or_else(|| ApiError::validation("HOD must have a department"))?;

        let current_hod: Option<Option<i64>> =
            sqlx::query_scalar("SELECT hod_user_id FROM departments WHERE name = ?")
                .bind(dept)
                .fetch_optional(&mut *tx)
                .await?;

        if let Some(Some(hod_id)) = current_hod {
            if hod_id != id {
                return Err(ApiError::conflict("department already has HOD"));
            }
        }
    }

    let stored_department = if role == Role::Admin { None } else { department };

    sqlx::query("UPDATE users SET full_name = ?, role = ?, department = ? WHERE id = ?")
        .bind(payload.full_name.trim())
        .bind(role.as_ref())
        .bind(stored_department)
        .bind(id)
        .execute(&mut *tx)
        .await?;

    if role == Role::Hod {
        if let Some(dept) = department {
            upsert_department_hod(&mut tx, dept, id).await?;
        }
    }

    tx.commit().await?;

    Ok(HttpResponse::Ok().json(json!({ "ok": true })))
}

/// Delete a user and cascade their requests and balances (admin only).
/// Refused while the user leads a department.
#[utoipa::path(
    delete,
    path = "/api/v1/users/{id}",
    params(("id" = i64, Path, description = "User ID")),
    responses(
        (status = 200, description = "Deleted"),
        (status = 400, description = "User is a sitting HOD"),
        (status = 404, description = "User not found")
    ),
    security(("bearer_auth" = [])),
    tag = "User"
)]
pub async fn delete_user(
    auth: AuthUser,
    pool: web::Data<SqlitePool>,
    path: web::Path<i64>,
) -> Result<HttpResponse, ApiError> {
    auth.require_admin()?;

    let id = path.into_inner();

    let mut tx = pool.begin().await?;

    let led_department: Option<String> =
        sqlx::query_scalar("SELECT name FROM departments WHERE hod_user_id = ?")
            .bind(id)
            .fetch_optional(&mut *tx)
            .await?;

    if let Some(dept) = led_department {
        return Err(ApiError::conflict(format!(
            "cannot delete user; they are HOD for department {dept} - reassign HOD first"
        )));
    }

    let email: Option<String> = sqlx::query_scalar("SELECT email FROM users WHERE id = ?")
        .bind(id)
        .fetch_optional(&mut *tx)
        .await?;
    let email = email.ok_or_else(|| ApiError::not_found("not found"))?;

    // requests, then balances, then the user row: no orphaned references
    // are observable at any intermediate point
    sqlx::query("DELETE FROM leave_requests WHERE user_id = ?")
        .bind(id)
        .execute(&mut *tx)
        .await?;
    sqlx::query("DELETE FROM user_leave_balances WHERE user_id = ?")
        .bind(id)
        .execute(&mut *tx)
        .await?;
    sqlx::query("DELETE FROM users WHERE id = ?")
        .bind(id)
        .execute(&mut *tx)
        .await?;

    tx.commit().await?;

    email_filter::remove(&email);
    email_cache::invalidate(&email).await;

    Ok(HttpResponse::Ok().json(json!({ "ok": true })))
}

/// Reset a user's password (admin only)
#[utoipa::path(
    post,
    path = "/api/v1/users/{id}/reset_password",
    params(("id" = i64, Path, description = "User ID")),
    request_body = ResetPassword,
    responses(
        (status = 200, description = "Password reset"),
        (status = 400, description = "Password too short"),
        (status = 404, description = "User not found")
    ),
    security(("bearer_auth" = [])),
    tag = "User"
)]
pub async fn reset_password(
    auth: AuthUser,
    pool: web::Data<SqlitePool>,
    config: web::Data<Config>,
    path: web::Path<i64>,
    payload: web::Json<ResetPassword>,
) -> Result<HttpResponse, ApiError> {
    auth.require_admin()?;

    let id = path.into_inner();

    if payload.password.len() < config.min_password_len {
        return Err(ApiError::validation("password too short"));
    }

    let hash = hash_password(&payload.password);

    let result = sqlx::query("UPDATE users SET password_hash = ? WHERE id = ?")
        .bind(&hash)
        .bind(id)
        .execute(pool.get_ref())
        .await?;

    if result.rows_affected() == 0 {
        return Err(ApiError::not_found("not found"));
    }

    Ok(HttpResponse::Ok().json(json!({ "ok": true })))
}

/// Point a department's HOD reference at `hod_id`, creating the row if the
/// department does not exist yet. Conditional update, never a whole-row
/// replace.
async fn upsert_department_hod(
    tx: &mut sqlx::Transaction<'_, sqlx::Sqlite>,
    name: &str,
    hod_id: i64,
) -> Result<(), sqlx::Error> {
    let updated = sqlx::query("UPDATE departments SET hod_user_id = ? WHERE name = ?")
        .bind(hod_id)
        .bind(name)
        .execute(&mut **tx)
        .await?;

    if updated.rows_affected() == 0 {
        sqlx::query("INSERT INTO departments(name, hod_user_id) VALUES(?, ?)")
            .bind(name)
            .bind(hod_id)
            .execute(&mut **tx)
            .await?;
    }
    Ok(())
}

/// One balance row per leave type, at the type's default allotment.
async fn seed_balances(
    tx: &mut sqlx::Transaction<'_, sqlx::Sqlite>,
    user_id: i64,
) -> Result<(), sqlx::Error> {
    let types = sqlx::query_as::<_, (i64, i64)>("SELECT id, default_days FROM leave_types")
        .fetch_all(&mut **tx)
        .await?;

    for (type_id, default_days) in types {
        sqlx::query(
            "INSERT OR REPLACE INTO user_leave_balances(user_id, leave_type_id, remaining_days) VALUES(?, ?, ?)",
        )
        .bind(user_id)
        .bind(type_id)
        .bind(default_days)
        .execute(&mut **tx)
        .await?;
    }
    Ok(())
}
