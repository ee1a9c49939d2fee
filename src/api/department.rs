use crate::auth::auth::AuthUser;
use crate::error::ApiError;
use crate::model::department::DepartmentWithHod;
use actix_web::{HttpResponse, web};
use serde::Deserialize;
use serde_json::json;
use sqlx::SqlitePool;
use utoipa::ToSchema;

#[derive(Deserialize, ToSchema)]
pub struct DepartmentReq {
    #[schema(example = "Engineering")]
    pub name: String,
    pub hod_user_id: Option<i64>,
}

/// List departments with their HOD profile (admin only)
#[utoipa::path(
    get,
    path = "/api/v1/departments",
    responses(
        (status = 200, description = "Department list", body = [DepartmentWithHod]),
        (status = 403, description = "Forbidden")
    ),
    security(("bearer_auth" = [])),
    tag = "Department"
)]
pub async fn list_departments(
    auth: AuthUser,
    pool: web::Data<SqlitePool>,
) -> Result<HttpResponse, ApiError> {
    auth.require_admin()?;

    let rows = sqlx::query_as::<_, DepartmentWithHod>(
        r#"
        SELECT d.id, d.name, d.hod_user_id, u.full_name AS hod_name, u.email AS hod_email
        FROM departments d
        LEFT JOIN users u ON u.id = d.hod_user_id
        ORDER BY d.name
        "#,
    )
    .fetch_all(pool.get_ref())
    .await?;

    Ok(HttpResponse::Ok().json(rows))
}

/// Create a department, or update the HOD of an existing one.
///
/// The name is a natural key: posting an existing name is an upsert. An
/// existing row keeps its HOD unless a new one is supplied.
#[utoipa::path(
    post,
    path = "/api/v1/departments",
    request_body = DepartmentReq,
    responses(
        (status = 200, description = "Created or updated"),
        (status = 400, description = "Missing name or unknown HOD reference"),
        (status = 403, description = "Forbidden")
    ),
    security(("bearer_auth" = [])),
    tag = "Department"
)]
pub async fn create_department(
    auth: AuthUser,
    pool: web::Data<SqlitePool>,
    payload: web::Json<DepartmentReq>,
) -> Result<HttpResponse, ApiError> {
    auth.require_admin()?;

    let name = payload.name.trim();
    if name.is_empty() {
        return Err(ApiError::validation("missing name"));
    }

    if let Some(hod_id) = payload.hod_user_id {
        ensure_user_exists(pool.get_ref(), hod_id).await?;
    }

    let mut tx = pool.begin().await?;

    let existing: Option<i64> = sqlx::query_scalar("SELECT id FROM departments WHERE name = ?")
        .bind(name)
        .fetch_optional(&mut *tx)
        .await?;

    let id = match existing {
        Some(id) => {
            if let Some(hod_id) = payload.hod_user_id {
                sqlx::query("UPDATE departments SET hod_user_id = ? WHERE id = ?")
                    .bind(hod_id)
                    .bind(id)
                    .execute(&mut *tx)
                    .await?;
            }
            id
        }
        None => {
            let result = sqlx::query("INSERT INTO departments(name, hod_user_id) VALUES(?, ?)")
                .bind(name)
                .bind(payload.hod_user_id)
                .execute(&mut *tx)
                .await?;
            result.last_insert_rowid()
        }
    };

    tx.commit().await?;

    Ok(HttpResponse::Ok().json(json!({ "ok": true, "id": id })))
}

/// Update a department's name and HOD; omitting the HOD leaves the
/// department leaderless.
#[utoipa::path(
    put,
    path = "/api/v1/departments/{id}",
    params(("id" = i64, Path, description = "Department ID")),
    request_body = DepartmentReq,
    responses(
        (status = 200, description = "Updated"),
        (status = 400, description = "Missing name or unknown HOD reference"),
        (status = 404, description = "Department not found")
    ),
    security(("bearer_auth" = [])),
    tag = "Department"
)]
pub async fn update_department(
    auth: AuthUser,
    pool: web::Data<SqlitePool>,
    path: web::Path<i64>,
    payload: web::Json<DepartmentReq>,
) -> Result<HttpResponse, ApiError> {
    auth.require_admin()?;

    let id = path.into_inner();
    let name = payload.name.trim();
    if name.is_empty() {
        return Err(ApiError::validation("missing name"));
    }

    if let Some(hod_id) = payload.hod_user_id {
        ensure_user_exists(pool.get_ref(), hod_id).await?;
    }

    let result = sqlx::query("UPDATE departments SET name = ?, hod_user_id = ? WHERE id = ?")
        .bind(name)
        .bind(payload.hod_user_id)
        .bind(id)
        .execute(pool.get_ref())
        .await?;

    if result.rows_affected() == 0 {
        return Err(ApiError::not_found("not found"));
    }

    Ok(HttpResponse::Ok().json(json!({ "ok": true })))
}

/// Delete a department. Refused while any user is still assigned to it.
#[utoipa::path(
    delete,
    path = "/api/v1/departments/{id}",
    params(("id" = i64, Path, description = "Department ID")),
    responses(
        (status = 200, description = "Deleted"),
        (status = 400, description = "Department still has users"),
        (status = 404, description = "Department not found")
    ),
    security(("bearer_auth" = [])),
    tag = "Department"
)]
pub async fn delete_department(
    auth: AuthUser,
    pool: web::Data<SqlitePool>,
    path: web::Path<i64>,
) -> Result<HttpResponse, ApiError> {
    auth.require_admin()?;

    let id = path.into_inner();

    // check-then-delete must not race user creation in the same department
    let mut tx = pool.begin().await?;

    let name: Option<String> = sqlx::query_scalar("SELECT name FROM departments WHERE id = ?")
        .bind(id)
        .fetch_optional(&mut *tx)
        .await?;

    let name = name.ok_or_else(|| ApiError::not_found("not found"))?;

    let users: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM users WHERE department = ?")
        .bind(&name)
        .fetch_one(&mut *tx)
        .await?;

    if users > 0 {
        return Err(ApiError::conflict(
            "department has users; reassign or remove them first",
        ));
    }

    sqlx::query("DELETE FROM departments WHERE id = ?")
        .bind(id)
        .execute(&mut *tx)
        .await?;

    tx.commit().await?;

    Ok(HttpResponse::Ok().json(json!({ "ok": true })))
}

async fn ensure_user_exists(pool: &SqlitePool, user_id: i64) -> Result<(), ApiError> {
    let exists: Option<i64> = sqlx::query_scalar("SELECT id FROM users WHERE id = ?")
        .bind(user_id)
        .fetch_optional(pool)
        .await?;

    if exists.is_none() {
        return Err(ApiError::reference("invalid hod_user_id"));
    }
    Ok(())
}
