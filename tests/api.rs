use actix_web::web::Data;
use actix_web::{App, test};
use chrono::NaiveDate;
use lms::auth::jwt::generate_access_token;
use lms::auth::password::hash_password;
use lms::config::Config;
use lms::{db, routes};
use serde_json::{Value, json};
use sqlx::SqlitePool;
use sqlx::sqlite::SqlitePoolOptions;
use std::collections::HashSet;

const SECRET: &str = "test-secret";

fn test_config() -> Config {
    let holidays: HashSet<NaiveDate> = ["2026-01-01", "2026-12-25"]
        .iter()
        .map(|s| NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap())
        .collect();

    Config {
        database_url: "sqlite::memory:".to_string(),
        jwt_secret: SECRET.to_string(),
        server_addr: "127.0.0.1:0".to_string(),
        access_token_ttl: 3600,
        refresh_token_ttl: 86400,
        holidays,
        min_password_len: 4,
        rate_login_per_min: 600,
        rate_refresh_per_min: 600,
        rate_protected_per_min: 6000,
        api_prefix: "/api/v1".to_string(),
    }
}

/// In-memory sqlite; one connection so every statement sees the same db.
async fn test_pool() -> SqlitePool {
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect("sqlite::memory:")
        .await
        .unwrap();
    db::run_migrations(&pool).await.unwrap();
    db::seed_leave_types(&pool).await.unwrap();
    pool
}

macro_rules! spawn_app {
    ($pool:expr, $cfg:expr) => {
        test::init_service(
            App::new()
                .app_data(Data::new($pool.clone()))
                .app_data(Data::new($cfg.clone()))
                .configure(|c| routes::configure(c, $cfg.clone())),
        )
        .await
    };
}

async fn seed_admin(pool: &SqlitePool, email: &str) -> i64 {
    let hash = hash_password("password");
    let res = sqlx::query(
        "INSERT INTO users(full_name, email, password_hash, role, department) VALUES(?, ?, ?, 'admin', NULL)",
    )
    .bind("Alice Admin")
    .bind(email)
    .bind(&hash)
    .execute(pool)
    .await
    .unwrap();
    res.last_insert_rowid()
}

fn token(id: i64, email: &str, role: &str, department: Option<&str>) -> String {
    generate_access_token(
        id,
        email.to_string(),
        role.to_string(),
        department.map(str::to_string),
        SECRET,
        3600,
    )
}

fn get(uri: &str, tok: &str) -> test::TestRequest {
    test::TestRequest::get()
        .uri(uri)
        .peer_addr("127.0.0.1:12345".parse().unwrap())
        .insert_header(("Authorization", format!("Bearer {tok}")))
}

fn post(uri: &str, tok: &str, body: Value) -> test::TestRequest {
    test::TestRequest::post()
        .uri(uri)
        .peer_addr("127.0.0.1:12345".parse().unwrap())
        .insert_header(("Authorization", format!("Bearer {tok}")))
        .set_json(body)
}

fn put(uri: &str, tok: &str, body: Value) -> test::TestRequest {
    test::TestRequest::put()
        .uri(uri)
        .peer_addr("127.0.0.1:12345".parse().unwrap())
        .insert_header(("Authorization", format!("Bearer {tok}")))
        .set_json(body)
}

fn delete(uri: &str, tok: &str) -> test::TestRequest {
    test::TestRequest::delete()
        .uri(uri)
        .peer_addr("127.0.0.1:12345".parse().unwrap())
        .insert_header(("Authorization", format!("Bearer {tok}")))
}

async fn balance(pool: &SqlitePool, user_id: i64, leave_type_id: i64) -> i64 {
    sqlx::query_scalar(
        "SELECT remaining_days FROM user_leave_balances WHERE user_id = ? AND leave_type_id = ?",
    )
    .bind(user_id)
    .bind(leave_type_id)
    .fetch_one(pool)
    .await
    .unwrap()
}

async fn request_status(pool: &SqlitePool, id: i64) -> String {
    sqlx::query_scalar("SELECT status FROM leave_requests WHERE id = ?")
        .bind(id)
        .fetch_one(pool)
        .await
        .unwrap()
}

#[actix_web::test]
async fn working_day_calculator_is_public() {
    let pool = test_pool().await;
    let cfg = test_config();
    let app = spawn_app!(pool, cfg);

    let req = test::TestRequest::post()
        .uri("/calendar/working_days")
        .peer_addr("127.0.0.1:12345".parse().unwrap())
        .set_json(json!({ "start_date": "2026-01-05", "end_date": "2026-01-09" }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert!(resp.status().is_success());
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["days"], 5);

    // range crossing the New Year holiday
    let req = test::TestRequest::post()
        .uri("/calendar/working_days")
        .peer_addr("127.0.0.1:12345".parse().unwrap())
        .set_json(json!({ "start_date": "2025-12-30", "end_date": "2026-01-02" }))
        .to_request();
    let body: Value = test::read_body_json(test::call_service(&app, req).await).await;
    assert_eq!(body["days"], 3);

    let req = test::TestRequest::get()
        .uri("/calendar/holidays")
        .peer_addr("127.0.0.1:12345".parse().unwrap())
        .to_request();
    let body: Value = test::read_body_json(test::call_service(&app, req).await).await;
    assert_eq!(body, json!(["2026-01-01", "2026-12-25"]));
}

#[actix_web::test]
async fn login_returns_tokens_and_profile() {
    let pool = test_pool().await;
    let cfg = test_config();
    seed_admin(&pool, "t1.admin@example.com").await;
    let app = spawn_app!(pool, cfg);

    let req = test::TestRequest::post()
        .uri("/auth/login")
        .peer_addr("127.0.0.1:12345".parse().unwrap())
        .set_json(json!({ "email": "t1.admin@example.com", "password": "password" }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert!(resp.status().is_success());
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["role"], "admin");
    let access = body["access_token"].as_str().unwrap().to_string();

    let req = get("/api/v1/me", &access).to_request();
    let resp = test::call_service(&app, req).await;
    assert!(resp.status().is_success());
    let me: Value = test::read_body_json(resp).await;
    assert_eq!(me["email"], "t1.admin@example.com");

    // wrong password
    let req = test::TestRequest::post()
        .uri("/auth/login")
        .peer_addr("127.0.0.1:12345".parse().unwrap())
        .set_json(json!({ "email": "t1.admin@example.com", "password": "nope" }))
        .to_request();
    assert_eq!(test::call_service(&app, req).await.status(), 401);

    // no token at all
    let req = test::TestRequest::get()
        .uri("/api/v1/me")
        .peer_addr("127.0.0.1:12345".parse().unwrap())
        .to_request();
    assert_eq!(test::call_service(&app, req).await.status(), 401);
}

#[actix_web::test]
async fn creating_hod_claims_department_and_seeds_balances() {
    let pool = test_pool().await;
    let cfg = test_config();
    let admin_id = seed_admin(&pool, "t2.admin@example.com").await;
    let admin = token(admin_id, "t2.admin@example.com", "admin", None);
    let app = spawn_app!(pool, cfg);

    let req = post(
        "/api/v1/users",
        &admin,
        json!({
            "full_name": "Bob HOD",
            "email": "t2.hod@example.com",
            "password": "password",
            "role": "HOD",
            "department": "Engineering"
        }),
    )
    .to_request();
    let resp = test::call_service(&app, req).await;
    assert!(resp.status().is_success());
    let body: Value = test::read_body_json(resp).await;
    let hod_id = body["id"].as_i64().unwrap();

    // the department row was created pointing at the new HOD
    let req = get("/api/v1/departments", &admin).to_request();
    let depts: Value = test::read_body_json(test::call_service(&app, req).await).await;
    assert_eq!(depts[0]["name"], "Engineering");
    assert_eq!(depts[0]["hod_user_id"], hod_id);

    // one balance row per leave type, at the default allotment
    let rows: Vec<(i64, i64)> = sqlx::query_as(
        "SELECT leave_type_id, remaining_days FROM user_leave_balances WHERE user_id = ? ORDER BY leave_type_id",
    )
    .bind(hod_id)
    .fetch_all(&pool)
    .await
    .unwrap();
    assert_eq!(rows, vec![(1, 21), (2, 7)]);
}

#[actix_web::test]
async fn second_hod_for_department_is_rejected() {
    let pool = test_pool().await;
    let cfg = test_config();
    let admin_id = seed_admin(&pool, "t3.admin@example.com").await;
    let admin = token(admin_id, "t3.admin@example.com", "admin", None);
    let app = spawn_app!(pool, cfg);

    let req = post(
        "/api/v1/users",
        &admin,
        json!({
            "full_name": "Bob HOD", "email": "t3.hod@example.com",
            "password": "password", "role": "HOD", "department": "Engineering"
        }),
    )
    .to_request();
    let body: Value = test::read_body_json(test::call_service(&app, req).await).await;
    let first_hod = body["id"].as_i64().unwrap();

    let req = post(
        "/api/v1/users",
        &admin,
        json!({
            "full_name": "Eve HOD", "email": "t3.hod2@example.com",
            "password": "password", "role": "HOD", "department": "Engineering"
        }),
    )
    .to_request();
    assert_eq!(test::call_service(&app, req).await.status(), 400);

    // existing assignment unchanged
    let req = get("/api/v1/departments", &admin).to_request();
    let depts: Value = test::read_body_json(test::call_service(&app, req).await).await;
    assert_eq!(depts[0]["hod_user_id"], first_hod);
}

#[actix_web::test]
async fn employee_may_not_join_missing_or_leaderless_department() {
    let pool = test_pool().await;
    let cfg = test_config();
    let admin_id = seed_admin(&pool, "t4.admin@example.com").await;
    let admin = token(admin_id, "t4.admin@example.com", "admin", None);
    let app = spawn_app!(pool, cfg);

    // department does not exist
    let req = post(
        "/api/v1/users",
        &admin,
        json!({
            "full_name": "Charlie", "email": "t4.emp@example.com",
            "password": "password", "role": "employee", "department": "Ghost"
        }),
    )
    .to_request();
    assert_eq!(test::call_service(&app, req).await.status(), 400);

    // department exists but is leaderless
    let req = post("/api/v1/departments", &admin, json!({ "name": "Ops" })).to_request();
    assert!(test::call_service(&app, req).await.status().is_success());

    let req = post(
        "/api/v1/users",
        &admin,
        json!({
            "full_name": "Charlie", "email": "t4.emp@example.com",
            "password": "password", "role": "employee", "department": "Ops"
        }),
    )
    .to_request();
    assert_eq!(test::call_service(&app, req).await.status(), 400);

    // once a HOD exists the employee can join
    let req = post(
        "/api/v1/users",
        &admin,
        json!({
            "full_name": "Olga HOD", "email": "t4.hod@example.com",
            "password": "password", "role": "HOD", "department": "Ops"
        }),
    )
    .to_request();
    assert!(test::call_service(&app, req).await.status().is_success());

    let req = post(
        "/api/v1/users",
        &admin,
        json!({
            "full_name": "Charlie", "email": "t4.emp@example.com",
            "password": "password", "role": "employee", "department": "Ops"
        }),
    )
    .to_request();
    assert!(test::call_service(&app, req).await.status().is_success());
}

#[actix_web::test]
async fn duplicate_email_is_a_conflict() {
    let pool = test_pool().await;
    let cfg = test_config();
    let admin_id = seed_admin(&pool, "t5.admin@example.com").await;
    let admin = token(admin_id, "t5.admin@example.com", "admin", None);
    let app = spawn_app!(pool, cfg);

    let payload = json!({
        "full_name": "Second Admin", "email": "t5.other@example.com",
        "password": "password", "role": "admin"
    });
    let req = post("/api/v1/users", &admin, payload.clone()).to_request();
    assert!(test::call_service(&app, req).await.status().is_success());

    let req = post("/api/v1/users", &admin, payload).to_request();
    assert_eq!(test::call_service(&app, req).await.status(), 400);
}

#[actix_web::test]
async fn directory_delete_guards() {
    let pool = test_pool().await;
    let cfg = test_config();
    let admin_id = seed_admin(&pool, "t6.admin@example.com").await;
    let admin = token(admin_id, "t6.admin@example.com", "admin", None);
    let app = spawn_app!(pool, cfg);

    let req = post(
        "/api/v1/users",
        &admin,
        json!({
            "full_name": "Bob HOD", "email": "t6.hod@example.com",
            "password": "password", "role": "HOD", "department": "Engineering"
        }),
    )
    .to_request();
    let body: Value = test::read_body_json(test::call_service(&app, req).await).await;
    let hod_id = body["id"].as_i64().unwrap();

    let req = post(
        "/api/v1/users",
        &admin,
        json!({
            "full_name": "Charlie", "email": "t6.emp@example.com",
            "password": "password", "role": "employee", "department": "Engineering"
        }),
    )
    .to_request();
    let body: Value = test::read_body_json(test::call_service(&app, req).await).await;
    let emp_id = body["id"].as_i64().unwrap();

    let dept_id: i64 = sqlx::query_scalar("SELECT id FROM departments WHERE name = 'Engineering'")
        .fetch_one(&pool)
        .await
        .unwrap();

    // department still has users
    let req = delete(&format!("/api/v1/departments/{dept_id}"), &admin).to_request();
    assert_eq!(test::call_service(&app, req).await.status(), 400);

    // a sitting HOD cannot be deleted
    let req = delete(&format!("/api/v1/users/{hod_id}"), &admin).to_request();
    assert_eq!(test::call_service(&app, req).await.status(), 400);

    // a sitting HOD cannot be demoted either
    let req = put(
        &format!("/api/v1/users/{hod_id}"),
        &admin,
        json!({ "full_name": "Bob HOD", "role": "employee", "department": "Engineering" }),
    )
    .to_request();
    assert_eq!(test::call_service(&app, req).await.status(), 400);

    // deleting a plain employee cascades their rows
    let req = delete(&format!("/api/v1/users/{emp_id}"), &admin).to_request();
    assert!(test::call_service(&app, req).await.status().is_success());
    let remaining: i64 =
        sqlx::query_scalar("SELECT COUNT(*) FROM user_leave_balances WHERE user_id = ?")
            .bind(emp_id)
            .fetch_one(&pool)
            .await
            .unwrap();
    assert_eq!(remaining, 0);
}

#[actix_web::test]
async fn full_approval_flow_deducts_balance_once() {
    let pool = test_pool().await;
    let cfg = test_config();
    let admin_id = seed_admin(&pool, "t7.admin@example.com").await;
    let admin = token(admin_id, "t7.admin@example.com", "admin", None);
    let app = spawn_app!(pool, cfg);

    let req = post(
        "/api/v1/users",
        &admin,
        json!({
            "full_name": "Bob HOD", "email": "t7.hod@example.com",
            "password": "password", "role": "HOD", "department": "Engineering"
        }),
    )
    .to_request();
    let body: Value = test::read_body_json(test::call_service(&app, req).await).await;
    let hod_id = body["id"].as_i64().unwrap();
    let hod = token(hod_id, "t7.hod@example.com", "HOD", Some("Engineering"));

    let req = post(
        "/api/v1/users",
        &admin,
        json!({
            "full_name": "Charlie", "email": "t7.emp@example.com",
            "password": "password", "role": "employee", "department": "Engineering"
        }),
    )
    .to_request();
    let body: Value = test::read_body_json(test::call_service(&app, req).await).await;
    let emp_id = body["id"].as_i64().unwrap();
    let emp = token(emp_id, "t7.emp@example.com", "employee", Some("Engineering"));

    // a weekend-only range is refused outright
    let req = post(
        "/api/v1/leave",
        &emp,
        json!({
            "leave_type_id": 1,
            "start_date": "2026-01-03", "end_date": "2026-01-04",
            "reason": "nope"
        }),
    )
    .to_request();
    assert_eq!(test::call_service(&app, req).await.status(), 400);

    let req = post(
        "/api/v1/leave",
        &emp,
        json!({
            "leave_type_id": 1,
            "start_date": "2026-01-05", "end_date": "2026-01-09",
            "reason": "family matters"
        }),
    )
    .to_request();
    let resp = test::call_service(&app, req).await;
    assert!(resp.status().is_success());
    let body: Value = test::read_body_json(resp).await;
    let leave_id = body["id"].as_i64().unwrap();

    // employee sees their own request
    let req = get("/api/v1/leave", &emp).to_request();
    let rows: Value = test::read_body_json(test::call_service(&app, req).await).await;
    assert_eq!(rows.as_array().unwrap().len(), 1);
    assert_eq!(rows[0]["days"], 5);
    assert_eq!(rows[0]["status"], "pending");

    // HOD queue holds it too
    let req = get("/api/v1/leave", &hod).to_request();
    let rows: Value = test::read_body_json(test::call_service(&app, req).await).await;
    assert_eq!(rows.as_array().unwrap().len(), 1);

    let req = post(
        &format!("/api/v1/leave/{leave_id}/hod_action"),
        &hod,
        json!({ "action": "approve", "comment": "ok" }),
    )
    .to_request();
    assert!(test::call_service(&app, req).await.status().is_success());

    // decided requests leave the HOD's to-do queue
    let req = get("/api/v1/leave", &hod).to_request();
    let rows: Value = test::read_body_json(test::call_service(&app, req).await).await;
    assert_eq!(rows.as_array().unwrap().len(), 0);

    // a second HOD decision is refused
    let req = post(
        &format!("/api/v1/leave/{leave_id}/hod_action"),
        &hod,
        json!({ "action": "reject", "comment": "changed my mind" }),
    )
    .to_request();
    assert_eq!(test::call_service(&app, req).await.status(), 400);

    // admin sees it awaiting final sign-off
    let req = get("/api/v1/leave", &admin).to_request();
    let rows: Value = test::read_body_json(test::call_service(&app, req).await).await;
    assert_eq!(rows[0]["status"], "hod_approved");

    let req = post(
        &format!("/api/v1/leave/{leave_id}/admin_action"),
        &admin,
        json!({ "action": "approve", "comment": "enjoy" }),
    )
    .to_request();
    assert!(test::call_service(&app, req).await.status().is_success());

    assert_eq!(balance(&pool, emp_id, 1).await, 16);
    assert_eq!(request_status(&pool, leave_id).await, "admin_approved");

    // terminal state: no further decision, no second deduction
    let req = post(
        &format!("/api/v1/leave/{leave_id}/admin_action"),
        &admin,
        json!({ "action": "approve", "comment": "again" }),
    )
    .to_request();
    assert_eq!(test::call_service(&app, req).await.status(), 400);
    assert_eq!(balance(&pool, emp_id, 1).await, 16);
}

#[actix_web::test]
async fn admin_approval_checks_balance_before_deducting() {
    let pool = test_pool().await;
    let cfg = test_config();
    let admin_id = seed_admin(&pool, "t8.admin@example.com").await;
    let admin = token(admin_id, "t8.admin@example.com", "admin", None);
    let app = spawn_app!(pool, cfg);

    let req = post(
        "/api/v1/users",
        &admin,
        json!({
            "full_name": "Bob HOD", "email": "t8.hod@example.com",
            "password": "password", "role": "HOD", "department": "Engineering"
        }),
    )
    .to_request();
    let body: Value = test::read_body_json(test::call_service(&app, req).await).await;
    let hod_id = body["id"].as_i64().unwrap();
    let hod = token(hod_id, "t8.hod@example.com", "HOD", Some("Engineering"));

    let req = post(
        "/api/v1/users",
        &admin,
        json!({
            "full_name": "Charlie", "email": "t8.emp@example.com",
            "password": "password", "role": "employee", "department": "Engineering"
        }),
    )
    .to_request();
    let body: Value = test::read_body_json(test::call_service(&app, req).await).await;
    let emp_id = body["id"].as_i64().unwrap();
    let emp = token(emp_id, "t8.emp@example.com", "employee", Some("Engineering"));

    let req = post(
        "/api/v1/leave",
        &emp,
        json!({
            "leave_type_id": 1,
            "start_date": "2026-01-05", "end_date": "2026-01-09",
            "reason": "trip"
        }),
    )
    .to_request();
    let body: Value = test::read_body_json(test::call_service(&app, req).await).await;
    let leave_id = body["id"].as_i64().unwrap();

    let req = post(
        &format!("/api/v1/leave/{leave_id}/hod_action"),
        &hod,
        json!({ "action": "approve" }),
    )
    .to_request();
    assert!(test::call_service(&app, req).await.status().is_success());

    // admin override shrinks the balance below the request's day count
    let req = put(
        &format!("/api/v1/balances/{emp_id}/1"),
        &admin,
        json!({ "remaining_days": 3 }),
    )
    .to_request();
    assert!(test::call_service(&app, req).await.status().is_success());

    let req = post(
        &format!("/api/v1/leave/{leave_id}/admin_action"),
        &admin,
        json!({ "action": "approve" }),
    )
    .to_request();
    assert_eq!(test::call_service(&app, req).await.status(), 400);

    // nothing was deducted and the request is still awaiting a decision
    assert_eq!(balance(&pool, emp_id, 1).await, 3);
    assert_eq!(request_status(&pool, leave_id).await, "hod_approved");

    // rejection is always possible and never touches the ledger
    let req = post(
        &format!("/api/v1/leave/{leave_id}/admin_action"),
        &admin,
        json!({ "action": "reject", "comment": "no budget" }),
    )
    .to_request();
    assert!(test::call_service(&app, req).await.status().is_success());
    assert_eq!(balance(&pool, emp_id, 1).await, 3);
    assert_eq!(request_status(&pool, leave_id).await, "rejected");
}

#[actix_web::test]
async fn submission_does_not_reserve_days() {
    let pool = test_pool().await;
    let cfg = test_config();
    let admin_id = seed_admin(&pool, "t9.admin@example.com").await;
    let admin = token(admin_id, "t9.admin@example.com", "admin", None);
    let app = spawn_app!(pool, cfg);

    let req = post(
        "/api/v1/users",
        &admin,
        json!({
            "full_name": "Bob HOD", "email": "t9.hod@example.com",
            "password": "password", "role": "HOD", "department": "Engineering"
        }),
    )
    .to_request();
    let body: Value = test::read_body_json(test::call_service(&app, req).await).await;
    let hod_id = body["id"].as_i64().unwrap();
    let hod = token(hod_id, "t9.hod@example.com", "HOD", Some("Engineering"));

    let req = post(
        "/api/v1/users",
        &admin,
        json!({
            "full_name": "Charlie", "email": "t9.emp@example.com",
            "password": "password", "role": "employee", "department": "Engineering"
        }),
    )
    .to_request();
    let body: Value = test::read_body_json(test::call_service(&app, req).await).await;
    let emp_id = body["id"].as_i64().unwrap();
    let emp = token(emp_id, "t9.emp@example.com", "employee", Some("Engineering"));

    // 10 working days, then 15: together over the 21-day allotment, but
    // both pass the advisory check at submission time
    let req = post(
        "/api/v1/leave",
        &emp,
        json!({ "leave_type_id": 1, "start_date": "2026-02-02", "end_date": "2026-02-13" }),
    )
    .to_request();
    let body: Value = test::read_body_json(test::call_service(&app, req).await).await;
    let first = body["id"].as_i64().unwrap();

    let req = post(
        "/api/v1/leave",
        &emp,
        json!({ "leave_type_id": 1, "start_date": "2026-03-02", "end_date": "2026-03-20" }),
    )
    .to_request();
    let body: Value = test::read_body_json(test::call_service(&app, req).await).await;
    let second = body["id"].as_i64().unwrap();

    for id in [first, second] {
        let req = post(
            &format!("/api/v1/leave/{id}/hod_action"),
            &hod,
            json!({ "action": "approve" }),
        )
        .to_request();
        assert!(test::call_service(&app, req).await.status().is_success());
    }

    let req = post(
        &format!("/api/v1/leave/{first}/admin_action"),
        &admin,
        json!({ "action": "approve" }),
    )
    .to_request();
    assert!(test::call_service(&app, req).await.status().is_success());
    assert_eq!(balance(&pool, emp_id, 1).await, 11);

    // the loser of the race fails at final approval, not at submission
    let req = post(
        &format!("/api/v1/leave/{second}/admin_action"),
        &admin,
        json!({ "action": "approve" }),
    )
    .to_request();
    assert_eq!(test::call_service(&app, req).await.status(), 400);
    assert_eq!(balance(&pool, emp_id, 1).await, 11);
}

#[actix_web::test]
async fn hod_cannot_decide_for_another_department() {
    let pool = test_pool().await;
    let cfg = test_config();
    let admin_id = seed_admin(&pool, "t10.admin@example.com").await;
    let admin = token(admin_id, "t10.admin@example.com", "admin", None);
    let app = spawn_app!(pool, cfg);

    for (email, dept) in [
        ("t10.hod.eng@example.com", "Engineering"),
        ("t10.hod.hr@example.com", "HR"),
    ] {
        let req = post(
            "/api/v1/users",
            &admin,
            json!({
                "full_name": "Head", "email": email,
                "password": "password", "role": "HOD", "department": dept
            }),
        )
        .to_request();
        assert!(test::call_service(&app, req).await.status().is_success());
    }

    let req = post(
        "/api/v1/users",
        &admin,
        json!({
            "full_name": "Charlie", "email": "t10.emp@example.com",
            "password": "password", "role": "employee", "department": "Engineering"
        }),
    )
    .to_request();
    let body: Value = test::read_body_json(test::call_service(&app, req).await).await;
    let emp_id = body["id"].as_i64().unwrap();
    let emp = token(emp_id, "t10.emp@example.com", "employee", Some("Engineering"));

    let req = post(
        "/api/v1/leave",
        &emp,
        json!({ "leave_type_id": 1, "start_date": "2026-01-05", "end_date": "2026-01-09" }),
    )
    .to_request();
    let body: Value = test::read_body_json(test::call_service(&app, req).await).await;
    let leave_id = body["id"].as_i64().unwrap();

    let hr_hod_id: i64 =
        sqlx::query_scalar("SELECT id FROM users WHERE email = 't10.hod.hr@example.com'")
            .fetch_one(&pool)
            .await
            .unwrap();
    let hr_hod = token(hr_hod_id, "t10.hod.hr@example.com", "HOD", Some("HR"));

    let req = post(
        &format!("/api/v1/leave/{leave_id}/hod_action"),
        &hr_hod,
        json!({ "action": "approve" }),
    )
    .to_request();
    assert_eq!(test::call_service(&app, req).await.status(), 403);

    // an employee cannot decide at all
    let req = post(
        &format!("/api/v1/leave/{leave_id}/hod_action"),
        &emp,
        json!({ "action": "approve" }),
    )
    .to_request();
    assert_eq!(test::call_service(&app, req).await.status(), 403);
}

#[actix_web::test]
async fn password_reset_enforces_minimum_length() {
    let pool = test_pool().await;
    let cfg = test_config();
    let admin_id = seed_admin(&pool, "t11.admin@example.com").await;
    let admin = token(admin_id, "t11.admin@example.com", "admin", None);
    let app = spawn_app!(pool, cfg);

    let req = post(
        &format!("/api/v1/users/{admin_id}/reset_password"),
        &admin,
        json!({ "password": "abc" }),
    )
    .to_request();
    assert_eq!(test::call_service(&app, req).await.status(), 400);

    let req = post(
        &format!("/api/v1/users/{admin_id}/reset_password"),
        &admin,
        json!({ "password": "newpass" }),
    )
    .to_request();
    assert!(test::call_service(&app, req).await.status().is_success());

    // the new credential works
    let req = test::TestRequest::post()
        .uri("/auth/login")
        .peer_addr("127.0.0.1:12345".parse().unwrap())
        .set_json(json!({ "email": "t11.admin@example.com", "password": "newpass" }))
        .to_request();
    assert!(test::call_service(&app, req).await.status().is_success());
}

#[actix_web::test]
async fn non_admin_is_locked_out_of_directory_endpoints() {
    let pool = test_pool().await;
    let cfg = test_config();
    let admin_id = seed_admin(&pool, "t12.admin@example.com").await;
    let admin = token(admin_id, "t12.admin@example.com", "admin", None);
    let app = spawn_app!(pool, cfg);

    let req = post(
        "/api/v1/users",
        &admin,
        json!({
            "full_name": "Bob HOD", "email": "t12.hod@example.com",
            "password": "password", "role": "HOD", "department": "Engineering"
        }),
    )
    .to_request();
    let body: Value = test::read_body_json(test::call_service(&app, req).await).await;
    let hod_id = body["id"].as_i64().unwrap();
    let hod = token(hod_id, "t12.hod@example.com", "HOD", Some("Engineering"));

    let req = get("/api/v1/users", &hod).to_request();
    assert_eq!(test::call_service(&app, req).await.status(), 403);

    let req = post("/api/v1/departments", &hod, json!({ "name": "Rogue" })).to_request();
    assert_eq!(test::call_service(&app, req).await.status(), 403);

    let req = get("/api/v1/analytics/departments", &hod).to_request();
    assert_eq!(test::call_service(&app, req).await.status(), 403);
}

#[actix_web::test]
async fn refresh_rotation_revokes_the_presented_token() {
    let pool = test_pool().await;
    let cfg = test_config();
    seed_admin(&pool, "t13.admin@example.com").await;
    let app = spawn_app!(pool, cfg);

    let req = test::TestRequest::post()
        .uri("/auth/login")
        .peer_addr("127.0.0.1:12345".parse().unwrap())
        .set_json(json!({ "email": "t13.admin@example.com", "password": "password" }))
        .to_request();
    let body: Value = test::read_body_json(test::call_service(&app, req).await).await;
    let first_refresh = body["refresh_token"].as_str().unwrap().to_string();

    // rotate: the presented token is revoked, a fresh pair comes back
    let req = post("/auth/refresh", &first_refresh, json!({})).to_request();
    let resp = test::call_service(&app, req).await;
    assert!(resp.status().is_success());
    let body: Value = test::read_body_json(resp).await;
    let second_refresh = body["refresh_token"].as_str().unwrap().to_string();
    let rotated_access = body["access_token"].as_str().unwrap().to_string();

    // the new access token is a working session
    let req = get("/api/v1/me", &rotated_access).to_request();
    assert!(test::call_service(&app, req).await.status().is_success());

    // replaying the rotated-out token is refused
    let req = post("/auth/refresh", &first_refresh, json!({})).to_request();
    assert_eq!(test::call_service(&app, req).await.status(), 401);

    // the replacement still rotates
    let req = post("/auth/refresh", &second_refresh, json!({})).to_request();
    let resp = test::call_service(&app, req).await;
    assert!(resp.status().is_success());
    let body: Value = test::read_body_json(resp).await;
    let third_refresh = body["refresh_token"].as_str().unwrap().to_string();

    // logout revokes; the token is dead afterwards
    let req = post("/auth/logout", &third_refresh, json!({})).to_request();
    assert_eq!(test::call_service(&app, req).await.status(), 204);

    let req = post("/auth/refresh", &third_refresh, json!({})).to_request();
    assert_eq!(test::call_service(&app, req).await.status(), 401);

    // an access token is not accepted where a refresh token is expected
    let req = post("/auth/refresh", &rotated_access, json!({})).to_request();
    assert_eq!(test::call_service(&app, req).await.status(), 401);
}

#[actix_web::test]
async fn detail_fetch_is_role_scoped() {
    let pool = test_pool().await;
    let cfg = test_config();
    let admin_id = seed_admin(&pool, "t14.admin@example.com").await;
    let admin = token(admin_id, "t14.admin@example.com", "admin", None);
    let app = spawn_app!(pool, cfg);

    for (email, dept) in [
        ("t14.hod.eng@example.com", "Engineering"),
        ("t14.hod.hr@example.com", "HR"),
    ] {
        let req = post(
            "/api/v1/users",
            &admin,
            json!({
                "full_name": "Head", "email": email,
                "password": "password", "role": "HOD", "department": dept
            }),
        )
        .to_request();
        assert!(test::call_service(&app, req).await.status().is_success());
    }

    let mut emp_ids = Vec::new();
    for email in ["t14.emp@example.com", "t14.peer@example.com"] {
        let req = post(
            "/api/v1/users",
            &admin,
            json!({
                "full_name": "Staff", "email": email,
                "password": "password", "role": "employee", "department": "Engineering"
            }),
        )
        .to_request();
        let body: Value = test::read_body_json(test::call_service(&app, req).await).await;
        emp_ids.push(body["id"].as_i64().unwrap());
    }
    let owner = token(emp_ids[0], "t14.emp@example.com", "employee", Some("Engineering"));
    let peer = token(emp_ids[1], "t14.peer@example.com", "employee", Some("Engineering"));

    let req = post(
        "/api/v1/leave",
        &owner,
        json!({ "leave_type_id": 1, "start_date": "2026-01-05", "end_date": "2026-01-09" }),
    )
    .to_request();
    let body: Value = test::read_body_json(test::call_service(&app, req).await).await;
    let leave_id = body["id"].as_i64().unwrap();
    let uri = format!("/api/v1/leave/{leave_id}");

    // the requester sees their own request
    let req = get(&uri, &owner).to_request();
    let resp = test::call_service(&app, req).await;
    assert!(resp.status().is_success());
    let row: Value = test::read_body_json(resp).await;
    assert_eq!(row["id"].as_i64(), Some(leave_id));
    assert_eq!(row["user_id"].as_i64(), Some(emp_ids[0]));

    // another employee does not, even in the same department
    let req = get(&uri, &peer).to_request();
    assert_eq!(test::call_service(&app, req).await.status(), 403);

    // the department's own HOD sees it
    let eng_hod_id: i64 =
        sqlx::query_scalar("SELECT id FROM users WHERE email = 't14.hod.eng@example.com'")
            .fetch_one(&pool)
            .await
            .unwrap();
    let eng_hod = token(eng_hod_id, "t14.hod.eng@example.com", "HOD", Some("Engineering"));
    let req = get(&uri, &eng_hod).to_request();
    assert!(test::call_service(&app, req).await.status().is_success());

    // a HOD from another department does not
    let hr_hod_id: i64 =
        sqlx::query_scalar("SELECT id FROM users WHERE email = 't14.hod.hr@example.com'")
            .fetch_one(&pool)
            .await
            .unwrap();
    let hr_hod = token(hr_hod_id, "t14.hod.hr@example.com", "HOD", Some("HR"));
    let req = get(&uri, &hr_hod).to_request();
    assert_eq!(test::call_service(&app, req).await.status(), 403);

    // admin sees any request; an unknown id is a plain 404
    let req = get(&uri, &admin).to_request();
    assert!(test::call_service(&app, req).await.status().is_success());
    let req = get("/api/v1/leave/999999", &admin).to_request();
    assert_eq!(test::call_service(&app, req).await.status(), 404);
}
