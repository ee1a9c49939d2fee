use sqlx::SqlitePool;

/// Connect to the embedded sqlite store. Use `?mode=rwc` in the URL to
/// create the file on first boot.
pub async fn init_db(database_url: &str) -> SqlitePool {
    SqlitePool::connect(database_url)
        .await
        .expect("Failed to connect to database")
}

/// Idempotent schema setup. Statements run one at a time; every table is
/// `IF NOT EXISTS`.
pub async fn run_migrations(pool: &SqlitePool) -> Result<(), sqlx::Error> {
    let statements = [
        r#"
        CREATE TABLE IF NOT EXISTS users(
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            full_name TEXT NOT NULL,
            email TEXT NOT NULL UNIQUE,
            password_hash TEXT NOT NULL,
            role TEXT NOT NULL,
            department TEXT,
            last_login_at TEXT
        )
        "#,
        r#"
        CREATE TABLE IF NOT EXISTS departments(
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            name TEXT NOT NULL UNIQUE,
            hod_user_id INTEGER
        )
        "#,
        r#"
        CREATE TABLE IF NOT EXISTS leave_types(
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            name TEXT NOT NULL,
            default_days INTEGER NOT NULL,
            editable INTEGER NOT NULL DEFAULT 1
        )
        "#,
        r#"
        CREATE TABLE IF NOT EXISTS user_leave_balances(
            user_id INTEGER NOT NULL,
            leave_type_id INTEGER NOT NULL,
            remaining_days INTEGER NOT NULL,
            PRIMARY KEY(user_id, leave_type_id)
        )
        "#,
        r#"
        CREATE TABLE IF NOT EXISTS leave_requests(
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            user_id INTEGER NOT NULL,
            leave_type_id INTEGER NOT NULL,
            start_date TEXT NOT NULL,
            end_date TEXT NOT NULL,
            days INTEGER NOT NULL,
            reason TEXT,
            status TEXT NOT NULL,
            hod_comment TEXT,
            admin_comment TEXT,
            created_at TEXT NOT NULL,
            updated_at TEXT NOT NULL
        )
        "#,
        r#"
        CREATE TABLE IF NOT EXISTS refresh_tokens(
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            user_id INTEGER NOT NULL,
            jti TEXT NOT NULL UNIQUE,
            expires_at TEXT NOT NULL,
            revoked INTEGER NOT NULL DEFAULT 0
        )
        "#,
    ];

    for sql in statements {
        sqlx::query(sql).execute(pool).await?;
    }
    Ok(())
}

/// Seed the leave-type catalog once, on an empty table. The catalog is
/// immutable after that.
pub async fn seed_leave_types(pool: &SqlitePool) -> Result<(), sqlx::Error> {
    let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM leave_types")
        .fetch_one(pool)
        .await?;

    if count == 0 {
        for (name, default_days) in [("Annual", 21i64), ("Sick", 7i64)] {
            sqlx::query("INSERT INTO leave_types(name, default_days, editable) VALUES(?, ?, 1)")
                .bind(name)
                .bind(default_days)
                .execute(pool)
                .await?;
        }
        tracing::info!("Seeded default leave types");
    }

    Ok(())
}
