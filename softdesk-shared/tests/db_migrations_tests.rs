/// Integration tests for the embedded migrations
///
/// Skipped when DATABASE_URL is not set.

use softdesk_shared::db::migrations::{get_migration_status, run_migrations, MIGRATOR};
use softdesk_shared::db::pool::{close_pool, create_pool, DatabaseConfig};
use sqlx::PgPool;
use std::env;

async fn migrated_pool() -> Option<PgPool> {
    let url = env::var("DATABASE_URL").ok()?;
    let pool = create_pool(DatabaseConfig::from_url(url))
        .await
        .expect("Failed to create pool");

    run_migrations(&pool).await.expect("Migrations failed");
    Some(pool)
}

#[tokio::test]
async fn test_run_migrations_is_idempotent() {
    let Some(pool) = migrated_pool().await else {
        eprintln!("DATABASE_URL not set, skipping");
        return;
    };

    assert!(run_migrations(&pool).await.is_ok());

    close_pool(pool).await;
}

#[tokio::test]
async fn test_migration_status_up_to_date() {
    let Some(pool) = migrated_pool().await else {
        eprintln!("DATABASE_URL not set, skipping");
        return;
    };

    let status = get_migration_status(&pool).await.expect("Status query failed");
    let embedded = MIGRATOR
        .iter()
        .filter(|m| m.migration_type.is_up_migration())
        .count();

    assert!(status.is_up_to_date);
    assert!(status.applied_migrations >= embedded);

    close_pool(pool).await;
}

#[tokio::test]
async fn test_tables_exist() {
    let Some(pool) = migrated_pool().await else {
        eprintln!("DATABASE_URL not set, skipping");
        return;
    };

    for table in ["users", "projects", "contributors", "issues", "comments"] {
        let exists: bool = sqlx::query_scalar(
            "SELECT EXISTS (
                SELECT FROM information_schema.tables
                WHERE table_schema = 'public' AND table_name = $1
            )",
        )
        .bind(table)
        .fetch_one(&pool)
        .await
        .expect("Query failed");

        assert!(exists, "table {} should exist", table);
    }

    close_pool(pool).await;
}

#[tokio::test]
async fn test_enum_types_exist() {
    let Some(pool) = migrated_pool().await else {
        eprintln!("DATABASE_URL not set, skipping");
        return;
    };

    let statuses: Vec<String> = sqlx::query_scalar(
        "SELECT enumlabel::text FROM pg_enum e
         JOIN pg_type t ON t.oid = e.enumtypid
         WHERE t.typname = 'issue_status'
         ORDER BY e.enumsortorder",
    )
    .fetch_all(&pool)
    .await
    .expect("Query failed");

    assert_eq!(statuses, vec!["To Do", "In Progress", "Finished"]);

    close_pool(pool).await;
}

#[tokio::test]
async fn test_age_check_constraint() {
    let Some(pool) = migrated_pool().await else {
        eprintln!("DATABASE_URL not set, skipping");
        return;
    };

    let result = sqlx::query(
        "INSERT INTO users (username, password_hash, age) VALUES ($1, 'x', 14)",
    )
    .bind(format!("too-young-{}", uuid::Uuid::new_v4()))
    .execute(&pool)
    .await;

    assert!(result.is_err(), "age below 15 must be rejected by the schema");

    close_pool(pool).await;
}
