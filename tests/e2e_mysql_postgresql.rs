//! End-to-end test: MySQL `categories` → PostgreSQL `categories`.
//!
//! Requires both servers. Set `TEST_MYSQL_DSN` and `TEST_POSTGRES_DSN` to
//! scratch databases and run with `cargo test -- --ignored`.

use anyhow::{Context, Result};
use category_sync::{run_migration, DestinationOpts, SourceOpts, Summary, SyncOpts};
use mysql_async::prelude::*;
use std::num::NonZeroUsize;
use tokio_postgres::NoTls;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Initialize logging for tests
fn init_logging() {
    let _ = tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .try_init();
}

fn env_dsn(name: &str) -> Result<String> {
    std::env::var(name).with_context(|| format!("{name} must be set for end-to-end tests"))
}

async fn seed_mysql(dsn: &str) -> Result<()> {
    let pool = mysql_async::Pool::from_url(dsn)?;
    let mut conn = pool.get_conn().await?;

    conn.query_drop("DROP TABLE IF EXISTS categories").await?;
    conn.query_drop(
        "CREATE TABLE categories (
            id CHAR(36) PRIMARY KEY,
            name TEXT NOT NULL,
            category_type VARCHAR(32) NOT NULL,
            created_at DATETIME(6) NOT NULL,
            updated_at DATETIME(6) NOT NULL,
            deleted_at DATETIME(6) NULL,
            user_uuid CHAR(36) NOT NULL,
            description TEXT NULL,
            hidden TINYINT(1) NOT NULL DEFAULT 0
        )",
    )
    .await?;
    conn.query_drop(
        "INSERT INTO categories VALUES
            ('0190a3c4-7e1f-7000-8000-00000000000a', 'Salary', 'Income',
             '2024-01-01 00:00:01', '2024-01-01 00:00:01', NULL,
             '0190a3c4-7e1f-7000-8000-0000000000ff', 'Monthly pay', 0),
            ('0190a3c4-7e1f-7000-8000-00000000000b', 'Old', 'Bogus',
             '2024-01-01 00:00:02', '2024-01-01 00:00:02', NULL,
             '0190a3c4-7e1f-7000-8000-0000000000ff', NULL, 0),
            ('0190a3c4-7e1f-7000-8000-00000000000c', 'Rent', 'Expense',
             '2024-01-01 00:00:03', '2024-01-01 00:00:03', NULL,
             '0190a3c4-7e1f-7000-8000-0000000000ff', NULL, 1)",
    )
    .await
    .context("Failed to seed MySQL categories")?;

    drop(conn);
    pool.disconnect().await?;
    Ok(())
}

async fn seed_postgresql(dsn: &str) -> Result<tokio_postgres::Client> {
    let (client, connection) = tokio_postgres::connect(dsn, NoTls).await?;
    tokio::spawn(async move {
        if let Err(e) = connection.await {
            tracing::error!("PostgreSQL connection error: {}", e);
        }
    });

    client
        .batch_execute(
            "DROP TABLE IF EXISTS categories;
             DROP TYPE IF EXISTS category_type;
             CREATE TYPE category_type AS ENUM ('Income', 'Expense', 'Transfer');
             CREATE TABLE categories (
                 id uuid PRIMARY KEY,
                 name text NOT NULL,
                 category_type category_type NOT NULL,
                 created_at timestamptz NOT NULL DEFAULT now(),
                 updated_at timestamptz NOT NULL DEFAULT now(),
                 deleted_at timestamptz,
                 user_uuid uuid NOT NULL,
                 description text,
                 hidden boolean NOT NULL DEFAULT false
             );
             INSERT INTO categories (id, name, category_type, user_uuid)
             VALUES ('0190a3c4-7e1f-7000-8000-00000000000c', 'Rent (already migrated)',
                     'Expense', '0190a3c4-7e1f-7000-8000-0000000000ff');",
        )
        .await
        .context("Failed to prepare PostgreSQL categories")?;

    Ok(client)
}

#[tokio::test]
#[ignore = "Requires running MySQL and PostgreSQL servers (TEST_MYSQL_DSN, TEST_POSTGRES_DSN)"]
async fn test_full_migration_skips_invalid_and_existing() -> Result<()> {
    init_logging();
    let mysql_dsn = env_dsn("TEST_MYSQL_DSN")?;
    let postgres_dsn = env_dsn("TEST_POSTGRES_DSN")?;

    seed_mysql(&mysql_dsn).await?;
    let pg = seed_postgresql(&postgres_dsn).await?;

    let summary = run_migration(
        &SourceOpts {
            mysql_dsn: mysql_dsn.clone(),
        },
        &DestinationOpts {
            postgres_dsn: postgres_dsn.clone(),
        },
        &SyncOpts {
            progress_every: NonZeroUsize::new(1).context("non-zero")?,
        },
    )
    .await?;

    assert_eq!(
        summary,
        Summary {
            success: 1,
            skipped: 2,
            total: 3
        }
    );

    let rows = pg
        .query(
            "SELECT id::text, name, category_type::text, description, hidden
             FROM categories ORDER BY id",
            &[],
        )
        .await?;
    assert_eq!(rows.len(), 2);

    let salary = &rows[0];
    assert_eq!(salary.get::<_, String>(0), "0190a3c4-7e1f-7000-8000-00000000000a");
    assert_eq!(salary.get::<_, String>(1), "Salary");
    assert_eq!(salary.get::<_, String>(2), "Income");
    assert_eq!(salary.get::<_, Option<String>>(3).as_deref(), Some("Monthly pay"));
    assert!(!salary.get::<_, bool>(4));

    // The pre-existing row is untouched.
    assert_eq!(rows[1].get::<_, String>(1), "Rent (already migrated)");

    // A second run finds everything already present.
    let rerun = run_migration(
        &SourceOpts { mysql_dsn },
        &DestinationOpts { postgres_dsn },
        &SyncOpts {
            progress_every: NonZeroUsize::new(100).context("non-zero")?,
        },
    )
    .await?;
    assert_eq!(rerun.success, 0);
    assert_eq!(rerun.skipped, 3);

    Ok(())
}
