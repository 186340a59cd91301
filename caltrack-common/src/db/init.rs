//! Database initialization
//!
//! Creates the database file and any missing tables on first run.

use crate::Result;
use sqlx::{sqlite::SqlitePoolOptions, SqlitePool};
use std::path::Path;
use tracing::info;

/// Open (creating if needed) the database and ensure the schema exists
pub async fn init_database(db_path: &Path) -> Result<SqlitePool> {
    let newly_created = !db_path.exists();

    // Create parent directory if it doesn't exist
    if let Some(parent) = db_path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    let db_url = format!("sqlite://{}?mode=rwc", db_path.display());
    let pool = SqlitePoolOptions::new()
        .max_connections(10)
        .after_connect(|conn, _meta| {
            Box::pin(async move {
                // Per-connection pragma; must be set on every pooled connection
                sqlx::query("PRAGMA foreign_keys = ON").execute(&mut *conn).await?;
                sqlx::query("PRAGMA busy_timeout = 5000").execute(&mut *conn).await?;
                Ok(())
            })
        })
        .connect(&db_url)
        .await?;

    if newly_created {
        info!("Initialized new database: {}", db_path.display());
    } else {
        info!("Opened existing database: {}", db_path.display());
    }

    // WAL allows concurrent readers alongside the single writer
    sqlx::query("PRAGMA journal_mode = WAL")
        .execute(&pool)
        .await?;

    // Idempotent - safe to call on every start
    create_component_table(&pool).await?;
    create_calibration_data_table(&pool).await?;

    Ok(pool)
}

/// Create the component table
pub async fn create_component_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS component (
            id INTEGER PRIMARY KEY,
            name VARCHAR(100) NOT NULL UNIQUE
        )
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}

/// Create the calibration_data table
///
/// Dependent rows are removed by `components::delete_component`, so the
/// foreign key carries no ON DELETE action. Declared VARCHAR lengths are
/// advisory; SQLite stores longer values as-is.
pub async fn create_calibration_data_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS calibration_data (
            id INTEGER PRIMARY KEY,
            component_id INTEGER NOT NULL REFERENCES component(id),
            cal_number VARCHAR(3) NOT NULL,
            description TEXT,
            pri VARCHAR(5),
            sec VARCHAR(5),
            reso VARCHAR(5),
            dm VARCHAR(5),
            pri_completed BOOLEAN NOT NULL DEFAULT 0,
            sec_completed BOOLEAN NOT NULL DEFAULT 0,
            reso_completed BOOLEAN NOT NULL DEFAULT 0,
            dm_completed BOOLEAN NOT NULL DEFAULT 0
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        "CREATE INDEX IF NOT EXISTS idx_calibration_data_component ON calibration_data(component_id)",
    )
    .execute(pool)
    .await?;

    Ok(())
}
