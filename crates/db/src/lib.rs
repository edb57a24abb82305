//! SQLite persistence for Tempdog readings.
//!
//! The store is append-only: the monitor is the single writer and the
//! api reads concurrently through its own pool.

pub mod models;
pub mod repositories;

use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};

/// Connection pool over the readings database.
pub type DbPool = sqlx::SqlitePool;

/// Create a pool for `database_url` (e.g. `sqlite:///var/lib/tempdog/readings.db`),
/// creating the database file if it does not exist.
pub async fn create_pool(database_url: &str) -> Result<DbPool, sqlx::Error> {
    let options = database_url
        .parse::<SqliteConnectOptions>()?
        .create_if_missing(true);

    SqlitePoolOptions::new()
        .max_connections(5)
        .connect_with(options)
        .await
}

/// Idempotently create the readings table and its index.
pub async fn init_schema(pool: &DbPool) -> Result<(), sqlx::Error> {
    sqlx::query(
        "CREATE TABLE IF NOT EXISTS readings (
            id          INTEGER PRIMARY KEY AUTOINCREMENT,
            sensor      TEXT    NOT NULL,
            temperature REAL    NOT NULL,
            humidity    REAL,
            battery     INTEGER,
            recorded_at TEXT    NOT NULL
        )",
    )
    .execute(pool)
    .await?;

    sqlx::query(
        "CREATE INDEX IF NOT EXISTS idx_readings_sensor_recorded_at \
         ON readings(sensor, recorded_at)",
    )
    .execute(pool)
    .await?;

    tracing::debug!("Readings schema ready");
    Ok(())
}

/// Verify the database is reachable.
pub async fn health_check(pool: &DbPool) -> Result<(), sqlx::Error> {
    sqlx::query("SELECT 1").execute(pool).await?;
    Ok(())
}
