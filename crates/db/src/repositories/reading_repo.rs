//! Repository for the `readings` table.

use std::collections::BTreeMap;

use chrono::Utc;

use tempdog_core::types::Timestamp;

use crate::models::reading::{CreateReading, Reading};
use crate::DbPool;

/// Column list for `readings` SELECT queries.
const COLUMNS: &str = "id, sensor, temperature, humidity, battery, recorded_at";

/// Provides query operations for sensor readings.
pub struct ReadingRepo;

impl ReadingRepo {
    /// Append a reading stamped with the current time.
    pub async fn insert(pool: &DbPool, reading: &CreateReading) -> Result<Reading, sqlx::Error> {
        let query = format!(
            "INSERT INTO readings (sensor, temperature, humidity, battery, recorded_at) \
             VALUES (?, ?, ?, ?, ?) \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Reading>(&query)
            .bind(&reading.sensor)
            .bind(reading.temperature)
            .bind(reading.humidity)
            .bind(reading.battery)
            .bind(Utc::now())
            .fetch_one(pool)
            .await
    }

    /// Temperature of the most recent reading for `sensor`, or `None` if
    /// the sensor has no readings yet.
    ///
    /// The pipeline calls this *before* inserting the new reading, so the
    /// value returned is the reading immediately prior to the current one.
    pub async fn previous_temperature(
        pool: &DbPool,
        sensor: &str,
    ) -> Result<Option<f64>, sqlx::Error> {
        sqlx::query_scalar::<_, f64>(
            "SELECT temperature FROM readings WHERE sensor = ? ORDER BY id DESC LIMIT 1",
        )
        .bind(sensor)
        .fetch_optional(pool)
        .await
    }

    /// Latest temperature per sensor, keyed by sensor name.
    ///
    /// Exactly one entry per sensor that has at least one reading, taken
    /// from its highest insertion id. The BTreeMap gives callers a
    /// deterministic enumeration order.
    pub async fn latest_per_sensor(pool: &DbPool) -> Result<BTreeMap<String, f64>, sqlx::Error> {
        let rows = sqlx::query_as::<_, (String, f64)>(
            "SELECT sensor, temperature FROM readings \
             WHERE id IN (SELECT MAX(id) FROM readings GROUP BY sensor)",
        )
        .fetch_all(pool)
        .await?;

        Ok(rows.into_iter().collect())
    }

    /// Latest full reading per sensor, ordered by sensor name.
    pub async fn latest_readings(pool: &DbPool) -> Result<Vec<Reading>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM readings \
             WHERE id IN (SELECT MAX(id) FROM readings GROUP BY sensor) \
             ORDER BY sensor"
        );
        sqlx::query_as::<_, Reading>(&query).fetch_all(pool).await
    }

    /// The most recent `limit` readings for `sensor`, oldest first.
    pub async fn history(
        pool: &DbPool,
        sensor: &str,
        limit: i64,
    ) -> Result<Vec<Reading>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM readings WHERE sensor = ? ORDER BY id DESC LIMIT ?"
        );
        let mut rows = sqlx::query_as::<_, Reading>(&query)
            .bind(sensor)
            .bind(limit)
            .fetch_all(pool)
            .await?;
        rows.reverse();
        Ok(rows)
    }

    /// Readings for `sensor` recorded at or after `since`, in insertion order.
    pub async fn history_since(
        pool: &DbPool,
        sensor: &str,
        since: Timestamp,
    ) -> Result<Vec<Reading>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM readings \
             WHERE sensor = ? AND recorded_at >= ? \
             ORDER BY id ASC"
        );
        sqlx::query_as::<_, Reading>(&query)
            .bind(sensor)
            .bind(since)
            .fetch_all(pool)
            .await
    }

    /// Readings for `sensor` recorded within `[start, end)`, in insertion
    /// order.
    pub async fn history_between(
        pool: &DbPool,
        sensor: &str,
        start: Timestamp,
        end: Timestamp,
    ) -> Result<Vec<Reading>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM readings \
             WHERE sensor = ? AND recorded_at >= ? AND recorded_at < ? \
             ORDER BY id ASC"
        );
        sqlx::query_as::<_, Reading>(&query)
            .bind(sensor)
            .bind(start)
            .bind(end)
            .fetch_all(pool)
            .await
    }

    /// Every sensor name that has at least one reading.
    pub async fn distinct_sensors(pool: &DbPool) -> Result<Vec<String>, sqlx::Error> {
        sqlx::query_scalar::<_, String>("SELECT DISTINCT sensor FROM readings ORDER BY sensor")
            .fetch_all(pool)
            .await
    }
}
