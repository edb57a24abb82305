//! Reading entity model and insert DTO.

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use tempdog_core::types::{DbId, Timestamp};

/// One timestamped observation from a sensor. Immutable once recorded;
/// ordering is append-only by insertion id.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Reading {
    pub id: DbId,
    pub sensor: String,
    pub temperature: f64,
    pub humidity: Option<f64>,
    pub battery: Option<i64>,
    pub recorded_at: Timestamp,
}

/// DTO for appending a new reading. The repository stamps `recorded_at`.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateReading {
    pub sensor: String,
    pub temperature: f64,
    pub humidity: Option<f64>,
    pub battery: Option<i64>,
}
