//! Reading queries: current values and per-sensor history.

use axum::extract::{Path, State};
use axum::{routing::get, Json, Router};
use chrono::{Duration, Utc};

use tempdog_db::models::reading::Reading;
use tempdog_db::repositories::ReadingRepo;

use crate::error::{AppError, AppResult};
use crate::response::DataResponse;
use crate::state::AppState;

/// Default history depth: one reading per 30s over 24 hours.
const DEFAULT_HISTORY_LIMIT: i64 = 2880;

/// Upper bound on the history window, in hours (one year).
const MAX_HISTORY_HOURS: i64 = 24 * 366;

/// Working-hours window: readings from `07:00` up to (not including) `18:00`.
const WORKDAY_START_HOUR: u32 = 7;
const WORKDAY_END_HOUR: u32 = 18;

/// GET /api/current -- the latest reading for every sensor.
async fn current_readings(
    State(state): State<AppState>,
) -> AppResult<Json<DataResponse<Vec<Reading>>>> {
    let readings = ReadingRepo::latest_readings(&state.pool).await?;
    Ok(Json(DataResponse { data: readings }))
}

/// GET /api/history/{sensor} -- recent readings for one sensor, oldest first.
async fn sensor_history(
    State(state): State<AppState>,
    Path(sensor): Path<String>,
) -> AppResult<Json<DataResponse<Vec<Reading>>>> {
    let readings = ReadingRepo::history(&state.pool, &sensor, DEFAULT_HISTORY_LIMIT).await?;
    Ok(Json(DataResponse { data: readings }))
}

/// GET /api/history/{sensor}/{hours} -- readings within the last `hours` hours.
async fn sensor_history_hours(
    State(state): State<AppState>,
    Path((sensor, hours)): Path<(String, i64)>,
) -> AppResult<Json<DataResponse<Vec<Reading>>>> {
    if hours <= 0 || hours > MAX_HISTORY_HOURS {
        return Err(AppError::BadRequest(format!(
            "hours must be between 1 and {MAX_HISTORY_HOURS}"
        )));
    }

    let since = Utc::now() - Duration::hours(hours);
    let readings = ReadingRepo::history_since(&state.pool, &sensor, since).await?;
    Ok(Json(DataResponse { data: readings }))
}

/// GET /api/history/{sensor}/workday -- today's readings within working
/// hours (07:00–18:00), oldest first.
///
/// The window is taken on the server's UTC clock, matching the store's
/// timestamps.
async fn sensor_history_workday(
    State(state): State<AppState>,
    Path(sensor): Path<String>,
) -> AppResult<Json<DataResponse<Vec<Reading>>>> {
    let today = Utc::now().date_naive();
    let start = today
        .and_hms_opt(WORKDAY_START_HOUR, 0, 0)
        .expect("valid wall-clock time")
        .and_utc();
    let end = today
        .and_hms_opt(WORKDAY_END_HOUR, 0, 0)
        .expect("valid wall-clock time")
        .and_utc();

    let readings = ReadingRepo::history_between(&state.pool, &sensor, start, end).await?;
    Ok(Json(DataResponse { data: readings }))
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/current", get(current_readings))
        .route("/api/history/{sensor}", get(sensor_history))
        // The literal segment takes priority over the {hours} capture.
        .route("/api/history/{sensor}/workday", get(sensor_history_workday))
        .route("/api/history/{sensor}/{hours}", get(sensor_history_hours))
}
