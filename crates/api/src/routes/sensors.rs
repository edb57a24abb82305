//! Sensor listing: configured sensors merged with store discoveries.

use std::collections::BTreeMap;

use axum::extract::State;
use axum::{routing::get, Json, Router};

use tempdog_core::naming::is_ieee_address;
use tempdog_db::repositories::ReadingRepo;

use crate::error::AppResult;
use crate::response::DataResponse;
use crate::state::AppState;

/// GET /api/sensors -- all known sensors as id → label.
///
/// Starts from the configured labels (preserving custom names) and adds
/// sensors auto-discovered from the store, using the id as label. Raw
/// IEEE device addresses are filtered out of the discovered set.
async fn list_sensors(
    State(state): State<AppState>,
) -> AppResult<Json<DataResponse<BTreeMap<String, String>>>> {
    let mut sensors: BTreeMap<String, String> = (*state.sensor_labels).clone();

    for name in ReadingRepo::distinct_sensors(&state.pool).await? {
        if !sensors.contains_key(&name) && !is_ieee_address(&name) {
            sensors.insert(name.clone(), name);
        }
    }

    Ok(Json(DataResponse { data: sensors }))
}

pub fn router() -> Router<AppState> {
    Router::new().route("/api/sensors", get(list_sensors))
}
