//! Route modules and the api router assembly.

pub mod health;
pub mod readings;
pub mod sensors;

use axum::Router;

use crate::state::AppState;

/// All routes under `/api`.
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .merge(sensors::router())
        .merge(readings::router())
}
