//! Shared application state for api handlers.

use std::collections::BTreeMap;
use std::sync::Arc;

use tempdog_db::DbPool;

/// State handed to every handler via axum's `State` extractor.
#[derive(Clone)]
pub struct AppState {
    pub pool: DbPool,
    /// Configured sensor id → display label.
    pub sensor_labels: Arc<BTreeMap<String, String>>,
}
