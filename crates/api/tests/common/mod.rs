use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

use axum::body::Body;
use axum::http::Request;
use axum::response::Response;
use axum::Router;
use http_body_util::BodyExt;
use tower::ServiceExt;
use tower_http::cors::CorsLayer;
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;

use tempdog_api::routes;
use tempdog_api::state::AppState;
use tempdog_db::models::reading::CreateReading;
use tempdog_db::repositories::ReadingRepo;
use tempdog_db::DbPool;

/// Fresh in-memory readings database with the schema applied.
///
/// A single connection that is never recycled: every pooled connection
/// to `sqlite::memory:` would otherwise get its own empty database.
pub async fn test_pool() -> DbPool {
    let pool = sqlx::sqlite::SqlitePoolOptions::new()
        .max_connections(1)
        .idle_timeout(None)
        .max_lifetime(None)
        .connect("sqlite::memory:")
        .await
        .expect("in-memory pool");
    tempdog_db::init_schema(&pool).await.expect("schema");
    pool
}

/// Build the application router with the same middleware stack as
/// `main.rs`, using the given pool and configured sensor labels.
pub fn build_test_app(pool: DbPool, sensor_labels: BTreeMap<String, String>) -> Router {
    let state = AppState {
        pool,
        sensor_labels: Arc::new(sensor_labels),
    };

    Router::new()
        .merge(routes::health::router())
        .merge(routes::api_routes())
        .layer(TimeoutLayer::new(Duration::from_secs(30)))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Insert a reading for `sensor` at the given temperature.
pub async fn seed_reading(pool: &DbPool, sensor: &str, temperature: f64) {
    ReadingRepo::insert(
        pool,
        &CreateReading {
            sensor: sensor.to_string(),
            temperature,
            humidity: None,
            battery: None,
        },
    )
    .await
    .expect("seed reading");
}

/// Insert a reading with an explicit `recorded_at`, bypassing the
/// repository's own timestamping.
pub async fn seed_reading_at(
    pool: &DbPool,
    sensor: &str,
    temperature: f64,
    recorded_at: chrono::DateTime<chrono::Utc>,
) {
    sqlx::query(
        "INSERT INTO readings (sensor, temperature, humidity, battery, recorded_at) \
         VALUES (?, ?, NULL, NULL, ?)",
    )
    .bind(sensor)
    .bind(temperature)
    .bind(recorded_at)
    .execute(pool)
    .await
    .expect("seed reading");
}

/// Send a GET request to the app and return the raw response.
pub async fn get(app: Router, uri: &str) -> Response {
    app.oneshot(
        Request::builder()
            .uri(uri)
            .body(Body::empty())
            .expect("request"),
    )
    .await
    .expect("response")
}

/// Collect a response body and parse it as JSON.
pub async fn body_json(response: Response) -> serde_json::Value {
    let bytes = response
        .into_body()
        .collect()
        .await
        .expect("body")
        .to_bytes();
    serde_json::from_slice(&bytes).expect("valid JSON body")
}
