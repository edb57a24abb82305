//! Integration tests for the ingestion pipeline.
//!
//! Drives the full parse → persist → detect → dispatch path over an
//! in-memory SQLite store, observing dispatched alerts through the
//! notify queue's receiver.

use std::time::Duration;

use assert_matches::assert_matches;
use chrono::{DateTime, Utc};
use tokio::sync::mpsc;

use tempdog_core::alert::TemperatureAlert;
use tempdog_core::AlertPolicy;
use tempdog_db::repositories::ReadingRepo;
use tempdog_monitor::ingest::{InboundMessage, Outcome, Pipeline};
use tempdog_notify::channel;

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

async fn test_pipeline(
    sensors: &[&str],
) -> (
    Pipeline,
    mpsc::Receiver<TemperatureAlert>,
    tempdog_db::DbPool,
) {
    // A single connection that is never recycled: every pooled connection
    // to `sqlite::memory:` would otherwise get its own empty database.
    let pool = sqlx::sqlite::SqlitePoolOptions::new()
        .max_connections(1)
        .idle_timeout(None)
        .max_lifetime(None)
        .connect("sqlite::memory:")
        .await
        .expect("in-memory pool");
    tempdog_db::init_schema(&pool).await.expect("schema init");

    let (sender, rx) = channel(32);
    let policy = AlertPolicy {
        delta_threshold: 2.0,
        cross_sensor_threshold: 5.0,
        cooldown: Duration::from_secs(300),
    };
    let pipeline = Pipeline::new(
        pool.clone(),
        sensors.iter().map(|s| s.to_string()),
        policy,
        sender,
    );
    (pipeline, rx, pool)
}

fn message(sensor: &str, json: &str) -> InboundMessage {
    InboundMessage {
        topic: format!("zigbee2mqtt/{sensor}"),
        payload: json.as_bytes().to_vec(),
    }
}

fn temp_message(sensor: &str, temperature: f64) -> InboundMessage {
    message(sensor, &format!("{{\"temperature\": {temperature}}}"))
}

fn at(base: DateTime<Utc>, secs: i64) -> DateTime<Utc> {
    base + chrono::Duration::seconds(secs)
}

// ---------------------------------------------------------------------------
// Rejection paths
// ---------------------------------------------------------------------------

#[tokio::test]
async fn unknown_sensor_is_dropped_without_persisting() {
    let (mut pipeline, _rx, pool) = test_pipeline(&["kitchen"]).await;

    let outcome = pipeline
        .handle_message(&temp_message("garage", 21.0), Utc::now())
        .await
        .expect("no db error");
    assert_eq!(outcome, Outcome::UnknownSensor);

    let sensors = ReadingRepo::distinct_sensors(&pool).await.expect("query");
    assert!(sensors.is_empty());
}

#[tokio::test]
async fn topic_without_sensor_segment_is_dropped() {
    let (mut pipeline, _rx, _pool) = test_pipeline(&["kitchen"]).await;

    let msg = InboundMessage {
        topic: "zigbee2mqtt".into(),
        payload: b"{\"temperature\": 21.0}".to_vec(),
    };
    let outcome = pipeline.handle_message(&msg, Utc::now()).await.expect("ok");
    assert_eq!(outcome, Outcome::UnknownTopic);
}

#[tokio::test]
async fn malformed_payload_is_dropped_without_persisting() {
    let (mut pipeline, _rx, pool) = test_pipeline(&["kitchen"]).await;

    let outcome = pipeline
        .handle_message(&message("kitchen", "not json"), Utc::now())
        .await
        .expect("ok");
    assert_eq!(outcome, Outcome::MalformedPayload);

    let sensors = ReadingRepo::distinct_sensors(&pool).await.expect("query");
    assert!(sensors.is_empty());
}

#[tokio::test]
async fn missing_temperature_is_stored_nowhere_and_triggers_nothing() {
    let (mut pipeline, mut rx, pool) = test_pipeline(&["kitchen"]).await;

    let outcome = pipeline
        .handle_message(&message("kitchen", "{\"humidity\": 55.0}"), Utc::now())
        .await
        .expect("ok");
    assert_eq!(outcome, Outcome::MissingTemperature);

    let sensors = ReadingRepo::distinct_sensors(&pool).await.expect("query");
    assert!(sensors.is_empty());
    assert!(rx.try_recv().is_err());
}

// ---------------------------------------------------------------------------
// Persistence
// ---------------------------------------------------------------------------

#[tokio::test]
async fn valid_reading_is_persisted_with_optional_fields() {
    let (mut pipeline, _rx, pool) = test_pipeline(&["kitchen"]).await;

    let outcome = pipeline
        .handle_message(
            &message(
                "kitchen",
                "{\"temperature\": 21.5, \"humidity\": 48.0, \"battery\": 93, \"linkquality\": 120}",
            ),
            Utc::now(),
        )
        .await
        .expect("ok");
    assert_matches!(outcome, Outcome::Recorded { .. });

    let history = ReadingRepo::history(&pool, "kitchen", 10).await.expect("history");
    assert_eq!(history.len(), 1);
    assert_eq!(history[0].temperature, 21.5);
    assert_eq!(history[0].humidity, Some(48.0));
    assert_eq!(history[0].battery, Some(93));
}

// ---------------------------------------------------------------------------
// Delta alerting
// ---------------------------------------------------------------------------

#[tokio::test]
async fn first_reading_never_produces_a_delta_alert() {
    let (mut pipeline, mut rx, _pool) = test_pipeline(&["kitchen"]).await;

    let outcome = pipeline
        .handle_message(&temp_message("kitchen", 20.0), Utc::now())
        .await
        .expect("ok");
    assert_eq!(outcome, Outcome::Recorded { alerts: 0 });
    assert!(rx.try_recv().is_err());
}

#[tokio::test]
async fn delta_alert_uses_the_immediately_prior_reading() {
    let (mut pipeline, mut rx, _pool) = test_pipeline(&["kitchen"]).await;
    let base = Utc::now();

    pipeline
        .handle_message(&temp_message("kitchen", 20.0), base)
        .await
        .expect("ok");
    // 21.0 -> delta 1.0 from 20.0, below threshold.
    pipeline
        .handle_message(&temp_message("kitchen", 21.0), at(base, 10))
        .await
        .expect("ok");
    assert!(rx.try_recv().is_err());

    // 23.5 -> delta 2.5 from 21.0 (not 3.5 from 20.0).
    let outcome = pipeline
        .handle_message(&temp_message("kitchen", 23.5), at(base, 20))
        .await
        .expect("ok");
    assert_eq!(outcome, Outcome::Recorded { alerts: 1 });

    let alert = rx.try_recv().expect("alert dispatched");
    assert_matches!(alert, TemperatureAlert::Delta { previous, current, delta, .. } => {
        assert_eq!(previous, 21.0);
        assert_eq!(current, 23.5);
        assert_eq!(delta, 2.5);
    });
}

/// Worked example: thresholds delta=2.0, cooldown=300s. Readings 20.0,
/// then 23.0 (alert #1), 26.0 at +60s (suppressed), 29.0 at +400s
/// (alert #2).
#[tokio::test]
async fn cooldown_suppresses_and_then_releases_delta_alerts() {
    let (mut pipeline, mut rx, _pool) = test_pipeline(&["kitchen"]).await;
    let base = Utc::now();

    pipeline
        .handle_message(&temp_message("kitchen", 20.0), base)
        .await
        .expect("ok");

    let outcome = pipeline
        .handle_message(&temp_message("kitchen", 23.0), base)
        .await
        .expect("ok");
    assert_eq!(outcome, Outcome::Recorded { alerts: 1 });
    assert_matches!(rx.try_recv().expect("alert #1"), TemperatureAlert::Delta { .. });

    // Qualifying reading 60s later: suppressed, and must not reset the
    // window.
    let outcome = pipeline
        .handle_message(&temp_message("kitchen", 26.0), at(base, 60))
        .await
        .expect("ok");
    assert_eq!(outcome, Outcome::Recorded { alerts: 0 });
    assert!(rx.try_recv().is_err());

    // 400s after alert #1: the window (counted from the dispatch, not the
    // suppressed candidate) has expired.
    let outcome = pipeline
        .handle_message(&temp_message("kitchen", 29.0), at(base, 400))
        .await
        .expect("ok");
    assert_eq!(outcome, Outcome::Recorded { alerts: 1 });
    assert_matches!(rx.try_recv().expect("alert #2"), TemperatureAlert::Delta { previous, .. } => {
        assert_eq!(previous, 26.0);
    });
}

// ---------------------------------------------------------------------------
// Cross-sensor alerting
// ---------------------------------------------------------------------------

#[tokio::test]
async fn cross_sensor_alert_fires_for_exactly_the_diverging_pair() {
    let (mut pipeline, mut rx, _pool) = test_pipeline(&["a", "b", "c"]).await;
    let base = Utc::now();

    pipeline.handle_message(&temp_message("a", 20.0), base).await.expect("ok");
    pipeline.handle_message(&temp_message("b", 24.0), base).await.expect("ok");

    // Latest {a: 20.0, b: 24.0, c: 26.0}: only (a,c) diverges >= 5.0.
    let outcome = pipeline
        .handle_message(&temp_message("c", 26.0), base)
        .await
        .expect("ok");
    assert_eq!(outcome, Outcome::Recorded { alerts: 1 });

    let alert = rx.try_recv().expect("cross alert");
    assert_matches!(alert, TemperatureAlert::CrossSensor { ref sensor_a, ref sensor_b, delta, .. } => {
        assert_eq!(sensor_a, "a");
        assert_eq!(sensor_b, "c");
        assert_eq!(delta, 6.0);
    });
    assert!(rx.try_recv().is_err());
}

#[tokio::test]
async fn cross_sensor_pair_is_cooled_down_under_one_canonical_key() {
    let (mut pipeline, mut rx, _pool) = test_pipeline(&["a", "b"]).await;
    let base = Utc::now();

    pipeline.handle_message(&temp_message("a", 20.0), base).await.expect("ok");
    let outcome = pipeline
        .handle_message(&temp_message("b", 26.0), base)
        .await
        .expect("ok");
    assert_eq!(outcome, Outcome::Recorded { alerts: 1 });
    rx.try_recv().expect("first cross alert");

    // The pair still diverges on the next reading from either side; the
    // shared key keeps it suppressed.
    let outcome = pipeline
        .handle_message(&temp_message("a", 19.0), at(base, 30))
        .await
        .expect("ok");
    assert_eq!(outcome, Outcome::Recorded { alerts: 0 });
    assert!(rx.try_recv().is_err());
}
