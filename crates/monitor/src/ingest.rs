//! Per-message ingestion pipeline: parse → persist → detect → dispatch.
//!
//! Messages are processed strictly sequentially by a single consumer, so
//! no locking is needed within the pipeline. Semantic rejections
//! (unknown sensor, malformed payload, missing temperature) are silent
//! drops; only persistence failures propagate, and those are fatal to
//! the process.

use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use serde::Deserialize;

use tempdog_core::alert::TemperatureAlert;
use tempdog_core::{detector, AlertPolicy, CooldownTracker};
use tempdog_db::models::reading::CreateReading;
use tempdog_db::repositories::ReadingRepo;
use tempdog_db::DbPool;
use tempdog_notify::AlertSender;

/// A raw message delivered by the pub/sub transport.
#[derive(Debug, Clone)]
pub struct InboundMessage {
    /// Routing key, `<prefix>/<sensor_id>[/...]`.
    pub topic: String,
    /// Raw payload bytes.
    pub payload: Vec<u8>,
}

/// Telemetry payload published by a sensor. Unknown fields are ignored.
#[derive(Debug, Deserialize)]
struct TelemetryPayload {
    temperature: Option<f64>,
    humidity: Option<f64>,
    battery: Option<i64>,
}

#[derive(Debug, thiserror::Error)]
pub enum MonitorError {
    /// The store is the single source of truth; a failed write makes
    /// alerting decisions unreliable, so this halts the process.
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}

/// How a message was handled. Every variant except `Recorded` is a
/// silent drop — never surfaced to the transport.
#[derive(Debug, PartialEq, Eq)]
pub enum Outcome {
    /// Reading persisted; `alerts` alerts were dispatched.
    Recorded { alerts: usize },
    /// Topic had no sensor segment.
    UnknownTopic,
    /// Sensor is not in the configured set.
    UnknownSensor,
    /// Payload was not valid JSON.
    MalformedPayload,
    /// Payload lacked the required temperature field.
    MissingTemperature,
}

/// Sequential per-message processor owning the cooldown state.
pub struct Pipeline {
    pool: DbPool,
    sensors: BTreeSet<String>,
    policy: AlertPolicy,
    cooldowns: CooldownTracker,
    alerts: AlertSender,
}

impl Pipeline {
    pub fn new(
        pool: DbPool,
        sensors: impl IntoIterator<Item = String>,
        policy: AlertPolicy,
        alerts: AlertSender,
    ) -> Self {
        let cooldowns = CooldownTracker::new(policy.cooldown);
        Self {
            pool,
            sensors: sensors.into_iter().collect(),
            policy,
            cooldowns,
            alerts,
        }
    }

    /// Process one message to completion.
    ///
    /// `now` is the reception time; the caller (the ingest loop) passes
    /// `Utc::now()`.
    pub async fn handle_message(
        &mut self,
        msg: &InboundMessage,
        now: DateTime<Utc>,
    ) -> Result<Outcome, MonitorError> {
        // The bridge publishes on <prefix>/<friendly_name>.
        let Some(sensor) = msg.topic.split('/').nth(1).filter(|s| !s.is_empty()) else {
            return Ok(Outcome::UnknownTopic);
        };
        if !self.sensors.contains(sensor) {
            tracing::debug!(topic = %msg.topic, "Ignoring message for unconfigured sensor");
            return Ok(Outcome::UnknownSensor);
        }

        let payload: TelemetryPayload = match serde_json::from_slice(&msg.payload) {
            Ok(payload) => payload,
            Err(e) => {
                tracing::warn!(topic = %msg.topic, error = %e, "Invalid JSON payload");
                return Ok(Outcome::MalformedPayload);
            }
        };

        let Some(temperature) = payload.temperature else {
            return Ok(Outcome::MissingTemperature);
        };

        tracing::info!(
            sensor,
            temperature,
            humidity = ?payload.humidity,
            battery = ?payload.battery,
            "Reading received",
        );

        // Previous value must be read before the new reading lands.
        let previous = ReadingRepo::previous_temperature(&self.pool, sensor).await?;
        ReadingRepo::insert(
            &self.pool,
            &CreateReading {
                sensor: sensor.to_string(),
                temperature,
                humidity: payload.humidity,
                battery: payload.battery,
            },
        )
        .await?;

        let mut dispatched = 0;

        if let Some(alert) = detector::delta_alert(sensor, temperature, previous, &self.policy, now)
        {
            dispatched += self.gate_and_dispatch(alert, now);
        }

        let latest = ReadingRepo::latest_per_sensor(&self.pool).await?;
        for alert in detector::cross_sensor_alerts(&latest, &self.policy, now) {
            dispatched += self.gate_and_dispatch(alert, now);
        }

        Ok(Outcome::Recorded { alerts: dispatched })
    }

    /// Cooldown-gate a candidate; dispatch and record if allowed.
    ///
    /// The cooldown is recorded on the dispatch attempt, not on confirmed
    /// delivery — a degraded mail channel must not cause alert storms.
    /// A suppressed candidate leaves the window untouched.
    fn gate_and_dispatch(&mut self, alert: TemperatureAlert, now: DateTime<Utc>) -> usize {
        let key = alert.key();
        if !self.cooldowns.allowed(&key, now) {
            tracing::debug!(key = %key, "Alert suppressed by cooldown");
            return 0;
        }
        self.alerts.dispatch(alert);
        self.cooldowns.record(key, now);
        1
    }
}
