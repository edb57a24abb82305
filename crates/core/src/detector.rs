//! Delta and cross-sensor deviation detection.
//!
//! Pure functions: the caller fetches readings from the store, passes
//! them in, and gates the returned candidates through the
//! [`CooldownTracker`](crate::cooldown::CooldownTracker) before dispatch.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};

use crate::alert::{Direction, TemperatureAlert};
use crate::policy::AlertPolicy;

/// Compare a new reading against the immediately preceding one.
///
/// Returns a candidate alert when `|current - previous|` meets the delta
/// threshold (inclusive). The first-ever reading for a sensor has no
/// previous value and never alerts.
pub fn delta_alert(
    sensor: &str,
    current: f64,
    previous: Option<f64>,
    policy: &AlertPolicy,
    now: DateTime<Utc>,
) -> Option<TemperatureAlert> {
    let previous = previous?;
    let delta = (current - previous).abs();
    if delta < policy.delta_threshold {
        return None;
    }
    let direction = if current > previous {
        Direction::Rising
    } else {
        Direction::Falling
    };
    Some(TemperatureAlert::Delta {
        sensor: sensor.to_string(),
        previous,
        current,
        delta,
        threshold: policy.delta_threshold,
        direction,
        timestamp: now,
    })
}

/// Compare the latest reading of every sensor pair.
///
/// `latest` is the per-sensor snapshot from the store; BTreeMap iteration
/// makes the pair enumeration (and therefore the alert order) stable.
/// Each unordered pair is considered exactly once; a candidate is emitted
/// when the absolute difference meets the cross-sensor threshold
/// (inclusive).
pub fn cross_sensor_alerts(
    latest: &BTreeMap<String, f64>,
    policy: &AlertPolicy,
    now: DateTime<Utc>,
) -> Vec<TemperatureAlert> {
    let sensors: Vec<(&String, &f64)> = latest.iter().collect();
    let mut alerts = Vec::new();

    for (i, (sensor_a, temp_a)) in sensors.iter().enumerate() {
        for (sensor_b, temp_b) in &sensors[i + 1..] {
            let delta = (*temp_a - *temp_b).abs();
            if delta < policy.cross_sensor_threshold {
                continue;
            }
            alerts.push(TemperatureAlert::CrossSensor {
                sensor_a: (*sensor_a).clone(),
                temp_a: **temp_a,
                sensor_b: (*sensor_b).clone(),
                temp_b: **temp_b,
                delta,
                threshold: policy.cross_sensor_threshold,
                timestamp: now,
            });
        }
    }

    alerts
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
