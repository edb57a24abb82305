//! Temperature alert types and cooldown key derivation.

use std::fmt;

use serde::Serialize;

use crate::types::Timestamp;

/// Whether a delta alert was triggered by a rise or a fall.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Rising,
    Falling,
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Direction::Rising => write!(f, "rising"),
            Direction::Falling => write!(f, "falling"),
        }
    }
}

/// Canonical string identifying an alert condition for cooldown bookkeeping.
///
/// Cross-sensor keys order the pair lexicographically so the same two
/// sensors always map to the same key, whatever order the snapshot
/// enumerated them in.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct AlertKey(String);

impl AlertKey {
    /// Key for a per-sensor delta alert: `delta:<sensor>`.
    pub fn delta(sensor: &str) -> Self {
        Self(format!("delta:{sensor}"))
    }

    /// Key for a sensor-pair divergence alert: `cross:<min>:<max>`.
    pub fn cross(a: &str, b: &str) -> Self {
        let (lo, hi) = if a <= b { (a, b) } else { (b, a) };
        Self(format!("cross:{lo}:{hi}"))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for AlertKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A triggered alert condition, ready for cooldown gating and dispatch.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum TemperatureAlert {
    /// A sensor's value changed beyond the threshold between consecutive
    /// readings.
    Delta {
        sensor: String,
        previous: f64,
        current: f64,
        delta: f64,
        threshold: f64,
        direction: Direction,
        timestamp: Timestamp,
    },
    /// Two sensors' latest values diverged beyond the threshold.
    CrossSensor {
        sensor_a: String,
        temp_a: f64,
        sensor_b: String,
        temp_b: f64,
        delta: f64,
        threshold: f64,
        timestamp: Timestamp,
    },
}

impl TemperatureAlert {
    /// The cooldown key this alert is gated on.
    pub fn key(&self) -> AlertKey {
        match self {
            TemperatureAlert::Delta { sensor, .. } => AlertKey::delta(sensor),
            TemperatureAlert::CrossSensor {
                sensor_a, sensor_b, ..
            } => AlertKey::cross(sensor_a, sensor_b),
        }
    }

    /// Notification subject line (without the product tag prefix).
    pub fn subject(&self) -> String {
        match self {
            TemperatureAlert::Delta {
                sensor, direction, ..
            } => format!("Temperature {direction} on {sensor}"),
            TemperatureAlert::CrossSensor {
                sensor_a, sensor_b, ..
            } => format!("Large difference between {sensor_a} and {sensor_b}"),
        }
    }

    /// Plain-text notification body.
    pub fn body(&self) -> String {
        match self {
            TemperatureAlert::Delta {
                sensor,
                previous,
                current,
                delta,
                threshold,
                timestamp,
                ..
            } => format!(
                "Sensor: {sensor}\n\
                 Previous reading: {previous:.1} °C\n\
                 Current reading: {current:.1} °C\n\
                 Delta: {delta:.1} °C (threshold: {threshold:.1} °C)\n\
                 Time: {}",
                timestamp.format("%Y-%m-%d %H:%M:%S")
            ),
            TemperatureAlert::CrossSensor {
                sensor_a,
                temp_a,
                sensor_b,
                temp_b,
                delta,
                threshold,
                timestamp,
            } => format!(
                "{sensor_a}: {temp_a:.1} °C\n\
                 {sensor_b}: {temp_b:.1} °C\n\
                 Difference: {delta:.1} °C (threshold: {threshold:.1} °C)\n\
                 Time: {}",
                timestamp.format("%Y-%m-%d %H:%M:%S")
            ),
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
