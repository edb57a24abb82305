//! Validated alerting thresholds and cooldown duration.

use std::time::Duration;

use crate::error::CoreError;

/// Alerting parameters, loaded once at startup and immutable thereafter.
#[derive(Debug, Clone)]
pub struct AlertPolicy {
    /// Minimum absolute change between consecutive readings of one sensor
    /// that triggers a delta alert (inclusive).
    pub delta_threshold: f64,
    /// Minimum absolute difference between two sensors' latest readings
    /// that triggers a cross-sensor alert (inclusive).
    pub cross_sensor_threshold: f64,
    /// Minimum interval between two dispatches for the same alert key.
    pub cooldown: Duration,
}

impl AlertPolicy {
    /// Reject out-of-range values at load time rather than at use time.
    pub fn validate(&self) -> Result<(), CoreError> {
        validate_threshold(self.delta_threshold, "delta_threshold")?;
        validate_threshold(self.cross_sensor_threshold, "cross_sensor_threshold")?;
        if self.cooldown.is_zero() {
            return Err(CoreError::Validation(
                "cooldown must be greater than zero".into(),
            ));
        }
        Ok(())
    }
}

/// Validate that a threshold is a finite, positive number.
fn validate_threshold(value: f64, name: &str) -> Result<(), CoreError> {
    if !value.is_finite() || value <= 0.0 {
        return Err(CoreError::Validation(format!(
            "{name} must be a positive finite number, got {value}"
        )));
    }
    Ok(())
}
