//! Monitor configuration loaded from environment variables.

use std::collections::BTreeMap;
use std::time::Duration;

use tempdog_core::naming::parse_sensor_labels;
use tempdog_core::{AlertPolicy, CoreError};
use tempdog_notify::EmailConfig;

/// Default topic prefix published by the Zigbee bridge.
const DEFAULT_TOPIC_PREFIX: &str = "zigbee2mqtt";

/// Default cooldown between repeated alerts for the same key.
const DEFAULT_COOLDOWN_SECS: u64 = 300;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("{0} environment variable is required")]
    Missing(&'static str),

    #[error("{var} is invalid: {reason}")]
    Invalid { var: &'static str, reason: String },

    #[error(transparent)]
    Core(#[from] CoreError),
}

/// Static monitor configuration, loaded once at startup.
#[derive(Debug, Clone)]
pub struct MonitorConfig {
    /// WebSocket endpoint of the broker bridge, e.g. `ws://broker:8080/mqtt`.
    pub broker_ws_url: String,
    /// Topic prefix the sensors publish under (default `zigbee2mqtt`).
    pub topic_prefix: String,
    /// SQLite database URL, e.g. `sqlite:///var/lib/tempdog/readings.db`.
    pub database_url: String,
    /// Configured sensor id → display label.
    pub sensors: BTreeMap<String, String>,
    /// Validated alerting thresholds and cooldown.
    pub policy: AlertPolicy,
    /// SMTP settings; `None` when email delivery is not configured.
    pub email: Option<EmailConfig>,
}

impl MonitorConfig {
    /// Load and validate configuration from environment variables.
    ///
    /// | Variable                 | Required | Default       |
    /// |--------------------------|----------|---------------|
    /// | `BROKER_WS_URL`          | yes      | —             |
    /// | `TOPIC_PREFIX`           | no       | `zigbee2mqtt` |
    /// | `DATABASE_URL`           | yes      | —             |
    /// | `SENSORS`                | yes      | —             | (`id=label,id=label`)
    /// | `DELTA_THRESHOLD`        | no       | `2.0`         |
    /// | `CROSS_SENSOR_THRESHOLD` | no       | `5.0`         |
    /// | `COOLDOWN_SECS`          | no       | `300`         |
    /// | `SMTP_*`                 | no       | —             | (see [`EmailConfig::from_env`])
    pub fn from_env() -> Result<Self, ConfigError> {
        let broker_ws_url =
            std::env::var("BROKER_WS_URL").map_err(|_| ConfigError::Missing("BROKER_WS_URL"))?;

        let topic_prefix =
            std::env::var("TOPIC_PREFIX").unwrap_or_else(|_| DEFAULT_TOPIC_PREFIX.into());

        let database_url =
            std::env::var("DATABASE_URL").map_err(|_| ConfigError::Missing("DATABASE_URL"))?;

        let sensors = parse_sensor_labels(
            &std::env::var("SENSORS").map_err(|_| ConfigError::Missing("SENSORS"))?,
        )?;

        let policy = AlertPolicy {
            delta_threshold: parse_float("DELTA_THRESHOLD", 2.0)?,
            cross_sensor_threshold: parse_float("CROSS_SENSOR_THRESHOLD", 5.0)?,
            cooldown: Duration::from_secs(parse_u64("COOLDOWN_SECS", DEFAULT_COOLDOWN_SECS)?),
        };
        policy.validate()?;

        Ok(Self {
            broker_ws_url,
            topic_prefix,
            database_url,
            sensors,
            policy,
            email: EmailConfig::from_env(),
        })
    }
}

fn parse_float(var: &'static str, default: f64) -> Result<f64, ConfigError> {
    match std::env::var(var) {
        Ok(raw) => raw.parse().map_err(|_| ConfigError::Invalid {
            var,
            reason: format!("{raw:?} is not a number"),
        }),
        Err(_) => Ok(default),
    }
}

fn parse_u64(var: &'static str, default: u64) -> Result<u64, ConfigError> {
    match std::env::var(var) {
        Ok(raw) => raw.parse().map_err(|_| ConfigError::Invalid {
            var,
            reason: format!("{raw:?} is not a non-negative integer"),
        }),
        Err(_) => Ok(default),
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_float_falls_back_to_default() {
        std::env::remove_var("TEST_PARSE_FLOAT_UNSET");
        assert_eq!(parse_float("TEST_PARSE_FLOAT_UNSET", 2.0).unwrap(), 2.0);
    }

    #[test]
    fn parse_u64_rejects_garbage() {
        std::env::set_var("TEST_PARSE_U64_BAD", "soon");
        assert!(parse_u64("TEST_PARSE_U64_BAD", 300).is_err());
        std::env::remove_var("TEST_PARSE_U64_BAD");
    }
}
