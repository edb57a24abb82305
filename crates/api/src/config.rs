//! Api server configuration loaded from environment variables.

use std::collections::BTreeMap;

use tempdog_core::naming::parse_sensor_labels;

/// Server configuration for the read-only api.
#[derive(Debug, Clone)]
pub struct ApiConfig {
    /// Bind address (default: `0.0.0.0`).
    pub host: String,
    /// Bind port (default: `8080`).
    pub port: u16,
    /// HTTP request timeout in seconds (default: `30`).
    pub request_timeout_secs: u64,
    /// Configured sensor id → display label. May be empty; sensors are
    /// also auto-discovered from the store.
    pub sensor_labels: BTreeMap<String, String>,
}

impl ApiConfig {
    /// Load configuration from environment variables with defaults.
    ///
    /// | Env Var                | Default   |
    /// |------------------------|-----------|
    /// | `HOST`                 | `0.0.0.0` |
    /// | `PORT`                 | `8080`    |
    /// | `REQUEST_TIMEOUT_SECS` | `30`      |
    /// | `SENSORS`              | (empty)   |
    pub fn from_env() -> Self {
        let host = std::env::var("HOST").unwrap_or_else(|_| "0.0.0.0".into());

        let port: u16 = std::env::var("PORT")
            .unwrap_or_else(|_| "8080".into())
            .parse()
            .expect("PORT must be a valid u16");

        let request_timeout_secs: u64 = std::env::var("REQUEST_TIMEOUT_SECS")
            .unwrap_or_else(|_| "30".into())
            .parse()
            .expect("REQUEST_TIMEOUT_SECS must be a valid u64");

        // Unset is fine (sensors are auto-discovered from the store); a
        // value that does not parse aborts startup.
        let sensor_labels = match std::env::var("SENSORS") {
            Ok(raw) => {
                parse_sensor_labels(&raw).expect("SENSORS must be a non-empty id=label list")
            }
            Err(_) => BTreeMap::new(),
        };

        Self {
            host,
            port,
            request_timeout_secs,
            sensor_labels,
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    // One test so the SENSORS mutations cannot race each other.
    #[test]
    fn sensors_unset_is_empty_but_invalid_aborts() {
        std::env::remove_var("SENSORS");
        assert!(ApiConfig::from_env().sensor_labels.is_empty());

        std::env::set_var("SENSORS", "kitchen=Kitchen,attic");
        let config = ApiConfig::from_env();
        assert_eq!(
            config.sensor_labels.get("kitchen").map(String::as_str),
            Some("Kitchen")
        );
        assert_eq!(
            config.sensor_labels.get("attic").map(String::as_str),
            Some("attic")
        );

        std::env::set_var("SENSORS", "=Kitchen");
        let result = std::panic::catch_unwind(ApiConfig::from_env);
        assert!(result.is_err(), "invalid SENSORS must abort startup");
        std::env::remove_var("SENSORS");
    }
}
