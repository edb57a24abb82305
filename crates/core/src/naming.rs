//! Sensor name helpers.

use std::collections::BTreeMap;
use std::sync::OnceLock;

use regex::Regex;

use crate::error::CoreError;

fn ieee_regex() -> &'static Regex {
    static IEEE_RE: OnceLock<Regex> = OnceLock::new();
    IEEE_RE.get_or_init(|| {
        Regex::new(r"^0x[0-9a-fA-F]{10,16}$").expect("IEEE address regex is valid")
    })
}

/// Whether `name` looks like a raw IEEE device address
/// (e.g. `0xa4c13805dd26ffff`) rather than a friendly sensor name.
///
/// Auto-discovered sensors with raw addresses are hidden from the
/// sensor list.
pub fn is_ieee_address(name: &str) -> bool {
    ieee_regex().is_match(name)
}

/// Parse a `id=label,id=label` sensor list into an ordered map.
///
/// A bare `id` entry uses the id itself as label. Rejects entries with
/// an empty id and lists with no entries at all.
pub fn parse_sensor_labels(raw: &str) -> Result<BTreeMap<String, String>, CoreError> {
    let mut sensors = BTreeMap::new();
    for entry in raw.split(',').map(str::trim).filter(|s| !s.is_empty()) {
        match entry.split_once('=') {
            Some((id, label)) if !id.trim().is_empty() => {
                sensors.insert(id.trim().to_string(), label.trim().to_string());
            }
            Some(_) => {
                return Err(CoreError::Validation(format!(
                    "sensor entry {entry:?} has an empty sensor id"
                )));
            }
            None => {
                sensors.insert(entry.to_string(), entry.to_string());
            }
        }
    }
    if sensors.is_empty() {
        return Err(CoreError::Validation(
            "at least one sensor must be configured".into(),
        ));
    }
    Ok(sensors)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_labelled_and_bare_sensor_entries() {
        let sensors = parse_sensor_labels("kitchen=Kitchen, attic, office=Office ").unwrap();
        assert_eq!(sensors.len(), 3);
        assert_eq!(sensors.get("kitchen").map(String::as_str), Some("Kitchen"));
        assert_eq!(sensors.get("attic").map(String::as_str), Some("attic"));
    }

    #[test]
    fn rejects_empty_sensor_list() {
        assert!(parse_sensor_labels(" , ").is_err());
    }

    #[test]
    fn rejects_entry_with_empty_id() {
        assert!(parse_sensor_labels("=Kitchen").is_err());
    }

    #[test]
    fn matches_full_length_address() {
        assert!(is_ieee_address("0xa4c13805dd26ffff"));
    }

    #[test]
    fn matches_shorter_hex_address() {
        assert!(is_ieee_address("0xa4c13805dd"));
    }

    #[test]
    fn rejects_friendly_names() {
        assert!(!is_ieee_address("kitchen"));
        assert!(!is_ieee_address("0xZZ"));
        assert!(!is_ieee_address("0x123"));
    }
}
