//! Per-key alert cooldown tracking.
//!
//! Enforces a minimum interval between two dispatches for the same
//! [`AlertKey`]. The map lives for the process lifetime and is owned by
//! the ingestion pipeline; entries are only ever overwritten, never
//! removed (bounded in practice by the fixed sensor set).

use std::collections::HashMap;

use chrono::{DateTime, Duration, Utc};

use crate::alert::AlertKey;

/// Tracks the last dispatch time per alert key.
///
/// `allowed` and `record` are deliberately separate: a candidate that is
/// suppressed by the cooldown must not reset the window, and the window
/// is reset on dispatch *attempt*, not on confirmed delivery.
#[derive(Debug)]
pub struct CooldownTracker {
    cooldown: Duration,
    last_dispatch: HashMap<AlertKey, DateTime<Utc>>,
}

impl CooldownTracker {
    /// Create an empty tracker enforcing the given minimum interval.
    pub fn new(cooldown: std::time::Duration) -> Self {
        Self {
            cooldown: Duration::from_std(cooldown).unwrap_or(Duration::MAX),
            last_dispatch: HashMap::new(),
        }
    }

    /// Whether an alert for `key` may be dispatched at `now`.
    ///
    /// True if the key has never been dispatched, or the elapsed time
    /// since the last dispatch is at least the configured cooldown.
    pub fn allowed(&self, key: &AlertKey, now: DateTime<Utc>) -> bool {
        match self.last_dispatch.get(key) {
            Some(last) => now.signed_duration_since(*last) >= self.cooldown,
            None => true,
        }
    }

    /// Mark `key` as dispatched at `now`.
    ///
    /// Call only when an alert is actually handed to the notifier.
    pub fn record(&mut self, key: AlertKey, now: DateTime<Utc>) {
        self.last_dispatch.insert(key, now);
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use std::time::Duration as StdDuration;

    use super::*;

    fn tracker() -> CooldownTracker {
        CooldownTracker::new(StdDuration::from_secs(300))
    }

    #[test]
    fn unknown_key_is_allowed() {
        let t = tracker();
        assert!(t.allowed(&AlertKey::delta("kitchen"), Utc::now()));
    }

    #[test]
    fn recorded_key_is_blocked_within_window() {
        let mut t = tracker();
        let now = Utc::now();
        t.record(AlertKey::delta("kitchen"), now);
        assert!(!t.allowed(&AlertKey::delta("kitchen"), now + Duration::seconds(60)));
    }

    #[test]
    fn key_is_allowed_exactly_at_window_expiry() {
        let mut t = tracker();
        let now = Utc::now();
        t.record(AlertKey::delta("kitchen"), now);
        assert!(t.allowed(&AlertKey::delta("kitchen"), now + Duration::seconds(300)));
    }

    #[test]
    fn suppressed_check_does_not_reset_window() {
        let mut t = tracker();
        let now = Utc::now();
        let key = AlertKey::delta("kitchen");
        t.record(key.clone(), now);

        // Qualifying candidates arrive during the window but are only
        // checked, never recorded.
        for secs in [60, 120, 240] {
            assert!(!t.allowed(&key, now + Duration::seconds(secs)));
        }

        // The first check at/after expiry must pass.
        assert!(t.allowed(&key, now + Duration::seconds(300)));
    }

    #[test]
    fn keys_are_tracked_independently() {
        let mut t = tracker();
        let now = Utc::now();
        t.record(AlertKey::delta("kitchen"), now);
        assert!(t.allowed(&AlertKey::delta("attic"), now));
        assert!(t.allowed(&AlertKey::cross("kitchen", "attic"), now));
    }
}
