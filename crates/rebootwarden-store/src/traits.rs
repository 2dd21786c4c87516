//! Store trait definitions

use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};

use crate::StoreResult;

/// Durable enforcement state carried between invocations.
///
/// Field names serialize as `LastNotificationTime`, `ScheduledRebootTime` and
/// `NotificationCount`. Absent or null timestamps mean "never set".
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct PersistedState {
    /// When the most recent notification was shown
    #[serde(default)]
    pub last_notification_time: Option<DateTime<Local>>,

    /// User-chosen reboot time
    #[serde(default)]
    pub scheduled_reboot_time: Option<DateTime<Local>>,

    /// Total notifications shown
    #[serde(default)]
    pub notification_count: u32,
}

impl PersistedState {
    /// Record a delivered notification.
    pub fn record_notification(&mut self, at: DateTime<Local>) {
        self.last_notification_time = Some(at);
        self.notification_count = self.notification_count.saturating_add(1);
    }

    /// Start a fresh enforcement cycle: forget the schedule and the cadence
    /// anchor, keep the running count.
    pub fn reset_cycle(&mut self) {
        self.last_notification_time = None;
        self.scheduled_reboot_time = None;
    }
}

/// Whole-record state persistence
pub trait StateStore: Send + Sync {
    /// Load the record. A record that was never written loads as the default.
    fn load(&self) -> StoreResult<PersistedState>;

    /// Replace the record
    fn save(&self, state: &PersistedState) -> StoreResult<()>;

    /// Remove the record entirely
    fn clear(&self) -> StoreResult<()>;

    /// Check if store is healthy
    fn is_healthy(&self) -> bool {
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn serializes_with_external_field_names() {
        let state = PersistedState {
            last_notification_time: None,
            scheduled_reboot_time: None,
            notification_count: 4,
        };
        let json = serde_json::to_value(&state).unwrap();
        assert_eq!(json["NotificationCount"], 4);
        assert!(json["LastNotificationTime"].is_null());
        assert!(json["ScheduledRebootTime"].is_null());
    }

    #[test]
    fn absent_fields_mean_never_set() {
        let state: PersistedState = serde_json::from_str("{}").unwrap();
        assert_eq!(state, PersistedState::default());
    }

    #[test]
    fn timestamps_keep_subsecond_precision() {
        let at = Local.timestamp_opt(1_750_000_000, 123_456_789).unwrap();
        let state = PersistedState {
            last_notification_time: Some(at),
            scheduled_reboot_time: Some(at + chrono::Duration::minutes(30)),
            notification_count: 1,
        };

        let json = serde_json::to_string(&state).unwrap();
        assert!(json.contains(".123456789"));
        let back: PersistedState = serde_json::from_str(&json).unwrap();
        assert_eq!(back, state);
    }

    #[test]
    fn record_notification_increments() {
        let at = Local.with_ymd_and_hms(2025, 6, 10, 14, 0, 0).unwrap();
        let mut state = PersistedState::default();
        state.record_notification(at);
        state.record_notification(at);
        assert_eq!(state.notification_count, 2);
        assert_eq!(state.last_notification_time, Some(at));

        state.scheduled_reboot_time = Some(at);
        state.reset_cycle();
        assert_eq!(state.notification_count, 2);
        assert!(state.last_notification_time.is_none());
        assert!(state.scheduled_reboot_time.is_none());
    }
}
