//! User responses captured from a notification

use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};

/// What the user did with a notification.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum UserAction {
    /// User picked a reboot time
    Schedule { requested: DateTime<Local> },
    RebootNow,
    Dismiss,
}

/// Result of showing a notification.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotificationResponse {
    /// Whether the notification actually reached the user
    pub delivered: bool,
    pub user_action: Option<UserAction>,
}

impl NotificationResponse {
    /// Shown, no interaction (timed out or closed by the daemon).
    pub fn delivered() -> Self {
        Self {
            delivered: true,
            user_action: None,
        }
    }

    pub fn with_action(action: UserAction) -> Self {
        Self {
            delivered: true,
            user_action: Some(action),
        }
    }

    pub fn not_delivered() -> Self {
        Self {
            delivered: false,
            user_action: None,
        }
    }
}

/// Why a user-picked reboot time was refused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScheduleRejection {
    NotInFuture,
    AfterDeadline,
}

impl std::fmt::Display for ScheduleRejection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ScheduleRejection::NotInFuture => f.write_str("the chosen time has already passed"),
            ScheduleRejection::AfterDeadline => f.write_str("the chosen time is after the deadline"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn user_action_is_tagged() {
        let requested = Local.with_ymd_and_hms(2025, 6, 10, 20, 0, 0).unwrap();
        let json = serde_json::to_value(UserAction::Schedule { requested }).unwrap();
        assert_eq!(json["action"], "schedule");

        let json = serde_json::to_value(UserAction::RebootNow).unwrap();
        assert_eq!(json["action"], "reboot_now");
    }

    #[test]
    fn response_constructors() {
        assert!(NotificationResponse::delivered().delivered);
        assert!(!NotificationResponse::not_delivered().delivered);
        let r = NotificationResponse::with_action(UserAction::Dismiss);
        assert_eq!(r.user_action, Some(UserAction::Dismiss));
    }
}
