//! Notification kinds and payloads

use chrono::{DateTime, Local};
use rebootwarden_util::format_clock_time;
use serde::{Deserialize, Serialize};

/// The closed set of notifications the engine can ask for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationKind {
    /// First notice once uptime crosses the threshold
    InitialWarning,
    /// Repeated notice while the deadline is far away
    HourlyReminder,
    /// Deadline is 90 minutes away or less
    FinalWarning,
    /// Countdown towards a user-chosen reboot time
    ScheduledCountdown,
    /// Reboot is about to execute; not dismissable
    ImmediateReboot,
}

impl NotificationKind {
    pub fn urgency(self) -> Urgency {
        match self {
            NotificationKind::InitialWarning | NotificationKind::HourlyReminder => Urgency::Normal,
            NotificationKind::FinalWarning | NotificationKind::ScheduledCountdown => Urgency::High,
            NotificationKind::ImmediateReboot => Urgency::Critical,
        }
    }

    /// Whether the user may pick a reboot time from this notification.
    pub fn offers_schedule(self) -> bool {
        matches!(
            self,
            NotificationKind::InitialWarning
                | NotificationKind::HourlyReminder
                | NotificationKind::FinalWarning
        )
    }

    /// Whether the user may reboot right away from this notification.
    pub fn offers_reboot_now(self) -> bool {
        !matches!(self, NotificationKind::ImmediateReboot)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            NotificationKind::InitialWarning => "initial_warning",
            NotificationKind::HourlyReminder => "hourly_reminder",
            NotificationKind::FinalWarning => "final_warning",
            NotificationKind::ScheduledCountdown => "scheduled_countdown",
            NotificationKind::ImmediateReboot => "immediate_reboot",
        }
    }
}

impl std::fmt::Display for NotificationKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Rendering urgency, mapped onto the desktop notification levels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Urgency {
    Normal,
    High,
    Critical,
}

/// Everything a notifier needs to render one notification.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Notification {
    pub kind: NotificationKind,
    /// Whole days since boot
    pub uptime_days: u64,
    pub deadline: DateTime<Local>,
    pub minutes_remaining: u32,
}

impl Notification {
    pub fn new(
        kind: NotificationKind,
        uptime_days: u64,
        deadline: DateTime<Local>,
        minutes_remaining: u32,
    ) -> Self {
        Self {
            kind,
            uptime_days,
            deadline,
            minutes_remaining,
        }
    }

    pub fn title(&self) -> String {
        match self.kind {
            NotificationKind::InitialWarning | NotificationKind::HourlyReminder => {
                "Restart required".to_string()
            }
            NotificationKind::FinalWarning => "Restart required soon".to_string(),
            NotificationKind::ScheduledCountdown => "Scheduled restart".to_string(),
            NotificationKind::ImmediateReboot => "Restarting now".to_string(),
        }
    }

    pub fn body(&self) -> String {
        let deadline = format_clock_time(&self.deadline);
        let remaining = describe_minutes(self.minutes_remaining);
        match self.kind {
            NotificationKind::InitialWarning => format!(
                "This computer has been running for {} days. It will restart automatically at {} ({}). Save your work and restart, or pick a time that suits you.",
                self.uptime_days, deadline, remaining
            ),
            NotificationKind::HourlyReminder => format!(
                "Reminder: this computer will restart automatically at {} ({}). Restart now or pick a time.",
                deadline, remaining
            ),
            NotificationKind::FinalWarning => format!(
                "This computer will restart at {}, {}. Save your work now.",
                deadline, remaining
            ),
            NotificationKind::ScheduledCountdown => format!(
                "Your scheduled restart happens {}. Save your work now.",
                remaining
            ),
            NotificationKind::ImmediateReboot => format!(
                "This computer restarts {}. Save your work immediately.",
                remaining
            ),
        }
    }
}

fn describe_minutes(minutes: u32) -> String {
    match minutes {
        0 => "now".to_string(),
        1 => "in 1 minute".to_string(),
        m if m < 120 => format!("in {} minutes", m),
        m => format!("in {}h {:02}m", m / 60, m % 60),
    }
}
