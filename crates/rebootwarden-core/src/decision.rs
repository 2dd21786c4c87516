//! The decision engine
//!
//! `decide` is a pure function of its inputs: no I/O, no clock reads, no
//! hidden state. Calling it twice with the same arguments gives the same
//! answer, which is what makes rerunning the tool every few minutes safe.

use chrono::{DateTime, Local};
use rebootwarden_api::NotificationKind;
use rebootwarden_store::PersistedState;
use rebootwarden_util::{elapsed_since, minutes_until, RebootWindow};
use std::time::Duration;

/// Minutes before the deadline at which final warnings start
pub const FINAL_WARNING_WINDOW_MINUTES: f64 = 90.0;

/// Cadence while the deadline is more than 90 minutes away
pub const HOURLY_REMINDER_COOLDOWN: Duration = Duration::from_secs(60 * 60);

/// Cadence inside the final 90 minutes
pub const FINAL_WARNING_COOLDOWN: Duration = Duration::from_secs(15 * 60);

/// Minimum gap before the 10-minute countdown notice
pub const TEN_MINUTE_COUNTDOWN_COOLDOWN: Duration = Duration::from_secs(4 * 60);

/// Minimum gap before the 5-minute countdown notice
pub const FIVE_MINUTE_COUNTDOWN_COOLDOWN: Duration = Duration::from_secs(3 * 60);

/// Why a reboot is happening
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RebootReason {
    /// The user's chosen time arrived
    Scheduled,
    /// The deadline passed and the reboot window is open
    Deadline,
    /// The user asked for it from a notification
    UserRequested,
}

impl RebootReason {
    /// Forced reboots must land inside the reboot window; consented ones need not.
    pub fn requires_window(self) -> bool {
        matches!(self, RebootReason::Deadline)
    }
}

/// What one evaluation concluded
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    None,
    Notify {
        kind: NotificationKind,
        minutes_remaining: u32,
    },
    Reboot(RebootReason),
}

impl Decision {
    fn notify(kind: NotificationKind, minutes_remaining: u32) -> Self {
        Decision::Notify {
            kind,
            minutes_remaining,
        }
    }
}

/// Decide what to do right now.
///
/// The caller must already have dropped a schedule that is expired or later
/// than `deadline`; a schedule present here always takes precedence over the
/// deadline cadence.
pub fn decide(
    now: DateTime<Local>,
    uptime: Duration,
    uptime_threshold_days: u32,
    deadline: DateTime<Local>,
    reboot_window: &RebootWindow,
    state: &PersistedState,
) -> Decision {
    let threshold = Duration::from_secs(u64::from(uptime_threshold_days) * 86_400);
    if uptime < threshold {
        return Decision::None;
    }

    let cooled_down = |cooldown: Duration| match state.last_notification_time {
        None => true,
        Some(last) => elapsed_since(last, now) >= cooldown,
    };

    if let Some(scheduled) = state.scheduled_reboot_time {
        let m = minutes_until(now, scheduled);
        return if m <= 0.0 {
            Decision::Reboot(RebootReason::Scheduled)
        } else if m <= 1.0 {
            Decision::notify(NotificationKind::ScheduledCountdown, 1)
        } else if m <= 5.0 {
            if cooled_down(FIVE_MINUTE_COUNTDOWN_COOLDOWN) {
                Decision::notify(NotificationKind::ScheduledCountdown, 5)
            } else {
                Decision::None
            }
        } else if m <= 10.0 && cooled_down(TEN_MINUTE_COUNTDOWN_COOLDOWN) {
            Decision::notify(NotificationKind::ScheduledCountdown, 10)
        } else {
            Decision::None
        };
    }

    let d = minutes_until(now, deadline);
    if d <= 0.0 {
        // Past the deadline but outside the window: wait for it to open
        return if reboot_window.contains(&now) {
            Decision::Reboot(RebootReason::Deadline)
        } else {
            Decision::None
        };
    }

    let minutes_remaining = ceil_minutes(d);
    if d <= FINAL_WARNING_WINDOW_MINUTES {
        if cooled_down(FINAL_WARNING_COOLDOWN) {
            Decision::notify(NotificationKind::FinalWarning, minutes_remaining)
        } else {
            Decision::None
        }
    } else if state.last_notification_time.is_none() {
        Decision::notify(NotificationKind::InitialWarning, minutes_remaining)
    } else if cooled_down(HOURLY_REMINDER_COOLDOWN) {
        Decision::notify(NotificationKind::HourlyReminder, minutes_remaining)
    } else {
        Decision::None
    }
}

/// Round fractional minutes up to a whole count. `as` saturates at u32::MAX.
pub fn ceil_minutes(minutes: f64) -> u32 {
    if minutes <= 0.0 {
        0
    } else {
        minutes.ceil() as u32
    }
}
