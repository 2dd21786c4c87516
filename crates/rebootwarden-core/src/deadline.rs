//! Deadline computation and persisted-state correction

use chrono::{DateTime, Local};
use rebootwarden_api::ScheduleRejection;
use rebootwarden_store::PersistedState;
use rebootwarden_util::{local_datetime, RebootWindow, WallClock};
use std::time::Duration;

/// The forced-reboot deadline for the day `now` falls on.
///
/// Normally the window's start time today. In the early-morning part of a
/// window that wraps midnight, the window opened yesterday evening, so that
/// is the deadline.
pub fn compute_deadline(now: DateTime<Local>, window: &RebootWindow) -> DateTime<Local> {
    let clock = WallClock::from_naive_time(now.time());
    if window.wraps_midnight()
        && clock < window.end
        && let Some(yesterday) = now.date_naive().pred_opt()
    {
        return local_datetime(yesterday, window.start.to_naive_time());
    }

    window.start.on_day_of(&now)
}

/// A change made to loaded state before evaluation
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StateCorrection {
    /// The notification cycle belongs to a previous boot
    StaleCycle { last_notification: DateTime<Local> },
    /// The scheduled time passed more than the grace period ago
    ScheduleExpired { scheduled: DateTime<Local> },
    /// The scheduled time is later than the current deadline
    ScheduleAfterDeadline {
        scheduled: DateTime<Local>,
        deadline: DateTime<Local>,
    },
}

impl std::fmt::Display for StateCorrection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StateCorrection::StaleCycle { last_notification } => {
                write!(f, "last notification at {} predates boot", last_notification)
            }
            StateCorrection::ScheduleExpired { scheduled } => {
                write!(f, "scheduled reboot at {} expired", scheduled)
            }
            StateCorrection::ScheduleAfterDeadline {
                scheduled,
                deadline,
            } => write!(
                f,
                "scheduled reboot at {} is after deadline {}",
                scheduled, deadline
            ),
        }
    }
}

/// Bring loaded state in line with the current boot and deadline.
///
/// A schedule up to `schedule_grace` in the past is kept so that a run that
/// starts slightly late still fires it.
pub fn correct_state(
    state: &mut PersistedState,
    now: DateTime<Local>,
    boot_time: DateTime<Local>,
    deadline: DateTime<Local>,
    schedule_grace: Duration,
) -> Vec<StateCorrection> {
    let mut corrections = Vec::new();

    if let Some(last) = state.last_notification_time
        && last < boot_time
    {
        corrections.push(StateCorrection::StaleCycle {
            last_notification: last,
        });
        state.last_notification_time = None;
        // A schedule from the previous boot is either done or meaningless
        state.scheduled_reboot_time = None;
    }

    if let Some(scheduled) = state.scheduled_reboot_time {
        // A grace too large to represent never expires anything
        let expired = chrono::Duration::from_std(schedule_grace)
            .ok()
            .and_then(|grace| scheduled.checked_add_signed(grace))
            .is_some_and(|latest| latest < now);
        if expired {
            corrections.push(StateCorrection::ScheduleExpired { scheduled });
            state.scheduled_reboot_time = None;
        } else if scheduled > deadline {
            corrections.push(StateCorrection::ScheduleAfterDeadline {
                scheduled,
                deadline,
            });
            state.scheduled_reboot_time = None;
        }
    }

    corrections
}

/// Check a reboot time the user picked against the current deadline.
pub fn validate_schedule_request(
    requested: DateTime<Local>,
    now: DateTime<Local>,
    deadline: DateTime<Local>,
) -> Result<(), ScheduleRejection> {
    if requested <= now {
        Err(ScheduleRejection::NotInFuture)
    } else if requested > deadline {
        Err(ScheduleRejection::AfterDeadline)
    } else {
        Ok(())
    }
}
