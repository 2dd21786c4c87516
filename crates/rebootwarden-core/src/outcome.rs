//! Results of an evaluation run

use chrono::{DateTime, Local};
use rebootwarden_api::NotificationKind;
use rebootwarden_store::PersistedState;
use rebootwarden_util::RebootWindow;
use std::time::Duration;

use crate::{Decision, RebootReason};

/// Process exit code for a run that completed normally
pub const EXIT_SUCCESS: u8 = 0;

/// Process exit code for a run that hit an error
pub const EXIT_FAILURE: u8 = 1;

/// Process exit code once a reboot has been handed to the system
pub const EXIT_REBOOT_INITIATED: u8 = 2;

/// What a single run ended up doing
#[derive(Debug, Clone, PartialEq)]
pub enum RunOutcome {
    /// Host is on the exemption list
    Exempt,

    /// Uptime has not reached the threshold
    BelowThreshold { uptime: Duration },

    /// Enforcement applies but nothing is due right now
    Idle,

    /// A notification reached the user
    Notified {
        kind: NotificationKind,
        minutes_remaining: u32,
        /// Set when the user picked a valid reboot time
        scheduled: Option<DateTime<Local>>,
    },

    /// The notification could not be shown; the next run retries
    NotificationFailed { kind: NotificationKind },

    /// Deadline reached but the window closed before the reboot could run
    RebootDeferred,

    /// Reboot command accepted
    RebootInitiated { reason: RebootReason },

    /// Reboot command failed
    RebootFailed { reason: RebootReason, error: String },
}

impl RunOutcome {
    pub fn exit_code(&self) -> u8 {
        match self {
            RunOutcome::RebootInitiated { .. } => EXIT_REBOOT_INITIATED,
            RunOutcome::RebootFailed { .. } => EXIT_FAILURE,
            _ => EXIT_SUCCESS,
        }
    }

    pub fn is_reboot(&self) -> bool {
        matches!(self, RunOutcome::RebootInitiated { .. })
    }
}

impl std::fmt::Display for RunOutcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RunOutcome::Exempt => f.write_str("exempt"),
            RunOutcome::BelowThreshold { .. } => f.write_str("below threshold"),
            RunOutcome::Idle => f.write_str("idle"),
            RunOutcome::Notified { kind, .. } => write!(f, "notified ({})", kind),
            RunOutcome::NotificationFailed { kind } => write!(f, "notification failed ({})", kind),
            RunOutcome::RebootDeferred => f.write_str("reboot deferred"),
            RunOutcome::RebootInitiated { reason } => write!(f, "reboot initiated ({:?})", reason),
            RunOutcome::RebootFailed { reason, .. } => write!(f, "reboot failed ({:?})", reason),
        }
    }
}

/// Read-only view of what a run would see and decide
#[derive(Debug, Clone)]
pub struct StatusReport {
    pub hostname: String,
    pub now: DateTime<Local>,
    /// `None` when the check is disabled or the lookup failed
    pub exempt: Option<bool>,
    /// `None` when uptime could not be read
    pub uptime: Option<Duration>,
    pub uptime_threshold: Duration,
    pub deadline: DateTime<Local>,
    pub reboot_window: RebootWindow,
    pub window_open: bool,
    /// State after boot and deadline corrections, not written back
    pub state: PersistedState,
    pub decision: Decision,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exit_codes() {
        assert_eq!(RunOutcome::Idle.exit_code(), EXIT_SUCCESS);
        assert_eq!(RunOutcome::Exempt.exit_code(), EXIT_SUCCESS);
        assert_eq!(RunOutcome::RebootDeferred.exit_code(), EXIT_SUCCESS);
        assert_eq!(
            RunOutcome::RebootInitiated {
                reason: RebootReason::Deadline
            }
            .exit_code(),
            EXIT_REBOOT_INITIATED
        );
        assert_eq!(
            RunOutcome::RebootFailed {
                reason: RebootReason::UserRequested,
                error: "boom".into()
            }
            .exit_code(),
            EXIT_FAILURE
        );
        assert_eq!(
            RunOutcome::NotificationFailed {
                kind: NotificationKind::FinalWarning
            }
            .exit_code(),
            EXIT_SUCCESS
        );
    }
}
