//! Desktop notifications via `notify-send`, reboot-time picking via `zenity`

use async_trait::async_trait;
use chrono::{DateTime, Local};
use rebootwarden_api::{
    Notification, NotificationResponse, ScheduleRejection, Urgency, UserAction,
};
use rebootwarden_host_api::{Clock, HostError, HostResult, Notifier};
use rebootwarden_util::{format_clock_time, WallClock};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

use crate::command::{run_checked, run_command};

const APP_NAME: &str = "rebootwarden";
const ACTION_SCHEDULE: &str = "schedule";
const ACTION_REBOOT: &str = "reboot";

/// How many unparsable entries the picker tolerates before giving up
const PICKER_ATTEMPTS: usize = 3;

/// zenity exits with 1 on cancel and 5 on its own timeout
const PICKER_CANCELLED: i32 = 1;
const PICKER_TIMED_OUT: i32 = 5;

/// Action key reported by `notify-send --wait`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotifyAction {
    Schedule,
    RebootNow,
}

/// Shows notifications on the user's desktop session
pub struct DesktopNotifier {
    notify_command: String,
    picker_command: String,
    response_timeout: Duration,
    clock: Arc<dyn Clock>,
}

impl DesktopNotifier {
    pub fn new(
        notify_command: impl Into<String>,
        picker_command: impl Into<String>,
        response_timeout: Duration,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            notify_command: notify_command.into(),
            picker_command: picker_command.into(),
            response_timeout,
            clock,
        }
    }

    /// Ask for a reboot time. `None` when the user cancels or gives up.
    async fn pick_time(
        &self,
        deadline: DateTime<Local>,
        timeout: Duration,
    ) -> HostResult<Option<DateTime<Local>>> {
        for attempt in 1..=PICKER_ATTEMPTS {
            let argv = picker_args(&self.picker_command, deadline, timeout);
            let output = match run_command(&argv, Some(timeout)).await {
                Ok(output) => output,
                Err(HostError::Timeout(_)) => return Ok(None),
                Err(e) => return Err(e),
            };

            match output.status.code() {
                Some(0) => {}
                Some(PICKER_CANCELLED) | Some(PICKER_TIMED_OUT) => return Ok(None),
                _ => {
                    return Err(HostError::command_failed(
                        self.picker_command.as_str(),
                        output.status.to_string(),
                    ));
                }
            }

            let entered = String::from_utf8_lossy(&output.stdout);
            match WallClock::parse(&entered) {
                Ok(clock) => return Ok(Some(clock.next_after(&self.clock.now()))),
                Err(e) => {
                    warn!(attempt, error = %e, "Unparsable reboot time entered");
                }
            }
        }

        Ok(None)
    }
}

#[async_trait]
impl Notifier for DesktopNotifier {
    async fn show(&self, notification: &Notification) -> HostResult<NotificationResponse> {
        let interactive = notification.kind.offers_reboot_now();
        let argv = notify_send_args(&self.notify_command, notification, interactive);

        if !interactive {
            run_checked(&argv, Some(self.response_timeout)).await?;
            return Ok(NotificationResponse::delivered());
        }

        let timeout = prompt_timeout(self.response_timeout, notification.minutes_remaining);
        let output = match run_checked(&argv, Some(timeout)).await {
            Ok(output) => output,
            Err(HostError::Timeout(limit)) => {
                debug!(timeout_secs = limit.as_secs(), "No response to notification");
                return Ok(NotificationResponse::delivered());
            }
            Err(e) => return Err(e),
        };

        let action = match parse_action(&String::from_utf8_lossy(&output.stdout)) {
            None => UserAction::Dismiss,
            Some(NotifyAction::RebootNow) => UserAction::RebootNow,
            Some(NotifyAction::Schedule) => match self.pick_time(notification.deadline, timeout).await? {
                Some(requested) => UserAction::Schedule { requested },
                None => UserAction::Dismiss,
            },
        };

        info!(kind = %notification.kind, action = ?action, "User responded to notification");
        Ok(NotificationResponse::with_action(action))
    }

    async fn schedule_rejected(
        &self,
        requested: DateTime<Local>,
        deadline: DateTime<Local>,
        reason: ScheduleRejection,
    ) -> HostResult<()> {
        let body = format!(
            "A restart at {} cannot be scheduled: {}. Pick a time before {} from the next reminder.",
            format_clock_time(&requested),
            reason,
            format_clock_time(&deadline)
        );
        let argv = vec![
            self.notify_command.clone(),
            format!("--app-name={}", APP_NAME),
            "--urgency=normal".to_string(),
            "Restart time not accepted".to_string(),
            body,
        ];
        run_checked(&argv, Some(self.response_timeout)).await?;
        Ok(())
    }
}

/// How long a prompt may block: the configured timeout, but never past the
/// minutes the notification announces.
pub fn prompt_timeout(response_timeout: Duration, minutes_remaining: u32) -> Duration {
    let announced = Duration::from_secs(u64::from(minutes_remaining.max(1)) * 60);
    response_timeout.min(announced)
}

/// Command line for showing `notification`. Interactive notifications block
/// until the user clicks an action or closes them.
pub fn notify_send_args(program: &str, notification: &Notification, interactive: bool) -> Vec<String> {
    let urgency = notification.kind.urgency();
    let mut argv = vec![
        program.to_string(),
        format!("--app-name={}", APP_NAME),
        format!("--urgency={}", urgency_level(urgency)),
    ];

    if urgency == Urgency::Critical {
        argv.push("--expire-time=0".to_string());
    }

    if interactive {
        argv.push("--wait".to_string());
        if notification.kind.offers_schedule() {
            argv.push(format!("--action={}=Pick a time", ACTION_SCHEDULE));
        }
        argv.push(format!("--action={}=Restart now", ACTION_REBOOT));
    }

    argv.push(notification.title());
    argv.push(notification.body());
    argv
}

fn urgency_level(urgency: Urgency) -> &'static str {
    match urgency {
        Urgency::Normal => "normal",
        Urgency::High | Urgency::Critical => "critical",
    }
}

/// Map the action key printed by `notify-send --wait`
pub fn parse_action(stdout: &str) -> Option<NotifyAction> {
    match stdout.trim() {
        ACTION_SCHEDULE => Some(NotifyAction::Schedule),
        ACTION_REBOOT => Some(NotifyAction::RebootNow),
        _ => None,
    }
}

fn picker_args(program: &str, deadline: DateTime<Local>, timeout: Duration) -> Vec<String> {
    vec![
        program.to_string(),
        "--entry".to_string(),
        "--title=Schedule restart".to_string(),
        format!(
            "--text=Restart time (HH:MM), no later than {}",
            format_clock_time(&deadline)
        ),
        format!("--timeout={}", timeout.as_secs().max(1)),
    ]
}
