//! Collaborator traits

use async_trait::async_trait;
use chrono::{DateTime, Local};
use rebootwarden_api::{Notification, NotificationResponse, ScheduleRejection};
use std::time::Duration;
use thiserror::Error;

/// Errors from host collaborator operations
#[derive(Debug, Error)]
pub enum HostError {
    #[error("Service unavailable: {0}")]
    Unavailable(String),

    #[error("Command '{command}' failed: {message}")]
    CommandFailed { command: String, message: String },

    #[error("Timed out after {0:?}")]
    Timeout(Duration),

    #[error("Unexpected output: {0}")]
    Parse(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl HostError {
    pub fn command_failed(command: impl Into<String>, message: impl Into<String>) -> Self {
        Self::CommandFailed {
            command: command.into(),
            message: message.into(),
        }
    }
}

pub type HostResult<T> = Result<T, HostError>;

/// Source of wall-clock time
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Local>;
}

/// The real clock, honouring the debug-build mock time override
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Local> {
        rebootwarden_util::now()
    }
}

/// Time since the last boot
#[async_trait]
pub trait UptimeSource: Send + Sync {
    async fn uptime(&self) -> HostResult<Duration>;
}

/// Answers whether a host has opted out of enforcement
#[async_trait]
pub trait ExemptionOracle: Send + Sync {
    async fn is_exempt(&self, host: &str, group: &str) -> HostResult<bool>;
}

/// Renders notifications and captures what the user did with them
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn show(&self, notification: &Notification) -> HostResult<NotificationResponse>;

    /// Tell the user a picked reboot time was refused and they should pick again
    async fn schedule_rejected(
        &self,
        _requested: DateTime<Local>,
        _deadline: DateTime<Local>,
        _reason: ScheduleRejection,
    ) -> HostResult<()> {
        Ok(())
    }
}

/// Executes the actual reboot
#[async_trait]
pub trait Rebooter: Send + Sync {
    /// Reboot after `grace`. When `grace` is non-zero, `notice` is shown
    /// first and the countdown runs before the reboot command.
    async fn reboot(&self, grace: Duration, notice: &Notification) -> HostResult<()>;
}
