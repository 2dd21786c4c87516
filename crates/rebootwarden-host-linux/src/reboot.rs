//! Reboot execution

use async_trait::async_trait;
use rebootwarden_api::Notification;
use rebootwarden_host_api::{HostError, HostResult, Rebooter};
use std::time::Duration;
use tracing::{info, warn};

use crate::command::run_checked;
use crate::notify::notify_send_args;

/// Upper bound for the reboot command itself to return
const REBOOT_COMMAND_TIMEOUT: Duration = Duration::from_secs(30);

/// Runs the configured reboot command after a visible grace countdown
pub struct CommandRebooter {
    argv: Vec<String>,
    notify_command: String,
}

impl CommandRebooter {
    pub fn new(argv: Vec<String>, notify_command: impl Into<String>) -> Self {
        Self {
            argv,
            notify_command: notify_command.into(),
        }
    }
}

#[async_trait]
impl Rebooter for CommandRebooter {
    async fn reboot(&self, grace: Duration, notice: &Notification) -> HostResult<()> {
        if self.argv.is_empty() {
            return Err(HostError::Internal("No reboot command configured".into()));
        }

        if !grace.is_zero() {
            let argv = notify_send_args(&self.notify_command, notice, false);
            // The reboot goes ahead even if nobody could be told
            if let Err(e) = run_checked(&argv, Some(REBOOT_COMMAND_TIMEOUT)).await {
                warn!(error = %e, "Failed to show the final reboot notice");
            }

            info!(grace_secs = grace.as_secs(), "Waiting out reboot grace period");
            tokio::time::sleep(grace).await;
        }

        info!(command = ?self.argv, "Executing reboot command");
        run_checked(&self.argv, Some(REBOOT_COMMAND_TIMEOUT)).await?;
        Ok(())
    }
}

/// Logs the reboot it would perform and does nothing else
#[derive(Debug, Clone, Copy, Default)]
pub struct DryRunRebooter;

#[async_trait]
impl Rebooter for DryRunRebooter {
    async fn reboot(&self, grace: Duration, notice: &Notification) -> HostResult<()> {
        info!(
            grace_secs = grace.as_secs(),
            notice = %notice.body(),
            "Dry run: reboot suppressed"
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::command::argv;
    use chrono::Local;
    use rebootwarden_api::NotificationKind;

    fn notice() -> Notification {
        Notification::new(NotificationKind::ImmediateReboot, 8, Local::now(), 0)
    }

    #[tokio::test]
    async fn runs_reboot_command() {
        let rebooter = CommandRebooter::new(argv(["true"]), "true");
        rebooter.reboot(Duration::ZERO, &notice()).await.unwrap();
    }

    #[tokio::test]
    async fn failing_reboot_command_is_an_error() {
        let rebooter = CommandRebooter::new(argv(["false"]), "true");
        let err = rebooter.reboot(Duration::ZERO, &notice()).await.unwrap_err();
        assert!(matches!(err, HostError::CommandFailed { .. }));
    }

    #[tokio::test]
    async fn notice_failure_does_not_block_reboot() {
        let rebooter = CommandRebooter::new(argv(["true"]), "/nonexistent/notify-send");
        rebooter
            .reboot(Duration::from_millis(10), &notice())
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn empty_command_is_rejected() {
        let rebooter = CommandRebooter::new(Vec::new(), "true");
        assert!(rebooter.reboot(Duration::ZERO, &notice()).await.is_err());
    }

    #[tokio::test]
    async fn dry_run_never_fails() {
        DryRunRebooter
            .reboot(Duration::from_secs(60), &notice())
            .await
            .unwrap();
    }
}
