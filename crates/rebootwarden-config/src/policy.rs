//! Validated policy structures

use crate::schema::{RawCommands, RawConfig, RawEnforcement, RawExemption, RawStateConfig};
use crate::validation::parse_backend;
use rebootwarden_util::{default_data_dir, state_path_without_env, RebootWindow};
use std::path::PathBuf;
use std::time::Duration;

pub const DEFAULT_UPTIME_THRESHOLD_DAYS: u32 = 7;
pub const DEFAULT_WINDOW_START_HOUR: u8 = 22;
pub const DEFAULT_WINDOW_END_HOUR: u8 = 5;
pub const DEFAULT_SCHEDULE_GRACE_MINUTES: u64 = 5;
pub const DEFAULT_REBOOT_GRACE_SECONDS: u64 = 60;
pub const DEFAULT_EXEMPTION_GROUP: &str = "RebootExemption";
pub const DEFAULT_RESPONSE_TIMEOUT_SECONDS: u64 = 120;

/// Validated policy ready for use by the orchestrator
#[derive(Debug, Clone, Default)]
pub struct Policy {
    pub enforcement: EnforcementPolicy,
    pub exemption: ExemptionPolicy,
    pub state: StateConfig,
    pub commands: CommandsConfig,
}

impl Policy {
    /// Convert from raw config (after validation)
    pub fn from_raw(raw: RawConfig) -> Self {
        Self {
            enforcement: EnforcementPolicy::from_raw(raw.enforcement),
            exemption: ExemptionPolicy::from_raw(raw.exemption),
            state: StateConfig::from_raw(raw.state),
            commands: CommandsConfig::from_raw(raw.commands),
        }
    }
}

/// When enforcement applies and when reboots may run
#[derive(Debug, Clone)]
pub struct EnforcementPolicy {
    pub uptime_threshold_days: u32,
    /// Forced reboots only run inside this window; its start is the daily deadline
    pub reboot_window: RebootWindow,
    /// A passed user schedule older than this is expired instead of fired
    pub schedule_grace: Duration,
    pub reboot_grace: Duration,
}

impl EnforcementPolicy {
    fn from_raw(raw: RawEnforcement) -> Self {
        let start = raw
            .reboot_window_start_hour
            .unwrap_or(DEFAULT_WINDOW_START_HOUR);
        let end = raw.reboot_window_end_hour.unwrap_or(DEFAULT_WINDOW_END_HOUR);

        Self {
            uptime_threshold_days: raw
                .uptime_threshold_days
                .unwrap_or(DEFAULT_UPTIME_THRESHOLD_DAYS),
            reboot_window: RebootWindow::from_hours(start, end).unwrap_or_default(),
            schedule_grace: Duration::from_secs(
                raw.schedule_grace_minutes
                    .unwrap_or(DEFAULT_SCHEDULE_GRACE_MINUTES)
                    .saturating_mul(60),
            ),
            reboot_grace: Duration::from_secs(
                raw.reboot_grace_seconds
                    .unwrap_or(DEFAULT_REBOOT_GRACE_SECONDS),
            ),
        }
    }

    pub fn uptime_threshold(&self) -> Duration {
        Duration::from_secs(self.uptime_threshold_days as u64 * 86_400)
    }
}

impl Default for EnforcementPolicy {
    fn default() -> Self {
        Self::from_raw(RawEnforcement::default())
    }
}

/// Host-level opt-out configuration
#[derive(Debug, Clone)]
pub struct ExemptionPolicy {
    pub group_name: String,
    pub skip_check: bool,
}

impl ExemptionPolicy {
    fn from_raw(raw: RawExemption) -> Self {
        Self {
            group_name: raw
                .group_name
                .unwrap_or_else(|| DEFAULT_EXEMPTION_GROUP.to_string()),
            skip_check: raw.skip_check,
        }
    }
}

impl Default for ExemptionPolicy {
    fn default() -> Self {
        Self::from_raw(RawExemption::default())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StateBackend {
    #[default]
    Json,
    Sqlite,
}

#[derive(Debug, Clone)]
pub struct StateConfig {
    pub backend: StateBackend,
    pub path: PathBuf,
}

impl StateConfig {
    fn from_raw(raw: RawStateConfig) -> Self {
        let backend = raw
            .backend
            .as_deref()
            .and_then(parse_backend)
            .unwrap_or_default();

        let path = raw.path.unwrap_or_else(|| match backend {
            StateBackend::Json => state_path_without_env(),
            StateBackend::Sqlite => default_data_dir().join("state.db"),
        });

        Self { backend, path }
    }
}

impl Default for StateConfig {
    fn default() -> Self {
        Self::from_raw(RawStateConfig::default())
    }
}

/// External commands driven by the Linux collaborators
#[derive(Debug, Clone)]
pub struct CommandsConfig {
    pub notify: String,
    pub picker: String,
    pub reboot: Vec<String>,
    pub response_timeout: Duration,
}

impl CommandsConfig {
    fn from_raw(raw: RawCommands) -> Self {
        Self {
            notify: raw.notify.unwrap_or_else(|| "notify-send".into()),
            picker: raw.picker.unwrap_or_else(|| "zenity".into()),
            reboot: raw
                .reboot
                .unwrap_or_else(|| vec!["systemctl".into(), "reboot".into()]),
            response_timeout: Duration::from_secs(
                raw.response_timeout_seconds
                    .unwrap_or(DEFAULT_RESPONSE_TIMEOUT_SECONDS),
            ),
        }
    }
}

impl Default for CommandsConfig {
    fn default() -> Self {
        Self::from_raw(RawCommands::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rebootwarden_util::WallClock;

    #[test]
    fn default_policy_matches_documented_defaults() {
        let policy = Policy::default();
        assert_eq!(policy.enforcement.uptime_threshold_days, 7);
        assert_eq!(policy.enforcement.reboot_window.start, WallClock::new(22, 0).unwrap());
        assert_eq!(policy.enforcement.reboot_window.end, WallClock::new(5, 0).unwrap());
        assert_eq!(policy.enforcement.reboot_grace, Duration::from_secs(60));
        assert_eq!(policy.enforcement.schedule_grace, Duration::from_secs(300));
        assert_eq!(policy.exemption.group_name, "RebootExemption");
        assert!(!policy.exemption.skip_check);
        assert_eq!(policy.state.backend, StateBackend::Json);
        assert_eq!(policy.commands.reboot, vec!["systemctl", "reboot"]);
        assert!(policy.commands.response_timeout < policy.enforcement.schedule_grace);
    }

    #[test]
    fn threshold_converts_to_duration() {
        let policy = EnforcementPolicy::default();
        assert_eq!(policy.uptime_threshold(), Duration::from_secs(7 * 86_400));
    }

    #[test]
    fn sqlite_backend_gets_db_path() {
        let state = StateConfig::from_raw(RawStateConfig {
            backend: Some("sqlite".into()),
            path: None,
        });
        assert_eq!(state.backend, StateBackend::Sqlite);
        assert!(state.path.to_string_lossy().ends_with("state.db"));
    }
}
