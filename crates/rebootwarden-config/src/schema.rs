//! Raw configuration schema (as parsed from TOML)

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Raw configuration as parsed from TOML
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct RawConfig {
    /// Config schema version
    pub config_version: u32,

    /// Uptime threshold, reboot window and grace periods
    #[serde(default)]
    pub enforcement: RawEnforcement,

    /// Host-level opt-out
    #[serde(default)]
    pub exemption: RawExemption,

    /// Where persisted state lives
    #[serde(default)]
    pub state: RawStateConfig,

    /// External commands used by the Linux collaborators
    #[serde(default)]
    pub commands: RawCommands,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct RawEnforcement {
    /// Uptime (whole days) at which enforcement starts (default: 7)
    pub uptime_threshold_days: Option<u32>,

    /// First hour of the reboot window; also the daily deadline (default: 22)
    pub reboot_window_start_hour: Option<u8>,

    /// Hour at which the reboot window closes, exclusive (default: 5)
    pub reboot_window_end_hour: Option<u8>,

    /// How long a passed user schedule may still fire before it counts as expired
    pub schedule_grace_minutes: Option<u64>,

    /// Countdown shown before the reboot command runs (default: 60)
    pub reboot_grace_seconds: Option<u64>,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct RawExemption {
    /// Group whose members are exempt (default: "RebootExemption")
    pub group_name: Option<String>,

    /// Skip the membership lookup entirely
    #[serde(default)]
    pub skip_check: bool,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct RawStateConfig {
    /// "json" or "sqlite" (default: "json")
    pub backend: Option<String>,

    /// State file location
    pub path: Option<PathBuf>,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct RawCommands {
    /// Desktop notification command (default: "notify-send")
    pub notify: Option<String>,

    /// Dialog command used to pick a reboot time (default: "zenity")
    pub picker: Option<String>,

    /// Reboot command and arguments (default: ["systemctl", "reboot"])
    pub reboot: Option<Vec<String>>,

    /// How long to wait for the user to act on a notification
    pub response_timeout_seconds: Option<u64>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_full_config() {
        let toml_str = r#"
            config_version = 1

            [enforcement]
            uptime_threshold_days = 14
            reboot_window_start_hour = 23
            reboot_window_end_hour = 4

            [exemption]
            group_name = "Kiosks"

            [state]
            backend = "sqlite"
            path = "/tmp/state.db"

            [commands]
            reboot = ["shutdown", "-r", "now"]
        "#;

        let config: RawConfig = toml::from_str(toml_str).unwrap();
        assert_eq!(config.enforcement.uptime_threshold_days, Some(14));
        assert_eq!(config.exemption.group_name.as_deref(), Some("Kiosks"));
        assert!(!config.exemption.skip_check);
        assert_eq!(config.state.backend.as_deref(), Some("sqlite"));
        assert_eq!(config.commands.reboot.as_ref().map(Vec::len), Some(3));
    }

    #[test]
    fn sections_are_optional() {
        let config: RawConfig = toml::from_str("config_version = 1").unwrap();
        assert!(config.enforcement.reboot_window_start_hour.is_none());
        assert!(config.commands.notify.is_none());
    }
}
