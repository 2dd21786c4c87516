//! Default paths for rebootwarden components
//!
//! The tool normally runs as root from a system timer, so the defaults are
//! system locations. The config file is `$REBOOTWARDEN_CONFIG` or
//! `/etc/rebootwarden/config.toml`. The state location comes from the config
//! file, `--state` or `$REBOOTWARDEN_STATE`, falling back to
//! `/var/lib/rebootwarden/state.json`.

use std::path::PathBuf;

/// Environment variable for overriding the config file path
pub const REBOOTWARDEN_CONFIG_ENV: &str = "REBOOTWARDEN_CONFIG";

/// Application subdirectory name
const APP_DIR: &str = "rebootwarden";

const CONFIG_FILENAME: &str = "config.toml";

const STATE_FILENAME: &str = "state.json";

/// Get the default config file path.
///
/// Order of precedence:
/// 1. `$REBOOTWARDEN_CONFIG` environment variable (if set)
/// 2. `/etc/rebootwarden/config.toml`
pub fn default_config_path() -> PathBuf {
    if let Ok(path) = std::env::var(REBOOTWARDEN_CONFIG_ENV) {
        return PathBuf::from(path);
    }

    config_path_without_env()
}

/// Get the config path without checking the environment override.
pub fn config_path_without_env() -> PathBuf {
    PathBuf::from("/etc").join(APP_DIR).join(CONFIG_FILENAME)
}

/// Default state file path, used when neither the config nor the command
/// line names one.
pub fn state_path_without_env() -> PathBuf {
    default_data_dir().join(STATE_FILENAME)
}

/// Directory holding persisted state.
pub fn default_data_dir() -> PathBuf {
    PathBuf::from("/var/lib").join(APP_DIR)
}
