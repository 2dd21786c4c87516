//! Configuration parsing and validation for rebootwarden
//!
//! Supports TOML configuration with:
//! - Versioned schema
//! - Uptime threshold, reboot window and grace periods
//! - Exemption group and state backend selection
//! - Validation with clear error messages
//!
//! Every key is optional; an absent file yields the default policy.

mod policy;
mod schema;
mod validation;

pub use policy::*;
pub use schema::*;
pub use validation::*;

use std::path::Path;
use thiserror::Error;
use tracing::info;

/// Configuration errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    ReadError(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    ParseError(#[from] toml::de::Error),

    #[error("Validation failed: {errors:?}")]
    ValidationFailed { errors: Vec<ValidationError> },

    #[error("Unsupported config version: {0}")]
    UnsupportedVersion(u32),
}

pub type ConfigResult<T> = Result<T, ConfigError>;

/// Load and validate configuration from a TOML file
pub fn load_config(path: impl AsRef<Path>) -> ConfigResult<Policy> {
    let content = std::fs::read_to_string(path)?;
    parse_config(&content)
}

/// Load configuration, falling back to the default policy when the file does not exist.
///
/// Any other failure (unreadable, unparsable, invalid) is still an error.
pub fn load_config_or_default(path: impl AsRef<Path>) -> ConfigResult<Policy> {
    let path = path.as_ref();
    match std::fs::read_to_string(path) {
        Ok(content) => parse_config(&content),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            info!(path = %path.display(), "No config file, using defaults");
            Ok(Policy::default())
        }
        Err(e) => Err(ConfigError::ReadError(e)),
    }
}

/// Parse and validate configuration from a TOML string
pub fn parse_config(content: &str) -> ConfigResult<Policy> {
    let raw: RawConfig = toml::from_str(content)?;

    if raw.config_version != CURRENT_CONFIG_VERSION {
        return Err(ConfigError::UnsupportedVersion(raw.config_version));
    }

    let errors = validate_config(&raw);
    if !errors.is_empty() {
        return Err(ConfigError::ValidationFailed { errors });
    }

    Ok(Policy::from_raw(raw))
}

/// Current supported config version
pub const CURRENT_CONFIG_VERSION: u32 = 1;

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn parse_minimal_config() {
        let policy = parse_config("config_version = 1").unwrap();
        assert_eq!(policy.enforcement.uptime_threshold_days, 7);
        assert_eq!(policy.exemption.group_name, "RebootExemption");
    }

    #[test]
    fn parse_overrides() {
        let config = r#"
            config_version = 1

            [enforcement]
            uptime_threshold_days = 3
            reboot_window_start_hour = 1
            reboot_window_end_hour = 4
            reboot_grace_seconds = 0

            [exemption]
            skip_check = true
        "#;

        let policy = parse_config(config).unwrap();
        assert_eq!(policy.enforcement.uptime_threshold_days, 3);
        assert!(!policy.enforcement.reboot_window.wraps_midnight());
        assert_eq!(policy.enforcement.reboot_grace, Duration::ZERO);
        assert!(policy.exemption.skip_check);
    }

    #[test]
    fn reject_wrong_version() {
        let result = parse_config("config_version = 99");
        assert!(matches!(result, Err(ConfigError::UnsupportedVersion(99))));
    }

    #[test]
    fn reject_invalid_values() {
        let config = r#"
            config_version = 1

            [enforcement]
            reboot_window_start_hour = 25
        "#;

        let result = parse_config(config);
        assert!(matches!(result, Err(ConfigError::ValidationFailed { .. })));
    }

    #[test]
    fn missing_file_yields_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let policy = load_config_or_default(dir.path().join("absent.toml")).unwrap();
        assert_eq!(policy.enforcement.uptime_threshold_days, 7);

        assert!(matches!(
            load_config(dir.path().join("absent.toml")),
            Err(ConfigError::ReadError(_))
        ));
    }

    #[test]
    fn load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(
            &path,
            "config_version = 1\n[exemption]\ngroup_name = \"Labs\"\n",
        )
        .unwrap();

        let policy = load_config_or_default(&path).unwrap();
        assert_eq!(policy.exemption.group_name, "Labs");
    }
}
