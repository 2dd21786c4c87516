//! Configuration validation

use crate::schema::RawConfig;
use thiserror::Error;

/// Longest countdown allowed before the reboot command runs
pub const MAX_REBOOT_GRACE_SECONDS: u64 = 3600;

/// Longest a passed user schedule may still fire
pub const MAX_SCHEDULE_GRACE_MINUTES: u64 = 1440;

/// Validation error
#[derive(Debug, Clone, Error)]
pub enum ValidationError {
    #[error("Invalid hour for {field}: {value} (must be 0-23)")]
    InvalidHour { field: &'static str, value: u8 },

    #[error("Reboot window start and end are both {0}:00, the window would be empty")]
    EmptyRebootWindow(u8),

    #[error("uptime_threshold_days must be at least 1")]
    ZeroThreshold,

    #[error("reboot_grace_seconds {0} exceeds the maximum of {MAX_REBOOT_GRACE_SECONDS}")]
    GraceTooLong(u64),

    #[error("schedule_grace_minutes {0} must be between 1 and {MAX_SCHEDULE_GRACE_MINUTES}")]
    ScheduleGraceOutOfRange(u64),

    #[error("response_timeout_seconds must be greater than 0")]
    ZeroResponseTimeout,

    #[error(
        "response_timeout_seconds {timeout_secs} must be shorter than the schedule grace ({grace_secs}s)"
    )]
    ResponseTimeoutTooLong { timeout_secs: u64, grace_secs: u64 },

    #[error("Exemption group name cannot be empty unless skip_check is set")]
    EmptyGroupName,

    #[error("Unknown state backend '{0}' (expected \"json\" or \"sqlite\")")]
    UnknownBackend(String),

    #[error("Command '{0}' cannot be empty")]
    EmptyCommand(&'static str),
}

/// Validate a raw configuration, collecting every problem found
pub fn validate_config(config: &RawConfig) -> Vec<ValidationError> {
    let mut errors = Vec::new();
    let enforcement = &config.enforcement;

    let start = enforcement.reboot_window_start_hour;
    let end = enforcement.reboot_window_end_hour;
    if let Some(hour) = start {
        errors.extend(validate_hour("reboot_window_start_hour", hour));
    }
    if let Some(hour) = end {
        errors.extend(validate_hour("reboot_window_end_hour", hour));
    }

    let start = start.unwrap_or(crate::DEFAULT_WINDOW_START_HOUR);
    let end = end.unwrap_or(crate::DEFAULT_WINDOW_END_HOUR);
    if start == end {
        errors.push(ValidationError::EmptyRebootWindow(start));
    }

    let schedule_grace = enforcement
        .schedule_grace_minutes
        .unwrap_or(crate::DEFAULT_SCHEDULE_GRACE_MINUTES);
    let schedule_grace_valid = (1..=MAX_SCHEDULE_GRACE_MINUTES).contains(&schedule_grace);
    if !schedule_grace_valid {
        errors.push(ValidationError::ScheduleGraceOutOfRange(schedule_grace));
    }

    if enforcement.uptime_threshold_days == Some(0) {
        errors.push(ValidationError::ZeroThreshold);
    }

    if let Some(grace) = enforcement.reboot_grace_seconds
        && grace > MAX_REBOOT_GRACE_SECONDS
    {
        errors.push(ValidationError::GraceTooLong(grace));
    }

    if !config.exemption.skip_check
        && let Some(name) = &config.exemption.group_name
        && name.trim().is_empty()
    {
        errors.push(ValidationError::EmptyGroupName);
    }

    if let Some(backend) = &config.state.backend
        && parse_backend(backend).is_none()
    {
        errors.push(ValidationError::UnknownBackend(backend.clone()));
    }

    let commands = &config.commands;
    if commands.notify.as_deref().is_some_and(|c| c.trim().is_empty()) {
        errors.push(ValidationError::EmptyCommand("notify"));
    }
    if commands.picker.as_deref().is_some_and(|c| c.trim().is_empty()) {
        errors.push(ValidationError::EmptyCommand("picker"));
    }
    if let Some(argv) = &commands.reboot
        && argv.first().is_none_or(|program| program.trim().is_empty())
    {
        errors.push(ValidationError::EmptyCommand("reboot"));
    }
    let timeout_secs = commands
        .response_timeout_seconds
        .unwrap_or(crate::DEFAULT_RESPONSE_TIMEOUT_SECONDS);
    let grace_secs = schedule_grace.saturating_mul(60);
    if timeout_secs == 0 {
        errors.push(ValidationError::ZeroResponseTimeout);
    } else if schedule_grace_valid && timeout_secs >= grace_secs {
        // A run blocked on an unanswered prompt must not outlive the schedule
        errors.push(ValidationError::ResponseTimeoutTooLong {
            timeout_secs,
            grace_secs,
        });
    }

    errors
}

fn validate_hour(field: &'static str, value: u8) -> Option<ValidationError> {
    if value >= 24 {
        Some(ValidationError::InvalidHour { field, value })
    } else {
        None
    }
}

/// Parse a state backend name
pub fn parse_backend(name: &str) -> Option<crate::StateBackend> {
    match name.to_lowercase().as_str() {
        "json" => Some(crate::StateBackend::Json),
        "sqlite" => Some(crate::StateBackend::Sqlite),
        _ => None,
    }
}
