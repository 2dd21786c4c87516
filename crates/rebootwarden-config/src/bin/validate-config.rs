//! Config validation CLI tool
//!
//! Validates a rebootwarden configuration file and reports any errors.

use rebootwarden_config::StateBackend;
use rebootwarden_util::{default_config_path, format_duration};
use std::path::PathBuf;
use std::process::ExitCode;

fn main() -> ExitCode {
    let args: Vec<String> = std::env::args().collect();

    let config_path = match args.get(1) {
        Some(path) => PathBuf::from(path),
        None => {
            let default_path = default_config_path();
            eprintln!("Usage: validate-config [config-file]");
            eprintln!();
            eprintln!("Validates a rebootwarden configuration file.");
            eprintln!();
            eprintln!("If no path is provided, uses: {}", default_path.display());
            eprintln!();
            eprintln!("Example:");
            eprintln!("  validate-config {}", default_path.display());
            return ExitCode::from(2);
        }
    };

    if !config_path.exists() {
        eprintln!("Error: Configuration file not found: {}", config_path.display());
        return ExitCode::from(1);
    }

    match rebootwarden_config::load_config(&config_path) {
        Ok(policy) => {
            let enforcement = &policy.enforcement;
            println!("✓ Configuration is valid");
            println!();
            println!("Summary:");
            println!("  Config version: {}", rebootwarden_config::CURRENT_CONFIG_VERSION);
            println!("  Uptime threshold: {} days", enforcement.uptime_threshold_days);
            println!("  Reboot window: {}", enforcement.reboot_window);
            println!("  Reboot grace: {}", format_duration(enforcement.reboot_grace));
            println!("  Schedule grace: {}", format_duration(enforcement.schedule_grace));
            if policy.exemption.skip_check {
                println!("  Exemption check: skipped");
            } else {
                println!("  Exemption group: {}", policy.exemption.group_name);
            }
            let backend = match policy.state.backend {
                StateBackend::Json => "json",
                StateBackend::Sqlite => "sqlite",
            };
            println!("  State: {} ({})", policy.state.path.display(), backend);
            println!("  Reboot command: {}", policy.commands.reboot.join(" "));

            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("✗ Configuration validation failed");
            eprintln!();
            match &e {
                rebootwarden_config::ConfigError::ReadError(io_err) => {
                    eprintln!("Failed to read file: {}", io_err);
                }
                rebootwarden_config::ConfigError::ParseError(parse_err) => {
                    eprintln!("TOML parse error:");
                    eprintln!("  {}", parse_err);
                }
                rebootwarden_config::ConfigError::ValidationFailed { errors } => {
                    eprintln!("Validation errors ({}):", errors.len());
                    for err in errors {
                        eprintln!("  - {}", err);
                    }
                }
                rebootwarden_config::ConfigError::UnsupportedVersion(ver) => {
                    eprintln!(
                        "Unsupported config version: {} (expected {})",
                        ver,
                        rebootwarden_config::CURRENT_CONFIG_VERSION
                    );
                }
            }
            ExitCode::from(1)
        }
    }
}
