//! rebootwardend - workstation reboot enforcement
//!
//! This is the entry point invoked by the system scheduler (systemd timer,
//! cron). It wires together:
//! - Configuration loading
//! - State store selection
//! - Linux host collaborators
//! - The orchestrator, run once or on an interval

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use rebootwarden_config::{load_config, load_config_or_default, Policy, StateBackend};
use rebootwarden_core::{Decision, Orchestrator, StatusReport, EXIT_FAILURE, EXIT_SUCCESS};
use rebootwarden_host_api::{Clock, HostServices, Rebooter, SystemClock};
use rebootwarden_host_linux::{
    local_hostname, CommandRebooter, DesktopNotifier, DryRunRebooter, GroupExemption, ProcUptime,
};
use rebootwarden_store::{JsonFileStore, SqliteStore, StateStore};
use rebootwarden_util::{
    config_path_without_env, format_datetime_full, format_duration, is_mock_time_active,
};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;
use tokio::signal::unix::{signal, SignalKind};
use tokio::time::MissedTickBehavior;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

/// rebootwardend - Reboot enforcement for long-running workstations
#[derive(Parser, Debug)]
#[command(name = "rebootwardend")]
#[command(about = "Notify users about pending reboots and enforce them in a maintenance window", long_about = None)]
struct Args {
    /// Configuration file path (default: /etc/rebootwarden/config.toml)
    #[arg(short, long, env = "REBOOTWARDEN_CONFIG", global = true)]
    config: Option<PathBuf>,

    /// State file override (or set REBOOTWARDEN_STATE env var)
    #[arg(short, long, env = "REBOOTWARDEN_STATE", global = true)]
    state: Option<PathBuf>,

    /// Log level
    #[arg(short, long, default_value = "info", global = true)]
    log_level: String,

    /// Log output format
    #[arg(long, value_enum, default_value_t = LogFormat::Text, global = true)]
    log_format: LogFormat,

    /// Log the reboot instead of executing it
    #[arg(long, global = true)]
    dry_run: bool,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug, Clone)]
enum Command {
    /// Evaluate once and act (default)
    Run {
        /// Keep running, evaluating every N seconds until SIGTERM/SIGINT
        #[arg(long, value_name = "SECS")]
        interval: Option<u64>,
    },

    /// Show what a run would do now, without side effects
    Status,

    /// Clear persisted state
    Reset,
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
enum LogFormat {
    Text,
    Json,
}

fn init_logging(level: &str, format: LogFormat) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(std::io::stderr);

    match format {
        LogFormat::Text => builder.init(),
        LogFormat::Json => builder.json().init(),
    }
}

fn load_policy(explicit: Option<&Path>) -> Result<Policy> {
    let policy = match explicit {
        Some(path) => load_config(path)
            .with_context(|| format!("Failed to load config from {}", path.display()))?,
        None => {
            let path = config_path_without_env();
            load_config_or_default(&path)
                .with_context(|| format!("Failed to load config from {}", path.display()))?
        }
    };

    info!(
        threshold_days = policy.enforcement.uptime_threshold_days,
        window = %policy.enforcement.reboot_window,
        "Configuration loaded"
    );
    Ok(policy)
}

fn open_store(policy: &Policy, path_override: Option<&Path>) -> Result<Arc<dyn StateStore>> {
    let path = path_override
        .map(Path::to_path_buf)
        .unwrap_or_else(|| policy.state.path.clone());

    let store: Arc<dyn StateStore> = match policy.state.backend {
        StateBackend::Json => Arc::new(JsonFileStore::new(&path)),
        StateBackend::Sqlite => Arc::new(
            SqliteStore::open(&path)
                .with_context(|| format!("Failed to open state database {}", path.display()))?,
        ),
    };

    info!(path = %path.display(), backend = ?policy.state.backend, "State store opened");
    if !store.is_healthy() {
        warn!(path = %path.display(), "State store reports unhealthy");
    }
    Ok(store)
}

fn linux_services(policy: &Policy, dry_run: bool) -> Result<HostServices> {
    let hostname = local_hostname().context("Failed to determine hostname")?;
    let commands = &policy.commands;
    let clock: Arc<dyn Clock> = Arc::new(SystemClock);

    let rebooter: Arc<dyn Rebooter> = if dry_run {
        info!("Dry run: reboots will only be logged");
        Arc::new(DryRunRebooter)
    } else {
        Arc::new(CommandRebooter::new(
            commands.reboot.clone(),
            commands.notify.clone(),
        ))
    };

    Ok(HostServices {
        hostname,
        clock: clock.clone(),
        uptime: Arc::new(ProcUptime::new()),
        exemption: Arc::new(GroupExemption),
        notifier: Arc::new(DesktopNotifier::new(
            commands.notify.clone(),
            commands.picker.clone(),
            commands.response_timeout,
            clock,
        )),
        rebooter,
    })
}

/// Evaluate every `every` until a signal arrives or a reboot is underway.
async fn run_interval(orchestrator: &Orchestrator, every: Duration) -> Result<u8> {
    let mut sigterm =
        signal(SignalKind::terminate()).context("Failed to create SIGTERM handler")?;
    let mut sigint = signal(SignalKind::interrupt()).context("Failed to create SIGINT handler")?;

    let mut ticker = tokio::time::interval(every);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    let mut last_code = EXIT_SUCCESS;

    info!(interval_secs = every.as_secs(), "Running on an interval");

    loop {
        tokio::select! {
            _ = sigterm.recv() => {
                info!("Received SIGTERM, shutting down");
                break;
            }
            _ = sigint.recv() => {
                info!("Received SIGINT, shutting down");
                break;
            }
            _ = ticker.tick() => {
                let outcome = orchestrator.run().await;
                last_code = outcome.exit_code();
                if outcome.is_reboot() {
                    info!("Reboot initiated, leaving the loop");
                    break;
                }
            }
        }
    }

    Ok(last_code)
}

fn print_status(report: &StatusReport) {
    println!("Host: {}", report.hostname);
    println!("Now: {}", format_datetime_full(&report.now));
    match report.exempt {
        Some(true) => println!("Exempt: yes"),
        Some(false) => println!("Exempt: no"),
        None => println!("Exempt: unknown (check skipped or lookup failed)"),
    }
    match report.uptime {
        Some(uptime) => println!(
            "Uptime: {} (threshold {})",
            format_duration(uptime),
            format_duration(report.uptime_threshold)
        ),
        None => println!("Uptime: unavailable"),
    }
    println!("Deadline: {}", format_datetime_full(&report.deadline));
    let window = &report.reboot_window;
    match window.remaining_duration(&report.now) {
        Some(left) => println!(
            "Reboot window: {} (open, closes in {})",
            window,
            format_duration(left)
        ),
        None => println!(
            "Reboot window: {} (closed, opens {})",
            window,
            format_datetime_full(&window.next_opening(&report.now))
        ),
    }

    let state = &report.state;
    println!("State:");
    println!(
        "  Last notification: {}",
        state
            .last_notification_time
            .map(|t| format_datetime_full(&t))
            .unwrap_or_else(|| "never".into())
    );
    println!(
        "  Scheduled reboot: {}",
        state
            .scheduled_reboot_time
            .map(|t| format_datetime_full(&t))
            .unwrap_or_else(|| "none".into())
    );
    println!("  Notifications shown: {}", state.notification_count);

    let decision = match report.decision {
        Decision::None => "nothing".to_string(),
        Decision::Notify {
            kind,
            minutes_remaining,
        } => format!("notify ({}, {} minutes remaining)", kind, minutes_remaining),
        Decision::Reboot(reason) => format!("reboot ({:?})", reason),
    };
    println!("Decision now: {}", decision);
}

async fn execute(args: Args) -> Result<u8> {
    let policy = load_policy(args.config.as_deref())?;
    let store = open_store(&policy, args.state.as_deref())?;
    let services = linux_services(&policy, args.dry_run)?;
    let orchestrator = Orchestrator::new(policy, store, services);

    match args.command.unwrap_or(Command::Run { interval: None }) {
        Command::Run { interval: None } => Ok(orchestrator.run().await.exit_code()),
        Command::Run {
            interval: Some(secs),
        } => run_interval(&orchestrator, Duration::from_secs(secs.max(1))).await,
        Command::Status => {
            print_status(&orchestrator.status().await);
            Ok(EXIT_SUCCESS)
        }
        Command::Reset => {
            orchestrator.reset().context("Failed to clear state")?;
            println!("State cleared");
            Ok(EXIT_SUCCESS)
        }
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    let args = Args::parse();
    init_logging(&args.log_level, args.log_format);

    info!(version = env!("CARGO_PKG_VERSION"), "rebootwardend starting");
    if is_mock_time_active() {
        warn!("Mock time is active");
    }

    match execute(args).await {
        Ok(code) => ExitCode::from(code),
        Err(e) => {
            error!(error = %format!("{:#}", e), "rebootwardend failed");
            ExitCode::from(EXIT_FAILURE)
        }
    }
}
