//! Integration tests for rebootwardend
//!
//! Each scenario drives the orchestrator the way the scheduler does: a
//! fresh orchestrator per invocation, state carried only through the store.

use chrono::{DateTime, Local, TimeZone};
use rebootwarden_api::{NotificationKind, NotificationResponse, UserAction};
use rebootwarden_config::{parse_config, Policy};
use rebootwarden_core::{Orchestrator, RebootReason, RunOutcome, EXIT_REBOOT_INITIATED};
use rebootwarden_host_api::{HostServices, MockHost};
use rebootwarden_host_linux::DryRunRebooter;
use rebootwarden_store::{JsonFileStore, SqliteStore, StateStore};
use std::sync::Arc;
use std::time::Duration;

const DAY: u64 = 86_400;
const STEP: Duration = Duration::from_secs(5 * 60);

fn at(h: u32, m: u32) -> DateTime<Local> {
    Local.with_ymd_and_hms(2025, 6, 10, h, m, 0).unwrap()
}

fn invoke(policy: &Policy, store: &Arc<dyn StateStore>, host: &Arc<MockHost>) -> Orchestrator {
    Orchestrator::new(
        policy.clone(),
        store.clone(),
        HostServices::from_host("ws-01", host.clone()),
    )
}

/// Run every five minutes until a reboot happens or `until` passes
async fn run_until(
    policy: &Policy,
    store: &Arc<dyn StateStore>,
    host: &Arc<MockHost>,
    until: DateTime<Local>,
) -> Vec<(DateTime<Local>, RunOutcome)> {
    let mut outcomes = Vec::new();
    loop {
        let now = rebootwarden_host_api::Clock::now(host.as_ref());
        if now > until {
            break;
        }
        let outcome = invoke(policy, store, host).run().await;
        let done = outcome.is_reboot();
        outcomes.push((now, outcome));
        if done {
            break;
        }
        host.advance(STEP);
    }
    outcomes
}

fn kinds(outcomes: &[(DateTime<Local>, RunOutcome)]) -> Vec<(DateTime<Local>, NotificationKind)> {
    outcomes
        .iter()
        .filter_map(|(t, o)| match o {
            RunOutcome::Notified { kind, .. } => Some((*t, *kind)),
            _ => None,
        })
        .collect()
}

#[tokio::test]
async fn test_full_day_escalation() {
    let dir = tempfile::tempdir().unwrap();
    let store: Arc<dyn StateStore> = Arc::new(JsonFileStore::new(dir.path().join("state.json")));
    let host = Arc::new(MockHost::new(at(14, 0), Duration::from_secs(8 * DAY)));
    let policy = Policy::default();

    let outcomes = run_until(&policy, &store, &host, at(23, 0)).await;
    let notified = kinds(&outcomes);

    assert_eq!(notified[0], (at(14, 0), NotificationKind::InitialWarning));

    let hourly: Vec<_> = notified
        .iter()
        .filter(|(_, k)| *k == NotificationKind::HourlyReminder)
        .map(|(t, _)| *t)
        .collect();
    assert_eq!(
        hourly,
        vec![at(15, 0), at(16, 0), at(17, 0), at(18, 0), at(19, 0), at(20, 0)]
    );

    let finals: Vec<_> = notified
        .iter()
        .filter(|(_, k)| *k == NotificationKind::FinalWarning)
        .map(|(t, _)| *t)
        .collect();
    assert_eq!(
        finals,
        vec![at(20, 30), at(20, 45), at(21, 0), at(21, 15), at(21, 30), at(21, 45)]
    );

    let (when, last) = outcomes.last().unwrap();
    assert_eq!(*when, at(22, 0));
    assert_eq!(
        *last,
        RunOutcome::RebootInitiated {
            reason: RebootReason::Deadline
        }
    );
    assert_eq!(last.exit_code(), EXIT_REBOOT_INITIATED);

    assert_eq!(host.shown().len(), 13);
    let state = store.load().unwrap();
    assert_eq!(state.notification_count, 13);
    assert!(state.last_notification_time.is_none());
}

#[tokio::test]
async fn test_user_schedule_countdown() {
    let dir = tempfile::tempdir().unwrap();
    let store: Arc<dyn StateStore> = Arc::new(JsonFileStore::new(dir.path().join("state.json")));
    let host = Arc::new(MockHost::new(at(14, 0), Duration::from_secs(8 * DAY)));
    host.push_response(Some(NotificationResponse::with_action(UserAction::Schedule {
        requested: at(19, 0),
    })));

    let outcomes = run_until(&Policy::default(), &store, &host, at(23, 0)).await;
    let notified = kinds(&outcomes);

    assert_eq!(
        notified,
        vec![
            (at(14, 0), NotificationKind::InitialWarning),
            (at(18, 50), NotificationKind::ScheduledCountdown),
            (at(18, 55), NotificationKind::ScheduledCountdown),
        ]
    );

    let (when, last) = outcomes.last().unwrap();
    assert_eq!(*when, at(19, 0));
    assert_eq!(
        *last,
        RunOutcome::RebootInitiated {
            reason: RebootReason::Scheduled
        }
    );
    assert!(store.load().unwrap().scheduled_reboot_time.is_none());
}

#[tokio::test]
async fn test_missed_schedule_falls_back_to_deadline() {
    let dir = tempfile::tempdir().unwrap();
    let store: Arc<dyn StateStore> = Arc::new(JsonFileStore::new(dir.path().join("state.json")));
    let host = Arc::new(MockHost::new(at(14, 0), Duration::from_secs(8 * DAY)));
    host.push_response(Some(NotificationResponse::with_action(UserAction::Schedule {
        requested: at(16, 0),
    })));
    let policy = Policy::default();

    invoke(&policy, &store, &host).run().await;
    assert_eq!(store.load().unwrap().scheduled_reboot_time, Some(at(16, 0)));

    // Machine asleep through the scheduled time
    host.set_now(at(17, 0));
    let outcome = invoke(&policy, &store, &host).run().await;

    assert!(matches!(
        outcome,
        RunOutcome::Notified {
            kind: NotificationKind::HourlyReminder,
            ..
        }
    ));
    assert!(host.reboots().is_empty());
    assert!(store.load().unwrap().scheduled_reboot_time.is_none());
}

#[tokio::test]
async fn test_config_drives_enforcement() {
    let policy = parse_config(
        r#"
config_version = 1

[enforcement]
uptime_threshold_days = 10
reboot_window_start_hour = 1
reboot_window_end_hour = 4

[exemption]
skip_check = true

[state]
backend = "sqlite"
"#,
    )
    .unwrap();

    let store: Arc<dyn StateStore> = Arc::new(SqliteStore::in_memory().unwrap());
    let host = Arc::new(MockHost::new(at(14, 0), Duration::from_secs(8 * DAY)));

    let outcome = invoke(&policy, &store, &host).run().await;
    assert!(matches!(outcome, RunOutcome::BelowThreshold { .. }));

    host.set_uptime(Some(Duration::from_secs(11 * DAY)));
    let outcome = invoke(&policy, &store, &host).run().await;

    // Deadline 01:00 today has passed and the 01-04 window is closed
    assert_eq!(outcome, RunOutcome::Idle);
    assert!(host.exemption_queries().is_empty());

    host.set_now(Local.with_ymd_and_hms(2025, 6, 11, 1, 0, 0).unwrap());
    let outcome = invoke(&policy, &store, &host).run().await;
    assert_eq!(
        outcome,
        RunOutcome::RebootInitiated {
            reason: RebootReason::Deadline
        }
    );
}

#[tokio::test]
async fn test_dry_run_rebooter() {
    let store: Arc<dyn StateStore> = Arc::new(SqliteStore::in_memory().unwrap());
    let host = Arc::new(MockHost::new(at(22, 10), Duration::from_secs(8 * DAY)));
    let services = HostServices::from_host("ws-01", host.clone()).with_rebooter(Arc::new(DryRunRebooter));
    let orchestrator = Orchestrator::new(Policy::default(), store, services);

    let outcome = orchestrator.run().await;

    assert_eq!(
        outcome,
        RunOutcome::RebootInitiated {
            reason: RebootReason::Deadline
        }
    );
    assert!(host.reboots().is_empty());
}

#[tokio::test]
async fn test_exempt_host_keeps_state_untouched() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("state.json");
    let store: Arc<dyn StateStore> = Arc::new(JsonFileStore::new(&path));
    let host = Arc::new(MockHost::new(at(22, 30), Duration::from_secs(30 * DAY)));
    host.set_exempt(Some(true));

    let outcome = invoke(&Policy::default(), &store, &host).run().await;

    assert_eq!(outcome, RunOutcome::Exempt);
    assert!(!path.exists());
    assert!(host.reboots().is_empty());
}
