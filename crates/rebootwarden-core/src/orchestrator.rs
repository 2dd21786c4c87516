//! One evaluation run: collaborators in, decision out, state persisted

use chrono::{DateTime, Local};
use rebootwarden_api::{Notification, NotificationKind, UserAction};
use rebootwarden_config::Policy;
use rebootwarden_host_api::HostServices;
use rebootwarden_store::{PersistedState, StateStore, StoreError, StoreResult};
use rebootwarden_util::RunId;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, info, info_span, warn, Instrument};

use crate::{
    ceil_minutes, compute_deadline, correct_state, decide, validate_schedule_request, Decision,
    RebootReason, RunOutcome, StatusReport,
};

/// Everything a run has established before deciding
struct Assessment {
    now: DateTime<Local>,
    uptime: Duration,
    deadline: DateTime<Local>,
    state: PersistedState,
    decision: Decision,
}

/// Drives one evaluation per `run` call against injected collaborators.
pub struct Orchestrator {
    policy: Policy,
    store: Arc<dyn StateStore>,
    host: HostServices,
}

impl Orchestrator {
    pub fn new(policy: Policy, store: Arc<dyn StateStore>, host: HostServices) -> Self {
        debug!(
            hostname = %host.hostname,
            threshold_days = policy.enforcement.uptime_threshold_days,
            window = %policy.enforcement.reboot_window,
            "Orchestrator initialized"
        );

        Self {
            policy,
            store,
            host,
        }
    }

    pub fn policy(&self) -> &Policy {
        &self.policy
    }

    /// Run one evaluation. Never fails; every collaborator error is folded
    /// into the outcome or degraded to its safe default.
    pub async fn run(&self) -> RunOutcome {
        let run_id = RunId::new();
        let span = info_span!("run", run_id = %run_id, hostname = %self.host.hostname);

        async {
            let outcome = self.run_inner().await;
            info!(outcome = %outcome, exit_code = outcome.exit_code(), "Run complete");
            outcome
        }
        .instrument(span)
        .await
    }

    async fn run_inner(&self) -> RunOutcome {
        if self.check_exempt().await == Some(true) {
            info!("Host is exempt from reboot enforcement");
            return RunOutcome::Exempt;
        }

        let uptime = self.read_uptime().await.unwrap_or(Duration::ZERO);
        if uptime < self.policy.enforcement.uptime_threshold() {
            debug!(uptime_secs = uptime.as_secs(), "Uptime below threshold");
            return RunOutcome::BelowThreshold { uptime };
        }

        let assessment = self.assess(uptime, true);
        debug!(
            deadline = %assessment.deadline,
            decision = ?assessment.decision,
            notification_count = assessment.state.notification_count,
            "Evaluated"
        );

        match assessment.decision {
            Decision::None => RunOutcome::Idle,
            Decision::Notify {
                kind,
                minutes_remaining,
            } => self.notify(assessment, kind, minutes_remaining).await,
            Decision::Reboot(reason) => self.reboot(assessment, reason).await,
        }
    }

    /// Describe what a run would do right now, without notifying, rebooting
    /// or writing state.
    pub async fn status(&self) -> StatusReport {
        let exempt = self.check_exempt().await;
        let uptime = self.read_uptime().await;
        let assessment = self.assess(uptime.unwrap_or(Duration::ZERO), false);
        let window = self.policy.enforcement.reboot_window;

        let decision = if exempt == Some(true) {
            Decision::None
        } else {
            assessment.decision
        };

        StatusReport {
            hostname: self.host.hostname.clone(),
            now: assessment.now,
            exempt,
            uptime,
            uptime_threshold: self.policy.enforcement.uptime_threshold(),
            deadline: assessment.deadline,
            reboot_window: window,
            window_open: window.contains(&assessment.now),
            state: assessment.state,
            decision,
        }
    }

    /// Forget all persisted state
    pub fn reset(&self) -> StoreResult<()> {
        self.store.clear()?;
        info!("Persisted state cleared");
        Ok(())
    }

    /// `None` when the check is skipped or the lookup failed
    async fn check_exempt(&self) -> Option<bool> {
        let exemption = &self.policy.exemption;
        if exemption.skip_check {
            debug!("Exemption check disabled");
            return None;
        }

        match self
            .host
            .exemption
            .is_exempt(&self.host.hostname, &exemption.group_name)
            .await
        {
            Ok(exempt) => Some(exempt),
            Err(e) => {
                warn!(error = %e, group = %exemption.group_name, "Exemption lookup failed, treating as not exempt");
                None
            }
        }
    }

    async fn read_uptime(&self) -> Option<Duration> {
        match self.host.uptime.uptime().await {
            Ok(uptime) => Some(uptime),
            Err(e) => {
                warn!(error = %e, "Uptime query failed, treating as freshly booted");
                None
            }
        }
    }

    fn assess(&self, uptime: Duration, persist_corrections: bool) -> Assessment {
        let enforcement = &self.policy.enforcement;
        let now = self.host.clock.now();
        let deadline = compute_deadline(now, &enforcement.reboot_window);
        let boot_time = now - chrono::Duration::from_std(uptime).unwrap_or(chrono::Duration::zero());

        let mut state = self.load_state();
        let corrections = correct_state(
            &mut state,
            now,
            boot_time,
            deadline,
            enforcement.schedule_grace,
        );
        if !corrections.is_empty() {
            for correction in &corrections {
                info!(correction = %correction, "Corrected persisted state");
            }
            if persist_corrections {
                self.persist(&state);
            }
        }

        let decision = decide(
            now,
            uptime,
            enforcement.uptime_threshold_days,
            deadline,
            &enforcement.reboot_window,
            &state,
        );

        Assessment {
            now,
            uptime,
            deadline,
            state,
            decision,
        }
    }

    async fn notify(
        &self,
        assessment: Assessment,
        kind: NotificationKind,
        minutes_remaining: u32,
    ) -> RunOutcome {
        let Assessment {
            now,
            uptime,
            deadline,
            mut state,
            ..
        } = assessment;

        let notification = self.notification(kind, uptime, deadline, minutes_remaining);
        let response = match self.host.notifier.show(&notification).await {
            Ok(response) if response.delivered => response,
            Ok(_) => {
                warn!(kind = %kind, "Notification was not delivered");
                return RunOutcome::NotificationFailed { kind };
            }
            Err(e) => {
                warn!(kind = %kind, error = %e, "Failed to show notification");
                return RunOutcome::NotificationFailed { kind };
            }
        };

        state.record_notification(now);
        self.persist(&state);
        info!(
            kind = %kind,
            minutes_remaining,
            notification_count = state.notification_count,
            "Notification shown"
        );

        let scheduled = match response.user_action {
            None | Some(UserAction::Dismiss) => None,
            Some(UserAction::RebootNow) => {
                info!("User requested an immediate reboot");
                let assessment = Assessment {
                    now,
                    uptime,
                    deadline,
                    state,
                    decision: Decision::Reboot(RebootReason::UserRequested),
                };
                return self.reboot(assessment, RebootReason::UserRequested).await;
            }
            Some(UserAction::Schedule { requested }) => {
                self.accept_schedule(&mut state, requested, deadline).await
            }
        };

        RunOutcome::Notified {
            kind,
            minutes_remaining,
            scheduled,
        }
    }

    /// Store a user-picked time if it is valid. The user may have sat on the
    /// picker for a while, so the check uses a fresh clock reading.
    async fn accept_schedule(
        &self,
        state: &mut PersistedState,
        requested: DateTime<Local>,
        deadline: DateTime<Local>,
    ) -> Option<DateTime<Local>> {
        let answered_at = self.host.clock.now();
        match validate_schedule_request(requested, answered_at, deadline) {
            Ok(()) => {
                state.scheduled_reboot_time = Some(requested);
                self.persist(state);
                info!(scheduled = %requested, "Reboot scheduled by user");
                Some(requested)
            }
            Err(reason) => {
                warn!(requested = %requested, deadline = %deadline, reason = %reason, "Rejected schedule request");
                if let Err(e) = self
                    .host
                    .notifier
                    .schedule_rejected(requested, deadline, reason)
                    .await
                {
                    warn!(error = %e, "Failed to tell the user about the rejected schedule");
                }
                None
            }
        }
    }

    async fn reboot(&self, assessment: Assessment, reason: RebootReason) -> RunOutcome {
        let window = self.policy.enforcement.reboot_window;
        if reason.requires_window() {
            let now = self.host.clock.now();
            if !window.contains(&now) {
                warn!(window = %window, "Reboot window closed before the reboot could run");
                return RunOutcome::RebootDeferred;
            }
        }

        let mut state = assessment.state;
        state.reset_cycle();
        self.persist(&state);

        let grace = self.policy.enforcement.reboot_grace;
        let notice = self.notification(
            NotificationKind::ImmediateReboot,
            assessment.uptime,
            assessment.deadline,
            ceil_minutes(grace.as_secs_f64() / 60.0),
        );

        info!(reason = ?reason, grace_secs = grace.as_secs(), "Initiating reboot");
        match self.host.rebooter.reboot(grace, &notice).await {
            Ok(()) => RunOutcome::RebootInitiated { reason },
            Err(e) => {
                error!(reason = ?reason, error = %e, "Reboot command failed");
                RunOutcome::RebootFailed {
                    reason,
                    error: e.to_string(),
                }
            }
        }
    }

    fn notification(
        &self,
        kind: NotificationKind,
        uptime: Duration,
        deadline: DateTime<Local>,
        minutes_remaining: u32,
    ) -> Notification {
        Notification::new(kind, uptime.as_secs() / 86_400, deadline, minutes_remaining)
    }

    fn load_state(&self) -> PersistedState {
        match self.store.load() {
            Ok(state) => state,
            Err(StoreError::Corrupt(msg)) => {
                warn!(error = %msg, "Persisted state is corrupt, starting fresh");
                PersistedState::default()
            }
            Err(e) => {
                warn!(error = %e, "Failed to load persisted state, starting fresh");
                PersistedState::default()
            }
        }
    }

    fn persist(&self, state: &PersistedState) {
        if let Err(e) = self.store.save(state) {
            warn!(error = %e, "Failed to persist state");
        }
    }
}
