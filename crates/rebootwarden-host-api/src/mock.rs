//! Mock host for testing

use async_trait::async_trait;
use chrono::{DateTime, Local};
use rebootwarden_api::{Notification, NotificationResponse, ScheduleRejection};
use std::collections::VecDeque;
use std::sync::Mutex;
use std::time::Duration;

use crate::{Clock, ExemptionOracle, HostError, HostResult, Notifier, Rebooter, UptimeSource};

/// A reboot request captured by the mock
#[derive(Debug, Clone, PartialEq)]
pub struct MockReboot {
    pub at: DateTime<Local>,
    pub grace: Duration,
    pub notice: Notification,
}

/// A schedule rejection captured by the mock
#[derive(Debug, Clone, PartialEq)]
pub struct MockRejection {
    pub requested: DateTime<Local>,
    pub deadline: DateTime<Local>,
    pub reason: ScheduleRejection,
}

/// Scriptable stand-in for every collaborator role
pub struct MockHost {
    now: Mutex<DateTime<Local>>,
    uptime: Mutex<Option<Duration>>,
    exempt: Mutex<Option<bool>>,
    responses: Mutex<VecDeque<Option<NotificationResponse>>>,
    shown: Mutex<Vec<Notification>>,
    rejections: Mutex<Vec<MockRejection>>,
    reboots: Mutex<Vec<MockReboot>>,
    exemption_queries: Mutex<Vec<(String, String)>>,

    /// Configure the reboot command to fail
    pub fail_reboot: Mutex<bool>,
}

impl MockHost {
    /// A host at `now` with the given uptime, not exempt, whose user ignores
    /// every notification.
    pub fn new(now: DateTime<Local>, uptime: Duration) -> Self {
        Self {
            now: Mutex::new(now),
            uptime: Mutex::new(Some(uptime)),
            exempt: Mutex::new(Some(false)),
            responses: Mutex::new(VecDeque::new()),
            shown: Mutex::new(Vec::new()),
            rejections: Mutex::new(Vec::new()),
            reboots: Mutex::new(Vec::new()),
            exemption_queries: Mutex::new(Vec::new()),
            fail_reboot: Mutex::new(false),
        }
    }

    pub fn set_now(&self, now: DateTime<Local>) {
        *self.now.lock().unwrap() = now;
    }

    /// Move the clock and the uptime forward together
    pub fn advance(&self, by: Duration) {
        let step = chrono::Duration::from_std(by).unwrap();
        *self.now.lock().unwrap() += step;
        if let Some(uptime) = self.uptime.lock().unwrap().as_mut() {
            *uptime += by;
        }
    }

    /// `None` makes the uptime query fail
    pub fn set_uptime(&self, uptime: Option<Duration>) {
        *self.uptime.lock().unwrap() = uptime;
    }

    /// `None` makes the exemption lookup fail
    pub fn set_exempt(&self, exempt: Option<bool>) {
        *self.exempt.lock().unwrap() = exempt;
    }

    /// Queue the outcome of the next `show` call. `None` makes it fail.
    pub fn push_response(&self, response: Option<NotificationResponse>) {
        self.responses.lock().unwrap().push_back(response);
    }

    pub fn shown(&self) -> Vec<Notification> {
        self.shown.lock().unwrap().clone()
    }

    pub fn rejections(&self) -> Vec<MockRejection> {
        self.rejections.lock().unwrap().clone()
    }

    pub fn reboots(&self) -> Vec<MockReboot> {
        self.reboots.lock().unwrap().clone()
    }

    pub fn exemption_queries(&self) -> Vec<(String, String)> {
        self.exemption_queries.lock().unwrap().clone()
    }
}

impl Clock for MockHost {
    fn now(&self) -> DateTime<Local> {
        *self.now.lock().unwrap()
    }
}

#[async_trait]
impl UptimeSource for MockHost {
    async fn uptime(&self) -> HostResult<Duration> {
        self.uptime
            .lock()
            .unwrap()
            .ok_or_else(|| HostError::Unavailable("Mock uptime failure".into()))
    }
}

#[async_trait]
impl ExemptionOracle for MockHost {
    async fn is_exempt(&self, host: &str, group: &str) -> HostResult<bool> {
        self.exemption_queries
            .lock()
            .unwrap()
            .push((host.to_string(), group.to_string()));
        self.exempt
            .lock()
            .unwrap()
            .ok_or_else(|| HostError::Unavailable("Mock directory failure".into()))
    }
}

#[async_trait]
impl Notifier for MockHost {
    async fn show(&self, notification: &Notification) -> HostResult<NotificationResponse> {
        let scripted = self.responses.lock().unwrap().pop_front();
        match scripted {
            Some(None) => Err(HostError::command_failed("mock-notify", "Mock notify failure")),
            Some(Some(response)) => {
                if response.delivered {
                    self.shown.lock().unwrap().push(notification.clone());
                }
                Ok(response)
            }
            None => {
                self.shown.lock().unwrap().push(notification.clone());
                Ok(NotificationResponse::delivered())
            }
        }
    }

    async fn schedule_rejected(
        &self,
        requested: DateTime<Local>,
        deadline: DateTime<Local>,
        reason: ScheduleRejection,
    ) -> HostResult<()> {
        self.rejections.lock().unwrap().push(MockRejection {
            requested,
            deadline,
            reason,
        });
        Ok(())
    }
}

#[async_trait]
impl Rebooter for MockHost {
    async fn reboot(&self, grace: Duration, notice: &Notification) -> HostResult<()> {
        if *self.fail_reboot.lock().unwrap() {
            return Err(HostError::command_failed("mock-reboot", "Mock reboot failure"));
        }

        let at = self.now();
        self.reboots.lock().unwrap().push(MockReboot {
            at,
            grace,
            notice: notice.clone(),
        });
        Ok(())
    }
}
