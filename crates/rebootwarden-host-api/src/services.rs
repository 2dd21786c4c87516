//! Bundle of collaborators handed to the orchestrator

use std::sync::Arc;

use crate::{Clock, ExemptionOracle, Notifier, Rebooter, UptimeSource};

/// Every collaborator one evaluation run needs
#[derive(Clone)]
pub struct HostServices {
    /// Identity used for the exemption lookup
    pub hostname: String,
    pub clock: Arc<dyn Clock>,
    pub uptime: Arc<dyn UptimeSource>,
    pub exemption: Arc<dyn ExemptionOracle>,
    pub notifier: Arc<dyn Notifier>,
    pub rebooter: Arc<dyn Rebooter>,
}

impl HostServices {
    /// Use one host object for every collaborator role
    pub fn from_host<H>(hostname: impl Into<String>, host: Arc<H>) -> Self
    where
        H: Clock + UptimeSource + ExemptionOracle + Notifier + Rebooter + 'static,
    {
        Self {
            hostname: hostname.into(),
            clock: host.clone(),
            uptime: host.clone(),
            exemption: host.clone(),
            notifier: host.clone(),
            rebooter: host,
        }
    }

    pub fn with_rebooter(mut self, rebooter: Arc<dyn Rebooter>) -> Self {
        self.rebooter = rebooter;
        self
    }
}

impl std::fmt::Debug for HostServices {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HostServices")
            .field("hostname", &self.hostname)
            .finish_non_exhaustive()
    }
}
