//! Uptime from procfs

use async_trait::async_trait;
use rebootwarden_host_api::{HostError, HostResult, UptimeSource};
use std::path::PathBuf;
use std::time::Duration;

const PROC_UPTIME: &str = "/proc/uptime";

/// Reads time since boot from `/proc/uptime`
#[derive(Debug, Clone)]
pub struct ProcUptime {
    path: PathBuf,
}

impl ProcUptime {
    pub fn new() -> Self {
        Self {
            path: PathBuf::from(PROC_UPTIME),
        }
    }

    /// Read from another file with the same format
    pub fn with_path(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl Default for ProcUptime {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl UptimeSource for ProcUptime {
    async fn uptime(&self) -> HostResult<Duration> {
        let content = tokio::fs::read_to_string(&self.path).await?;
        parse_proc_uptime(&content)
    }
}

/// Parse the first field of `/proc/uptime` ("12345.67 54321.00").
pub fn parse_proc_uptime(content: &str) -> HostResult<Duration> {
    let field = content
        .split_whitespace()
        .next()
        .ok_or_else(|| HostError::Parse("empty uptime file".into()))?;

    let seconds: f64 = field
        .parse()
        .map_err(|_| HostError::Parse(format!("invalid uptime '{}'", field)))?;

    if !seconds.is_finite() || seconds < 0.0 {
        return Err(HostError::Parse(format!("invalid uptime '{}'", field)));
    }

    Ok(Duration::from_secs_f64(seconds))
}
