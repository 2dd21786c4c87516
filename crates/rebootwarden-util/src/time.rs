//! Time utilities for rebootwarden
//!
//! All enforcement decisions are made against wall-clock time in the local
//! timezone: deadlines and reboot windows are expressed in clock hours.
//!
//! # Mock Time for Development
//!
//! In debug builds, the `REBOOTWARDEN_MOCK_TIME` environment variable can be
//! set to override the system time for all time-sensitive operations. This is
//! useful for walking through the reminder cadence without waiting for it.
//!
//! Format: `YYYY-MM-DD HH:MM:SS` (e.g., `2025-12-25 21:35:00`)
//!
//! Example:
//! ```bash
//! REBOOTWARDEN_MOCK_TIME="2025-12-25 21:35:00" rebootwardend status
//! ```

use chrono::{DateTime, Local, NaiveDate, NaiveDateTime, NaiveTime, TimeZone, Timelike};
use serde::{Deserialize, Serialize};
use std::sync::OnceLock;
use std::time::Duration;

use crate::WardenError;

/// Environment variable name for mock time (debug builds only)
pub const MOCK_TIME_ENV_VAR: &str = "REBOOTWARDEN_MOCK_TIME";

/// Cached mock time offset from the real time when the process started.
/// This allows mock time to advance naturally.
static MOCK_TIME_OFFSET: OnceLock<Option<chrono::Duration>> = OnceLock::new();

#[allow(clippy::disallowed_methods)] // This is the internal implementation that wraps Local::now()
fn get_mock_time_offset() -> Option<chrono::Duration> {
    *MOCK_TIME_OFFSET.get_or_init(|| {
        #[cfg(debug_assertions)]
        {
            if let Ok(mock_time_str) = std::env::var(MOCK_TIME_ENV_VAR) {
                match NaiveDateTime::parse_from_str(&mock_time_str, "%Y-%m-%d %H:%M:%S") {
                    Ok(naive_dt) => {
                        if let Some(mock_dt) = Local.from_local_datetime(&naive_dt).single() {
                            let offset = mock_dt.signed_duration_since(chrono::Local::now());
                            tracing::info!(
                                mock_time = %mock_time_str,
                                offset_secs = offset.num_seconds(),
                                "Mock time enabled"
                            );
                            return Some(offset);
                        }
                        tracing::warn!(
                            mock_time = %mock_time_str,
                            "Failed to convert mock time to local timezone"
                        );
                    }
                    Err(_) => {
                        tracing::warn!(
                            mock_time = %mock_time_str,
                            expected_format = "%Y-%m-%d %H:%M:%S",
                            "Invalid mock time format"
                        );
                    }
                }
            }
            None
        }
        #[cfg(not(debug_assertions))]
        {
            None
        }
    })
}

/// Returns whether mock time is currently active.
pub fn is_mock_time_active() -> bool {
    get_mock_time_offset().is_some()
}

/// Get the current local time, respecting mock time settings in debug builds.
#[allow(clippy::disallowed_methods)] // This is the wrapper that provides mock time support
pub fn now() -> DateTime<Local> {
    let real_now = chrono::Local::now();

    if let Some(offset) = get_mock_time_offset() {
        real_now + offset
    } else {
        real_now
    }
}

/// Format a DateTime as `HH:MM` for notification text.
pub fn format_clock_time(dt: &DateTime<Local>) -> String {
    dt.format("%H:%M").to_string()
}

/// Format a DateTime for display with full date and time.
pub fn format_datetime_full(dt: &DateTime<Local>) -> String {
    dt.format("%Y-%m-%d %H:%M:%S").to_string()
}

/// Fractional minutes from `from` until `to`. Negative when `to` has passed.
pub fn minutes_until(from: DateTime<Local>, to: DateTime<Local>) -> f64 {
    let delta = to.signed_duration_since(from);
    match delta.num_microseconds() {
        Some(us) => us as f64 / 60_000_000.0,
        None => delta.num_milliseconds() as f64 / 60_000.0,
    }
}

/// Elapsed time since `earlier`, clamped at zero when `earlier` lies in the future.
pub fn elapsed_since(earlier: DateTime<Local>, now: DateTime<Local>) -> Duration {
    now.signed_duration_since(earlier)
        .to_std()
        .unwrap_or(Duration::ZERO)
}

/// Resolve a local date and time to a concrete instant.
///
/// Ambiguous times (DST fall-back) resolve to the earlier instant; times that
/// do not exist (DST spring-forward gap) are pushed forward by an hour.
pub fn local_datetime(date: NaiveDate, time: NaiveTime) -> DateTime<Local> {
    let naive = date.and_time(time);
    match Local.from_local_datetime(&naive).earliest() {
        Some(dt) => dt,
        None => {
            let shifted = naive + chrono::Duration::hours(1);
            Local
                .from_local_datetime(&shifted)
                .earliest()
                .unwrap_or_else(|| Local.from_utc_datetime(&naive))
        }
    }
}

/// Wall-clock time of day, minute resolution
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct WallClock {
    pub hour: u8,
    pub minute: u8,
}

impl WallClock {
    pub fn new(hour: u8, minute: u8) -> Option<Self> {
        if hour < 24 && minute < 60 {
            Some(Self { hour, minute })
        } else {
            None
        }
    }

    /// Parse `HH:MM` (also accepts `H:MM`).
    pub fn parse(s: &str) -> crate::Result<Self> {
        let trimmed = s.trim();
        let (h, m) = trimmed
            .split_once(':')
            .ok_or_else(|| WardenError::invalid_time(trimmed, "expected HH:MM"))?;

        let hour: u8 = h
            .parse()
            .map_err(|_| WardenError::invalid_time(trimmed, "invalid hour"))?;
        let minute: u8 = m
            .parse()
            .map_err(|_| WardenError::invalid_time(trimmed, "invalid minute"))?;

        Self::new(hour, minute)
            .ok_or_else(|| WardenError::invalid_time(trimmed, "hour must be 0-23, minute 0-59"))
    }

    pub fn to_naive_time(self) -> NaiveTime {
        NaiveTime::from_hms_opt(self.hour as u32, self.minute as u32, 0)
            .unwrap_or(NaiveTime::MIN)
    }

    pub fn from_naive_time(time: NaiveTime) -> Self {
        Self {
            hour: time.hour() as u8,
            minute: time.minute() as u8,
        }
    }

    /// Returns seconds since midnight
    pub fn as_seconds_from_midnight(&self) -> u32 {
        (self.hour as u32) * 3600 + (self.minute as u32) * 60
    }

    /// This clock time on the same local day as `dt`.
    pub fn on_day_of(self, dt: &DateTime<Local>) -> DateTime<Local> {
        local_datetime(dt.date_naive(), self.to_naive_time())
    }

    /// The first occurrence of this clock time strictly after `dt`.
    pub fn next_after(self, dt: &DateTime<Local>) -> DateTime<Local> {
        let today = self.on_day_of(dt);
        if today > *dt {
            today
        } else {
            let tomorrow = dt.date_naive().succ_opt().unwrap_or(dt.date_naive());
            local_datetime(tomorrow, self.to_naive_time())
        }
    }
}

impl std::fmt::Display for WallClock {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:02}:{:02}", self.hour, self.minute)
    }
}

impl PartialOrd for WallClock {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for WallClock {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.as_seconds_from_midnight()
            .cmp(&other.as_seconds_from_midnight())
    }
}

/// Clock-hour range during which a forced reboot may execute.
///
/// `start` is inclusive and `end` exclusive. A window whose start is later
/// than its end wraps past midnight (e.g. 22:00 - 05:00). Equal bounds form
/// an empty window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RebootWindow {
    pub start: WallClock,
    pub end: WallClock,
}

impl RebootWindow {
    pub fn new(start: WallClock, end: WallClock) -> Self {
        Self { start, end }
    }

    /// Build a window from whole hours. Returns `None` for hours outside 0-23.
    pub fn from_hours(start_hour: u8, end_hour: u8) -> Option<Self> {
        Some(Self {
            start: WallClock::new(start_hour, 0)?,
            end: WallClock::new(end_hour, 0)?,
        })
    }

    pub fn wraps_midnight(&self) -> bool {
        self.start > self.end
    }

    /// Check if the given local datetime falls within this window
    pub fn contains(&self, dt: &DateTime<Local>) -> bool {
        let time = WallClock::from_naive_time(dt.time());

        if self.start <= self.end {
            time >= self.start && time < self.end
        } else {
            time >= self.start || time < self.end
        }
    }

    /// Duration until the window closes, or `None` when outside it.
    pub fn remaining_duration(&self, dt: &DateTime<Local>) -> Option<Duration> {
        if !self.contains(dt) {
            return None;
        }

        let now_secs = dt.time().num_seconds_from_midnight();
        let end_secs = self.end.as_seconds_from_midnight();

        let remaining_secs = if self.start <= self.end || now_secs < end_secs {
            end_secs.saturating_sub(now_secs)
        } else {
            // Evening portion of a wrapping window: until midnight, then the morning part
            (86_400 - now_secs) + end_secs
        };

        Some(Duration::from_secs(remaining_secs as u64))
    }

    /// When the window next opens. Returns `dt` itself if it is already open.
    pub fn next_opening(&self, dt: &DateTime<Local>) -> DateTime<Local> {
        if self.contains(dt) {
            *dt
        } else {
            self.start.next_after(dt)
        }
    }
}

impl Default for RebootWindow {
    fn default() -> Self {
        Self {
            start: WallClock { hour: 22, minute: 0 },
            end: WallClock { hour: 5, minute: 0 },
        }
    }
}

impl std::fmt::Display for RebootWindow {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}-{}", self.start, self.end)
    }
}

/// Helper to format durations in human-readable form
pub fn format_duration(d: Duration) -> String {
    let total_secs = d.as_secs();
    let days = total_secs / 86_400;
    let hours = (total_secs % 86_400) / 3600;
    let minutes = (total_secs % 3600) / 60;
    let seconds = total_secs % 60;

    if days > 0 {
        format!("{}d {}h {}m", days, hours, minutes)
    } else if hours > 0 {
        format!("{}h {}m {}s", hours, minutes, seconds)
    } else if minutes > 0 {
        format!("{}m {}s", minutes, seconds)
    } else {
        format!("{}s", seconds)
    }
}
