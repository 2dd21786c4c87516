//! Shared utilities for rebootwarden
//!
//! This crate provides:
//! - Run identifiers for correlating log lines of one invocation
//! - Time utilities (mockable wall clock, reboot windows, minute math)
//! - Error types
//! - Default paths for config and state

mod error;
mod ids;
mod paths;
mod time;

pub use error::*;
pub use ids::*;
pub use paths::*;
pub use time::*;
