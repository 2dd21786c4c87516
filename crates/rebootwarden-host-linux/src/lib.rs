//! Linux host adapter for rebootwarden
//!
//! Provides:
//! - Uptime from `/proc/uptime`
//! - Exemption lookup through system group membership
//! - Desktop notifications (`notify-send`) and a time picker (`zenity`)
//! - Reboot via a configurable command, or a dry-run stand-in

mod command;
mod exemption;
mod notify;
mod reboot;
mod uptime;

pub use command::{run_checked, run_command};
pub use exemption::*;
pub use notify::*;
pub use reboot::*;
pub use uptime::*;
