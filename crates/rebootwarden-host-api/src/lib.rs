//! Collaborator trait interfaces for rebootwarden
//!
//! This crate defines the boundary between the orchestrator and everything
//! that touches the operating system: clock, uptime, exemption lookup,
//! notification UI and the reboot command. It contains no platform code
//! itself, apart from a mock host for tests.

mod mock;
mod services;
mod traits;

pub use mock::*;
pub use services::*;
pub use traits::*;
