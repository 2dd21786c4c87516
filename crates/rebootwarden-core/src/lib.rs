//! Reboot decision engine and run orchestration for rebootwarden
//!
//! This crate contains:
//! - The pure decision engine (notify, reboot or do nothing)
//! - Deadline computation and correction of persisted state
//! - The orchestrator that runs one evaluation against host collaborators

mod deadline;
mod decision;
mod orchestrator;
mod outcome;

pub use deadline::*;
pub use decision::*;
pub use orchestrator::*;
pub use outcome::*;
