//! Shared domain types for rebootwarden
//!
//! This crate defines the vocabulary shared between the decision engine and
//! the host collaborators:
//! - Notification kinds and payloads
//! - User responses captured from a notification

mod notification;
mod response;

pub use notification::*;
pub use response::*;
