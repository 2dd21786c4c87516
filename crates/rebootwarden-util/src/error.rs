//! Error types for rebootwarden

use thiserror::Error;

/// Error type for the shared utilities
#[derive(Debug, Error)]
pub enum WardenError {
    #[error("Invalid time '{value}': {message}")]
    InvalidTime { value: String, message: String },
}

impl WardenError {
    pub fn invalid_time(value: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidTime {
            value: value.into(),
            message: message.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, WardenError>;
