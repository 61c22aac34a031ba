//! Error types for the relay.

use thiserror::Error;

/// The outbound transport cannot be used in the current execution context.
///
/// This is the only error on the relay path. It is logged and the beacon is
/// dropped; it never reaches the host's beacon pipeline.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("transport unavailable: {reason}")]
pub struct TransportUnavailable {
    pub reason: String,
}

impl TransportUnavailable {
    pub fn new(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
        }
    }
}

/// Errors raised while validating relay configuration.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Invalid forward target '{target}': {reason}")]
    InvalidTarget { target: String, reason: String },
}

pub type Result<T> = std::result::Result<T, ConfigError>;
