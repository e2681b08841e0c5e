//! Error types for session construction and per-tick work.

use std::io;

use crate::sim::BodyHandle;

/// Invalid or unreadable gameplay tuning.
#[derive(thiserror::Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read tuning file: {0}")]
    Io(#[from] io::Error),

    #[error("Failed to parse tuning: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Invalid tuning value `{field}`: {reason}")]
    Invalid { field: &'static str, reason: String },
}

impl ConfigError {
    pub(crate) fn invalid(field: &'static str, reason: impl Into<String>) -> Self {
        Self::Invalid {
            field,
            reason: reason.into(),
        }
    }
}

/// Failures reported by a physics/rendering backend.
#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum PhysicsError {
    #[error("Unknown body {0:?}")]
    UnknownBody(BodyHandle),

    #[error("Body {0:?} already has physics attached")]
    AlreadyAttached(BodyHandle),

    #[error("Invalid body description: {0}")]
    InvalidBody(String),
}

/// Top-level error surfaced to the host.
#[derive(thiserror::Error, Debug)]
pub enum SessionError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Physics error: {0}")]
    Physics(#[from] PhysicsError),
}
