//! Application-level error type for the binary.

use crate::config::ConfigError;
use crate::detect::DetectionError;
use crate::link::LinkError;
use crate::logging::LoggingError;
use crate::port::PortError;
use thiserror::Error;

/// Unified application error type.
#[derive(Debug, Error)]
pub enum AppError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Logging(#[from] LoggingError),

    #[error(transparent)]
    Detection(#[from] DetectionError),

    #[error(transparent)]
    Link(#[from] LinkError),

    #[error(transparent)]
    Port(#[from] PortError),

    #[error("Failed to encode output: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error("Background task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}

impl AppError {
    /// Process exit code for this error.
    pub fn exit_code(&self) -> u8 {
        match self {
            Self::Config(_) | Self::Logging(_) => 2,
            Self::Link(LinkError::Cancelled { .. }) => 130,
            _ => 1,
        }
    }
}
