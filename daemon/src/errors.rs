//! Error types for the stackward daemon

use thiserror::Error;

/// Main error type for the daemon
#[derive(Error, Debug)]
pub enum DaemonError {
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("HTTP error: {0}")]
    HttpError(#[from] reqwest::Error),

    #[error("Authentication error: {0}")]
    AuthError(String),

    #[error("Management API error: {0}")]
    ApiError(String),

    #[error("Runtime error: {0}")]
    RuntimeError(String),

    #[error("MQTT error: {0}")]
    MqttError(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Shutdown error: {0}")]
    ShutdownError(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<anyhow::Error> for DaemonError {
    fn from(err: anyhow::Error) -> Self {
        DaemonError::Internal(err.to_string())
    }
}
