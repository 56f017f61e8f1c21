//! Client error types.

use std::path::PathBuf;

use thiserror::Error;

use meetgate_core::TracingError;
use meetgate_providers::{ProviderError, SettingsError};
use meetgate_server::SessionError;

use crate::secret::SecretError;

/// Result type for client operations.
pub type ClientResult<T> = Result<T, ClientError>;

/// Errors that can occur in the client.
#[derive(Debug, Error)]
pub enum ClientError {
    #[error("configuration error: {0}")]
    Config(String),

    #[error("invalid provider settings: {0}")]
    Settings(#[from] SettingsError),

    #[error("failed to resolve shared secret: {0}")]
    Secret(#[from] SecretError),

    #[error("cannot read meeting from {}: {message}", .path.display())]
    MeetingFile { path: PathBuf, message: String },

    #[error("provider error: {0}")]
    Provider(#[from] ProviderError),

    #[error("connection check failed: {0}")]
    ConnectionCheck(String),

    #[error("session error: {0}")]
    Session(#[from] SessionError),

    #[error("logging setup failed: {0}")]
    Tracing(#[from] TracingError),

    #[error("failed to render output: {0}")]
    Render(String),
}

impl ClientError {
    pub fn meeting_file(path: impl Into<PathBuf>, message: impl ToString) -> Self {
        Self::MeetingFile {
            path: path.into(),
            message: message.to_string(),
        }
    }
}
