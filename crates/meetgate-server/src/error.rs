//! Session error types.

use std::time::Duration;

use thiserror::Error;

use meetgate_core::MeetingKey;
use meetgate_providers::ProviderError;

/// Result type for session operations.
pub type SessionResult<T> = Result<T, SessionError>;

/// Errors that can occur while serving a join session.
#[derive(Debug, Error)]
pub enum SessionError {
    /// The meeting source failed.
    #[error("Provider error: {0}")]
    Provider(#[from] ProviderError),

    /// A call to the meeting source took too long.
    #[error("{operation} timed out after {}s", .after.as_secs())]
    Timeout {
        operation: &'static str,
        after: Duration,
    },

    /// The meeting no longer exists.
    #[error("Meeting {key} no longer exists")]
    MeetingGone { key: MeetingKey },

    /// The session has been stopped or its meeting deleted.
    #[error("Session is closed")]
    Closed,
}

impl SessionError {
    /// Creates a timeout error.
    pub fn timeout(operation: &'static str, after: Duration) -> Self {
        Self::Timeout { operation, after }
    }

    /// Returns true if retrying later may succeed.
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Provider(e) => e.is_retryable(),
            Self::Timeout { .. } => true,
            Self::MeetingGone { .. } | Self::Closed => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display() {
        let err = SessionError::timeout("refresh", Duration::from_secs(10));
        assert_eq!(err.to_string(), "refresh timed out after 10s");

        let err = SessionError::MeetingGone { key: MeetingKey(4) };
        assert_eq!(err.to_string(), "Meeting 4 no longer exists");
    }

    #[test]
    fn retryable() {
        assert!(SessionError::from(ProviderError::network("reset")).is_retryable());
        assert!(!SessionError::from(ProviderError::authentication("checksum")).is_retryable());
        assert!(SessionError::timeout("join", Duration::from_secs(1)).is_retryable());
        assert!(!SessionError::Closed.is_retryable());
    }
}
