//! Session configuration.

use std::time::Duration;

/// Configuration shared by the join sessions of a process.
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// Participants wait until a moderator has started the meeting.
    pub moderator_start_meeting: bool,

    /// Upper bound for a single call to the meeting source.
    pub provider_timeout: Duration,

    /// How long a running state reported by the provider is reused.
    pub running_ttl: Duration,

    /// Capacity of the session command channel.
    pub command_buffer: usize,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            moderator_start_meeting: false,
            provider_timeout: Duration::from_secs(10),
            running_ttl: Duration::from_secs(15),
            command_buffer: 8,
        }
    }
}

impl SessionConfig {
    /// Builder: require a moderator to start meetings.
    pub fn with_moderator_start_meeting(mut self, moderator_start: bool) -> Self {
        self.moderator_start_meeting = moderator_start;
        self
    }

    /// Builder: set provider timeout.
    pub fn with_provider_timeout(mut self, timeout: Duration) -> Self {
        self.provider_timeout = timeout;
        self
    }

    /// Builder: set running-state TTL.
    pub fn with_running_ttl(mut self, ttl: Duration) -> Self {
        self.running_ttl = ttl;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config() {
        let config = SessionConfig::default();
        assert!(!config.moderator_start_meeting);
        assert_eq!(config.provider_timeout, Duration::from_secs(10));
        assert_eq!(config.running_ttl, Duration::from_secs(15));
        assert_eq!(config.command_buffer, 8);
    }

    #[test]
    fn custom_config() {
        let config = SessionConfig::default()
            .with_moderator_start_meeting(true)
            .with_provider_timeout(Duration::from_secs(3))
            .with_running_ttl(Duration::ZERO);

        assert!(config.moderator_start_meeting);
        assert_eq!(config.provider_timeout, Duration::from_secs(3));
        assert_eq!(config.running_ttl, Duration::ZERO);
    }
}
