//! Client configuration.
//!
//! All settings live in a single `config.toml` file at
//! `~/.config/meetgate/config.toml` by default.
//!
//! The provider's `shared_secret` supports secret references:
//! - `pass::path/in/store` resolved via `pass show`
//! - `env::VAR_NAME` resolved from the environment
//! - plain text used as-is

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use meetgate_providers::ProviderSettings;
use meetgate_server::SessionConfig;

use crate::error::{ClientError, ClientResult};

// ---------------------------------------------------------------------------
// ClientConfig (config.toml)
// ---------------------------------------------------------------------------

/// Configuration for the meetgate client.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    /// Debug mode.
    pub debug: bool,

    /// Log output format: pretty, compact or json.
    pub log_format: Option<String>,

    /// Conferencing server settings.
    pub provider: Option<ProviderSettings>,

    /// Join session settings.
    pub session: SessionSettings,

    /// Secret kept outside the file. Replaces a placeholder `shared_secret`
    /// such as the one written by `config dump`.
    #[serde(skip)]
    pub stored_secret: Option<String>,
}

/// Join session settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionSettings {
    /// Participants wait until a moderator has started the meeting.
    pub moderator_start_meeting: bool,

    /// Timeout for a single provider call, in seconds.
    pub provider_timeout: u64,

    /// How long a reported running state is reused, in seconds.
    pub running_ttl: u64,
}

impl Default for SessionSettings {
    fn default() -> Self {
        let defaults = SessionConfig::default();
        Self {
            moderator_start_meeting: defaults.moderator_start_meeting,
            provider_timeout: defaults.provider_timeout.as_secs(),
            running_ttl: defaults.running_ttl.as_secs(),
        }
    }
}

impl SessionSettings {
    /// Converts to the runtime session configuration.
    pub fn to_session_config(&self) -> SessionConfig {
        SessionConfig::default()
            .with_moderator_start_meeting(self.moderator_start_meeting)
            .with_provider_timeout(Duration::from_secs(self.provider_timeout.max(1)))
            .with_running_ttl(Duration::from_secs(self.running_ttl))
    }
}

impl ClientConfig {
    /// Loads configuration from the default path, or defaults if there is no file.
    pub fn load() -> ClientResult<Self> {
        let path = Self::default_path();
        if path.exists() {
            Self::load_from(&path)
        } else {
            Ok(Self::default())
        }
    }

    /// Loads configuration from a specific path.
    pub fn load_from(path: &Path) -> ClientResult<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            ClientError::Config(format!("failed to read {}: {}", path.display(), e))
        })?;
        toml::from_str(&content).map_err(|e| {
            ClientError::Config(format!("failed to parse {}: {}", path.display(), e))
        })
    }

    /// Returns the default configuration file path.
    pub fn default_path() -> PathBuf {
        Self::default_config_dir().join("config.toml")
    }

    /// Returns the default configuration directory.
    pub fn default_config_dir() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("meetgate")
    }

    /// A copy safe to print, with the shared secret masked.
    ///
    /// Secret references are kept since they do not leak the secret.
    pub fn masked(&self) -> Self {
        let mut masked = self.clone();
        if let Some(provider) = masked.provider.as_mut()
            && !provider
                .shared_secret
                .as_deref()
                .is_some_and(crate::secret::is_reference)
        {
            *provider = provider.masked();
        }
        masked
    }

    /// Builder: set the secret that replaces a placeholder.
    pub fn with_stored_secret(mut self, secret: Option<String>) -> Self {
        self.stored_secret = secret;
        self
    }

    /// Returns the provider settings with the shared secret resolved.
    ///
    /// A placeholder secret is replaced by the stored secret; without one
    /// the settings end up with no secret at all.
    ///
    /// Returns `None` when no provider is configured or it is disabled.
    pub fn resolved_provider(&self) -> ClientResult<Option<ProviderSettings>> {
        let Some(provider) = self.provider.as_ref().filter(|p| p.enabled) else {
            return Ok(None);
        };

        let mut resolved = provider.clone();
        let stored = self
            .stored_secret
            .as_deref()
            .map(crate::secret::resolve)
            .transpose()?;
        resolved.merge_secret(stored.as_deref());

        if let Some(raw) = resolved.shared_secret.as_deref() {
            resolved.shared_secret = Some(crate::secret::resolve(raw)?);
        }
        Ok(Some(resolved))
    }
}
