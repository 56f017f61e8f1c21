//! Conferencing provider settings.
//!
//! The settings an administrator enters to connect the platform to a
//! conferencing server: base URL, shared secret, where the integration is
//! offered and how long finished meetings are kept.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use url::Url;

/// Value shown instead of a stored shared secret.
///
/// Submitting it back means "keep the secret that is already stored".
pub const SECRET_PLACEHOLDER: &str = "xxx-placeholder-xxx";

/// Retention periods (in days) offered for finished meetings.
pub const CLEANUP_DAYS: [u32; 9] = [1, 2, 3, 4, 5, 7, 14, 21, 30];

/// Errors found while validating [`ProviderSettings`].
#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("{field} is mandatory")]
    Missing { field: &'static str },

    #[error("invalid URL '{url}': {source}")]
    InvalidUrl {
        url: String,
        #[source]
        source: url::ParseError,
    },

    #[error("URL '{url}' has no host")]
    MissingHost { url: String },

    #[error("cleanup after {days} days is not supported (allowed: 1, 2, 3, 4, 5, 7, 14, 21, 30)")]
    UnsupportedCleanupDays { days: u32 },
}

/// Settings of the conferencing provider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProviderSettings {
    pub enabled: bool,
    /// Base URL of the conferencing server API.
    pub url: Option<String>,
    /// Shared secret used to sign API calls.
    pub shared_secret: Option<String>,
    /// Offer meetings in courses.
    pub courses_enabled: bool,
    /// Offer meetings in groups.
    pub groups_enabled: bool,
    /// Delete finished meetings after this many days; `None` keeps them.
    pub cleanup_days: Option<u32>,
    /// Request timeout in seconds.
    pub timeout_secs: u64,
}

impl Default for ProviderSettings {
    fn default() -> Self {
        Self {
            enabled: false,
            url: None,
            shared_secret: None,
            courses_enabled: true,
            groups_enabled: true,
            cleanup_days: None,
            timeout_secs: 30,
        }
    }
}

impl ProviderSettings {
    /// Creates enabled settings for the given server.
    pub fn new(url: impl Into<String>, shared_secret: impl Into<String>) -> Self {
        Self {
            enabled: true,
            url: Some(url.into()),
            shared_secret: Some(shared_secret.into()),
            ..Default::default()
        }
    }

    pub fn with_courses_enabled(mut self, enabled: bool) -> Self {
        self.courses_enabled = enabled;
        self
    }

    pub fn with_groups_enabled(mut self, enabled: bool) -> Self {
        self.groups_enabled = enabled;
        self
    }

    pub fn with_cleanup_days(mut self, days: Option<u32>) -> Self {
        self.cleanup_days = days;
        self
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// Returns true if finished meetings are deleted after a while.
    pub fn cleanup_meetings(&self) -> bool {
        self.cleanup_days.is_some()
    }

    /// Validates the settings. Disabled settings are always valid.
    ///
    /// # Errors
    ///
    /// Returns the first problem found, checking the URL first.
    pub fn validate(&self) -> Result<(), SettingsError> {
        if !self.enabled {
            return Ok(());
        }

        self.base_url()?;

        if !has_content(self.shared_secret.as_deref()) {
            return Err(SettingsError::Missing {
                field: "shared_secret",
            });
        }

        if let Some(days) = self.cleanup_days
            && !CLEANUP_DAYS.contains(&days)
        {
            return Err(SettingsError::UnsupportedCleanupDays { days });
        }

        Ok(())
    }

    /// Parses the base URL.
    ///
    /// # Errors
    ///
    /// Fails if the URL is blank, unparseable or has no host.
    pub fn base_url(&self) -> Result<Url, SettingsError> {
        let raw = self
            .url
            .as_deref()
            .map(str::trim)
            .filter(|u| !u.is_empty())
            .ok_or(SettingsError::Missing { field: "url" })?;

        let url = Url::parse(raw).map_err(|source| SettingsError::InvalidUrl {
            url: raw.to_string(),
            source,
        })?;
        if url.host_str().is_none_or(str::is_empty) {
            return Err(SettingsError::MissingHost {
                url: raw.to_string(),
            });
        }
        Ok(url)
    }

    /// Returns true if the shared secret is the placeholder.
    pub fn has_placeholder_secret(&self) -> bool {
        self.shared_secret.as_deref() == Some(SECRET_PLACEHOLDER)
    }

    /// Replaces a placeholder secret with the stored one.
    ///
    /// A new secret entered by the administrator is kept as is.
    pub fn merge_secret(&mut self, stored: Option<&str>) {
        if self.has_placeholder_secret() {
            self.shared_secret = stored.filter(|s| has_content(Some(s))).map(str::to_string);
        }
    }

    /// A copy safe to display, with the secret replaced by the placeholder.
    pub fn masked(&self) -> Self {
        let mut masked = self.clone();
        if has_content(masked.shared_secret.as_deref()) {
            masked.shared_secret = Some(SECRET_PLACEHOLDER.to_string());
        }
        masked
    }

    /// Turns the integration off and forgets the server credentials.
    pub fn disable(&mut self) {
        self.enabled = false;
        self.url = None;
        self.shared_secret = None;
    }
}

fn has_content(value: Option<&str>) -> bool {
    value.is_some_and(|v| !v.trim().is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn valid() -> ProviderSettings {
        ProviderSettings::new("https://bbb.example.com/bigbluebutton/", "s3cret")
    }

    #[test]
    fn defaults() {
        let settings = ProviderSettings::default();
        assert!(!settings.enabled);
        assert!(settings.courses_enabled);
        assert!(settings.groups_enabled);
        assert!(!settings.cleanup_meetings());
        assert_eq!(settings.timeout(), Duration::from_secs(30));
    }

    #[test]
    fn disabled_settings_skip_validation() {
        assert!(ProviderSettings::default().validate().is_ok());
    }

    #[test]
    fn valid_settings() {
        let settings = valid().with_cleanup_days(Some(14));
        assert!(settings.validate().is_ok());
        assert_eq!(settings.base_url().unwrap().host_str(), Some("bbb.example.com"));
    }

    #[test]
    fn url_is_mandatory() {
        let mut settings = valid();
        settings.url = Some("  ".to_string());
        assert!(matches!(
            settings.validate(),
            Err(SettingsError::Missing { field: "url" })
        ));
    }

    #[test]
    fn url_must_parse() {
        let mut settings = valid();
        settings.url = Some("not a url".to_string());
        assert!(matches!(
            settings.validate(),
            Err(SettingsError::InvalidUrl { .. })
        ));
    }

    #[test]
    fn url_needs_host() {
        let mut settings = valid();
        settings.url = Some("mailto:admin@example.com".to_string());
        assert!(matches!(
            settings.validate(),
            Err(SettingsError::MissingHost { .. })
        ));
    }

    #[test]
    fn secret_is_mandatory() {
        let mut settings = valid();
        settings.shared_secret = Some(" ".to_string());
        let err = settings.validate().unwrap_err();
        assert_eq!(err.to_string(), "shared_secret is mandatory");
    }

    #[test]
    fn cleanup_days_must_be_offered() {
        let settings = valid().with_cleanup_days(Some(6));
        assert!(matches!(
            settings.validate(),
            Err(SettingsError::UnsupportedCleanupDays { days: 6 })
        ));
    }

    #[test]
    fn placeholder_keeps_stored_secret() {
        let mut settings = valid();
        settings.shared_secret = Some(SECRET_PLACEHOLDER.to_string());
        assert!(settings.has_placeholder_secret());

        settings.merge_secret(Some("stored"));
        assert_eq!(settings.shared_secret.as_deref(), Some("stored"));
    }

    #[test]
    fn new_secret_wins_over_stored() {
        let mut settings = valid();
        settings.merge_secret(Some("stored"));
        assert_eq!(settings.shared_secret.as_deref(), Some("s3cret"));
    }

    #[test]
    fn masked_hides_secret() {
        let masked = valid().masked();
        assert_eq!(masked.shared_secret.as_deref(), Some(SECRET_PLACEHOLDER));
        assert_eq!(masked.url, valid().url);

        let empty = ProviderSettings::default().masked();
        assert!(empty.shared_secret.is_none());
    }

    #[test]
    fn disable_clears_credentials() {
        let mut settings = valid();
        settings.disable();
        assert!(!settings.enabled);
        assert!(settings.url.is_none());
        assert!(settings.shared_secret.is_none());
    }
}
