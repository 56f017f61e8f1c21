//! Configuration commands.

use tracing::debug;

use meetgate_core::TracingOutputFormat;
use meetgate_providers::MeetingStatusSource;

use crate::commands::join::configured_source;
use crate::config::ClientConfig;
use crate::error::{ClientError, ClientResult};

/// Renders the configuration as TOML with the shared secret masked.
pub fn render(config: &ClientConfig) -> ClientResult<String> {
    toml::to_string_pretty(&config.masked())
        .map_err(|e| ClientError::Config(format!("failed to serialize config: {}", e)))
}

/// Dump the current configuration to stdout.
pub fn dump(config: &ClientConfig) -> ClientResult<()> {
    println!("# config.toml ({})", ClientConfig::default_path().display());
    println!("{}", render(config)?);
    Ok(())
}

/// Checks the configuration and returns what was verified.
///
/// An enabled provider is also checked for a working connection with the
/// resolved shared secret.
pub async fn check(config: &ClientConfig) -> ClientResult<Vec<String>> {
    let source = configured_source(config.resolved_provider()?.as_ref()).ok();
    check_with(config, source.as_ref().map(|s| s as &dyn MeetingStatusSource)).await
}

async fn check_with(
    config: &ClientConfig,
    source: Option<&dyn MeetingStatusSource>,
) -> ClientResult<Vec<String>> {
    let mut checked = Vec::new();

    if let Some(ref format) = config.log_format {
        format.parse::<TracingOutputFormat>()?;
        checked.push(format!("log format '{}' is valid.", format));
    }

    if config.session.provider_timeout == 0 {
        return Err(ClientError::Config(
            "session.provider_timeout must be at least 1 second".to_string(),
        ));
    }

    let Some(ref provider) = config.provider else {
        checked.push("No provider configured; joins use a local in-memory server.".to_string());
        return Ok(checked);
    };
    if !provider.enabled {
        checked.push("Provider is disabled.".to_string());
        return Ok(checked);
    }

    provider.validate()?;
    let Some(resolved) = config.resolved_provider()? else {
        return Ok(checked);
    };
    checked.push("Provider settings are valid.".to_string());
    if provider.cleanup_meetings() {
        checked.push(format!(
            "Finished meetings are deleted after {} days.",
            provider.cleanup_days.unwrap_or_default()
        ));
    } else {
        checked.push("Finished meetings are kept.".to_string());
    }

    if resolved.shared_secret.is_none() {
        checked.push(
            "warning: shared_secret is the placeholder and will not authenticate.".to_string(),
        );
        return Ok(checked);
    }
    if provider.has_placeholder_secret() {
        checked.push("Placeholder shared_secret replaced by the stored secret.".to_string());
    }

    let Some(source) = source else {
        return Ok(checked);
    };
    let connection = source.check_connection(&resolved).await?;
    if !connection.is_successful() {
        let reasons: Vec<String> = connection.errors.iter().map(ToString::to_string).collect();
        return Err(ClientError::ConnectionCheck(if reasons.is_empty() {
            "server did not answer".to_string()
        } else {
            reasons.join("; ")
        }));
    }
    debug!(url = ?resolved.url, "Connection check succeeded");
    checked.push("Connection check succeeded.".to_string());

    Ok(checked)
}

/// Validate the configuration.
pub async fn validate(config: &ClientConfig) -> ClientResult<()> {
    for line in check(config).await? {
        println!("{}", line);
    }
    println!("Configuration is valid.");
    Ok(())
}

/// Show the configuration file path.
pub fn path() -> ClientResult<()> {
    let config_path = ClientConfig::default_path();
    println!("config: {}", config_path.display());
    Ok(())
}
