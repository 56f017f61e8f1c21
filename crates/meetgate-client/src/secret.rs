//! Secret reference resolver.
//!
//! The shared secret in `config.toml` can point to a secret stored outside
//! the file:
//!
//! - `pass::path/in/store` runs `pass show path/in/store` and keeps the first line
//! - `env::VAR_NAME` reads `$VAR_NAME` from the environment
//! - anything else is taken as plain text

use thiserror::Error;

/// Errors raised while resolving a secret reference.
#[derive(Debug, Error)]
pub enum SecretError {
    #[error("failed to run `pass show {path}`: {source}")]
    PassSpawn {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("`pass show {path}` failed ({status}): {stderr}")]
    PassFailed {
        path: String,
        status: std::process::ExitStatus,
        stderr: String,
    },

    #[error("`pass show {path}` produced no output")]
    PassEmpty { path: String },

    #[error("environment variable `{var}` is not set")]
    EnvNotSet { var: String },
}

/// Returns true if the value is a reference rather than plain text.
pub fn is_reference(value: &str) -> bool {
    value.starts_with("pass::") || value.starts_with("env::")
}

/// Resolves a value that may contain a secret reference prefix.
pub fn resolve(value: &str) -> Result<String, SecretError> {
    if let Some(path) = value.strip_prefix("pass::") {
        resolve_pass(path)
    } else if let Some(var) = value.strip_prefix("env::") {
        resolve_env(var)
    } else {
        Ok(value.to_string())
    }
}

fn resolve_pass(path: &str) -> Result<String, SecretError> {
    let output = std::process::Command::new("pass")
        .arg("show")
        .arg(path)
        .output()
        .map_err(|source| SecretError::PassSpawn {
            path: path.to_string(),
            source,
        })?;

    if !output.status.success() {
        return Err(SecretError::PassFailed {
            path: path.to_string(),
            status: output.status,
            stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
        });
    }

    String::from_utf8_lossy(&output.stdout)
        .lines()
        .next()
        .map(str::to_string)
        .ok_or_else(|| SecretError::PassEmpty {
            path: path.to_string(),
        })
}

fn resolve_env(var: &str) -> Result<String, SecretError> {
    std::env::var(var).map_err(|_| SecretError::EnvNotSet {
        var: var.to_string(),
    })
}
