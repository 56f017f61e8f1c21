//! Loading meetings from disk.
//!
//! Files ending in `.toml` are parsed as TOML, everything else as JSON.
//! Timestamps are RFC 3339 strings in both formats.

use std::path::Path;

use tracing::debug;

use meetgate_core::Meeting;

use crate::error::{ClientError, ClientResult};

/// Reads a meeting description.
pub fn load(path: &Path) -> ClientResult<Meeting> {
    let content =
        std::fs::read_to_string(path).map_err(|e| ClientError::meeting_file(path, e))?;
    let meeting = parse(path, &content)?;
    debug!(meeting = %meeting.key, path = %path.display(), "Loaded meeting");
    Ok(meeting)
}

fn parse(path: &Path, content: &str) -> ClientResult<Meeting> {
    let is_toml = path
        .extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("toml"));

    if is_toml {
        toml::from_str(content).map_err(|e| ClientError::meeting_file(path, e))
    } else {
        serde_json::from_str(content).map_err(|e| ClientError::meeting_file(path, e))
    }
}
