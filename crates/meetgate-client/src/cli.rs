//! Command-line interface definition.

use std::path::PathBuf;

use chrono::{DateTime, Utc};
use clap::{Args, Parser, Subcommand};

use meetgate_core::AccessContext;

/// meetgate - Who may join a meeting, and how
#[derive(Debug, Parser)]
#[command(name = "meetgate")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Path to configuration file
    #[arg(long, short, env = "MEETGATE_CONFIG")]
    pub config: Option<PathBuf>,

    /// Enable debug output
    #[arg(long, short = 'v')]
    pub debug: bool,

    /// Log format: pretty, compact or json
    #[arg(long, env = "MEETGATE_LOG_FORMAT")]
    pub log_format: Option<String>,

    /// Shared secret used when the config file holds the placeholder
    #[arg(long, env = "MEETGATE_SHARED_SECRET", hide_env_values = true)]
    pub shared_secret: Option<String>,

    #[command(subcommand)]
    pub command: Command,
}

/// Available commands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Show how the join action is rendered for a viewer
    Decide(DecideArgs),

    /// Open a join session against an in-memory server and join
    Join(JoinArgs),

    /// Configuration commands
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

/// Who is looking at the meeting.
#[derive(Debug, Clone, Default, Args)]
pub struct ViewerArgs {
    /// Viewer administers the meeting's course or group
    #[arg(long)]
    pub administrator: bool,

    /// Viewer moderates the meeting
    #[arg(long)]
    pub moderator: bool,

    /// Viewer only has read access
    #[arg(long)]
    pub read_only: bool,

    /// Viewer is an anonymous guest
    #[arg(long)]
    pub guest: bool,

    /// Participants wait until a moderator started the meeting
    /// (defaults to the config file setting)
    #[arg(long)]
    pub moderator_start: bool,

    /// Evaluate at this instant instead of now (RFC 3339)
    #[arg(long, value_parser = parse_instant)]
    pub now: Option<DateTime<Utc>>,
}

impl ViewerArgs {
    /// Builds the access context. `moderator_start_default` comes from the
    /// configuration and can only be switched on by the flag.
    pub fn context(&self, moderator_start_default: bool) -> AccessContext {
        AccessContext::new(self.now.unwrap_or_else(Utc::now))
            .with_administrator(self.administrator)
            .with_moderator(self.moderator)
            .with_read_only(self.read_only)
            .with_guest(self.guest)
            .with_moderator_start_meeting(self.moderator_start || moderator_start_default)
    }
}

/// Arguments of `meetgate decide`.
#[derive(Debug, Args)]
pub struct DecideArgs {
    /// Meeting file (JSON or TOML)
    pub meeting: PathBuf,

    #[command(flatten)]
    pub viewer: ViewerArgs,

    /// The meeting currently runs on the server
    #[arg(long)]
    pub running: bool,

    /// Output in JSON format
    #[arg(long)]
    pub json: bool,
}

/// Arguments of `meetgate join`.
#[derive(Debug, Args)]
pub struct JoinArgs {
    /// Meeting file (JSON or TOML)
    pub meeting: PathBuf,

    #[command(flatten)]
    pub viewer: ViewerArgs,

    /// Numeric id of the joining user
    #[arg(long, default_value_t = 1)]
    pub user_id: u64,

    /// Display name of the joining user
    #[arg(long, default_value = "meetgate")]
    pub name: String,

    /// A moderator already started the meeting
    #[arg(long)]
    pub running: bool,

    /// Output in JSON format
    #[arg(long)]
    pub json: bool,
}

/// Configuration actions.
#[derive(Debug, Subcommand)]
pub enum ConfigAction {
    /// Dump current configuration
    Dump,

    /// Validate configuration
    Validate,

    /// Show configuration file path
    Path,
}

fn parse_instant(value: &str) -> Result<DateTime<Utc>, String> {
    DateTime::parse_from_rfc3339(value)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| format!("expected an RFC 3339 timestamp: {}", e))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use clap::CommandFactory;

    #[test]
    fn cli_is_well_formed() {
        Cli::command().debug_assert();
    }

    #[test]
    fn parse_decide() {
        let cli = Cli::try_parse_from([
            "meetgate",
            "decide",
            "meeting.json",
            "--moderator",
            "--running",
            "--now",
            "2025-03-04T12:00:00+01:00",
            "--json",
        ])
        .unwrap();

        let Command::Decide(args) = cli.command else {
            panic!("expected decide");
        };
        assert!(args.viewer.moderator);
        assert!(args.running);
        assert!(args.json);
        assert_eq!(
            args.viewer.now,
            Some(Utc.with_ymd_and_hms(2025, 3, 4, 11, 0, 0).unwrap())
        );
    }

    #[test]
    fn reject_bad_instant() {
        let result = Cli::try_parse_from(["meetgate", "decide", "m.json", "--now", "tomorrow"]);
        assert!(result.is_err());
    }

    #[test]
    fn viewer_context_merges_config_default() {
        let viewer = ViewerArgs {
            guest: true,
            ..Default::default()
        };
        let ctx = viewer.context(true);
        assert!(ctx.moderator_start_meeting);
        assert!(ctx.is_guest);
        assert!(!ctx.is_moderator);

        assert!(!viewer.context(false).moderator_start_meeting);
    }

    #[test]
    fn parse_join_defaults() {
        let cli = Cli::try_parse_from(["meetgate", "join", "m.toml"]).unwrap();
        let Command::Join(args) = cli.command else {
            panic!("expected join");
        };
        assert_eq!(args.user_id, 1);
        assert_eq!(args.name, "meetgate");
        assert!(!args.running);
    }

    #[test]
    fn parse_shared_secret() {
        let cli = Cli::try_parse_from([
            "meetgate",
            "--shared-secret",
            "s3cret",
            "config",
            "validate",
        ])
        .unwrap();
        assert_eq!(cli.shared_secret.as_deref(), Some("s3cret"));
    }
}
