//! `meetgate join`: dry-run the join flow.
//!
//! Opens a join session against an in-memory server seeded with the meeting
//! and prints what the viewer would get. When a provider is configured its
//! URL and shared secret are used for the generated join links.

use std::sync::Arc;

use chrono::Utc;
use serde::Serialize;
use tracing::{debug, info, warn};
use url::Url;

use meetgate_core::{JoinDecision, Meeting};
use meetgate_providers::{Identity, InMemorySource, ProviderSettings};
use meetgate_server::{
    JoinResult, JoinSession, ManualClock, MeetingEventBus, SessionServices, Viewer,
};

use crate::cli::JoinArgs;
use crate::config::ClientConfig;
use crate::error::{ClientError, ClientResult};
use crate::meeting_file;

const LOCAL_SERVER: &str = "http://localhost/bigbluebutton/";
const LOCAL_SECRET: &str = "meetgate-local";

/// Outcome of a dry-run join.
#[derive(Debug, Serialize)]
pub struct JoinReport {
    pub decision: JoinDecision,
    #[serde(flatten)]
    pub outcome: JoinReportOutcome,
}

#[derive(Debug, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum JoinReportOutcome {
    Redirect { url: String },
    Failed { errors: Vec<String> },
    NoAccess,
    MeetingGone,
}

impl From<JoinResult> for JoinReportOutcome {
    fn from(result: JoinResult) -> Self {
        match result {
            JoinResult::Redirect(url) => Self::Redirect { url },
            JoinResult::Failed(errors) => Self::Failed {
                errors: errors.iter().map(ToString::to_string).collect(),
            },
            JoinResult::NoAccess => Self::NoAccess,
            JoinResult::MeetingGone => Self::MeetingGone,
        }
    }
}

impl JoinReport {
    pub fn to_text(&self) -> String {
        match &self.outcome {
            JoinReportOutcome::Redirect { url } => format!("redirect: {}", url),
            JoinReportOutcome::Failed { errors } => format!("failed: {}", errors.join("; ")),
            JoinReportOutcome::NoAccess => {
                if self.decision.not_started == Some(true) {
                    "no access: the meeting has not been started yet".to_string()
                } else {
                    "no access".to_string()
                }
            }
            JoinReportOutcome::MeetingGone => "the meeting no longer exists".to_string(),
        }
    }
}

/// Builds the in-memory server from the resolved provider settings, if any.
pub fn configured_source(provider: Option<&ProviderSettings>) -> ClientResult<InMemorySource> {
    match provider {
        Some(settings) => {
            settings.validate()?;
            let url = settings.base_url()?;
            let secret = settings.shared_secret.clone().unwrap_or_default();
            Ok(InMemorySource::new(url, secret))
        }
        None => {
            let url = Url::parse(LOCAL_SERVER).map_err(|e| ClientError::Config(e.to_string()))?;
            Ok(InMemorySource::new(url, LOCAL_SECRET))
        }
    }
}

/// Runs the join flow for one meeting and viewer.
pub async fn dry_run(
    meeting: Meeting,
    args: &JoinArgs,
    config: &ClientConfig,
) -> ClientResult<JoinReport> {
    let provider = config.resolved_provider()?;
    let source = Arc::new(configured_source(provider.as_ref())?);
    source.insert_meeting(meeting.clone()).await;
    source.set_running(meeting.key, args.running).await;

    let mut session_config = config.session.to_session_config();
    if args.viewer.moderator_start {
        session_config = session_config.with_moderator_start_meeting(true);
    }
    let now = args.viewer.now.unwrap_or_else(Utc::now);
    let services = SessionServices::new(source.clone(), MeetingEventBus::default(), session_config)
        .with_clock(Arc::new(ManualClock::new(now)));

    let viewer = Viewer::participant(Identity::new(args.user_id, args.name.clone()))
        .with_administrator(args.viewer.administrator)
        .with_moderator(args.viewer.moderator)
        .with_read_only(args.viewer.read_only)
        .with_guest(args.viewer.guest);

    let session = JoinSession::open(&services, meeting, viewer).await;
    let handle = session.handle();
    let task = tokio::spawn(session.run());

    let decision = handle.decision().await;
    debug!(
        visible = decision.visible,
        enabled = decision.enabled,
        label = %decision.label,
        "Join decision"
    );

    let result = handle.join().await;
    handle.stop().await;
    if let Err(e) = task.await {
        warn!(error = %e, "Join session task failed");
    }

    let outcome = JoinReportOutcome::from(result?);
    info!(outcome = ?outcome, "Dry-run join finished");
    Ok(JoinReport { decision, outcome })
}

/// Runs the command.
pub async fn run(args: &JoinArgs, config: &ClientConfig) -> ClientResult<()> {
    let meeting = meeting_file::load(&args.meeting)?;
    let report = dry_run(meeting, args, config).await?;

    if args.json {
        let json = serde_json::to_string_pretty(&report)
            .map_err(|e| ClientError::Render(e.to_string()))?;
        println!("{}", json);
    } else {
        println!("{}", report.to_text());
    }
    Ok(())
}
