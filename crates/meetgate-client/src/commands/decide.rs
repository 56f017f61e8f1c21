//! `meetgate decide`: evaluate the join policy offline.

use std::fmt::Write as _;

use serde::Serialize;
use tracing::debug;

use meetgate_core::{AccessContext, JoinDecision, Meeting, MeetingStatus, decide, is_valid_window};

use crate::cli::DecideArgs;
use crate::config::ClientConfig;
use crate::error::{ClientError, ClientResult};
use crate::meeting_file;

/// Everything the command reports.
#[derive(Debug, Serialize)]
pub struct DecideReport {
    pub meeting: Meeting,
    pub role: meetgate_core::Role,
    pub decision: JoinDecision,
    pub status: MeetingStatus,
    pub valid_window: bool,
}

impl DecideReport {
    pub fn evaluate(meeting: Meeting, ctx: &AccessContext, running: bool) -> Self {
        Self {
            role: ctx.role(),
            decision: decide(&meeting, ctx, running),
            status: MeetingStatus::evaluate(&meeting, ctx.now, running),
            valid_window: is_valid_window(&meeting, ctx.now),
            meeting,
        }
    }

    /// Human-readable rendering.
    pub fn to_text(&self) -> String {
        let d = &self.decision;
        let mut out = String::new();
        let _ = writeln!(out, "{} ({})", self.meeting.name, self.meeting.key);
        if self.meeting.has_description()
            && let Some(ref description) = self.meeting.description
        {
            let _ = writeln!(out, "  {}", description.trim());
        }
        let _ = writeln!(out, "  role:         {:?}", self.role);
        let _ = writeln!(out, "  visible:      {}", yes_no(d.visible));
        let _ = writeln!(out, "  enabled:      {}", yes_no(d.enabled));
        let _ = writeln!(out, "  label:        {} ({})", d.label, d.label.i18n_key());
        if let Some(not_started) = d.not_started {
            let _ = writeln!(out, "  not started:  {}", yes_no(not_started));
        }
        let _ = writeln!(out, "  valid window: {}", yes_no(self.valid_window));
        let _ = writeln!(out, "  ended:        {}", yes_no(self.status.ended));
        let _ = writeln!(out, "  running:      {}", yes_no(self.status.running));
        let _ = write!(out, "  room created: {}", yes_no(self.status.meeting_exists));
        out
    }
}

fn yes_no(value: bool) -> &'static str {
    if value { "yes" } else { "no" }
}

/// Runs the command.
pub fn run(args: &DecideArgs, config: &ClientConfig) -> ClientResult<()> {
    let meeting = meeting_file::load(&args.meeting)?;
    let ctx = args.viewer.context(config.session.moderator_start_meeting);
    debug!(meeting = %meeting.key, role = ?ctx.role(), now = %ctx.now, "Evaluating join policy");

    let report = DecideReport::evaluate(meeting, &ctx, args.running);
    if args.json {
        let json = serde_json::to_string_pretty(&report)
            .map_err(|e| ClientError::Render(e.to_string()))?;
        println!("{}", json);
    } else {
        println!("{}", report.to_text());
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{DateTime, Duration, TimeZone, Utc};
    use meetgate_core::JoinLabel;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 3, 4, 12, 0, 0).unwrap()
    }

    fn finished() -> Meeting {
        Meeting::new(5, "Yesterday's exam review")
            .with_schedule(now() - Duration::days(1), now() - Duration::hours(23))
    }

    #[test]
    fn participant_report_on_finished_meeting() {
        let report = DecideReport::evaluate(finished(), &AccessContext::new(now()), false);
        assert!(!report.decision.visible);
        assert!(!report.decision.enabled);
        assert_eq!(report.decision.not_started, Some(false));
        assert!(report.status.ended);

        let text = report.to_text();
        assert!(text.starts_with("Yesterday's exam review (5)"));
        assert!(text.contains("not started:  no"));
        assert!(text.contains("ended:        yes"));
    }

    #[test]
    fn description_is_shown_when_present() {
        let ctx = AccessContext::new(now());
        let meeting = finished().with_description("  Bring your notes\n");
        let text = DecideReport::evaluate(meeting, &ctx, false).to_text();
        assert!(text.contains("\n  Bring your notes\n"));

        let blank = finished().with_description(" ");
        let lines = DecideReport::evaluate(blank, &ctx, false).to_text().lines().count();
        let none = DecideReport::evaluate(finished(), &ctx, false).to_text().lines().count();
        assert_eq!(lines, none);
    }

    #[test]
    fn moderator_report_has_no_not_started_line() {
        let ctx = AccessContext::new(now()).with_moderator(true);
        let report = DecideReport::evaluate(finished(), &ctx, false);
        assert!(report.decision.visible);
        assert_eq!(report.decision.label, JoinLabel::Go);
        assert!(!report.to_text().contains("not started"));
    }

    #[test]
    fn json_report_shape() {
        let ctx = AccessContext::new(now()).with_administrator(true);
        let report = DecideReport::evaluate(finished(), &ctx, true);
        let json = serde_json::to_value(&report).unwrap();

        assert_eq!(json["role"], "administrator");
        assert_eq!(json["decision"]["label"], "go");
        assert!(json["decision"].get("not_started").is_none());
        assert_eq!(json["status"]["running"], true);
        assert_eq!(json["meeting"]["key"], 5);
    }
}
