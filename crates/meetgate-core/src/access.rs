//! Meeting access policy.
//!
//! Decides whether the join action of a meeting is shown, whether it can be
//! activated and which label it carries. Everything here is a pure function
//! of the meeting, the viewer's [`AccessContext`] and the running state the
//! provider last reported.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::meeting::Meeting;
use crate::time::AccessWindow;

/// The role a viewer holds for a meeting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Administrator,
    Moderator,
    Participant,
}

impl Role {
    /// Administrators and moderators may always reach the meeting.
    pub fn is_privileged(&self) -> bool {
        matches!(self, Self::Administrator | Self::Moderator)
    }
}

/// Who is looking at the meeting, and when.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccessContext {
    pub is_administrator: bool,
    pub is_moderator: bool,
    pub is_read_only: bool,
    pub is_guest: bool,
    /// Participants wait until a moderator has started the meeting.
    pub moderator_start_meeting: bool,
    /// Wall-clock time used for every date comparison.
    pub now: DateTime<Utc>,
}

impl AccessContext {
    /// Creates a participant context at the given time.
    pub fn new(now: DateTime<Utc>) -> Self {
        Self {
            is_administrator: false,
            is_moderator: false,
            is_read_only: false,
            is_guest: false,
            moderator_start_meeting: false,
            now,
        }
    }

    /// Builder method to set the administrator flag.
    pub fn with_administrator(mut self, administrator: bool) -> Self {
        self.is_administrator = administrator;
        self
    }

    /// Builder method to set the moderator flag.
    pub fn with_moderator(mut self, moderator: bool) -> Self {
        self.is_moderator = moderator;
        self
    }

    /// Builder method to set the read-only flag.
    pub fn with_read_only(mut self, read_only: bool) -> Self {
        self.is_read_only = read_only;
        self
    }

    /// Builder method to set the guest flag.
    pub fn with_guest(mut self, guest: bool) -> Self {
        self.is_guest = guest;
        self
    }

    /// Builder method to require a moderator to start the meeting.
    pub fn with_moderator_start_meeting(mut self, moderator_start: bool) -> Self {
        self.moderator_start_meeting = moderator_start;
        self
    }

    /// Builder method to move the clock.
    pub fn at(mut self, now: DateTime<Utc>) -> Self {
        self.now = now;
        self
    }

    /// The effective role. Administrator wins over moderator.
    pub fn role(&self) -> Role {
        if self.is_administrator {
            Role::Administrator
        } else if self.is_moderator {
            Role::Moderator
        } else {
            Role::Participant
        }
    }
}

/// The label of the join action.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JoinLabel {
    /// Join a meeting within its window.
    Join,
    /// Start a meeting that is not running yet.
    Start,
    /// Go to a meeting outside its window.
    Go,
}

impl JoinLabel {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Join => "join",
            Self::Start => "start",
            Self::Go => "go",
        }
    }

    /// The translation key used by presentation layers.
    pub fn i18n_key(&self) -> &'static str {
        match self {
            Self::Join => "meeting.join.button",
            Self::Start => "meeting.start.button",
            Self::Go => "meeting.go.button",
        }
    }
}

impl fmt::Display for JoinLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// How the join action should be rendered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct JoinDecision {
    pub visible: bool,
    pub enabled: bool,
    pub label: JoinLabel,
    /// Only computed for participants; `None` for privileged roles.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub not_started: Option<bool>,
}

/// Status facts shown next to the join action.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MeetingStatus {
    pub meeting_exists: bool,
    pub ended: bool,
    pub running: bool,
}

impl MeetingStatus {
    pub fn evaluate(meeting: &Meeting, now: DateTime<Utc>, running: bool) -> Self {
        Self {
            meeting_exists: meeting.meeting_exists(),
            ended: is_ended(meeting, now),
            running,
        }
    }
}

/// Returns true if the meeting has an end date and `now` is strictly after it.
///
/// Follow-up time is not considered.
pub fn is_ended(meeting: &Meeting, now: DateTime<Utc>) -> bool {
    meeting.end.is_some_and(|end| now > end)
}

/// Returns true if `now` lies within the meeting's access window.
///
/// Permanent meetings are always within their window.
pub fn is_valid_window(meeting: &Meeting, now: DateTime<Utc>) -> bool {
    AccessWindow::for_meeting(meeting).contains(now)
}

/// Returns true if the viewer may see the meeting at all.
pub fn is_accessible(meeting: &Meeting, ctx: &AccessContext) -> bool {
    !is_ended(meeting, ctx.now) || ctx.is_administrator || ctx.is_moderator
}

/// Computes how the join action is rendered for this viewer.
pub fn decide(meeting: &Meeting, ctx: &AccessContext, running: bool) -> JoinDecision {
    let now = ctx.now;
    let accessible = is_accessible(meeting, ctx);
    let waiting_for_moderator = !running && ctx.moderator_start_meeting;

    match ctx.role() {
        Role::Administrator | Role::Moderator => {
            let label = if waiting_for_moderator {
                JoinLabel::Start
            } else if is_valid_window(meeting, now) {
                JoinLabel::Join
            } else {
                JoinLabel::Go
            };

            JoinDecision {
                visible: accessible,
                enabled: !ctx.is_read_only,
                label,
                not_started: None,
            }
        }
        Role::Participant => {
            let valid_window = is_valid_window(meeting, now);
            let enabled = if waiting_for_moderator {
                false
            } else {
                !ctx.is_read_only && valid_window
            };

            let not_started = if valid_window && waiting_for_moderator {
                true
            } else if valid_window || is_ended(meeting, now) {
                false
            } else {
                true
            };

            JoinDecision {
                visible: accessible,
                enabled,
                label: JoinLabel::Join,
                not_started: Some(not_started),
            }
        }
    }
}
