//! Meeting types.
//!
//! This module provides the provider-agnostic representation of a scheduled
//! video-conference room:
//! - [`MeetingKey`]: The stable local identifier of a meeting
//! - [`Meeting`]: Name, schedule, grace offsets and the remote meeting id

use std::fmt;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

/// Stable local identifier of a meeting.
///
/// This is the key used for event routing; it never changes once the meeting
/// has been authored, unlike the remote meeting id which only exists while
/// the provider has a room for it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MeetingKey(pub u64);

impl fmt::Display for MeetingKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u64> for MeetingKey {
    fn from(key: u64) -> Self {
        Self(key)
    }
}

/// A meeting embedded in a course or group.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Meeting {
    /// Local identifier.
    pub key: MeetingKey,
    /// Human-readable name.
    pub name: String,
    /// Optional description shown next to the join action.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Scheduled start.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start: Option<DateTime<Utc>>,
    /// Scheduled end.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end: Option<DateTime<Utc>>,
    /// Minutes before `start` during which the meeting is already joinable.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lead_time: Option<u32>,
    /// Minutes after `end` during which the meeting is still joinable.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub followup_time: Option<u32>,
    /// A permanent meeting has no fixed schedule.
    #[serde(default)]
    pub permanent: bool,
    /// Identifier of the room on the provider side, once it has been created.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub meeting_id: Option<String>,
}

impl Meeting {
    /// Creates a new meeting without schedule.
    pub fn new(key: impl Into<MeetingKey>, name: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            name: name.into(),
            description: None,
            start: None,
            end: None,
            lead_time: None,
            followup_time: None,
            permanent: false,
            meeting_id: None,
        }
    }

    /// Builder method to set the description.
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Builder method to set the schedule.
    pub fn with_schedule(mut self, start: DateTime<Utc>, end: DateTime<Utc>) -> Self {
        self.start = Some(start);
        self.end = Some(end);
        self
    }

    /// Builder method to set only the start.
    pub fn with_start(mut self, start: DateTime<Utc>) -> Self {
        self.start = Some(start);
        self
    }

    /// Builder method to set only the end.
    pub fn with_end(mut self, end: DateTime<Utc>) -> Self {
        self.end = Some(end);
        self
    }

    /// Builder method to set lead and follow-up minutes.
    pub fn with_grace(mut self, lead_minutes: u32, followup_minutes: u32) -> Self {
        self.lead_time = Some(lead_minutes);
        self.followup_time = Some(followup_minutes);
        self
    }

    /// Builder method to mark the meeting as permanent.
    pub fn with_permanent(mut self, permanent: bool) -> Self {
        self.permanent = permanent;
        self
    }

    /// Builder method to set the remote meeting id.
    pub fn with_meeting_id(mut self, meeting_id: impl Into<String>) -> Self {
        self.meeting_id = Some(meeting_id.into());
        self
    }

    /// Returns true once the provider has created a room for this meeting.
    pub fn meeting_exists(&self) -> bool {
        self.meeting_id
            .as_deref()
            .is_some_and(|id| !id.trim().is_empty())
    }

    /// Returns true if the description has visible content.
    pub fn has_description(&self) -> bool {
        self.description
            .as_deref()
            .is_some_and(|d| !d.trim().is_empty())
    }

    /// The lead time as a duration (zero when unset).
    pub fn lead_duration(&self) -> Duration {
        Duration::minutes(i64::from(self.lead_time.unwrap_or(0)))
    }

    /// The follow-up time as a duration (zero when unset).
    pub fn followup_duration(&self) -> Duration {
        Duration::minutes(i64::from(self.followup_time.unwrap_or(0)))
    }

    /// Start minus lead time, if a start is scheduled.
    ///
    /// A lead time reaching past the earliest representable date leaves the
    /// window open at the start.
    pub fn start_with_lead_time(&self) -> Option<DateTime<Utc>> {
        self.start
            .and_then(|start| start.checked_sub_signed(self.lead_duration()))
    }

    /// End plus follow-up time, if an end is scheduled.
    ///
    /// A follow-up time reaching past the latest representable date leaves
    /// the window open at the end.
    pub fn end_with_followup_time(&self) -> Option<DateTime<Utc>> {
        self.end
            .and_then(|end| end.checked_add_signed(self.followup_duration()))
    }
}
