//! Access windows for scheduled meetings.
//!
//! An [`AccessWindow`] is the span during which a meeting may be joined: the
//! scheduled start minus lead time up to the scheduled end plus follow-up time.
//! Either side may be open.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::meeting::Meeting;

/// A possibly unbounded half-open interval `[start, end)` in UTC.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccessWindow {
    /// Start of the window (inclusive). `None` means no lower bound.
    pub start: Option<DateTime<Utc>>,
    /// End of the window (exclusive). `None` means no upper bound.
    pub end: Option<DateTime<Utc>>,
}

impl AccessWindow {
    /// Creates a new window from optional bounds.
    pub fn new(start: Option<DateTime<Utc>>, end: Option<DateTime<Utc>>) -> Self {
        Self { start, end }
    }

    /// A window without any bound.
    pub fn unbounded() -> Self {
        Self::default()
    }

    /// The window during which a meeting is joinable.
    ///
    /// Permanent meetings get an unbounded window whatever their dates say.
    pub fn for_meeting(meeting: &Meeting) -> Self {
        if meeting.permanent {
            return Self::unbounded();
        }
        Self::new(meeting.start_with_lead_time(), meeting.end_with_followup_time())
    }

    /// Returns true if neither bound is set.
    pub fn is_unbounded(&self) -> bool {
        self.start.is_none() && self.end.is_none()
    }

    /// Returns true if `now` is strictly before the start.
    pub fn is_before_start(&self, now: DateTime<Utc>) -> bool {
        self.start.is_some_and(|start| now < start)
    }

    /// Returns true if `now` is at or after the end.
    pub fn is_past_end(&self, now: DateTime<Utc>) -> bool {
        self.end.is_some_and(|end| now >= end)
    }

    /// Checks if `now` falls within this window.
    pub fn contains(&self, now: DateTime<Utc>) -> bool {
        !(self.is_before_start(now) || self.is_past_end(now))
    }
}
