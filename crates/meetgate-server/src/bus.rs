//! Meeting event bus.
//!
//! Publishes meeting state changes to every open session. Subscriptions are
//! keyed by meeting: a subscriber only sees notifications for its own
//! meeting and re-fetches state when one arrives.

use tokio::sync::broadcast;
use tracing::{debug, warn};

use meetgate_core::MeetingKey;

/// What happened to a meeting.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MeetingEventKind {
    /// Someone opened the meeting room (usually a moderator starting it).
    Opened,
    /// Metadata or running state changed.
    Updated,
    /// The meeting was deleted.
    Deleted,
}

/// A state-change notification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MeetingEvent {
    pub meeting_key: MeetingKey,
    /// Who caused the change, if known.
    pub identity_key: Option<u64>,
    pub kind: MeetingEventKind,
}

impl MeetingEvent {
    pub fn opened(meeting_key: MeetingKey, identity_key: u64) -> Self {
        Self {
            meeting_key,
            identity_key: Some(identity_key),
            kind: MeetingEventKind::Opened,
        }
    }

    pub fn updated(meeting_key: MeetingKey) -> Self {
        Self {
            meeting_key,
            identity_key: None,
            kind: MeetingEventKind::Updated,
        }
    }

    pub fn deleted(meeting_key: MeetingKey) -> Self {
        Self {
            meeting_key,
            identity_key: None,
            kind: MeetingEventKind::Deleted,
        }
    }
}

/// What a subscription yields.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notification {
    /// An event for the subscribed meeting.
    Changed(MeetingEvent),
    /// The subscriber fell behind and missed this many events; state may
    /// have changed.
    Lagged(u64),
}

/// Broadcast channel for meeting events.
///
/// Cloning the bus yields another handle to the same channel.
#[derive(Debug, Clone)]
pub struct MeetingEventBus {
    tx: broadcast::Sender<MeetingEvent>,
}

impl Default for MeetingEventBus {
    fn default() -> Self {
        Self::new(Self::DEFAULT_CAPACITY)
    }
}

impl MeetingEventBus {
    pub const DEFAULT_CAPACITY: usize = 64;

    /// Creates a bus buffering up to `capacity` events per subscriber.
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity.max(1));
        Self { tx }
    }

    /// Publishes an event. Returns the number of subscriptions it reached.
    pub fn publish(&self, event: MeetingEvent) -> usize {
        let meeting = event.meeting_key;
        let kind = event.kind;
        match self.tx.send(event) {
            Ok(receivers) => {
                debug!(meeting = %meeting, ?kind, receivers, "Published meeting event");
                receivers
            }
            Err(_) => {
                debug!(meeting = %meeting, ?kind, "No subscriber for meeting event");
                0
            }
        }
    }

    /// Subscribes to the events of one meeting.
    pub fn subscribe(&self, meeting_key: MeetingKey) -> MeetingSubscription {
        MeetingSubscription {
            meeting_key,
            rx: self.tx.subscribe(),
        }
    }

    /// Number of live subscriptions, across all meetings.
    pub fn subscriber_count(&self) -> usize {
        self.tx.receiver_count()
    }
}

/// A subscription to the events of one meeting.
///
/// Dropping it deregisters the subscriber.
#[derive(Debug)]
pub struct MeetingSubscription {
    meeting_key: MeetingKey,
    rx: broadcast::Receiver<MeetingEvent>,
}

impl MeetingSubscription {
    pub fn meeting_key(&self) -> MeetingKey {
        self.meeting_key
    }

    /// Waits for the next notification for this meeting.
    ///
    /// Returns `None` once every bus handle has been dropped.
    pub async fn next(&mut self) -> Option<Notification> {
        loop {
            match self.rx.recv().await {
                Ok(event) if event.meeting_key == self.meeting_key => {
                    return Some(Notification::Changed(event));
                }
                Ok(_) => continue,
                Err(broadcast::error::RecvError::Lagged(missed)) => {
                    warn!(meeting = %self.meeting_key, missed, "Meeting subscription lagged");
                    return Some(Notification::Lagged(missed));
                }
                Err(broadcast::error::RecvError::Closed) => return None,
            }
        }
    }
}
