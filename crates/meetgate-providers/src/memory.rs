//! In-memory meeting source.
//!
//! Behaves like a small conferencing server: moderators start meetings by
//! joining them, attendees can only join running meetings. Used by tests and
//! by the CLI when no server is configured.

use std::collections::HashMap;

use tokio::sync::RwLock;
use tracing::debug;
use url::Url;

use meetgate_core::{Meeting, MeetingKey};

use crate::error::{ProviderError, ProviderErrors, ProviderResult};
use crate::settings::ProviderSettings;
use crate::source::{BoxFuture, ConnectionCheck, JoinOutcome, JoinRequest, MeetingStatusSource};

#[derive(Debug, Default)]
struct Inner {
    meetings: HashMap<MeetingKey, Meeting>,
    running: HashMap<MeetingKey, bool>,
    join_failures: HashMap<MeetingKey, ProviderError>,
    joins: Vec<(MeetingKey, JoinRequest)>,
    refreshes: usize,
}

/// A [`MeetingStatusSource`] backed by a map.
#[derive(Debug)]
pub struct InMemorySource {
    base_url: Url,
    shared_secret: String,
    inner: RwLock<Inner>,
}

impl InMemorySource {
    pub const NAME: &'static str = "memory";

    /// Creates a source answering for the given server.
    pub fn new(base_url: Url, shared_secret: impl Into<String>) -> Self {
        Self {
            base_url,
            shared_secret: shared_secret.into(),
            inner: RwLock::new(Inner::default()),
        }
    }

    /// Inserts or replaces a meeting.
    pub async fn insert_meeting(&self, meeting: Meeting) {
        self.inner.write().await.meetings.insert(meeting.key, meeting);
    }

    /// Deletes a meeting.
    pub async fn remove_meeting(&self, key: MeetingKey) -> Option<Meeting> {
        let mut inner = self.inner.write().await;
        inner.running.remove(&key);
        inner.meetings.remove(&key)
    }

    /// Sets the running state reported for a meeting.
    pub async fn set_running(&self, key: MeetingKey, running: bool) {
        self.inner.write().await.running.insert(key, running);
    }

    /// Makes every join of this meeting fail with the given error.
    pub async fn fail_joins(&self, key: MeetingKey, error: ProviderError) {
        self.inner.write().await.join_failures.insert(key, error);
    }

    /// Join calls received so far.
    pub async fn joins(&self) -> Vec<(MeetingKey, JoinRequest)> {
        self.inner.read().await.joins.clone()
    }

    /// Number of `get_meeting` calls received so far.
    pub async fn refresh_count(&self) -> usize {
        self.inner.read().await.refreshes
    }

    fn join_url(&self, meeting_id: &str, request: &JoinRequest) -> String {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map(|mut segments| {
                segments.pop_if_empty().extend(["api", "join"]);
            })
            .ok();
        url.query_pairs_mut()
            .append_pair("meetingID", meeting_id)
            .append_pair("fullName", &request.identity.display_name)
            .append_pair("userID", &request.identity.key.to_string())
            .append_pair("role", if request.moderator { "MODERATOR" } else { "VIEWER" });
        if request.guest {
            url.query_pairs_mut().append_pair("guest", "true");
        }
        url.into()
    }
}

impl MeetingStatusSource for InMemorySource {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn get_meeting<'a>(&'a self, meeting: &'a Meeting) -> BoxFuture<'a, ProviderResult<Option<Meeting>>> {
        Box::pin(async move {
            let mut inner = self.inner.write().await;
            inner.refreshes += 1;
            Ok(inner.meetings.get(&meeting.key).cloned())
        })
    }

    fn is_meeting_running<'a>(&'a self, meeting: &'a Meeting) -> BoxFuture<'a, ProviderResult<bool>> {
        Box::pin(async move {
            let inner = self.inner.read().await;
            Ok(inner.running.get(&meeting.key).copied().unwrap_or(false))
        })
    }

    fn join<'a>(
        &'a self,
        meeting: &'a Meeting,
        request: &'a JoinRequest,
    ) -> BoxFuture<'a, ProviderResult<JoinOutcome>> {
        Box::pin(async move {
            let mut guard = self.inner.write().await;
            let inner = &mut *guard;
            inner.joins.push((meeting.key, request.clone()));

            if let Some(error) = inner.join_failures.get(&meeting.key) {
                let error = error.detached().with_provider(Self::NAME);
                return Ok(JoinOutcome::with_errors(ProviderErrors::from(error)));
            }

            let Some(stored) = inner.meetings.get_mut(&meeting.key) else {
                let error = ProviderError::not_found(format!("meeting {} does not exist", meeting.key));
                return Ok(JoinOutcome::with_errors(error.into()));
            };

            let running = inner.running.get(&meeting.key).copied().unwrap_or(false);
            if !running && !request.moderator {
                let error = ProviderError::server("meeting has not been started by a moderator");
                return Ok(JoinOutcome::with_errors(error.into()));
            }

            if !stored.meeting_exists() {
                stored.meeting_id = Some(format!("meeting-{}", meeting.key));
            }
            let meeting_id = stored.meeting_id.clone().unwrap_or_default();
            inner.running.insert(meeting.key, true);

            debug!(meeting = %meeting.key, moderator = request.moderator, "join URL issued");
            Ok(JoinOutcome::with_url(self.join_url(&meeting_id, request)))
        })
    }

    fn check_connection<'a>(
        &'a self,
        settings: &'a ProviderSettings,
    ) -> BoxFuture<'a, ProviderResult<ConnectionCheck>> {
        Box::pin(async move {
            let url = settings
                .base_url()
                .map_err(|e| ProviderError::configuration(e.to_string()))?;

            let mut check = ConnectionCheck::default();
            if url.host_str() != self.base_url.host_str() {
                check
                    .errors
                    .push(ProviderError::network(format!("no server answering at {}", url)));
                return Ok(check);
            }

            check.reachable = true;
            if settings.shared_secret.as_deref() != Some(self.shared_secret.as_str()) {
                check
                    .errors
                    .push(ProviderError::authentication("checksum error"));
            }
            Ok(check)
        })
    }
}
