//! Join sessions.
//!
//! A [`JoinSession`] is what one viewer sees of one meeting: the current
//! [`JoinDecision`], the status facts around it, and the join action. The
//! session subscribes to the [`MeetingEventBus`] when it opens; each
//! notification for its meeting triggers a refresh through the
//! [`MeetingStatusSource`] and a new decision.
//!
//! Once [`JoinSession::run`] has been spawned, the session is driven through
//! its [`SessionHandle`].

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use tokio::sync::{RwLock, mpsc, oneshot};
use tracing::{debug, info, warn};

use meetgate_core::{AccessContext, JoinDecision, Meeting, MeetingKey, MeetingStatus, decide};
use meetgate_providers::{
    Identity, JoinRequest, MeetingStatusSource, ProviderErrors, ProviderResult,
};

use crate::bus::{MeetingEvent, MeetingEventBus, MeetingSubscription, Notification};
use crate::cache::{SharedRunningCache, new_running_cache};
use crate::clock::{Clock, SystemClock};
use crate::config::SessionConfig;
use crate::error::{SessionError, SessionResult};

/// The person looking at a meeting and their rights on it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Viewer {
    pub identity: Identity,
    pub is_administrator: bool,
    pub is_moderator: bool,
    pub is_read_only: bool,
    pub is_guest: bool,
}

impl Viewer {
    /// A participant without special rights.
    pub fn participant(identity: Identity) -> Self {
        Self {
            identity,
            is_administrator: false,
            is_moderator: false,
            is_read_only: false,
            is_guest: false,
        }
    }

    pub fn with_administrator(mut self, administrator: bool) -> Self {
        self.is_administrator = administrator;
        self
    }

    pub fn with_moderator(mut self, moderator: bool) -> Self {
        self.is_moderator = moderator;
        self
    }

    pub fn with_read_only(mut self, read_only: bool) -> Self {
        self.is_read_only = read_only;
        self
    }

    pub fn with_guest(mut self, guest: bool) -> Self {
        self.is_guest = guest;
        self
    }

    pub fn is_privileged(&self) -> bool {
        self.is_administrator || self.is_moderator
    }

    /// The access context at the given time.
    pub fn context(&self, moderator_start_meeting: bool, now: DateTime<Utc>) -> AccessContext {
        AccessContext::new(now)
            .with_administrator(self.is_administrator)
            .with_moderator(self.is_moderator)
            .with_read_only(self.is_read_only)
            .with_guest(self.is_guest)
            .with_moderator_start_meeting(moderator_start_meeting)
    }
}

/// What a join attempt produced.
#[derive(Debug)]
pub enum JoinResult {
    /// Send the viewer to this URL.
    Redirect(String),
    /// The provider refused; show these errors.
    Failed(ProviderErrors),
    /// Nothing to join (meeting not started, or the provider gave no URL).
    NoAccess,
    /// The meeting was deleted in the meantime.
    MeetingGone,
}

/// Current state of a session.
#[derive(Debug, Clone)]
pub struct SessionState {
    pub meeting: Meeting,
    pub status: MeetingStatus,
    pub decision: JoinDecision,
    /// When the decision was last computed.
    pub computed_at: DateTime<Utc>,
    /// Last problem talking to the meeting source, if the last computation
    /// had one.
    pub last_error: Option<String>,
    pub closed: bool,
}

/// Shared session state.
pub type SharedSessionState = Arc<RwLock<SessionState>>;

/// Dependencies shared by all sessions of a process.
#[derive(Clone)]
pub struct SessionServices {
    source: Arc<dyn MeetingStatusSource>,
    bus: MeetingEventBus,
    clock: Arc<dyn Clock>,
    cache: SharedRunningCache,
    config: SessionConfig,
}

impl SessionServices {
    /// Creates services using the system clock.
    pub fn new(source: Arc<dyn MeetingStatusSource>, bus: MeetingEventBus, config: SessionConfig) -> Self {
        let cache = new_running_cache(config.running_ttl);
        Self {
            source,
            bus,
            clock: Arc::new(SystemClock),
            cache,
            config,
        }
    }

    /// Builder: use another clock.
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn bus(&self) -> &MeetingEventBus {
        &self.bus
    }

    pub fn cache(&self) -> &SharedRunningCache {
        &self.cache
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }
}

/// Commands accepted by a running session.
#[derive(Debug)]
pub enum SessionCommand {
    Refresh {
        reply: oneshot::Sender<SessionResult<JoinDecision>>,
    },
    Join {
        reply: oneshot::Sender<SessionResult<JoinResult>>,
    },
    Stop,
}

/// One viewer's view of one meeting.
pub struct JoinSession {
    key: MeetingKey,
    viewer: Viewer,
    services: SessionServices,
    state: SharedSessionState,
    subscription: Option<MeetingSubscription>,
    command_tx: mpsc::Sender<SessionCommand>,
    command_rx: Option<mpsc::Receiver<SessionCommand>>,
}

impl JoinSession {
    /// Opens a session: subscribes to the meeting's events and computes the
    /// initial decision.
    pub async fn open(services: &SessionServices, meeting: Meeting, viewer: Viewer) -> Self {
        let key = meeting.key;
        let subscription = services.bus.subscribe(key);
        let (command_tx, command_rx) = mpsc::channel(services.config.command_buffer.max(1));

        let (running, last_error) = running_state(services, &meeting).await;
        let state = compute_state(services, &viewer, meeting, running, last_error);
        debug!(
            meeting = %key,
            identity = viewer.identity.key,
            visible = state.decision.visible,
            enabled = state.decision.enabled,
            label = %state.decision.label,
            "Session opened"
        );

        Self {
            key,
            viewer,
            services: services.clone(),
            state: Arc::new(RwLock::new(state)),
            subscription: Some(subscription),
            command_tx,
            command_rx: Some(command_rx),
        }
    }

    pub fn meeting_key(&self) -> MeetingKey {
        self.key
    }

    pub fn viewer(&self) -> &Viewer {
        &self.viewer
    }

    /// Returns a handle for driving the session once it runs.
    pub fn handle(&self) -> SessionHandle {
        SessionHandle {
            command_tx: self.command_tx.clone(),
            state: self.state.clone(),
        }
    }

    pub async fn state(&self) -> SessionState {
        self.state.read().await.clone()
    }

    pub async fn decision(&self) -> JoinDecision {
        self.state.read().await.decision
    }

    /// Reloads the meeting and recomputes the decision.
    ///
    /// # Errors
    ///
    /// Fails if the session is closed, the meeting is gone, or the meeting
    /// could not be reloaded.
    pub async fn refresh(&self) -> SessionResult<JoinDecision> {
        let meeting = self.reload().await?;
        Ok(self.recompute(meeting).await)
    }

    /// Asks the provider for a join URL.
    ///
    /// The meeting is reloaded and the decision recomputed first; nothing is
    /// sent to the provider unless the join action is visible and enabled.
    /// Moderators and administrators join with moderator rights and their
    /// join is announced on the bus.
    ///
    /// # Errors
    ///
    /// Fails if the session is closed or the meeting source could not be
    /// reached.
    pub async fn join(&self) -> SessionResult<JoinResult> {
        let meeting = match self.reload().await {
            Ok(meeting) => meeting,
            Err(SessionError::MeetingGone { .. }) => return Ok(JoinResult::MeetingGone),
            Err(e) => return Err(e),
        };

        let decision = self.recompute(meeting.clone()).await;
        if !(decision.visible && decision.enabled) {
            debug!(
                meeting = %self.key,
                identity = self.viewer.identity.key,
                visible = decision.visible,
                enabled = decision.enabled,
                "Join action not available"
            );
            return Ok(JoinResult::NoAccess);
        }

        let timeout = self.services.config.provider_timeout;
        let source = &self.services.source;

        let outcome = if self.viewer.is_privileged() {
            let request = JoinRequest::moderator(self.viewer.identity.clone());
            let outcome = with_timeout("join", timeout, source.join(&meeting, &request)).await?;
            self.services.cache.write().await.invalidate(self.key);
            self.services
                .bus
                .publish(MeetingEvent::opened(self.key, self.viewer.identity.key));
            outcome
        } else {
            let request = JoinRequest::attendee(self.viewer.identity.clone(), self.viewer.is_guest);
            with_timeout("join", timeout, source.join(&meeting, &request)).await?
        };

        if outcome.errors.has_errors() {
            warn!(meeting = %self.key, errors = %outcome.errors, "Join refused by provider");
            return Ok(JoinResult::Failed(outcome.errors));
        }

        match outcome.url.filter(|url| !url.trim().is_empty()) {
            Some(url) => {
                info!(
                    meeting = %self.key,
                    identity = self.viewer.identity.key,
                    moderator = self.viewer.is_privileged(),
                    "Join URL issued"
                );
                Ok(JoinResult::Redirect(url))
            }
            None => {
                debug!(meeting = %self.key, identity = self.viewer.identity.key, "Provider gave no join URL");
                Ok(JoinResult::NoAccess)
            }
        }
    }

    /// Runs the session until it is stopped, its meeting is deleted or the
    /// bus goes away. Dropping out of the loop releases the subscription.
    pub async fn run(mut self) {
        let Some(mut subscription) = self.subscription.take() else {
            return;
        };
        let Some(mut command_rx) = self.command_rx.take() else {
            return;
        };

        debug!(meeting = %self.key, identity = self.viewer.identity.key, "Session running");

        loop {
            tokio::select! {
                notification = subscription.next() => {
                    match notification {
                        Some(Notification::Changed(event)) => {
                            debug!(meeting = %self.key, kind = ?event.kind, "Meeting changed");
                            self.services.cache.write().await.invalidate(self.key);
                            self.refresh_logged().await;
                        }
                        Some(Notification::Lagged(_)) => {
                            self.services.cache.write().await.invalidate(self.key);
                            self.refresh_logged().await;
                        }
                        None => {
                            debug!(meeting = %self.key, "Event bus closed");
                            break;
                        }
                    }
                }
                command = command_rx.recv() => {
                    match command {
                        Some(SessionCommand::Refresh { reply }) => {
                            let _ = reply.send(self.refresh().await);
                        }
                        Some(SessionCommand::Join { reply }) => {
                            let _ = reply.send(self.join().await);
                        }
                        Some(SessionCommand::Stop) | None => {
                            debug!(meeting = %self.key, "Session stopping");
                            break;
                        }
                    }
                }
            }

            if self.state.read().await.closed {
                break;
            }
        }

        self.state.write().await.closed = true;
        info!(meeting = %self.key, identity = self.viewer.identity.key, "Session closed");
    }

    /// Stores the reloaded meeting with a fresh decision.
    async fn recompute(&self, meeting: Meeting) -> JoinDecision {
        let (running, last_error) = running_state(&self.services, &meeting).await;
        let state = compute_state(&self.services, &self.viewer, meeting, running, last_error);
        let decision = state.decision;
        *self.state.write().await = state;

        debug!(
            meeting = %self.key,
            running,
            visible = decision.visible,
            enabled = decision.enabled,
            label = %decision.label,
            "Session refreshed"
        );
        decision
    }

    async fn refresh_logged(&self) {
        match self.refresh().await {
            Ok(_) => {}
            Err(SessionError::MeetingGone { .. }) => {
                info!(meeting = %self.key, "Meeting deleted, closing session");
            }
            Err(e) => {
                warn!(meeting = %self.key, error = %e, "Session refresh failed");
                self.state.write().await.last_error = Some(e.to_string());
            }
        }
    }

    /// Reloads the meeting; marks the session closed if it is gone.
    async fn reload(&self) -> SessionResult<Meeting> {
        let current = {
            let state = self.state.read().await;
            if state.closed {
                return Err(SessionError::Closed);
            }
            state.meeting.clone()
        };

        let timeout = self.services.config.provider_timeout;
        match with_timeout("refresh", timeout, self.services.source.get_meeting(&current)).await? {
            Some(meeting) => Ok(meeting),
            None => {
                warn!(meeting = %self.key, "Meeting no longer exists");
                self.state.write().await.closed = true;
                Err(SessionError::MeetingGone { key: self.key })
            }
        }
    }
}

/// Handle for driving a running session.
#[derive(Clone, Debug)]
pub struct SessionHandle {
    command_tx: mpsc::Sender<SessionCommand>,
    state: SharedSessionState,
}

impl SessionHandle {
    /// Reloads the meeting and returns the new decision.
    pub async fn refresh(&self) -> SessionResult<JoinDecision> {
        let (reply, rx) = oneshot::channel();
        self.send(SessionCommand::Refresh { reply }).await?;
        rx.await.map_err(|_| SessionError::Closed)?
    }

    /// Performs the join action.
    pub async fn join(&self) -> SessionResult<JoinResult> {
        let (reply, rx) = oneshot::channel();
        self.send(SessionCommand::Join { reply }).await?;
        rx.await.map_err(|_| SessionError::Closed)?
    }

    /// Stops the session. Stopping a closed session is a no-op.
    pub async fn stop(&self) {
        let _ = self.command_tx.send(SessionCommand::Stop).await;
    }

    pub async fn state(&self) -> SessionState {
        self.state.read().await.clone()
    }

    pub async fn decision(&self) -> JoinDecision {
        self.state.read().await.decision
    }

    pub async fn is_closed(&self) -> bool {
        self.state.read().await.closed
    }

    async fn send(&self, command: SessionCommand) -> SessionResult<()> {
        self.command_tx
            .send(command)
            .await
            .map_err(|_| SessionError::Closed)
    }
}

async fn with_timeout<T>(
    operation: &'static str,
    timeout: Duration,
    call: impl Future<Output = ProviderResult<T>>,
) -> SessionResult<T> {
    match tokio::time::timeout(timeout, call).await {
        Ok(result) => Ok(result?),
        Err(_) => Err(SessionError::timeout(operation, timeout)),
    }
}

/// Running state of the meeting, from the cache or the provider.
///
/// A failed check counts as "not running".
async fn running_state(services: &SessionServices, meeting: &Meeting) -> (bool, Option<String>) {
    let cached = services.cache.read().await.get_valid(meeting.key);
    if let Some(running) = cached {
        return (running, None);
    }

    let timeout = services.config.provider_timeout;
    match with_timeout("running check", timeout, services.source.is_meeting_running(meeting)).await {
        Ok(running) => {
            let mut cache = services.cache.write().await;
            cache.evict_expired();
            cache.insert(meeting.key, running);
            (running, None)
        }
        Err(e) => {
            warn!(meeting = %meeting.key, error = %e, "Running check failed, assuming not running");
            (false, Some(e.to_string()))
        }
    }
}

fn compute_state(
    services: &SessionServices,
    viewer: &Viewer,
    meeting: Meeting,
    running: bool,
    last_error: Option<String>,
) -> SessionState {
    let now = services.clock.now();
    let ctx = viewer.context(services.config.moderator_start_meeting, now);
    SessionState {
        status: MeetingStatus::evaluate(&meeting, now, running),
        decision: decide(&meeting, &ctx, running),
        meeting,
        computed_at: now,
        last_error,
        closed: false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use meetgate_core::JoinLabel;
    use meetgate_providers::{
        BoxFuture, ErrorSource, InMemorySource, JoinOutcome, ProviderError, ProviderErrorCode,
    };
    use url::Url;

    use crate::clock::ManualClock;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 3, 4, 12, 0, 0).unwrap()
    }

    /// A meeting running from 11:30 to 12:30.
    fn lecture() -> Meeting {
        Meeting::new(1, "Lecture").with_schedule(
            now() - chrono::Duration::minutes(30),
            now() + chrono::Duration::minutes(30),
        )
    }

    fn memory_source() -> Arc<InMemorySource> {
        Arc::new(InMemorySource::new(
            Url::parse("https://bbb.example.com/bigbluebutton/").unwrap(),
            "s3cret",
        ))
    }

    fn services(source: Arc<dyn MeetingStatusSource>, moderator_start: bool) -> SessionServices {
        let config = SessionConfig::default()
            .with_moderator_start_meeting(moderator_start)
            .with_provider_timeout(Duration::from_secs(5));
        SessionServices::new(source, MeetingEventBus::default(), config)
            .with_clock(Arc::new(ManualClock::new(now())))
    }

    fn student() -> Viewer {
        Viewer::participant(Identity::new(100, "Student"))
    }

    fn lecturer() -> Viewer {
        Viewer::participant(Identity::new(1, "Lecturer")).with_moderator(true)
    }

    async fn wait_for<F>(handle: &SessionHandle, mut predicate: F) -> SessionState
    where
        F: FnMut(&SessionState) -> bool,
    {
        for _ in 0..200 {
            let state = handle.state().await;
            if predicate(&state) {
                return state;
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
        panic!("session never reached the expected state");
    }

    #[tokio::test]
    async fn open_computes_initial_decision() {
        let source = memory_source();
        source.insert_meeting(lecture()).await;
        let services = services(source.clone(), true);

        let session = JoinSession::open(&services, lecture(), student()).await;
        let state = session.state().await;

        assert!(state.decision.visible);
        assert!(!state.decision.enabled);
        assert_eq!(state.decision.not_started, Some(true));
        assert!(!state.status.running);
        assert!(!state.status.meeting_exists);
        assert!(state.last_error.is_none());
        assert_eq!(services.bus().subscriber_count(), 1);
    }

    #[tokio::test]
    async fn moderator_sees_start_label() {
        let source = memory_source();
        source.insert_meeting(lecture()).await;
        let services = services(source.clone(), true);

        let session = JoinSession::open(&services, lecture(), lecturer()).await;
        assert_eq!(session.decision().await.label, JoinLabel::Start);
    }

    #[tokio::test]
    async fn participant_waiting_for_moderator_gets_no_access() {
        let source = memory_source();
        source.insert_meeting(lecture()).await;
        let services = services(source.clone(), true);

        let session = JoinSession::open(&services, lecture(), student()).await;
        assert!(matches!(session.join().await.unwrap(), JoinResult::NoAccess));
        assert!(source.joins().await.is_empty());
    }

    #[tokio::test]
    async fn participant_joins_without_moderator_policy() {
        let source = memory_source();
        source.insert_meeting(lecture()).await;
        source.set_running(MeetingKey(1), true).await;
        let services = services(source.clone(), false);

        let session = JoinSession::open(&services, lecture(), student().with_guest(true)).await;
        let JoinResult::Redirect(url) = session.join().await.unwrap() else {
            panic!("expected a redirect");
        };
        assert!(url.contains("role=VIEWER"));

        let joins = source.joins().await;
        assert_eq!(joins.len(), 1);
        assert!(!joins[0].1.moderator);
        assert!(joins[0].1.guest);
    }

    #[tokio::test]
    async fn provider_refusal_is_reported() {
        let source = memory_source();
        source.insert_meeting(lecture()).await;
        let services = services(source.clone(), false);

        // Not running: the provider refuses attendees.
        let session = JoinSession::open(&services, lecture(), student()).await;
        let JoinResult::Failed(errors) = session.join().await.unwrap() else {
            panic!("expected a failure");
        };
        assert!(errors.contains_code(ProviderErrorCode::ServerError));
    }

    #[tokio::test]
    async fn moderator_join_wakes_up_participants() {
        let source = memory_source();
        source.insert_meeting(lecture()).await;
        let services = services(source.clone(), true);

        let participant = JoinSession::open(&services, lecture(), student()).await;
        let handle = participant.handle();
        assert!(!handle.decision().await.enabled);
        let task = tokio::spawn(participant.run());

        let moderator = JoinSession::open(&services, lecture(), lecturer()).await;
        let JoinResult::Redirect(url) = moderator.join().await.unwrap() else {
            panic!("expected a redirect");
        };
        assert!(url.contains("role=MODERATOR"));

        let state = wait_for(&handle, |s| s.decision.enabled).await;
        assert!(state.status.running);
        assert!(state.status.meeting_exists);
        assert_eq!(state.decision.not_started, Some(false));

        assert!(matches!(handle.join().await.unwrap(), JoinResult::Redirect(_)));

        handle.stop().await;
        task.await.unwrap();
        assert!(handle.is_closed().await);
    }

    #[tokio::test]
    async fn handle_refresh_recomputes() {
        let source = memory_source();
        source.insert_meeting(lecture()).await;
        let services = services(source.clone(), false);

        let session = JoinSession::open(&services, lecture(), student()).await;
        let handle = session.handle();
        let task = tokio::spawn(session.run());

        source
            .insert_meeting(lecture().with_meeting_id("room-1"))
            .await;
        handle.refresh().await.unwrap();
        assert!(handle.state().await.status.meeting_exists);

        handle.stop().await;
        task.await.unwrap();
        assert!(matches!(handle.refresh().await, Err(SessionError::Closed)));
    }

    #[tokio::test]
    async fn deleted_meeting_closes_session() {
        let source = memory_source();
        source.insert_meeting(lecture()).await;
        let services = services(source.clone(), false);

        let session = JoinSession::open(&services, lecture(), student()).await;
        let handle = session.handle();
        let task = tokio::spawn(session.run());

        source.remove_meeting(MeetingKey(1)).await;
        services.bus().publish(MeetingEvent::deleted(MeetingKey(1)));

        task.await.unwrap();
        assert!(handle.is_closed().await);
        assert!(matches!(handle.join().await, Err(SessionError::Closed)));
        assert_eq!(services.bus().subscriber_count(), 0);
    }

    #[tokio::test]
    async fn join_on_deleted_meeting() {
        let source = memory_source();
        let services = services(source.clone(), false);

        let session = JoinSession::open(&services, lecture(), lecturer()).await;
        assert!(matches!(session.join().await.unwrap(), JoinResult::MeetingGone));
        assert!(session.state().await.closed);
        assert!(matches!(session.refresh().await, Err(SessionError::Closed)));
    }

    #[tokio::test]
    async fn failing_running_check_counts_as_stopped() {
        let source = Arc::new(ErrorSource::new(
            "bigbluebutton",
            ProviderError::network("connection refused"),
        ));
        let services = services(source, false);

        let session = JoinSession::open(&services, lecture(), student()).await;
        let state = session.state().await;
        assert!(!state.status.running);
        assert!(state.decision.enabled);
        assert!(state.last_error.unwrap().contains("connection refused"));

        let err = session.join().await.unwrap_err();
        assert!(err.is_retryable());
    }

    mod join_gate {
        use super::*;

        #[tokio::test]
        async fn read_only_participant_gets_no_url() {
            let source = memory_source();
            source.insert_meeting(lecture()).await;
            source.set_running(MeetingKey(1), true).await;
            let services = services(source.clone(), false);

            let session = JoinSession::open(&services, lecture(), student().with_read_only(true)).await;
            assert!(!session.decision().await.enabled);

            assert!(matches!(session.join().await.unwrap(), JoinResult::NoAccess));
            assert!(source.joins().await.is_empty());
        }

        #[tokio::test]
        async fn read_only_moderator_does_not_start_meeting() {
            let source = memory_source();
            source.insert_meeting(lecture()).await;
            let services = services(source.clone(), true);
            let mut events = services.bus().subscribe(MeetingKey(1));

            let session = JoinSession::open(&services, lecture(), lecturer().with_read_only(true)).await;
            assert!(session.decision().await.visible);
            assert!(!session.decision().await.enabled);

            assert!(matches!(session.join().await.unwrap(), JoinResult::NoAccess));
            assert!(source.joins().await.is_empty());
            assert!(!source.is_meeting_running(&lecture()).await.unwrap());

            services.bus().publish(MeetingEvent::updated(MeetingKey(1)));
            assert_eq!(
                events.next().await,
                Some(Notification::Changed(MeetingEvent::updated(MeetingKey(1))))
            );
        }

        #[tokio::test]
        async fn ended_meeting_is_closed_to_participants() {
            let yesterday = Meeting::new(1, "Lecture").with_schedule(
                now() - chrono::Duration::days(1),
                now() - chrono::Duration::hours(23),
            );
            let source = memory_source();
            source.insert_meeting(yesterday.clone()).await;
            source.set_running(MeetingKey(1), true).await;
            let services = services(source.clone(), false);

            let session = JoinSession::open(&services, yesterday, student()).await;
            let decision = session.decision().await;
            assert!(!decision.visible);
            assert!(!decision.enabled);

            assert!(matches!(session.join().await.unwrap(), JoinResult::NoAccess));
            assert!(source.joins().await.is_empty());
        }

        #[tokio::test]
        async fn join_uses_reloaded_meeting() {
            let source = memory_source();
            source.insert_meeting(lecture()).await;
            let services = services(source.clone(), false);

            let session = JoinSession::open(&services, lecture(), student()).await;
            // Rescheduled to tomorrow in the meantime.
            let tomorrow = lecture().with_schedule(
                now() + chrono::Duration::days(1),
                now() + chrono::Duration::days(1) + chrono::Duration::hours(1),
            );
            source.insert_meeting(tomorrow.clone()).await;

            assert!(matches!(session.join().await.unwrap(), JoinResult::NoAccess));
            let state = session.state().await;
            assert_eq!(state.meeting, tomorrow);
            assert_eq!(state.decision.not_started, Some(true));
            assert!(source.joins().await.is_empty());
        }
    }

    #[tokio::test]
    async fn expired_running_states_are_evicted() {
        let source = memory_source();
        let config = SessionConfig::default().with_running_ttl(Duration::ZERO);
        let services = SessionServices::new(source, MeetingEventBus::default(), config)
            .with_clock(Arc::new(ManualClock::new(now())));

        let _first = JoinSession::open(&services, Meeting::new(1, "a"), student()).await;
        let _second = JoinSession::open(&services, Meeting::new(2, "b"), student()).await;

        let cache = services.cache().read().await;
        assert_eq!(cache.len(), 1);
        assert!(cache.get(MeetingKey(2)).is_some());
    }

    #[tokio::test]
    async fn running_state_is_cached() {
        let source = memory_source();
        source.insert_meeting(lecture()).await;
        let services = services(source.clone(), false);

        let first = JoinSession::open(&services, lecture(), student()).await;
        assert!(!first.state().await.status.running);

        // The provider changes its answer, but the cached one is reused.
        source.set_running(MeetingKey(1), true).await;
        let second = JoinSession::open(&services, lecture(), student()).await;
        assert!(!second.state().await.status.running);

        services.cache().write().await.invalidate(MeetingKey(1));
        assert!(second.refresh().await.is_ok());
        assert!(second.state().await.status.running);
    }

    struct StalledSource;

    impl MeetingStatusSource for StalledSource {
        fn name(&self) -> &str {
            "stalled"
        }

        fn get_meeting<'a>(&'a self, meeting: &'a Meeting) -> BoxFuture<'a, ProviderResult<Option<Meeting>>> {
            Box::pin(async move { Ok(Some(meeting.clone())) })
        }

        fn is_meeting_running<'a>(&'a self, _meeting: &'a Meeting) -> BoxFuture<'a, ProviderResult<bool>> {
            Box::pin(async {
                tokio::time::sleep(Duration::from_secs(3600)).await;
                Ok(true)
            })
        }

        fn join<'a>(
            &'a self,
            _meeting: &'a Meeting,
            _request: &'a JoinRequest,
        ) -> BoxFuture<'a, ProviderResult<JoinOutcome>> {
            Box::pin(async {
                tokio::time::sleep(Duration::from_secs(3600)).await;
                Ok(JoinOutcome::default())
            })
        }
    }

    #[tokio::test(start_paused = true)]
    async fn stalled_provider_times_out() {
        let services = services(Arc::new(StalledSource), false);

        let session = JoinSession::open(&services, lecture(), lecturer()).await;
        let state = session.state().await;
        assert!(!state.status.running);
        assert!(state.last_error.unwrap().contains("timed out"));

        let err = session.join().await.unwrap_err();
        assert!(matches!(err, SessionError::Timeout { operation: "join", .. }));
    }
}
