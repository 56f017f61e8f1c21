//! MeetingStatusSource trait definition.
//!
//! This module defines [`MeetingStatusSource`], the abstraction over the
//! conferencing backend (BigBlueButton and the like). A source is
//! responsible for:
//! - Refreshing meeting metadata from the platform's store
//! - Reporting whether a meeting currently runs on the provider
//! - Producing a personal join URL
//! - Checking that a server URL and shared secret work together

use std::future::Future;
use std::pin::Pin;

use meetgate_core::Meeting;

use crate::error::{ProviderError, ProviderErrors, ProviderResult};
use crate::settings::ProviderSettings;

/// The person asking to join.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
    pub key: u64,
    pub display_name: String,
}

impl Identity {
    pub fn new(key: u64, display_name: impl Into<String>) -> Self {
        Self {
            key,
            display_name: display_name.into(),
        }
    }
}

/// Parameters of a join call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JoinRequest {
    pub identity: Identity,
    /// Join with moderator rights (starts the meeting if needed).
    pub moderator: bool,
    /// Join as anonymous guest.
    pub guest: bool,
}

impl JoinRequest {
    pub fn moderator(identity: Identity) -> Self {
        Self {
            identity,
            moderator: true,
            guest: false,
        }
    }

    pub fn attendee(identity: Identity, guest: bool) -> Self {
        Self {
            identity,
            moderator: false,
            guest,
        }
    }
}

/// Result of a join call: a URL to redirect to, or the reasons there is none.
#[derive(Debug, Default)]
pub struct JoinOutcome {
    pub url: Option<String>,
    pub errors: ProviderErrors,
}

impl JoinOutcome {
    pub fn with_url(url: impl Into<String>) -> Self {
        Self {
            url: Some(url.into()),
            errors: ProviderErrors::new(),
        }
    }

    pub fn with_errors(errors: ProviderErrors) -> Self {
        Self { url: None, errors }
    }
}

/// Result of a connection check against a server.
#[derive(Debug, Default)]
pub struct ConnectionCheck {
    /// The server answered and accepted the shared secret.
    pub reachable: bool,
    pub errors: ProviderErrors,
}

impl ConnectionCheck {
    pub fn is_successful(&self) -> bool {
        self.reachable && !self.errors.has_errors()
    }
}

/// A boxed future for async trait methods.
///
/// Boxed futures keep the trait object-safe so sessions can hold an
/// `Arc<dyn MeetingStatusSource>`.
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// The external collaborator behind a meeting.
///
/// # Implementation Notes
///
/// - Implementations must be `Send + Sync`; sessions share them
/// - `join` reports provider-side refusals in [`JoinOutcome::errors`] and
///   reserves `Err` for failures to perform the call at all
/// - `get_meeting` returns `Ok(None)` when the meeting has been deleted
pub trait MeetingStatusSource: Send + Sync {
    /// Returns the name/type of this source (e.g., "bigbluebutton").
    fn name(&self) -> &str;

    /// Reloads the meeting.
    fn get_meeting<'a>(&'a self, meeting: &'a Meeting) -> BoxFuture<'a, ProviderResult<Option<Meeting>>>;

    /// Asks the provider whether the meeting is currently running.
    fn is_meeting_running<'a>(&'a self, meeting: &'a Meeting) -> BoxFuture<'a, ProviderResult<bool>>;

    /// Creates a personal join URL.
    fn join<'a>(
        &'a self,
        meeting: &'a Meeting,
        request: &'a JoinRequest,
    ) -> BoxFuture<'a, ProviderResult<JoinOutcome>>;

    /// Checks the given server settings.
    ///
    /// The default implementation reports an unsupported operation.
    fn check_connection<'a>(
        &'a self,
        _settings: &'a ProviderSettings,
    ) -> BoxFuture<'a, ProviderResult<ConnectionCheck>> {
        Box::pin(async {
            Err(ProviderError::unsupported(
                "connection check is not supported by this source",
            ))
        })
    }
}

/// A source that always fails.
///
/// Stands in when the configured provider could not be initialized.
#[derive(Debug)]
pub struct ErrorSource {
    name: String,
    error: ProviderError,
}

impl ErrorSource {
    pub fn new(name: impl Into<String>, error: ProviderError) -> Self {
        Self {
            name: name.into(),
            error,
        }
    }

    fn error(&self) -> ProviderError {
        self.error.detached().with_provider(&self.name)
    }
}

impl MeetingStatusSource for ErrorSource {
    fn name(&self) -> &str {
        &self.name
    }

    fn get_meeting<'a>(&'a self, _meeting: &'a Meeting) -> BoxFuture<'a, ProviderResult<Option<Meeting>>> {
        let error = self.error();
        Box::pin(async move { Err(error) })
    }

    fn is_meeting_running<'a>(&'a self, _meeting: &'a Meeting) -> BoxFuture<'a, ProviderResult<bool>> {
        let error = self.error();
        Box::pin(async move { Err(error) })
    }

    fn join<'a>(
        &'a self,
        _meeting: &'a Meeting,
        _request: &'a JoinRequest,
    ) -> BoxFuture<'a, ProviderResult<JoinOutcome>> {
        let error = self.error();
        Box::pin(async move { Err(error) })
    }

    fn check_connection<'a>(
        &'a self,
        _settings: &'a ProviderSettings,
    ) -> BoxFuture<'a, ProviderResult<ConnectionCheck>> {
        let error = self.error();
        Box::pin(async move { Err(error) })
    }
}
