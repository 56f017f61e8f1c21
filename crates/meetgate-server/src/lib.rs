//! Join sessions: event bus, running-state cache, join flow.
//!
//! This crate keeps the join decision of every open viewer current:
//! - A broadcast bus carrying meeting state changes
//! - A running-state cache with TTL in front of the meeting source
//! - One [`JoinSession`] per viewer and meeting, driven through a
//!   [`SessionHandle`]
//!
//! # Example
//!
//! ```rust,no_run
//! use std::sync::Arc;
//!
//! use meetgate_core::Meeting;
//! use meetgate_providers::{Identity, InMemorySource};
//! use meetgate_server::{JoinSession, MeetingEventBus, SessionConfig, SessionServices, Viewer};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let source = Arc::new(InMemorySource::new("https://bbb.example.com/".parse()?, "secret"));
//!     let services = SessionServices::new(source, MeetingEventBus::default(), SessionConfig::default());
//!
//!     let viewer = Viewer::participant(Identity::new(7, "Ada"));
//!     let session = JoinSession::open(&services, Meeting::new(1, "Lecture"), viewer).await;
//!     let handle = session.handle();
//!     tokio::spawn(session.run());
//!
//!     println!("{:?}", handle.decision().await);
//!     Ok(())
//! }
//! ```

mod bus;
mod cache;
mod clock;
mod config;
mod error;
mod session;

pub use bus::{MeetingEvent, MeetingEventBus, MeetingEventKind, MeetingSubscription, Notification};
pub use cache::{RunningCache, RunningEntry, SharedRunningCache, new_running_cache};
pub use clock::{Clock, ManualClock, SystemClock};
pub use config::SessionConfig;
pub use error::{SessionError, SessionResult};
pub use session::{
    JoinResult, JoinSession, SessionCommand, SessionHandle, SessionServices, SessionState,
    SharedSessionState, Viewer,
};
