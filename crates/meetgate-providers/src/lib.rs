//! MeetingStatusSource trait and implementations.
//!
//! This crate provides the seam between the access policy and the
//! conferencing backend:
//!
//! - [`MeetingStatusSource`] - The trait every backend implements
//! - [`InMemorySource`] - A map-backed source for tests and local runs
//! - [`ProviderSettings`] - Server URL, shared secret and their validation
//! - [`ProviderError`] - Error types for provider operations
//!
//! # Example
//!
//! ```ignore
//! use meetgate_providers::{MeetingStatusSource, JoinRequest};
//!
//! async fn join(source: &dyn MeetingStatusSource, meeting: &Meeting, request: &JoinRequest) {
//!     let outcome = source.join(meeting, request).await?;
//!     if let Some(url) = outcome.url { /* redirect */ }
//! }
//! ```

pub mod error;
pub mod memory;
pub mod settings;
pub mod source;

pub use error::{ProviderError, ProviderErrorCode, ProviderErrors, ProviderResult};
pub use memory::InMemorySource;
pub use settings::{CLEANUP_DAYS, ProviderSettings, SECRET_PLACEHOLDER, SettingsError};
pub use source::{
    BoxFuture, ConnectionCheck, ErrorSource, Identity, JoinOutcome, JoinRequest,
    MeetingStatusSource,
};
