//! Core types: meetings, access windows, join policy, tracing

pub mod access;
pub mod meeting;
pub mod time;
pub mod tracing;

pub use access::{
    AccessContext, JoinDecision, JoinLabel, MeetingStatus, Role, decide, is_accessible, is_ended,
    is_valid_window,
};
pub use meeting::{Meeting, MeetingKey};
pub use time::AccessWindow;
pub use tracing::{TracingConfig, TracingError, TracingOutputFormat, init_tracing};
