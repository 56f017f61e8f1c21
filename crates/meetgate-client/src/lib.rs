//! CLI: join decisions, dry-run joins, configuration
//!
//! This crate provides the `meetgate` command-line interface.

pub mod cli;
pub mod commands;
pub mod config;
pub mod error;
pub mod meeting_file;
pub mod secret;

pub use cli::Cli;
pub use error::{ClientError, ClientResult};
