//! Subcommand implementations.

pub mod config;
pub mod decide;
pub mod join;
