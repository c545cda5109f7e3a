//! CLI tool for delivering exchange descriptors.
//!
//! Provides commands for:
//! - Sending one descriptor to one recipient under a deadline
//! - Inspecting how an address is canonicalized

pub mod commands;
pub mod config;

pub use commands::{Command, CommandResult};
pub use config::CliConfig;
