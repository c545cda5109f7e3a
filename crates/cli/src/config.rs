//! Command-line configuration.

use crate::commands::Command;
use anyhow::Context;
use clap::Parser;
use delivery::DispatchConfig;
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

/// Deliver exchange descriptors to network participants.
#[derive(Debug, Parser)]
#[command(name = "relay", version, long_about = None)]
pub struct CliConfig {
    #[command(subcommand)]
    pub command: Command,

    /// Dispatch configuration file (JSON); defaults apply to missing fields.
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Enable debug logging (RUST_LOG overrides).
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

impl CliConfig {
    /// Run the selected command to completion on a fresh runtime.
    pub fn run(self) -> anyhow::Result<()> {
        init_tracing(self.verbose);

        let dispatch = match &self.config {
            Some(path) => load_dispatch_config(path)?,
            None => DispatchConfig::default(),
        };
        dispatch.validate().context("invalid dispatch configuration")?;

        let runtime = tokio::runtime::Builder::new_multi_thread()
            .enable_all()
            .build()
            .context("failed to start async runtime")?;
        let result = runtime.block_on(self.command.execute(dispatch))?;
        println!("{result}");
        Ok(())
    }
}

fn init_tracing(verbose: bool) {
    let level = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

/// Read a [`DispatchConfig`] from a JSON file.
pub fn load_dispatch_config(path: &Path) -> anyhow::Result<DispatchConfig> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    serde_json::from_str(&text).with_context(|| format!("failed to parse {}", path.display()))
}
