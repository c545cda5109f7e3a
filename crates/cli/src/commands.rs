//! CLI subcommands.

use anyhow::Context;
use bytes::Bytes;
use clap::{Args, Subcommand};
use corelib::codec;
use corelib::{ExchangeDescriptor, NetworkAddress};
use delivery::{DispatchConfig, Dispatcher};
use std::fmt;
use std::path::PathBuf;
use std::time::{Duration, Instant};

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Deliver one descriptor to one recipient.
    Send(SendArgs),
    /// Show the canonical wire forms of an address.
    Inspect {
        /// Multiaddress, e.g. /ip4/10.0.0.2/tcp/18514/republic/<hex>
        address: NetworkAddress,
    },
}

#[derive(Debug, Args)]
pub struct SendArgs {
    /// Recipient multiaddress (must include /republic/<identity>).
    #[arg(long)]
    pub to: NetworkAddress,

    /// Sender multiaddress stamped into the envelope.
    #[arg(long)]
    pub from: NetworkAddress,

    /// Descriptor bytes as hex.
    #[arg(long, conflicts_with = "payload_file", required_unless_present = "payload_file")]
    pub payload_hex: Option<String>,

    /// Read descriptor bytes from a file.
    #[arg(long)]
    pub payload_file: Option<PathBuf>,

    /// Deadline for the whole delivery, in milliseconds.
    #[arg(long, default_value_t = 2000)]
    pub timeout_ms: u64,
}

impl SendArgs {
    fn descriptor(&self) -> anyhow::Result<ExchangeDescriptor> {
        let bytes = match (&self.payload_hex, &self.payload_file) {
            (Some(text), _) => hex::decode(text.trim()).context("payload is not valid hex")?,
            (None, Some(path)) => std::fs::read(path)
                .with_context(|| format!("failed to read {}", path.display()))?,
            (None, None) => anyhow::bail!("no payload given"),
        };
        Ok(ExchangeDescriptor::new(Bytes::from(bytes)))
    }
}

/// Printable outcome of a command.
#[derive(Debug)]
pub enum CommandResult {
    Delivered {
        recipient: NetworkAddress,
        bytes: usize,
        elapsed: Duration,
    },
    Inspected {
        canonical: String,
        location: String,
        identity: Option<String>,
    },
}

impl fmt::Display for CommandResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CommandResult::Delivered {
                recipient,
                bytes,
                elapsed,
            } => write!(
                f,
                "delivered {} bytes to {} in {} ms",
                bytes,
                recipient,
                elapsed.as_millis()
            ),
            CommandResult::Inspected {
                canonical,
                location,
                identity,
            } => {
                writeln!(f, "canonical: {canonical}")?;
                writeln!(f, "location:  {location}")?;
                write!(f, "identity:  {}", identity.as_deref().unwrap_or("<none>"))
            }
        }
    }
}

impl Command {
    pub async fn execute(self, dispatch: DispatchConfig) -> anyhow::Result<CommandResult> {
        match self {
            Command::Send(args) => send(args, dispatch).await,
            Command::Inspect { address } => Ok(inspect(&address)),
        }
    }
}

async fn send(args: SendArgs, dispatch: DispatchConfig) -> anyhow::Result<CommandResult> {
    let descriptor = args.descriptor()?;
    let deadline = Duration::from_millis(args.timeout_ms);
    let dispatcher = Dispatcher::tcp(dispatch).context("invalid dispatch configuration")?;

    tracing::info!(to = %args.to, bytes = descriptor.len(), "sending descriptor");
    let started = Instant::now();
    dispatcher
        .deliver(&args.to, &args.from, &descriptor, deadline)
        .await
        .with_context(|| format!("delivery to {} failed", args.to))?;

    Ok(CommandResult::Delivered {
        recipient: args.to,
        bytes: descriptor.len(),
        elapsed: started.elapsed(),
    })
}

fn inspect(address: &NetworkAddress) -> CommandResult {
    CommandResult::Inspected {
        canonical: codec::encode_address(address).as_str().to_string(),
        location: address.location().to_string(),
        identity: codec::encode_identity(address)
            .ok()
            .map(|wire| hex::encode(wire.fingerprint())),
    }
}
