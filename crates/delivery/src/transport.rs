//! Connection seams used by the dispatcher.
//!
//! A [`Dialer`] turns a [`Location`] into an exclusively owned
//! [`Connection`]; a connection carries exactly the calls its owner issues
//! and is released with [`Connection::close`]. Nothing here is pooled or
//! shared between deliveries.

use crate::outcome::TransportError;
use async_trait::async_trait;
use corelib::{Location, WireEnvelope};
use std::time::Duration;
use tokio::time::Instant;

/// How a call behaves when its connection is not ready.
///
/// `CallMode` has no `Default`; every call site names the behavior it
/// wants.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CallMode {
    /// Surface the failure immediately. The call is attempted at most once.
    FailFast,
    /// Re-establish a broken connection within the call deadline before
    /// sending.
    WaitForReady,
}

/// Per-call bounds and behavior.
#[derive(Clone, Copy, Debug)]
pub struct CallOptions {
    /// Absolute point after which the call is abandoned.
    pub deadline: Instant,
    pub mode: CallMode,
}

impl CallOptions {
    pub fn fail_fast(deadline: Instant) -> Self {
        Self {
            deadline,
            mode: CallMode::FailFast,
        }
    }
}

/// Acknowledgement of a delivered envelope.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Ack;

/// Connection-establishment primitive.
#[async_trait]
pub trait Dialer: Send + Sync + 'static {
    type Connection: Connection;

    /// Connect to `location`, giving up after `timeout`.
    ///
    /// Implementations report an elapsed timeout as
    /// [`TransportError::ConnectTimeout`] and any other failure as
    /// [`TransportError::Connect`].
    async fn dial(
        &self,
        location: &Location,
        timeout: Duration,
    ) -> Result<Self::Connection, TransportError>;
}

/// Request/response primitive over one established connection.
#[async_trait]
pub trait Connection: Send {
    /// Send `envelope` and wait for the remote verdict.
    ///
    /// Returns [`TransportError::Rejected`] when the remote refused the
    /// envelope and [`TransportError::DeadlineExceeded`] when
    /// `options.deadline` passed first.
    async fn call(
        &mut self,
        envelope: &WireEnvelope,
        options: CallOptions,
    ) -> Result<Ack, TransportError>;

    /// Release the underlying resource. Idempotent.
    fn close(&mut self);
}
