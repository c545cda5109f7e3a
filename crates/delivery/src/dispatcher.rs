//! Single-attempt, deadline-bounded descriptor delivery.
//!
//! # Lifecycle
//!
//! ```text
//! Idle → Dialing → Connected → Sending → Acknowledged → Done
//!           │                     │
//!           ├→ TimedOut           ├→ TimedOut
//!           └→ ConnectFailed      └→ CallFailed
//! ```
//!
//! Every path ends in `Done`, and the connection (if one was opened) is
//! released on the way there. The connection is held by a guard that closes
//! it on drop, so release also happens when the attempt is cancelled at the
//! deadline or unwinds from a panic.
//!
//! # Deadline
//!
//! The caller's deadline is turned into one absolute instant when the
//! attempt starts. Dialing is bounded by it, and with
//! [`DeadlineBudget::Shared`] the call only gets the time left after
//! dialing. Each phase is also wrapped in [`tokio::time::timeout_at`], so an
//! attempt returns at the deadline even if a transport ignores its own
//! bounds.

use crate::config::{ConfigError, DeadlineBudget, DispatchConfig};
use crate::outcome::{classify, DeliveryError, DeliveryResult, Phase};
use crate::resolver::AddressResolver;
use crate::tcp::TcpDialer;
use crate::transport::{CallOptions, Connection, Dialer};
use corelib::codec;
use corelib::{build_envelope, ExchangeDescriptor, IdentityFingerprint, NetworkAddress};
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::{timeout_at, Instant};
use tracing::{debug, trace, warn};

/// States of a single delivery attempt.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DeliveryState {
    Idle,
    Dialing,
    Connected,
    Sending,
    Acknowledged,
    TimedOut,
    ConnectFailed,
    CallFailed,
    Done,
}

impl DeliveryState {
    /// Terminal state reached by a finished attempt, before `Done`.
    pub fn of(result: &DeliveryResult) -> Self {
        match result {
            Ok(()) => DeliveryState::Acknowledged,
            Err(DeliveryError::DeliveryTimeout { .. }) => DeliveryState::TimedOut,
            Err(DeliveryError::ConnectFailed { .. }) => DeliveryState::ConnectFailed,
            // Address errors are raised before dialing starts.
            Err(DeliveryError::InvalidAddress(_)) => DeliveryState::Idle,
            Err(DeliveryError::CallFailed(_)) => DeliveryState::CallFailed,
        }
    }
}

impl fmt::Display for DeliveryState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

/// Upper bound on how far in the future an attempt may expire.
const MAX_EXPIRY: Duration = Duration::from_secs(86_400 * 365 * 30);

/// `from + deadline`, capped at [`MAX_EXPIRY`] so that huge deadlines such
/// as `Duration::MAX` cannot overflow `Instant`.
fn expiry(from: Instant, deadline: Duration) -> Instant {
    from + deadline.min(MAX_EXPIRY)
}

/// Closes the connection when dropped.
struct ConnectionGuard<C: Connection> {
    conn: C,
}

impl<C: Connection> ConnectionGuard<C> {
    fn new(conn: C) -> Self {
        Self { conn }
    }

    fn connection(&mut self) -> &mut C {
        &mut self.conn
    }
}

impl<C: Connection> Drop for ConnectionGuard<C> {
    fn drop(&mut self) {
        self.conn.close();
        trace!(state = %DeliveryState::Done, "connection released");
    }
}

/// Delivers exchange descriptors, one connection per attempt.
///
/// Holds only immutable configuration and the dialer, so clones can run
/// deliveries concurrently without coordination.
pub struct Dispatcher<D: Dialer = TcpDialer> {
    config: DispatchConfig,
    dialer: Arc<D>,
}

impl<D: Dialer> Clone for Dispatcher<D> {
    fn clone(&self) -> Self {
        Self {
            config: self.config.clone(),
            dialer: Arc::clone(&self.dialer),
        }
    }
}

impl Dispatcher<TcpDialer> {
    /// Dispatcher over plain TCP.
    pub fn tcp(config: DispatchConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        let dialer = TcpDialer::new(&config);
        Ok(Self::new(config, dialer))
    }
}

impl<D: Dialer> Dispatcher<D> {
    pub fn new(config: DispatchConfig, dialer: D) -> Self {
        Self {
            config,
            dialer: Arc::new(dialer),
        }
    }

    pub fn config(&self) -> &DispatchConfig {
        &self.config
    }

    /// Deliver `descriptor` to `recipient` on behalf of `sender` within
    /// `deadline`.
    ///
    /// Opens exactly one connection, issues exactly one fail-fast call and
    /// closes the connection before returning. Nothing keeps running after
    /// this returns.
    ///
    /// # Errors
    /// - [`DeliveryError::InvalidAddress`] if `recipient` has no identity
    /// - [`DeliveryError::ConnectFailed`] if the recipient cannot be reached
    /// - [`DeliveryError::DeliveryTimeout`] if the deadline elapses (a zero
    ///   deadline fails without dialing)
    /// - [`DeliveryError::CallFailed`] if the recipient refuses the envelope
    ///   or the connection breaks during the call
    #[tracing::instrument(
        name = "deliver",
        skip_all,
        fields(recipient = %recipient, sender = %sender, deadline_ms = deadline.as_millis() as u64)
    )]
    pub async fn deliver(
        &self,
        recipient: &NetworkAddress,
        sender: &NetworkAddress,
        descriptor: &ExchangeDescriptor,
        deadline: Duration,
    ) -> DeliveryResult {
        let started = Instant::now();
        let result = self
            .attempt(recipient, sender, descriptor, deadline, started)
            .await;
        let elapsed = started.elapsed();

        let outcome = match &result {
            Ok(()) => "acknowledged",
            Err(err) => err.kind().as_str(),
        };
        metrics::counter!("relay_deliveries_total", "outcome" => outcome).increment(1);
        metrics::histogram!("relay_delivery_duration_seconds").record(elapsed.as_secs_f64());

        let state = DeliveryState::of(&result);
        let elapsed_ms = elapsed.as_millis() as u64;
        match &result {
            Ok(()) => debug!(%state, elapsed_ms, "descriptor acknowledged"),
            Err(err) => warn!(%state, kind = %err.kind(), error = %err, elapsed_ms, "delivery failed"),
        }
        result
    }

    /// Resolve `participant` through `resolver`, then [`Self::deliver`].
    ///
    /// An unknown participant is reported as
    /// [`DeliveryError::InvalidAddress`].
    pub async fn deliver_to<R>(
        &self,
        resolver: &R,
        participant: &IdentityFingerprint,
        sender: &NetworkAddress,
        descriptor: &ExchangeDescriptor,
        deadline: Duration,
    ) -> DeliveryResult
    where
        R: AddressResolver + ?Sized,
    {
        let recipient = resolver.resolve(participant)?;
        self.deliver(&recipient, sender, descriptor, deadline).await
    }

    async fn attempt(
        &self,
        recipient: &NetworkAddress,
        sender: &NetworkAddress,
        descriptor: &ExchangeDescriptor,
        deadline: Duration,
        started: Instant,
    ) -> DeliveryResult {
        if deadline.is_zero() {
            return Err(DeliveryError::DeliveryTimeout {
                phase: Phase::Dial,
                deadline,
            });
        }

        let location = codec::dial_location(recipient)?;
        let to = codec::encode_identity(recipient)?;
        let expires_at = expiry(started, deadline);
        let location_text = location.to_string();

        trace!(state = %DeliveryState::Dialing, location = %location_text);
        let dial_timeout = expires_at.saturating_duration_since(Instant::now());
        let conn = match timeout_at(expires_at, self.dialer.dial(location, dial_timeout)).await {
            Ok(Ok(conn)) => conn,
            Ok(Err(err)) => return Err(classify(Phase::Dial, &location_text, deadline, err)),
            Err(_) => {
                return Err(DeliveryError::DeliveryTimeout {
                    phase: Phase::Dial,
                    deadline,
                })
            }
        };
        let mut guard = ConnectionGuard::new(conn);
        trace!(state = %DeliveryState::Connected);

        let envelope = build_envelope(descriptor.serialize(), to, codec::encode_address(sender));

        let call_deadline = match self.config.budget {
            DeadlineBudget::Shared => expires_at,
            DeadlineBudget::PerPhase => expiry(Instant::now(), deadline),
        };
        trace!(state = %DeliveryState::Sending, bytes = envelope.descriptor().len());

        let call = guard
            .connection()
            .call(&envelope, CallOptions::fail_fast(call_deadline));
        let outcome = timeout_at(call_deadline, call).await;
        match outcome {
            Ok(Ok(_ack)) => Ok(()),
            Ok(Err(err)) => Err(classify(Phase::Call, &location_text, deadline, err)),
            Err(_) => Err(DeliveryError::DeliveryTimeout {
                phase: Phase::Call,
                deadline,
            }),
        }
    }
}
