//! Delivery outcomes and failure classification.
//!
//! Transport seams report [`TransportError`]. The dispatcher never inspects
//! those beyond handing them to [`classify`], which decides which
//! [`DeliveryError`] kind the caller sees. The transport error is kept as the
//! `source` of the classified one.

use corelib::AddressError;
use std::fmt;
use std::io;
use std::time::Duration;
use thiserror::Error;

/// Result type alias for a delivery attempt.
pub type DeliveryResult<T = ()> = std::result::Result<T, DeliveryError>;

/// Errors reported by [`crate::transport`] implementations.
#[derive(Debug, Error)]
pub enum TransportError {
    /// Connection establishment failed (refused, unreachable, unresolvable).
    #[error("connect to {location} failed: {source}")]
    Connect {
        location: String,
        #[source]
        source: io::Error,
    },
    /// Connection establishment exceeded the dial timeout.
    #[error("connect to {location} timed out")]
    ConnectTimeout { location: String },
    /// The established connection failed mid-call.
    #[error("connection i/o failed: {0}")]
    Io(#[from] io::Error),
    /// The call was issued in fail-fast mode on a connection that is not ready.
    #[error("connection is not ready")]
    NotReady,
    /// Malformed, oversized or unencodable frame.
    #[error("protocol violation: {0}")]
    Protocol(String),
    /// The remote side answered and refused the envelope.
    #[error("envelope rejected by remote: {0}")]
    Rejected(String),
    /// The call deadline elapsed before a response arrived.
    #[error("call deadline exceeded")]
    DeadlineExceeded,
}

impl From<bincode::Error> for TransportError {
    fn from(err: bincode::Error) -> Self {
        TransportError::Protocol(err.to_string())
    }
}

/// Which half of a delivery an error came from.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Phase {
    Dial,
    Call,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Phase::Dial => f.write_str("dial"),
            Phase::Call => f.write_str("call"),
        }
    }
}

/// Failure of a single delivery attempt.
#[derive(Debug, Error)]
pub enum DeliveryError {
    /// An address could not be canonicalized into a dialable/identifiable form.
    #[error("invalid address: {0}")]
    InvalidAddress(#[from] AddressError),

    /// Connection establishment failed for a reason other than timeout.
    #[error("connect to {location} failed")]
    ConnectFailed {
        location: String,
        #[source]
        source: TransportError,
    },

    /// The shared deadline elapsed while dialing or awaiting the response.
    ///
    /// For [`Phase::Call`] the envelope may or may not have been processed
    /// by the recipient.
    #[error("deadline of {deadline:?} elapsed during {phase}")]
    DeliveryTimeout { phase: Phase, deadline: Duration },

    /// The call completed its round trip with an error, or the connection
    /// broke after it was established.
    #[error("call failed")]
    CallFailed(#[source] TransportError),
}

/// Flat classification of [`DeliveryError`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    InvalidAddress,
    ConnectFailed,
    DeliveryTimeout,
    CallFailed,
}

impl ErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::InvalidAddress => "invalid_address",
            ErrorKind::ConnectFailed => "connect_failed",
            ErrorKind::DeliveryTimeout => "delivery_timeout",
            ErrorKind::CallFailed => "call_failed",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl DeliveryError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            DeliveryError::InvalidAddress(_) => ErrorKind::InvalidAddress,
            DeliveryError::ConnectFailed { .. } => ErrorKind::ConnectFailed,
            DeliveryError::DeliveryTimeout { .. } => ErrorKind::DeliveryTimeout,
            DeliveryError::CallFailed(_) => ErrorKind::CallFailed,
        }
    }

    /// Reason given by the recipient when it refused the envelope.
    pub fn rejection_reason(&self) -> Option<&str> {
        match self {
            DeliveryError::CallFailed(TransportError::Rejected(reason)) => Some(reason),
            _ => None,
        }
    }

    pub fn is_timeout(&self) -> bool {
        matches!(self, DeliveryError::DeliveryTimeout { .. })
    }
}

/// Map the first error of a delivery onto the caller-facing taxonomy.
///
/// `location` names the dialed endpoint; `deadline` is the budget the
/// caller supplied and is reported back on timeouts.
pub fn classify(
    phase: Phase,
    location: &str,
    deadline: Duration,
    err: TransportError,
) -> DeliveryError {
    match (phase, err) {
        (_, TransportError::ConnectTimeout { .. }) | (_, TransportError::DeadlineExceeded) => {
            DeliveryError::DeliveryTimeout { phase, deadline }
        }
        (Phase::Dial, source) => DeliveryError::ConnectFailed {
            location: location.to_string(),
            source,
        },
        (Phase::Call, source) => DeliveryError::CallFailed(source),
    }
}
