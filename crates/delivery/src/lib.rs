//! Sender-side delivery of exchange descriptors.
//!
//! This crate owns the network half of a delivery:
//! - The dispatcher (dial → call → teardown under one deadline)
//! - Failure classification into a small error taxonomy
//! - Transport seams (`Dialer`, `Connection`) and their TCP implementation
//! - Frame encoding for the request/response exchange
//! - Address resolution seam for participant identities

pub mod config;
pub mod dispatcher;
pub mod outcome;
pub mod resolver;
pub mod tcp;
pub mod transport;
pub mod wire;

pub use config::{ConfigError, DeadlineBudget, DispatchConfig};
pub use dispatcher::{DeliveryState, Dispatcher};
pub use outcome::{DeliveryError, DeliveryResult, ErrorKind, Phase, TransportError};
pub use resolver::{AddressResolver, StaticResolver};
pub use tcp::{TcpConnection, TcpDialer};
pub use transport::{Ack, CallMode, CallOptions, Connection, Dialer};
