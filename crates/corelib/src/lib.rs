//! Core library for descriptor delivery.
//!
//! This crate provides the transport-independent pieces of a delivery:
//! - Structured network addresses and identity fingerprints
//! - The address codec (canonical wire forms)
//! - Opaque exchange descriptors
//! - The wire envelope and its builder

pub mod address;
pub mod codec;
pub mod descriptor;
pub mod envelope;
pub mod error;
pub mod identity;

pub use address::{Host, Location, NetworkAddress};
pub use codec::{WireAddress, WireIdentity};
pub use descriptor::{ExchangeDescriptor, SerializedDescriptor};
pub use envelope::{build_envelope, WireEnvelope};
pub use error::{AddressError, Error, Result};
pub use identity::IdentityFingerprint;
