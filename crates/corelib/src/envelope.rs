//! Wire envelope construction.
//!
//! # Envelope Layout
//!
//! ```text
//! WireEnvelope {
//!     descriptor: Bytes,      // serialized exchange descriptor, untouched
//!     to:   WireIdentity,     // recipient fingerprint
//!     from: WireAddress,      // sender canonical multiaddress
//! }
//! ```
//!
//! Encoded with bincode's default (fixed-int, little-endian) options, which
//! makes [`WireEnvelope::to_bytes`] deterministic: the same inputs always
//! produce the same bytes.

use crate::codec::{WireAddress, WireIdentity};
use crate::descriptor::SerializedDescriptor;
use crate::error::Result;
use bytes::Bytes;
use serde::{Deserialize, Serialize};

/// Serialized descriptor stamped with recipient identity and sender address.
///
/// Fields are private: an envelope is never modified after
/// [`build_envelope`] returns it.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct WireEnvelope {
    descriptor: Bytes,
    to: WireIdentity,
    from: WireAddress,
}

impl WireEnvelope {
    /// Descriptor bytes exactly as supplied.
    pub fn descriptor(&self) -> &[u8] {
        &self.descriptor
    }

    /// Recipient identity.
    pub fn to(&self) -> &WireIdentity {
        &self.to
    }

    /// Sender address.
    pub fn from(&self) -> &WireAddress {
        &self.from
    }

    /// Encode for transmission.
    ///
    /// # Performance
    /// - **Time**: O(n) in the descriptor length
    /// - **Space**: one allocation of the encoded size
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        Ok(bincode::serialize(self)?)
    }

    /// Decode an envelope produced by [`WireEnvelope::to_bytes`].
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        Ok(bincode::deserialize(bytes)?)
    }
}

/// Stamp `descriptor` with the wire forms of recipient and sender.
///
/// Pure and infallible; the address forms are expected to come from
/// [`crate::codec`], which performs all validation.
///
/// # Example
///
/// ```rust
/// use corelib::codec::{encode_address, encode_identity};
/// use corelib::{build_envelope, ExchangeDescriptor, NetworkAddress};
///
/// let to: NetworkAddress = "/ip4/127.0.0.1/tcp/18514/republic/0b".parse().unwrap();
/// let from: NetworkAddress = "/ip4/127.0.0.1/tcp/18515/republic/0a".parse().unwrap();
/// let descriptor = ExchangeDescriptor::new(vec![1, 2, 3]);
///
/// let envelope = build_envelope(
///     descriptor.serialize(),
///     encode_identity(&to).unwrap(),
///     encode_address(&from),
/// );
/// assert_eq!(envelope.descriptor(), &[1, 2, 3]);
/// ```
pub fn build_envelope(
    descriptor: SerializedDescriptor,
    to: WireIdentity,
    from: WireAddress,
) -> WireEnvelope {
    WireEnvelope {
        descriptor: descriptor.into_bytes(),
        to,
        from,
    }
}
