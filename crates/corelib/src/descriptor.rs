//! Exchange descriptors.
//!
//! The descriptor is the proposal being delivered. Its internal layout
//! (terms, commitments, timelocks) belongs to the caller; this crate only
//! carries the bytes.

use bytes::Bytes;

/// Opaque cross-party proposal payload.
///
/// Cloning is cheap (reference-counted buffer).
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct ExchangeDescriptor {
    payload: Bytes,
}

impl ExchangeDescriptor {
    pub fn new(payload: impl Into<Bytes>) -> Self {
        Self {
            payload: payload.into(),
        }
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.payload
    }

    pub fn len(&self) -> usize {
        self.payload.len()
    }

    pub fn is_empty(&self) -> bool {
        self.payload.is_empty()
    }

    /// Serialized form placed in the wire envelope.
    ///
    /// Descriptors are opaque, so serialization is the identity on the
    /// payload bytes and shares the underlying buffer.
    pub fn serialize(&self) -> SerializedDescriptor {
        SerializedDescriptor(self.payload.clone())
    }
}

/// Descriptor bytes ready to be stamped into an envelope.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SerializedDescriptor(Bytes);

impl SerializedDescriptor {
    pub fn into_bytes(self) -> Bytes {
        self.0
    }
}
