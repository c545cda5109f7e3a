//! Address codec: canonical wire forms of addresses and identities.
//!
//! Both functions are pure. The recipient of a delivery is named on the wire
//! by its identity alone ([`WireIdentity`]); the sender is named by its full
//! canonical multiaddress ([`WireAddress`]) so the recipient can reach back.

use crate::address::{Location, NetworkAddress};
use crate::error::AddressError;
use crate::identity::IdentityFingerprint;
use serde::{Deserialize, Serialize};

/// Wire form of a participant identity (raw fingerprint bytes).
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct WireIdentity {
    fingerprint: Vec<u8>,
}

impl WireIdentity {
    pub fn fingerprint(&self) -> &[u8] {
        &self.fingerprint
    }
}

/// Wire form of a full address (canonical multiaddress text).
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct WireAddress {
    multi: String,
}

impl WireAddress {
    pub fn as_str(&self) -> &str {
        &self.multi
    }
}

/// Canonical identity of `address`.
///
/// # Errors
/// [`AddressError::MissingIdentity`] when the address carries no
/// `/republic/<fingerprint>` component.
pub fn encode_identity(address: &NetworkAddress) -> Result<WireIdentity, AddressError> {
    let identity = address.identity().ok_or(AddressError::MissingIdentity)?;
    Ok(WireIdentity {
        fingerprint: identity.as_bytes().to_vec(),
    })
}

/// Canonical multiaddress of `address`.
///
/// Infallible: a constructed [`NetworkAddress`] is always renderable, and a
/// sender address need not carry an identity.
pub fn encode_address(address: &NetworkAddress) -> WireAddress {
    WireAddress {
        multi: address.to_string(),
    }
}

/// Dialable location of `address`.
///
/// Recipients must be identifiable as well as reachable, so this rejects
/// addresses without an identity fingerprint.
pub fn dial_location(address: &NetworkAddress) -> Result<&Location, AddressError> {
    if address.identity().is_none() {
        return Err(AddressError::MissingIdentity);
    }
    Ok(address.location())
}

/// Inverse of [`encode_identity`], used by receiving endpoints.
pub fn decode_identity(wire: &WireIdentity) -> Result<IdentityFingerprint, AddressError> {
    IdentityFingerprint::from_bytes(wire.fingerprint.clone())
}

/// Inverse of [`encode_address`], used by receiving endpoints.
pub fn decode_address(wire: &WireAddress) -> Result<NetworkAddress, AddressError> {
    wire.multi.parse()
}
