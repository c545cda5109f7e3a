//! Participant identity fingerprints.
//!
//! A fingerprint is the persistent identity of a participant, independent of
//! where it can currently be reached. It is rendered as lowercase hex in
//! multiaddresses (`/republic/<fingerprint>`).

use crate::error::AddressError;
use std::fmt;
use std::str::FromStr;

/// Length of fingerprints produced by [`IdentityFingerprint::derive`].
pub const DERIVED_FINGERPRINT_LEN: usize = 20;

/// Persistent identity fingerprint of a participant.
///
/// Always non-empty. Equality is byte equality, so two fingerprints parsed
/// from differently-cased hex compare equal.
#[derive(Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct IdentityFingerprint(Vec<u8>);

impl IdentityFingerprint {
    /// Wrap raw fingerprint bytes.
    ///
    /// # Errors
    /// [`AddressError::InvalidFingerprint`] if `bytes` is empty.
    pub fn from_bytes(bytes: impl Into<Vec<u8>>) -> Result<Self, AddressError> {
        let bytes = bytes.into();
        if bytes.is_empty() {
            return Err(AddressError::InvalidFingerprint("empty".to_string()));
        }
        Ok(Self(bytes))
    }

    /// Parse a hex fingerprint (either case).
    pub fn from_hex(text: &str) -> Result<Self, AddressError> {
        let bytes =
            hex::decode(text).map_err(|e| AddressError::InvalidFingerprint(format!("{text}: {e}")))?;
        Self::from_bytes(bytes)
    }

    /// Derive a fingerprint from a participant's public key.
    ///
    /// The fingerprint is the first [`DERIVED_FINGERPRINT_LEN`] bytes of the
    /// BLAKE3 digest of the key, so it is stable for the lifetime of the key.
    pub fn derive(public_key: &[u8]) -> Self {
        let digest = blake3::hash(public_key);
        Self(digest.as_bytes()[..DERIVED_FINGERPRINT_LEN].to_vec())
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    /// Lowercase hex rendering, as used on the wire.
    pub fn to_hex(&self) -> String {
        hex::encode(&self.0)
    }
}

impl fmt::Display for IdentityFingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl fmt::Debug for IdentityFingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "IdentityFingerprint({})", self.to_hex())
    }
}

impl FromStr for IdentityFingerprint {
    type Err = AddressError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_hex(s)
    }
}
