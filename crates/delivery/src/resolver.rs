//! Participant address resolution.
//!
//! Real deployments resolve identities through an addressing subsystem
//! (bootstrap nodes, a DHT). The dispatcher only needs the
//! [`AddressResolver`] seam; [`StaticResolver`] is a fixed in-memory table
//! for tests, tools and small static deployments.

use corelib::{AddressError, IdentityFingerprint, NetworkAddress};
use std::collections::HashMap;

/// Maps a participant identity to a dialable address.
pub trait AddressResolver: Send + Sync {
    fn resolve(&self, participant: &IdentityFingerprint) -> Result<NetworkAddress, AddressError>;
}

/// Fixed identity → address table.
#[derive(Clone, Debug, Default)]
pub struct StaticResolver {
    entries: HashMap<IdentityFingerprint, NetworkAddress>,
}

impl StaticResolver {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `address` under its own identity, replacing any previous
    /// entry for that identity.
    ///
    /// # Errors
    /// [`AddressError::MissingIdentity`] for addresses without an identity.
    pub fn insert(&mut self, address: NetworkAddress) -> Result<(), AddressError> {
        let identity = address
            .identity()
            .cloned()
            .ok_or(AddressError::MissingIdentity)?;
        self.entries.insert(identity, address);
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl AddressResolver for StaticResolver {
    fn resolve(&self, participant: &IdentityFingerprint) -> Result<NetworkAddress, AddressError> {
        self.entries
            .get(participant)
            .cloned()
            .ok_or_else(|| AddressError::UnknownParticipant(participant.to_hex()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_known_and_unknown() {
        let mut resolver = StaticResolver::new();
        let addr: NetworkAddress = "/ip4/10.0.0.2/tcp/18514/republic/0b".parse().unwrap();
        resolver.insert(addr.clone()).unwrap();
        assert_eq!(resolver.len(), 1);

        let id = IdentityFingerprint::from_hex("0b").unwrap();
        assert_eq!(resolver.resolve(&id).unwrap(), addr);

        let unknown = IdentityFingerprint::from_hex("0c").unwrap();
        assert_eq!(
            resolver.resolve(&unknown),
            Err(AddressError::UnknownParticipant("0c".to_string()))
        );
    }

    #[test]
    fn test_insert_requires_identity() {
        let mut resolver = StaticResolver::new();
        let addr: NetworkAddress = "/ip4/10.0.0.2/tcp/18514".parse().unwrap();
        assert_eq!(resolver.insert(addr), Err(AddressError::MissingIdentity));
        assert!(resolver.is_empty());
    }

    #[test]
    fn test_insert_replaces_location() {
        let mut resolver = StaticResolver::new();
        resolver
            .insert("/ip4/10.0.0.2/tcp/18514/republic/0b".parse().unwrap())
            .unwrap();
        let moved: NetworkAddress = "/ip4/10.0.0.9/tcp/18514/republic/0b".parse().unwrap();
        resolver.insert(moved.clone()).unwrap();

        let id = IdentityFingerprint::from_hex("0b").unwrap();
        assert_eq!(resolver.resolve(&id).unwrap(), moved);
        assert_eq!(resolver.len(), 1);
    }
}
