//! Structured network addresses.
//!
//! A [`NetworkAddress`] names where a participant can be reached plus, for
//! addressable peers, who it is. The textual form is a multiaddress:
//!
//! ```text
//! /ip4/10.0.0.7/tcp/18514/republic/8c9f0a...
//! /dns4/node-b.example.org/tcp/18514/republic/51ab...
//! /ip6/::1/tcp/18514
//! ```
//!
//! Components must appear in the order host, `tcp`, `republic`. The identity
//! component is optional so that addresses of senders which are not
//! themselves addressable can still be represented.

use crate::error::AddressError;
use crate::identity::IdentityFingerprint;
use std::fmt;
use std::net::{Ipv4Addr, Ipv6Addr};
use std::str::FromStr;

const PROTO_IP4: &str = "ip4";
const PROTO_IP6: &str = "ip6";
const PROTO_DNS: &str = "dns";
const PROTO_DNS4: &str = "dns4";
const PROTO_DNS6: &str = "dns6";
const PROTO_TCP: &str = "tcp";
const PROTO_REPUBLIC: &str = "republic";

/// Host part of a location.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum Host {
    Ip4(Ipv4Addr),
    Ip6(Ipv6Addr),
    /// Any address family
    Dns(String),
    Dns4(String),
    Dns6(String),
}

impl Host {
    fn protocol(&self) -> &'static str {
        match self {
            Host::Ip4(_) => PROTO_IP4,
            Host::Ip6(_) => PROTO_IP6,
            Host::Dns(_) => PROTO_DNS,
            Host::Dns4(_) => PROTO_DNS4,
            Host::Dns6(_) => PROTO_DNS6,
        }
    }

    fn parse(protocol: &str, value: &str) -> Result<Self, AddressError> {
        let invalid = || AddressError::InvalidValue {
            protocol: protocol.to_string(),
            value: value.to_string(),
        };
        let host = match protocol {
            PROTO_IP4 => Host::Ip4(value.parse().map_err(|_| invalid())?),
            PROTO_IP6 => Host::Ip6(value.parse().map_err(|_| invalid())?),
            PROTO_DNS => Host::Dns(value.to_string()),
            PROTO_DNS4 => Host::Dns4(value.to_string()),
            PROTO_DNS6 => Host::Dns6(value.to_string()),
            other => return Err(AddressError::UnknownProtocol(other.to_string())),
        };
        host.validate()?;
        Ok(host)
    }

    /// Host names are restricted to letters, digits, `-`, `_` and `.` so
    /// that the rendered multiaddress always parses back to the same value.
    fn validate(&self) -> Result<(), AddressError> {
        let name = match self {
            Host::Dns(name) | Host::Dns4(name) | Host::Dns6(name) => name,
            Host::Ip4(_) | Host::Ip6(_) => return Ok(()),
        };
        if name.is_empty() {
            return Err(AddressError::EmptyHostName);
        }
        let legal = |c: char| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.');
        if !name.chars().all(legal) {
            return Err(AddressError::InvalidValue {
                protocol: self.protocol().to_string(),
                value: name.clone(),
            });
        }
        Ok(())
    }
}

impl fmt::Display for Host {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Host::Ip4(ip) => write!(f, "{ip}"),
            Host::Ip6(ip) => write!(f, "{ip}"),
            Host::Dns(name) | Host::Dns4(name) | Host::Dns6(name) => f.write_str(name),
        }
    }
}

/// Dialable location: host plus TCP port.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Location {
    host: Host,
    port: u16,
}

impl Location {
    /// Construct a location, rejecting port 0 and empty host names.
    pub fn new(host: Host, port: u16) -> Result<Self, AddressError> {
        host.validate()?;
        if port == 0 {
            return Err(AddressError::ZeroPort);
        }
        Ok(Self { host, port })
    }

    pub fn host(&self) -> &Host {
        &self.host
    }

    pub fn port(&self) -> u16 {
        self.port
    }
}

/// `host:port`, with IPv6 hosts bracketed.
impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.host {
            Host::Ip6(ip) => write!(f, "[{}]:{}", ip, self.port),
            host => write!(f, "{}:{}", host, self.port),
        }
    }
}

/// Location plus optional identity of a participant.
///
/// Immutable once constructed. `Display` renders the canonical multiaddress,
/// and parsing followed by display normalizes the text (lowercase
/// fingerprint, canonical IPv6 form).
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct NetworkAddress {
    location: Location,
    identity: Option<IdentityFingerprint>,
}

impl NetworkAddress {
    /// Address of an identified participant.
    pub fn new(location: Location, identity: IdentityFingerprint) -> Self {
        Self {
            location,
            identity: Some(identity),
        }
    }

    /// Address with no identity component.
    pub fn anonymous(location: Location) -> Self {
        Self {
            location,
            identity: None,
        }
    }

    pub fn location(&self) -> &Location {
        &self.location
    }

    pub fn identity(&self) -> Option<&IdentityFingerprint> {
        self.identity.as_ref()
    }
}

impl fmt::Display for NetworkAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let host = self.location.host();
        write!(
            f,
            "/{}/{}/{}/{}",
            host.protocol(),
            host,
            PROTO_TCP,
            self.location.port()
        )?;
        if let Some(identity) = &self.identity {
            write!(f, "/{}/{}", PROTO_REPUBLIC, identity)?;
        }
        Ok(())
    }
}

impl FromStr for NetworkAddress {
    type Err = AddressError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.is_empty() {
            return Err(AddressError::Empty);
        }
        let rest = s
            .strip_prefix('/')
            .ok_or_else(|| AddressError::MissingLeadingSlash(s.to_string()))?;

        // Tolerate a single trailing slash.
        let rest = rest.strip_suffix('/').unwrap_or(rest);
        let mut parts = rest.split('/');

        let mut next_pair = || -> Result<Option<(String, String)>, AddressError> {
            let Some(protocol) = parts.next() else {
                return Ok(None);
            };
            let value = parts
                .next()
                .filter(|v| !v.is_empty())
                .ok_or_else(|| AddressError::MissingValue(protocol.to_string()))?;
            Ok(Some((protocol.to_string(), value.to_string())))
        };

        let (proto, value) = next_pair()?.ok_or(AddressError::MissingHost)?;
        let host = match proto.as_str() {
            PROTO_TCP | PROTO_REPUBLIC => return Err(AddressError::MissingHost),
            _ => Host::parse(&proto, &value)?,
        };

        let (proto, value) = next_pair()?.ok_or(AddressError::MissingPort)?;
        if proto != PROTO_TCP {
            return Err(match proto.as_str() {
                PROTO_REPUBLIC => AddressError::MissingPort,
                PROTO_IP4 | PROTO_IP6 | PROTO_DNS | PROTO_DNS4 | PROTO_DNS6 => {
                    AddressError::UnexpectedProtocol(proto.clone())
                }
                _ => AddressError::UnknownProtocol(proto.clone()),
            });
        }
        let port: u16 = value.parse().map_err(|_| AddressError::InvalidValue {
            protocol: PROTO_TCP.to_string(),
            value: value.clone(),
        })?;
        let location = Location::new(host, port)?;

        let identity = match next_pair()? {
            None => None,
            Some((proto, value)) if proto == PROTO_REPUBLIC => {
                Some(IdentityFingerprint::from_hex(&value)?)
            }
            Some((proto, _)) => return Err(AddressError::UnexpectedProtocol(proto)),
        };

        if let Some((proto, _)) = next_pair()? {
            return Err(AddressError::UnexpectedProtocol(proto));
        }

        Ok(Self { location, identity })
    }
}
