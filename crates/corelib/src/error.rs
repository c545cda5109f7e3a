//! Error types for the core library.

use thiserror::Error;

/// Result type alias for the core library.
pub type Result<T> = std::result::Result<T, Error>;

/// Reasons an address cannot be parsed or canonicalized.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AddressError {
    /// Empty input
    #[error("address is empty")]
    Empty,
    /// Multiaddress text must start with `/`
    #[error("address must start with '/': {0}")]
    MissingLeadingSlash(String),
    /// Protocol name not understood by the codec
    #[error("unknown protocol: {0}")]
    UnknownProtocol(String),
    /// Protocol present without its value
    #[error("protocol {0} is missing its value")]
    MissingValue(String),
    /// Protocol value failed to parse
    #[error("invalid value for {protocol}: {value}")]
    InvalidValue { protocol: String, value: String },
    /// Protocols out of order or repeated
    #[error("unexpected protocol {0} at this position")]
    UnexpectedProtocol(String),
    /// No host component
    #[error("address has no host component")]
    MissingHost,
    /// No `/tcp/<port>` component
    #[error("address has no tcp port")]
    MissingPort,
    /// Port zero is not dialable
    #[error("port 0 is not a dialable port")]
    ZeroPort,
    /// DNS host name is empty
    #[error("dns host name is empty")]
    EmptyHostName,
    /// No `/republic/<identity>` component
    #[error("address has no identity fingerprint")]
    MissingIdentity,
    /// Fingerprint is empty or not valid hex
    #[error("invalid identity fingerprint: {0}")]
    InvalidFingerprint(String),
    /// Resolver has no address for this participant
    #[error("no known address for participant {0}")]
    UnknownParticipant(String),
}

/// Errors that can occur in the core library.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Error {
    /// Address could not be canonicalized
    #[error("invalid address: {0}")]
    InvalidAddress(#[from] AddressError),
    /// Envelope could not be encoded or decoded
    #[error("envelope encoding failed: {0}")]
    Envelope(String),
}

impl From<bincode::Error> for Error {
    fn from(err: bincode::Error) -> Self {
        Error::Envelope(err.to_string())
    }
}
