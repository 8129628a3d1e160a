use thiserror::Error;

/// Errors produced when decoding the destination header frame.
///
/// Every malformed input maps to exactly one of these, so callers and tests
/// can assert on the specific failure site instead of a blanket reject.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum DecodeError {
    /// The frame ends before a required field.
    #[error("frame too short")]
    TooShort,

    /// The version byte is not the supported protocol version.
    #[error("unsupported protocol version: {0}")]
    UnsupportedVersion(u8),

    /// The 16 identifier bytes do not match the configured client identity.
    #[error("client identity mismatch")]
    IdentityMismatch,

    /// The address-kind selector byte is none of IPv4/Domain/IPv6.
    #[error("unknown address kind: {0}")]
    UnknownAddressKind(u8),

    /// A domain address whose bytes are not valid UTF-8.
    #[error("domain name is not valid UTF-8")]
    InvalidDomain,
}

/// Errors produced when parsing a textual client identifier.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum IdentityError {
    #[error("identifier is not valid hex: {0}")]
    InvalidHex(String),

    #[error("identifier must be 16 bytes, got {0}")]
    BadLength(usize),
}
