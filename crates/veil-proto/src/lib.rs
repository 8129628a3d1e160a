//! veil-proto: Shared protocol library for the veil bridge.
//!
//! Provides the destination header decoder, the client identity type,
//! and the decode error taxonomy. Pure parsing only — no I/O.

pub mod error;
pub mod header;
pub mod identity;

// Re-export commonly used items at crate root.
pub use error::{DecodeError, IdentityError};
pub use header::{decode, DestinationAddress, DestinationDescriptor, HEADER_MIN_LEN};
pub use identity::ClientId;

/// Protocol version accepted in the first byte of the destination header.
pub const PROTOCOL_VERSION: u8 = 0;

/// The two-byte acknowledgment frame sent once the header is accepted.
pub const HANDSHAKE_ACK: [u8; 2] = [0x00, 0x00];
