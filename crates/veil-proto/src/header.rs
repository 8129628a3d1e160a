//! Destination header decoder.
//!
//! Wire format of the first binary frame on a session:
//!
//! `[version:1][identifier:16][addons_len:1][addons:addons_len][port:2 BE][kind:1][address:variable]`
//!
//! followed by optional trailing application payload. The addons region is a
//! protocol extension area and is skipped, not interpreted.

use crate::error::DecodeError;
use crate::identity::ClientId;
use crate::PROTOCOL_VERSION;
use std::fmt;
use std::net::{Ipv4Addr, Ipv6Addr};

/// Minimum frame length: version + identifier + addons length byte.
/// Anything shorter cannot even carry the fixed prefix.
pub const HEADER_MIN_LEN: usize = 18;

/// The destination a client asked to reach, decoded from the header.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DestinationAddress {
    Ipv4(Ipv4Addr),
    Domain(String),
    Ipv6(Ipv6Addr),
}

impl fmt::Display for DestinationAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DestinationAddress::Ipv4(ip) => write!(f, "{ip}"),
            DestinationAddress::Domain(d) => f.write_str(d),
            // Fixed-width form: eight lowercase 4-hex-digit groups, never
            // `::`-compressed. The resolver's literal-IP check still parses it.
            DestinationAddress::Ipv6(ip) => {
                let seg = ip.segments();
                write!(
                    f,
                    "{:04x}:{:04x}:{:04x}:{:04x}:{:04x}:{:04x}:{:04x}:{:04x}",
                    seg[0], seg[1], seg[2], seg[3], seg[4], seg[5], seg[6], seg[7]
                )
            }
        }
    }
}

/// Parsed representation of the first protocol frame. Immutable for the
/// lifetime of the session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DestinationDescriptor {
    /// Destination TCP port.
    pub port: u16,
    /// Destination host (literal IP or domain name).
    pub address: DestinationAddress,
    /// Offset into the original frame where trailing first-payload bytes
    /// begin. Always `<= frame.len()`.
    pub payload_offset: usize,
}

impl DestinationDescriptor {
    /// Textual host form handed to the resolver and connector.
    pub fn host(&self) -> String {
        self.address.to_string()
    }
}

/// Bounds-checked reader over the frame. Every `take` that would run off the
/// end is a `TooShort` decode failure.
struct Cursor<'a> {
    buf: &'a [u8],
    pos: usize,
}

impl<'a> Cursor<'a> {
    fn new(buf: &'a [u8]) -> Self {
        Self { buf, pos: 0 }
    }

    fn take(&mut self, n: usize) -> Result<&'a [u8], DecodeError> {
        let end = self.pos.checked_add(n).ok_or(DecodeError::TooShort)?;
        if end > self.buf.len() {
            return Err(DecodeError::TooShort);
        }
        let slice = &self.buf[self.pos..end];
        self.pos = end;
        Ok(slice)
    }

    fn take_u8(&mut self) -> Result<u8, DecodeError> {
        Ok(self.take(1)?[0])
    }

    fn take_u16_be(&mut self) -> Result<u16, DecodeError> {
        let b = self.take(2)?;
        Ok(u16::from_be_bytes([b[0], b[1]]))
    }
}

/// Decode the first binary frame of a session into a destination descriptor.
///
/// Pure parse, no side effects. The caller forwards
/// `frame[descriptor.payload_offset..]` to the destination as the first
/// payload bytes.
pub fn decode(frame: &[u8], expected: &ClientId) -> Result<DestinationDescriptor, DecodeError> {
    if frame.len() < HEADER_MIN_LEN {
        return Err(DecodeError::TooShort);
    }

    let mut cur = Cursor::new(frame);

    let version = cur.take_u8()?;
    if version != PROTOCOL_VERSION {
        return Err(DecodeError::UnsupportedVersion(version));
    }

    let identifier = cur.take(16)?;
    if !expected.matches(identifier) {
        return Err(DecodeError::IdentityMismatch);
    }

    // Extension region: skipped, never interpreted.
    let addons_len = cur.take_u8()?;
    cur.take(addons_len as usize)?;

    let port = cur.take_u16_be()?;

    let kind = cur.take_u8()?;
    let address = match kind {
        1 => {
            let b = cur.take(4)?;
            DestinationAddress::Ipv4(Ipv4Addr::new(b[0], b[1], b[2], b[3]))
        }
        2 => {
            let len = cur.take_u8()?;
            let raw = cur.take(len as usize)?;
            let domain =
                std::str::from_utf8(raw).map_err(|_| DecodeError::InvalidDomain)?;
            DestinationAddress::Domain(domain.to_string())
        }
        3 => {
            let b = cur.take(16)?;
            let mut seg = [0u16; 8];
            for (i, s) in seg.iter_mut().enumerate() {
                *s = u16::from_be_bytes([b[2 * i], b[2 * i + 1]]);
            }
            DestinationAddress::Ipv6(Ipv6Addr::from(seg))
        }
        other => return Err(DecodeError::UnknownAddressKind(other)),
    };

    Ok(DestinationDescriptor {
        port,
        address,
        payload_offset: cur.pos,
    })
}
