//! The 16-byte client identity, parsed from its dashed-hex (UUID) text form.

use crate::error::IdentityError;
use std::fmt;
use std::str::FromStr;

/// The configured 16-byte identifier a client must present in the
/// destination header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClientId([u8; 16]);

impl ClientId {
    pub fn from_bytes(bytes: [u8; 16]) -> Self {
        Self(bytes)
    }

    pub fn as_bytes(&self) -> &[u8; 16] {
        &self.0
    }

    /// Whether the given wire bytes equal this identity exactly.
    pub fn matches(&self, bytes: &[u8]) -> bool {
        bytes == self.0
    }
}

impl FromStr for ClientId {
    type Err = IdentityError;

    /// Parse the dashed-hex form, e.g.
    /// `7bd180e8-1142-4387-93f5-03e8d750a896`. Dashes are stripped; exactly
    /// 32 hex digits must remain.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let stripped: String = s.chars().filter(|&c| c != '-').collect();
        let raw = hex::decode(&stripped).map_err(|e| IdentityError::InvalidHex(e.to_string()))?;
        let bytes: [u8; 16] = raw
            .as_slice()
            .try_into()
            .map_err(|_| IdentityError::BadLength(raw.len()))?;
        Ok(Self(bytes))
    }
}

impl fmt::Display for ClientId {
    /// Canonical dashed form (8-4-4-4-12), used in the generated
    /// subscription URL.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let h = hex::encode(self.0);
        write!(
            f,
            "{}-{}-{}-{}-{}",
            &h[..8],
            &h[8..12],
            &h[12..16],
            &h[16..20],
            &h[20..]
        )
    }
}
