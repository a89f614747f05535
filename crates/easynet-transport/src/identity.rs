use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{Result, TransportError};

/// Size of an identity on the wire.
pub const IDENTITY_LEN: usize = 16;

/// Opaque 128-bit token naming one client endpoint.
///
/// Clients generate one at construction; servers only ever observe them on
/// inbound frames. Equality is byte-wise.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Identity(Uuid);

impl Identity {
    /// Generate a fresh random identity.
    pub fn random() -> Self {
        Self(Uuid::new_v4())
    }

    /// Reinterpret an identity segment received from the wire.
    pub fn from_slice(bytes: &[u8]) -> Result<Self> {
        let raw: [u8; IDENTITY_LEN] = bytes
            .try_into()
            .map_err(|_| TransportError::InvalidIdentity { len: bytes.len() })?;
        Ok(Self(Uuid::from_bytes(raw)))
    }

    /// Raw identity bytes.
    pub fn as_bytes(&self) -> &[u8; IDENTITY_LEN] {
        self.0.as_bytes()
    }

    /// Identity as an owned wire segment.
    pub fn to_segment(&self) -> bytes::Bytes {
        bytes::Bytes::copy_from_slice(self.as_bytes())
    }

    /// The all-zero identity.
    pub fn nil() -> Self {
        Self(Uuid::nil())
    }
}

impl fmt::Display for Identity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::str::FromStr for Identity {
    type Err = TransportError;

    fn from_str(s: &str) -> Result<Self> {
        Uuid::parse_str(s)
            .map(Self)
            .map_err(|_| TransportError::InvalidIdentity { len: s.len() })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn random_identities_differ() {
        let a = Identity::random();
        let b = Identity::random();
        assert_ne!(a, b);
    }

    #[test]
    fn slice_roundtrip_is_bytewise() {
        let id = Identity::random();
        let segment = id.to_segment();
        assert_eq!(segment.len(), IDENTITY_LEN);
        assert_eq!(Identity::from_slice(&segment).unwrap(), id);
    }

    #[test]
    fn from_slice_rejects_wrong_length() {
        let err = Identity::from_slice(b"short").unwrap_err();
        assert!(matches!(err, TransportError::InvalidIdentity { len: 5 }));
    }

    #[test]
    fn display_parses_back() {
        let id = Identity::random();
        let parsed: Identity = id.to_string().parse().unwrap();
        assert_eq!(parsed, id);
        assert_eq!(Identity::nil().to_string(), "00000000-0000-0000-0000-000000000000");
    }
}
