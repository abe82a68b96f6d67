use std::fmt::{Debug, Display, Formatter};
use std::str::FromStr;

use data_encoding::{HEXLOWER, HEXLOWER_PERMISSIVE};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use thiserror::Error;

/// Number of bytes in an [`Identity`].
pub const IDENTITY_LEN: usize = 20;

/// An opaque participant identity: the admin, a voter, or a candidate.
///
/// The engine never looks inside an identity; it only compares them. The text form
/// is `0x` followed by 40 hex digits, and that is also how identities serialize.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub struct Identity([u8; IDENTITY_LEN]);

impl Identity {
    /// Wrap raw identity bytes.
    pub const fn from_bytes(bytes: [u8; IDENTITY_LEN]) -> Self {
        Self(bytes)
    }

    /// Derive the identity belonging to a public key: the trailing
    /// [`IDENTITY_LEN`] bytes of its SHA-256 digest.
    pub fn from_public_key(key: impl AsRef<[u8]>) -> Self {
        let digest = Sha256::digest(key.as_ref());
        let mut bytes = [0_u8; IDENTITY_LEN];
        bytes.copy_from_slice(&digest[digest.len() - IDENTITY_LEN..]);
        Self(bytes)
    }

    pub fn as_bytes(&self) -> &[u8; IDENTITY_LEN] {
        &self.0
    }
}

impl Debug for Identity {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "Identity({})", self)
    }
}

impl Display for Identity {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "0x{}", HEXLOWER.encode(&self.0))
    }
}

/// Reasons a string is not a valid [`Identity`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum IdentityParseError {
    #[error("identity must be {expected} hex digits, got {found}")]
    Length { expected: usize, found: usize },
    #[error("identity contains non-hex characters")]
    NotHex,
}

impl FromStr for Identity {
    type Err = IdentityParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let digits = s
            .strip_prefix("0x")
            .or_else(|| s.strip_prefix("0X"))
            .unwrap_or(s);
        if digits.len() != IDENTITY_LEN * 2 {
            return Err(IdentityParseError::Length {
                expected: IDENTITY_LEN * 2,
                found: digits.len(),
            });
        }
        let mut bytes = [0_u8; IDENTITY_LEN];
        HEXLOWER_PERMISSIVE
            .decode_mut(digits.as_bytes(), &mut bytes)
            .map_err(|_| IdentityParseError::NotHex)?;
        Ok(Self(bytes))
    }
}

impl TryFrom<String> for Identity {
    type Error = IdentityParseError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

impl From<Identity> for String {
    fn from(id: Identity) -> Self {
        id.to_string()
    }
}

/// Example data for tests.
#[cfg(test)]
mod examples {
    use super::*;

    impl Identity {
        /// The identity every injected test election is administered by.
        pub fn example_admin() -> Self {
            Self::from_public_key(b"coordinator")
        }

        /// A distinct non-admin identity per `n`.
        pub fn example(n: u8) -> Self {
            let mut bytes = [0_u8; IDENTITY_LEN];
            bytes[0] = 0xee;
            bytes[IDENTITY_LEN - 1] = n;
            Self(bytes)
        }
    }
}
