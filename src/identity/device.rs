use crate::identity::PublicKey;
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Number of public-key bytes a device id keeps (16 hex chars)
pub const DEVICE_ID_LENGTH: usize = 8;

#[derive(Error, Debug)]
pub enum DeviceIdError {
    #[error("Invalid device id length: expected {expected} hex chars, got {got}")]
    InvalidLength { expected: usize, got: usize },

    #[error("Invalid hex encoding: {0}")]
    InvalidHex(String),
}

/// Device identifier: the fixed-length prefix of the public key's hex encoding
///
/// A device id names a peer compactly on constrained channels. It is not a
/// verification key; verification always goes through the full public key
/// carried alongside a signature.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DeviceId([u8; DEVICE_ID_LENGTH]);

impl DeviceId {
    /// Derive the device id from a public key
    pub fn from_public_key(public_key: &PublicKey) -> Self {
        let mut bytes = [0u8; DEVICE_ID_LENGTH];
        bytes.copy_from_slice(&public_key.as_bytes()[..DEVICE_ID_LENGTH]);
        Self(bytes)
    }

    /// Parse a device id from its 16-char hex form
    pub fn parse(s: &str) -> Result<Self, DeviceIdError> {
        if s.len() != DEVICE_ID_LENGTH * 2 {
            return Err(DeviceIdError::InvalidLength {
                expected: DEVICE_ID_LENGTH * 2,
                got: s.len(),
            });
        }

        let decoded = hex::decode(s).map_err(|e| DeviceIdError::InvalidHex(e.to_string()))?;
        let mut bytes = [0u8; DEVICE_ID_LENGTH];
        bytes.copy_from_slice(&decoded);
        Ok(Self(bytes))
    }

    /// Create from raw bytes
    pub fn from_bytes(bytes: [u8; DEVICE_ID_LENGTH]) -> Self {
        Self(bytes)
    }

    /// Get raw bytes
    pub fn as_bytes(&self) -> &[u8; DEVICE_ID_LENGTH] {
        &self.0
    }

    /// Check whether this id is the prefix of the given public key
    pub fn matches_key(&self, public_key: &PublicKey) -> bool {
        self.0[..] == public_key.as_bytes()[..DEVICE_ID_LENGTH]
    }
}

impl fmt::Display for DeviceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", hex::encode(self.0))
    }
}
