use crate::identity::{Keypair, PublicKey};
use ed25519_dalek::{Signature as DalekSignature, Signer as DalekSigner, Verifier};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use thiserror::Error;

/// Length of an Ed25519 detached signature, in bytes
pub const SIGNATURE_LENGTH: usize = 64;

#[derive(Error, Debug)]
pub enum SignatureError {
    #[error("Invalid signature length: expected 64, got {0}")]
    InvalidLength(usize),

    #[error("Invalid signature bytes: {0}")]
    InvalidBytes(String),
}

/// Ed25519 detached signature (64 bytes)
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Signature {
    inner: DalekSignature,
    bytes: [u8; SIGNATURE_LENGTH],
}

impl Serialize for Signature {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_bytes(&self.bytes)
    }
}

impl<'de> Deserialize<'de> for Signature {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let bytes = <Vec<u8>>::deserialize(deserializer)?;
        Signature::from_bytes(&bytes).map_err(serde::de::Error::custom)
    }
}

impl Signature {
    /// Get the raw bytes of the signature
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Base64 encoding of the signature (standard alphabet, padded)
    pub fn to_base64(&self) -> String {
        use base64::{engine::general_purpose::STANDARD, Engine};
        STANDARD.encode(self.bytes)
    }

    /// Create a signature from raw bytes
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, SignatureError> {
        if bytes.len() != SIGNATURE_LENGTH {
            return Err(SignatureError::InvalidLength(bytes.len()));
        }

        let arr: [u8; SIGNATURE_LENGTH] = bytes
            .try_into()
            .map_err(|_| SignatureError::InvalidBytes("failed to convert to array".into()))?;

        Ok(Self {
            inner: DalekSignature::from_bytes(&arr),
            bytes: arr,
        })
    }

    fn from_inner(inner: DalekSignature) -> Self {
        let bytes = inner.to_bytes();
        Self { inner, bytes }
    }

    pub(crate) fn inner(&self) -> &DalekSignature {
        &self.inner
    }
}

/// Signing and verification over canonical byte payloads
///
/// Verification returns a boolean instead of an error so merge logic can
/// treat a bad signature as data about the entry, not as a fault.
pub struct Signer;

impl Signer {
    /// Sign a payload with a keypair, producing a detached signature
    pub fn sign(keypair: &Keypair, payload: &[u8]) -> Signature {
        let sig = keypair.signing_key().sign(payload);
        Signature::from_inner(sig)
    }

    /// Verify a detached signature against a public key and payload
    pub fn verify(public_key: &PublicKey, payload: &[u8], signature: &Signature) -> bool {
        public_key.inner().verify(payload, signature.inner()).is_ok()
    }
}
