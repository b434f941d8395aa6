use ed25519_dalek::{SigningKey, VerifyingKey};
use rand::rngs::OsRng;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use thiserror::Error;

/// Length of Ed25519 keys and seeds, in bytes
pub const KEY_LENGTH: usize = 32;

#[derive(Error, Debug)]
pub enum KeypairError {
    #[error("Invalid key length: expected {expected}, got {got}")]
    InvalidLength { expected: usize, got: usize },

    #[error("Invalid key bytes: {0}")]
    InvalidBytes(String),
}

/// Ed25519 public key (32 bytes)
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PublicKey(VerifyingKey);

impl Serialize for PublicKey {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_bytes(self.0.as_bytes())
    }
}

impl<'de> Deserialize<'de> for PublicKey {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let bytes = <Vec<u8>>::deserialize(deserializer)?;
        PublicKey::from_bytes(&bytes).map_err(serde::de::Error::custom)
    }
}

impl PublicKey {
    /// Get the raw bytes of the public key
    pub fn as_bytes(&self) -> &[u8] {
        self.0.as_bytes()
    }

    /// Hex encoding of the full public key
    pub fn to_hex(&self) -> String {
        hex::encode(self.0.as_bytes())
    }

    /// Create a public key from raw bytes
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, KeypairError> {
        if bytes.len() != KEY_LENGTH {
            return Err(KeypairError::InvalidLength {
                expected: KEY_LENGTH,
                got: bytes.len(),
            });
        }

        let arr: [u8; KEY_LENGTH] = bytes
            .try_into()
            .map_err(|_| KeypairError::InvalidBytes("failed to convert to array".into()))?;

        let verifying_key = VerifyingKey::from_bytes(&arr)
            .map_err(|e| KeypairError::InvalidBytes(e.to_string()))?;

        Ok(Self(verifying_key))
    }

    /// Get the inner verifying key (for internal use)
    pub(crate) fn inner(&self) -> &VerifyingKey {
        &self.0
    }
}

/// Ed25519 secret key (32 bytes)
#[derive(Clone)]
pub struct SecretKey(SigningKey);

impl SecretKey {
    /// Get the raw bytes of the secret key
    pub fn to_bytes(&self) -> [u8; KEY_LENGTH] {
        self.0.to_bytes()
    }

    /// Create a secret key from raw bytes
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, KeypairError> {
        if bytes.len() != KEY_LENGTH {
            return Err(KeypairError::InvalidLength {
                expected: KEY_LENGTH,
                got: bytes.len(),
            });
        }

        let arr: [u8; KEY_LENGTH] = bytes
            .try_into()
            .map_err(|_| KeypairError::InvalidBytes("failed to convert to array".into()))?;

        Ok(Self(SigningKey::from_bytes(&arr)))
    }
}

/// Ed25519 signing keypair, bound to one device for its lifetime
#[derive(Clone)]
pub struct Keypair {
    signing_key: SigningKey,
}

impl Keypair {
    /// Generate a new random keypair
    pub fn generate() -> Self {
        let signing_key = SigningKey::generate(&mut OsRng);
        Self { signing_key }
    }

    /// Derive a keypair deterministically from a 32-byte seed
    ///
    /// The same seed always yields the same keypair; an Ed25519 seed is
    /// exactly the signing key bytes.
    pub fn from_seed(seed: [u8; KEY_LENGTH]) -> Self {
        Self {
            signing_key: SigningKey::from_bytes(&seed),
        }
    }

    /// Get the public key
    pub fn public_key(&self) -> PublicKey {
        PublicKey(self.signing_key.verifying_key())
    }

    /// Get the secret key
    pub fn secret_key(&self) -> SecretKey {
        SecretKey(self.signing_key.clone())
    }

    /// Serialize the keypair to bytes (secret key bytes)
    pub fn to_bytes(&self) -> Vec<u8> {
        self.signing_key.to_bytes().to_vec()
    }

    /// Deserialize a keypair from bytes
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, KeypairError> {
        if bytes.len() != KEY_LENGTH {
            return Err(KeypairError::InvalidLength {
                expected: KEY_LENGTH,
                got: bytes.len(),
            });
        }

        let arr: [u8; KEY_LENGTH] = bytes
            .try_into()
            .map_err(|_| KeypairError::InvalidBytes("failed to convert to array".into()))?;

        Ok(Self {
            signing_key: SigningKey::from_bytes(&arr),
        })
    }

    /// Create a keypair from an existing secret key
    pub fn from_secret_key(secret: SecretKey) -> Self {
        Self {
            signing_key: secret.0,
        }
    }

    /// Get the inner signing key (for internal use)
    pub(crate) fn signing_key(&self) -> &SigningKey {
        &self.signing_key
    }
}
