// Transaction model - canonical representation of a transfer
//
// The canonical serialization `id:from:to:amount:nonce:timestamp` is part of
// the protocol: signatures and Merkle leaves both commit to it, so its shape
// must never change.

use crate::identity::{DeviceId, Keypair, PublicKey, Signature, Signer};
use crate::tx::TransactionReceipt;
use rand::RngCore;
use serde::{Deserialize, Serialize};
use sha2::{Digest as Sha2Digest, Sha256};
use std::fmt;
use std::time::{SystemTime, UNIX_EPOCH};

/// Current time as milliseconds since the Unix epoch
pub(crate) fn now_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis() as u64
}

/// SHA-256 content digest (32 bytes)
///
/// Fingerprints a transaction's canonical form; also the node hash type of
/// the Merkle tree.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Digest([u8; 32]);

impl Digest {
    /// Hash arbitrary bytes
    pub fn of(bytes: &[u8]) -> Self {
        let hash = Sha256::digest(bytes);
        let mut out = [0u8; 32];
        out.copy_from_slice(&hash);
        Self(out)
    }

    /// Create from raw bytes
    pub fn from_bytes(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    /// Get raw bytes
    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }
}

impl fmt::Display for Digest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", hex::encode(self.0))
    }
}

/// Unique transaction identifier (16 bytes, 32 hex chars)
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TxId([u8; 16]);

impl TxId {
    /// Derive a fresh id from the sending device, its nonce, and OS randomness
    ///
    /// Uniqueness comes from the CSPRNG entropy; the device id and nonce keep
    /// the id attributable even under clock skew.
    pub fn generate(device: &DeviceId, nonce: u64, timestamp: u64) -> Self {
        let mut entropy = [0u8; 16];
        rand::rngs::OsRng.fill_bytes(&mut entropy);

        let mut hasher = Sha256::new();
        hasher.update(b"txid:");
        hasher.update(device.as_bytes());
        hasher.update(nonce.to_le_bytes());
        hasher.update(timestamp.to_le_bytes());
        hasher.update(entropy);
        let hash = hasher.finalize();

        let mut bytes = [0u8; 16];
        bytes.copy_from_slice(&hash[..16]);
        Self(bytes)
    }

    /// Create from raw bytes
    pub fn from_bytes(bytes: [u8; 16]) -> Self {
        Self(bytes)
    }

    /// Get raw bytes
    pub fn as_bytes(&self) -> &[u8; 16] {
        &self.0
    }
}

impl fmt::Display for TxId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", hex::encode(self.0))
    }
}

/// Channel a transaction traveled over; opaque to the core
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Transport {
    Ble,
    Nfc,
    LoRa,
    Sms,
}

impl fmt::Display for Transport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Transport::Ble => write!(f, "BLE"),
            Transport::Nfc => write!(f, "NFC"),
            Transport::LoRa => write!(f, "LoRa"),
            Transport::Sms => write!(f, "SMS"),
        }
    }
}

/// Transport metadata attached to a transaction
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TxMetadata {
    pub transport: Transport,
    pub offline: bool,
}

/// A signed value transfer between two devices
///
/// `sender_key` is the claimed sender's full public key; `from` must be its
/// derived device id. The key rides outside the canonical form so any holder
/// can verify the signature without a directory lookup.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Transaction {
    id: TxId,
    from: DeviceId,
    to: DeviceId,
    amount: u64,
    nonce: u64,
    timestamp: u64,
    sender_key: PublicKey,
    signature: Signature,
    receipt: Option<TransactionReceipt>,
    metadata: Option<TxMetadata>,
}

impl Transaction {
    /// Build and sign a transaction from the sending device's keypair
    pub fn build_signed(
        keypair: &Keypair,
        to: DeviceId,
        amount: u64,
        nonce: u64,
        transport: Transport,
    ) -> Self {
        let sender_key = keypair.public_key();
        let from = DeviceId::from_public_key(&sender_key);
        let timestamp = now_millis();
        let id = TxId::generate(&from, nonce, timestamp);

        let canonical = canonical_bytes(&id, &from, &to, amount, nonce, timestamp);
        let signature = Signer::sign(keypair, &canonical);

        Self {
            id,
            from,
            to,
            amount,
            nonce,
            timestamp,
            sender_key,
            signature,
            receipt: None,
            metadata: Some(TxMetadata {
                transport,
                offline: true,
            }),
        }
    }

    pub fn id(&self) -> &TxId {
        &self.id
    }

    pub fn from(&self) -> &DeviceId {
        &self.from
    }

    pub fn to(&self) -> &DeviceId {
        &self.to
    }

    pub fn amount(&self) -> u64 {
        self.amount
    }

    pub fn nonce(&self) -> u64 {
        self.nonce
    }

    pub fn timestamp(&self) -> u64 {
        self.timestamp
    }

    pub fn sender_key(&self) -> &PublicKey {
        &self.sender_key
    }

    pub fn signature(&self) -> &Signature {
        &self.signature
    }

    pub fn receipt(&self) -> Option<&TransactionReceipt> {
        self.receipt.as_ref()
    }

    pub fn metadata(&self) -> Option<&TxMetadata> {
        self.metadata.as_ref()
    }

    /// Canonical serialization: `id:from:to:amount:nonce:timestamp`
    pub fn canonical_bytes(&self) -> Vec<u8> {
        canonical_bytes(
            &self.id,
            &self.from,
            &self.to,
            self.amount,
            self.nonce,
            self.timestamp,
        )
    }

    /// SHA-256 digest of the canonical form
    ///
    /// Two transactions with the same id but different digests are a
    /// conflict: same identity, divergent content.
    pub fn content_digest(&self) -> Digest {
        Digest::of(&self.canonical_bytes())
    }

    /// Verify the signature against the claimed sender
    ///
    /// Checks that the carried key actually derives the declared `from` id,
    /// then verifies the detached signature over the canonical form. Returns
    /// false (never panics) for any mismatch.
    pub fn verify(&self) -> bool {
        if !self.from.matches_key(&self.sender_key) {
            return false;
        }
        Signer::verify(&self.sender_key, &self.canonical_bytes(), &self.signature)
    }

    /// Copy of this transaction with a receipt attached
    pub fn with_receipt(&self, receipt: TransactionReceipt) -> Self {
        let mut tx = self.clone();
        tx.receipt = Some(receipt);
        tx
    }

    /// True if this transaction carries an accepted receipt
    pub fn is_accepted(&self) -> bool {
        self.receipt
            .as_ref()
            .map(|r| r.status().is_accepted())
            .unwrap_or(false)
    }
}

impl PartialEq for Transaction {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id && self.content_digest() == other.content_digest()
    }
}

impl Eq for Transaction {}

fn canonical_bytes(
    id: &TxId,
    from: &DeviceId,
    to: &DeviceId,
    amount: u64,
    nonce: u64,
    timestamp: u64,
) -> Vec<u8> {
    format!("{id}:{from}:{to}:{amount}:{nonce}:{timestamp}").into_bytes()
}
