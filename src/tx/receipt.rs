// Receipt protocol - receiver-signed acknowledgment of a transaction
//
// A receipt either finalizes a pending transaction (accepted) or reverses it
// (rejected). The receiver signs `tx_id:status:timestamp`.

use crate::identity::{DeviceId, Keypair, PublicKey, Signature, Signer};
use crate::tx::model::now_millis;
use crate::tx::TxId;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Outcome a receiver attests to
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReceiptStatus {
    Accepted,
    Pending,
    Rejected,
}

impl ReceiptStatus {
    pub fn is_accepted(&self) -> bool {
        matches!(self, ReceiptStatus::Accepted)
    }
}

impl fmt::Display for ReceiptStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ReceiptStatus::Accepted => write!(f, "accepted"),
            ReceiptStatus::Pending => write!(f, "pending"),
            ReceiptStatus::Rejected => write!(f, "rejected"),
        }
    }
}

/// Peer acknowledgment of a transaction, signed by the receiving device
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionReceipt {
    tx_id: TxId,
    receiver_key: PublicKey,
    signature: Signature,
    timestamp: u64,
    status: ReceiptStatus,
}

impl TransactionReceipt {
    /// Sign a receipt for a transaction on the receiving device
    pub fn create(keypair: &Keypair, tx_id: TxId, status: ReceiptStatus) -> Self {
        let timestamp = now_millis();
        let payload = signing_bytes(&tx_id, status, timestamp);
        let signature = Signer::sign(keypair, &payload);

        Self {
            tx_id,
            receiver_key: keypair.public_key(),
            signature,
            timestamp,
            status,
        }
    }

    pub fn tx_id(&self) -> &TxId {
        &self.tx_id
    }

    pub fn receiver_key(&self) -> &PublicKey {
        &self.receiver_key
    }

    pub fn signature(&self) -> &Signature {
        &self.signature
    }

    pub fn timestamp(&self) -> u64 {
        self.timestamp
    }

    pub fn status(&self) -> ReceiptStatus {
        self.status
    }

    /// Device id of the signing receiver
    pub fn receiver_id(&self) -> DeviceId {
        DeviceId::from_public_key(&self.receiver_key)
    }

    /// Verify the receiver's signature; false on any mismatch, never a fault
    pub fn verify(&self) -> bool {
        let payload = signing_bytes(&self.tx_id, self.status, self.timestamp);
        Signer::verify(&self.receiver_key, &payload, &self.signature)
    }
}

fn signing_bytes(tx_id: &TxId, status: ReceiptStatus, timestamp: u64) -> Vec<u8> {
    format!("{tx_id}:{status}:{timestamp}").into_bytes()
}
