// Wire codec - lossy textual payment record for very low-bandwidth channels
//
// Format: PAY|from|to|amount|nonce|timestamp|signature, with device ids cut
// to 8 hex chars and the signature to 32 base64 chars. The truncation makes a
// decoded record NOT independently verifiable; it must be corroborated
// through a full record obtained via another channel (see `TxCodec`).

use crate::tx::Transaction;
use serde::{Deserialize, Serialize};
use thiserror::Error;

const WIRE_TAG: &str = "PAY";
const ID_CHARS: usize = 8;
const SIG_CHARS: usize = 32;

#[derive(Error, Debug)]
pub enum WireError {
    #[error("Invalid wire format: {0}")]
    InvalidFormat(String),
}

/// A decoded (truncated, unverifiable) wire payment record
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct WirePayment {
    from: String,
    to: String,
    amount: u64,
    nonce: u64,
    timestamp: u64,
    signature: String,
}

impl WirePayment {
    /// Encode a transaction into the 7-field pipe-delimited text record
    pub fn encode(tx: &Transaction) -> String {
        let from = tx.from().to_string();
        let to = tx.to().to_string();
        let sig = tx.signature().to_base64();

        format!(
            "{WIRE_TAG}|{}|{}|{}|{}|{}|{}",
            &from[..ID_CHARS],
            &to[..ID_CHARS],
            tx.amount(),
            tx.nonce(),
            tx.timestamp(),
            &sig[..SIG_CHARS],
        )
    }

    /// Decode a wire record; fails unless the tag matches and at least
    /// 7 fields are present
    pub fn decode(text: &str) -> Result<Self, WireError> {
        let parts: Vec<&str> = text.split('|').collect();

        if parts.first() != Some(&WIRE_TAG) {
            return Err(WireError::InvalidFormat(format!(
                "expected '{WIRE_TAG}' tag"
            )));
        }
        if parts.len() < 7 {
            return Err(WireError::InvalidFormat(format!(
                "expected 7 fields, got {}",
                parts.len()
            )));
        }

        let amount = parse_field(parts[3], "amount")?;
        let nonce = parse_field(parts[4], "nonce")?;
        let timestamp = parse_field(parts[5], "timestamp")?;

        Ok(Self {
            from: parts[1].to_string(),
            to: parts[2].to_string(),
            amount,
            nonce,
            timestamp,
            signature: parts[6].to_string(),
        })
    }

    /// Truncated sender id (8 hex chars)
    pub fn from(&self) -> &str {
        &self.from
    }

    /// Truncated receiver id (8 hex chars)
    pub fn to(&self) -> &str {
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

    /// Truncated signature (32 base64 chars); never verifiable on its own
    pub fn signature(&self) -> &str {
        &self.signature
    }

    /// Check whether a full transaction matches this truncated record
    pub fn corroborates(&self, tx: &Transaction) -> bool {
        tx.from().to_string().starts_with(&self.from)
            && tx.to().to_string().starts_with(&self.to)
            && tx.amount() == self.amount
            && tx.nonce() == self.nonce
            && tx.timestamp() == self.timestamp
            && tx.signature().to_base64().starts_with(&self.signature)
    }
}

fn parse_field(raw: &str, name: &str) -> Result<u64, WireError> {
    raw.parse::<u64>()
        .map_err(|_| WireError::InvalidFormat(format!("non-numeric {name} field: '{raw}'")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::identity::{DeviceId, Keypair};
    use crate::tx::Transport;

    fn sample_tx() -> Transaction {
        let sender = Keypair::generate();
        let to = DeviceId::from_public_key(&Keypair::generate().public_key());
        Transaction::build_signed(&sender, to, 250, 3, Transport::Sms)
    }

    #[test]
    fn test_encode_has_seven_fields_and_tag() {
        let text = WirePayment::encode(&sample_tx());
        let parts: Vec<&str> = text.split('|').collect();
        assert_eq!(parts.len(), 7);
        assert_eq!(parts[0], "PAY");
        assert_eq!(parts[1].len(), ID_CHARS);
        assert_eq!(parts[6].len(), SIG_CHARS);
    }

    #[test]
    fn test_decode_roundtrip_is_lossy_but_consistent() {
        let tx = sample_tx();
        let decoded = WirePayment::decode(&WirePayment::encode(&tx)).unwrap();

        assert_eq!(decoded.amount(), tx.amount());
        assert_eq!(decoded.nonce(), tx.nonce());
        assert!(decoded.corroborates(&tx));
    }

    #[test]
    fn test_decode_rejects_bad_tag() {
        assert!(WirePayment::decode("NOPE|a|b|1|2|3|sig").is_err());
    }

    #[test]
    fn test_decode_rejects_short_record() {
        assert!(WirePayment::decode("PAY|a|b|1|2").is_err());
    }

    #[test]
    fn test_decode_rejects_non_numeric_amount() {
        assert!(WirePayment::decode("PAY|a|b|xx|2|3|sig").is_err());
    }
}
