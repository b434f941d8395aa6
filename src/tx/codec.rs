use crate::tx::Transaction;
use thiserror::Error;

/// Errors that can occur during encoding/decoding
#[derive(Error, Debug)]
pub enum CodecError {
    #[error("Failed to decode transaction: {0}")]
    DecodeError(String),

    #[error("Invalid hex string: {0}")]
    InvalidHex(String),

    #[error("Invalid base64 string: {0}")]
    InvalidBase64(String),
}

/// Lossless codec for full-fidelity transaction records
///
/// This is the "fuller record" channel: a truncated wire payment received
/// over a constrained link is corroborated against one of these.
pub struct TxCodec;

impl TxCodec {
    /// Encode a transaction to compact binary bytes
    pub fn encode(tx: &Transaction) -> Vec<u8> {
        postcard::to_allocvec(tx).unwrap_or_default()
    }

    /// Decode a transaction from binary bytes
    pub fn decode(bytes: &[u8]) -> Result<Transaction, CodecError> {
        postcard::from_bytes(bytes).map_err(|e| CodecError::DecodeError(e.to_string()))
    }

    /// Encode to hex string
    pub fn encode_hex(tx: &Transaction) -> String {
        hex::encode(Self::encode(tx))
    }

    /// Decode from hex string
    pub fn decode_hex(hex_str: &str) -> Result<Transaction, CodecError> {
        let bytes = hex::decode(hex_str).map_err(|e| CodecError::InvalidHex(e.to_string()))?;
        Self::decode(&bytes)
    }

    /// Encode to base64 string (URL-safe, no padding)
    pub fn encode_base64(tx: &Transaction) -> String {
        use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};
        URL_SAFE_NO_PAD.encode(Self::encode(tx))
    }

    /// Decode from base64 string
    pub fn decode_base64(b64_str: &str) -> Result<Transaction, CodecError> {
        use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};
        let bytes = URL_SAFE_NO_PAD
            .decode(b64_str)
            .map_err(|e| CodecError::InvalidBase64(e.to_string()))?;
        Self::decode(&bytes)
    }
}
