// Ledger state - one device's transaction log and derived balances
//
// The persisted layout is the structured record {transactions, balance,
// nonce, merkle_snapshots, pending_transactions}; import(export(s)) must
// reproduce s exactly.

use crate::identity::DeviceId;
use crate::merkle::MerkleSnapshot;
use crate::tx::{Transaction, TxId};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Balance every ledger starts from; replay always begins here
pub const GENESIS_BALANCE: u64 = 1000;

#[derive(Error, Debug)]
pub enum LedgerError {
    #[error("Insufficient balance: available {available}, required {required}")]
    InsufficientBalance { available: u64, required: u64 },

    #[error("Transaction not found in pending queue: {0}")]
    TransactionNotFound(TxId),

    #[error("Invalid ledger format: {0}")]
    InvalidFormat(String),
}

/// Full ledger state of a single device
///
/// `transactions` is the finalized log in insertion order; `balance` and
/// `nonce` are derived but cached; snapshots are append-only.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct LedgerState {
    pub(crate) transactions: Vec<Transaction>,
    pub(crate) balance: u64,
    pub(crate) nonce: u64,
    pub(crate) merkle_snapshots: Vec<MerkleSnapshot>,
    pub(crate) pending_transactions: Vec<Transaction>,
}

impl LedgerState {
    /// Fresh ledger at the genesis balance
    pub fn new() -> Self {
        Self {
            transactions: Vec::new(),
            balance: GENESIS_BALANCE,
            nonce: 0,
            merkle_snapshots: Vec::new(),
            pending_transactions: Vec::new(),
        }
    }

    /// Finalized transaction log, in insertion order
    pub fn transactions(&self) -> &[Transaction] {
        &self.transactions
    }

    pub fn balance(&self) -> u64 {
        self.balance
    }

    pub fn nonce(&self) -> u64 {
        self.nonce
    }

    /// Snapshot history, oldest first
    pub fn merkle_snapshots(&self) -> &[MerkleSnapshot] {
        &self.merkle_snapshots
    }

    /// Transactions awaiting a peer receipt
    pub fn pending_transactions(&self) -> &[Transaction] {
        &self.pending_transactions
    }

    /// Look up a finalized transaction by id
    pub fn find_transaction(&self, id: &TxId) -> Option<&Transaction> {
        self.transactions.iter().find(|t| t.id() == id)
    }

    /// Export the full state as text
    pub fn export(&self) -> String {
        serde_json::to_string(self).unwrap_or_default()
    }

    /// Import a previously exported state; wholesale replace on success
    pub fn import(text: &str) -> Result<Self, LedgerError> {
        serde_json::from_str(text).map_err(|e| LedgerError::InvalidFormat(e.to_string()))
    }
}

impl Default for LedgerState {
    fn default() -> Self {
        Self::new()
    }
}

/// Recompute a device's balance by replaying a transaction log
///
/// Starts from the genesis constant; debits entries sent by the device and
/// credits entries received by it, counting only accepted-receipt entries.
/// Saturating arithmetic: a hostile history can pin the result at 0 but
/// never underflow.
pub fn replay_balance(transactions: &[Transaction], device: &DeviceId) -> u64 {
    let mut balance = GENESIS_BALANCE;

    for tx in transactions {
        if !tx.is_accepted() {
            continue;
        }
        if tx.from() == device {
            balance = balance.saturating_sub(tx.amount());
        } else if tx.to() == device {
            balance = balance.saturating_add(tx.amount());
        }
    }

    balance
}
