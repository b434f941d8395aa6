// Reconciliation engine - merging two divergent ledger histories
//
// A pure function over two ledger snapshots. It classifies remote entries as
// new, conflicting, or unverifiable, and produces a merged state the caller
// must apply explicitly. It never mutates either input and never picks a
// winner for a conflict; resolution belongs to an external authority.

use crate::identity::DeviceId;
use crate::ledger::state::{replay_balance, LedgerState};
use crate::tx::{Transaction, TxId};
use std::collections::HashMap;
use tracing::{debug, warn};

/// Outcome of reconciling a remote ledger against the local one
#[derive(Clone, Debug)]
pub struct ReconcileReport {
    /// Remote entries sharing an id with a local entry but differing in
    /// content; a signal of replay or double-spend, left unresolved
    pub conflicts: Vec<Transaction>,
    /// Remote entries unknown to the local log (verified or not)
    pub new_transactions: Vec<Transaction>,
    /// The merged state; apply via `Wallet::apply_merged_state`
    pub merged: LedgerState,
}

/// Merge `remote` into `local` on behalf of `device`
///
/// The merged log is the local log plus every admitted new entry, ordered by
/// ascending timestamp with original relative order preserved on ties. The
/// balance is never carried over arithmetically; it is recomputed by replay
/// against `device` from the genesis constant. Local snapshots and the local
/// pending queue pass through untouched; remote ones are not merged.
pub fn reconcile(local: &LedgerState, remote: &LedgerState, device: &DeviceId) -> ReconcileReport {
    let local_index: HashMap<TxId, &Transaction> = local
        .transactions()
        .iter()
        .map(|tx| (*tx.id(), tx))
        .collect();

    let mut conflicts = Vec::new();
    let mut new_transactions = Vec::new();

    for remote_tx in remote.transactions() {
        match local_index.get(remote_tx.id()) {
            None => new_transactions.push(remote_tx.clone()),
            Some(local_tx) => {
                if local_tx.content_digest() != remote_tx.content_digest() {
                    warn!(
                        tx_id = %remote_tx.id(),
                        "conflicting content for known transaction id"
                    );
                    conflicts.push(remote_tx.clone());
                }
            }
        }
    }

    // Admission rule: an entry nobody can attribute is neither merged nor
    // reported; it is dropped here.
    let admitted: Vec<Transaction> = new_transactions
        .iter()
        .filter(|tx| {
            let ok = tx.verify();
            if !ok {
                debug!(tx_id = %tx.id(), "dropping unverifiable remote entry");
            }
            ok
        })
        .cloned()
        .collect();

    let mut merged_log: Vec<Transaction> = local.transactions().to_vec();
    merged_log.extend(admitted);
    // stable sort: equal timestamps keep local-before-remote order
    merged_log.sort_by_key(|tx| tx.timestamp());

    let balance = replay_balance(&merged_log, device);

    debug!(
        new = new_transactions.len(),
        conflicts = conflicts.len(),
        merged_len = merged_log.len(),
        balance,
        "reconciled remote ledger"
    );

    let merged = LedgerState {
        transactions: merged_log,
        balance,
        nonce: local.nonce().max(remote.nonce()),
        merkle_snapshots: local.merkle_snapshots().to_vec(),
        pending_transactions: local.pending_transactions().to_vec(),
    };

    ReconcileReport {
        conflicts,
        new_transactions,
        merged,
    }
}
