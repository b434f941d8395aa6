// State transitions - the ledger as an event-sourced state machine
//
// Every mutation is split in two: a decide step that validates the request
// and produces a `LedgerEvent`, and `apply_event`, a pure function folding
// one event into the next `LedgerState`. Replaying a recorded event sequence
// over the genesis state reproduces the final state exactly; nothing here
// touches shared mutable state.

use crate::identity::{DeviceId, Keypair};
use crate::ledger::state::{LedgerError, LedgerState};
use crate::merkle::MerkleSnapshot;
use crate::tx::{ReceiptStatus, Transaction, TransactionReceipt, Transport, TxId};
use serde::{Deserialize, Serialize};

/// Something that happened to a ledger
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum LedgerEvent {
    /// A signed transfer was created and escrowed into the pending queue
    TransactionCreated { tx: Transaction },
    /// An incoming transfer was acknowledged with a signed receipt
    TransactionReceived {
        tx: Transaction,
        receipt: TransactionReceipt,
    },
    /// A pending transfer was settled by the receiver's receipt
    TransactionFinalized {
        tx_id: TxId,
        receipt: TransactionReceipt,
    },
    /// The log was digested into a signed snapshot
    SnapshotCreated { snapshot: MerkleSnapshot },
    /// The whole state was replaced (merge apply or import)
    StateReplaced { state: Box<LedgerState> },
}

/// Fold one event into a state, returning the next state
///
/// Pure and total: events that no longer apply (an unknown pending id, an
/// already-recorded incoming transfer) leave the state unchanged, so a
/// replayed log converges instead of faulting.
pub fn apply_event(state: &LedgerState, event: &LedgerEvent) -> LedgerState {
    let mut next = state.clone();

    match event {
        LedgerEvent::TransactionCreated { tx } => {
            next.nonce = tx.nonce() + 1;
            next.balance = next.balance.saturating_sub(tx.amount());
            next.pending_transactions.push(tx.clone());
        }
        LedgerEvent::TransactionReceived { tx, receipt } => {
            if receipt.status().is_accepted() && next.find_transaction(tx.id()).is_none() {
                next.transactions.push(tx.with_receipt(receipt.clone()));
                next.balance = next.balance.saturating_add(tx.amount());
            }
        }
        LedgerEvent::TransactionFinalized { tx_id, receipt } => {
            if let Some(idx) = next
                .pending_transactions
                .iter()
                .position(|tx| tx.id() == tx_id)
            {
                let tx = next.pending_transactions.remove(idx);
                if receipt.status().is_accepted() {
                    next.transactions.push(tx.with_receipt(receipt.clone()));
                } else {
                    next.balance = next.balance.saturating_add(tx.amount());
                }
            }
        }
        LedgerEvent::SnapshotCreated { snapshot } => {
            next.merkle_snapshots.push(snapshot.clone());
        }
        LedgerEvent::StateReplaced { state } => {
            next = (**state).clone();
        }
    }

    next
}

/// Decide a new transfer: requires `0 < amount <= balance`
pub fn create_transaction(
    state: &LedgerState,
    keypair: &Keypair,
    to: DeviceId,
    amount: u64,
    transport: Transport,
) -> Result<(LedgerState, Transaction, LedgerEvent), LedgerError> {
    let available = state.balance();
    if amount == 0 || amount > available {
        return Err(LedgerError::InsufficientBalance {
            available,
            required: amount,
        });
    }

    let tx = Transaction::build_signed(keypair, to, amount, state.nonce(), transport);
    let event = LedgerEvent::TransactionCreated { tx: tx.clone() };
    let next = apply_event(state, &event);

    Ok((next, tx, event))
}

/// Decide a receipt for an incoming transfer
///
/// An acceptance of a transaction that does not verify is downgraded to a
/// rejection; bad input is data, not a fault.
pub fn create_receipt(
    state: &LedgerState,
    keypair: &Keypair,
    tx: &Transaction,
    status: ReceiptStatus,
) -> (LedgerState, TransactionReceipt, LedgerEvent) {
    let effective = if status.is_accepted() && !tx.verify() {
        ReceiptStatus::Rejected
    } else {
        status
    };

    let receipt = TransactionReceipt::create(keypair, *tx.id(), effective);
    let event = LedgerEvent::TransactionReceived {
        tx: tx.clone(),
        receipt: receipt.clone(),
    };
    let next = apply_event(state, &event);

    (next, receipt, event)
}

/// Decide a finalization: the id must still be pending
pub fn finalize_transaction(
    state: &LedgerState,
    tx_id: &TxId,
    receipt: &TransactionReceipt,
) -> Result<(LedgerState, LedgerEvent), LedgerError> {
    if !state
        .pending_transactions()
        .iter()
        .any(|tx| tx.id() == tx_id)
    {
        return Err(LedgerError::TransactionNotFound(*tx_id));
    }

    let event = LedgerEvent::TransactionFinalized {
        tx_id: *tx_id,
        receipt: receipt.clone(),
    };
    let next = apply_event(state, &event);

    Ok((next, event))
}

/// Decide a snapshot over the current log
pub fn create_snapshot(
    state: &LedgerState,
    keypair: &Keypair,
) -> (LedgerState, MerkleSnapshot, LedgerEvent) {
    let snapshot = MerkleSnapshot::create(keypair, state.transactions());
    let event = LedgerEvent::SnapshotCreated {
        snapshot: snapshot.clone(),
    };
    let next = apply_event(state, &event);

    (next, snapshot, event)
}

/// Decide a wholesale state replacement (merge apply or import)
pub fn replace_state(state: &LedgerState, replacement: LedgerState) -> (LedgerState, LedgerEvent) {
    let event = LedgerEvent::StateReplaced {
        state: Box::new(replacement),
    };
    let next = apply_event(state, &event);

    (next, event)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ledger::state::GENESIS_BALANCE;

    #[test]
    fn test_decide_does_not_touch_the_input() {
        let keypair = Keypair::from_seed([1u8; 32]);
        let other = Keypair::from_seed([2u8; 32]);
        let state = LedgerState::new();

        let to = DeviceId::from_public_key(&other.public_key());
        let (next, _, _) =
            create_transaction(&state, &keypair, to, 100, Transport::Ble).unwrap();

        assert_eq!(state.balance(), GENESIS_BALANCE, "input state untouched");
        assert_eq!(next.balance(), GENESIS_BALANCE - 100);
    }

    #[test]
    fn test_replaying_events_reproduces_the_state() {
        let sender = Keypair::from_seed([1u8; 32]);
        let receiver = Keypair::from_seed([2u8; 32]);
        let to = DeviceId::from_public_key(&receiver.public_key());

        let mut events = Vec::new();
        let s0 = LedgerState::new();

        let (s1, tx, e1) =
            create_transaction(&s0, &sender, to.clone(), 150, Transport::Ble).unwrap();
        events.push(e1);

        let receipt = TransactionReceipt::create(&receiver, *tx.id(), ReceiptStatus::Accepted);
        let (s2, e2) = finalize_transaction(&s1, tx.id(), &receipt).unwrap();
        events.push(e2);

        let (s3, _, e3) = create_snapshot(&s2, &sender);
        events.push(e3);

        let replayed = events
            .iter()
            .fold(LedgerState::new(), |state, event| apply_event(&state, event));

        assert_eq!(replayed, s3, "event replay must reproduce the final state");
    }

    #[test]
    fn test_stale_finalize_event_is_a_no_op() {
        let receiver = Keypair::from_seed([2u8; 32]);
        let state = LedgerState::new();

        let receipt = TransactionReceipt::create(
            &receiver,
            TxId::from_bytes([9u8; 16]),
            ReceiptStatus::Accepted,
        );
        let event = LedgerEvent::TransactionFinalized {
            tx_id: TxId::from_bytes([9u8; 16]),
            receipt,
        };

        assert_eq!(apply_event(&state, &event), state);
    }
}
