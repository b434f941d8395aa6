// Wallet - one device's ledger and the full transaction lifecycle
//
// Lifecycle: CREATED -> SIGNED -> PENDING (balance escrowed) ->
// FINALIZED(accepted) | REJECTED(refunded). With no online authority to
// arbitrate, funds are debited at send time and released only on explicit
// rejection; a sender cannot double-spend funds committed to an
// unacknowledged send.
//
// The wallet itself holds no logic: every mutation is decided and applied by
// the pure transitions in `transition`, and the wallet just keeps the latest
// state and logs the emitted event.

use crate::identity::{DeviceId, Keypair, PublicKey};
use crate::ledger::reconcile::{reconcile, ReconcileReport};
use crate::ledger::state::{LedgerError, LedgerState};
use crate::ledger::transition::{self, LedgerEvent};
use crate::merkle::MerkleSnapshot;
use crate::tx::{ReceiptStatus, Transaction, TransactionReceipt, Transport, TxId};
use tracing::{debug, info};

/// A device's signing identity plus its current ledger state
///
/// All mutations on one wallet must be serialized; see `service` for the
/// single-writer wrapper.
pub struct Wallet {
    keypair: Keypair,
    device_id: DeviceId,
    ledger: LedgerState,
}

impl Wallet {
    /// Create a wallet with a fresh random identity
    pub fn new(keypair: Keypair) -> Self {
        let device_id = DeviceId::from_public_key(&keypair.public_key());
        Self {
            keypair,
            device_id,
            ledger: LedgerState::new(),
        }
    }

    /// Create a wallet with a deterministic, seed-derived identity
    pub fn from_seed(seed: [u8; 32]) -> Self {
        Self::new(Keypair::from_seed(seed))
    }

    pub fn device_id(&self) -> &DeviceId {
        &self.device_id
    }

    pub fn public_key(&self) -> PublicKey {
        self.keypair.public_key()
    }

    pub fn balance(&self) -> u64 {
        self.ledger.balance()
    }

    pub fn nonce(&self) -> u64 {
        self.ledger.nonce()
    }

    /// Defensive copy of the full ledger state
    pub fn ledger(&self) -> LedgerState {
        self.ledger.clone()
    }

    /// Create, sign, and enqueue a transfer to another device
    ///
    /// Requires `0 < amount <= balance`. On success the balance is escrowed
    /// immediately, the nonce advances by exactly one, and the signed
    /// transaction joins the pending queue. On failure no state changes.
    pub fn create_transaction(
        &mut self,
        to: DeviceId,
        amount: u64,
        transport: Transport,
    ) -> Result<Transaction, LedgerError> {
        let (next, tx, event) =
            transition::create_transaction(&self.ledger, &self.keypair, to, amount, transport)?;
        self.commit(next, &event);

        info!(
            tx_id = %tx.id(),
            amount,
            balance = self.ledger.balance(),
            "transaction created and escrowed"
        );
        Ok(tx)
    }

    /// Acknowledge an incoming transaction on the receiving device
    ///
    /// An acceptance of a transaction that does not verify is answered with
    /// a rejected receipt; the receiver never credits unattributable funds.
    /// Accepting is also the receiver's first record of the transfer: the
    /// transaction joins its log (receipt attached) and its balance is
    /// credited, unless the id is already recorded.
    pub fn create_receipt(
        &mut self,
        tx: &Transaction,
        status: ReceiptStatus,
    ) -> TransactionReceipt {
        let (next, receipt, event) =
            transition::create_receipt(&self.ledger, &self.keypair, tx, status);
        self.commit(next, &event);

        info!(
            tx_id = %tx.id(),
            status = %receipt.status(),
            balance = self.ledger.balance(),
            "incoming transaction acknowledged"
        );
        receipt
    }

    /// Settle a pending transaction with the receiver's receipt
    ///
    /// Accepted: the transaction moves from pending into the log with the
    /// receipt attached; the balance stays as escrowed. Anything else: the
    /// amount is refunded and the transaction dropped. Exactly one of the
    /// two happens, exactly once per id.
    pub fn finalize_transaction(
        &mut self,
        tx_id: &TxId,
        receipt: &TransactionReceipt,
    ) -> Result<(), LedgerError> {
        let (next, event) = transition::finalize_transaction(&self.ledger, tx_id, receipt)?;
        self.commit(next, &event);

        info!(
            tx_id = %tx_id,
            status = %receipt.status(),
            balance = self.ledger.balance(),
            "pending transaction settled"
        );
        Ok(())
    }

    /// Digest and sign the current log; the snapshot joins the history
    pub fn create_merkle_snapshot(&mut self) -> MerkleSnapshot {
        let (next, snapshot, event) = transition::create_snapshot(&self.ledger, &self.keypair);
        self.commit(next, &event);

        info!(root = %snapshot.root(), tx_count = snapshot.tx_count(), "snapshot created");
        snapshot
    }

    /// Classify and merge a remote ledger; mutates nothing
    pub fn reconcile(&self, remote: &LedgerState) -> ReconcileReport {
        reconcile(&self.ledger, remote, &self.device_id)
    }

    /// Replace the ledger with a merged state; idempotent
    pub fn apply_merged_state(&mut self, merged: LedgerState) {
        let (next, event) = transition::replace_state(&self.ledger, merged);
        self.commit(next, &event);
    }

    /// Export the full ledger state as text
    pub fn export_ledger(&self) -> String {
        self.ledger.export()
    }

    /// Replace the ledger wholesale from exported text
    pub fn import_ledger(&mut self, text: &str) -> Result<(), LedgerError> {
        let imported = LedgerState::import(text)?;
        let (next, event) = transition::replace_state(&self.ledger, imported);
        self.commit(next, &event);
        Ok(())
    }

    fn commit(&mut self, next: LedgerState, event: &LedgerEvent) {
        debug!(?event, "ledger transition");
        self.ledger = next;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn wallet_pair() -> (Wallet, Wallet) {
        (Wallet::from_seed([1u8; 32]), Wallet::from_seed([2u8; 32]))
    }

    #[test]
    fn test_create_transaction_escrows_and_advances_nonce() {
        let (mut a, b) = wallet_pair();
        let tx = a
            .create_transaction(b.device_id().clone(), 200, Transport::Ble)
            .unwrap();

        assert_eq!(a.balance(), 800);
        assert_eq!(a.nonce(), 1);
        assert_eq!(tx.nonce(), 0, "transaction carries the pre-increment nonce");
        assert_eq!(a.ledger().pending_transactions().len(), 1);
    }

    #[test]
    fn test_insufficient_balance_leaves_state_untouched() {
        let (mut a, b) = wallet_pair();
        let err = a
            .create_transaction(b.device_id().clone(), 1001, Transport::Ble)
            .unwrap_err();

        assert!(matches!(err, LedgerError::InsufficientBalance { .. }));
        assert_eq!(a.balance(), 1000);
        assert_eq!(a.nonce(), 0);
        assert!(a.ledger().pending_transactions().is_empty());
    }

    #[test]
    fn test_zero_amount_is_refused() {
        let (mut a, b) = wallet_pair();
        assert!(a
            .create_transaction(b.device_id().clone(), 0, Transport::Ble)
            .is_err());
    }

    #[test]
    fn test_unverifiable_transaction_gets_rejected_receipt() {
        let (mut a, mut b) = wallet_pair();
        let tx = a
            .create_transaction(b.device_id().clone(), 50, Transport::Nfc)
            .unwrap();

        let mut value = serde_json::to_value(&tx).unwrap();
        value["amount"] = serde_json::json!(500);
        let tampered: Transaction = serde_json::from_value(value).unwrap();

        let receipt = b.create_receipt(&tampered, ReceiptStatus::Accepted);
        assert_eq!(receipt.status(), ReceiptStatus::Rejected);
        assert_eq!(b.balance(), 1000, "no credit for unverifiable funds");
    }

    #[test]
    fn test_duplicate_receipt_does_not_double_credit() {
        let (mut a, mut b) = wallet_pair();
        let tx = a
            .create_transaction(b.device_id().clone(), 50, Transport::Nfc)
            .unwrap();

        b.create_receipt(&tx, ReceiptStatus::Accepted);
        b.create_receipt(&tx, ReceiptStatus::Accepted);

        assert_eq!(b.balance(), 1050);
        assert_eq!(b.ledger().transactions().len(), 1);
    }
}
