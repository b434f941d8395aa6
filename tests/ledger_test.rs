use offpay::ledger::{LedgerError, Wallet, GENESIS_BALANCE};
use offpay::tx::{ReceiptStatus, Transport};

fn wallet_pair() -> (Wallet, Wallet) {
    (Wallet::from_seed([1u8; 32]), Wallet::from_seed([2u8; 32]))
}

// ============================================================================
// CREATE TRANSACTION
// ============================================================================

/// Test: a send within balance escrows the amount and advances the nonce
#[test]
fn test_create_transaction_within_balance() {
    let (mut a, b) = wallet_pair();

    let tx = a
        .create_transaction(b.device_id().clone(), 200, Transport::Ble)
        .unwrap();

    assert_eq!(a.balance(), GENESIS_BALANCE - 200);
    assert_eq!(a.nonce(), 1);
    assert_eq!(tx.nonce(), 0, "transaction carries the prior nonce");
    assert_eq!(a.ledger().pending_transactions().len(), 1);
    assert!(a.ledger().transactions().is_empty(), "not yet finalized");
    assert!(tx.verify());
}

/// Test: a send beyond balance fails and changes nothing
#[test]
fn test_create_transaction_insufficient_balance() {
    let (mut a, b) = wallet_pair();

    let err = a
        .create_transaction(b.device_id().clone(), GENESIS_BALANCE + 1, Transport::Ble)
        .unwrap_err();

    assert!(matches!(
        err,
        LedgerError::InsufficientBalance {
            available: 1000,
            required: 1001
        }
    ));
    assert_eq!(a.balance(), GENESIS_BALANCE);
    assert_eq!(a.nonce(), 0);
    assert!(a.ledger().pending_transactions().is_empty());
}

/// Test: consecutive sends get strictly increasing nonces
#[test]
fn test_nonces_strictly_increase() {
    let (mut a, b) = wallet_pair();

    let t1 = a
        .create_transaction(b.device_id().clone(), 10, Transport::Ble)
        .unwrap();
    let t2 = a
        .create_transaction(b.device_id().clone(), 10, Transport::Ble)
        .unwrap();
    let t3 = a
        .create_transaction(b.device_id().clone(), 10, Transport::Ble)
        .unwrap();

    assert_eq!((t1.nonce(), t2.nonce(), t3.nonce()), (0, 1, 2));
    assert_eq!(a.nonce(), 3);
}

// ============================================================================
// RECEIPTS
// ============================================================================

/// Test: accepting a valid transaction credits the receiver's ledger
#[test]
fn test_accept_credits_receiver() {
    let (mut a, mut b) = wallet_pair();

    let tx = a
        .create_transaction(b.device_id().clone(), 200, Transport::Nfc)
        .unwrap();
    let receipt = b.create_receipt(&tx, ReceiptStatus::Accepted);

    assert!(receipt.verify());
    assert_eq!(receipt.status(), ReceiptStatus::Accepted);
    assert_eq!(b.balance(), GENESIS_BALANCE + 200);
    assert_eq!(b.ledger().transactions().len(), 1);
    assert!(
        b.ledger().transactions()[0].receipt().is_some(),
        "receiver's record carries the receipt"
    );
}

/// Test: rejecting a transaction leaves the receiver untouched
#[test]
fn test_reject_does_not_credit_receiver() {
    let (mut a, mut b) = wallet_pair();

    let tx = a
        .create_transaction(b.device_id().clone(), 200, Transport::Nfc)
        .unwrap();
    let receipt = b.create_receipt(&tx, ReceiptStatus::Rejected);

    assert_eq!(receipt.status(), ReceiptStatus::Rejected);
    assert_eq!(b.balance(), GENESIS_BALANCE);
    assert!(b.ledger().transactions().is_empty());
}

// ============================================================================
// FINALIZATION
// ============================================================================

/// Test: an accepted receipt moves the transaction from pending to the log
#[test]
fn test_finalize_accepted_moves_to_log() {
    let (mut a, mut b) = wallet_pair();

    let tx = a
        .create_transaction(b.device_id().clone(), 200, Transport::Ble)
        .unwrap();
    let receipt = b.create_receipt(&tx, ReceiptStatus::Accepted);

    a.finalize_transaction(tx.id(), &receipt).unwrap();

    assert!(a.ledger().pending_transactions().is_empty());
    assert_eq!(a.ledger().transactions().len(), 1);
    assert_eq!(a.balance(), GENESIS_BALANCE - 200, "no further debit");
}

/// Test: finalizing the same id twice fails the second time
#[test]
fn test_finalize_is_exactly_once() {
    let (mut a, mut b) = wallet_pair();

    let tx = a
        .create_transaction(b.device_id().clone(), 200, Transport::Ble)
        .unwrap();
    let receipt = b.create_receipt(&tx, ReceiptStatus::Accepted);

    a.finalize_transaction(tx.id(), &receipt).unwrap();
    let err = a.finalize_transaction(tx.id(), &receipt).unwrap_err();

    assert!(matches!(err, LedgerError::TransactionNotFound(_)));
    assert_eq!(a.ledger().transactions().len(), 1);
}

/// Test: a rejected receipt refunds the escrowed amount
#[test]
fn test_finalize_rejected_refunds() {
    let (mut a, mut b) = wallet_pair();

    let tx = a
        .create_transaction(b.device_id().clone(), 200, Transport::Ble)
        .unwrap();
    assert_eq!(a.balance(), GENESIS_BALANCE - 200);

    let receipt = b.create_receipt(&tx, ReceiptStatus::Rejected);
    a.finalize_transaction(tx.id(), &receipt).unwrap();

    assert_eq!(a.balance(), GENESIS_BALANCE, "refund restores pre-send balance");
    assert!(a.ledger().pending_transactions().is_empty());
    assert!(a.ledger().transactions().is_empty());
}

/// Test: only an accepted receipt moves a transaction into the log
#[test]
fn test_finalize_pending_status_refunds() {
    let (mut a, mut b) = wallet_pair();

    let tx = a
        .create_transaction(b.device_id().clone(), 150, Transport::Ble)
        .unwrap();
    let receipt = b.create_receipt(&tx, ReceiptStatus::Pending);

    a.finalize_transaction(tx.id(), &receipt).unwrap();

    assert_eq!(a.balance(), GENESIS_BALANCE, "non-accepted receipt refunds");
    assert!(a.ledger().transactions().is_empty());
    assert!(a.ledger().pending_transactions().is_empty());
}

/// Test: finalizing an unknown id fails without touching state
#[test]
fn test_finalize_unknown_id() {
    let (mut a, mut b) = wallet_pair();

    let tx = a
        .create_transaction(b.device_id().clone(), 100, Transport::Ble)
        .unwrap();
    let receipt = b.create_receipt(&tx, ReceiptStatus::Accepted);

    let bogus = offpay::tx::TxId::from_bytes([0xAB; 16]);
    let err = a.finalize_transaction(&bogus, &receipt).unwrap_err();

    assert!(matches!(err, LedgerError::TransactionNotFound(_)));
    assert_eq!(a.ledger().pending_transactions().len(), 1);
    assert_eq!(a.balance(), GENESIS_BALANCE - 100);
}

// ============================================================================
// EXPORT / IMPORT
// ============================================================================

/// Test: import(export(s)) reproduces the ledger state exactly
#[test]
fn test_export_import_roundtrip() {
    let (mut a, mut b) = wallet_pair();

    let t1 = a
        .create_transaction(b.device_id().clone(), 100, Transport::Sms)
        .unwrap();
    let receipt = b.create_receipt(&t1, ReceiptStatus::Accepted);
    a.finalize_transaction(t1.id(), &receipt).unwrap();
    a.create_transaction(b.device_id().clone(), 50, Transport::LoRa)
        .unwrap();
    a.create_merkle_snapshot();

    let exported = a.export_ledger();

    let mut fresh = Wallet::from_seed([9u8; 32]);
    fresh.import_ledger(&exported).unwrap();

    assert_eq!(fresh.ledger(), a.ledger(), "imported state must match exactly");
}

/// Test: malformed export text fails with InvalidFormat
#[test]
fn test_import_invalid_format() {
    let mut a = Wallet::from_seed([1u8; 32]);
    let before = a.ledger();

    let err = a.import_ledger("{{{ definitely not a ledger").unwrap_err();
    assert!(matches!(err, LedgerError::InvalidFormat(_)));
    assert_eq!(a.ledger(), before, "failed import must not modify state");
}

// ============================================================================
// CONCRETE END-TO-END SCENARIO
// ============================================================================

/// Test: the full A->B flow with escrow, credit, and finalization
#[test]
fn test_two_device_payment_flow() {
    let (mut a, mut b) = wallet_pair();
    assert_eq!(a.balance(), 1000);

    // A sends 200 to B
    let tx = a
        .create_transaction(b.device_id().clone(), 200, Transport::Ble)
        .unwrap();
    assert_eq!(a.balance(), 800);
    assert_eq!(a.ledger().pending_transactions().len(), 1);
    assert_eq!(a.nonce(), 1);

    // B validates, credits itself, and signs a receipt
    let receipt = b.create_receipt(&tx, ReceiptStatus::Accepted);
    assert_eq!(b.balance(), 1200);
    assert_eq!(b.ledger().transactions().len(), 1);

    // A finalizes with the receipt
    a.finalize_transaction(tx.id(), &receipt).unwrap();
    assert!(a.ledger().pending_transactions().is_empty());
    assert_eq!(a.ledger().transactions().len(), 1);
    assert_eq!(a.balance(), 800, "balance already debited at creation");
}
