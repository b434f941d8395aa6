use offpay::ledger::Wallet;
use offpay::store::LedgerStore;
use offpay::tx::{ReceiptStatus, Transport};
use tempfile::TempDir;

/// Test: a populated ledger survives a close/reopen cycle
#[test]
fn test_ledger_state_persistence() {
    let dir = TempDir::new().unwrap();

    let mut a = Wallet::from_seed([1u8; 32]);
    let mut b = Wallet::from_seed([2u8; 32]);

    let tx = a
        .create_transaction(b.device_id().clone(), 150, Transport::LoRa)
        .unwrap();
    let receipt = b.create_receipt(&tx, ReceiptStatus::Accepted);
    a.finalize_transaction(tx.id(), &receipt).unwrap();
    a.create_merkle_snapshot();

    {
        let store = LedgerStore::open(dir.path()).unwrap();
        store.save_ledger(&a.ledger()).unwrap();
        store.flush().unwrap();
    }

    let store = LedgerStore::open(dir.path()).unwrap();
    let loaded = store.load_ledger().unwrap().unwrap();

    assert_eq!(loaded, a.ledger());
    assert_eq!(loaded.balance(), 850);
    assert_eq!(loaded.transactions().len(), 1);
    assert_eq!(loaded.merkle_snapshots().len(), 1);
    assert!(loaded.transactions()[0].verify(), "signatures survive storage");
}

/// Test: identity and ledger persist side by side
#[test]
fn test_identity_and_ledger_together() {
    let dir = TempDir::new().unwrap();
    let wallet = Wallet::from_seed([5u8; 32]);

    let store = LedgerStore::open(dir.path()).unwrap();
    assert!(store.is_empty().unwrap());

    store
        .save_keypair(&offpay::identity::Keypair::from_seed([5u8; 32]))
        .unwrap();
    store.save_ledger(&wallet.ledger()).unwrap();

    let keypair = store.load_keypair().unwrap().unwrap();
    assert_eq!(keypair.public_key(), wallet.public_key());
    assert_eq!(store.load_ledger().unwrap().unwrap(), wallet.ledger());
}

/// Test: a fresh store holds nothing
#[test]
fn test_fresh_store_is_empty() {
    let dir = TempDir::new().unwrap();
    let store = LedgerStore::open(dir.path()).unwrap();

    assert!(store.load_keypair().unwrap().is_none());
    assert!(store.load_ledger().unwrap().is_none());
}

/// Test: saving twice overwrites, keeping the latest state
#[test]
fn test_save_overwrites_previous_state() {
    let dir = TempDir::new().unwrap();
    let store = LedgerStore::open(dir.path()).unwrap();

    let mut a = Wallet::from_seed([1u8; 32]);
    let b = Wallet::from_seed([2u8; 32]);

    store.save_ledger(&a.ledger()).unwrap();
    a.create_transaction(b.device_id().clone(), 25, Transport::Ble)
        .unwrap();
    store.save_ledger(&a.ledger()).unwrap();

    let loaded = store.load_ledger().unwrap().unwrap();
    assert_eq!(loaded.balance(), 975);
    assert_eq!(loaded.pending_transactions().len(), 1);
}
