// Storage module - persistence of identity and ledger state

mod store;

pub use store::{LedgerStore, StoreError};
