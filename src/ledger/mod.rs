// Ledger module - state, transitions, lifecycle, and reconciliation

mod reconcile;
mod state;
mod transition;
mod wallet;

pub use reconcile::{reconcile, ReconcileReport};
pub use state::{replay_balance, LedgerError, LedgerState, GENESIS_BALANCE};
pub use transition::{apply_event, LedgerEvent};
pub use wallet::Wallet;
