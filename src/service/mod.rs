// Ledger service - single-writer discipline at the process boundary
//
// One tokio task owns the wallet; every operation flows through a single
// command channel and executes serially, so no two mutations on the same
// ledger instance can ever interleave. Receipt arrival is just another
// command, however much later it lands; the core sets no timeout or expiry
// for pending transactions.

use crate::identity::{DeviceId, PublicKey};
use crate::ledger::{LedgerError, LedgerState, ReconcileReport, Wallet};
use crate::merkle::MerkleSnapshot;
use crate::tx::{ReceiptStatus, Transaction, TransactionReceipt, Transport, TxId};
use thiserror::Error;
use tokio::sync::{mpsc, oneshot};
use tracing::debug;

const COMMAND_BUFFER: usize = 64;

#[derive(Error, Debug)]
pub enum ServiceError {
    #[error(transparent)]
    Ledger(#[from] LedgerError),

    #[error("Ledger service is no longer running")]
    Closed,
}

enum Command {
    CreateTransaction {
        to: DeviceId,
        amount: u64,
        transport: Transport,
        reply: oneshot::Sender<Result<Transaction, LedgerError>>,
    },
    CreateReceipt {
        tx: Box<Transaction>,
        status: ReceiptStatus,
        reply: oneshot::Sender<TransactionReceipt>,
    },
    FinalizeTransaction {
        tx_id: TxId,
        receipt: Box<TransactionReceipt>,
        reply: oneshot::Sender<Result<(), LedgerError>>,
    },
    CreateSnapshot {
        reply: oneshot::Sender<MerkleSnapshot>,
    },
    Reconcile {
        remote: Box<LedgerState>,
        reply: oneshot::Sender<ReconcileReport>,
    },
    ApplyMergedState {
        merged: Box<LedgerState>,
        reply: oneshot::Sender<()>,
    },
    Balance {
        reply: oneshot::Sender<u64>,
    },
    Ledger {
        reply: oneshot::Sender<LedgerState>,
    },
    ExportLedger {
        reply: oneshot::Sender<String>,
    },
    ImportLedger {
        text: String,
        reply: oneshot::Sender<Result<(), LedgerError>>,
    },
}

/// Handle to a running ledger service; cheap to clone
#[derive(Clone)]
pub struct LedgerHandle {
    commands: mpsc::Sender<Command>,
    device_id: DeviceId,
    public_key: PublicKey,
}

/// Spawns the task that owns a wallet and serializes access to it
pub struct LedgerService;

impl LedgerService {
    /// Move `wallet` into its own task and return a handle to it
    pub fn spawn(wallet: Wallet) -> LedgerHandle {
        let device_id = wallet.device_id().clone();
        let public_key = wallet.public_key();
        let (commands, rx) = mpsc::channel(COMMAND_BUFFER);

        tokio::spawn(run(wallet, rx));

        LedgerHandle {
            commands,
            device_id,
            public_key,
        }
    }
}

async fn run(mut wallet: Wallet, mut rx: mpsc::Receiver<Command>) {
    while let Some(command) = rx.recv().await {
        match command {
            Command::CreateTransaction {
                to,
                amount,
                transport,
                reply,
            } => {
                let _ = reply.send(wallet.create_transaction(to, amount, transport));
            }
            Command::CreateReceipt { tx, status, reply } => {
                let _ = reply.send(wallet.create_receipt(&tx, status));
            }
            Command::FinalizeTransaction {
                tx_id,
                receipt,
                reply,
            } => {
                let _ = reply.send(wallet.finalize_transaction(&tx_id, &receipt));
            }
            Command::CreateSnapshot { reply } => {
                let _ = reply.send(wallet.create_merkle_snapshot());
            }
            Command::Reconcile { remote, reply } => {
                let _ = reply.send(wallet.reconcile(&remote));
            }
            Command::ApplyMergedState { merged, reply } => {
                wallet.apply_merged_state(*merged);
                let _ = reply.send(());
            }
            Command::Balance { reply } => {
                let _ = reply.send(wallet.balance());
            }
            Command::Ledger { reply } => {
                let _ = reply.send(wallet.ledger());
            }
            Command::ExportLedger { reply } => {
                let _ = reply.send(wallet.export_ledger());
            }
            Command::ImportLedger { text, reply } => {
                let _ = reply.send(wallet.import_ledger(&text));
            }
        }
    }

    debug!("ledger service stopped");
}

impl LedgerHandle {
    pub fn device_id(&self) -> &DeviceId {
        &self.device_id
    }

    pub fn public_key(&self) -> &PublicKey {
        &self.public_key
    }

    pub async fn create_transaction(
        &self,
        to: DeviceId,
        amount: u64,
        transport: Transport,
    ) -> Result<Transaction, ServiceError> {
        let (reply, rx) = oneshot::channel();
        self.send(Command::CreateTransaction {
            to,
            amount,
            transport,
            reply,
        })
        .await?;
        Ok(rx.await.map_err(|_| ServiceError::Closed)??)
    }

    pub async fn create_receipt(
        &self,
        tx: Transaction,
        status: ReceiptStatus,
    ) -> Result<TransactionReceipt, ServiceError> {
        let (reply, rx) = oneshot::channel();
        self.send(Command::CreateReceipt {
            tx: Box::new(tx),
            status,
            reply,
        })
        .await?;
        rx.await.map_err(|_| ServiceError::Closed)
    }

    pub async fn finalize_transaction(
        &self,
        tx_id: TxId,
        receipt: TransactionReceipt,
    ) -> Result<(), ServiceError> {
        let (reply, rx) = oneshot::channel();
        self.send(Command::FinalizeTransaction {
            tx_id,
            receipt: Box::new(receipt),
            reply,
        })
        .await?;
        Ok(rx.await.map_err(|_| ServiceError::Closed)??)
    }

    pub async fn create_merkle_snapshot(&self) -> Result<MerkleSnapshot, ServiceError> {
        let (reply, rx) = oneshot::channel();
        self.send(Command::CreateSnapshot { reply }).await?;
        rx.await.map_err(|_| ServiceError::Closed)
    }

    pub async fn reconcile(&self, remote: LedgerState) -> Result<ReconcileReport, ServiceError> {
        let (reply, rx) = oneshot::channel();
        self.send(Command::Reconcile {
            remote: Box::new(remote),
            reply,
        })
        .await?;
        rx.await.map_err(|_| ServiceError::Closed)
    }

    pub async fn apply_merged_state(&self, merged: LedgerState) -> Result<(), ServiceError> {
        let (reply, rx) = oneshot::channel();
        self.send(Command::ApplyMergedState {
            merged: Box::new(merged),
            reply,
        })
        .await?;
        rx.await.map_err(|_| ServiceError::Closed)
    }

    pub async fn balance(&self) -> Result<u64, ServiceError> {
        let (reply, rx) = oneshot::channel();
        self.send(Command::Balance { reply }).await?;
        rx.await.map_err(|_| ServiceError::Closed)
    }

    pub async fn ledger(&self) -> Result<LedgerState, ServiceError> {
        let (reply, rx) = oneshot::channel();
        self.send(Command::Ledger { reply }).await?;
        rx.await.map_err(|_| ServiceError::Closed)
    }

    pub async fn export_ledger(&self) -> Result<String, ServiceError> {
        let (reply, rx) = oneshot::channel();
        self.send(Command::ExportLedger { reply }).await?;
        rx.await.map_err(|_| ServiceError::Closed)
    }

    pub async fn import_ledger(&self, text: String) -> Result<(), ServiceError> {
        let (reply, rx) = oneshot::channel();
        self.send(Command::ImportLedger { text, reply }).await?;
        Ok(rx.await.map_err(|_| ServiceError::Closed)??)
    }

    async fn send(&self, command: Command) -> Result<(), ServiceError> {
        self.commands
            .send(command)
            .await
            .map_err(|_| ServiceError::Closed)
    }
}
