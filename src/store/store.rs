// LedgerStore - persistent storage for a device's identity and ledger
//
// Embedded sled database, crash-safe; writes are durable after flush.

use crate::identity::Keypair;
use crate::ledger::LedgerState;
use std::path::Path;
use thiserror::Error;

/// Key prefixes for organizing data
mod keys {
    pub const IDENTITY_KEYPAIR: &[u8] = b"identity:keypair";
    pub const LEDGER_STATE: &[u8] = b"ledger:state";
}

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Failed to open database: {0}")]
    OpenFailed(String),

    #[error("Database operation failed: {0}")]
    DatabaseError(String),

    #[error("Serialization failed: {0}")]
    SerializationFailed(String),

    #[error("Deserialization failed: {0}")]
    DeserializationFailed(String),

    #[error("Flush failed: {0}")]
    FlushFailed(String),
}

impl From<sled::Error> for StoreError {
    fn from(err: sled::Error) -> Self {
        StoreError::DatabaseError(err.to_string())
    }
}

/// Persistent key-value store for a device's ledger artifacts
pub struct LedgerStore {
    db: sled::Db,
}

impl LedgerStore {
    /// Open or create a store at the given path
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, StoreError> {
        let db = sled::open(path).map_err(|e| StoreError::OpenFailed(e.to_string()))?;
        Ok(Self { db })
    }

    /// Check if the store is empty
    pub fn is_empty(&self) -> Result<bool, StoreError> {
        Ok(self.db.is_empty())
    }

    /// Flush all pending writes to disk
    pub fn flush(&self) -> Result<(), StoreError> {
        self.db
            .flush()
            .map_err(|e| StoreError::FlushFailed(e.to_string()))?;
        Ok(())
    }

    fn put_raw(&self, key: &[u8], value: &[u8]) -> Result<(), StoreError> {
        self.db.insert(key, value)?;
        Ok(())
    }

    fn get_raw(&self, key: &[u8]) -> Result<Option<Vec<u8>>, StoreError> {
        Ok(self.db.get(key)?.map(|v| v.to_vec()))
    }

    /// Save the device keypair (secret key bytes)
    pub fn save_keypair(&self, keypair: &Keypair) -> Result<(), StoreError> {
        self.put_raw(keys::IDENTITY_KEYPAIR, &keypair.to_bytes())
    }

    /// Load the device keypair
    pub fn load_keypair(&self) -> Result<Option<Keypair>, StoreError> {
        match self.get_raw(keys::IDENTITY_KEYPAIR)? {
            Some(bytes) => {
                let keypair = Keypair::from_bytes(&bytes)
                    .map_err(|e| StoreError::DeserializationFailed(e.to_string()))?;
                Ok(Some(keypair))
            }
            None => Ok(None),
        }
    }

    /// Save the full ledger state
    pub fn save_ledger(&self, state: &LedgerState) -> Result<(), StoreError> {
        let bytes = postcard::to_allocvec(state)
            .map_err(|e| StoreError::SerializationFailed(e.to_string()))?;
        self.put_raw(keys::LEDGER_STATE, &bytes)
    }

    /// Load the full ledger state
    pub fn load_ledger(&self) -> Result<Option<LedgerState>, StoreError> {
        match self.get_raw(keys::LEDGER_STATE)? {
            Some(bytes) => {
                let state = postcard::from_bytes(&bytes)
                    .map_err(|e| StoreError::DeserializationFailed(e.to_string()))?;
                Ok(Some(state))
            }
            None => Ok(None),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_keypair_persistence() {
        let dir = TempDir::new().unwrap();

        let keypair = Keypair::generate();
        {
            let store = LedgerStore::open(dir.path()).unwrap();
            store.save_keypair(&keypair).unwrap();
            store.flush().unwrap();
        }

        let store = LedgerStore::open(dir.path()).unwrap();
        let loaded = store.load_keypair().unwrap().unwrap();
        assert_eq!(loaded.public_key(), keypair.public_key());
    }

    #[test]
    fn test_missing_keys_are_none() {
        let dir = TempDir::new().unwrap();
        let store = LedgerStore::open(dir.path()).unwrap();

        assert!(store.load_keypair().unwrap().is_none());
        assert!(store.load_ledger().unwrap().is_none());
    }
}
