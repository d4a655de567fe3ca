use std::sync::OnceLock;

use parking_lot::{Mutex, MutexGuard};
use tessera_catalog::Catalog;
use tessera_storage::{LocalStorage, StorageManager, Wal};
use tessera_transaction::{Timestamp, TransactionAction, TransactionType};

use crate::error::Result;

/// A unit of work started by the [`TransactionManager`](crate::transaction_manager::TransactionManager).
///
/// A write transaction stages row changes in its own [`LocalStorage`], which nobody else
/// reads, and schema changes as versions stamped with its ID.
pub struct Transaction {
    id: Timestamp,
    start_ts: Timestamp,
    commit_ts: OnceLock<Timestamp>,
    txn_type: TransactionType,
    local_storage: Mutex<LocalStorage>,
}

impl Transaction {
    pub(crate) fn new(id: Timestamp, start_ts: Timestamp, txn_type: TransactionType) -> Self {
        Self {
            id,
            start_ts,
            commit_ts: OnceLock::new(),
            txn_type,
            local_storage: Mutex::new(LocalStorage::new()),
        }
    }

    pub fn local_storage(&self) -> MutexGuard<'_, LocalStorage> {
        self.local_storage.lock()
    }

    /// Runs the fallible commit stages in order: the catalog persists and logs its write
    /// layer, local storage folds staged rows into the shadow layer, and the storage manager
    /// logs table statistics.
    ///
    /// Nothing becomes visible here. Versions are published by the manager once the commit
    /// record is durable.
    pub(crate) fn commit(
        &self,
        catalog: &Catalog,
        storage: &StorageManager,
        wal: &Wal,
    ) -> Result<()> {
        catalog.prepare_commit_or_rollback(self, TransactionAction::Commit)?;
        let local = self.local_storage.lock();
        local.prepare_commit(wal)?;
        storage.prepare_commit(&local, wal)?;
        Ok(())
    }

    /// Unwinds every stage of the transaction, including a commit that failed halfway.
    pub(crate) fn rollback(&self, catalog: &Catalog, storage: &StorageManager) -> Result<()> {
        storage.prepare_rollback();
        self.local_storage.lock().prepare_rollback();
        catalog.prepare_commit_or_rollback(self, TransactionAction::Rollback)?;
        Ok(())
    }

    pub(crate) fn set_commit_ts(&self, commit_ts: Timestamp) {
        if self.commit_ts.set(commit_ts).is_err() {
            panic!("transaction {} committed twice", self.id);
        }
    }
}

impl tessera_transaction::Transaction for Transaction {
    fn txn_id(&self) -> Timestamp {
        self.id
    }

    fn start_ts(&self) -> Timestamp {
        self.start_ts
    }

    fn commit_ts(&self) -> Option<Timestamp> {
        self.commit_ts.get().copied()
    }

    fn txn_type(&self) -> TransactionType {
        self.txn_type
    }
}
