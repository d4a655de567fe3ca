use std::collections::BTreeSet;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;

use parking_lot::{Condvar, Mutex};
use tessera_catalog::Catalog;
use tessera_storage::StorageManager;
use tessera_storage::wal::{ReplayMode, Wal, WalReplayer};
use tessera_transaction::{
    CommitTimestampGenerator, Timestamp, Transaction as _, TransactionIdGenerator,
    TransactionType,
};
use tracing::{debug, info, warn};

use crate::config::DatabaseConfig;
use crate::error::{Error, Result};
use crate::transaction::Transaction;

#[derive(Debug, Default)]
struct LifecycleState {
    active_writer: Option<Timestamp>,
    active_readers: BTreeSet<Timestamp>,
    /// Set while a checkpoint drains or replays. New transactions wait on the gate.
    checkpointing: bool,
}

/// Sequences transactions of one database: hands out IDs and snapshots, keeps the single
/// writer slot, and runs checkpoints once every active transaction has left.
pub struct TransactionManager {
    state: Mutex<LifecycleState>,
    /// Signalled when a checkpoint ends.
    gate: Condvar,
    /// Signalled when a transaction leaves.
    drained: Condvar,
    txn_ids: TransactionIdGenerator,
    commit_ts: CommitTimestampGenerator,
    catalog: Arc<Catalog>,
    storage: Arc<StorageManager>,
    wal: Arc<Wal>,
    directory: PathBuf,
    config: DatabaseConfig,
}

impl TransactionManager {
    pub fn new(
        catalog: Arc<Catalog>,
        storage: Arc<StorageManager>,
        wal: Arc<Wal>,
        directory: impl Into<PathBuf>,
        config: DatabaseConfig,
    ) -> Self {
        Self {
            state: Mutex::new(LifecycleState::default()),
            gate: Condvar::new(),
            drained: Condvar::new(),
            txn_ids: TransactionIdGenerator::new(),
            commit_ts: CommitTimestampGenerator::new(),
            catalog,
            storage,
            wal,
            directory: directory.into(),
            config,
        }
    }

    #[inline]
    pub fn config(&self) -> &DatabaseConfig {
        &self.config
    }

    /// Starts a transaction reading the latest published commit.
    ///
    /// Blocks while a checkpoint is in progress. Fails with
    /// [`Error::TooManyActiveWriteTransactions`] if `txn_type` is a write and another
    /// writer is active.
    pub fn begin_transaction(&self, txn_type: TransactionType) -> Result<Arc<Transaction>> {
        let mut state = self.state.lock();
        while state.checkpointing {
            self.gate.wait(&mut state);
        }
        if txn_type == TransactionType::Write && state.active_writer.is_some() {
            return Err(Error::TooManyActiveWriteTransactions);
        }
        let txn_id = self.txn_ids.next()?;
        let start_ts = self.commit_ts.latest();
        match txn_type {
            TransactionType::Write => state.active_writer = Some(txn_id),
            TransactionType::ReadOnly => {
                state.active_readers.insert(txn_id);
            }
        }
        debug!(%txn_id, %start_ts, %txn_type, "transaction started");
        Ok(Arc::new(Transaction::new(txn_id, start_ts, txn_type)))
    }

    /// Commits `txn`.
    ///
    /// A writer's changes are applied in order: catalog, local storage, storage manager,
    /// then the commit record is flushed. If any step fails the whole transaction is rolled
    /// back and an abort record is logged. Once durable, the writer's catalog versions are
    /// published and, with `auto_checkpoint`, a checkpoint runs. A checkpoint timeout leaves
    /// the commit durable.
    ///
    /// # Panics
    ///
    /// Panics if `txn` is a writer that is not the registered writer.
    pub fn commit_transaction(&self, txn: &Transaction, auto_checkpoint: bool) -> Result<()> {
        if txn.is_read_only() {
            self.leave_reader(txn.txn_id());
            return Ok(());
        }
        self.assert_active_writer(txn);

        let commit_ts = match self.commit_durably(txn) {
            Ok(commit_ts) => commit_ts,
            Err(e) => {
                warn!(txn_id = %txn.txn_id(), error = %e, "commit failed, rolling back");
                let aborted = self.abort(txn);
                self.release_writer(false);
                aborted?;
                return Err(e);
            }
        };

        txn.set_commit_ts(commit_ts);
        self.catalog.commit_versions(txn, commit_ts);
        self.storage.commit_in_memory();
        let published = self.commit_ts.publish(commit_ts);
        let run_checkpoint = self.release_writer(auto_checkpoint);
        published?;
        info!(txn_id = %txn.txn_id(), %commit_ts, "transaction committed");

        if run_checkpoint {
            self.run_checkpoint()?;
        }
        Ok(())
    }

    /// Rolls `txn` back. A writer's staged changes and catalog versions are discarded and an
    /// abort record is logged.
    ///
    /// # Panics
    ///
    /// Panics if `txn` is a writer that is not the registered writer.
    pub fn rollback_transaction(&self, txn: &Transaction, auto_checkpoint: bool) -> Result<()> {
        if txn.is_read_only() {
            self.leave_reader(txn.txn_id());
            return Ok(());
        }
        self.assert_active_writer(txn);
        let aborted = self.abort(txn);
        let run_checkpoint = self.release_writer(auto_checkpoint);
        aborted?;
        info!(txn_id = %txn.txn_id(), "transaction rolled back");

        if run_checkpoint {
            self.run_checkpoint()?;
        }
        Ok(())
    }

    /// Forces a checkpoint, waiting for a running one to finish first.
    pub fn checkpoint(&self) -> Result<()> {
        {
            let mut state = self.state.lock();
            while state.checkpointing {
                self.gate.wait(&mut state);
            }
            state.checkpointing = true;
        }
        self.run_checkpoint()
    }

    /// Closes the gate for new transactions and waits until every active one has left.
    ///
    /// Re-checks every read transaction poll interval. If the checkpoint wait timeout
    /// passes first, the gate is reopened and [`Error::CheckpointTimeout`] is returned.
    pub fn stop_new_transactions_and_wait_until_all_read_transactions_leave(&self) -> Result<()> {
        let deadline = Instant::now() + self.config.checkpoint_wait_timeout();
        let mut state = self.state.lock();
        state.checkpointing = true;
        while state.active_writer.is_some() || !state.active_readers.is_empty() {
            if Instant::now() >= deadline {
                state.checkpointing = false;
                self.gate.notify_all();
                warn!(
                    readers = state.active_readers.len(),
                    writer = state.active_writer.is_some(),
                    "checkpoint timed out waiting for active transactions"
                );
                return Err(Error::CheckpointTimeout);
            }
            self.drained
                .wait_for(&mut state, self.config.read_txn_poll_interval());
        }
        Ok(())
    }

    /// Reopens the gate and wakes every transaction waiting to begin.
    pub fn allow_receiving_new_transactions(&self) {
        let mut state = self.state.lock();
        state.checkpointing = false;
        self.gate.notify_all();
    }

    /// The newest published commit timestamp.
    #[inline]
    pub fn latest_commit_ts(&self) -> Timestamp {
        self.commit_ts.latest()
    }

    pub fn active_writer(&self) -> Option<Timestamp> {
        self.state.lock().active_writer
    }

    pub fn num_active_readers(&self) -> usize {
        self.state.lock().active_readers.len()
    }

    pub fn is_checkpointing(&self) -> bool {
        self.state.lock().checkpointing
    }

    fn commit_durably(&self, txn: &Transaction) -> Result<Timestamp> {
        txn.commit(&self.catalog, &self.storage, &self.wal)?;
        let commit_ts = self.commit_ts.next_candidate()?;
        self.wal.log_commit(txn.txn_id(), commit_ts)?;
        self.wal.flush()?;
        Ok(commit_ts)
    }

    fn abort(&self, txn: &Transaction) -> Result<()> {
        txn.rollback(&self.catalog, &self.storage)?;
        self.wal.log_abort(txn.txn_id())?;
        self.wal.flush()?;
        Ok(())
    }

    fn assert_active_writer(&self, txn: &Transaction) {
        let active_writer = self.state.lock().active_writer;
        if active_writer != Some(txn.txn_id()) {
            panic!(
                "transaction {} finished but is not the active write transaction",
                txn.txn_id()
            );
        }
    }

    fn leave_reader(&self, txn_id: Timestamp) {
        let mut state = self.state.lock();
        state.active_readers.remove(&txn_id);
        self.drained.notify_all();
        debug!(%txn_id, "read transaction finished");
    }

    /// Clears the writer slot. With `arm_checkpoint`, closes the gate in the same critical
    /// section and returns true, unless another checkpoint already holds it.
    fn release_writer(&self, arm_checkpoint: bool) -> bool {
        let mut state = self.state.lock();
        state.active_writer = None;
        self.drained.notify_all();
        if arm_checkpoint && !state.checkpointing {
            state.checkpointing = true;
            return true;
        }
        false
    }

    /// Runs a checkpoint whose gate the caller has already closed.
    fn run_checkpoint(&self) -> Result<()> {
        self.stop_new_transactions_and_wait_until_all_read_transactions_leave()?;
        let result = self.checkpoint_drained();
        self.allow_receiving_new_transactions();
        result
    }

    /// Folds the WAL into the committed layer, writes the storage snapshot and clears the
    /// WAL. Requires that no transaction is active.
    fn checkpoint_drained(&self) -> Result<()> {
        let entries = self.wal.read_all()?;
        let replayer = WalReplayer::new(
            &self.storage,
            Some(self.directory.as_path()),
            ReplayMode::Checkpoint,
        );
        let outcome = replayer.replay(entries)?;
        self.catalog.checkpoint_in_memory();
        self.storage.save_snapshot(&self.directory)?;
        self.wal.clear()?;
        info!(
            committed = outcome.committed,
            discarded = outcome.discarded,
            catalog_changed = outcome.catalog_changed,
            "checkpoint finished"
        );
        Ok(())
    }
}
