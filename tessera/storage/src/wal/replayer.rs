//! Replays the WAL into the storage layer.
//!
//! Records are grouped per transaction. A group followed by a commit record is applied. A
//! group followed by an abort record, or left unterminated at the tail of the log, is
//! discarded. Applying a record is idempotent, so replaying the same log twice yields the
//! same state.

use std::path::Path;
use std::sync::Arc;

use tessera_catalog::Catalog;
use tracing::{debug, info, warn};

use super::record::{RedoEntry, WalRecord};
use crate::error::StorageResult;
use crate::storage_manager::StorageManager;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReplayMode {
    /// Folds the log of a running database into the committed layer.
    Checkpoint,
    /// Rebuilds state from the log after a restart.
    Recovery,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReplayOutcome {
    pub committed: usize,
    pub discarded: usize,
    /// Whether a committed writer changed the catalog, making the original catalog snapshot
    /// newer than the in-memory catalog.
    pub catalog_changed: bool,
}

pub struct WalReplayer<'a> {
    storage: &'a StorageManager,
    directory: Option<&'a Path>,
    mode: ReplayMode,
}

impl<'a> WalReplayer<'a> {
    pub fn new(storage: &'a StorageManager, directory: Option<&'a Path>, mode: ReplayMode) -> Self {
        Self {
            storage,
            directory,
            mode,
        }
    }

    pub fn replay(&self, entries: Vec<RedoEntry>) -> StorageResult<ReplayOutcome> {
        let mut outcome = ReplayOutcome::default();
        let mut group = Vec::new();
        for entry in entries {
            match entry.record {
                WalRecord::Commit { txn_id, commit_ts } => {
                    debug!(%txn_id, %commit_ts, records = group.len(), "applying committed records");
                    for record in group.drain(..) {
                        self.apply(record, &mut outcome)?;
                    }
                    outcome.committed += 1;
                }
                WalRecord::Abort { txn_id } => {
                    debug!(%txn_id, records = group.len(), "discarding aborted records");
                    group.clear();
                    outcome.discarded += 1;
                }
                record => group.push(record),
            }
        }
        if !group.is_empty() {
            warn!(records = group.len(), "discarding records of an unfinished transaction");
            outcome.discarded += 1;
        }
        // Committed snapshots were installed from their records. The file left behind may
        // belong to a writer that never committed.
        if let Some(directory) = self.directory {
            Catalog::discard_wal_version_file(directory)?;
        }
        info!(
            mode = ?self.mode,
            committed = outcome.committed,
            discarded = outcome.discarded,
            "WAL replayed"
        );
        Ok(outcome)
    }

    fn apply(&self, record: WalRecord, outcome: &mut ReplayOutcome) -> StorageResult<()> {
        match record {
            WalRecord::Catalog { snapshot } => {
                if let Some(directory) = self.directory {
                    Catalog::install_snapshot(directory, &snapshot)?;
                }
                outcome.catalog_changed = true;
            }
            WalRecord::NewTable { entry } => {
                self.storage.ensure_table(&entry);
            }
            WalRecord::DropTable { table_id } => {
                self.storage.drop_table(table_id);
            }
            WalRecord::AddProperty { table_id, property } => {
                if let Ok(table) = self.storage.get_table(table_id) {
                    table.add_column(&property);
                }
            }
            WalRecord::DropProperty {
                table_id,
                property_id,
            } => {
                if let Ok(table) = self.storage.get_table(table_id) {
                    table.drop_column(property_id);
                }
            }
            WalRecord::CopyTable { table_id } => {
                if self.mode == ReplayMode::Checkpoint {
                    if let Ok(table) = self.storage.get_table(table_id) {
                        table.checkpoint_in_memory();
                    }
                }
            }
            WalRecord::ChunkUpdate {
                table_id,
                property_id,
                node_group_idx,
                chunk,
            } => match self
                .storage
                .get_table(table_id)
                .and_then(|table| table.column(property_id))
            {
                Ok(column) => column.install_committed_chunk(node_group_idx, Arc::new(chunk)),
                Err(_) => debug!(table_id, property_id, "skipping chunk of a dropped column"),
            },
            WalRecord::TableStatistics {
                table_id,
                statistics,
            } => {
                if let Ok(table) = self.storage.get_table(table_id) {
                    table.install_committed_statistics(statistics);
                }
            }
            WalRecord::Commit { .. } | WalRecord::Abort { .. } => {}
        }
        Ok(())
    }
}
