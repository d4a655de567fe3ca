mod log_file;
pub mod record;
pub mod replayer;

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};

pub use log_file::WalFile;
use parking_lot::Mutex;
pub use record::{RedoEntry, WalRecord};
pub use replayer::{ReplayMode, ReplayOutcome, WalReplayer};
use tessera_catalog::property::Property;
use tessera_catalog::wal::CatalogWal;
use tessera_catalog::{CatalogEntry, CatalogError, CatalogResult};
use tessera_common::constants::WAL_FILE_NAME;
use tessera_common::types::{NodeGroupIdx, PropertyId, TableId};
use tessera_transaction::Timestamp;
use tracing::{debug, info};

use crate::column::ColumnChunk;
use crate::error::{StorageError, StorageResult};
use crate::table::TableStatistics;

/// The database-wide write-ahead log.
///
/// Appends are serialized by a mutex. Records become durable on [`Wal::flush`], which the
/// transaction manager calls after the commit record of every writer.
pub struct Wal {
    file: Mutex<WalFile>,
    next_lsn: AtomicU64,
}

impl Wal {
    pub fn open<P: AsRef<Path>>(path: P) -> StorageResult<Self> {
        let mut file = WalFile::open(path)?;
        let entries = file.read_all()?;
        let next_lsn = entries.last().map_or(0, |entry| entry.lsn + 1);
        info!(path = %file.path().display(), records = entries.len(), "WAL opened");
        Ok(Self {
            file: Mutex::new(file),
            next_lsn: AtomicU64::new(next_lsn),
        })
    }

    /// Opens the log file of the database stored in `dir`.
    pub fn open_in(dir: &Path) -> StorageResult<Self> {
        Self::open(dir.join(WAL_FILE_NAME))
    }

    pub fn path(&self) -> PathBuf {
        self.file.lock().path().to_path_buf()
    }

    /// Appends `record` and returns its LSN.
    pub fn append(&self, record: WalRecord) -> StorageResult<u64> {
        let mut file = self.file.lock();
        let lsn = self.next_lsn.fetch_add(1, Ordering::SeqCst);
        file.append(&RedoEntry { lsn, record })?;
        Ok(lsn)
    }

    pub fn log_chunk_update(
        &self,
        table_id: TableId,
        property_id: PropertyId,
        node_group_idx: NodeGroupIdx,
        chunk: &ColumnChunk,
    ) -> StorageResult<()> {
        self.append(WalRecord::ChunkUpdate {
            table_id,
            property_id,
            node_group_idx,
            chunk: chunk.clone(),
        })?;
        Ok(())
    }

    pub fn log_table_statistics(
        &self,
        table_id: TableId,
        statistics: TableStatistics,
    ) -> StorageResult<()> {
        self.append(WalRecord::TableStatistics {
            table_id,
            statistics,
        })?;
        Ok(())
    }

    pub fn log_copy_table(&self, table_id: TableId) -> StorageResult<()> {
        self.append(WalRecord::CopyTable { table_id })?;
        Ok(())
    }

    pub fn log_commit(&self, txn_id: Timestamp, commit_ts: Timestamp) -> StorageResult<()> {
        let lsn = self.append(WalRecord::Commit { txn_id, commit_ts })?;
        debug!(lsn, %txn_id, %commit_ts, "commit logged");
        Ok(())
    }

    pub fn log_abort(&self, txn_id: Timestamp) -> StorageResult<()> {
        self.append(WalRecord::Abort { txn_id })?;
        Ok(())
    }

    pub fn flush(&self) -> StorageResult<()> {
        self.file.lock().flush()
    }

    pub fn read_all(&self) -> StorageResult<Vec<RedoEntry>> {
        self.file.lock().read_all()
    }

    /// Drops every record once a checkpoint has made them redundant.
    pub fn clear(&self) -> StorageResult<()> {
        self.file.lock().clear()
    }

    pub fn is_empty(&self) -> StorageResult<bool> {
        Ok(self.read_all()?.is_empty())
    }
}

fn into_catalog_error(e: StorageError) -> CatalogError {
    CatalogError::External(Box::new(e))
}

impl CatalogWal for Wal {
    fn log_catalog_record(&self, snapshot: &[u8]) -> CatalogResult<()> {
        self.append(WalRecord::Catalog {
            snapshot: snapshot.to_vec(),
        })
        .map_err(into_catalog_error)?;
        Ok(())
    }

    fn log_create_table_record(&self, entry: &CatalogEntry) -> CatalogResult<()> {
        self.append(WalRecord::NewTable {
            entry: entry.clone(),
        })
        .map_err(into_catalog_error)?;
        Ok(())
    }

    fn log_drop_table_record(&self, table_id: TableId) -> CatalogResult<()> {
        self.append(WalRecord::DropTable { table_id })
            .map_err(into_catalog_error)?;
        Ok(())
    }

    fn log_add_property_record(
        &self,
        table_id: TableId,
        property: &Property,
    ) -> CatalogResult<()> {
        self.append(WalRecord::AddProperty {
            table_id,
            property: property.clone(),
        })
        .map_err(into_catalog_error)?;
        Ok(())
    }

    fn log_drop_property_record(
        &self,
        table_id: TableId,
        property_id: PropertyId,
    ) -> CatalogResult<()> {
        self.append(WalRecord::DropProperty {
            table_id,
            property_id,
        })
        .map_err(into_catalog_error)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeSet;

    use super::*;

    #[test]
    fn test_append_read_clear() {
        let dir = tempfile::tempdir().unwrap();
        let wal = Wal::open_in(dir.path()).unwrap();
        wal.log_catalog_record(b"tables").unwrap();
        wal.log_table_statistics(3, TableStatistics {
            num_rows: 2,
            deleted: BTreeSet::from([1]),
        })
        .unwrap();
        wal.log_commit(Timestamp::with_ts(Timestamp::TXN_ID_START), Timestamp::with_ts(1))
            .unwrap();
        wal.flush().unwrap();

        let entries = wal.read_all().unwrap();
        assert_eq!(entries.len(), 3);
        assert_eq!(entries[0].record, WalRecord::Catalog {
            snapshot: b"tables".to_vec()
        });
        assert!(entries[2].record.is_transaction_end());
        assert_eq!(
            entries.iter().map(|e| e.lsn).collect::<Vec<_>>(),
            vec![0, 1, 2]
        );

        wal.clear().unwrap();
        assert!(wal.is_empty().unwrap());
        wal.log_abort(Timestamp::with_ts(Timestamp::TXN_ID_START)).unwrap();
        assert_eq!(wal.read_all().unwrap().len(), 1);
    }

    #[test]
    fn test_reopen_continues_lsn_and_cuts_torn_tail() {
        let dir = tempfile::tempdir().unwrap();
        {
            let wal = Wal::open_in(dir.path()).unwrap();
            wal.log_copy_table(1).unwrap();
            wal.log_copy_table(2).unwrap();
            wal.flush().unwrap();
        }
        let path = dir.path().join(WAL_FILE_NAME);
        let len = std::fs::metadata(&path).unwrap().len();
        let file = std::fs::OpenOptions::new().write(true).open(&path).unwrap();
        file.set_len(len - 1).unwrap();
        drop(file);

        let wal = Wal::open_in(dir.path()).unwrap();
        wal.log_copy_table(3).unwrap();
        let entries = wal.read_all().unwrap();
        assert_eq!(
            entries.iter().map(|e| e.record.clone()).collect::<Vec<_>>(),
            vec![
                WalRecord::CopyTable { table_id: 1 },
                WalRecord::CopyTable { table_id: 3 }
            ]
        );
        assert_eq!(entries[1].lsn, 1);
    }
}
