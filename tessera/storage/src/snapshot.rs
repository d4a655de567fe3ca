//! The checkpointed state of every table, stored as one checksummed frame.

use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tessera_catalog::property::Property;
use tessera_common::constants::STORAGE_FILE_NAME;
use tessera_common::frame::{read_frame_file, write_frame_file};
use tessera_common::types::{NodeGroupIdx, TableId};
use tracing::info;

use crate::column::{Column, ColumnChunk};
use crate::error::{CheckpointError, StorageResult};
use crate::storage_manager::StorageManager;
use crate::table::{Table, TableStatistics};

#[derive(Debug, Serialize, Deserialize)]
struct StorageSnapshot {
    tables: Vec<TableSnapshot>,
}

#[derive(Debug, Serialize, Deserialize)]
struct TableSnapshot {
    table_id: TableId,
    statistics: TableStatistics,
    columns: Vec<ColumnSnapshot>,
}

#[derive(Debug, Serialize, Deserialize)]
struct ColumnSnapshot {
    property: Property,
    chunks: BTreeMap<NodeGroupIdx, Arc<ColumnChunk>>,
}

impl StorageManager {
    /// Writes the committed layer of every table to the storage file under `dir`.
    pub fn save_snapshot(&self, dir: &Path) -> StorageResult<()> {
        let snapshot = StorageSnapshot {
            tables: self
                .tables()
                .iter()
                .map(|table| TableSnapshot {
                    table_id: table.table_id(),
                    statistics: table.committed_statistics(),
                    columns: table
                        .columns()
                        .iter()
                        .map(|column| ColumnSnapshot {
                            property: column.property().clone(),
                            chunks: column.committed_chunks(),
                        })
                        .collect(),
                })
                .collect(),
        };
        let payload = postcard::to_allocvec(&snapshot)
            .map_err(|e| CheckpointError::SerializationFailed(e.to_string()))?;
        let path = dir.join(STORAGE_FILE_NAME);
        write_frame_file(&path, &payload).map_err(CheckpointError::Frame)?;
        info!(path = %path.display(), tables = snapshot.tables.len(), "storage snapshot written");
        Ok(())
    }

    /// Loads the storage file under `dir`, or starts empty if there is none.
    pub fn load_snapshot(dir: &Path, enable_compression: bool) -> StorageResult<Self> {
        let path = dir.join(STORAGE_FILE_NAME);
        if !path.exists() {
            return Ok(Self::new(enable_compression));
        }
        let payload = read_frame_file(&path).map_err(CheckpointError::Frame)?;
        let snapshot: StorageSnapshot = postcard::from_bytes(&payload)
            .map_err(|e| CheckpointError::DeserializationFailed(e.to_string()))?;

        let tables = snapshot
            .tables
            .into_iter()
            .map(|table| {
                let columns = table
                    .columns
                    .into_iter()
                    .map(|column| {
                        let id = column.property.id();
                        let column =
                            Column::with_chunks(column.property, enable_compression, column.chunks);
                        (id, Arc::new(column))
                    })
                    .collect();
                let loaded =
                    Table::from_parts(table.table_id, enable_compression, columns, table.statistics);
                (table.table_id, Arc::new(loaded))
            })
            .collect::<BTreeMap<_, _>>();
        info!(path = %path.display(), tables = tables.len(), "storage snapshot loaded");
        Ok(Self::from_tables(tables, enable_compression))
    }
}

#[cfg(test)]
mod tests {
    use tessera_common::logical_type::LogicalType;
    use tessera_common::value::ScalarValue;
    use tessera_transaction::TransactionType;

    use super::*;

    #[test]
    fn test_snapshot_keeps_committed_layer_only() {
        let dir = tempfile::tempdir().unwrap();
        let property = Property::new(0, "id".into(), LogicalType::Int64, ScalarValue::Int64(None));
        let table = Arc::new(Table::new(7, &[property], true));
        let storage = StorageManager::from_tables(BTreeMap::from([(7, table.clone())]), true);

        let committed = Arc::new(ColumnChunk::new(vec![1i64.into(), 2i64.into()], true));
        table.column(0).unwrap().install_committed_chunk(0, committed);
        table.install_committed_statistics(TableStatistics {
            num_rows: 2,
            deleted: Default::default(),
        });
        table.write_shadow_statistics(TableStatistics {
            num_rows: 3,
            deleted: Default::default(),
        });
        storage.save_snapshot(dir.path()).unwrap();

        let loaded = StorageManager::load_snapshot(dir.path(), true).unwrap();
        let table = loaded.get_table(7).unwrap();
        assert_eq!(table.num_rows(TransactionType::Write), 2);
        assert_eq!(
            table.scan(TransactionType::ReadOnly, None, &[0]).unwrap(),
            vec![(0, vec![ScalarValue::from(1i64)]), (1, vec![ScalarValue::from(2i64)])]
        );

        let empty = StorageManager::load_snapshot(&dir.path().join("missing"), true).unwrap();
        assert!(empty.table_ids().is_empty());
    }
}
