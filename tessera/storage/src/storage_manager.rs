use std::collections::BTreeMap;
use std::sync::Arc;

use parking_lot::RwLock;
use rayon::prelude::*;
use tessera_catalog::{Catalog, CatalogEntry};
use tessera_common::types::{NodeGroupIdx, PropertyId, TableId, node_group_position};
use tessera_common::value::ScalarValue;
use tessera_transaction::{Transaction, TransactionType};
use tracing::{debug, info};

use crate::column::ColumnChunk;
use crate::error::{StorageError, StorageResult};
use crate::local_storage::LocalStorage;
use crate::table::Table;
use crate::wal::Wal;

/// Owns the storage of every node and rel table.
pub struct StorageManager {
    tables: RwLock<BTreeMap<TableId, Arc<Table>>>,
    enable_compression: bool,
}

impl StorageManager {
    pub fn new(enable_compression: bool) -> Self {
        Self::from_tables(BTreeMap::new(), enable_compression)
    }

    pub(crate) fn from_tables(
        tables: BTreeMap<TableId, Arc<Table>>,
        enable_compression: bool,
    ) -> Self {
        Self {
            tables: RwLock::new(tables),
            enable_compression,
        }
    }

    #[inline]
    pub fn enable_compression(&self) -> bool {
        self.enable_compression
    }

    /// Returns the storage of a node or rel table, creating the table and any missing
    /// columns from `entry`. Other entry kinds have no storage.
    ///
    /// Storage is created lazily so a table whose creation is committed but not yet
    /// checkpointed is usable.
    pub fn ensure_table(&self, entry: &CatalogEntry) -> Option<Arc<Table>> {
        if !entry.kind().has_storage() {
            return None;
        }
        let schema = entry.schema()?;
        let table_id = schema.table_id();
        if let Some(table) = self.tables.read().get(&table_id) {
            for property in schema.properties() {
                table.add_column(property);
            }
            return Some(table.clone());
        }
        let table = self
            .tables
            .write()
            .entry(table_id)
            .or_insert_with(|| {
                debug!(table_id, name = schema.name(), "table storage created");
                Arc::new(Table::new(
                    table_id,
                    schema.properties(),
                    self.enable_compression,
                ))
            })
            .clone();
        Some(table)
    }

    /// Creates storage for every node and rel table `txn` can see.
    pub fn ensure_tables(&self, catalog: &Catalog, txn: &dyn Transaction) {
        for entry in catalog.table_entries(txn) {
            self.ensure_table(&entry);
        }
    }

    /// Drops the storage of `table_id`. Returns false if it does not exist.
    pub fn drop_table(&self, table_id: TableId) -> bool {
        let dropped = self.tables.write().remove(&table_id).is_some();
        if dropped {
            debug!(table_id, "table storage dropped");
        }
        dropped
    }

    pub fn get_table(&self, table_id: TableId) -> StorageResult<Arc<Table>> {
        self.tables
            .read()
            .get(&table_id)
            .cloned()
            .ok_or(StorageError::TableNotFound(table_id))
    }

    pub fn contains_table(&self, table_id: TableId) -> bool {
        self.tables.read().contains_key(&table_id)
    }

    pub fn table_ids(&self) -> Vec<TableId> {
        self.tables.read().keys().copied().collect()
    }

    pub(crate) fn tables(&self) -> Vec<Arc<Table>> {
        self.tables.read().values().cloned().collect()
    }

    // ---------------------------------------------------------------------------------
    // Commit and rollback
    // ---------------------------------------------------------------------------------

    /// Logs the new statistics of every table `local` touched. Runs after
    /// [`LocalStorage::prepare_commit`] has written them to the shadow layer.
    pub fn prepare_commit(&self, local: &LocalStorage, wal: &Wal) -> StorageResult<()> {
        for table_id in local.table_ids() {
            let table = self.get_table(table_id)?;
            if let Some(stats) = table.shadow_statistics() {
                wal.log_table_statistics(table_id, stats)?;
            }
        }
        Ok(())
    }

    /// Keeps the shadow writes of the writer whose commit record is durable.
    pub fn commit_in_memory(&self) {
        for table in self.tables() {
            table.commit_shadow_writes();
        }
    }

    /// Unwinds the shadow writes of the writer that rolled back.
    pub fn prepare_rollback(&self) {
        for table in self.tables() {
            table.rollback_shadow_writes();
        }
    }

    // ---------------------------------------------------------------------------------
    // Bulk copy
    // ---------------------------------------------------------------------------------

    /// Appends `rows` to `table_id` directly in its shadow layer.
    ///
    /// Chunks of different columns are built in parallel. Every chunk is logged, followed by
    /// the new statistics and a single copy record for the table. Returns the number of rows
    /// copied.
    pub fn copy_table(
        &self,
        table_id: TableId,
        rows: Vec<BTreeMap<PropertyId, ScalarValue>>,
        wal: &Wal,
    ) -> StorageResult<u64> {
        let table = self.get_table(table_id)?;
        let mut stats = table.statistics(TransactionType::Write);
        let start = stats.num_rows;
        let num_rows = rows.len() as u64;
        let columns = table.columns();

        for row in &rows {
            if let Some(property_id) = row.keys().find(|id| table.column(**id).is_err()) {
                return Err(StorageError::ColumnNotFound {
                    table_id,
                    property_id: *property_id,
                });
            }
        }

        let chunks = columns
            .par_iter()
            .map(|column| -> StorageResult<(PropertyId, Vec<_>)> {
                let property = column.property();
                let mut node_groups: BTreeMap<NodeGroupIdx, BTreeMap<u64, ScalarValue>> =
                    BTreeMap::new();
                for (i, row) in rows.iter().enumerate() {
                    let value = row
                        .get(&property.id())
                        .cloned()
                        .unwrap_or_else(|| ScalarValue::null_of(property.logical_type()))
                        .cast_to(property.logical_type())?;
                    let (node_group_idx, position) = node_group_position(start + i as u64);
                    node_groups
                        .entry(node_group_idx)
                        .or_default()
                        .insert(position, value);
                }
                let chunks: Vec<(NodeGroupIdx, Arc<ColumnChunk>)> = node_groups
                    .iter()
                    .map(|(node_group_idx, updates)| {
                        (*node_group_idx, column.prepare_chunk(*node_group_idx, updates).0)
                    })
                    .collect();
                Ok((property.id(), chunks))
            })
            .collect::<StorageResult<Vec<_>>>()?;

        for (property_id, chunks) in chunks {
            for (node_group_idx, chunk) in chunks {
                table.write_shadow_chunk(property_id, node_group_idx, chunk.clone())?;
                wal.log_chunk_update(table_id, property_id, node_group_idx, &chunk)?;
            }
        }
        stats.num_rows += num_rows;
        table.write_shadow_statistics(stats.clone());
        wal.log_table_statistics(table_id, stats)?;
        wal.log_copy_table(table_id)?;
        info!(table_id, rows = num_rows, "rows copied");
        Ok(num_rows)
    }
}
