use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

use parking_lot::{Mutex, RwLock};
use serde::{Deserialize, Serialize};
use tessera_catalog::property::Property;
use tessera_common::types::{NodeGroupIdx, Offset, PropertyId, TableId};
use tessera_common::value::ScalarValue;
use tessera_transaction::TransactionType;

use crate::column::{Column, ColumnChunk};
use crate::error::{StorageError, StorageResult};
use crate::local_storage::LocalTable;

/// Row count and deletion markers of a table.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableStatistics {
    pub num_rows: u64,
    pub deleted: BTreeSet<Offset>,
}

impl TableStatistics {
    #[inline]
    pub fn num_live_rows(&self) -> u64 {
        self.num_rows - self.deleted.len() as u64
    }
}

/// Undo information for a shadow write of the committing transaction.
enum ShadowUndo {
    Chunk {
        property_id: PropertyId,
        node_group_idx: NodeGroupIdx,
        prev: Option<Arc<ColumnChunk>>,
    },
    Statistics(Option<TableStatistics>),
}

/// Storage of a node or rel table.
pub struct Table {
    table_id: TableId,
    enable_compression: bool,
    columns: RwLock<BTreeMap<PropertyId, Arc<Column>>>,
    committed_stats: RwLock<TableStatistics>,
    shadow_stats: RwLock<Option<TableStatistics>>,
    /// Shadow writes of the transaction that is currently committing.
    undo: Mutex<Vec<ShadowUndo>>,
}

impl Table {
    pub fn new(table_id: TableId, properties: &[Property], enable_compression: bool) -> Self {
        let columns = properties
            .iter()
            .map(|p| (p.id(), Arc::new(Column::new(p.clone(), enable_compression))))
            .collect();
        Self::from_parts(table_id, enable_compression, columns, TableStatistics::default())
    }

    pub(crate) fn from_parts(
        table_id: TableId,
        enable_compression: bool,
        columns: BTreeMap<PropertyId, Arc<Column>>,
        statistics: TableStatistics,
    ) -> Self {
        Self {
            table_id,
            enable_compression,
            columns: RwLock::new(columns),
            committed_stats: RwLock::new(statistics),
            shadow_stats: RwLock::new(None),
            undo: Mutex::new(Vec::new()),
        }
    }

    #[inline]
    pub fn table_id(&self) -> TableId {
        self.table_id
    }

    pub fn column(&self, property_id: PropertyId) -> StorageResult<Arc<Column>> {
        self.columns
            .read()
            .get(&property_id)
            .cloned()
            .ok_or(StorageError::ColumnNotFound {
                table_id: self.table_id,
                property_id,
            })
    }

    pub fn columns(&self) -> Vec<Arc<Column>> {
        self.columns.read().values().cloned().collect()
    }

    pub fn property_ids(&self) -> Vec<PropertyId> {
        self.columns.read().keys().copied().collect()
    }

    /// Adds a column for `property`. Returns false if it already exists.
    pub fn add_column(&self, property: &Property) -> bool {
        let mut columns = self.columns.write();
        if columns.contains_key(&property.id()) {
            return false;
        }
        columns.insert(
            property.id(),
            Arc::new(Column::new(property.clone(), self.enable_compression)),
        );
        true
    }

    /// Drops the column of `property_id`. Returns false if it does not exist.
    pub fn drop_column(&self, property_id: PropertyId) -> bool {
        self.columns.write().remove(&property_id).is_some()
    }

    /// The statistics `txn_type` reads.
    pub fn statistics(&self, txn_type: TransactionType) -> TableStatistics {
        if txn_type == TransactionType::Write {
            if let Some(stats) = self.shadow_stats.read().as_ref() {
                return stats.clone();
            }
        }
        self.committed_stats.read().clone()
    }

    #[inline]
    pub fn num_rows(&self, txn_type: TransactionType) -> u64 {
        self.statistics(txn_type).num_rows
    }

    /// Reads `property_ids` of the row at `offset`, overlaying `local` changes if given.
    pub fn lookup(
        &self,
        txn_type: TransactionType,
        local: Option<&LocalTable>,
        offset: Offset,
        property_ids: &[PropertyId],
    ) -> StorageResult<Vec<ScalarValue>> {
        let stats = self.statistics(txn_type);
        let num_rows = local.map_or(stats.num_rows, LocalTable::num_rows);
        let deleted = stats.deleted.contains(&offset)
            || local.is_some_and(|local| local.is_deleted(offset));
        if offset >= num_rows || deleted {
            return Err(StorageError::RowNotFound {
                table_id: self.table_id,
                offset,
            });
        }
        self.read_row(txn_type, local, offset, property_ids)
    }

    /// Reads `property_ids` of every live row in offset order.
    pub fn scan(
        &self,
        txn_type: TransactionType,
        local: Option<&LocalTable>,
        property_ids: &[PropertyId],
    ) -> StorageResult<Vec<(Offset, Vec<ScalarValue>)>> {
        let stats = self.statistics(txn_type);
        let num_rows = local.map_or(stats.num_rows, LocalTable::num_rows);
        (0..num_rows)
            .filter(|offset| {
                !stats.deleted.contains(offset)
                    && !local.is_some_and(|local| local.is_deleted(*offset))
            })
            .map(|offset| {
                self.read_row(txn_type, local, offset, property_ids)
                    .map(|values| (offset, values))
            })
            .collect()
    }

    fn read_row(
        &self,
        txn_type: TransactionType,
        local: Option<&LocalTable>,
        offset: Offset,
        property_ids: &[PropertyId],
    ) -> StorageResult<Vec<ScalarValue>> {
        property_ids
            .iter()
            .map(|property_id| {
                if let Some(value) = local.and_then(|local| local.lookup(offset, *property_id)) {
                    return Ok(value.clone());
                }
                Ok(self.column(*property_id)?.lookup(txn_type, offset))
            })
            .collect()
    }

    // ---------------------------------------------------------------------------------
    // Shadow writes of the committing transaction
    // ---------------------------------------------------------------------------------

    pub(crate) fn write_shadow_chunk(
        &self,
        property_id: PropertyId,
        node_group_idx: NodeGroupIdx,
        chunk: Arc<ColumnChunk>,
    ) -> StorageResult<()> {
        let prev = self
            .column(property_id)?
            .set_shadow_chunk(node_group_idx, Some(chunk));
        self.undo.lock().push(ShadowUndo::Chunk {
            property_id,
            node_group_idx,
            prev,
        });
        Ok(())
    }

    pub(crate) fn write_shadow_statistics(&self, stats: TableStatistics) {
        let prev = self.shadow_stats.write().replace(stats);
        self.undo.lock().push(ShadowUndo::Statistics(prev));
    }

    /// Keeps the shadow writes of the transaction that just committed.
    pub(crate) fn commit_shadow_writes(&self) {
        self.undo.lock().clear();
    }

    /// Unwinds the shadow writes of the transaction that rolled back, newest first.
    pub(crate) fn rollback_shadow_writes(&self) {
        let undo = std::mem::take(&mut *self.undo.lock());
        for record in undo.into_iter().rev() {
            match record {
                ShadowUndo::Chunk {
                    property_id,
                    node_group_idx,
                    prev,
                } => {
                    // A column dropped in the same transaction has nothing left to restore.
                    if let Ok(column) = self.column(property_id) {
                        column.set_shadow_chunk(node_group_idx, prev);
                    }
                }
                ShadowUndo::Statistics(prev) => *self.shadow_stats.write() = prev,
            }
        }
    }

    pub fn has_shadow_writes(&self) -> bool {
        self.shadow_stats.read().is_some()
            || self.columns.read().values().any(|c| c.has_shadow_chunks())
    }

    // ---------------------------------------------------------------------------------
    // Checkpoint and replay
    // ---------------------------------------------------------------------------------

    pub(crate) fn shadow_statistics(&self) -> Option<TableStatistics> {
        self.shadow_stats.read().clone()
    }

    /// Moves every shadow chunk and the shadow statistics into the committed layer.
    pub(crate) fn checkpoint_in_memory(&self) {
        for column in self.columns.read().values() {
            column.checkpoint_in_memory();
        }
        if let Some(stats) = self.shadow_stats.write().take() {
            *self.committed_stats.write() = stats;
        }
    }

    pub(crate) fn install_committed_statistics(&self, stats: TableStatistics) {
        *self.committed_stats.write() = stats;
        *self.shadow_stats.write() = None;
    }

    pub(crate) fn committed_statistics(&self) -> TableStatistics {
        self.committed_stats.read().clone()
    }
}
