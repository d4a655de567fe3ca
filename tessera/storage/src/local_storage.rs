//! Changes a write transaction has made but not yet committed.
//!
//! Inserts, updates and deletes land in a per-table overlay that only the owning transaction
//! reads. At commit, [`LocalStorage::prepare_commit`] folds every touched node group into a
//! new chunk, patching the current chunk in place when the encoding allows and rewriting it
//! otherwise, and logs the result to the WAL.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

use tessera_common::types::{NodeGroupIdx, Offset, PropertyId, TableId, node_group_position};
use tessera_common::value::ScalarValue;
use tessera_transaction::TransactionType;
use tracing::debug;

use crate::error::{StorageError, StorageResult};
use crate::table::{Table, TableStatistics};
use crate::wal::Wal;

/// Pending values of one column, grouped by node group and position inside the group.
#[derive(Debug, Default)]
pub struct LocalColumn {
    node_groups: BTreeMap<NodeGroupIdx, BTreeMap<u64, ScalarValue>>,
}

impl LocalColumn {
    fn set(&mut self, offset: Offset, value: ScalarValue) {
        let (node_group_idx, position) = node_group_position(offset);
        self.node_groups
            .entry(node_group_idx)
            .or_default()
            .insert(position, value);
    }

    fn get(&self, offset: Offset) -> Option<&ScalarValue> {
        let (node_group_idx, position) = node_group_position(offset);
        self.node_groups.get(&node_group_idx)?.get(&position)
    }
}

pub struct LocalTable {
    table: Arc<Table>,
    base: TableStatistics,
    num_inserted: u64,
    columns: BTreeMap<PropertyId, LocalColumn>,
    deleted: BTreeSet<Offset>,
}

impl LocalTable {
    fn new(table: Arc<Table>) -> Self {
        let base = table.statistics(TransactionType::Write);
        Self {
            table,
            base,
            num_inserted: 0,
            columns: BTreeMap::new(),
            deleted: BTreeSet::new(),
        }
    }

    #[inline]
    pub fn table_id(&self) -> TableId {
        self.table.table_id()
    }

    /// Rows of the table including the ones this transaction inserted.
    #[inline]
    pub fn num_rows(&self) -> u64 {
        self.base.num_rows + self.num_inserted
    }

    #[inline]
    pub fn num_inserted(&self) -> u64 {
        self.num_inserted
    }

    #[inline]
    pub fn is_deleted(&self, offset: Offset) -> bool {
        self.deleted.contains(&offset)
    }

    pub fn lookup(&self, offset: Offset, property_id: PropertyId) -> Option<&ScalarValue> {
        self.columns.get(&property_id)?.get(offset)
    }

    fn check_live(&self, offset: Offset) -> StorageResult<()> {
        if offset >= self.num_rows()
            || self.base.deleted.contains(&offset)
            || self.deleted.contains(&offset)
        {
            return Err(StorageError::RowNotFound {
                table_id: self.table_id(),
                offset,
            });
        }
        Ok(())
    }

    fn cast(&self, property_id: PropertyId, value: ScalarValue) -> StorageResult<ScalarValue> {
        let column = self.table.column(property_id)?;
        Ok(value.cast_to(column.property().logical_type())?)
    }

    fn insert(&mut self, mut values: BTreeMap<PropertyId, ScalarValue>) -> StorageResult<Offset> {
        let mut row = Vec::new();
        for column in self.table.columns() {
            let property = column.property();
            let value = values
                .remove(&property.id())
                .unwrap_or_else(|| ScalarValue::null_of(property.logical_type()));
            row.push((property.id(), value.cast_to(property.logical_type())?));
        }
        if let Some(property_id) = values.into_keys().next() {
            return Err(StorageError::ColumnNotFound {
                table_id: self.table_id(),
                property_id,
            });
        }
        let offset = self.num_rows();
        for (property_id, value) in row {
            self.columns.entry(property_id).or_default().set(offset, value);
        }
        self.num_inserted += 1;
        Ok(offset)
    }

    fn update(
        &mut self,
        offset: Offset,
        property_id: PropertyId,
        value: ScalarValue,
    ) -> StorageResult<()> {
        self.check_live(offset)?;
        let value = self.cast(property_id, value)?;
        self.columns.entry(property_id).or_default().set(offset, value);
        Ok(())
    }

    fn delete(&mut self, offset: Offset) -> StorageResult<()> {
        self.check_live(offset)?;
        self.deleted.insert(offset);
        Ok(())
    }

    fn prepare_commit(&self, wal: &Wal) -> StorageResult<()> {
        let table_id = self.table_id();
        for (property_id, local_column) in &self.columns {
            let column = self.table.column(*property_id)?;
            for (node_group_idx, updates) in &local_column.node_groups {
                let (chunk, in_place) = column.prepare_chunk(*node_group_idx, updates);
                debug!(
                    table_id,
                    property_id,
                    node_group_idx,
                    updates = updates.len(),
                    in_place,
                    "column chunk prepared"
                );
                self.table
                    .write_shadow_chunk(*property_id, *node_group_idx, chunk.clone())?;
                wal.log_chunk_update(table_id, *property_id, *node_group_idx, &chunk)?;
            }
        }
        if self.num_inserted > 0 || !self.deleted.is_empty() {
            let mut stats = self.base.clone();
            stats.num_rows = self.num_rows();
            stats.deleted.extend(self.deleted.iter().copied());
            self.table.write_shadow_statistics(stats);
        }
        Ok(())
    }
}

/// All uncommitted row changes of one write transaction.
#[derive(Default)]
pub struct LocalStorage {
    tables: BTreeMap<TableId, LocalTable>,
}

impl LocalStorage {
    pub fn new() -> Self {
        Self::default()
    }

    fn local_table_mut(&mut self, table: &Arc<Table>) -> &mut LocalTable {
        self.tables
            .entry(table.table_id())
            .or_insert_with(|| LocalTable::new(table.clone()))
    }

    /// Appends a row. Properties missing from `values` are null.
    pub fn insert(
        &mut self,
        table: &Arc<Table>,
        values: BTreeMap<PropertyId, ScalarValue>,
    ) -> StorageResult<Offset> {
        self.local_table_mut(table).insert(values)
    }

    pub fn update(
        &mut self,
        table: &Arc<Table>,
        offset: Offset,
        property_id: PropertyId,
        value: ScalarValue,
    ) -> StorageResult<()> {
        self.local_table_mut(table).update(offset, property_id, value)
    }

    pub fn delete(&mut self, table: &Arc<Table>, offset: Offset) -> StorageResult<()> {
        self.local_table_mut(table).delete(offset)
    }

    #[inline]
    pub fn local_table(&self, table_id: TableId) -> Option<&LocalTable> {
        self.tables.get(&table_id)
    }

    pub fn table_ids(&self) -> Vec<TableId> {
        self.tables.keys().copied().collect()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.tables.is_empty()
    }

    /// Writes every pending change into the tables' shadow layers and logs it.
    pub fn prepare_commit(&self, wal: &Wal) -> StorageResult<()> {
        for local_table in self.tables.values() {
            local_table.prepare_commit(wal)?;
        }
        Ok(())
    }

    /// Drops every pending change.
    pub fn prepare_rollback(&mut self) {
        self.tables.clear();
    }
}
