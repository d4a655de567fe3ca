use serde::{Deserialize, Serialize};
use tessera_catalog::CatalogEntry;
use tessera_catalog::property::Property;
use tessera_common::types::{NodeGroupIdx, PropertyId, TableId};
use tessera_transaction::Timestamp;

use crate::column::ColumnChunk;
use crate::error::{StorageResult, WalError};
use crate::table::TableStatistics;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RedoEntry {
    pub lsn: u64,
    pub record: WalRecord,
}

impl RedoEntry {
    pub fn to_bytes(&self) -> StorageResult<Vec<u8>> {
        Ok(postcard::to_allocvec(self)
            .map_err(|e| WalError::SerializationFailed(e.to_string()))?)
    }

    pub fn from_bytes(bytes: &[u8]) -> StorageResult<Self> {
        Ok(postcard::from_bytes(bytes)
            .map_err(|e| WalError::DeserializationFailed(e.to_string()))?)
    }
}

/// A redo record. Records of one transaction are followed by its `Commit` or `Abort`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum WalRecord {
    /// The catalog snapshot written by the committing writer, in the snapshot file format.
    Catalog {
        snapshot: Vec<u8>,
    },
    NewTable {
        entry: CatalogEntry,
    },
    DropTable {
        table_id: TableId,
    },
    AddProperty {
        table_id: TableId,
        property: Property,
    },
    DropProperty {
        table_id: TableId,
        property_id: PropertyId,
    },
    /// A bulk copy wrote the table's shadow layer directly.
    CopyTable {
        table_id: TableId,
    },
    ChunkUpdate {
        table_id: TableId,
        property_id: PropertyId,
        node_group_idx: NodeGroupIdx,
        chunk: ColumnChunk,
    },
    TableStatistics {
        table_id: TableId,
        statistics: TableStatistics,
    },
    Commit {
        txn_id: Timestamp,
        commit_ts: Timestamp,
    },
    Abort {
        txn_id: Timestamp,
    },
}

impl WalRecord {
    #[inline]
    pub fn is_transaction_end(&self) -> bool {
        matches!(self, WalRecord::Commit { .. } | WalRecord::Abort { .. })
    }
}
