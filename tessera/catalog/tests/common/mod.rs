use std::sync::Arc;

use parking_lot::Mutex;
use tessera_catalog::bound::BoundCreateTableInfo;
use tessera_catalog::entry::CatalogEntry;
use tessera_catalog::error::CatalogResult;
use tessera_catalog::property::{Property, PropertyDefinition};
use tessera_catalog::wal::CatalogWal;
use tessera_catalog::Catalog;
use tessera_common::logical_type::LogicalType;
use tessera_common::types::{PropertyId, TableId};
use tessera_transaction::{Timestamp, Transaction, TransactionType};

pub struct TestTxn {
    pub id: Timestamp,
    pub start_ts: Timestamp,
    pub commit_ts: Option<Timestamp>,
}

impl TestTxn {
    pub fn new(id: u64, start_ts: u64) -> Self {
        Self {
            id: Timestamp::with_ts(Timestamp::TXN_ID_START + id),
            start_ts: Timestamp::with_ts(start_ts),
            commit_ts: None,
        }
    }
}

impl Transaction for TestTxn {
    fn txn_id(&self) -> Timestamp {
        self.id
    }

    fn start_ts(&self) -> Timestamp {
        self.start_ts
    }

    fn commit_ts(&self) -> Option<Timestamp> {
        self.commit_ts
    }

    fn txn_type(&self) -> TransactionType {
        TransactionType::Write
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Logged {
    Catalog,
    NewTable(String),
    DropTable(TableId),
    AddProperty(TableId, String),
    DropProperty(TableId, PropertyId),
}

#[derive(Default)]
pub struct RecordingWal {
    pub records: Mutex<Vec<Logged>>,
}

impl RecordingWal {
    pub fn take(&self) -> Vec<Logged> {
        std::mem::take(&mut *self.records.lock())
    }
}

impl CatalogWal for RecordingWal {
    fn log_catalog_record(&self, _snapshot: &[u8]) -> CatalogResult<()> {
        self.records.lock().push(Logged::Catalog);
        Ok(())
    }

    fn log_create_table_record(&self, entry: &CatalogEntry) -> CatalogResult<()> {
        self.records
            .lock()
            .push(Logged::NewTable(entry.name().to_owned()));
        Ok(())
    }

    fn log_drop_table_record(&self, table_id: TableId) -> CatalogResult<()> {
        self.records.lock().push(Logged::DropTable(table_id));
        Ok(())
    }

    fn log_add_property_record(&self, table_id: TableId, property: &Property) -> CatalogResult<()> {
        self.records
            .lock()
            .push(Logged::AddProperty(table_id, property.name().to_owned()));
        Ok(())
    }

    fn log_drop_property_record(
        &self,
        table_id: TableId,
        property_id: PropertyId,
    ) -> CatalogResult<()> {
        self.records
            .lock()
            .push(Logged::DropProperty(table_id, property_id));
        Ok(())
    }
}

pub fn catalog_with_wal() -> (Catalog, Arc<RecordingWal>) {
    let wal = Arc::new(RecordingWal::default());
    (Catalog::new().with_wal(wal.clone()), wal)
}

pub fn person_info() -> BoundCreateTableInfo {
    BoundCreateTableInfo::node_table(
        "Person",
        vec![
            PropertyDefinition::new("id", LogicalType::Int64),
            PropertyDefinition::new("name", LogicalType::String),
        ],
        "id",
    )
}

pub fn city_info() -> BoundCreateTableInfo {
    BoundCreateTableInfo::node_table(
        "City",
        vec![PropertyDefinition::new("name", LogicalType::String)],
        "name",
    )
}
