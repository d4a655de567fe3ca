use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Arc;

use tessera_catalog::bound::BoundCreateTableInfo;
use tessera_catalog::property::PropertyDefinition;
use tessera_catalog::Catalog;
use tessera_common::logical_type::LogicalType;
use tessera_common::types::{PropertyId, TableId};
use tessera_common::value::ScalarValue;
use tessera_storage::{LocalStorage, StorageManager, Wal};
use tessera_transaction::{
    DummyTransaction, Timestamp, Transaction, TransactionAction, TransactionType,
};

pub const ID: PropertyId = 0;
pub const NAME: PropertyId = 1;

pub struct TestTxn {
    pub id: Timestamp,
    pub start_ts: Timestamp,
}

impl TestTxn {
    pub fn new(id: u64, start_ts: u64) -> Self {
        Self {
            id: Timestamp::with_ts(Timestamp::TXN_ID_START + id),
            start_ts: Timestamp::with_ts(start_ts),
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
        None
    }

    fn txn_type(&self) -> TransactionType {
        TransactionType::Write
    }
}

/// A catalog, storage and WAL sharing one database directory.
pub struct TestDatabase {
    pub dir: tempfile::TempDir,
    pub wal: Arc<Wal>,
    pub catalog: Catalog,
    pub storage: StorageManager,
}

impl TestDatabase {
    pub fn new() -> Self {
        let dir = tempfile::tempdir().unwrap();
        let wal = Arc::new(Wal::open_in(dir.path()).unwrap());
        let catalog = Catalog::new()
            .with_wal(wal.clone())
            .with_directory(dir.path());
        Self {
            dir,
            wal,
            catalog,
            storage: StorageManager::new(true),
        }
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    /// Creates `Person(id INT64, name STRING)` in a committed transaction.
    pub fn create_person(&self, txn_no: u64) -> TableId {
        let txn = TestTxn::new(txn_no, txn_no - 1);
        let info = BoundCreateTableInfo::node_table(
            "Person",
            vec![
                PropertyDefinition::new("id", LogicalType::Int64),
                PropertyDefinition::new("name", LogicalType::String),
            ],
            "id",
        );
        let table_id = self.catalog.create_table_schema(&txn, &info).unwrap();
        self.catalog
            .prepare_commit_or_rollback(&txn, TransactionAction::Commit)
            .unwrap();
        self.wal
            .log_commit(txn.id, Timestamp::with_ts(txn_no))
            .unwrap();
        self.catalog
            .commit_versions(&txn, Timestamp::with_ts(txn_no));
        let entry = self
            .catalog
            .get_table_entry(&DummyTransaction::read(), table_id)
            .unwrap();
        self.storage.ensure_table(&entry).unwrap();
        table_id
    }

    /// Runs `body` against a fresh local storage and commits it.
    pub fn commit_rows(&self, txn_no: u64, body: impl FnOnce(&mut LocalStorage)) {
        let mut local = LocalStorage::new();
        body(&mut local);
        local.prepare_commit(&self.wal).unwrap();
        self.storage.prepare_commit(&local, &self.wal).unwrap();
        self.wal
            .log_commit(
                Timestamp::with_ts(Timestamp::TXN_ID_START + txn_no),
                Timestamp::with_ts(txn_no),
            )
            .unwrap();
        self.wal.flush().unwrap();
        self.storage.commit_in_memory();
    }
}

pub fn person(id: i64, name: &str) -> BTreeMap<PropertyId, ScalarValue> {
    BTreeMap::from([(ID, ScalarValue::from(id)), (NAME, ScalarValue::from(name))])
}
