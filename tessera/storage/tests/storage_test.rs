mod common;

use common::*;
use serial_test::serial;
use tessera_catalog::wal::CatalogWal;
use tessera_catalog::{Catalog, FileVersionType};
use tessera_common::frame::read_frame_file;
use tessera_common::value::ScalarValue;
use tessera_storage::column::CompressionMetadata;
use tessera_storage::wal::{ReplayMode, Wal, WalRecord, WalReplayer};
use tessera_storage::StorageManager;
use tessera_transaction::{DummyTransaction, Timestamp, TransactionType};

fn names(storage: &StorageManager, table_id: u64, txn_type: TransactionType) -> Vec<ScalarValue> {
    storage
        .get_table(table_id)
        .unwrap()
        .scan(txn_type, None, &[NAME])
        .unwrap()
        .into_iter()
        .map(|(_, mut values)| values.remove(0))
        .collect()
}

#[test]
#[serial]
fn test_committed_rows_reach_readers_at_checkpoint() {
    let db = TestDatabase::new();
    let table_id = db.create_person(1);
    let table = db.storage.get_table(table_id).unwrap();
    db.commit_rows(2, |local| {
        local.insert(&table, person(1, "Alice")).unwrap();
        local.insert(&table, person(2, "Bob")).unwrap();
    });

    assert!(names(&db.storage, table_id, TransactionType::ReadOnly).is_empty());
    assert_eq!(names(&db.storage, table_id, TransactionType::Write), vec![
        ScalarValue::from("Alice"),
        ScalarValue::from("Bob")
    ]);
    assert!(FileVersionType::WalVersion.path_in(db.path()).exists());

    let outcome = WalReplayer::new(&db.storage, Some(db.path()), ReplayMode::Checkpoint)
        .replay(db.wal.read_all().unwrap())
        .unwrap();
    assert_eq!(outcome.committed, 2);
    assert_eq!(outcome.discarded, 0);
    assert!(outcome.catalog_changed);
    assert!(FileVersionType::Original.path_in(db.path()).exists());
    assert!(!FileVersionType::WalVersion.path_in(db.path()).exists());

    assert_eq!(names(&db.storage, table_id, TransactionType::ReadOnly), vec![
        ScalarValue::from("Alice"),
        ScalarValue::from("Bob")
    ]);
    assert!(!table.has_shadow_writes());
}

#[test]
#[serial]
fn test_recovery_replay_is_idempotent() {
    let db = TestDatabase::new();
    let table_id = db.create_person(1);
    let table = db.storage.get_table(table_id).unwrap();
    db.commit_rows(2, |local| {
        local.insert(&table, person(1, "Alice")).unwrap();
    });
    db.commit_rows(3, |local| {
        local.update(&table, 0, NAME, "Alicia".into()).unwrap();
        local.insert(&table, person(2, "Bob")).unwrap();
        local.delete(&table, 1).unwrap();
    });
    let entries = db.wal.read_all().unwrap();

    let recovered = StorageManager::new(true);
    let replayer = WalReplayer::new(&recovered, Some(db.path()), ReplayMode::Recovery);
    replayer.replay(entries.clone()).unwrap();
    let first = names(&recovered, table_id, TransactionType::ReadOnly);
    let outcome = replayer.replay(entries).unwrap();
    assert_eq!(outcome.committed, 3);
    assert_eq!(names(&recovered, table_id, TransactionType::ReadOnly), first);
    assert_eq!(first, vec![ScalarValue::from("Alicia")]);

    let catalog = Catalog::load_from_file(db.path(), FileVersionType::Original).unwrap();
    assert_eq!(
        catalog
            .get_table_id(&DummyTransaction::read(), "person")
            .unwrap(),
        table_id
    );
}

#[test]
#[serial]
fn test_aborted_and_unfinished_groups_are_discarded() {
    let db = TestDatabase::new();
    let table_id = db.create_person(1);
    db.wal.log_copy_table(table_id).unwrap();
    db.wal
        .log_abort(Timestamp::with_ts(Timestamp::TXN_ID_START + 2))
        .unwrap();
    db.wal.log_copy_table(table_id).unwrap();

    let recovered = StorageManager::new(true);
    let outcome = WalReplayer::new(&recovered, None, ReplayMode::Recovery)
        .replay(db.wal.read_all().unwrap())
        .unwrap();
    assert_eq!(outcome.committed, 1);
    assert_eq!(outcome.discarded, 2);
    assert_eq!(recovered.table_ids(), vec![table_id]);
}

#[test]
#[serial]
fn test_updates_in_place_or_rewritten() {
    let db = TestDatabase::new();
    let table_id = db.create_person(1);
    let table = db.storage.get_table(table_id).unwrap();
    db.commit_rows(2, |local| {
        for id in [10, 13, 11] {
            local.insert(&table, person(id, "x")).unwrap();
        }
    });
    db.wal.clear().unwrap();

    db.commit_rows(3, |local| {
        local.update(&table, 1, ID, ScalarValue::from(12i64)).unwrap();
    });
    db.commit_rows(4, |local| {
        local.update(&table, 1, ID, ScalarValue::from(1000i64)).unwrap();
    });

    let metadata: Vec<CompressionMetadata> = db
        .wal
        .read_all()
        .unwrap()
        .into_iter()
        .filter_map(|entry| match entry.record {
            WalRecord::ChunkUpdate { chunk, .. } => Some(chunk.metadata().clone()),
            _ => None,
        })
        .collect();
    assert_eq!(metadata, vec![
        CompressionMetadata::IntegerBitpacking {
            min: 10,
            bit_width: 2
        },
        CompressionMetadata::IntegerBitpacking {
            min: 10,
            bit_width: 10
        },
    ]);
}

#[test]
#[serial]
fn test_rollback_keeps_earlier_committed_shadow_writes() {
    let db = TestDatabase::new();
    let table_id = db.create_person(1);
    let table = db.storage.get_table(table_id).unwrap();
    db.commit_rows(2, |local| {
        local.insert(&table, person(1, "Alice")).unwrap();
    });

    let mut local = tessera_storage::LocalStorage::new();
    local.insert(&table, person(2, "Bob")).unwrap();
    local.update(&table, 0, NAME, "Eve".into()).unwrap();
    local.prepare_commit(&db.wal).unwrap();
    db.storage.prepare_commit(&local, &db.wal).unwrap();
    db.storage.prepare_rollback();
    db.wal
        .log_abort(Timestamp::with_ts(Timestamp::TXN_ID_START + 3))
        .unwrap();

    assert_eq!(names(&db.storage, table_id, TransactionType::Write), vec![
        ScalarValue::from("Alice")
    ]);

    WalReplayer::new(&db.storage, Some(db.path()), ReplayMode::Checkpoint)
        .replay(db.wal.read_all().unwrap())
        .unwrap();
    assert_eq!(names(&db.storage, table_id, TransactionType::ReadOnly), vec![
        ScalarValue::from("Alice")
    ]);
}

#[test]
#[serial]
fn test_snapshot_after_checkpoint() {
    let db = TestDatabase::new();
    let table_id = db.create_person(1);
    let table = db.storage.get_table(table_id).unwrap();
    db.commit_rows(2, |local| {
        local.insert(&table, person(7, "Grace")).unwrap();
    });
    WalReplayer::new(&db.storage, Some(db.path()), ReplayMode::Checkpoint)
        .replay(db.wal.read_all().unwrap())
        .unwrap();
    db.storage.save_snapshot(db.path()).unwrap();
    db.wal.clear().unwrap();

    let loaded = StorageManager::load_snapshot(db.path(), true).unwrap();
    assert_eq!(
        loaded
            .get_table(table_id)
            .unwrap()
            .lookup(TransactionType::ReadOnly, None, 0, &[ID, NAME])
            .unwrap(),
        vec![ScalarValue::from(7i64), ScalarValue::from("Grace")]
    );
}

#[test]
#[serial]
fn test_replay_installs_only_committed_catalog_snapshots() {
    let dir = tempfile::tempdir().unwrap();
    let wal = Wal::open_in(dir.path()).unwrap();
    wal.log_catalog_record(b"committed").unwrap();
    wal.log_commit(Timestamp::with_ts(Timestamp::TXN_ID_START), Timestamp::with_ts(1))
        .unwrap();
    // The next writer overwrote the shared file and never logged its commit.
    wal.log_catalog_record(b"uncommitted").unwrap();
    std::fs::write(FileVersionType::WalVersion.path_in(dir.path()), b"uncommitted").unwrap();

    let storage = StorageManager::new(true);
    let outcome = WalReplayer::new(&storage, Some(dir.path()), ReplayMode::Recovery)
        .replay(wal.read_all().unwrap())
        .unwrap();
    assert_eq!(outcome.committed, 1);
    assert_eq!(outcome.discarded, 1);
    assert!(outcome.catalog_changed);
    assert_eq!(
        read_frame_file(&FileVersionType::Original.path_in(dir.path())).unwrap(),
        b"committed"
    );
    assert!(!FileVersionType::WalVersion.path_in(dir.path()).exists());
}
