mod common;

use common::*;
use tessera::{DatabaseConfig, Error, Statement};
use tessera_catalog::CatalogError;
use tessera_catalog::bound::{AlterKind, BoundAlterInfo};
use tessera_catalog::property::PropertyDefinition;
use tessera_common::logical_type::LogicalType;
use tessera_common::value::ScalarValue;
use tessera_transaction::{DummyTransaction, TransactionAction, TransactionType};

#[test]
fn test_auto_statements_are_committed() {
    let test = TestDatabase::new(DatabaseConfig::default());
    let mut session = test.db.session();
    session
        .execute(Statement::CreateTable(person_info("person")))
        .unwrap();
    insert_person(&mut session, 1, "Alice");
    insert_person(&mut session, 2, "Bob");

    assert_eq!(person_names(&mut session), ["Alice", "Bob"]);
    assert_eq!(table_names(&mut session), ["person"]);
    assert!(!session.transaction_context().has_active_transaction());
}

#[test]
fn test_read_your_writes() {
    let test = TestDatabase::new(DatabaseConfig::default());
    let mut writer = test.db.session();
    let mut reader = test.db.session();
    writer
        .execute(Statement::CreateTable(person_info("person")))
        .unwrap();

    writer.execute(Statement::Begin { read_only: false }).unwrap();
    insert_person(&mut writer, 1, "Alice");
    assert_eq!(person_names(&mut writer), ["Alice"]);
    assert!(person_names(&mut reader).is_empty());

    writer.execute(Statement::Commit).unwrap();
    assert_eq!(person_names(&mut reader), ["Alice"]);
}

#[test]
fn test_rollback_discards_staged_changes() {
    let test = TestDatabase::new(DatabaseConfig::default());
    let mut session = test.db.session();
    session
        .execute(Statement::CreateTable(person_info("person")))
        .unwrap();
    insert_person(&mut session, 1, "Alice");

    session.execute(Statement::Begin { read_only: false }).unwrap();
    insert_person(&mut session, 2, "Bob");
    session
        .execute(Statement::Update {
            table: "person".into(),
            offset: 0,
            property: "name".into(),
            value: "Eve".into(),
        })
        .unwrap();
    assert_eq!(person_names(&mut session), ["Eve", "Bob"]);
    session.execute(Statement::Rollback).unwrap();

    assert_eq!(person_names(&mut session), ["Alice"]);
}

#[test]
fn test_update_and_delete() {
    let test = TestDatabase::new(DatabaseConfig::default());
    let mut session = test.db.session();
    session
        .execute(Statement::CreateTable(person_info("person")))
        .unwrap();
    insert_person(&mut session, 1, "Alice");
    insert_person(&mut session, 2, "Bob");

    session
        .execute(Statement::Update {
            table: "person".into(),
            offset: 1,
            property: "name".into(),
            value: "Robert".into(),
        })
        .unwrap();
    session
        .execute(Statement::Delete {
            table: "person".into(),
            offset: 0,
        })
        .unwrap();
    assert_eq!(person_names(&mut session), ["Robert"]);

    let err = session
        .execute(Statement::Delete {
            table: "person".into(),
            offset: 0,
        })
        .unwrap_err();
    assert!(matches!(err, Error::Storage(_)));
}

#[test]
fn test_committed_rows_wait_for_checkpoint() {
    let config = DatabaseConfig {
        auto_checkpoint: false,
        ..Default::default()
    };
    let test = TestDatabase::new(config);
    let mut writer = test.db.session();
    let mut reader = test.db.session();
    writer
        .execute(Statement::CreateTable(person_info("person")))
        .unwrap();
    insert_person(&mut writer, 1, "Alice");

    // The schema change is visible right after commit, the rows only after the checkpoint.
    assert_eq!(table_names(&mut reader), ["person"]);
    assert!(person_names(&mut reader).is_empty());
    writer.execute(Statement::Begin { read_only: false }).unwrap();
    assert_eq!(person_names(&mut writer), ["Alice"]);
    writer.execute(Statement::Commit).unwrap();

    test.db.checkpoint().unwrap();
    assert_eq!(person_names(&mut reader), ["Alice"]);
    assert!(test.db.context().wal().is_empty().unwrap());
}

#[test]
fn test_manual_transaction_rules() {
    let test = TestDatabase::new(DatabaseConfig::default());
    let mut session = test.db.session();
    session
        .execute(Statement::CreateTable(person_info("person")))
        .unwrap();

    session.execute(Statement::Begin { read_only: false }).unwrap();
    let err = session
        .execute(Statement::CreateTable(person_info("city")))
        .unwrap_err();
    assert!(matches!(err, Error::InvalidTransactionState(_)));
    assert!(session.transaction_context().has_active_transaction());
    assert!(matches!(
        session.execute(Statement::Begin { read_only: true }),
        Err(Error::TransactionInProgress)
    ));
    session.execute(Statement::Rollback).unwrap();

    session.execute(Statement::Begin { read_only: true }).unwrap();
    let err = session
        .execute(Statement::Insert {
            table: "person".into(),
            row: person(1, "Alice"),
        })
        .unwrap_err();
    assert!(matches!(err, Error::InvalidTransactionState(_)));
    assert!(person_names(&mut session).is_empty());
    session.execute(Statement::Commit).unwrap();

    assert_eq!(table_names(&mut session), ["person"]);
}

#[test]
fn test_single_writer_across_sessions() {
    let test = TestDatabase::new(DatabaseConfig::default());
    let mut first = test.db.session();
    let mut second = test.db.session();
    let mut third = test.db.session();

    first.execute(Statement::Begin { read_only: false }).unwrap();
    third.execute(Statement::Begin { read_only: true }).unwrap();
    assert!(matches!(
        second.execute(Statement::Begin { read_only: false }),
        Err(Error::TooManyActiveWriteTransactions)
    ));
    assert!(!second.transaction_context().has_active_transaction());
    // Auto write statements need the writer slot too.
    assert!(matches!(
        second.execute(Statement::CreateTable(person_info("person"))),
        Err(Error::TooManyActiveWriteTransactions)
    ));

    third.execute(Statement::Commit).unwrap();
    first.execute(Statement::Rollback).unwrap();
    second.execute(Statement::Begin { read_only: false }).unwrap();
    second.execute(Statement::Commit).unwrap();
}

#[test]
fn test_failed_auto_statement_rolls_back() {
    let test = TestDatabase::new(DatabaseConfig::default());
    let mut session = test.db.session();
    let err = session
        .execute(Statement::Insert {
            table: "person".into(),
            row: person(1, "Alice"),
        })
        .unwrap_err();
    assert!(matches!(err, Error::Catalog(CatalogError::NotFound(_))));
    assert!(!session.transaction_context().has_active_transaction());

    session
        .execute(Statement::CreateTable(person_info("person")))
        .unwrap();
    let err = session
        .execute(Statement::CreateTable(person_info("PERSON")))
        .unwrap_err();
    assert!(matches!(err, Error::Catalog(CatalogError::DuplicateName(_))));
    insert_person(&mut session, 1, "Alice");
    assert_eq!(person_names(&mut session), ["Alice"]);
}

#[test]
fn test_new_table_invisible_to_older_reader() {
    let test = TestDatabase::new(config_with_timeout(20_000));
    let mut old_reader = test.db.session();
    let mut writer = test.db.session();

    old_reader
        .execute(Statement::Begin { read_only: true })
        .unwrap();
    assert!(table_names(&mut old_reader).is_empty());

    // The checkpoint after this commit times out on the old reader; the commit stands.
    writer
        .execute(Statement::CreateTable(person_info("User")))
        .unwrap();
    assert!(table_names(&mut old_reader).is_empty());

    let mut new_reader = test.db.session();
    assert_eq!(table_names(&mut new_reader), ["User"]);

    old_reader.execute(Statement::Commit).unwrap();
    test.db.checkpoint().unwrap();
    assert_eq!(table_names(&mut old_reader), ["User"]);
}

#[test]
fn test_copy_and_macro() {
    let test = TestDatabase::new(DatabaseConfig::default());
    let mut session = test.db.session();
    session
        .execute(Statement::CreateTable(person_info("person")))
        .unwrap();
    let result = session
        .execute(Statement::Copy {
            table: "person".into(),
            rows: (0..5).map(|i| person(i, &format!("p{i}"))).collect(),
        })
        .unwrap();
    assert_eq!(result.rows()[0][0], ScalarValue::from("5 rows copied"));
    insert_person(&mut session, 5, "p5");
    assert_eq!(person_names(&mut session), [
        "p0", "p1", "p2", "p3", "p4", "p5"
    ]);

    session
        .execute(Statement::CreateMacro {
            name: "add_one".into(),
            definition: tessera_catalog::entry::MacroDefinition::new(vec!["x".into()], "x + 1"),
        })
        .unwrap();
    assert!(test.db.context().catalog().contains_macro("add_one"));

    session.execute(Statement::Begin { read_only: false }).unwrap();
    let err = session
        .execute(Statement::Copy {
            table: "person".into(),
            rows: vec![],
        })
        .unwrap_err();
    assert!(matches!(err, Error::InvalidTransactionState(_)));
}

#[test]
fn test_reopen_replays_committed_transactions() {
    let config = DatabaseConfig {
        auto_checkpoint: false,
        ..Default::default()
    };
    let test = TestDatabase::new(config.clone());
    {
        let mut session = test.db.session();
        session
            .execute(Statement::CreateTable(person_info("person")))
            .unwrap();
        insert_person(&mut session, 1, "Alice");
        insert_person(&mut session, 2, "Bob");

        // Closing the session rolls back its open transaction.
        let mut open = test.db.session();
        open.execute(Statement::Begin { read_only: false }).unwrap();
        insert_person(&mut open, 3, "Carol");
    }
    assert!(!test.db.context().wal().is_empty().unwrap());

    let test = test.reopen(config);
    assert!(test.db.context().wal().is_empty().unwrap());
    let mut session = test.db.session();
    assert_eq!(table_names(&mut session), ["person"]);
    assert_eq!(person_names(&mut session), ["Alice", "Bob"]);
}

#[test]
fn test_reopen_after_checkpoint() {
    let test = TestDatabase::new(DatabaseConfig::default());
    {
        let mut session = test.db.session();
        session
            .execute(Statement::CreateTable(person_info("person")))
            .unwrap();
        insert_person(&mut session, 1, "Alice");
        session
            .execute(Statement::Alter(BoundAlterInfo::new("person", AlterKind::AddProperty {
                definition: PropertyDefinition::new("age", LogicalType::Int64),
                default: ScalarValue::from(30i64),
            })))
            .unwrap();
    }

    let test = test.reopen(DatabaseConfig::default());
    let mut session = test.db.session();
    let info = session
        .execute(Statement::TableInfo {
            table: "person".into(),
        })
        .unwrap();
    assert_eq!(info.num_rows(), 3);
    let rows = session
        .execute(Statement::Scan {
            table: "person".into(),
            properties: vec![],
        })
        .unwrap();
    assert_eq!(rows.columns(), ["id", "name", "age"]);
    assert_eq!(rows.rows(), [vec![
        ScalarValue::from(1i64),
        ScalarValue::from("Alice"),
        ScalarValue::from(30i64),
    ]]);
}

#[test]
fn test_recovery_ignores_snapshot_of_uncommitted_writer() {
    let config = DatabaseConfig {
        auto_checkpoint: false,
        ..Default::default()
    };
    let test = TestDatabase::new(config.clone());
    let mut session = test.db.session();
    session
        .execute(Statement::CreateTable(person_info("person")))
        .unwrap();

    // A second writer writes its catalog snapshot, then the process dies before its commit
    // record reaches the log.
    let context = test.db.context();
    let writer = context
        .transaction_manager()
        .begin_transaction(TransactionType::Write)
        .unwrap();
    context
        .catalog()
        .create_table_schema(&*writer, &person_info("ghost"))
        .unwrap();
    context
        .catalog()
        .prepare_commit_or_rollback(&*writer, TransactionAction::Commit)
        .unwrap();
    context.wal().flush().unwrap();
    drop(session);

    let test = test.reopen(config);
    let catalog = test.db.context().catalog();
    assert!(catalog.contains_table(&DummyTransaction::read(), "person"));
    assert!(!catalog.contains_table(&DummyTransaction::read(), "ghost"));
    let mut session = test.db.session();
    assert_eq!(table_names(&mut session), ["person"]);
}
