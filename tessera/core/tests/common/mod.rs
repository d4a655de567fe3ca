#![allow(dead_code)]

use tempfile::TempDir;
use tessera::statement::Row;
use tessera::{Database, DatabaseConfig, Session, Statement};
use tessera_catalog::bound::BoundCreateTableInfo;
use tessera_catalog::property::PropertyDefinition;
use tessera_common::logical_type::LogicalType;
use tessera_common::value::ScalarValue;

pub struct TestDatabase {
    pub dir: TempDir,
    pub db: Database,
}

impl TestDatabase {
    pub fn new(config: DatabaseConfig) -> Self {
        let dir = tempfile::tempdir().unwrap();
        let db = Database::open(dir.path(), &config).unwrap();
        Self { dir, db }
    }

    /// Closes the database and opens it again from its directory.
    pub fn reopen(self, config: DatabaseConfig) -> Self {
        let Self { dir, db } = self;
        drop(db);
        let db = Database::open(dir.path(), &config).unwrap();
        Self { dir, db }
    }
}

pub fn config_with_timeout(checkpoint_wait_timeout_us: u64) -> DatabaseConfig {
    DatabaseConfig {
        checkpoint_wait_timeout_us,
        read_txn_poll_interval_us: 200,
        ..Default::default()
    }
}

pub fn person_info(name: &str) -> BoundCreateTableInfo {
    BoundCreateTableInfo::node_table(
        name,
        vec![
            PropertyDefinition::new("id", LogicalType::Int64),
            PropertyDefinition::new("name", LogicalType::String),
        ],
        "id",
    )
}

pub fn person(id: i64, name: &str) -> Row {
    Row::from([
        ("id".to_owned(), ScalarValue::from(id)),
        ("name".to_owned(), ScalarValue::from(name)),
    ])
}

pub fn insert_person(session: &mut Session, id: i64, name: &str) {
    session
        .execute(Statement::Insert {
            table: "person".into(),
            row: person(id, name),
        })
        .unwrap();
}

pub fn person_names(session: &mut Session) -> Vec<String> {
    session
        .execute(Statement::Scan {
            table: "person".into(),
            properties: vec!["name".into()],
        })
        .unwrap()
        .into_iter()
        .map(|row| row[0].to_string())
        .collect()
}

pub fn table_names(session: &mut Session) -> Vec<String> {
    session
        .execute(Statement::ShowTables)
        .unwrap()
        .into_iter()
        .map(|row| row[1].to_string())
        .collect()
}
