use std::collections::BTreeMap;

use tessera_catalog::bound::{BoundAlterInfo, BoundCreateTableInfo};
use tessera_catalog::entry::MacroDefinition;
use tessera_common::types::Offset;
use tessera_common::value::ScalarValue;
use tessera_transaction::TransactionAction;

/// Values of one row keyed by property name.
pub type Row = BTreeMap<String, ScalarValue>;

/// A bound statement a [`Session`](crate::session::Session) executes.
#[derive(Debug, Clone, PartialEq)]
pub enum Statement {
    Begin {
        read_only: bool,
    },
    Commit,
    CommitSkipCheckpoint,
    Rollback,
    RollbackSkipCheckpoint,
    CreateTable(BoundCreateTableInfo),
    DropTable {
        name: String,
    },
    Alter(BoundAlterInfo),
    CreateMacro {
        name: String,
        definition: MacroDefinition,
    },
    /// Bulk-appends rows to a table.
    Copy {
        table: String,
        rows: Vec<Row>,
    },
    Insert {
        table: String,
        row: Row,
    },
    Update {
        table: String,
        offset: Offset,
        property: String,
        value: ScalarValue,
    },
    Delete {
        table: String,
        offset: Offset,
    },
    /// Reads `properties` of every live row, or every property if empty.
    Scan {
        table: String,
        properties: Vec<String>,
    },
    ShowTables,
    TableInfo {
        table: String,
    },
}

impl Statement {
    /// The transaction control action of the statement, if it is one.
    pub fn transaction_action(&self) -> Option<TransactionAction> {
        match self {
            Statement::Begin { read_only: true } => Some(TransactionAction::BeginRead),
            Statement::Begin { read_only: false } => Some(TransactionAction::BeginWrite),
            Statement::Commit => Some(TransactionAction::Commit),
            Statement::CommitSkipCheckpoint => Some(TransactionAction::CommitSkipCheckpointing),
            Statement::Rollback => Some(TransactionAction::Rollback),
            Statement::RollbackSkipCheckpoint => {
                Some(TransactionAction::RollbackSkipCheckpointing)
            }
            _ => None,
        }
    }

    pub fn is_read_only(&self) -> bool {
        matches!(
            self,
            Statement::Scan { .. } | Statement::ShowTables | Statement::TableInfo { .. }
        )
    }

    /// Whether the statement can only run in its own auto transaction.
    pub fn requires_auto_transaction(&self) -> bool {
        matches!(
            self,
            Statement::CreateTable(_)
                | Statement::DropTable { .. }
                | Statement::Alter(_)
                | Statement::CreateMacro { .. }
                | Statement::Copy { .. }
        )
    }
}
