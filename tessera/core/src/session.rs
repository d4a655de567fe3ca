use std::collections::BTreeMap;
use std::sync::Arc;

use tessera_catalog::{CatalogEntry, CatalogError};
use tessera_common::types::PropertyId;
use tessera_common::value::ScalarValue;
use tessera_storage::Table;
use tessera_transaction::{Transaction as _, TransactionAction, TransactionType};
use tracing::{debug, warn};

use crate::database::DatabaseContext;
use crate::error::{Error, Result};
use crate::result::QueryResult;
use crate::statement::{Row, Statement};
use crate::transaction::Transaction;
use crate::transaction_context::TransactionContext;

/// A client connection executing statements under its own transaction context.
pub struct Session {
    context: Arc<DatabaseContext>,
    txn_context: TransactionContext,
}

impl Session {
    pub(crate) fn new(context: Arc<DatabaseContext>) -> Self {
        let txn_context = TransactionContext::new(context.transaction_manager().clone());
        Self {
            context,
            txn_context,
        }
    }

    #[inline]
    pub fn transaction_context(&self) -> &TransactionContext {
        &self.txn_context
    }

    /// Executes `statement`.
    ///
    /// Outside a manual transaction the statement runs in its own auto transaction, which is
    /// committed on success and rolled back on failure. A checkpoint timeout after an auto
    /// commit is not an error: the data is durable and the next commit checkpoints it.
    pub fn execute(&mut self, statement: Statement) -> Result<QueryResult> {
        if let Some(action) = statement.transaction_action() {
            return self.execute_transaction_action(action);
        }
        if let Some(txn) = self.txn_context.active_transaction().cloned() {
            self.txn_context.validate_manual_transaction(
                statement.is_read_only(),
                statement.requires_auto_transaction(),
            )?;
            return self.execute_in(&txn, statement);
        }

        self.txn_context
            .begin_auto_transaction(statement.is_read_only())?;
        let Some(txn) = self.txn_context.active_transaction().cloned() else {
            panic!("auto transaction was not registered");
        };
        match self.execute_in(&txn, statement) {
            Ok(result) => {
                match self.txn_context.commit() {
                    Ok(()) => {}
                    Err(Error::CheckpointTimeout) => {
                        warn!("checkpoint after auto commit timed out, it is deferred");
                    }
                    Err(e) => return Err(e),
                }
                Ok(result)
            }
            Err(e) => {
                if let Err(rollback) = self.txn_context.rollback() {
                    if !matches!(rollback, Error::CheckpointTimeout) {
                        warn!(error = %rollback, "failed to roll back auto transaction");
                    }
                }
                Err(e)
            }
        }
    }

    fn execute_transaction_action(&mut self, action: TransactionAction) -> Result<QueryResult> {
        match action {
            TransactionAction::BeginRead => {
                self.txn_context.begin_transaction(TransactionType::ReadOnly)?
            }
            TransactionAction::BeginWrite => {
                self.txn_context.begin_transaction(TransactionType::Write)?
            }
            TransactionAction::Commit => self.txn_context.commit()?,
            TransactionAction::CommitSkipCheckpointing => {
                self.txn_context.commit_skip_checkpointing()?
            }
            TransactionAction::Rollback => self.txn_context.rollback()?,
            TransactionAction::RollbackSkipCheckpointing => {
                self.txn_context.rollback_skip_checkpointing()?
            }
        }
        Ok(QueryResult::message(action.to_string()))
    }

    fn execute_in(&self, txn: &Transaction, statement: Statement) -> Result<QueryResult> {
        let catalog = self.context.catalog();
        debug!(txn_id = %txn.txn_id(), ?statement, "executing statement");
        match statement {
            Statement::CreateTable(info) => {
                let table_id = catalog.create_table_schema(txn, &info)?;
                Ok(QueryResult::message(format!(
                    "table {} created with id {table_id}",
                    info.name
                )))
            }
            Statement::DropTable { name } => {
                let table_id = catalog.get_table_id(txn, &name)?;
                catalog.drop_table_schema(txn, table_id)?;
                Ok(QueryResult::message(format!("table {name} dropped")))
            }
            Statement::Alter(info) => {
                catalog.alter_table_schema(txn, &info)?;
                Ok(QueryResult::message(format!(
                    "table {} altered",
                    info.table_name
                )))
            }
            Statement::CreateMacro { name, definition } => {
                catalog.add_scalar_macro_function(&name, definition)?;
                Ok(QueryResult::message(format!("macro {name} created")))
            }
            Statement::Copy { table, rows } => {
                let (entry, storage) = self.table_storage(txn, &table)?;
                let rows = rows
                    .into_iter()
                    .map(|row| resolve_row(&entry, row))
                    .collect::<Result<Vec<_>>>()?;
                let copied = self.context.storage().copy_table(
                    storage.table_id(),
                    rows,
                    self.context.wal(),
                )?;
                Ok(QueryResult::message(format!("{copied} rows copied")))
            }
            Statement::Insert { table, row } => {
                let (entry, storage) = self.table_storage(txn, &table)?;
                let values = resolve_row(&entry, row)?;
                let offset = txn.local_storage().insert(&storage, values)?;
                Ok(QueryResult::new(vec!["offset".into()], vec![vec![
                    ScalarValue::from(offset as i64),
                ]]))
            }
            Statement::Update {
                table,
                offset,
                property,
                value,
            } => {
                let (entry, storage) = self.table_storage(txn, &table)?;
                let property_id = resolve_property(&entry, &property)?;
                txn.local_storage()
                    .update(&storage, offset, property_id, value)?;
                Ok(QueryResult::message("1 row updated"))
            }
            Statement::Delete { table, offset } => {
                let (_, storage) = self.table_storage(txn, &table)?;
                txn.local_storage().delete(&storage, offset)?;
                Ok(QueryResult::message("1 row deleted"))
            }
            Statement::Scan { table, properties } => {
                let (entry, storage) = self.table_storage(txn, &table)?;
                let (names, property_ids) = resolve_projection(&entry, properties)?;
                let local = txn.local_storage();
                let rows = storage
                    .scan(
                        txn.txn_type(),
                        local.local_table(storage.table_id()),
                        &property_ids,
                    )?
                    .into_iter()
                    .map(|(_, values)| values)
                    .collect();
                Ok(QueryResult::new(names, rows))
            }
            Statement::ShowTables => {
                let rows = catalog
                    .table_entries(txn)
                    .iter()
                    .map(|entry| {
                        vec![
                            ScalarValue::from(entry.table_id().unwrap_or_default() as i64),
                            ScalarValue::from(entry.name()),
                            ScalarValue::from(entry.kind().to_string()),
                            ScalarValue::from(entry.comment().unwrap_or_default()),
                        ]
                    })
                    .collect();
                Ok(QueryResult::new(
                    vec!["id".into(), "name".into(), "type".into(), "comment".into()],
                    rows,
                ))
            }
            Statement::TableInfo { table } => {
                let entry = catalog.get_table_entry_by_name(txn, &table)?;
                let primary_key = entry.as_node_table().map(|e| e.primary_key());
                let rows = entry
                    .schema()
                    .map(|s| s.properties())
                    .unwrap_or_default()
                    .iter()
                    .map(|p| {
                        vec![
                            ScalarValue::from(p.id() as i64),
                            ScalarValue::from(p.name()),
                            ScalarValue::from(p.logical_type().to_string()),
                            ScalarValue::from(primary_key == Some(p.id())),
                        ]
                    })
                    .collect();
                Ok(QueryResult::new(
                    vec![
                        "property id".into(),
                        "name".into(),
                        "type".into(),
                        "primary key".into(),
                    ],
                    rows,
                ))
            }
            Statement::Begin { .. }
            | Statement::Commit
            | Statement::CommitSkipCheckpoint
            | Statement::Rollback
            | Statement::RollbackSkipCheckpoint => {
                panic!("transaction control statements are handled before execution")
            }
        }
    }

    /// Resolves `name` to a table with storage, creating the storage if the table was
    /// committed but not checkpointed yet.
    fn table_storage(
        &self,
        txn: &Transaction,
        name: &str,
    ) -> Result<(Arc<CatalogEntry>, Arc<Table>)> {
        let entry = self.context.catalog().get_table_entry_by_name(txn, name)?;
        let table = self
            .context
            .storage()
            .ensure_table(&entry)
            .ok_or_else(|| {
                Error::InvalidStatement(format!("{} {name} has no rows", entry.kind()))
            })?;
        Ok((entry, table))
    }
}

fn resolve_property(entry: &CatalogEntry, name: &str) -> Result<PropertyId> {
    entry
        .schema()
        .and_then(|s| s.property(name))
        .map(|p| p.id())
        .ok_or_else(|| {
            Error::Catalog(CatalogError::PropertyNotFound {
                table: entry.name().to_owned(),
                property: name.to_owned(),
            })
        })
}

fn resolve_row(entry: &CatalogEntry, row: Row) -> Result<BTreeMap<PropertyId, ScalarValue>> {
    row.into_iter()
        .map(|(name, value)| Ok((resolve_property(entry, &name)?, value)))
        .collect()
}

/// Resolves the properties a scan reads. An empty list reads every property.
fn resolve_projection(
    entry: &CatalogEntry,
    properties: Vec<String>,
) -> Result<(Vec<String>, Vec<PropertyId>)> {
    if properties.is_empty() {
        return Ok(entry
            .schema()
            .map(|s| {
                s.properties()
                    .iter()
                    .map(|p| (p.name().to_owned(), p.id()))
                    .unzip()
            })
            .unwrap_or_default());
    }
    let property_ids = properties
        .iter()
        .map(|name| resolve_property(entry, name))
        .collect::<Result<Vec<_>>>()?;
    Ok((properties, property_ids))
}
