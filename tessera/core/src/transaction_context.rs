//! Per-session transaction state.
//!
//! A session is in AUTO mode unless it explicitly began a transaction. In AUTO mode every
//! statement runs in its own transaction; in MANUAL mode statements share the transaction
//! until the client commits or rolls back.

use std::sync::Arc;

use tessera_transaction::{Transaction as _, TransactionType};
use tracing::warn;

use crate::error::{Error, Result};
use crate::transaction::Transaction;
use crate::transaction_manager::TransactionManager;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransactionMode {
    Auto,
    Manual,
}

pub struct TransactionContext {
    manager: Arc<TransactionManager>,
    active: Option<Arc<Transaction>>,
    mode: TransactionMode,
}

impl TransactionContext {
    pub fn new(manager: Arc<TransactionManager>) -> Self {
        Self {
            manager,
            active: None,
            mode: TransactionMode::Auto,
        }
    }

    #[inline]
    pub fn mode(&self) -> TransactionMode {
        self.mode
    }

    #[inline]
    pub fn has_active_transaction(&self) -> bool {
        self.active.is_some()
    }

    #[inline]
    pub fn is_auto_transaction(&self) -> bool {
        self.mode == TransactionMode::Auto
    }

    #[inline]
    pub fn active_transaction(&self) -> Option<&Arc<Transaction>> {
        self.active.as_ref()
    }

    /// Begins a manual transaction.
    pub fn begin_transaction(&mut self, txn_type: TransactionType) -> Result<()> {
        self.begin(txn_type, TransactionMode::Manual)
    }

    /// Begins the transaction of a single statement.
    pub fn begin_auto_transaction(&mut self, read_only: bool) -> Result<()> {
        let txn_type = if read_only {
            TransactionType::ReadOnly
        } else {
            TransactionType::Write
        };
        self.begin(txn_type, TransactionMode::Auto)
    }

    fn begin(&mut self, txn_type: TransactionType, mode: TransactionMode) -> Result<()> {
        if self.active.is_some() {
            return Err(Error::TransactionInProgress);
        }
        self.active = Some(self.manager.begin_transaction(txn_type)?);
        self.mode = mode;
        Ok(())
    }

    /// Checks that a statement may run inside the active manual transaction.
    ///
    /// Statements requiring an auto transaction (schema changes, macros and bulk copies)
    /// are rejected, as are writes inside a read-only transaction.
    pub fn validate_manual_transaction(
        &self,
        read_only_statement: bool,
        requires_auto_transaction: bool,
    ) -> Result<()> {
        let Some(txn) = &self.active else {
            return Ok(());
        };
        if self.is_auto_transaction() {
            return Ok(());
        }
        if requires_auto_transaction {
            return Err(Error::InvalidTransactionState(
                "this statement must run in an auto transaction; commit or roll back the \
                 manual transaction first"
                    .into(),
            ));
        }
        if txn.is_read_only() && !read_only_statement {
            return Err(Error::InvalidTransactionState(
                "cannot write inside a read-only transaction".into(),
            ));
        }
        Ok(())
    }

    pub fn commit(&mut self) -> Result<()> {
        let auto_checkpoint = self.manager.config().auto_checkpoint;
        self.finish(true, auto_checkpoint)
    }

    pub fn commit_skip_checkpointing(&mut self) -> Result<()> {
        self.finish(true, false)
    }

    pub fn rollback(&mut self) -> Result<()> {
        let auto_checkpoint = self.manager.config().auto_checkpoint;
        self.finish(false, auto_checkpoint)
    }

    pub fn rollback_skip_checkpointing(&mut self) -> Result<()> {
        self.finish(false, false)
    }

    /// Ends the active transaction, if any. The context leaves it behind even if finishing
    /// fails: a failed commit has already been rolled back by the manager.
    fn finish(&mut self, commit: bool, auto_checkpoint: bool) -> Result<()> {
        let Some(txn) = self.active.take() else {
            return Ok(());
        };
        self.mode = TransactionMode::Auto;
        if commit {
            self.manager.commit_transaction(&txn, auto_checkpoint)
        } else {
            self.manager.rollback_transaction(&txn, auto_checkpoint)
        }
    }
}

impl Drop for TransactionContext {
    fn drop(&mut self) {
        if let Err(e) = self.rollback_skip_checkpointing() {
            warn!(error = %e, "failed to roll back the transaction of a closed session");
        }
    }
}
