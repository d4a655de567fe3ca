use miette::Diagnostic;
use tessera_catalog::CatalogError;
use tessera_storage::StorageError;
use tessera_transaction::TimestampError;
use thiserror::Error;

#[derive(Debug, Error, Diagnostic)]
pub enum Error {
    #[error("catalog error: {0}")]
    Catalog(#[from] CatalogError),

    #[error("storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("timestamp error: {0}")]
    Timestamp(#[from] TimestampError),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("cannot start a new write transaction while another one is active")]
    TooManyActiveWriteTransactions,

    #[error("a transaction is already in progress")]
    TransactionInProgress,

    #[error("invalid transaction state: {0}")]
    InvalidTransactionState(String),

    #[error("timed out waiting for active transactions to leave before checkpointing")]
    #[diagnostic(help("the transaction is durable; the checkpoint runs with a later commit"))]
    CheckpointTimeout,

    #[error("invalid statement: {0}")]
    InvalidStatement(String),
}

impl Error {
    /// Whether the error is a write-write conflict on a catalog entry.
    pub fn is_write_write_conflict(&self) -> bool {
        matches!(self, Error::Catalog(CatalogError::WriteWriteConflict(_)))
    }
}

pub type Result<T> = std::result::Result<T, Error>;
