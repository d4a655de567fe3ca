use tessera_catalog::CatalogError;
use tessera_common::error::{FrameError, ValueError};
use tessera_common::types::{Offset, PropertyId, TableId};
use thiserror::Error;

pub type StorageResult<T> = Result<T, StorageError>;

#[derive(Error, Debug)]
pub enum StorageError {
    #[error("WAL error: {0}")]
    Wal(#[from] WalError),
    #[error("Checkpoint error: {0}")]
    Checkpoint(#[from] CheckpointError),
    #[error("Catalog error: {0}")]
    Catalog(#[from] CatalogError),
    #[error("Value error: {0}")]
    Value(#[from] ValueError),
    #[error("Table {0} does not exist in storage")]
    TableNotFound(TableId),
    #[error("Column for property {property_id} does not exist in table {table_id}")]
    ColumnNotFound {
        table_id: TableId,
        property_id: PropertyId,
    },
    #[error("Row {offset} does not exist in table {table_id}")]
    RowNotFound { table_id: TableId, offset: Offset },
}

#[derive(Error, Debug)]
pub enum WalError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Checksum mismatch")]
    ChecksumMismatch,
    #[error("Serialization failed: {0}")]
    SerializationFailed(String),
    #[error("Deserialization failed: {0}")]
    DeserializationFailed(String),
}

impl From<FrameError> for WalError {
    fn from(e: FrameError) -> Self {
        match e {
            FrameError::Io(e) => WalError::Io(e),
            FrameError::ChecksumMismatch => WalError::ChecksumMismatch,
            FrameError::Truncated => {
                WalError::DeserializationFailed("truncated WAL record".to_string())
            }
        }
    }
}

#[derive(Error, Debug)]
pub enum CheckpointError {
    #[error("Snapshot frame error: {0}")]
    Frame(#[from] FrameError),
    #[error("Serialization failed: {0}")]
    SerializationFailed(String),
    #[error("Deserialization failed: {0}")]
    DeserializationFailed(String),
}
