use std::error::Error;

use tessera_common::error::FrameError;
use tessera_common::types::TableId;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum CatalogError {
    #[error("catalog entry {0} does not exist")]
    NotFound(String),

    #[error("catalog entry {0} already exists")]
    DuplicateName(String),

    #[error("write-write conflict on catalog entry {0}")]
    WriteWriteConflict(String),

    #[error("table with id {0} does not exist")]
    TableIdNotFound(TableId),

    #[error("property {property} does not exist in table {table}")]
    PropertyNotFound { table: String, property: String },

    #[error("property {property} already exists in table {table}")]
    DuplicateProperty { table: String, property: String },

    #[error("cannot drop primary key {property} of table {table}")]
    CannotDropPrimaryKey { table: String, property: String },

    #[error("table {table} is still referenced by {referenced_by}")]
    TableReferenced { table: String, referenced_by: String },

    #[error("invalid schema: {0}")]
    InvalidSchema(String),

    #[error("{kind} entry {name} cannot be altered this way")]
    UnsupportedAlter { kind: String, name: String },

    #[error("snapshot frame error: {0}")]
    Frame(#[from] FrameError),

    #[error("failed to serialize catalog: {0}")]
    Serialization(String),

    #[error("corrupted catalog snapshot: {0}")]
    Corrupted(String),

    #[error(transparent)]
    External(#[from] Box<dyn Error + Send + Sync + 'static>),
}

pub type CatalogResult<T> = Result<T, CatalogError>;
