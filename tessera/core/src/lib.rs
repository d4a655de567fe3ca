//! An embedded property-graph database core: a versioned catalog and table storage shared by
//! concurrent readers and a single writer.

pub mod config;
pub mod database;
pub mod error;
pub mod result;
pub mod session;
pub mod statement;
pub mod transaction;
pub mod transaction_context;
pub mod transaction_manager;

pub use config::DatabaseConfig;
pub use database::Database;
pub use error::{Error, Result};
pub use result::QueryResult;
pub use session::Session;
pub use statement::Statement;
pub use transaction_context::{TransactionContext, TransactionMode};
pub use transaction_manager::TransactionManager;
