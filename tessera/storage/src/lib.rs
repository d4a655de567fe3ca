//! Table storage, per-transaction staging and the write-ahead log.

pub mod column;
pub mod error;
pub mod local_storage;
pub mod snapshot;
pub mod storage_manager;
pub mod table;
pub mod wal;

pub use error::{StorageError, StorageResult};
pub use local_storage::{LocalStorage, LocalTable};
pub use storage_manager::StorageManager;
pub use table::{Table, TableStatistics};
pub use wal::Wal;
