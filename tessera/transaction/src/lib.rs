//! Transaction primitives shared by the catalog and the storage layer.
//!
//! The crate owns the timestamp domains, the [`Transaction`] view that every versioned
//! structure resolves against, and the generic [`VersionChain`] used for MVCC.

pub mod error;
pub mod timestamp;
pub mod transaction;
pub mod version;

pub use error::TimestampError;
pub use timestamp::{CommitTimestampGenerator, Timestamp, TransactionIdGenerator};
pub use transaction::{DummyTransaction, Transaction, TransactionAction, TransactionType};
pub use version::{Version, VersionChain};
