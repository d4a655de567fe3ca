//! Transaction trait and related functionality

use serde::{Deserialize, Serialize};
use strum::Display;

use crate::timestamp::Timestamp;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display)]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum TransactionType {
    ReadOnly,
    Write,
}

/// Transaction control statements a client can issue.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum TransactionAction {
    BeginRead,
    BeginWrite,
    Commit,
    CommitSkipCheckpointing,
    Rollback,
    RollbackSkipCheckpointing,
}

/// The view of a transaction that versioned structures resolve against.
pub trait Transaction: Send + Sync {
    /// Get the transaction ID
    fn txn_id(&self) -> Timestamp;

    /// Get the start timestamp (the snapshot) of the transaction
    fn start_ts(&self) -> Timestamp;

    /// Get the commit timestamp of the transaction, once it has committed
    fn commit_ts(&self) -> Option<Timestamp>;

    fn txn_type(&self) -> TransactionType;

    /// Dummy transactions never record undo information.
    fn is_dummy(&self) -> bool {
        false
    }

    fn is_read_only(&self) -> bool {
        self.txn_type() == TransactionType::ReadOnly
    }

    fn is_write_transaction(&self) -> bool {
        self.txn_type() == TransactionType::Write
    }
}

/// Sentinel transaction used for bootstrap and for process-lifetime registrations such as
/// built-in functions and macros.
///
/// Its ID is [`Timestamp::INITIAL`], so everything it writes is immediately part of the
/// committed state, and its snapshot is the newest possible one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DummyTransaction {
    txn_type: TransactionType,
}

impl DummyTransaction {
    pub const fn read() -> Self {
        Self {
            txn_type: TransactionType::ReadOnly,
        }
    }

    pub const fn write() -> Self {
        Self {
            txn_type: TransactionType::Write,
        }
    }
}

impl Transaction for DummyTransaction {
    fn txn_id(&self) -> Timestamp {
        Timestamp::INITIAL
    }

    fn start_ts(&self) -> Timestamp {
        Timestamp::max_commit_ts()
    }

    fn commit_ts(&self) -> Option<Timestamp> {
        Some(Timestamp::INITIAL)
    }

    fn txn_type(&self) -> TransactionType {
        self.txn_type
    }

    fn is_dummy(&self) -> bool {
        true
    }
}
