//! Timestamp management for MVCC transactions
//!
//! Commit timestamps and transaction IDs share one `u64` space. The generators in this
//! module are plain values owned by the transaction manager, so several databases can
//! live in one process without sharing counters.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

use serde::{Deserialize, Serialize};

use crate::error::TimestampError;

/// Represents a timestamp used for multi-version concurrency control (MVCC).
///
/// It either holds a transaction ID, which starts from `1 << 63`, or a commit timestamp,
/// which starts from 0. A version stamped with a transaction ID is uncommitted and only
/// visible to that transaction; a version stamped with a commit timestamp is visible to
/// every transaction whose snapshot is at least as new.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
pub struct Timestamp(u64);

impl Timestamp {
    /// The start of the transaction ID range.
    pub const TXN_ID_START: u64 = 1 << 63;

    /// The timestamp of the initial committed state. Bootstrap entries, snapshot loads and
    /// dummy transactions use it.
    pub const INITIAL: Timestamp = Timestamp(0);

    /// Create timestamp by a given raw value.
    pub const fn with_ts(timestamp: u64) -> Self {
        Self(timestamp)
    }

    /// Returns the maximum possible commit timestamp.
    pub const fn max_commit_ts() -> Self {
        Self(u64::MAX & !Self::TXN_ID_START)
    }

    /// Returns true if the timestamp is a transaction ID.
    pub fn is_txn_id(&self) -> bool {
        self.raw() & Self::TXN_ID_START != 0
    }

    /// Returns true if the timestamp is a commit timestamp.
    pub fn is_commit_ts(&self) -> bool {
        self.raw() & Self::TXN_ID_START == 0
    }

    /// Returns the raw value of the timestamp.
    pub fn raw(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_txn_id() {
            write!(f, "txn#{}", self.0 & !Self::TXN_ID_START)
        } else {
            write!(f, "ts#{}", self.0)
        }
    }
}

/// Tracks the latest published commit timestamp.
///
/// New snapshots read [`CommitTimestampGenerator::latest`]; a committing writer asks for
/// [`CommitTimestampGenerator::next_candidate`] and makes it visible with
/// [`CommitTimestampGenerator::publish`] once every version it wrote carries it.
pub struct CommitTimestampGenerator {
    latest: AtomicU64,
}

impl CommitTimestampGenerator {
    pub fn new() -> Self {
        Self::with_start(Timestamp::INITIAL.raw())
    }

    /// Create a generator whose latest committed timestamp is `start`.
    pub fn with_start(start: u64) -> Self {
        Self {
            latest: AtomicU64::new(start),
        }
    }

    /// The newest commit timestamp that has been published.
    pub fn latest(&self) -> Timestamp {
        Timestamp::with_ts(self.latest.load(Ordering::SeqCst))
    }

    /// The timestamp the next commit will receive. Does not advance the generator.
    pub fn next_candidate(&self) -> Result<Timestamp, TimestampError> {
        let cur = self.latest.load(Ordering::SeqCst);
        if cur + 1 >= Timestamp::max_commit_ts().raw() {
            return Err(TimestampError::CommitTsOverflow(cur));
        }
        Ok(Timestamp::with_ts(cur + 1))
    }

    /// Publishes `ts` if it is newer than the latest commit timestamp.
    pub fn publish(&self, ts: Timestamp) -> Result<(), TimestampError> {
        if !ts.is_commit_ts() {
            return Err(TimestampError::WrongDomainCommit(ts.raw()));
        }
        if ts.raw() >= Timestamp::max_commit_ts().raw() {
            return Err(TimestampError::CommitTsOverflow(ts.raw()));
        }
        self.latest.fetch_max(ts.raw(), Ordering::SeqCst);
        Ok(())
    }
}

impl Default for CommitTimestampGenerator {
    fn default() -> Self {
        Self::new()
    }
}

/// Transaction ID generator
pub struct TransactionIdGenerator {
    counter: AtomicU64,
}

impl TransactionIdGenerator {
    pub fn new() -> Self {
        Self::with_start(Timestamp::TXN_ID_START)
    }

    /// Create a new transaction ID generator with a starting value
    pub fn with_start(start: u64) -> Self {
        Self {
            counter: AtomicU64::new(start),
        }
    }

    /// Generate the next transaction ID
    pub fn next(&self) -> Result<Timestamp, TimestampError> {
        let mut cur = self.counter.load(Ordering::SeqCst);
        loop {
            if cur == u64::MAX {
                return Err(TimestampError::TxnIdOverflow(cur));
            }
            if cur < Timestamp::TXN_ID_START {
                return Err(TimestampError::WrongDomainTxnId(cur));
            }
            match self.counter.compare_exchange_weak(
                cur,
                cur + 1,
                Ordering::SeqCst,
                Ordering::SeqCst,
            ) {
                Ok(_) => return Ok(Timestamp::with_ts(cur)),
                Err(actual) => cur = actual,
            }
        }
    }
}

impl Default for TransactionIdGenerator {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_domains() {
        assert!(Timestamp::INITIAL.is_commit_ts());
        assert!(Timestamp::with_ts(Timestamp::TXN_ID_START).is_txn_id());
        assert!(Timestamp::max_commit_ts().is_commit_ts());
        assert_eq!(Timestamp::with_ts(Timestamp::TXN_ID_START + 3).to_string(), "txn#3");
        assert_eq!(Timestamp::with_ts(5).to_string(), "ts#5");
    }

    #[test]
    fn test_txn_ids_increment_by_one() {
        let ids = TransactionIdGenerator::new();
        let first = ids.next().unwrap();
        let second = ids.next().unwrap();
        assert!(first.is_txn_id());
        assert_eq!(first.raw() + 1, second.raw());
    }

    #[test]
    fn test_txn_id_overflow() {
        let ids = TransactionIdGenerator::with_start(u64::MAX);
        assert_eq!(ids.next(), Err(TimestampError::TxnIdOverflow(u64::MAX)));
    }

    #[test]
    fn test_commit_ts_publish() {
        let gen_ts = CommitTimestampGenerator::new();
        let candidate = gen_ts.next_candidate().unwrap();
        assert_eq!(candidate, Timestamp::with_ts(1));
        assert_eq!(gen_ts.latest(), Timestamp::INITIAL);
        gen_ts.publish(candidate).unwrap();
        assert_eq!(gen_ts.latest(), candidate);
        // Older timestamps never move the generator backwards.
        gen_ts.publish(Timestamp::INITIAL).unwrap();
        assert_eq!(gen_ts.latest(), candidate);
        assert_eq!(
            gen_ts.publish(Timestamp::with_ts(Timestamp::TXN_ID_START)),
            Err(TimestampError::WrongDomainCommit(Timestamp::TXN_ID_START))
        );
    }
}
