//! Version chains for multi-version concurrency control.
//!
//! A chain is a singly linked list of versions ordered newest to oldest. Every version owns
//! its predecessor through `prev`; the reverse `next` link is a [`Weak`] reference so the
//! list never forms an ownership cycle.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Weak};

use parking_lot::RwLock;

use crate::timestamp::Timestamp;
use crate::transaction::Transaction;

/// One version of a value. A version without data is a tombstone.
#[derive(Debug)]
pub struct Version<T> {
    data: Option<Arc<T>>,
    timestamp: AtomicU64,
    prev: Option<Arc<Version<T>>>,
    next: RwLock<Weak<Version<T>>>,
}

impl<T> Version<T> {
    pub fn new(data: T, timestamp: Timestamp) -> Self {
        Self::with_data(Some(Arc::new(data)), timestamp)
    }

    pub fn tombstone(timestamp: Timestamp) -> Self {
        Self::with_data(None, timestamp)
    }

    fn with_data(data: Option<Arc<T>>, timestamp: Timestamp) -> Self {
        Self {
            data,
            timestamp: AtomicU64::new(timestamp.raw()),
            prev: None,
            next: RwLock::new(Weak::new()),
        }
    }

    #[inline]
    pub fn timestamp(&self) -> Timestamp {
        Timestamp::with_ts(self.timestamp.load(Ordering::Acquire))
    }

    #[inline]
    pub fn is_deleted(&self) -> bool {
        self.data.is_none()
    }

    #[inline]
    pub fn data(&self) -> Option<&Arc<T>> {
        self.data.as_ref()
    }

    #[inline]
    pub fn prev(&self) -> Option<&Arc<Version<T>>> {
        self.prev.as_ref()
    }

    /// The newer version that replaced this one, if it is still alive.
    pub fn next(&self) -> Option<Arc<Version<T>>> {
        self.next.read().upgrade()
    }

    /// Whether `txn` reads this version: it is the transaction's own write, or it was
    /// committed no later than the transaction's snapshot.
    #[inline]
    pub fn is_visible_to<X: Transaction + ?Sized>(&self, txn: &X) -> bool {
        let ts = self.timestamp();
        ts == txn.txn_id() || (ts.is_commit_ts() && ts <= txn.start_ts())
    }

    /// Write-write conflict test against the head of a chain.
    ///
    /// The version is contested if another transaction wrote it and has not committed yet,
    /// or if it was committed after `txn` took its snapshot.
    #[inline]
    pub fn conflicts_with<X: Transaction + ?Sized>(&self, txn: &X) -> bool {
        let ts = self.timestamp();
        (ts.is_txn_id() && ts != txn.txn_id()) || (ts.is_commit_ts() && ts > txn.start_ts())
    }
}

/// A chain of versions for a single key.
#[derive(Debug)]
pub struct VersionChain<T> {
    head: Arc<Version<T>>,
}

impl<T> VersionChain<T> {
    pub fn new(base: Version<T>) -> Self {
        Self {
            head: Arc::new(base),
        }
    }

    #[inline]
    pub fn head(&self) -> &Arc<Version<T>> {
        &self.head
    }

    /// Installs `version` as the new head and returns the head it replaced.
    pub fn push(&mut self, mut version: Version<T>) -> Arc<Version<T>> {
        let old = self.head.clone();
        version.prev = Some(old.clone());
        let new = Arc::new(version);
        *old.next.write() = Arc::downgrade(&new);
        self.head = new;
        old
    }

    /// Walks the chain from the head and returns the first version visible to `txn`.
    ///
    /// The returned version may be a tombstone.
    pub fn resolve<X: Transaction + ?Sized>(&self, txn: &X) -> Option<&Arc<Version<T>>> {
        let mut current = Some(&self.head);
        while let Some(version) = current {
            if version.is_visible_to(txn) {
                return Some(version);
            }
            current = version.prev.as_ref();
        }
        None
    }

    /// Makes `head` the head again, discarding every newer version.
    pub fn restore(&mut self, head: Arc<Version<T>>) {
        *head.next.write() = Weak::new();
        self.head = head;
    }

    /// Replaces `txn_id` with `commit_ts` on every version the transaction wrote.
    ///
    /// Returns the number of versions restamped.
    pub fn restamp(&self, txn_id: Timestamp, commit_ts: Timestamp) -> usize {
        let mut restamped = 0;
        let mut current = Some(&self.head);
        while let Some(version) = current {
            if version.timestamp() != txn_id {
                break;
            }
            version.timestamp.store(commit_ts.raw(), Ordering::Release);
            restamped += 1;
            current = version.prev.as_ref();
        }
        restamped
    }

    /// Drops every version older than the head and stamps the head as part of the initial
    /// committed state. Only valid while no transaction is active.
    ///
    /// An uncommitted head is left untouched. Returns true if the chain holds only a
    /// committed tombstone afterwards.
    pub fn collapse(&mut self) -> bool {
        if self.head.timestamp().is_txn_id() {
            return false;
        }
        if self.head.prev.is_some() || self.head.timestamp() != Timestamp::INITIAL {
            self.head = Arc::new(Version::with_data(
                self.head.data.clone(),
                Timestamp::INITIAL,
            ));
        }
        self.head.is_deleted()
    }

    /// Number of versions in the chain. Never zero, since a chain holds at least its base
    /// version.
    pub fn num_versions(&self) -> usize {
        let mut len = 0;
        let mut current = Some(&self.head);
        while let Some(version) = current {
            len += 1;
            current = version.prev.as_ref();
        }
        len
    }
}
