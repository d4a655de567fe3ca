//! A versioned directory of catalog entries.
//!
//! Every name maps to a [`VersionChain`] of entries. Writers push new versions stamped with
//! their transaction ID and record the head they replaced, so commit can restamp the chain
//! and rollback can restore it.

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use parking_lot::{Mutex, RwLock};
use tessera_transaction::{Timestamp, Transaction, Version, VersionChain};
use tracing::debug;

use crate::bound::{AlterKind, BoundAlterInfo};
use crate::entry::CatalogEntry;
use crate::error::{CatalogError, CatalogResult};
use crate::serializer::{Deserializer, Serializer};

pub type CatalogVersion = Version<CatalogEntry>;

type EntryMap = HashMap<String, VersionChain<CatalogEntry>>;

#[derive(Debug)]
struct UndoRecord {
    txn_id: Timestamp,
    key: String,
    prev_head: Arc<CatalogVersion>,
}

#[derive(Debug, Default)]
pub struct CatalogSet {
    entries: RwLock<EntryMap>,
    undo: Mutex<Vec<UndoRecord>>,
}

#[inline]
fn key_of(name: &str) -> String {
    name.to_lowercase()
}

impl CatalogSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contains_entry(&self, txn: &dyn Transaction, name: &str) -> bool {
        let entries = self.entries.read();
        Self::visible(&entries, txn, &key_of(name)).is_some()
    }

    /// Returns the version of `name` visible to `txn`.
    ///
    /// # Errors
    ///
    /// Returns [`CatalogError::NotFound`] if the name never existed or `txn` sees a tombstone.
    pub fn get_entry(&self, txn: &dyn Transaction, name: &str) -> CatalogResult<Arc<CatalogEntry>> {
        let entries = self.entries.read();
        Self::visible(&entries, txn, &key_of(name))
            .ok_or_else(|| CatalogError::NotFound(name.to_owned()))
    }

    pub fn create_entry(&self, txn: &dyn Transaction, entry: CatalogEntry) -> CatalogResult<()> {
        let mut entries = self.entries.write();
        self.create_locked(&mut entries, txn, entry)
    }

    pub fn drop_entry(&self, txn: &dyn Transaction, name: &str) -> CatalogResult<()> {
        let mut entries = self.entries.write();
        self.drop_locked(&mut entries, txn, name)
    }

    /// Applies `info` to the entry it names.
    ///
    /// Renames are performed as a create under the new name followed by a drop of the old
    /// one, so older snapshots keep resolving the old name.
    pub fn alter_entry(&self, txn: &dyn Transaction, info: &BoundAlterInfo) -> CatalogResult<()> {
        let mut entries = self.entries.write();
        let key = key_of(&info.table_name);
        let current = Self::visible(&entries, txn, &key)
            .ok_or_else(|| CatalogError::NotFound(info.table_name.clone()))?;
        Self::check_ww_conflict(&entries, txn, &key, &info.table_name)?;

        if let AlterKind::RenameTable { new_name } = &info.kind {
            let renamed = current.renamed(new_name)?;
            self.create_locked(&mut entries, txn, renamed)?;
            return self.drop_locked(&mut entries, txn, &info.table_name);
        }

        let altered = current.alter(&info.kind)?;
        self.push_locked(&mut entries, txn, key, Version::new(altered, txn.txn_id()));
        Ok(())
    }

    /// All live entries visible to `txn`, keyed by their declared name.
    pub fn get_entries(&self, txn: &dyn Transaction) -> BTreeMap<String, Arc<CatalogEntry>> {
        let entries = self.entries.read();
        entries
            .values()
            .filter_map(|chain| chain.resolve(txn).and_then(|v| v.data().cloned()))
            .map(|entry| (entry.name().to_owned(), entry))
            .collect()
    }

    /// Whether `txn_id` has pushed versions that are neither committed nor rolled back.
    pub fn has_uncommitted_changes(&self, txn_id: Timestamp) -> bool {
        self.undo.lock().iter().any(|r| r.txn_id == txn_id)
    }

    /// Restamps every version written by `txn_id` with `commit_ts`.
    pub fn commit(&self, txn_id: Timestamp, commit_ts: Timestamp) -> usize {
        let records = self.take_undo(txn_id);
        let entries = self.entries.read();
        let mut restamped = 0;
        for record in &records {
            if let Some(chain) = entries.get(&record.key) {
                restamped += chain.restamp(txn_id, commit_ts);
            }
        }
        debug!(%txn_id, %commit_ts, restamped, "catalog set committed");
        restamped
    }

    /// Unwinds every version written by `txn_id`, newest first.
    pub fn rollback(&self, txn_id: Timestamp) -> usize {
        let records = self.take_undo(txn_id);
        let mut entries = self.entries.write();
        for record in records.iter().rev() {
            if let Some(chain) = entries.get_mut(&record.key) {
                chain.restore(record.prev_head.clone());
            }
        }
        debug!(%txn_id, undone = records.len(), "catalog set rolled back");
        records.len()
    }

    /// Collapses every chain to its newest committed version and forgets dropped names.
    ///
    /// Must only run while no transaction is active.
    pub fn checkpoint_in_memory(&self) {
        let mut entries = self.entries.write();
        entries.retain(|_, chain| !chain.collapse());
    }

    /// Number of names with at least one version, including tombstoned ones.
    pub fn num_chains(&self) -> usize {
        self.entries.read().len()
    }

    /// Writes the entries visible to `txn` as a `u64` count followed by each entry.
    ///
    /// Functions, table functions and macros are skipped.
    pub fn serialize(&self, txn: &dyn Transaction, ser: &mut Serializer) -> CatalogResult<()> {
        let persisted: Vec<_> = self
            .get_entries(txn)
            .into_values()
            .filter(|e| e.kind().is_persisted())
            .collect();
        ser.write_u64(persisted.len() as u64);
        for entry in &persisted {
            entry.serialize(ser)?;
        }
        Ok(())
    }

    /// Rebuilds a flat set in which every entry is part of the initial committed state.
    pub fn deserialize(de: &mut Deserializer) -> CatalogResult<Self> {
        let count = de.read_u64()?;
        let mut entries = EntryMap::new();
        for _ in 0..count {
            let entry = CatalogEntry::deserialize(de)?;
            let key = key_of(entry.name());
            if entries.contains_key(&key) {
                return Err(CatalogError::Corrupted(format!(
                    "duplicate entry {}",
                    entry.name()
                )));
            }
            entries.insert(key, VersionChain::new(Version::new(entry, Timestamp::INITIAL)));
        }
        Ok(Self {
            entries: RwLock::new(entries),
            undo: Mutex::default(),
        })
    }

    fn visible(entries: &EntryMap, txn: &dyn Transaction, key: &str) -> Option<Arc<CatalogEntry>> {
        entries
            .get(key)
            .and_then(|chain| chain.resolve(txn))
            .and_then(|version| version.data().cloned())
    }

    fn check_ww_conflict(
        entries: &EntryMap,
        txn: &dyn Transaction,
        key: &str,
        name: &str,
    ) -> CatalogResult<()> {
        match entries.get(key) {
            Some(chain) if chain.head().conflicts_with(txn) => {
                Err(CatalogError::WriteWriteConflict(name.to_owned()))
            }
            _ => Ok(()),
        }
    }

    fn create_locked(
        &self,
        entries: &mut EntryMap,
        txn: &dyn Transaction,
        entry: CatalogEntry,
    ) -> CatalogResult<()> {
        let key = key_of(entry.name());
        match entries.get(&key) {
            Some(chain) => {
                if chain.head().conflicts_with(txn) {
                    return Err(CatalogError::WriteWriteConflict(entry.name().to_owned()));
                }
                if !chain.head().is_deleted() {
                    return Err(CatalogError::DuplicateName(entry.name().to_owned()));
                }
            }
            None => {
                entries.insert(
                    key.clone(),
                    VersionChain::new(Version::tombstone(Timestamp::INITIAL)),
                );
            }
        }
        self.push_locked(entries, txn, key, Version::new(entry, txn.txn_id()));
        Ok(())
    }

    fn drop_locked(
        &self,
        entries: &mut EntryMap,
        txn: &dyn Transaction,
        name: &str,
    ) -> CatalogResult<()> {
        let key = key_of(name);
        if Self::visible(entries, txn, &key).is_none() {
            return Err(CatalogError::NotFound(name.to_owned()));
        }
        Self::check_ww_conflict(entries, txn, &key, name)?;
        self.push_locked(entries, txn, key, Version::tombstone(txn.txn_id()));
        Ok(())
    }

    fn push_locked(
        &self,
        entries: &mut EntryMap,
        txn: &dyn Transaction,
        key: String,
        version: CatalogVersion,
    ) {
        let Some(chain) = entries.get_mut(&key) else {
            panic!("catalog chain {key} vanished while the set was locked");
        };
        let prev_head = chain.push(version);
        if !txn.is_dummy() {
            self.undo.lock().push(UndoRecord {
                txn_id: txn.txn_id(),
                key,
                prev_head,
            });
        }
    }

    fn take_undo(&self, txn_id: Timestamp) -> Vec<UndoRecord> {
        let mut undo = self.undo.lock();
        let (taken, kept): (Vec<_>, Vec<_>) =
            undo.drain(..).partition(|r| r.txn_id == txn_id);
        *undo = kept;
        taken
    }
}

#[cfg(test)]
mod tests {
    use tessera_common::logical_type::LogicalType;
    use tessera_transaction::{DummyTransaction, TransactionType};

    use super::*;
    use crate::entry::{NodeTableEntry, TableSchema};
    use crate::property::PropertyDefinition;

    struct TestTxn {
        id: Timestamp,
        start_ts: Timestamp,
    }

    fn txn(id: u64, start_ts: u64) -> TestTxn {
        TestTxn {
            id: Timestamp::with_ts(Timestamp::TXN_ID_START + id),
            start_ts: Timestamp::with_ts(start_ts),
        }
    }

    impl Transaction for TestTxn {
        fn txn_id(&self) -> Timestamp {
            self.id
        }

        fn start_ts(&self) -> Timestamp {
            self.start_ts
        }

        fn commit_ts(&self) -> Option<Timestamp> {
            None
        }

        fn txn_type(&self) -> TransactionType {
            TransactionType::Write
        }
    }

    fn table(id: u64, name: &str) -> CatalogEntry {
        let schema = TableSchema::new(id, name.into(), &[PropertyDefinition::new(
            "id",
            LogicalType::Int64,
        )])
        .unwrap();
        CatalogEntry::NodeTable(NodeTableEntry::new(schema, 0))
    }

    #[test]
    fn test_create_is_visible_to_writer_only() {
        let set = CatalogSet::new();
        let writer = txn(1, 0);
        set.create_entry(&writer, table(0, "Person")).unwrap();
        assert!(set.contains_entry(&writer, "person"));
        assert!(!set.contains_entry(&txn(2, 0), "Person"));
        assert_eq!(set.get_entry(&writer, "PERSON").unwrap().name(), "Person");
    }

    #[test]
    fn test_commit_then_new_snapshot_sees_entry() {
        let set = CatalogSet::new();
        let writer = txn(1, 0);
        set.create_entry(&writer, table(0, "Person")).unwrap();
        assert!(set.has_uncommitted_changes(writer.txn_id()));
        assert_eq!(set.commit(writer.txn_id(), Timestamp::with_ts(1)), 1);
        assert!(!set.has_uncommitted_changes(writer.txn_id()));
        assert!(!set.contains_entry(&txn(2, 0), "Person"));
        assert!(set.contains_entry(&txn(3, 1), "Person"));
    }

    #[test]
    fn test_rollback_restores_previous_state() {
        let set = CatalogSet::new();
        let writer = txn(1, 0);
        set.create_entry(&writer, table(0, "Person")).unwrap();
        set.rollback(writer.txn_id());
        assert!(!set.contains_entry(&writer, "Person"));
        assert!(!set.contains_entry(&txn(2, 0), "Person"));
    }

    #[test]
    fn test_duplicate_and_conflict() {
        let set = CatalogSet::new();
        let writer = txn(1, 0);
        set.create_entry(&writer, table(0, "Person")).unwrap();
        assert!(matches!(
            set.create_entry(&writer, table(1, "PERSON")),
            Err(CatalogError::DuplicateName(_))
        ));
        assert!(matches!(
            set.create_entry(&txn(2, 0), table(1, "Person")),
            Err(CatalogError::WriteWriteConflict(_))
        ));

        set.commit(writer.txn_id(), Timestamp::with_ts(1));
        // Committed after the snapshot of the second writer.
        assert!(matches!(
            set.drop_entry(&txn(3, 0), "Person"),
            Err(CatalogError::NotFound(_))
        ));
        let stale = txn(4, 0);
        assert!(matches!(
            set.create_entry(&stale, table(2, "Person")),
            Err(CatalogError::WriteWriteConflict(_))
        ));
    }

    #[test]
    fn test_drop_then_recreate_in_same_transaction() {
        let set = CatalogSet::new();
        set.create_entry(&DummyTransaction::write(), table(0, "Person"))
            .unwrap();
        let writer = txn(1, 0);
        set.drop_entry(&writer, "Person").unwrap();
        assert!(!set.contains_entry(&writer, "Person"));
        set.create_entry(&writer, table(5, "Person")).unwrap();
        assert_eq!(set.get_entry(&writer, "Person").unwrap().table_id(), Some(5));
        assert_eq!(set.get_entry(&txn(2, 0), "Person").unwrap().table_id(), Some(0));

        set.rollback(writer.txn_id());
        assert_eq!(set.get_entry(&writer, "Person").unwrap().table_id(), Some(0));
    }

    #[test]
    fn test_rename_is_drop_and_create() {
        let set = CatalogSet::new();
        set.create_entry(&DummyTransaction::write(), table(0, "Person"))
            .unwrap();
        let writer = txn(1, 0);
        set.alter_entry(
            &writer,
            &BoundAlterInfo::new("Person", AlterKind::RenameTable {
                new_name: "Human".into(),
            }),
        )
        .unwrap();
        set.commit(writer.txn_id(), Timestamp::with_ts(1));

        let before = txn(2, 0);
        assert!(set.contains_entry(&before, "Person"));
        assert!(!set.contains_entry(&before, "Human"));
        let after = txn(3, 1);
        assert!(!set.contains_entry(&after, "Person"));
        assert_eq!(set.get_entry(&after, "Human").unwrap().table_id(), Some(0));
    }

    #[test]
    fn test_rename_onto_existing_name_changes_nothing() {
        let set = CatalogSet::new();
        let dummy = DummyTransaction::write();
        set.create_entry(&dummy, table(0, "Person")).unwrap();
        set.create_entry(&dummy, table(1, "City")).unwrap();
        let writer = txn(1, 0);
        let err = set
            .alter_entry(
                &writer,
                &BoundAlterInfo::new("Person", AlterKind::RenameTable {
                    new_name: "city".into(),
                }),
            )
            .unwrap_err();
        assert!(matches!(err, CatalogError::DuplicateName(_)));
        assert!(set.contains_entry(&writer, "Person"));
        assert!(!set.has_uncommitted_changes(writer.txn_id()));
    }

    #[test]
    fn test_checkpoint_collapses_chains() {
        let set = CatalogSet::new();
        let writer = txn(1, 0);
        set.create_entry(&writer, table(0, "Person")).unwrap();
        set.create_entry(&writer, table(1, "City")).unwrap();
        set.commit(writer.txn_id(), Timestamp::with_ts(1));
        let dropper = txn(2, 1);
        set.drop_entry(&dropper, "City").unwrap();
        set.commit(dropper.txn_id(), Timestamp::with_ts(2));

        set.checkpoint_in_memory();
        assert_eq!(set.num_chains(), 1);
        let reader = txn(3, 0);
        assert!(set.contains_entry(&reader, "Person"));
        assert!(!set.contains_entry(&reader, "City"));
    }

    #[test]
    fn test_serialize_round_trip() {
        let set = CatalogSet::new();
        let writer = txn(1, 0);
        set.create_entry(&writer, table(0, "Person")).unwrap();
        set.create_entry(&writer, table(1, "City")).unwrap();

        let mut ser = Serializer::new();
        set.serialize(&writer, &mut ser).unwrap();
        let restored = CatalogSet::deserialize(&mut Deserializer::new(ser.finish())).unwrap();

        let reader = txn(2, 0);
        assert_eq!(restored.get_entries(&reader), set.get_entries(&writer));
        assert_eq!(restored.num_chains(), 2);
    }
}
