use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use bytes::Bytes;
use tessera_common::constants::{CATALOG_FILE_NAME, CATALOG_WAL_FILE_NAME};
use tessera_common::frame::{read_frame_file, write_frame_file};
use tessera_common::logical_type::LogicalType;
use tessera_common::types::TableId;
use tessera_common::value::ScalarValue;
use tessera_transaction::{DummyTransaction, Timestamp, Transaction, TransactionAction};
use tracing::{debug, info};

use crate::bound::{AlterKind, BoundAlterInfo, BoundCreateTableInfo, BoundExtraCreateInfo};
use crate::builtin;
use crate::entry::{
    CatalogEntry, CatalogEntryKind, FunctionEntry, FunctionKind, FunctionSignature,
    MacroDefinition, MacroEntry, NodeTableEntry, RdfGraphEntry, RelGroupEntry, RelMultiplicity,
    RelTableEntry, TableSchema,
};
use crate::error::{CatalogError, CatalogResult};
use crate::property::PropertyDefinition;
use crate::serializer::{Deserializer, Serializer};
use crate::set::CatalogSet;
use crate::wal::CatalogWal;

/// Which generation of the catalog snapshot a file holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileVersionType {
    /// The last checkpointed catalog.
    Original,
    /// Written by a committing writer. Replay installs the committed copy from the WAL instead.
    WalVersion,
}

impl FileVersionType {
    pub fn file_name(self) -> &'static str {
        match self {
            FileVersionType::Original => CATALOG_FILE_NAME,
            FileVersionType::WalVersion => CATALOG_WAL_FILE_NAME,
        }
    }

    pub fn path_in(self, dir: &Path) -> PathBuf {
        dir.join(self.file_name())
    }
}

/// Schema metadata of a database: tables in one versioned set, functions and macros in
/// another.
pub struct Catalog {
    tables: CatalogSet,
    functions: CatalogSet,
    next_table_id: AtomicU64,
    wal: Option<Arc<dyn CatalogWal>>,
    directory: Option<PathBuf>,
}

impl Default for Catalog {
    fn default() -> Self {
        Self::new()
    }
}

impl Catalog {
    /// Creates an empty catalog holding only the built-in functions.
    pub fn new() -> Self {
        Self::from_parts(CatalogSet::new(), 0)
    }

    fn from_parts(tables: CatalogSet, next_table_id: TableId) -> Self {
        let catalog = Self {
            tables,
            functions: CatalogSet::new(),
            next_table_id: AtomicU64::new(next_table_id),
            wal: None,
            directory: None,
        };
        catalog.register_built_in_functions();
        catalog
    }

    /// Routes the records of schema changes to `wal`.
    pub fn with_wal(mut self, wal: Arc<dyn CatalogWal>) -> Self {
        self.wal = Some(wal);
        self
    }

    /// Makes committing writers persist the catalog snapshot under `directory`.
    pub fn with_directory(mut self, directory: impl Into<PathBuf>) -> Self {
        self.directory = Some(directory.into());
        self
    }

    fn register_built_in_functions(&self) {
        let groups = [
            (FunctionKind::Scalar, builtin::scalar_functions()),
            (FunctionKind::Table, builtin::table_functions()),
        ];
        for (kind, functions) in groups {
            for function in functions {
                if let Err(e) = self.add_built_in_function(kind, function.name, function.signatures)
                {
                    panic!("built-in function {} registered twice: {e}", function.name);
                }
            }
        }
    }

    // ---------------------------------------------------------------------------------
    // Table lookups
    // ---------------------------------------------------------------------------------

    pub fn table_count(&self, txn: &dyn Transaction) -> usize {
        self.tables.get_entries(txn).len()
    }

    pub fn contains_table(&self, txn: &dyn Transaction, name: &str) -> bool {
        self.tables.contains_entry(txn, name)
    }

    pub fn contains_node_table(&self, txn: &dyn Transaction) -> bool {
        self.has_kind(txn, CatalogEntryKind::NodeTable)
    }

    pub fn contains_rel_table(&self, txn: &dyn Transaction) -> bool {
        self.has_kind(txn, CatalogEntryKind::RelTable)
    }

    fn has_kind(&self, txn: &dyn Transaction, kind: CatalogEntryKind) -> bool {
        self.tables
            .get_entries(txn)
            .values()
            .any(|e| e.kind() == kind)
    }

    pub fn get_table_entry_by_name(
        &self,
        txn: &dyn Transaction,
        name: &str,
    ) -> CatalogResult<Arc<CatalogEntry>> {
        self.tables.get_entry(txn, name)
    }

    pub fn get_table_entry(
        &self,
        txn: &dyn Transaction,
        table_id: TableId,
    ) -> CatalogResult<Arc<CatalogEntry>> {
        self.tables
            .get_entries(txn)
            .into_values()
            .find(|e| e.table_id() == Some(table_id))
            .ok_or(CatalogError::TableIdNotFound(table_id))
    }

    pub fn get_table_id(&self, txn: &dyn Transaction, name: &str) -> CatalogResult<TableId> {
        let entry = self.tables.get_entry(txn, name)?;
        entry
            .table_id()
            .ok_or_else(|| CatalogError::NotFound(name.to_owned()))
    }

    pub fn get_table_name(&self, txn: &dyn Transaction, table_id: TableId) -> CatalogResult<String> {
        Ok(self.get_table_entry(txn, table_id)?.name().to_owned())
    }

    /// All tables visible to `txn`, ordered by table ID.
    pub fn table_entries(&self, txn: &dyn Transaction) -> Vec<Arc<CatalogEntry>> {
        let mut entries: Vec<_> = self.tables.get_entries(txn).into_values().collect();
        entries.sort_by_key(|e| e.table_id());
        entries
    }

    fn entries_of_kind(
        &self,
        txn: &dyn Transaction,
        kind: CatalogEntryKind,
    ) -> Vec<Arc<CatalogEntry>> {
        self.table_entries(txn)
            .into_iter()
            .filter(|e| e.kind() == kind)
            .collect()
    }

    pub fn node_table_entries(&self, txn: &dyn Transaction) -> Vec<Arc<CatalogEntry>> {
        self.entries_of_kind(txn, CatalogEntryKind::NodeTable)
    }

    pub fn rel_table_entries(&self, txn: &dyn Transaction) -> Vec<Arc<CatalogEntry>> {
        self.entries_of_kind(txn, CatalogEntryKind::RelTable)
    }

    pub fn rel_group_entries(&self, txn: &dyn Transaction) -> Vec<Arc<CatalogEntry>> {
        self.entries_of_kind(txn, CatalogEntryKind::RelGroup)
    }

    pub fn rdf_graph_entries(&self, txn: &dyn Transaction) -> Vec<Arc<CatalogEntry>> {
        self.entries_of_kind(txn, CatalogEntryKind::RdfGraph)
    }

    pub fn node_table_ids(&self, txn: &dyn Transaction) -> Vec<TableId> {
        self.node_table_entries(txn)
            .iter()
            .filter_map(|e| e.table_id())
            .collect()
    }

    pub fn rel_table_ids(&self, txn: &dyn Transaction) -> Vec<TableId> {
        self.rel_table_entries(txn)
            .iter()
            .filter_map(|e| e.table_id())
            .collect()
    }

    // ---------------------------------------------------------------------------------
    // Table DDL
    // ---------------------------------------------------------------------------------

    fn allocate_table_id(&self) -> TableId {
        self.next_table_id.fetch_add(1, Ordering::SeqCst)
    }

    /// Creates the table described by `info` and returns its ID.
    ///
    /// Rel groups and RDF graphs also create their child tables.
    pub fn create_table_schema(
        &self,
        txn: &dyn Transaction,
        info: &BoundCreateTableInfo,
    ) -> CatalogResult<TableId> {
        match &info.extra {
            BoundExtraCreateInfo::NodeTable {
                properties,
                primary_key,
            } => self.create_node_table(txn, &info.name, properties, primary_key),
            BoundExtraCreateInfo::RelTable {
                src_table,
                dst_table,
                multiplicity,
                properties,
            } => self.create_rel_table(
                txn,
                &info.name,
                *src_table,
                *dst_table,
                *multiplicity,
                properties,
            ),
            BoundExtraCreateInfo::RelGroup { rel_tables } => {
                let mut rel_table_ids = Vec::with_capacity(rel_tables.len());
                for child in rel_tables {
                    if !matches!(child.extra, BoundExtraCreateInfo::RelTable { .. }) {
                        return Err(CatalogError::InvalidSchema(format!(
                            "rel group {} may only contain rel tables",
                            info.name
                        )));
                    }
                    rel_table_ids.push(self.create_table_schema(txn, child)?);
                }
                let table_id = self.allocate_table_id();
                let entry = RelGroupEntry::new(table_id, info.name.clone(), rel_table_ids);
                self.create_logged(txn, CatalogEntry::RelGroup(entry))
            }
            BoundExtraCreateInfo::RdfGraph => self.create_rdf_graph(txn, &info.name),
        }
    }

    fn create_node_table(
        &self,
        txn: &dyn Transaction,
        name: &str,
        properties: &[PropertyDefinition],
        primary_key: &str,
    ) -> CatalogResult<TableId> {
        let table_id = self.allocate_table_id();
        let schema = TableSchema::new(table_id, name.to_owned(), properties)?;
        let primary_key = schema
            .property(primary_key)
            .ok_or_else(|| {
                CatalogError::InvalidSchema(format!(
                    "primary key {primary_key} is not a property of {name}"
                ))
            })?
            .id();
        self.create_logged(
            txn,
            CatalogEntry::NodeTable(NodeTableEntry::new(schema, primary_key)),
        )
    }

    fn create_rel_table(
        &self,
        txn: &dyn Transaction,
        name: &str,
        src_table: TableId,
        dst_table: TableId,
        multiplicity: RelMultiplicity,
        properties: &[PropertyDefinition],
    ) -> CatalogResult<TableId> {
        for side in [src_table, dst_table] {
            let entry = self.get_table_entry(txn, side)?;
            if entry.kind() != CatalogEntryKind::NodeTable {
                return Err(CatalogError::InvalidSchema(format!(
                    "rel table {name} must connect node tables, but {} is a {}",
                    entry.name(),
                    entry.kind()
                )));
            }
        }
        let table_id = self.allocate_table_id();
        let schema = TableSchema::new(table_id, name.to_owned(), properties)?;
        self.create_logged(
            txn,
            CatalogEntry::RelTable(RelTableEntry::new(
                schema,
                src_table,
                dst_table,
                multiplicity,
            )),
        )
    }

    fn create_rdf_graph(&self, txn: &dyn Transaction, name: &str) -> CatalogResult<TableId> {
        let iri = || vec![PropertyDefinition::new("iri", LogicalType::String)];
        let resource = self.create_node_table(
            txn,
            &format!("{name}{}", RdfGraphEntry::RESOURCE_SUFFIX),
            &iri(),
            "iri",
        )?;
        let literal = self.create_node_table(
            txn,
            &format!("{name}{}", RdfGraphEntry::LITERAL_SUFFIX),
            &[
                PropertyDefinition::new("id", LogicalType::Int64),
                PropertyDefinition::new("val", LogicalType::String),
            ],
            "id",
        )?;
        let resource_triples = self.create_rel_table(
            txn,
            &format!("{name}{}", RdfGraphEntry::RESOURCE_TRIPLES_SUFFIX),
            resource,
            resource,
            RelMultiplicity::ManyToMany,
            &iri(),
        )?;
        let literal_triples = self.create_rel_table(
            txn,
            &format!("{name}{}", RdfGraphEntry::LITERAL_TRIPLES_SUFFIX),
            resource,
            literal,
            RelMultiplicity::ManyToMany,
            &iri(),
        )?;
        let table_id = self.allocate_table_id();
        let entry = RdfGraphEntry::new(
            table_id,
            name.to_owned(),
            resource,
            literal,
            resource_triples,
            literal_triples,
        );
        self.create_logged(txn, CatalogEntry::RdfGraph(entry))
    }

    fn create_logged(&self, txn: &dyn Transaction, entry: CatalogEntry) -> CatalogResult<TableId> {
        let Some(table_id) = entry.table_id() else {
            panic!("{} entry {} is not a table", entry.kind(), entry.name());
        };
        self.tables.create_entry(txn, entry.clone())?;
        if let Some(wal) = &self.wal {
            wal.log_create_table_record(&entry)?;
        }
        debug!(table_id, name = entry.name(), kind = %entry.kind(), "created table");
        Ok(table_id)
    }

    /// Drops the table with `table_id`, together with the children of rel groups and RDF
    /// graphs.
    ///
    /// # Errors
    ///
    /// A node table that is still connected by a rel table cannot be dropped, nor can a
    /// child of a rel group or RDF graph while its parent exists.
    pub fn drop_table_schema(&self, txn: &dyn Transaction, table_id: TableId) -> CatalogResult<()> {
        let entry = self.get_table_entry(txn, table_id)?;
        if let Some(parent) = self.parent_entry(txn, table_id) {
            return Err(CatalogError::TableReferenced {
                table: entry.name().to_owned(),
                referenced_by: parent.name().to_owned(),
            });
        }
        self.drop_table_entry(txn, &entry)
    }

    /// The rel group or RDF graph that owns the table with `table_id`.
    fn parent_entry(&self, txn: &dyn Transaction, table_id: TableId) -> Option<Arc<CatalogEntry>> {
        self.rel_group_entries(txn)
            .into_iter()
            .chain(self.rdf_graph_entries(txn))
            .find(|e| match e.as_ref() {
                CatalogEntry::RelGroup(group) => group.rel_table_ids().contains(&table_id),
                CatalogEntry::RdfGraph(graph) => graph.child_table_ids().contains(&table_id),
                _ => false,
            })
    }

    fn drop_table_entry(&self, txn: &dyn Transaction, entry: &CatalogEntry) -> CatalogResult<()> {
        let Some(table_id) = entry.table_id() else {
            panic!("non-table entry {} in the table set", entry.name());
        };
        match entry {
            CatalogEntry::NodeTable(_) => {
                let referencing = self
                    .rel_table_entries(txn)
                    .into_iter()
                    .find(|e| e.as_rel_table().is_some_and(|r| r.references(table_id)));
                if let Some(rel) = referencing {
                    return Err(CatalogError::TableReferenced {
                        table: entry.name().to_owned(),
                        referenced_by: rel.name().to_owned(),
                    });
                }
            }
            CatalogEntry::RelGroup(group) => {
                for child in group.rel_table_ids() {
                    self.drop_table_entry(txn, &*self.get_table_entry(txn, *child)?)?;
                }
            }
            CatalogEntry::RdfGraph(graph) => {
                for child in graph.child_table_ids().into_iter().rev() {
                    self.drop_table_entry(txn, &*self.get_table_entry(txn, child)?)?;
                }
            }
            _ => {}
        }
        self.tables.drop_entry(txn, entry.name())?;
        if let Some(wal) = &self.wal {
            wal.log_drop_table_record(table_id)?;
        }
        debug!(table_id, name = entry.name(), "dropped table");
        Ok(())
    }

    pub fn alter_table_schema(&self, txn: &dyn Transaction, info: &BoundAlterInfo) -> CatalogResult<()> {
        let entry = self.tables.get_entry(txn, &info.table_name)?;
        let Some(table_id) = entry.table_id() else {
            panic!("non-table entry {} in the table set", entry.name());
        };
        let dropped_property = match &info.kind {
            AlterKind::DropProperty { name } => entry
                .schema()
                .and_then(|s| s.property(name))
                .map(|p| p.id()),
            _ => None,
        };

        self.tables.alter_entry(txn, info)?;

        match &info.kind {
            AlterKind::AddProperty { definition, .. } => {
                let altered = self.tables.get_entry(txn, &info.table_name)?;
                let property = altered
                    .schema()
                    .and_then(|s| s.property(&definition.name))
                    .cloned()
                    .ok_or_else(|| CatalogError::PropertyNotFound {
                        table: info.table_name.clone(),
                        property: definition.name.clone(),
                    })?;
                if let Some(wal) = &self.wal {
                    wal.log_add_property_record(table_id, &property)?;
                }
            }
            AlterKind::DropProperty { .. } => {
                if let (Some(wal), Some(property_id)) = (&self.wal, dropped_property) {
                    wal.log_drop_property_record(table_id, property_id)?;
                }
            }
            _ => {}
        }
        Ok(())
    }

    fn alter_by_id(
        &self,
        txn: &dyn Transaction,
        table_id: TableId,
        kind: AlterKind,
    ) -> CatalogResult<()> {
        let name = self.get_table_name(txn, table_id)?;
        self.alter_table_schema(txn, &BoundAlterInfo::new(name, kind))
    }

    pub fn rename_table(
        &self,
        txn: &dyn Transaction,
        table_id: TableId,
        new_name: &str,
    ) -> CatalogResult<()> {
        self.alter_by_id(txn, table_id, AlterKind::RenameTable {
            new_name: new_name.to_owned(),
        })
    }

    pub fn set_table_comment(
        &self,
        txn: &dyn Transaction,
        table_id: TableId,
        comment: &str,
    ) -> CatalogResult<()> {
        self.alter_by_id(txn, table_id, AlterKind::Comment {
            comment: comment.to_owned(),
        })
    }

    pub fn add_property(
        &self,
        txn: &dyn Transaction,
        table_id: TableId,
        definition: PropertyDefinition,
        default: ScalarValue,
    ) -> CatalogResult<()> {
        self.alter_by_id(txn, table_id, AlterKind::AddProperty {
            definition,
            default,
        })
    }

    pub fn drop_property(
        &self,
        txn: &dyn Transaction,
        table_id: TableId,
        name: &str,
    ) -> CatalogResult<()> {
        self.alter_by_id(txn, table_id, AlterKind::DropProperty {
            name: name.to_owned(),
        })
    }

    pub fn rename_property(
        &self,
        txn: &dyn Transaction,
        table_id: TableId,
        old_name: &str,
        new_name: &str,
    ) -> CatalogResult<()> {
        self.alter_by_id(txn, table_id, AlterKind::RenameProperty {
            old_name: old_name.to_owned(),
            new_name: new_name.to_owned(),
        })
    }

    // ---------------------------------------------------------------------------------
    // Functions and macros
    //
    // Registrations always go through the dummy write transaction: they are committed
    // immediately and are never rolled back.
    // ---------------------------------------------------------------------------------

    fn function_entry(kind: FunctionKind, entry: FunctionEntry) -> CatalogEntry {
        match kind {
            FunctionKind::Scalar => CatalogEntry::ScalarFunction(entry),
            FunctionKind::Table => CatalogEntry::TableFunction(entry),
        }
    }

    pub fn add_function(
        &self,
        kind: FunctionKind,
        name: &str,
        signatures: Vec<FunctionSignature>,
    ) -> CatalogResult<()> {
        let entry = FunctionEntry::new(name.to_owned(), signatures, false);
        self.functions
            .create_entry(&DummyTransaction::write(), Self::function_entry(kind, entry))
    }

    pub fn add_built_in_function(
        &self,
        kind: FunctionKind,
        name: &str,
        signatures: Vec<FunctionSignature>,
    ) -> CatalogResult<()> {
        let entry = FunctionEntry::new(name.to_owned(), signatures, true);
        self.functions
            .create_entry(&DummyTransaction::write(), Self::function_entry(kind, entry))
    }

    pub fn add_scalar_macro_function(
        &self,
        name: &str,
        definition: MacroDefinition,
    ) -> CatalogResult<()> {
        let entry = CatalogEntry::ScalarMacro(MacroEntry::new(name.to_owned(), definition));
        self.functions
            .create_entry(&DummyTransaction::write(), entry)
    }

    pub fn contains_function(&self, name: &str) -> bool {
        self.functions
            .contains_entry(&DummyTransaction::read(), name)
    }

    pub fn get_function_entry(&self, name: &str) -> CatalogResult<Arc<CatalogEntry>> {
        self.functions.get_entry(&DummyTransaction::read(), name)
    }

    pub fn contains_macro(&self, name: &str) -> bool {
        self.get_function_entry(name)
            .is_ok_and(|e| e.kind() == CatalogEntryKind::ScalarMacro)
    }

    pub fn get_scalar_macro_function(&self, name: &str) -> Option<MacroDefinition> {
        self.get_function_entry(name)
            .ok()
            .and_then(|e| e.as_macro().map(|m| m.definition().clone()))
    }

    pub fn macro_names(&self) -> Vec<String> {
        self.functions
            .get_entries(&DummyTransaction::read())
            .into_values()
            .filter(|e| e.kind() == CatalogEntryKind::ScalarMacro)
            .map(|e| e.name().to_owned())
            .collect()
    }

    // ---------------------------------------------------------------------------------
    // Commit, rollback and checkpoint
    // ---------------------------------------------------------------------------------

    /// Whether `txn` changed the schema.
    pub fn has_updates(&self, txn: &dyn Transaction) -> bool {
        self.tables.has_uncommitted_changes(txn.txn_id())
    }

    /// First stage of finishing a transaction.
    ///
    /// On commit, a writer that changed the schema persists the catalog it sees at the WAL
    /// file version and logs a catalog record; its versions stay private until
    /// [`Catalog::commit_versions`]. On rollback, every version it pushed is unwound.
    pub fn prepare_commit_or_rollback(
        &self,
        txn: &dyn Transaction,
        action: TransactionAction,
    ) -> CatalogResult<()> {
        match action {
            TransactionAction::Commit | TransactionAction::CommitSkipCheckpointing => {
                if !self.has_updates(txn) {
                    return Ok(());
                }
                let snapshot = self.snapshot(txn)?;
                if let Some(directory) = &self.directory {
                    let path = FileVersionType::WalVersion.path_in(directory);
                    write_frame_file(&path, &snapshot)?;
                    debug!(path = %path.display(), "catalog snapshot written");
                }
                if let Some(wal) = &self.wal {
                    wal.log_catalog_record(&snapshot)?;
                }
                Ok(())
            }
            TransactionAction::Rollback | TransactionAction::RollbackSkipCheckpointing => {
                self.tables.rollback(txn.txn_id());
                // A failed commit may have written its snapshot. Keep the file at the
                // committed state.
                if let Some(directory) = &self.directory {
                    if FileVersionType::WalVersion.path_in(directory).exists() {
                        self.save_to_file(
                            directory,
                            FileVersionType::WalVersion,
                            &DummyTransaction::read(),
                        )?;
                    }
                }
                Ok(())
            }
            TransactionAction::BeginRead | TransactionAction::BeginWrite => {
                panic!("{action} does not finish a transaction")
            }
        }
    }

    /// Publishes the writer's versions under `commit_ts`. Cannot fail.
    pub fn commit_versions(&self, txn: &dyn Transaction, commit_ts: Timestamp) {
        self.tables.commit(txn.txn_id(), commit_ts);
    }

    /// Folds committed versions into the baseline. Requires that no transaction is active.
    pub fn checkpoint_in_memory(&self) {
        self.tables.checkpoint_in_memory();
        self.functions.checkpoint_in_memory();
    }

    // ---------------------------------------------------------------------------------
    // Snapshots
    // ---------------------------------------------------------------------------------

    /// Writes the tables visible to `txn` into the `version` snapshot file under `dir`.
    pub fn save_to_file(
        &self,
        dir: &Path,
        version: FileVersionType,
        txn: &dyn Transaction,
    ) -> CatalogResult<()> {
        let path = version.path_in(dir);
        write_frame_file(&path, &self.snapshot(txn)?)?;
        debug!(path = %path.display(), "catalog snapshot written");
        Ok(())
    }

    /// Encodes the tables visible to `txn` in the snapshot file format.
    pub fn snapshot(&self, txn: &dyn Transaction) -> CatalogResult<Bytes> {
        let mut ser = Serializer::new();
        self.tables.serialize(txn, &mut ser)?;
        ser.write_u64(self.next_table_id.load(Ordering::SeqCst));
        Ok(ser.finish())
    }

    /// Loads the `version` snapshot under `dir`. Every loaded entry belongs to the initial
    /// committed state.
    pub fn load_from_file(dir: &Path, version: FileVersionType) -> CatalogResult<Self> {
        let path = version.path_in(dir);
        let mut de = Deserializer::new(read_frame_file(&path)?);
        let tables = CatalogSet::deserialize(&mut de)?;
        let next_table_id = de.read_u64()?;
        if !de.is_empty() {
            return Err(CatalogError::Corrupted(
                "trailing bytes after catalog snapshot".into(),
            ));
        }
        info!(path = %path.display(), tables = tables.num_chains(), "catalog loaded");
        Ok(Self::from_parts(tables, next_table_id))
    }

    /// Installs `snapshot`, logged by a committed writer, as the original snapshot under
    /// `dir`. Installing the same snapshot twice is harmless.
    pub fn install_snapshot(dir: &Path, snapshot: &[u8]) -> CatalogResult<()> {
        let path = FileVersionType::Original.path_in(dir);
        write_frame_file(&path, snapshot)?;
        debug!(path = %path.display(), "catalog snapshot installed");
        Ok(())
    }

    /// Removes the WAL version snapshot left by a writer that rolled back.
    pub fn discard_wal_version_file(dir: &Path) -> CatalogResult<()> {
        let wal_version = FileVersionType::WalVersion.path_in(dir);
        if wal_version.exists() {
            fs::remove_file(&wal_version).map_err(|e| CatalogError::External(Box::new(e)))?;
        }
        Ok(())
    }
}
