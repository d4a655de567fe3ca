use tessera_common::types::{PropertyId, TableId};

use crate::entry::CatalogEntry;
use crate::error::CatalogResult;
use crate::property::Property;

/// Sink for the write-ahead log records emitted by schema changes.
///
/// The storage layer owns the log file and implements this trait; the catalog only knows
/// which record each DDL operation produces.
pub trait CatalogWal: Send + Sync {
    /// Logs the catalog snapshot of the committing writer. Recovery installs it as the
    /// original snapshot only if the writer's commit record follows.
    fn log_catalog_record(&self, snapshot: &[u8]) -> CatalogResult<()>;

    fn log_create_table_record(&self, entry: &CatalogEntry) -> CatalogResult<()>;

    fn log_drop_table_record(&self, table_id: TableId) -> CatalogResult<()>;

    fn log_add_property_record(&self, table_id: TableId, property: &Property)
    -> CatalogResult<()>;

    fn log_drop_property_record(
        &self,
        table_id: TableId,
        property_id: PropertyId,
    ) -> CatalogResult<()>;
}
