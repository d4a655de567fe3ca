pub mod bound;
pub mod builtin;
pub mod catalog;
pub mod entry;
pub mod error;
pub mod property;
pub mod serializer;
pub mod set;
pub mod wal;

pub use catalog::{Catalog, FileVersionType};
pub use entry::{CatalogEntry, CatalogEntryKind};
pub use error::{CatalogError, CatalogResult};
pub use set::CatalogSet;
