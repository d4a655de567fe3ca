/// Number of rows grouped into one node group (the unit of chunk rewrites).
pub const NODE_GROUP_SIZE_LOG2: u32 = 11;
pub const NODE_GROUP_SIZE: u64 = 1 << NODE_GROUP_SIZE_LOG2;

pub const CATALOG_FILE_NAME: &str = "catalog.bin";
pub const CATALOG_WAL_FILE_NAME: &str = "catalog.wal.bin";
pub const STORAGE_FILE_NAME: &str = "storage.bin";
pub const WAL_FILE_NAME: &str = "wal.log";
