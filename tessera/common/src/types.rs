use crate::constants::{NODE_GROUP_SIZE, NODE_GROUP_SIZE_LOG2};

/// Internal identifier associated with a table (database-wide unique, never reused).
pub type TableId = u64;

/// Internal identifier associated with a property (table-wide unique, never reused).
pub type PropertyId = u32;

/// Position of a row inside a table.
pub type Offset = u64;

/// Index of the node group an [`Offset`] falls into.
pub type NodeGroupIdx = u64;

/// Splits a row offset into its node group index and the position inside that group.
#[inline]
pub fn node_group_position(offset: Offset) -> (NodeGroupIdx, u64) {
    (
        offset >> NODE_GROUP_SIZE_LOG2,
        offset & (NODE_GROUP_SIZE - 1),
    )
}

/// Returns the first row offset of `node_group_idx`.
#[inline]
pub fn node_group_start(node_group_idx: NodeGroupIdx) -> Offset {
    node_group_idx << NODE_GROUP_SIZE_LOG2
}
