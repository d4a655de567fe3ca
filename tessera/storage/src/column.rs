//! Columns split into node-group sized chunks.
//!
//! Every column keeps two layers of chunks: the committed layer that read-only transactions
//! scan, and a shadow layer holding chunks written by committed writers whose checkpoint has
//! not happened yet. Write transactions and WAL replay read the shadow layer first.

use std::collections::BTreeMap;
use std::sync::Arc;

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use tessera_catalog::property::Property;
use tessera_common::constants::NODE_GROUP_SIZE;
use tessera_common::types::{NodeGroupIdx, Offset, PropertyId, node_group_position};
use tessera_common::value::ScalarValue;
use tessera_transaction::TransactionType;

/// Describes how a chunk is encoded, and therefore which values fit into it without
/// re-encoding.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum CompressionMetadata {
    Uncompressed,
    /// Every value in the chunk equals the stored one.
    Constant(ScalarValue),
    /// Integers stored as `value - min` in `bit_width` bits.
    IntegerBitpacking { min: i64, bit_width: u8 },
}

impl CompressionMetadata {
    /// Picks the cheapest encoding that represents `values`.
    pub fn analyze(values: &[ScalarValue], enable_compression: bool) -> Self {
        let Some(first) = values.first() else {
            return CompressionMetadata::Uncompressed;
        };
        if !enable_compression {
            return CompressionMetadata::Uncompressed;
        }
        if values.iter().all(|v| v == first) {
            return CompressionMetadata::Constant(first.clone());
        }
        let integers: Option<Vec<i64>> = values.iter().map(ScalarValue::as_i64).collect();
        match integers {
            Some(integers) => {
                let min = integers.iter().copied().min().unwrap_or_default();
                let max = integers.iter().copied().max().unwrap_or_default();
                let range = (i128::from(max) - i128::from(min)) as u128;
                let bit_width = (128 - range.leading_zeros()) as u8;
                CompressionMetadata::IntegerBitpacking { min, bit_width }
            }
            None => CompressionMetadata::Uncompressed,
        }
    }

    /// Whether any value of the column's type can be written into the chunk in place.
    #[inline]
    pub fn can_always_update_in_place(&self) -> bool {
        matches!(self, CompressionMetadata::Uncompressed)
    }

    /// Whether `value` can overwrite a slot of the chunk without re-encoding it.
    pub fn can_update_in_place(&self, value: &ScalarValue) -> bool {
        match self {
            CompressionMetadata::Uncompressed => true,
            CompressionMetadata::Constant(constant) => constant == value,
            CompressionMetadata::IntegerBitpacking { min, bit_width } => {
                value.as_i64().is_some_and(|v| {
                    let delta = i128::from(v) - i128::from(*min);
                    delta >= 0 && (delta as u128) < (1u128 << *bit_width)
                })
            }
        }
    }
}

/// The values of one column inside one node group.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnChunk {
    values: Vec<ScalarValue>,
    metadata: CompressionMetadata,
}

impl ColumnChunk {
    pub fn new(values: Vec<ScalarValue>, enable_compression: bool) -> Self {
        debug_assert!(values.len() as u64 <= NODE_GROUP_SIZE);
        let metadata = CompressionMetadata::analyze(&values, enable_compression);
        Self { values, metadata }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    #[inline]
    pub fn get(&self, position: u64) -> Option<&ScalarValue> {
        self.values.get(position as usize)
    }

    #[inline]
    pub fn values(&self) -> &[ScalarValue] {
        &self.values
    }

    #[inline]
    pub fn metadata(&self) -> &CompressionMetadata {
        &self.metadata
    }

    /// Whether every update fits into existing slots of this chunk.
    pub fn accepts_in_place(&self, updates: &BTreeMap<u64, ScalarValue>) -> bool {
        updates.iter().all(|(position, value)| {
            (*position as usize) < self.values.len() && self.metadata.can_update_in_place(value)
        })
    }

    /// Overwrites existing slots. The encoding stays as it is.
    fn update_in_place(&mut self, updates: &BTreeMap<u64, ScalarValue>) {
        for (position, value) in updates {
            assert!(
                self.metadata.can_update_in_place(value),
                "value {value} does not fit into the chunk encoding"
            );
            self.values[*position as usize] = value.clone();
        }
    }
}

pub struct Column {
    property: Property,
    enable_compression: bool,
    committed: RwLock<BTreeMap<NodeGroupIdx, Arc<ColumnChunk>>>,
    shadow: RwLock<BTreeMap<NodeGroupIdx, Arc<ColumnChunk>>>,
}

impl Column {
    pub fn new(property: Property, enable_compression: bool) -> Self {
        Self {
            property,
            enable_compression,
            committed: RwLock::new(BTreeMap::new()),
            shadow: RwLock::new(BTreeMap::new()),
        }
    }

    pub(crate) fn with_chunks(
        property: Property,
        enable_compression: bool,
        chunks: BTreeMap<NodeGroupIdx, Arc<ColumnChunk>>,
    ) -> Self {
        let column = Self::new(property, enable_compression);
        *column.committed.write() = chunks;
        column
    }

    #[inline]
    pub fn property(&self) -> &Property {
        &self.property
    }

    #[inline]
    pub fn property_id(&self) -> PropertyId {
        self.property.id()
    }

    /// The chunk `txn_type` reads for `node_group_idx`.
    pub fn chunk(
        &self,
        txn_type: TransactionType,
        node_group_idx: NodeGroupIdx,
    ) -> Option<Arc<ColumnChunk>> {
        if txn_type == TransactionType::Write {
            if let Some(chunk) = self.shadow.read().get(&node_group_idx) {
                return Some(chunk.clone());
            }
        }
        self.committed.read().get(&node_group_idx).cloned()
    }

    /// Reads one value. Rows the column has never stored take the property default.
    pub fn lookup(&self, txn_type: TransactionType, offset: Offset) -> ScalarValue {
        let (node_group_idx, position) = node_group_position(offset);
        self.chunk(txn_type, node_group_idx)
            .and_then(|chunk| chunk.get(position).cloned())
            .unwrap_or_else(|| self.property.default_value().clone())
    }

    /// Builds the chunk that results from applying `updates` to the writer's view of
    /// `node_group_idx`.
    ///
    /// The existing chunk is patched in place when every update fits its encoding. Otherwise
    /// the whole node group is rewritten and re-encoded.
    pub fn prepare_chunk(
        &self,
        node_group_idx: NodeGroupIdx,
        updates: &BTreeMap<u64, ScalarValue>,
    ) -> (Arc<ColumnChunk>, bool) {
        let current = self.chunk(TransactionType::Write, node_group_idx);
        if let Some(current) = current.as_ref().filter(|c| c.accepts_in_place(updates)) {
            let mut chunk = ColumnChunk::clone(current);
            chunk.update_in_place(updates);
            return (Arc::new(chunk), true);
        }

        let existing = current.as_ref().map_or(&[][..], |c| c.values());
        let len = updates
            .keys()
            .next_back()
            .map_or(0, |last| *last as usize + 1)
            .max(existing.len());
        let mut values = Vec::with_capacity(len);
        values.extend_from_slice(existing);
        values.resize(len, self.property.default_value().clone());
        for (position, value) in updates {
            values[*position as usize] = value.clone();
        }
        (Arc::new(ColumnChunk::new(values, self.enable_compression)), false)
    }

    /// Replaces the shadow chunk of `node_group_idx` and returns the previous one.
    pub(crate) fn set_shadow_chunk(
        &self,
        node_group_idx: NodeGroupIdx,
        chunk: Option<Arc<ColumnChunk>>,
    ) -> Option<Arc<ColumnChunk>> {
        let mut shadow = self.shadow.write();
        match chunk {
            Some(chunk) => shadow.insert(node_group_idx, chunk),
            None => shadow.remove(&node_group_idx),
        }
    }

    /// Installs a chunk recovered from the WAL into the committed layer.
    pub(crate) fn install_committed_chunk(
        &self,
        node_group_idx: NodeGroupIdx,
        chunk: Arc<ColumnChunk>,
    ) {
        self.committed.write().insert(node_group_idx, chunk);
        self.shadow.write().remove(&node_group_idx);
    }

    /// Moves every shadow chunk into the committed layer.
    pub(crate) fn checkpoint_in_memory(&self) {
        let shadow = std::mem::take(&mut *self.shadow.write());
        self.committed.write().extend(shadow);
    }

    #[inline]
    pub fn has_shadow_chunks(&self) -> bool {
        !self.shadow.read().is_empty()
    }

    pub(crate) fn committed_chunks(&self) -> BTreeMap<NodeGroupIdx, Arc<ColumnChunk>> {
        self.committed.read().clone()
    }
}
