//! Bound DDL descriptors handed to the catalog by the binder.

use tessera_common::types::TableId;
use tessera_common::value::ScalarValue;

use crate::entry::RelMultiplicity;
use crate::property::PropertyDefinition;

#[derive(Debug, Clone, PartialEq)]
pub struct BoundCreateTableInfo {
    pub name: String,
    pub extra: BoundExtraCreateInfo,
}

#[derive(Debug, Clone, PartialEq)]
pub enum BoundExtraCreateInfo {
    NodeTable {
        properties: Vec<PropertyDefinition>,
        primary_key: String,
    },
    RelTable {
        src_table: TableId,
        dst_table: TableId,
        multiplicity: RelMultiplicity,
        properties: Vec<PropertyDefinition>,
    },
    /// A named group of rel tables, created and dropped together.
    RelGroup { rel_tables: Vec<BoundCreateTableInfo> },
    /// An RDF graph backed by resource/literal node tables and two triple rel tables.
    RdfGraph,
}

impl BoundCreateTableInfo {
    pub fn node_table(
        name: impl Into<String>,
        properties: Vec<PropertyDefinition>,
        primary_key: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            extra: BoundExtraCreateInfo::NodeTable {
                properties,
                primary_key: primary_key.into(),
            },
        }
    }

    pub fn rel_table(
        name: impl Into<String>,
        src_table: TableId,
        dst_table: TableId,
        multiplicity: RelMultiplicity,
        properties: Vec<PropertyDefinition>,
    ) -> Self {
        Self {
            name: name.into(),
            extra: BoundExtraCreateInfo::RelTable {
                src_table,
                dst_table,
                multiplicity,
                properties,
            },
        }
    }

    pub fn rel_group(name: impl Into<String>, rel_tables: Vec<BoundCreateTableInfo>) -> Self {
        Self {
            name: name.into(),
            extra: BoundExtraCreateInfo::RelGroup { rel_tables },
        }
    }

    pub fn rdf_graph(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            extra: BoundExtraCreateInfo::RdfGraph,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct BoundAlterInfo {
    pub table_name: String,
    pub kind: AlterKind,
}

impl BoundAlterInfo {
    pub fn new(table_name: impl Into<String>, kind: AlterKind) -> Self {
        Self {
            table_name: table_name.into(),
            kind,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum AlterKind {
    RenameTable {
        new_name: String,
    },
    AddProperty {
        definition: PropertyDefinition,
        default: ScalarValue,
    },
    DropProperty {
        name: String,
    },
    RenameProperty {
        old_name: String,
        new_name: String,
    },
    Comment {
        comment: String,
    },
}
