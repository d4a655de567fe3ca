mod function;
mod table;

pub use function::{FunctionEntry, FunctionKind, FunctionSignature, MacroDefinition, MacroEntry};
use serde::{Deserialize, Serialize};
use strum::Display;
pub use table::{
    NodeTableEntry, RdfGraphEntry, RelGroupEntry, RelMultiplicity, RelTableEntry, TableSchema,
};
use tessera_common::types::TableId;

use crate::bound::AlterKind;
use crate::error::{CatalogError, CatalogResult};
use crate::serializer::{Deserializer, Serializer};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display)]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
#[repr(u8)]
pub enum CatalogEntryKind {
    NodeTable = 0,
    RelTable = 1,
    RelGroup = 2,
    RdfGraph = 3,
    ScalarFunction = 4,
    TableFunction = 5,
    ScalarMacro = 6,
    /// Tombstone marking a dropped or never-created name.
    Dummy = 7,
}

impl CatalogEntryKind {
    pub fn from_tag(tag: u8) -> Option<Self> {
        Some(match tag {
            0 => Self::NodeTable,
            1 => Self::RelTable,
            2 => Self::RelGroup,
            3 => Self::RdfGraph,
            4 => Self::ScalarFunction,
            5 => Self::TableFunction,
            6 => Self::ScalarMacro,
            7 => Self::Dummy,
            _ => return None,
        })
    }

    #[inline]
    pub fn tag(self) -> u8 {
        self as u8
    }

    #[inline]
    pub fn is_table(self) -> bool {
        matches!(
            self,
            Self::NodeTable | Self::RelTable | Self::RelGroup | Self::RdfGraph
        )
    }

    /// Whether entries of this kind are written to catalog snapshots. Functions and macros
    /// live for the lifetime of the process only.
    #[inline]
    pub fn is_persisted(self) -> bool {
        self.is_table()
    }

    /// Whether the kind owns a table in the storage layer.
    #[inline]
    pub fn has_storage(self) -> bool {
        matches!(self, Self::NodeTable | Self::RelTable)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum CatalogEntry {
    NodeTable(NodeTableEntry),
    RelTable(RelTableEntry),
    RelGroup(RelGroupEntry),
    RdfGraph(RdfGraphEntry),
    ScalarFunction(FunctionEntry),
    TableFunction(FunctionEntry),
    ScalarMacro(MacroEntry),
}

impl CatalogEntry {
    pub fn kind(&self) -> CatalogEntryKind {
        match self {
            CatalogEntry::NodeTable(_) => CatalogEntryKind::NodeTable,
            CatalogEntry::RelTable(_) => CatalogEntryKind::RelTable,
            CatalogEntry::RelGroup(_) => CatalogEntryKind::RelGroup,
            CatalogEntry::RdfGraph(_) => CatalogEntryKind::RdfGraph,
            CatalogEntry::ScalarFunction(_) => CatalogEntryKind::ScalarFunction,
            CatalogEntry::TableFunction(_) => CatalogEntryKind::TableFunction,
            CatalogEntry::ScalarMacro(_) => CatalogEntryKind::ScalarMacro,
        }
    }

    pub fn name(&self) -> &str {
        match self {
            CatalogEntry::NodeTable(e) => e.schema().name(),
            CatalogEntry::RelTable(e) => e.schema().name(),
            CatalogEntry::RelGroup(e) => e.name(),
            CatalogEntry::RdfGraph(e) => e.name(),
            CatalogEntry::ScalarFunction(e) | CatalogEntry::TableFunction(e) => e.name(),
            CatalogEntry::ScalarMacro(e) => e.name(),
        }
    }

    pub fn table_id(&self) -> Option<TableId> {
        match self {
            CatalogEntry::NodeTable(e) => Some(e.schema().table_id()),
            CatalogEntry::RelTable(e) => Some(e.schema().table_id()),
            CatalogEntry::RelGroup(e) => Some(e.table_id()),
            CatalogEntry::RdfGraph(e) => Some(e.table_id()),
            _ => None,
        }
    }

    pub fn comment(&self) -> Option<&str> {
        match self {
            CatalogEntry::NodeTable(e) => Some(e.schema().comment()),
            CatalogEntry::RelTable(e) => Some(e.schema().comment()),
            CatalogEntry::RelGroup(e) => Some(e.comment()),
            CatalogEntry::RdfGraph(e) => Some(e.comment()),
            _ => None,
        }
    }

    /// The property schema of node and rel tables.
    pub fn schema(&self) -> Option<&TableSchema> {
        match self {
            CatalogEntry::NodeTable(e) => Some(e.schema()),
            CatalogEntry::RelTable(e) => Some(e.schema()),
            _ => None,
        }
    }

    pub fn as_node_table(&self) -> Option<&NodeTableEntry> {
        match self {
            CatalogEntry::NodeTable(e) => Some(e),
            _ => None,
        }
    }

    pub fn as_rel_table(&self) -> Option<&RelTableEntry> {
        match self {
            CatalogEntry::RelTable(e) => Some(e),
            _ => None,
        }
    }

    pub fn as_rel_group(&self) -> Option<&RelGroupEntry> {
        match self {
            CatalogEntry::RelGroup(e) => Some(e),
            _ => None,
        }
    }

    pub fn as_rdf_graph(&self) -> Option<&RdfGraphEntry> {
        match self {
            CatalogEntry::RdfGraph(e) => Some(e),
            _ => None,
        }
    }

    pub fn as_function(&self) -> Option<&FunctionEntry> {
        match self {
            CatalogEntry::ScalarFunction(e) | CatalogEntry::TableFunction(e) => Some(e),
            _ => None,
        }
    }

    pub fn as_macro(&self) -> Option<&MacroEntry> {
        match self {
            CatalogEntry::ScalarMacro(e) => Some(e),
            _ => None,
        }
    }

    /// Returns a copy of the entry under `new_name`. Only tables and rel groups can be
    /// renamed. RDF graphs cannot, since their child tables are named after the graph.
    pub fn renamed(&self, new_name: &str) -> CatalogResult<Self> {
        let mut entry = self.clone();
        match &mut entry {
            CatalogEntry::NodeTable(e) => e.schema_mut().set_name(new_name.to_owned()),
            CatalogEntry::RelTable(e) => e.schema_mut().set_name(new_name.to_owned()),
            CatalogEntry::RelGroup(e) => e.set_name(new_name.to_owned()),
            _ => return Err(self.unsupported_alter()),
        }
        Ok(entry)
    }

    /// Produces the next version of the entry for every alter kind except rename, which the
    /// catalog set performs as drop-then-create.
    pub fn alter(&self, kind: &AlterKind) -> CatalogResult<Self> {
        let mut entry = self.clone();
        match (kind, &mut entry) {
            (AlterKind::RenameTable { new_name }, _) => return self.renamed(new_name),
            (AlterKind::Comment { comment }, CatalogEntry::NodeTable(e)) => {
                e.schema_mut().set_comment(comment.clone())
            }
            (AlterKind::Comment { comment }, CatalogEntry::RelTable(e)) => {
                e.schema_mut().set_comment(comment.clone())
            }
            (AlterKind::Comment { comment }, CatalogEntry::RelGroup(e)) => {
                e.set_comment(comment.clone())
            }
            (AlterKind::Comment { comment }, CatalogEntry::RdfGraph(e)) => {
                e.set_comment(comment.clone())
            }
            (
                AlterKind::AddProperty {
                    definition,
                    default,
                },
                target,
            ) => {
                target
                    .schema_mut()
                    .ok_or_else(|| self.unsupported_alter())?
                    .add_property(definition, default.clone())?;
            }
            (AlterKind::DropProperty { name }, CatalogEntry::NodeTable(e)) => {
                let is_primary_key = e
                    .primary_key_property()
                    .is_some_and(|p| p.name().eq_ignore_ascii_case(name));
                if is_primary_key {
                    return Err(CatalogError::CannotDropPrimaryKey {
                        table: self.name().to_owned(),
                        property: name.clone(),
                    });
                }
                e.schema_mut().drop_property(name)?;
            }
            (AlterKind::DropProperty { name }, CatalogEntry::RelTable(e)) => {
                e.schema_mut().drop_property(name)?;
            }
            (AlterKind::RenameProperty { old_name, new_name }, target) => {
                target
                    .schema_mut()
                    .ok_or_else(|| self.unsupported_alter())?
                    .rename_property(old_name, new_name)?;
            }
            _ => return Err(self.unsupported_alter()),
        }
        Ok(entry)
    }

    fn schema_mut(&mut self) -> Option<&mut TableSchema> {
        match self {
            CatalogEntry::NodeTable(e) => Some(e.schema_mut()),
            CatalogEntry::RelTable(e) => Some(e.schema_mut()),
            _ => None,
        }
    }

    fn unsupported_alter(&self) -> CatalogError {
        CatalogError::UnsupportedAlter {
            kind: self.kind().to_string(),
            name: self.name().to_owned(),
        }
    }

    /// Writes the entry as `[kind tag][name][kind-specific payload]`.
    pub fn serialize(&self, ser: &mut Serializer) -> CatalogResult<()> {
        ser.write_u8(self.kind().tag());
        ser.write_str(self.name());
        match self {
            CatalogEntry::NodeTable(e) => ser.write_value(e),
            CatalogEntry::RelTable(e) => ser.write_value(e),
            CatalogEntry::RelGroup(e) => ser.write_value(e),
            CatalogEntry::RdfGraph(e) => ser.write_value(e),
            CatalogEntry::ScalarFunction(e) | CatalogEntry::TableFunction(e) => {
                ser.write_value(e)
            }
            CatalogEntry::ScalarMacro(e) => ser.write_value(e),
        }
    }

    pub fn deserialize(de: &mut Deserializer) -> CatalogResult<Self> {
        let tag = de.read_u8()?;
        let kind = CatalogEntryKind::from_tag(tag)
            .ok_or_else(|| CatalogError::Corrupted(format!("unknown entry kind {tag}")))?;
        let name = de.read_string()?;
        let entry = match kind {
            CatalogEntryKind::NodeTable => CatalogEntry::NodeTable(de.read_value()?),
            CatalogEntryKind::RelTable => CatalogEntry::RelTable(de.read_value()?),
            CatalogEntryKind::RelGroup => CatalogEntry::RelGroup(de.read_value()?),
            CatalogEntryKind::RdfGraph => CatalogEntry::RdfGraph(de.read_value()?),
            CatalogEntryKind::ScalarFunction => CatalogEntry::ScalarFunction(de.read_value()?),
            CatalogEntryKind::TableFunction => CatalogEntry::TableFunction(de.read_value()?),
            CatalogEntryKind::ScalarMacro => CatalogEntry::ScalarMacro(de.read_value()?),
            CatalogEntryKind::Dummy => {
                return Err(CatalogError::Corrupted(format!(
                    "tombstone {name} in snapshot"
                )));
            }
        };
        if entry.name() != name {
            return Err(CatalogError::Corrupted(format!(
                "entry header names {name} but payload names {}",
                entry.name()
            )));
        }
        Ok(entry)
    }
}

#[cfg(test)]
mod tests {
    use tessera_common::logical_type::LogicalType;
    use tessera_common::value::ScalarValue;

    use super::*;
    use crate::property::PropertyDefinition;

    fn person() -> CatalogEntry {
        let schema = TableSchema::new(0, "Person".into(), &[
            PropertyDefinition::new("id", LogicalType::Int64),
            PropertyDefinition::new("name", LogicalType::String),
        ])
        .unwrap();
        CatalogEntry::NodeTable(NodeTableEntry::new(schema, 0))
    }

    #[test]
    fn test_alter_node_table() {
        let entry = person();
        let added = entry
            .alter(&AlterKind::AddProperty {
                definition: PropertyDefinition::new("age", LogicalType::Int64),
                default: ScalarValue::Null,
            })
            .unwrap();
        assert!(added.schema().unwrap().contains_property("age"));
        assert!(!entry.schema().unwrap().contains_property("age"));

        let err = entry
            .alter(&AlterKind::DropProperty { name: "ID".into() })
            .unwrap_err();
        assert!(matches!(err, CatalogError::CannotDropPrimaryKey { .. }));

        let commented = entry
            .alter(&AlterKind::Comment {
                comment: "people".into(),
            })
            .unwrap();
        assert_eq!(commented.comment(), Some("people"));
    }

    #[test]
    fn test_functions_cannot_be_altered() {
        let entry = CatalogEntry::ScalarMacro(MacroEntry::new(
            "add_one".into(),
            MacroDefinition::new(vec!["x".into()], "x + 1"),
        ));
        assert!(matches!(
            entry.renamed("add_two"),
            Err(CatalogError::UnsupportedAlter { .. })
        ));
    }

    #[test]
    fn test_self_describing_payload() {
        let mut ser = Serializer::new();
        person().serialize(&mut ser).unwrap();
        let bytes = ser.finish();
        assert_eq!(bytes[0], CatalogEntryKind::NodeTable.tag());

        let mut de = Deserializer::new(bytes);
        assert_eq!(CatalogEntry::deserialize(&mut de).unwrap(), person());
    }

    #[test]
    fn test_unknown_tag_is_rejected() {
        let mut ser = Serializer::new();
        ser.write_u8(42);
        ser.write_str("x");
        let mut de = Deserializer::new(ser.finish());
        assert!(matches!(
            CatalogEntry::deserialize(&mut de),
            Err(CatalogError::Corrupted(_))
        ));
    }
}
