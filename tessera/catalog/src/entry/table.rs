use serde::{Deserialize, Serialize};
use strum::Display;
use tessera_common::types::{PropertyId, TableId};
use tessera_common::value::ScalarValue;

use crate::error::{CatalogError, CatalogResult};
use crate::property::{Property, PropertyDefinition};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display)]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum RelMultiplicity {
    ManyToMany,
    ManyToOne,
    OneToMany,
    OneToOne,
}

/// Name, comment and properties shared by node and rel tables.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableSchema {
    table_id: TableId,
    name: String,
    comment: String,
    properties: Vec<Property>,
    next_property_id: PropertyId,
}

impl TableSchema {
    pub fn new(
        table_id: TableId,
        name: String,
        definitions: &[PropertyDefinition],
    ) -> CatalogResult<Self> {
        let mut schema = Self {
            table_id,
            name,
            comment: String::new(),
            properties: Vec::with_capacity(definitions.len()),
            next_property_id: 0,
        };
        for definition in definitions {
            let default = ScalarValue::null_of(definition.logical_type);
            schema.add_property(definition, default)?;
        }
        Ok(schema)
    }

    #[inline]
    pub fn table_id(&self) -> TableId {
        self.table_id
    }

    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[inline]
    pub fn comment(&self) -> &str {
        &self.comment
    }

    #[inline]
    pub fn properties(&self) -> &[Property] {
        &self.properties
    }

    /// Looks a property up by name, ignoring case.
    pub fn property(&self, name: &str) -> Option<&Property> {
        self.properties
            .iter()
            .find(|p| p.name().eq_ignore_ascii_case(name))
    }

    pub fn property_by_id(&self, id: PropertyId) -> Option<&Property> {
        self.properties.iter().find(|p| p.id() == id)
    }

    #[inline]
    pub fn contains_property(&self, name: &str) -> bool {
        self.property(name).is_some()
    }

    pub(crate) fn set_name(&mut self, name: String) {
        self.name = name;
    }

    pub(crate) fn set_comment(&mut self, comment: String) {
        self.comment = comment;
    }

    pub(crate) fn add_property(
        &mut self,
        definition: &PropertyDefinition,
        default: ScalarValue,
    ) -> CatalogResult<PropertyId> {
        if self.contains_property(&definition.name) {
            return Err(CatalogError::DuplicateProperty {
                table: self.name.clone(),
                property: definition.name.clone(),
            });
        }
        let default = default
            .cast_to(definition.logical_type)
            .map_err(|e| CatalogError::InvalidSchema(e.to_string()))?;
        let id = self.next_property_id;
        self.next_property_id += 1;
        self.properties.push(Property::new(
            id,
            definition.name.clone(),
            definition.logical_type,
            default,
        ));
        Ok(id)
    }

    pub(crate) fn drop_property(&mut self, name: &str) -> CatalogResult<Property> {
        let idx = self
            .properties
            .iter()
            .position(|p| p.name().eq_ignore_ascii_case(name))
            .ok_or_else(|| self.property_not_found(name))?;
        Ok(self.properties.remove(idx))
    }

    pub(crate) fn rename_property(&mut self, old_name: &str, new_name: &str) -> CatalogResult<()> {
        if self.contains_property(new_name) {
            return Err(CatalogError::DuplicateProperty {
                table: self.name.clone(),
                property: new_name.to_owned(),
            });
        }
        let not_found = self.property_not_found(old_name);
        let property = self
            .properties
            .iter_mut()
            .find(|p| p.name().eq_ignore_ascii_case(old_name))
            .ok_or(not_found)?;
        property.rename(new_name.to_owned());
        Ok(())
    }

    fn property_not_found(&self, name: &str) -> CatalogError {
        CatalogError::PropertyNotFound {
            table: self.name.clone(),
            property: name.to_owned(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeTableEntry {
    schema: TableSchema,
    primary_key: PropertyId,
}

impl NodeTableEntry {
    pub fn new(schema: TableSchema, primary_key: PropertyId) -> Self {
        Self {
            schema,
            primary_key,
        }
    }

    #[inline]
    pub fn schema(&self) -> &TableSchema {
        &self.schema
    }

    #[inline]
    pub(crate) fn schema_mut(&mut self) -> &mut TableSchema {
        &mut self.schema
    }

    #[inline]
    pub fn primary_key(&self) -> PropertyId {
        self.primary_key
    }

    pub fn primary_key_property(&self) -> Option<&Property> {
        self.schema.property_by_id(self.primary_key)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RelTableEntry {
    schema: TableSchema,
    src_table: TableId,
    dst_table: TableId,
    multiplicity: RelMultiplicity,
}

impl RelTableEntry {
    pub fn new(
        schema: TableSchema,
        src_table: TableId,
        dst_table: TableId,
        multiplicity: RelMultiplicity,
    ) -> Self {
        Self {
            schema,
            src_table,
            dst_table,
            multiplicity,
        }
    }

    #[inline]
    pub fn schema(&self) -> &TableSchema {
        &self.schema
    }

    #[inline]
    pub(crate) fn schema_mut(&mut self) -> &mut TableSchema {
        &mut self.schema
    }

    #[inline]
    pub fn src_table(&self) -> TableId {
        self.src_table
    }

    #[inline]
    pub fn dst_table(&self) -> TableId {
        self.dst_table
    }

    #[inline]
    pub fn multiplicity(&self) -> RelMultiplicity {
        self.multiplicity
    }

    /// Whether the rel table connects `table_id` on either side.
    #[inline]
    pub fn references(&self, table_id: TableId) -> bool {
        self.src_table == table_id || self.dst_table == table_id
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RelGroupEntry {
    table_id: TableId,
    name: String,
    comment: String,
    rel_table_ids: Vec<TableId>,
}

impl RelGroupEntry {
    pub fn new(table_id: TableId, name: String, rel_table_ids: Vec<TableId>) -> Self {
        Self {
            table_id,
            name,
            comment: String::new(),
            rel_table_ids,
        }
    }

    #[inline]
    pub fn table_id(&self) -> TableId {
        self.table_id
    }

    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[inline]
    pub fn comment(&self) -> &str {
        &self.comment
    }

    #[inline]
    pub fn rel_table_ids(&self) -> &[TableId] {
        &self.rel_table_ids
    }

    pub(crate) fn set_name(&mut self, name: String) {
        self.name = name;
    }

    pub(crate) fn set_comment(&mut self, comment: String) {
        self.comment = comment;
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RdfGraphEntry {
    table_id: TableId,
    name: String,
    comment: String,
    resource_table_id: TableId,
    literal_table_id: TableId,
    resource_triples_table_id: TableId,
    literal_triples_table_id: TableId,
}

impl RdfGraphEntry {
    pub const RESOURCE_SUFFIX: &'static str = "_r";
    pub const LITERAL_SUFFIX: &'static str = "_l";
    pub const RESOURCE_TRIPLES_SUFFIX: &'static str = "_rt";
    pub const LITERAL_TRIPLES_SUFFIX: &'static str = "_lt";

    pub fn new(
        table_id: TableId,
        name: String,
        resource_table_id: TableId,
        literal_table_id: TableId,
        resource_triples_table_id: TableId,
        literal_triples_table_id: TableId,
    ) -> Self {
        Self {
            table_id,
            name,
            comment: String::new(),
            resource_table_id,
            literal_table_id,
            resource_triples_table_id,
            literal_triples_table_id,
        }
    }

    #[inline]
    pub fn table_id(&self) -> TableId {
        self.table_id
    }

    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[inline]
    pub fn comment(&self) -> &str {
        &self.comment
    }

    #[inline]
    pub fn resource_table_id(&self) -> TableId {
        self.resource_table_id
    }

    #[inline]
    pub fn literal_table_id(&self) -> TableId {
        self.literal_table_id
    }

    #[inline]
    pub fn resource_triples_table_id(&self) -> TableId {
        self.resource_triples_table_id
    }

    #[inline]
    pub fn literal_triples_table_id(&self) -> TableId {
        self.literal_triples_table_id
    }

    /// Child tables in creation order.
    pub fn child_table_ids(&self) -> [TableId; 4] {
        [
            self.resource_table_id,
            self.literal_table_id,
            self.resource_triples_table_id,
            self.literal_triples_table_id,
        ]
    }

    pub(crate) fn set_comment(&mut self, comment: String) {
        self.comment = comment;
    }
}
