use serde::{Deserialize, Serialize};
use tessera_common::logical_type::LogicalType;
use tessera_common::types::PropertyId;
use tessera_common::value::ScalarValue;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Property {
    id: PropertyId,
    name: String,
    logical_type: LogicalType,
    default: ScalarValue,
}

impl Property {
    #[inline]
    pub fn new(
        id: PropertyId,
        name: String,
        logical_type: LogicalType,
        default: ScalarValue,
    ) -> Self {
        Self {
            id,
            name,
            logical_type,
            default,
        }
    }

    #[inline]
    pub fn id(&self) -> PropertyId {
        self.id
    }

    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[inline]
    pub fn logical_type(&self) -> LogicalType {
        self.logical_type
    }

    /// Value existing rows take when the property is added to a populated table.
    #[inline]
    pub fn default_value(&self) -> &ScalarValue {
        &self.default
    }

    pub(crate) fn rename(&mut self, name: String) {
        self.name = name;
    }
}

/// A property as written in a `CREATE`/`ALTER` statement, before it has an ID.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PropertyDefinition {
    pub name: String,
    pub logical_type: LogicalType,
}

impl PropertyDefinition {
    #[inline]
    pub fn new(name: impl Into<String>, logical_type: LogicalType) -> Self {
        Self {
            name: name.into(),
            logical_type,
        }
    }
}
