use serde::{Deserialize, Serialize};
use tessera_common::logical_type::LogicalType;
use tessera_common::value::ScalarValue;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FunctionKind {
    Scalar,
    Table,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FunctionSignature {
    pub parameters: Vec<LogicalType>,
    /// One type for scalar functions, one per output column for table functions.
    pub returns: Vec<LogicalType>,
}

impl FunctionSignature {
    pub fn new(parameters: Vec<LogicalType>, returns: Vec<LogicalType>) -> Self {
        Self {
            parameters,
            returns,
        }
    }

    /// Whether the signature accepts arguments of `arguments` types, allowing untyped nulls.
    pub fn matches(&self, arguments: &[LogicalType]) -> bool {
        self.parameters.len() == arguments.len()
            && self
                .parameters
                .iter()
                .zip(arguments)
                .all(|(p, a)| p == a || *a == LogicalType::Null)
    }
}

/// A named overload set of scalar or table functions.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FunctionEntry {
    name: String,
    signatures: Vec<FunctionSignature>,
    built_in: bool,
}

impl FunctionEntry {
    pub fn new(name: String, signatures: Vec<FunctionSignature>, built_in: bool) -> Self {
        Self {
            name,
            signatures,
            built_in,
        }
    }

    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[inline]
    pub fn signatures(&self) -> &[FunctionSignature] {
        &self.signatures
    }

    #[inline]
    pub fn is_built_in(&self) -> bool {
        self.built_in
    }

    pub fn resolve(&self, arguments: &[LogicalType]) -> Option<&FunctionSignature> {
        self.signatures.iter().find(|s| s.matches(arguments))
    }
}

/// The body of a scalar macro, kept as unparsed expression text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MacroDefinition {
    pub parameters: Vec<String>,
    pub default_parameters: Vec<(String, ScalarValue)>,
    pub body: String,
}

impl MacroDefinition {
    pub fn new(parameters: Vec<String>, body: impl Into<String>) -> Self {
        Self {
            parameters,
            default_parameters: Vec::new(),
            body: body.into(),
        }
    }

    pub fn with_default(mut self, name: impl Into<String>, value: ScalarValue) -> Self {
        self.default_parameters.push((name.into(), value));
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MacroEntry {
    name: String,
    definition: MacroDefinition,
}

impl MacroEntry {
    pub fn new(name: String, definition: MacroDefinition) -> Self {
        Self { name, definition }
    }

    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[inline]
    pub fn definition(&self) -> &MacroDefinition {
        &self.definition
    }
}
