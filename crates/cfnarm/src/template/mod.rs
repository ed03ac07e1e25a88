//! The parsed source template.
//!
//! A `Template` is built once by the parser and never mutated afterwards.
//! Translators may run in any order and all observe the same source view,
//! so fields are crate-private and exposed through read-only accessors.

mod node;

use indexmap::IndexMap;
use serde_json::Value as Json;

use crate::types::Location;

pub use node::{Function, FunctionKind, Node, RefScope};

/// A parsed source template.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Template {
    pub(crate) description: Option<String>,
    pub(crate) parameters: IndexMap<String, ParameterSpec>,
    pub(crate) mappings: IndexMap<String, Mapping>,
    pub(crate) resources: IndexMap<String, Resource>,
    pub(crate) outputs: IndexMap<String, Output>,
}

/// A declared template parameter.
///
/// Constraints (allowed values, length and value bounds, patterns) are kept
/// verbatim under their source key and are not enforced here.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ParameterSpec {
    pub name: String,
    pub param_type: String,
    pub default: Option<Json>,
    pub description: Option<String>,
    pub no_echo: bool,
    pub constraints: IndexMap<String, Json>,
}

/// A top-level mapping: first-level key to either a nested table or a
/// scalar.
pub type Mapping = IndexMap<String, MappingEntry>;

/// The value stored under a mapping's first-level key.
#[derive(Debug, Clone, PartialEq)]
pub enum MappingEntry {
    Table(IndexMap<String, Json>),
    Scalar(Json),
}

/// A declared source resource.
#[derive(Debug, Clone, PartialEq)]
pub struct Resource {
    pub name: String,
    /// Source provider resource kind, e.g. `AWS::EC2::Instance`.
    pub resource_type: String,
    pub properties: IndexMap<String, Node>,
    /// Opaque pass-through tree.
    pub metadata: Option<Json>,
    /// Explicit dependencies, in declaration order.
    pub depends_on: Vec<String>,
    pub location: Location,
}

/// A declared template output.
#[derive(Debug, Clone, PartialEq)]
pub struct Output {
    pub name: String,
    pub value: Node,
    pub description: Option<String>,
}

impl Template {
    /// The template's description, if any.
    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    /// Look up a parameter by name.
    pub fn parameter(&self, name: &str) -> Option<&ParameterSpec> {
        self.parameters.get(name)
    }

    /// All parameters in declaration order.
    pub fn parameters(&self) -> impl Iterator<Item = &ParameterSpec> {
        self.parameters.values()
    }

    /// Look up a mapping by name.
    pub fn mapping(&self, name: &str) -> Option<&Mapping> {
        self.mappings.get(name)
    }

    /// Look up a resource by name.
    pub fn resource(&self, name: &str) -> Option<&Resource> {
        self.resources.get(name)
    }

    /// All resources in declaration order.
    pub fn resources(&self) -> impl Iterator<Item = &Resource> {
        self.resources.values()
    }

    /// All outputs in declaration order.
    pub fn outputs(&self) -> impl Iterator<Item = &Output> {
        self.outputs.values()
    }
}

impl Resource {
    /// Get a top-level property node.
    pub fn property(&self, key: &str) -> Option<&Node> {
        self.properties.get(key)
    }

    /// Whether this resource is of one of the given source types.
    pub fn is_any_of(&self, resource_types: &[&str]) -> bool {
        resource_types.contains(&self.resource_type.as_str())
    }
}
