//! Per-resource-type attribute tables.
//!
//! The evaluator does not know what a resource type exposes. Each translator
//! registration supplies an [`AttributeTable`] describing what `Ref` returns
//! for the type and which `Fn::GetAtt` attributes exist.

use indexmap::IndexMap;

use super::ResolutionContext;
use crate::arm::TargetRef;
use crate::template::Resource;

/// How a reference or attribute of a resource is produced.
#[derive(Debug, Clone, Copy)]
pub enum AttributeRule {
    /// The resource's logical name as a literal string.
    LogicalName,
    /// A fixed literal string.
    Literal(&'static str),
    /// The resolved value of one of the resource's own properties; null when
    /// the property is absent.
    Property(&'static str),
    /// An ARM expression body built from the resource's logical name.
    Expression(fn(&str) -> String),
    /// An ARM expression body that depends on how the resource is wired to
    /// other resources in the template.
    Resolve(fn(&Resource, &ResolutionContext<'_>) -> String),
}

/// What `Ref` and `Fn::GetAtt` resolve to for one source resource type.
#[derive(Debug, Clone)]
pub struct AttributeTable {
    reference: AttributeRule,
    attributes: IndexMap<&'static str, AttributeRule>,
}

impl Default for AttributeTable {
    fn default() -> Self {
        Self::new(AttributeRule::LogicalName)
    }
}

impl AttributeTable {
    /// Create a table whose `Ref` follows `reference` and which exposes no
    /// attributes.
    pub fn new(reference: AttributeRule) -> Self {
        Self {
            reference,
            attributes: IndexMap::new(),
        }
    }

    /// Add an attribute.
    #[must_use]
    pub fn with(mut self, name: &'static str, rule: AttributeRule) -> Self {
        self.attributes.insert(name, rule);
        self
    }

    /// The rule for `Ref`.
    pub fn reference(&self) -> AttributeRule {
        self.reference
    }

    /// The rule for an attribute, if exposed.
    pub fn get(&self, attribute: &str) -> Option<AttributeRule> {
        self.attributes.get(attribute).copied()
    }

    /// Exposed attribute names, in registration order.
    pub fn names(&self) -> Vec<String> {
        self.attributes.keys().map(ToString::to_string).collect()
    }
}

/// What the evaluator and translators need to know about resource types
/// beyond the template itself.
pub trait ResourceCatalog {
    /// The attribute table for a source resource type.
    fn attribute_table(&self, resource_type: &str) -> Option<&AttributeTable>;

    /// The target resource a source resource primarily becomes, used for
    /// `dependsOn` entries. `None` when the resource emits no target entry.
    fn primary_target(&self, resource: &Resource) -> Option<TargetRef>;
}
