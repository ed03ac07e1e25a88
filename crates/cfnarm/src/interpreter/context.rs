//! Read-only resolution context over one template.

use std::cell::{Cell, RefCell};

use indexmap::IndexMap;

use crate::Options;
use crate::interpreter::EvalError;
use crate::interpreter::catalog::ResourceCatalog;
use crate::interpreter::evaluator::eval_node;
use crate::interpreter::memo::{Memo, MemoEntry, MemoKey};
use crate::interpreter::stack::{EntityKey, EvalStack};
use crate::template::{Node, Resource, Template};
use crate::types::Value;

/// A read-only view of a template used to evaluate intrinsic functions.
///
/// The context is shared by every translator in a run. Its only mutable
/// state is the evaluation memo, held in a `RefCell` so evaluation can take
/// `&self`. A context never outlives the run that created it.
pub struct ResolutionContext<'a> {
    template: &'a Template,
    catalog: &'a dyn ResourceCatalog,
    options: &'a Options,
    memo: RefCell<Memo>,
    lookups: Cell<usize>,
}

impl<'a> ResolutionContext<'a> {
    /// Create a context for one translation run.
    pub fn new(
        template: &'a Template,
        catalog: &'a dyn ResourceCatalog,
        options: &'a Options,
    ) -> Self {
        Self {
            template,
            catalog,
            options,
            memo: RefCell::new(Memo::default()),
            lookups: Cell::new(0),
        }
    }

    /// Get the template being translated.
    pub fn template(&self) -> &'a Template {
        self.template
    }

    /// Get the catalog of resource types.
    pub fn catalog(&self) -> &'a dyn ResourceCatalog {
        self.catalog
    }

    /// Get the options of this run.
    pub fn options(&self) -> &'a Options {
        self.options
    }

    /// Evaluate a node outside of any resource.
    ///
    /// # Errors
    ///
    /// Returns an error if any function in the subtree cannot be resolved,
    /// or if resolving it leads back to an entity being resolved.
    pub fn evaluate(&self, node: &Node) -> Result<Value, EvalError> {
        eval_node(node, self, &mut EvalStack::new())
    }

    /// Evaluate one property of a resource, if present.
    ///
    /// The resource itself is on the resolution stack while its property is
    /// evaluated, so a property that refers back to its own resource is a
    /// cycle.
    ///
    /// # Errors
    ///
    /// Returns the same errors as [`ResolutionContext::evaluate`].
    pub fn resource_property(
        &self,
        resource: &Resource,
        key: &str,
    ) -> Result<Option<Value>, EvalError> {
        let Some(node) = resource.property(key) else {
            return Ok(None);
        };
        self.in_resource(resource, |stack| eval_node(node, self, stack))
            .map(Some)
    }

    /// Evaluate every property of a resource, in declaration order.
    ///
    /// # Errors
    ///
    /// Returns the same errors as [`ResolutionContext::evaluate`].
    pub fn resource_properties(
        &self,
        resource: &Resource,
    ) -> Result<IndexMap<String, Value>, EvalError> {
        self.in_resource(resource, |stack| {
            resource
                .properties
                .iter()
                .map(|(key, node)| Ok((key.clone(), eval_node(node, self, stack)?)))
                .collect()
        })
    }

    fn in_resource<T>(
        &self,
        resource: &Resource,
        f: impl FnOnce(&mut EvalStack) -> Result<T, EvalError>,
    ) -> Result<T, EvalError> {
        let mut stack = EvalStack::new();
        stack.push(EntityKey::Resource(resource.name.clone()))?;
        f(&mut stack)
    }

    /// Resources this resource's properties name through `Ref` or
    /// `Fn::GetAtt`, in first-occurrence order. Parameters are skipped.
    ///
    /// This is a syntactic query; nothing is evaluated.
    pub fn referenced_resources(&self, resource: &Resource) -> Vec<&'a Resource> {
        let mut found: Vec<&'a Resource> = Vec::new();
        for node in resource.properties.values() {
            for name in node.referenced_names() {
                if self.template.parameter(name).is_some() {
                    continue;
                }
                if let Some(target) = self.template.resource(name) {
                    if !found.iter().any(|r| r.name == target.name) {
                        found.push(target);
                    }
                }
            }
        }
        found
    }

    /// Resources of the given types whose `property` is a bare reference
    /// (`Ref` or `Fn::GetAtt`) to `target`, in declaration order.
    ///
    /// Used to find resources that attach themselves to another one, such
    /// as volume attachments naming an instance.
    pub fn resources_referencing(
        &self,
        resource_types: &[&str],
        property: &str,
        target: &str,
    ) -> Vec<&'a Resource> {
        self.template
            .resources()
            .filter(|r| r.is_any_of(resource_types))
            .filter(|r| {
                r.property(property)
                    .is_some_and(|node| node.referenced_names().first() == Some(&target))
            })
            .collect()
    }

    /// Number of entity resolutions that missed the memo.
    pub fn lookup_count(&self) -> usize {
        self.lookups.get()
    }

    /// Number of memoized results.
    pub fn memo_len(&self) -> usize {
        self.memo.borrow().len()
    }

    pub(crate) fn cached(&self, key: &MemoKey) -> Option<MemoEntry> {
        self.memo.borrow().get(key).cloned()
    }

    pub(crate) fn remember(&self, key: MemoKey, entry: MemoEntry) {
        self.memo.borrow_mut().insert(key, entry);
    }

    pub(crate) fn count_lookup(&self) {
        self.lookups.set(self.lookups.get() + 1);
    }
}
