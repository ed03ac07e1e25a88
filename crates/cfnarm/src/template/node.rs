//! Property trees and intrinsic function nodes.

use indexmap::IndexMap;
use serde_json::Number;

use crate::types::Location;

/// A node of a resource's property tree.
///
/// Properties are a tree of scalars, lists and maps whose leaves may be
/// intrinsic function calls. Function calls nest arbitrarily: a `Join` may
/// contain a `FindInMap` whose key is a `Ref`.
#[derive(Debug, Clone, PartialEq)]
pub enum Node {
    Null,
    Bool(bool),
    Number(Number),
    String(String),
    List(Vec<Node>),
    Map(IndexMap<String, Node>),
    Function(Box<Function>),
}

/// An intrinsic function call and the location it was parsed from.
#[derive(Debug, Clone, PartialEq)]
pub struct Function {
    pub location: Location,
    pub kind: FunctionKind,
}

/// Which declared names a reference may resolve to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefScope {
    /// Parameters first, then pseudo parameters, then resources (`Ref`).
    Any,
    /// Parameters and pseudo parameters only (`get_param`).
    Parameter,
    /// Resources only (`get_resource`).
    Resource,
}

/// The supported intrinsic functions.
#[derive(Debug, Clone, PartialEq)]
pub enum FunctionKind {
    /// Reference to a parameter (by value) or a resource (by identifier).
    Ref { name: String, scope: RefScope },
    /// An attribute exposed by a declared resource.
    GetAttr { resource: String, attribute: String },
    /// Two-level mapping lookup. Both keys may be nested function calls.
    FindInMap {
        map: String,
        top_key: Node,
        second_key: Node,
    },
    /// Concatenation of resolved parts with a delimiter between them.
    Join { delimiter: String, parts: Vec<Node> },
    /// Standard base64 encoding of a resolved string.
    Base64 { inner: Node },
}

impl Function {
    /// Canonical name of the function, for diagnostics.
    pub fn name(&self) -> &'static str {
        match self.kind {
            FunctionKind::Ref { .. } => "Ref",
            FunctionKind::GetAttr { .. } => "Fn::GetAtt",
            FunctionKind::FindInMap { .. } => "Fn::FindInMap",
            FunctionKind::Join { .. } => "Fn::Join",
            FunctionKind::Base64 { .. } => "Fn::Base64",
        }
    }

    /// The function nodes directly nested in this call's arguments.
    fn arguments(&self) -> Vec<&Node> {
        match &self.kind {
            FunctionKind::Ref { .. } | FunctionKind::GetAttr { .. } => Vec::new(),
            FunctionKind::FindInMap {
                top_key,
                second_key,
                ..
            } => vec![top_key, second_key],
            FunctionKind::Join { parts, .. } => parts.iter().collect(),
            FunctionKind::Base64 { inner } => vec![inner],
        }
    }
}

impl Node {
    /// Get this node as a literal string.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Node::String(s) => Some(s),
            _ => None,
        }
    }

    /// Get this node as a function call.
    pub fn as_function(&self) -> Option<&Function> {
        match self {
            Node::Function(f) => Some(f),
            _ => None,
        }
    }

    /// Get an entry of a map node.
    pub fn get(&self, key: &str) -> Option<&Node> {
        match self {
            Node::Map(map) => map.get(key),
            _ => None,
        }
    }

    /// The name targeted by this node if it is a bare `Ref`.
    pub fn ref_target(&self) -> Option<&str> {
        match self.as_function().map(|f| &f.kind) {
            Some(FunctionKind::Ref { name, .. }) => Some(name),
            _ => None,
        }
    }

    /// Whether this node is a call to `Fn::Base64`.
    pub fn is_base64(&self) -> bool {
        matches!(
            self.as_function().map(|f| &f.kind),
            Some(FunctionKind::Base64 { .. })
        )
    }

    /// Visit every function call in this subtree, outermost first.
    pub fn visit_functions<'a>(&'a self, visit: &mut impl FnMut(&'a Function)) {
        match self {
            Node::List(items) => {
                for item in items {
                    item.visit_functions(visit);
                }
            }
            Node::Map(map) => {
                for value in map.values() {
                    value.visit_functions(visit);
                }
            }
            Node::Function(function) => {
                visit(function.as_ref());
                for argument in function.arguments() {
                    argument.visit_functions(visit);
                }
            }
            Node::Null | Node::Bool(_) | Node::Number(_) | Node::String(_) => {}
        }
    }

    /// Names of every entity this subtree references through `Ref` or
    /// `Fn::GetAtt`, in first-occurrence order. Parameter-only references
    /// are skipped.
    pub fn referenced_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = Vec::new();
        self.visit_functions(&mut |function| {
            let name = match &function.kind {
                FunctionKind::Ref { name, scope } if *scope != RefScope::Parameter => {
                    name.as_str()
                }
                FunctionKind::GetAttr { resource, .. } => resource.as_str(),
                _ => return,
            };
            if !names.contains(&name) {
                names.push(name);
            }
        });
        names
    }
}
