//! Evaluation memo.

use std::collections::HashMap;

use crate::interpreter::stack::EntityKey;
use crate::types::{Location, Value};

/// What a memo entry was computed for.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub(crate) enum MemoKey {
    /// A function node, identified by its location.
    Node(Location),
    /// The value of a named parameter.
    Parameter(String),
    /// The `Ref` of a named resource.
    Reference(String),
    /// An attribute of a resource.
    Attribute { resource: String, attribute: String },
}

#[derive(Debug, Clone)]
pub(crate) struct MemoEntry {
    pub(crate) value: Value,
    /// Entities entered while computing `value`.
    pub(crate) touched: Vec<EntityKey>,
}

#[derive(Debug, Default)]
pub(crate) struct Memo {
    entries: HashMap<MemoKey, MemoEntry>,
}

impl Memo {
    pub(crate) fn get(&self, key: &MemoKey) -> Option<&MemoEntry> {
        self.entries.get(key)
    }

    pub(crate) fn insert(&mut self, key: MemoKey, entry: MemoEntry) {
        self.entries.insert(key, entry);
    }

    pub(crate) fn len(&self) -> usize {
        self.entries.len()
    }
}
