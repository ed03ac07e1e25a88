//! The stack of entities currently being resolved.

use std::fmt::{Display, Formatter, Result as FmtResult};

use crate::interpreter::EvalError;

/// A named template entity that evaluation can enter.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum EntityKey {
    Parameter(String),
    Resource(String),
    Mapping(String),
}

impl Display for EntityKey {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        match self {
            EntityKey::Parameter(name) => write!(f, "parameter:{name}"),
            EntityKey::Resource(name) => write!(f, "resource:{name}"),
            EntityKey::Mapping(name) => write!(f, "mapping:{name}"),
        }
    }
}

/// Resolution stack used for cycle detection.
///
/// Besides the active chain, the stack records every entity entered so far
/// so that memo entries can remember which entities produced them.
#[derive(Debug, Default)]
pub(crate) struct EvalStack {
    active: Vec<EntityKey>,
    touched: Vec<EntityKey>,
}

impl EvalStack {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    fn cycle(&self, key: &EntityKey) -> Option<EvalError> {
        let start = self.active.iter().position(|k| k == key)?;
        let chain = self.active[start..]
            .iter()
            .chain([key])
            .map(ToString::to_string)
            .collect();
        Some(EvalError::CyclicReference { chain })
    }

    /// Enter an entity.
    ///
    /// Returns an error if the entity is already being resolved.
    pub(crate) fn push(&mut self, key: EntityKey) -> Result<(), EvalError> {
        if let Some(err) = self.cycle(&key) {
            return Err(err);
        }
        self.touched.push(key.clone());
        self.active.push(key);
        Ok(())
    }

    /// Leave the most recently entered entity.
    pub(crate) fn pop(&mut self) {
        self.active.pop();
    }

    /// A marker for [`EvalStack::touched_since`].
    pub(crate) fn mark(&self) -> usize {
        self.touched.len()
    }

    /// Distinct entities entered since `mark`.
    pub(crate) fn touched_since(&self, mark: usize) -> Vec<EntityKey> {
        let mut keys: Vec<EntityKey> = Vec::new();
        for key in &self.touched[mark..] {
            if !keys.contains(key) {
                keys.push(key.clone());
            }
        }
        keys
    }

    /// Re-enter, momentarily, the entities a cached result was built from.
    ///
    /// A cached value is only valid in this position if computing it afresh
    /// would not have hit an active entity.
    pub(crate) fn replay(&mut self, keys: &[EntityKey]) -> Result<(), EvalError> {
        for key in keys {
            if let Some(err) = self.cycle(key) {
                return Err(err);
            }
            self.touched.push(key.clone());
        }
        Ok(())
    }
}
