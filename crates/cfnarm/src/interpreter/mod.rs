//! Intrinsic function evaluation.
//!
//! This module resolves `Ref`, `Fn::GetAtt`, `Fn::FindInMap`, `Fn::Join` and
//! `Fn::Base64` calls against a template. Resolution runs through a
//! [`ResolutionContext`], which memoizes results and detects reference
//! cycles.

mod catalog;
mod context;
mod error;
mod evaluator;
mod memo;
mod stack;

pub use catalog::{AttributeRule, AttributeTable, ResourceCatalog};
pub use context::ResolutionContext;
pub use error::{EvalError, compute_suggestions};
pub use stack::EntityKey;
