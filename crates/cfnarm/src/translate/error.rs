//! Error types for translation and assembly.

use std::fmt::{Display, Formatter, Result as FmtResult};

use thiserror::Error;

use crate::interpreter::EvalError;

/// A section of the target document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Section {
    Parameters,
    Variables,
    Resources,
    Outputs,
}

impl Display for Section {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        let name = match self {
            Section::Parameters => "parameter",
            Section::Variables => "variable",
            Section::Resources => "resource",
            Section::Outputs => "output",
        };
        write!(f, "{name}")
    }
}

/// An error that occurred while translating a resource or assembling the
/// target document.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum TranslateError {
    /// No translator is registered for a source resource type.
    #[error("resource '{resource}' has unsupported type '{resource_type}'")]
    UnsupportedResourceType {
        resource_type: String,
        resource: String,
    },

    /// Two fragments contributed the same key to one document section.
    #[error("{section} '{key}' contributed by '{resource}' is already defined")]
    NameCollision {
        section: Section,
        key: String,
        resource: String,
    },

    /// A `dependsOn` entry does not point at an emitted resource.
    #[error("resource '{resource}' depends on '{dependency}', which is not in the document")]
    DanglingDependency { resource: String, dependency: String },

    /// A source property violates a translator's rules.
    #[error("resource '{resource}' property '{property}': {message}")]
    InvalidProperty {
        resource: String,
        property: String,
        message: String,
    },

    #[error(transparent)]
    Eval(#[from] EvalError),
}

impl TranslateError {
    pub(crate) fn invalid_property(
        resource: &str,
        property: &str,
        message: impl Into<String>,
    ) -> Self {
        TranslateError::InvalidProperty {
            resource: resource.to_string(),
            property: property.to_string(),
            message: message.into(),
        }
    }
}
