//! Translator registry keyed by source resource type.

use std::collections::HashMap;
use std::fmt::{Debug, Formatter, Result as FmtResult};

use crate::arm::TargetRef;
use crate::interpreter::{AttributeTable, ResourceCatalog};
use crate::template::Resource;
use crate::translate::{TranslateError, Translator};
use crate::translators;

/// Builds a translator for one source resource.
pub type TranslatorConstructor = for<'a> fn(&'a Resource) -> Box<dyn Translator + 'a>;

/// Builds the primary target reference of a resource from its name.
pub type TargetConstructor = fn(&str) -> TargetRef;

/// Everything registered for one source resource type.
#[derive(Clone)]
pub struct Registration {
    pub constructor: TranslatorConstructor,
    /// What `Ref` and `Fn::GetAtt` resolve to for this type.
    pub attributes: AttributeTable,
    /// The target resource other resources depend on, if the type emits
    /// one.
    pub target: Option<TargetConstructor>,
}

impl Registration {
    /// A registration with the default attribute table and no target.
    pub fn new(constructor: TranslatorConstructor) -> Self {
        Self {
            constructor,
            attributes: AttributeTable::default(),
            target: None,
        }
    }

    #[must_use]
    pub fn with_attributes(mut self, attributes: AttributeTable) -> Self {
        self.attributes = attributes;
        self
    }

    #[must_use]
    pub fn with_target(mut self, target: TargetConstructor) -> Self {
        self.target = Some(target);
        self
    }
}

impl Debug for Registration {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.debug_struct("Registration")
            .field("attributes", &self.attributes)
            .field("has_target", &self.target.is_some())
            .finish_non_exhaustive()
    }
}

/// A registry mapping source resource types to translators.
///
/// # Example
///
/// ```
/// use cfnarm::TranslatorRegistry;
///
/// let registry = TranslatorRegistry::with_builtins();
/// assert!(registry.get("AWS::EC2::Instance").is_some());
/// assert!(registry.get("AWS::S3::Bucket").is_none());
/// ```
#[derive(Debug, Default, Clone)]
pub struct TranslatorRegistry {
    registrations: HashMap<String, Registration>,
}

impl TranslatorRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a registry holding every built-in translator.
    pub fn with_builtins() -> Self {
        let mut registry = Self::new();
        translators::register_builtins(&mut registry);
        registry
    }

    /// Register a translator for a source resource type.
    ///
    /// Returns the registration it replaces, if any.
    pub fn register(
        &mut self,
        resource_type: impl Into<String>,
        registration: Registration,
    ) -> Option<Registration> {
        self.registrations.insert(resource_type.into(), registration)
    }

    /// Get the registration for a source resource type.
    pub fn get(&self, resource_type: &str) -> Option<&Registration> {
        self.registrations.get(resource_type)
    }

    /// Build the translator for a resource.
    ///
    /// # Errors
    ///
    /// Returns an error if no translator is registered for the resource's
    /// type.
    pub fn translator<'a>(
        &self,
        resource: &'a Resource,
    ) -> Result<Box<dyn Translator + 'a>, TranslateError> {
        let registration = self.get(&resource.resource_type).ok_or_else(|| {
            TranslateError::UnsupportedResourceType {
                resource_type: resource.resource_type.clone(),
                resource: resource.name.clone(),
            }
        })?;
        Ok((registration.constructor)(resource))
    }

    /// Registered source resource types, sorted.
    pub fn resource_types(&self) -> Vec<&str> {
        let mut types: Vec<&str> = self.registrations.keys().map(String::as_str).collect();
        types.sort_unstable();
        types
    }
}

impl ResourceCatalog for TranslatorRegistry {
    fn attribute_table(&self, resource_type: &str) -> Option<&AttributeTable> {
        self.get(resource_type).map(|r| &r.attributes)
    }

    fn primary_target(&self, resource: &Resource) -> Option<TargetRef> {
        let build = self.get(&resource.resource_type)?.target?;
        Some(build(&resource.name))
    }
}
