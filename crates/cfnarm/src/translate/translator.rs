//! The contract every resource translator implements.

use indexmap::IndexMap;
use serde_json::Value as Json;

use crate::arm::TargetRef;
use crate::interpreter::ResolutionContext;
use crate::template::Resource;
use crate::translate::TranslateError;

/// Keyed entries of one target document section.
pub type Entries = IndexMap<String, Json>;

/// Everything one source resource contributes to the target document.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Fragment {
    /// Name of the source resource this fragment was produced from.
    pub source: String,
    pub parameters: Entries,
    pub variables: Entries,
    pub resources: Vec<Json>,
    pub outputs: Entries,
}

impl Fragment {
    /// An empty fragment attributed to a source resource.
    pub fn new(source: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            ..Self::default()
        }
    }
}

/// Translates one source resource into target document entries.
///
/// Keys a translator contributes to `parameters`, `variables` and `outputs`
/// must be derived from its own resource name (`nicName_<name>`), so that
/// translators never need to coordinate. The output assembler rejects any
/// key contributed twice.
///
/// A translator may read any part of the template through the context but
/// must not rely on another translator's output beyond the names that
/// translator is documented to derive.
pub trait Translator {
    /// The source resource being translated.
    fn resource(&self) -> &Resource;

    /// Parameters the target document must declare for this resource.
    ///
    /// # Errors
    ///
    /// Returns an error if a property the parameters depend on is invalid.
    fn parameters(&self, _ctx: &ResolutionContext<'_>) -> Result<Entries, TranslateError> {
        Ok(Entries::new())
    }

    /// Variables this resource contributes.
    ///
    /// # Errors
    ///
    /// Returns an error if a property cannot be evaluated or is invalid.
    fn variables(&self, _ctx: &ResolutionContext<'_>) -> Result<Entries, TranslateError> {
        Ok(Entries::new())
    }

    /// Target resources this resource's entries depend on.
    ///
    /// The default combines explicit `DependsOn` with every resource the
    /// properties reference, mapped to their primary target resource.
    /// Referenced resources that emit no target entry are skipped.
    ///
    /// # Errors
    ///
    /// Returns an error if `DependsOn` names an undeclared resource.
    fn dependencies(&self, ctx: &ResolutionContext<'_>) -> Result<Vec<TargetRef>, TranslateError> {
        let resource = self.resource();
        let template = ctx.template();
        let mut sources: Vec<&Resource> = Vec::new();
        for name in &resource.depends_on {
            let target = template.resource(name).ok_or_else(|| {
                TranslateError::DanglingDependency {
                    resource: resource.name.clone(),
                    dependency: name.clone(),
                }
            })?;
            sources.push(target);
        }
        sources.extend(ctx.referenced_resources(resource));

        let mut targets: Vec<TargetRef> = Vec::new();
        for source in sources {
            if source.name == resource.name {
                continue;
            }
            if let Some(target) = ctx.catalog().primary_target(source) {
                if !targets.contains(&target) {
                    targets.push(target);
                }
            }
        }
        Ok(targets)
    }

    /// Target resource definitions for this resource, primary first.
    ///
    /// # Errors
    ///
    /// Returns an error if a property cannot be evaluated or is invalid.
    fn resource_entries(&self, ctx: &ResolutionContext<'_>) -> Result<Vec<Json>, TranslateError>;

    /// Outputs this resource contributes.
    ///
    /// # Errors
    ///
    /// Returns an error if a property cannot be evaluated.
    fn outputs(&self, _ctx: &ResolutionContext<'_>) -> Result<Entries, TranslateError> {
        Ok(Entries::new())
    }

    /// Whether this resource stores disks in the shared storage account.
    fn needs_storage_account(&self) -> bool {
        false
    }

    /// Produce the complete fragment for this resource.
    ///
    /// # Errors
    ///
    /// Returns the first error of any contributing method.
    fn translate(&self, ctx: &ResolutionContext<'_>) -> Result<Fragment, TranslateError> {
        Ok(Fragment {
            source: self.resource().name.clone(),
            parameters: self.parameters(ctx)?,
            variables: self.variables(ctx)?,
            resources: self.resource_entries(ctx)?,
            outputs: self.outputs(ctx)?,
        })
    }
}

/// Render target references as a `dependsOn` list.
pub fn depends_on(targets: &[TargetRef]) -> Json {
    Json::Array(
        targets
            .iter()
            .map(|target| Json::String(target.depends_on()))
            .collect(),
    )
}
