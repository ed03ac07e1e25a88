//! Translation of a parsed template into an ARM document.
//!
//! Each source resource is handed to the [`Translator`] registered for its
//! type. Translators run in declaration order against one shared
//! [`ResolutionContext`], and each one's [`Fragment`] is merged into an
//! [`OutputAssembler`] that rejects name collisions and, once everything is
//! merged, dangling dependencies.

mod assembler;
mod error;
pub mod prelude;
mod registry;
mod translator;

pub use assembler::{OutputAssembler, OutputDocument};
pub use error::{Section, TranslateError};
pub use registry::{Registration, TargetConstructor, TranslatorConstructor, TranslatorRegistry};
pub use translator::{Entries, Fragment, Translator, depends_on};

use crate::Options;
use crate::interpreter::ResolutionContext;
use crate::template::Template;

/// What one source resource contributed to the document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResourceSummary {
    pub name: String,
    pub resource_type: String,
    pub parameters: usize,
    pub variables: usize,
    pub entries: usize,
    pub outputs: usize,
}

/// The result of a translation run.
#[derive(Debug, Clone, PartialEq)]
pub struct Translation {
    pub document: OutputDocument,
    /// Per-resource contributions, in declaration order.
    pub summary: Vec<ResourceSummary>,
}

/// Translate a template into an ARM document.
///
/// # Errors
///
/// Returns the first error encountered; no partial document is produced.
pub fn translate(
    template: &Template,
    registry: &TranslatorRegistry,
    options: &Options,
) -> Result<OutputDocument, TranslateError> {
    translate_with_summary(template, registry, options).map(|t| t.document)
}

/// Translate a template, also reporting what each resource contributed.
///
/// # Errors
///
/// Returns an error if:
/// - A resource type has no registered translator
/// - A translator fails to evaluate or validate its resource
/// - Two fragments contribute the same key
/// - A dependency names a resource missing from the document
pub fn translate_with_summary(
    template: &Template,
    registry: &TranslatorRegistry,
    options: &Options,
) -> Result<Translation, TranslateError> {
    let ctx = ResolutionContext::new(template, registry, options);
    let translators = template
        .resources()
        .map(|resource| registry.translator(resource))
        .collect::<Result<Vec<_>, _>>()?;

    let mut assembler = OutputAssembler::new();
    assembler.merge(prelude::location())?;
    if translators.iter().any(|t| t.needs_storage_account()) {
        assembler.merge(prelude::storage(options))?;
    }
    if options.passthrough_parameters() {
        assembler.merge(prelude::passthrough_parameters(template))?;
    }

    let mut summary = Vec::with_capacity(translators.len());
    for translator in &translators {
        let resource = translator.resource();
        let fragment = translator.translate(&ctx)?;
        log::debug!(
            "translated '{}' ({}) into {} target entries",
            resource.name,
            resource.resource_type,
            fragment.resources.len()
        );
        summary.push(ResourceSummary {
            name: resource.name.clone(),
            resource_type: resource.resource_type.clone(),
            parameters: fragment.parameters.len(),
            variables: fragment.variables.len(),
            entries: fragment.resources.len(),
            outputs: fragment.outputs.len(),
        });
        assembler.merge(fragment)?;
    }

    assembler.merge(prelude::outputs(template, &ctx)?)?;
    let document = assembler.finalize()?;
    log::debug!(
        "assembled {} resources after {} reference lookups",
        document.resources.len(),
        ctx.lookup_count()
    );
    Ok(Translation { document, summary })
}
